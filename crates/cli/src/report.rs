//! Plain-text table of a compiled graph.

use erlisp_core::{Graph, Node, NodeId};

const HEADER: [&str; 5] = ["ID", "Name", "Type", "Links", "Additional information"];

fn links(ids: &[NodeId]) -> String {
    if ids.is_empty() {
        return "[None]".to_owned();
    }
    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("[{}]", ids.join(", "))
}

fn info(node: &Node) -> String {
    if let Some(cardinality) = &node.cardinality {
        return format!("Cardinality values: {}", cardinality);
    }
    if let Some(gerarchy_type) = &node.gerarchy_type {
        return format!("Gerarchy type: {}", gerarchy_type);
    }
    "None".to_owned()
}

fn row(node: &Node) -> [String; 5] {
    [
        node.id.to_string(),
        node.name.clone(),
        node.kind.to_string(),
        links(&node.links),
        info(node),
    ]
}

/// Render one row per node, ascending by id. Every column but the last is
/// padded to its widest cell.
pub(crate) fn render(graph: &Graph) -> String {
    let header = HEADER.map(str::to_owned);
    let rows: Vec<[String; 5]> = std::iter::once(header)
        .chain(graph.nodes().map(row))
        .collect();

    let mut widths = [0usize; 5];
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for cells in &rows {
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i + 1 == cells.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{:<width$}  ", cell, width = widths[i]));
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
