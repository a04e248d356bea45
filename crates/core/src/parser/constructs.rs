//! Grammar of every construct, dispatched through per-owner field tables.

use super::{PResult, Parser, MAX_DEPTH};
use crate::cardinality::{Cardinality, CardinalityValue};
use crate::error::ErrorKind;
use crate::gerarchy::GerarchyType;
use crate::graph::{NodeId, NodeKind};
use crate::lexer::{Token, TokenKind};

/// Every parenthesized field the grammar allows, across all constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Entity,
    Assoc,
    Gerarchy,
    ForeignKey,
    Attr,
    PrimaryKey,
    AssocBranch,
    Parent,
    Child,
    AttrRef,
    Between,
    AssocRef,
}

const TOP_LEVEL_FIELDS: &[(TokenKind, Field)] = &[
    (TokenKind::Entity, Field::Entity),
    (TokenKind::Assoc, Field::Assoc),
    (TokenKind::Gerarchy, Field::Gerarchy),
    (TokenKind::Fk, Field::ForeignKey),
];

const ENTITY_FIELDS: &[(TokenKind, Field)] = &[
    (TokenKind::Attr, Field::Attr),
    (TokenKind::Pk, Field::PrimaryKey),
];

const ASSOC_FIELDS: &[(TokenKind, Field)] = &[
    (TokenKind::Attr, Field::Attr),
    (TokenKind::Entity, Field::AssocBranch),
];

const GERARCHY_FIELDS: &[(TokenKind, Field)] = &[
    (TokenKind::Parent, Field::Parent),
    (TokenKind::Child, Field::Child),
];

const FK_FIELDS: &[(TokenKind, Field)] = &[
    (TokenKind::Attr, Field::AttrRef),
    (TokenKind::Between, Field::Between),
    (TokenKind::Assoc, Field::AssocRef),
];

const ATTR_FIELDS: &[(TokenKind, Field)] = &[(TokenKind::Attr, Field::Attr)];

/// The field table for the body of a construct of kind `owner`. The start
/// node's table holds the top-level declarations.
fn fields_of(owner: NodeKind) -> &'static [(TokenKind, Field)] {
    match owner {
        NodeKind::Start => TOP_LEVEL_FIELDS,
        NodeKind::Entity => ENTITY_FIELDS,
        NodeKind::Assoc => ASSOC_FIELDS,
        NodeKind::Gerarchy => GERARCHY_FIELDS,
        NodeKind::FK => FK_FIELDS,
        NodeKind::Attr => ATTR_FIELDS,
        NodeKind::PK | NodeKind::Card => &[],
    }
}

fn lookup(owner: NodeKind, keyword: TokenKind) -> Option<Field> {
    fields_of(owner)
        .iter()
        .find(|(kind, _)| *kind == keyword)
        .map(|(_, field)| *field)
}

fn label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Start => "declaration",
        NodeKind::Entity => "entity",
        NodeKind::Assoc => "association",
        NodeKind::Gerarchy => "gerarchy",
        NodeKind::Attr => "attribute",
        NodeKind::FK => "foreign key",
        NodeKind::PK => "primary key",
        NodeKind::Card => "cardinality",
    }
}

impl<'src> Parser<'src> {
    /// Parse one `( keyword ... )` field from `owner`'s table.
    pub(super) fn field(&mut self, owner: NodeKind) -> PResult<()> {
        self.expect_kind(TokenKind::LParen)?;
        if self.depth > MAX_DEPTH {
            let message = "declaration nested too deeply";
            return Err(self.error_at(self.prev, ErrorKind::Syntax, message));
        }
        let Some(field) = lookup(owner, self.cur.kind) else {
            let message = match owner {
                NodeKind::Start => "expected 'entity', 'assoc', 'gerarchy' or 'fk'".to_owned(),
                _ => format!("unrecognized field in {}", label(owner)),
            };
            return Err(self.error_at(self.cur, ErrorKind::Syntax, message));
        };
        self.advance();
        self.run(field)?;
        self.expect_kind(TokenKind::RParen)?;
        Ok(())
    }

    fn run(&mut self, field: Field) -> PResult<()> {
        match field {
            Field::Entity => self.construct(NodeKind::Entity),
            Field::Assoc => self.construct(NodeKind::Assoc),
            Field::Gerarchy => self.construct(NodeKind::Gerarchy),
            Field::ForeignKey => self.construct(NodeKind::FK),
            Field::Attr => self.construct(NodeKind::Attr),
            Field::PrimaryKey => self.primary_key(),
            Field::AssocBranch => self.assoc_branch(),
            Field::Parent | Field::Child | Field::Between => self.reference(NodeKind::Entity),
            Field::AssocRef => self.reference(NodeKind::Assoc),
            Field::AttrRef => self.attr_ref(),
        }
    }

    /// Entity, association, gerarchy, foreign key and attribute all share
    /// this shape: name, open, optional inline part, fields, close.
    fn construct(&mut self, kind: NodeKind) -> PResult<()> {
        let name = self.expect(TokenKind::Ident, &format!("expected {} name", label(kind)))?;
        let opened = self.builder.open(kind, name.text);
        opened.map_err(|e| self.scope_fault(e, name))?;

        match kind {
            NodeKind::Gerarchy => {
                let gerarchy_type = self.gerarchy_type()?;
                self.with_current(|node| node.gerarchy_type = Some(gerarchy_type))?;
            }
            NodeKind::Attr if self.match_kind(TokenKind::Card) => {
                let cardinality = self.cardinality()?;
                self.with_current(|node| node.cardinality = Some(cardinality))?;
            }
            _ => {}
        }

        while !self.check(TokenKind::RParen) && !self.check(TokenKind::End) {
            self.field(kind)?;
        }

        let closed = self.builder.close();
        closed.map(|_| ()).map_err(|e| self.scope_fault(e, self.cur))
    }

    /// `pk name...`: every name is an attribute of the entity being built.
    fn primary_key(&mut self) -> PResult<()> {
        let keyword = self.prev;
        let has_pk = self.builder.current_has(NodeKind::PK);
        if has_pk.map_err(|e| self.scope_fault(e, keyword))? {
            return Err(self.error_at(
                keyword,
                ErrorKind::DuplicateDefinition,
                "entity already has a primary key",
            ));
        }

        let mut attrs = Vec::new();
        while !self.check(TokenKind::RParen) && !self.check(TokenKind::End) {
            let name = self.expect(TokenKind::Ident, "expected attribute name")?;
            let resolved = self.builder.resolve_local(name.text, NodeKind::Attr);
            attrs.push(resolved.map_err(|e| self.scope_fault(e, name))?);
        }
        self.leaf(NodeKind::PK, attrs, None, keyword)
    }

    /// `entity Name card min:max` inside an association.
    fn assoc_branch(&mut self) -> PResult<()> {
        let keyword = self.prev;
        let entity = self.resolve(NodeKind::Entity)?;
        self.expect_kind(TokenKind::Card)?;
        let cardinality = self.cardinality()?;
        self.leaf(NodeKind::Card, vec![entity], Some(cardinality), keyword)
    }

    /// `attr AttrName EntityName` inside a foreign key. The entity is found
    /// lexically; its attribute through the closed entity node.
    fn attr_ref(&mut self) -> PResult<()> {
        let attr = self.expect(TokenKind::Ident, "expected attribute name")?;
        let entity = self.resolve(NodeKind::Entity)?;
        let resolved = self.builder.resolve_structural(entity, attr.text);
        let id = resolved.map_err(|e| self.scope_fault(e, attr))?;
        self.with_current(|node| node.links.push(id))
    }

    /// A bare name reference linked straight to the current node.
    fn reference(&mut self, kind: NodeKind) -> PResult<()> {
        let id = self.resolve(kind)?;
        self.with_current(|node| node.links.push(id))
    }

    fn resolve(&mut self, kind: NodeKind) -> PResult<NodeId> {
        let name = self.expect(TokenKind::Ident, &format!("expected {} name", label(kind)))?;
        let resolved = self.builder.resolve_lexical(name.text, kind);
        resolved.map_err(|e| self.scope_fault(e, name))
    }

    fn leaf(
        &mut self,
        kind: NodeKind,
        links: Vec<NodeId>,
        cardinality: Option<Cardinality>,
        at: Token<'src>,
    ) -> PResult<()> {
        let added = self.builder.leaf(kind, links, cardinality);
        added.map(|_| ()).map_err(|e| self.scope_fault(e, at))
    }

    /// `[type] subset` or `[type] (total|partial) (exclusive|overlapped)`.
    fn gerarchy_type(&mut self) -> PResult<GerarchyType> {
        self.match_kind(TokenKind::Type);
        if self.match_kind(TokenKind::Subset) {
            return Ok(GerarchyType::subset());
        }
        let total = self.facet(
            GerarchyType::coverage,
            "expected 'subset', 'total' or 'partial' for gerarchy type",
        )?;
        let exclusive = self.facet(
            GerarchyType::disjointness,
            "expected 'exclusive' or 'overlapped' for gerarchy type",
        )?;
        Ok(GerarchyType::new(total, exclusive))
    }

    fn facet(&mut self, decode: fn(&str) -> Option<bool>, message: &str) -> PResult<bool> {
        let Some(value) = decode(self.cur.text) else {
            return Err(self.error_at(self.cur, ErrorKind::Syntax, message));
        };
        self.advance();
        Ok(value)
    }

    /// A `min:max` literal, or two separate values `min max`.
    fn cardinality(&mut self) -> PResult<Cardinality> {
        let first = self.expect_kind(TokenKind::CardLiteral)?;
        if first.text.contains(':') {
            return first
                .text
                .parse::<Cardinality>()
                .map_err(|e| self.error_at(first, ErrorKind::Syntax, e.to_string()));
        }
        let min = self.card_value(first)?;
        let second = self.expect_kind(TokenKind::CardLiteral)?;
        let max = self.card_value(second)?;
        Ok(Cardinality { min, max })
    }

    fn card_value(&self, token: Token<'src>) -> PResult<CardinalityValue> {
        token
            .text
            .parse::<CardinalityValue>()
            .map_err(|e| self.error_at(token, ErrorKind::Syntax, e.to_string()))
    }
}
