// AST node types for .dfg source files.
//
// One node per line form: `period` declarations, `op` declarations, and
// three-address statements. Every node carries a `SimpleSpan` for error
// reporting in downstream phases.
//
// Preconditions: produced by the parser from a valid or partially-valid token stream.
// Postconditions: each node's span covers the source range of the construct.
// Failure modes: none (data-only module).
// Side effects: none.

use chumsky::span::SimpleSpan;

/// Byte-offset span (alias for chumsky's `SimpleSpan`).
pub type Span = SimpleSpan;

/// An identifier with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

// ── Root ──

/// A complete .dfg program: a sequence of top-level items.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
    pub span: Span,
}

// ── Items ──

/// A top-level item with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    Period(PeriodDecl),
    Op(OpDecl),
    Stmt(StmtDecl),
}

// ── period_decl: 'period' NUMBER ──

/// Clock period declaration. The value is the per-cycle combinational
/// delay budget in time units.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodDecl {
    pub value: f64,
    pub value_span: Span,
}

// ── op_decl: 'op' IDENT attr+ ──

/// Operation-kind declaration with its attribute list.
/// Attribute validation (known names, ranges) happens in the catalogue
/// phase, not in the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct OpDecl {
    pub name: Ident,
    pub attrs: Vec<OpAttr>,
}

/// One `name=value` attribute on an `op` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct OpAttr {
    pub name: Ident,
    pub value: f64,
    pub value_span: Span,
}

// ── stmt_decl: IDENT '=' IDENT '(' args? ')' ──

/// A three-address statement: `dest = op(arg, ...)`.
/// Arguments name values defined by other statements; forward references
/// are allowed and resolved by the DFG builder.
#[derive(Debug, Clone, PartialEq)]
pub struct StmtDecl {
    pub dest: Ident,
    pub op: Ident,
    pub args: Vec<Ident>,
}
