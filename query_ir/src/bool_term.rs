//! The WHERE-clause IR. `BoolTerm` mirrors the grammar's OR/AND nesting;
//! each leaf is a `BoolFactor`, a sequence of `BoolFactorTerm`s (operators,
//! predicates, and parenthesized sub-terms) the way the original grammar
//! builds up one conjunctive clause token by token rather than as a single
//! typed predicate.

use crate::{template::QueryTemplate, value_expr::ValueExpr};

#[derive(Debug, Clone, PartialEq)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompOp {
    fn as_str(&self) -> &'static str {
        match self {
            CompOp::Eq => "=",
            CompOp::Ne => "<>",
            CompOp::Lt => "<",
            CompOp::Le => "<=",
            CompOp::Gt => ">",
            CompOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompPredicate {
    pub lhs: ValueExpr,
    pub op: CompOp,
    pub rhs: ValueExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NullPredicate {
    pub expr: ValueExpr,
    pub is_not: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BetweenPredicate {
    pub expr: ValueExpr,
    pub lo: ValueExpr,
    pub hi: ValueExpr,
    pub is_not: bool,
}

/// A single element of a [`BoolTerm::BoolFactor`].
#[derive(Debug, Clone, PartialEq)]
pub enum BoolFactorTerm {
    /// A literal pass-through token, e.g. a bare keyword or operator the
    /// plugin pipeline does not need to understand structurally.
    Pass(String),
    /// A comma-separated literal list, e.g. the contents of an `IN (...)`.
    PassList(Vec<String>),
    /// A parenthesized nested `BoolTerm`.
    BoolTermFactor(Box<BoolTerm>),
    CompPredicate(CompPredicate),
    NullPredicate(NullPredicate),
    BetweenPredicate(BetweenPredicate),
}

impl BoolFactorTerm {
    fn render_to(&self, qt: &mut QueryTemplate) {
        match self {
            BoolFactorTerm::Pass(text) => {
                qt.push_literal(text);
            }
            BoolFactorTerm::PassList(items) => {
                qt.push_literal("(");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        qt.push_literal(",");
                    }
                    qt.push_literal(item);
                }
                qt.push_literal(")");
            }
            BoolFactorTerm::BoolTermFactor(term) => {
                qt.push_literal("(");
                term.render_to(qt);
                qt.push_literal(")");
            }
            BoolFactorTerm::CompPredicate(p) => {
                p.lhs.render_to(qt);
                qt.push_literal(p.op.as_str());
                p.rhs.render_to(qt);
            }
            BoolFactorTerm::NullPredicate(p) => {
                p.expr.render_to(qt);
                qt.push_literal("IS");
                if p.is_not {
                    qt.push_literal("NOT");
                }
                qt.push_literal("NULL");
            }
            BoolFactorTerm::BetweenPredicate(p) => {
                p.expr.render_to(qt);
                if p.is_not {
                    qt.push_literal("NOT");
                }
                qt.push_literal("BETWEEN");
                p.lo.render_to(qt);
                qt.push_literal("AND");
                p.hi.render_to(qt);
            }
        }
    }
}

/// A boolean-valued WHERE-clause term.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolTerm {
    Or(Vec<BoolTerm>),
    And(Vec<BoolTerm>),
    BoolFactor(Vec<BoolFactorTerm>),
    /// A term the plugin pipeline could not classify; preserved verbatim
    /// rather than dropped, so rewriting never silently discards a clause.
    Unknown(String),
}

impl BoolTerm {
    pub fn render_to(&self, qt: &mut QueryTemplate) {
        match self {
            BoolTerm::Or(terms) => Self::render_joined(terms, "OR", qt),
            BoolTerm::And(terms) => Self::render_joined(terms, "AND", qt),
            BoolTerm::BoolFactor(terms) => {
                for term in terms {
                    term.render_to(qt);
                }
            }
            BoolTerm::Unknown(text) => {
                qt.push_literal(text);
            }
        }
    }

    fn render_joined(terms: &[BoolTerm], op: &str, qt: &mut QueryTemplate) {
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                qt.push_literal(op);
            }
            let needs_parens = matches!(term, BoolTerm::Or(_) | BoolTerm::And(_)) && terms.len() > 1;
            if needs_parens {
                qt.push_literal("(");
                term.render_to(qt);
                qt.push_literal(")");
            } else {
                term.render_to(qt);
            }
        }
    }

    /// Every column reference a table plugin needs to rewrite, recursed
    /// through nested OR/AND/parenthesized terms.
    pub fn find_value_exprs<'a>(&'a self, out: &mut Vec<&'a ValueExpr>) {
        match self {
            BoolTerm::Or(terms) | BoolTerm::And(terms) => {
                for term in terms {
                    term.find_value_exprs(out);
                }
            }
            BoolTerm::BoolFactor(terms) => {
                for term in terms {
                    match term {
                        BoolFactorTerm::CompPredicate(p) => {
                            out.push(&p.lhs);
                            out.push(&p.rhs);
                        }
                        BoolFactorTerm::NullPredicate(p) => out.push(&p.expr),
                        BoolFactorTerm::BetweenPredicate(p) => {
                            out.push(&p.expr);
                            out.push(&p.lo);
                            out.push(&p.hi);
                        }
                        BoolFactorTerm::BoolTermFactor(nested) => nested.find_value_exprs(out),
                        BoolFactorTerm::Pass(_) | BoolFactorTerm::PassList(_) => {}
                    }
                }
            }
            BoolTerm::Unknown(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_ref::ColumnRef;

    fn col_eq_literal(col: &str, value: &str) -> BoolTerm {
        BoolTerm::BoolFactor(vec![BoolFactorTerm::CompPredicate(CompPredicate {
            lhs: ValueExpr::column(ColumnRef::unqualified(col)),
            op: CompOp::Eq,
            rhs: ValueExpr::literal(value),
        })])
    }

    #[test]
    fn renders_and_without_unnecessary_parens() {
        let term = BoolTerm::And(vec![col_eq_literal("a", "1"), col_eq_literal("b", "2")]);
        let mut qt = QueryTemplate::new();
        term.render_to(&mut qt);
        assert_eq!(qt.render_plain(), "a=1 AND b=2");
    }

    #[test]
    fn or_of_ands_parenthesizes_each_branch() {
        let term = BoolTerm::Or(vec![
            BoolTerm::And(vec![col_eq_literal("a", "1"), col_eq_literal("b", "2")]),
            col_eq_literal("c", "3"),
        ]);
        let mut qt = QueryTemplate::new();
        term.render_to(&mut qt);
        assert_eq!(qt.render_plain(), "(a=1 AND b=2)OR c=3");
    }

    #[test]
    fn find_value_exprs_recurses_into_nested_terms() {
        let term = BoolTerm::And(vec![
            col_eq_literal("a", "1"),
            BoolTerm::BoolFactor(vec![BoolFactorTerm::BoolTermFactor(Box::new(col_eq_literal(
                "b", "2",
            )))]),
        ]);
        let mut out = Vec::new();
        term.find_value_exprs(&mut out);
        assert_eq!(out.len(), 4);
    }
}
