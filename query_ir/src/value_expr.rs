//! Scalar expressions: columns, literals, function calls and binary
//! operators, each optionally aliased.

use crate::{column_ref::ColumnRef, template::QueryTemplate};

#[derive(Debug, Clone, PartialEq)]
pub enum ValueExprCore {
    Column(ColumnRef),
    Literal(String),
    FunctionCall { name: String, args: Vec<ValueExpr> },
    BinaryOp {
        op: String,
        lhs: Box<ValueExpr>,
        rhs: Box<ValueExpr>,
    },
}

/// A scalar expression, optionally aliased (`expr AS alias`). The plugin
/// pipeline promises every [`ColumnRef`] inside `core` resolves to a
/// registered table by the time rewriting finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueExpr {
    pub core: ValueExprCore,
    pub alias: Option<String>,
}

impl ValueExpr {
    pub fn column(col: ColumnRef) -> Self {
        Self {
            core: ValueExprCore::Column(col),
            alias: None,
        }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            core: ValueExprCore::Literal(text.into()),
            alias: None,
        }
    }

    pub fn function_call(name: impl Into<String>, args: Vec<ValueExpr>) -> Self {
        Self {
            core: ValueExprCore::FunctionCall {
                name: name.into(),
                args,
            },
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn render_to(&self, qt: &mut QueryTemplate) {
        match &self.core {
            ValueExprCore::Column(c) => c.render_to(qt),
            ValueExprCore::Literal(s) => {
                qt.push_literal(s);
            }
            ValueExprCore::FunctionCall { name, args } => {
                qt.push_literal(name);
                qt.push_literal("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        qt.push_literal(",");
                    }
                    arg.render_to(qt);
                }
                qt.push_literal(")");
            }
            ValueExprCore::BinaryOp { op, lhs, rhs } => {
                lhs.render_to(qt);
                qt.push_literal(op.as_str());
                rhs.render_to(qt);
            }
        }
        if let Some(alias) = &self.alias {
            qt.push_literal("AS").push_literal(alias);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_aggregate_call_with_alias() {
        let expr = ValueExpr::function_call(
            "COUNT",
            vec![ValueExpr::column(ColumnRef::unqualified("*"))],
        )
        .with_alias("n");
        let mut qt = QueryTemplate::new();
        expr.render_to(&mut qt);
        assert_eq!(qt.render_plain(), "COUNT(*)AS n");
    }

    #[test]
    fn renders_binary_op_between_columns() {
        let expr = ValueExpr {
            core: ValueExprCore::BinaryOp {
                op: "+".to_string(),
                lhs: Box::new(ValueExpr::column(ColumnRef::unqualified("a"))),
                rhs: Box::new(ValueExpr::column(ColumnRef::unqualified("b"))),
            },
            alias: None,
        };
        let mut qt = QueryTemplate::new();
        expr.render_to(&mut qt);
        assert_eq!(qt.render_plain(), "a+b");
    }
}
