//! Splits an aggregate SELECT list into a worker-side partial-aggregate
//! pass (`COUNT` → `COUNT`, `SUM`/`AVG` → partial `SUM`s) and a merge-pass
//! rewrite that recombines them over the result table. `GROUP BY` survives
//! the split unchanged; `ORDER BY` is never pushed to the worker — it is
//! only ever emitted in the proxy-visible merge-query template.

use css::Facade;
use query_ir::{ColumnRef, SelectStmt, ValueExpr, ValueExprCore};

use crate::{
    context::QueryContext,
    error::Result,
    plugin::{Phase, Plugin},
};

#[derive(Debug, Clone, Copy)]
pub struct AggregationPlugin;

/// The SELECT list to run on each worker, and the SELECT list the merger
/// runs against the assembled result table to finish the aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSplit {
    pub worker_select_list: Vec<ValueExpr>,
    pub merge_select_list: Vec<ValueExpr>,
}

fn split_aggregate(expr: &ValueExpr) -> (ValueExpr, ValueExpr) {
    match &expr.core {
        ValueExprCore::FunctionCall { name, args } if name.eq_ignore_ascii_case("COUNT") => {
            let alias = expr.alias.clone().unwrap_or_else(|| "count".to_string());
            let worker = ValueExpr::function_call("COUNT", args.clone()).with_alias(alias.clone());
            let merge = ValueExpr::function_call(
                "SUM",
                vec![ValueExpr::column(query_ir::ColumnRef::unqualified(alias.clone()))],
            )
            .with_alias(alias);
            (worker, merge)
        }
        ValueExprCore::FunctionCall { name, args } if name.eq_ignore_ascii_case("SUM") => {
            let alias = expr.alias.clone().unwrap_or_else(|| "sum".to_string());
            let worker = ValueExpr::function_call("SUM", args.clone()).with_alias(alias.clone());
            let merge = ValueExpr::function_call(
                "SUM",
                vec![ValueExpr::column(query_ir::ColumnRef::unqualified(alias.clone()))],
            )
            .with_alias(alias);
            (worker, merge)
        }
        _ => (expr.clone(), expr.clone()),
    }
}

/// Splits every select-list entry, flattening `AVG` into its two partial
/// columns so the worker list and merge list stay column-aligned.
fn split_all(select_list: &[ValueExpr]) -> AggregationSplit {
    let mut worker = Vec::new();
    let mut merge = Vec::new();
    for expr in select_list {
        if let ValueExprCore::FunctionCall { name, args } = &expr.core {
            if name.eq_ignore_ascii_case("AVG") {
                let sum_alias = format!("{}_sum", expr.alias.clone().unwrap_or_else(|| "avg".into()));
                let count_alias =
                    format!("{}_count", expr.alias.clone().unwrap_or_else(|| "avg".into()));
                worker.push(ValueExpr::function_call("SUM", args.clone()).with_alias(sum_alias.clone()));
                worker
                    .push(ValueExpr::function_call("COUNT", args.clone()).with_alias(count_alias.clone()));
                merge.push(
                    ValueExpr {
                        core: ValueExprCore::BinaryOp {
                            op: "/".to_string(),
                            lhs: Box::new(ValueExpr::column(ColumnRef::unqualified(sum_alias))),
                            rhs: Box::new(ValueExpr::column(ColumnRef::unqualified(count_alias))),
                        },
                        alias: None,
                    }
                    .with_alias(expr.alias.clone().unwrap_or_else(|| "avg".into())),
                );
                continue;
            }
        }
        let (w, m) = split_aggregate(expr);
        worker.push(w);
        merge.push(m);
    }
    AggregationSplit {
        worker_select_list: worker,
        merge_select_list: merge,
    }
}

impl Plugin for AggregationPlugin {
    fn name(&self) -> &'static str {
        "aggregation_plugin"
    }

    fn phase(&self) -> Phase {
        Phase::AggregationSplit
    }

    fn apply(&self, stmt: &mut SelectStmt, ctx: &mut QueryContext, _catalog: &Facade) -> Result<()> {
        let has_aggregate = stmt.select_list.iter().any(|e| {
            matches!(&e.core, ValueExprCore::FunctionCall { name, .. }
                if matches!(name.to_ascii_uppercase().as_str(), "COUNT" | "SUM" | "AVG"))
        });
        if !has_aggregate {
            return Ok(());
        }
        let split = split_all(&stmt.select_list);
        stmt.select_list = split.worker_select_list;
        ctx.merge_select_list = split.merge_select_list;
        // group_by is left untouched — it survives the split unchanged.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css::test_fixtures::sample_snapshot;

    #[test]
    fn count_star_is_unchanged_on_the_worker_side() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = SelectStmt::new();
        stmt.select_list
            .push(ValueExpr::function_call("COUNT", vec![ValueExpr::column(ColumnRef::unqualified("*"))]).with_alias("n"));
        let mut ctx = QueryContext::new(20, 10);

        AggregationPlugin.apply(&mut stmt, &mut ctx, &facade).unwrap();

        assert_eq!(stmt.select_list.len(), 1);
        match &stmt.select_list[0].core {
            ValueExprCore::FunctionCall { name, .. } => assert_eq!(name, "COUNT"),
            other => panic!("expected COUNT, got {other:?}"),
        }
    }

    #[test]
    fn avg_splits_into_sum_and_count_worker_columns() {
        let split = split_all(&[ValueExpr::function_call(
            "AVG",
            vec![ValueExpr::column(ColumnRef::unqualified("mag"))],
        )
        .with_alias("avg_mag")]);
        assert_eq!(split.worker_select_list.len(), 2);
        assert_eq!(split.merge_select_list.len(), 1);
    }

    #[test]
    fn non_aggregate_query_is_left_untouched() {
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = SelectStmt::new();
        stmt.select_list
            .push(ValueExpr::column(ColumnRef::unqualified("objectId")));
        let mut ctx = QueryContext::new(20, 10);

        AggregationPlugin.apply(&mut stmt, &mut ctx, &facade).unwrap();
        assert_eq!(stmt.select_list.len(), 1);
    }
}
