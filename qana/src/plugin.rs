//! The ordered pass mechanism: each [`Plugin`] declares the [`Phase`] it
//! runs at and whether it needs the table plugin to have already run.
//! [`Pipeline::new`] rejects an ordering that would violate that
//! declaration rather than silently running the plugin over unresolved
//! column references.

use css::Facade;
use query_ir::SelectStmt;

use crate::{
    context::QueryContext,
    error::{self, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    TableResolution,
    MatchTableDedup,
    ScanClassification,
    AggregationSplit,
    DirectorIndexPushdown,
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn phase(&self) -> Phase;
    fn requires_table_resolution(&self) -> bool {
        self.phase() != Phase::TableResolution
    }
    fn apply(&self, stmt: &mut SelectStmt, ctx: &mut QueryContext, catalog: &Facade) -> Result<()>;
}

/// A fixed sequence of plugins, phase-ordered and validated at
/// construction: any plugin requiring table resolution must not be
/// scheduled before the table plugin.
pub struct Pipeline {
    plugins: Vec<Box<dyn Plugin>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Pipeline {
    pub fn new(mut plugins: Vec<Box<dyn Plugin>>) -> Result<Self> {
        plugins.sort_by_key(|p| p.phase());
        let mut table_plugin_seen = false;
        for plugin in &plugins {
            if plugin.requires_table_resolution() && !table_plugin_seen {
                return error::PhaseOrderViolationSnafu { plugin: plugin.name() }.fail();
            }
            if plugin.phase() == Phase::TableResolution {
                table_plugin_seen = true;
            }
        }
        Ok(Self { plugins })
    }

    pub fn run(
        &self,
        stmt: &mut SelectStmt,
        ctx: &mut QueryContext,
        catalog: &Facade,
    ) -> Result<()> {
        for plugin in &self.plugins {
            plugin.apply(stmt, ctx, catalog)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use css::test_fixtures::sample_snapshot;

    struct NeedsTables;
    impl Plugin for NeedsTables {
        fn name(&self) -> &'static str {
            "needs_tables"
        }
        fn phase(&self) -> Phase {
            Phase::ScanClassification
        }
        fn apply(&self, _: &mut SelectStmt, _: &mut QueryContext, _: &Facade) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn rejects_pipeline_missing_a_table_plugin() {
        let err = Pipeline::new(vec![Box::new(NeedsTables)]).unwrap_err();
        assert!(matches!(err, crate::Error::PhaseOrderViolation { .. }));
    }

    #[test]
    fn accepts_pipeline_with_table_plugin_first() {
        let table_plugin = crate::table_plugin::TablePlugin;
        let pipeline = Pipeline::new(vec![Box::new(table_plugin), Box::new(NeedsTables)]).unwrap();
        let facade = Facade::new(sample_snapshot()).unwrap();
        let mut stmt = SelectStmt::new();
        let mut ctx = QueryContext::new(20, 10);
        pipeline.run(&mut stmt, &mut ctx, &facade).unwrap();
    }
}
