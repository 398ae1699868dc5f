//! In-memory image of `config_param`: schema plus current value, published
//! as one immutable snapshot per write so readers never see a torn update.

use std::collections::HashMap;

use qmeta_types::{ParamSchema, ParamType};

use crate::error::{self, Result};

#[derive(Debug, Clone)]
pub struct ParamEntry {
    pub schema: ParamSchema,
    pub value: String,
}

/// Keyed by `(category, param)`.
#[derive(Debug, Clone, Default)]
pub struct ParamSnapshot {
    entries: HashMap<(String, String), ParamEntry>,
}

impl ParamSnapshot {
    pub fn from_schemas(schemas: Vec<ParamSchema>) -> Self {
        let mut entries = HashMap::new();
        for schema in schemas {
            let key = (schema.category.clone(), schema.param.clone());
            let value = schema.default.clone();
            entries.insert(key, ParamEntry { schema, value });
        }
        Self { entries }
    }

    pub fn get(&self, category: &str, param: &str) -> Result<&ParamEntry> {
        self.entries
            .get(&(category.to_string(), param.to_string()))
            .ok_or_else(|| {
                error::UnknownParamSnafu {
                    category,
                    param,
                }
                .build()
            })
    }

    pub fn list(&self, category: Option<&str>) -> Vec<&ParamEntry> {
        self.entries
            .values()
            .filter(|e| category.map_or(true, |c| e.schema.category == c))
            .collect()
    }

    /// Returns a clone of this snapshot with `(category, param)` set to
    /// `value`, without mutating `self` — the caller publishes the result.
    pub fn with_value(&self, category: &str, param: &str, value: String) -> Result<Self> {
        let entry = self.get(category, param)?;
        if entry.schema.read_only {
            return error::ReadOnlySnafu { category, param }.fail();
        }
        validate(&entry.schema, &value)?;
        let mut next = self.clone();
        next.entries
            .get_mut(&(category.to_string(), param.to_string()))
            .expect("just validated key exists")
            .value = value;
        Ok(next)
    }
}

fn validate(schema: &ParamSchema, value: &str) -> Result<()> {
    let ok = match schema.value_type {
        ParamType::Int => value.parse::<i64>().is_ok(),
        ParamType::Float => value.parse::<f64>().is_ok(),
        ParamType::Bool => matches!(value, "true" | "false"),
        ParamType::String => true,
    };
    if ok {
        Ok(())
    } else {
        error::InvalidValueSnafu {
            category: schema.category.clone(),
            param: schema.param.clone(),
            value: value.to_string(),
            reason: format!("expected a {:?}", schema.value_type),
        }
        .fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParamSnapshot {
        ParamSnapshot::from_schemas(vec![ParamSchema {
            category: "replication".into(),
            param: "workerEvictTimeoutSec".into(),
            value_type: ParamType::Int,
            default: "300".into(),
            description: String::new(),
            read_only: false,
            security_context: false,
        }])
    }

    #[test]
    fn rejects_value_of_wrong_type() {
        let snap = sample();
        let err = snap
            .with_value("replication", "workerEvictTimeoutSec", "not-a-number".into())
            .unwrap_err();
        assert!(matches!(err, error::Error::InvalidValue { .. }));
    }

    #[test]
    fn accepted_write_does_not_mutate_original() {
        let snap = sample();
        let next = snap
            .with_value("replication", "workerEvictTimeoutSec", "600".into())
            .unwrap();
        assert_eq!(snap.get("replication", "workerEvictTimeoutSec").unwrap().value, "300");
        assert_eq!(next.get("replication", "workerEvictTimeoutSec").unwrap().value, "600");
    }

    #[test]
    fn read_only_param_rejects_write() {
        let mut snap = sample();
        snap.entries
            .get_mut(&("replication".to_string(), "workerEvictTimeoutSec".to_string()))
            .unwrap()
            .schema
            .read_only = true;
        let err = snap
            .with_value("replication", "workerEvictTimeoutSec", "1".into())
            .unwrap_err();
        assert!(matches!(err, error::Error::ReadOnly { .. }));
    }
}
