//! Spatial and secondary-index restrictors. These never re-join the
//! predicate tree after the plugin pipeline resolves them — they become
//! chunk-enumeration inputs to the dispatcher and index lookups against
//! the director index, not SQL text.

#[derive(Debug, Clone, PartialEq)]
pub enum AreaRestrictor {
    Box {
        ra_min: f64,
        decl_min: f64,
        ra_max: f64,
        decl_max: f64,
    },
    Circle { ra: f64, decl: f64, radius_deg: f64 },
    Ellipse {
        ra: f64,
        decl: f64,
        semi_major_deg: f64,
        semi_minor_deg: f64,
        angle_deg: f64,
    },
    Poly { vertices: Vec<(f64, f64)> },
    Hull { vertices: Vec<(f64, f64)> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SecIdxRestrictor {
    /// `column = value` (or another comparison) against a secondary-index
    /// column such as a director key.
    Compare {
        column: String,
        op: crate::bool_term::CompOp,
        value: String,
    },
    Between {
        column: String,
        lo: String,
        hi: String,
    },
}

impl SecIdxRestrictor {
    /// The column name a director-index lookup would key on, if this
    /// restrictor names one.
    pub fn column(&self) -> &str {
        match self {
            SecIdxRestrictor::Compare { column, .. } => column,
            SecIdxRestrictor::Between { column, .. } => column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool_term::CompOp;

    #[test]
    fn compare_restrictor_exposes_its_column() {
        let r = SecIdxRestrictor::Compare {
            column: "objectId".into(),
            op: CompOp::Eq,
            value: "12345".into(),
        };
        assert_eq!(r.column(), "objectId");
    }
}
