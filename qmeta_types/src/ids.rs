//! Strongly-typed identifiers, each a thin wrapper around an integer or
//! name so a `ChunkId` can never be passed where a `JobId` is expected.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

macro_rules! int_id {
    ($name:ident, $repr:ty, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($repr);

        impl $name {
            /// Construct a new identifier from its raw representation.
            pub const fn new(v: $repr) -> Self {
                Self(v)
            }

            /// The raw representation.
            pub const fn get(&self) -> $repr {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                Display::fmt(&self.0, f)
            }
        }

        impl From<$repr> for $name {
            fn from(v: $repr) -> Self {
                Self::new(v)
            }
        }
    };
}

int_id!(QueryId, u64, "A user query, monotonic per czar and durable across restarts.");
int_id!(CzarId, u64, "A czar process instance.");
int_id!(ChunkId, i32, "A chunk number within a partitioned database.");
int_id!(SubChunkId, i32, "A sub-chunk number within a chunk.");
int_id!(JobId, u64, "A per-chunk query fragment, unique within a query.");
int_id!(UberJobId, u64, "A worker-local bundle of jobs sharing a query.");
int_id!(TransactionId, u32, "A super-transaction row.");
int_id!(ContributionId, u64, "One worker's contribution to a transaction.");

/// A worker's name, e.g. `"worker01"`. Interned as a plain `String` rather
/// than an integer because the catalog and the wire protocol both address
/// workers by name, never by ordinal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerName(String);

impl WorkerName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for WorkerName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<&str> for WorkerName {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

impl From<String> for WorkerName {
    fn from(v: String) -> Self {
        Self::new(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_serde_json() {
        let id = ChunkId::new(42);
        let encoded = serde_json::to_string(&id).unwrap();
        assert_eq!(encoded, "42");
        let decoded: ChunkId = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn worker_name_compares_by_value() {
        let a = WorkerName::from("worker01");
        let b = WorkerName::new("worker01".to_string());
        assert_eq!(a, b);
    }
}
