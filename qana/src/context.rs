//! Per-query state threaded through the plugin pipeline alongside the
//! `SelectStmt` each plugin rewrites in place.

use query_ir::{ChunkContext, SecIdxRestrictor, ValueExpr};

#[derive(Debug, Clone, PartialEq)]
pub struct ScanInfo {
    pub db: String,
    pub table: String,
    pub lock_in_memory: bool,
    pub scan_rating: u32,
}

/// Chunk enumeration as determined so far: either "every chunk of this
/// database" or a director-index-driven restriction to a specific set.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkEnumeration {
    AllChunks,
    DirectorIndexLookup {
        database: String,
        director_index_table: String,
        key_column: String,
        key_value: String,
    },
}

#[derive(Debug, Clone)]
pub struct QueryContext {
    pub dominant_db: Option<String>,
    pub scan_info: Vec<ScanInfo>,
    pub is_interactive: bool,
    pub chunk_count: u32,
    pub interactive_chunk_limit: u32,
    pub slowest_scan_rating: u32,
    pub chunk_enumeration: ChunkEnumeration,
    /// Restrictors the director-index plugin has consumed and removed
    /// from the WHERE clause; kept here for observability/testing.
    pub consumed_restrictors: Vec<SecIdxRestrictor>,
    /// Set by the aggregation plugin when it splits the select list: the
    /// projection the proxy-visible result query runs over the assembled
    /// result table to finish a partial aggregate. Empty when the query
    /// wasn't an aggregate, meaning the result table's columns are already
    /// the final projection.
    pub merge_select_list: Vec<ValueExpr>,
}

impl QueryContext {
    pub fn new(interactive_chunk_limit: u32, slowest_scan_rating: u32) -> Self {
        Self {
            dominant_db: None,
            scan_info: Vec::new(),
            is_interactive: false,
            chunk_count: 0,
            interactive_chunk_limit,
            slowest_scan_rating,
            chunk_enumeration: ChunkEnumeration::AllChunks,
            consumed_restrictors: Vec::new(),
            merge_select_list: Vec::new(),
        }
    }

    /// A chunk-scoped template render context for a single chunk number,
    /// used by downstream dispatch once enumeration is known.
    pub fn chunk_render_context(chunk_id: i32, sub_chunk_id: Option<i32>) -> ChunkContext {
        ChunkContext {
            chunk_id,
            sub_chunk_id,
        }
    }
}
