use qmeta_types::QueryId;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("no such in-flight query: {query_id}"))]
    NoSuchQuery { query_id: QueryId },

    #[snafu(display("query {query_id} already left EXECUTING state"))]
    AlreadyTerminal { query_id: QueryId },

    #[snafu(display("result database rejected {sql:?}: {detail}"))]
    ResultDb { sql: String, detail: String },

    #[snafu(display("{source}"))]
    Store { source: metastore::Error },

    #[snafu(display("{source}"))]
    Analysis { source: qana::Error },
}

impl From<metastore::Error> for Error {
    fn from(source: metastore::Error) -> Self {
        Self::Store { source }
    }
}

impl From<qana::Error> for Error {
    fn from(source: qana::Error) -> Self {
        Self::Analysis { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
