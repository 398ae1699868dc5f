use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("sql error: {source}"))]
    Sql { source: sqlx::Error },

    #[snafu(display("no such worker: {name}"))]
    NoSuchWorker { name: String },

    #[snafu(display("no such family: {name}"))]
    NoSuchFamily { name: String },

    #[snafu(display("no such database: {name}"))]
    NoSuchDatabase { name: String },

    #[snafu(display("no such query: {query_id}"))]
    NoSuchQuery { query_id: i64 },

    #[snafu(display("no such transaction: {id}"))]
    NoSuchTransaction { id: i64 },

    #[snafu(display("conflict: {detail}"))]
    Conflict { detail: String },
}

impl From<sqlx::Error> for Error {
    fn from(source: sqlx::Error) -> Self {
        Self::Sql { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
