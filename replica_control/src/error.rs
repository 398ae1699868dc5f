use qmeta_types::WorkerName;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("no such worker {worker}"))]
    NoSuchWorker { worker: WorkerName },

    #[snafu(display("job {kind} failed: {detail}"))]
    JobFailed { kind: &'static str, detail: String },

    #[snafu(display("database {database} has a non-terminal transaction and cannot be un-published"))]
    BlockedByTransaction { database: String },

    #[snafu(display("{source}"))]
    Config { source: czar_config::Error },

    #[snafu(display("{source}"))]
    Store { source: metastore::Error },

    #[snafu(display("{source}"))]
    Transaction { source: trans::Error },
}

impl From<trans::Error> for Error {
    fn from(source: trans::Error) -> Self {
        Self::Transaction { source }
    }
}

impl From<czar_config::Error> for Error {
    fn from(source: czar_config::Error) -> Self {
        Self::Config { source }
    }
}

impl From<metastore::Error> for Error {
    fn from(source: metastore::Error) -> Self {
        Self::Store { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
