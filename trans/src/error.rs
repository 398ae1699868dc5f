use qmeta_types::{TransactionId, TransactionState};
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("transaction {id} cannot move from {from:?} to {to:?}"))]
    InvalidTransition {
        id: TransactionId,
        from: TransactionState,
        to: TransactionState,
    },

    #[snafu(display("{source}"))]
    Store { source: metastore::Error },
}

impl From<metastore::Error> for Error {
    fn from(source: metastore::Error) -> Self {
        Self::Store { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
