use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("configuration parameter {category}.{param} is read-only"))]
    ReadOnly { category: String, param: String },

    #[snafu(display("unknown configuration parameter {category}.{param}"))]
    UnknownParam { category: String, param: String },

    #[snafu(display("invalid value {value:?} for {category}.{param}: {reason}"))]
    InvalidValue {
        category: String,
        param: String,
        value: String,
        reason: String,
    },

    #[snafu(display("{source}"))]
    Store { source: metastore::Error },

    #[snafu(display("{source}"))]
    Catalog { source: css::Error },
}

impl From<metastore::Error> for Error {
    fn from(source: metastore::Error) -> Self {
        Self::Store { source }
    }
}

impl From<css::Error> for Error {
    fn from(source: css::Error) -> Self {
        Self::Catalog { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
