//! Maps every downstream crate's error into an HTTP status + `{error,
//! details}` body, per §7's propagation policy: 4xx for domain errors, 5xx
//! for internal ones, 401 for auth failures.

use serde::Serialize;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("missing or invalid Authorization header"))]
    Unauthorized,

    #[snafu(display("expected API version {expected}, got {got}"))]
    VersionMismatch { expected: u32, got: u32 },

    #[snafu(display("malformed request body: {detail}"))]
    BadRequest { detail: String },

    #[snafu(display("no route for {method} {path}"))]
    NotFound { method: String, path: String },

    #[snafu(display("{source}"))]
    Config { source: czar_config::Error },

    #[snafu(display("{source}"))]
    Store { source: metastore::Error },

    #[snafu(display("{source}"))]
    Transaction { source: trans::Error },

    #[snafu(display("{source}"))]
    Control { source: replica_control::Error },
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

impl From<trans::Error> for Error {
    fn from(source: trans::Error) -> Self {
        Self::Transaction { source }
    }
}

impl From<replica_control::Error> for Error {
    fn from(source: replica_control::Error) -> Self {
        Self::Control { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    details: String,
}

impl Error {
    /// The status code a handler's `Err` becomes on the wire.
    pub fn status_code(&self) -> u16 {
        use czar_config::Error as CfgErr;
        use metastore::Error as StoreErr;
        use replica_control::Error as ControlErr;
        use trans::Error as TransErr;

        match self {
            Self::Unauthorized => 401,
            Self::VersionMismatch { .. } | Self::BadRequest { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Config {
                source: CfgErr::ReadOnly { .. } | CfgErr::UnknownParam { .. } | CfgErr::InvalidValue { .. },
            } => 400,
            Self::Store {
                source: StoreErr::NoSuchWorker { .. } | StoreErr::NoSuchFamily { .. } | StoreErr::NoSuchDatabase { .. } | StoreErr::NoSuchQuery { .. } | StoreErr::NoSuchTransaction { .. },
            } => 404,
            Self::Store {
                source: StoreErr::Conflict { .. },
            } => 409,
            Self::Transaction {
                source: TransErr::InvalidTransition { .. },
            } => 409,
            Self::Control {
                source: ControlErr::NoSuchWorker { .. },
            } => 404,
            Self::Control {
                source: ControlErr::BlockedByTransaction { .. },
            } => 409,
            _ => 500,
        }
    }

    pub fn body(&self) -> serde_json::Value {
        serde_json::to_value(ErrorBody {
            error: status_text(self.status_code()).to_string(),
            details: self.to_string(),
        })
        .expect("ErrorBody always serializes")
    }
}

fn status_text(code: u16) -> &'static str {
    match code {
        400 => "bad_request",
        401 => "unauthorized",
        404 => "not_found",
        409 => "conflict",
        _ => "internal_error",
    }
}
