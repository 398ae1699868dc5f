use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("plugin {plugin} requires table resolution but ran before the table plugin"))]
    PhaseOrderViolation { plugin: &'static str },

    #[snafu(display("{source}"))]
    Catalog { source: css::Error },

    #[snafu(display("unresolved column reference in FROM-less query"))]
    UnresolvedColumn,
}

impl From<css::Error> for Error {
    fn from(source: css::Error) -> Self {
        Self::Catalog { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
