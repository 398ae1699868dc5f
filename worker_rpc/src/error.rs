use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("worker {worker} unreachable: {detail}"))]
    Unreachable { worker: String, detail: String },

    #[snafu(display("worker {worker} returned a malformed response: {detail}"))]
    Malformed { worker: String, detail: String },

    #[snafu(display("worker {worker} timed out after {timeout_ms}ms"))]
    Timeout { worker: String, timeout_ms: u64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
