use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("no such database: {db}"))]
    NoSuchDb { db: String },

    #[snafu(display("no such table: {db}.{table}"))]
    NoSuchTable { db: String, table: String },

    #[snafu(display("catalog schema version mismatch: loaded {loaded}, expected {expected}"))]
    VersionMismatch { loaded: u32, expected: u32 },

    #[snafu(display("catalog has no schema-version key"))]
    VersionMissing,

    #[snafu(display("no such key: {key}"))]
    NoSuchKey { key: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
