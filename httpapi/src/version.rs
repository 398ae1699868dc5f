use hyper::{Body, Request};

use crate::error::{Result, VersionMismatchSnafu};
use snafu::ensure;

/// The one API version this build speaks. Bumped whenever a wire-visible
/// request/response shape changes.
pub const API_VERSION: u32 = 1;

/// Every request must carry `Api-Version: <API_VERSION>`; a missing header
/// is treated as version 1 (pre-header clients), a present-but-wrong one is
/// rejected outright, per §4.10's "every handler validates an API-version
/// integer ... and rejects mismatches".
pub fn check(req: &Request<Body>) -> Result<()> {
    let got = req
        .headers()
        .get("api-version")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(API_VERSION);
    ensure!(
        got == API_VERSION,
        VersionMismatchSnafu {
            expected: API_VERSION,
            got,
        }
    );
    Ok(())
}
