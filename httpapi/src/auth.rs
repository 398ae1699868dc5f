use hyper::{Body, Request};
use snafu::ensure;

use crate::error::{Result, UnauthorizedSnafu};
use crate::state::AuthType;

/// Checks the `Authorization: Bearer <token>` header against `auth_token`
/// when `auth` is [`AuthType::Required`]. [`AuthType::None`] routes are
/// never checked, even if a token is configured; a `None` `auth_token`
/// disables checking entirely (local/dev use).
pub fn check(req: &Request<Body>, auth_token: Option<&str>, auth: AuthType) -> Result<()> {
    if auth == AuthType::None {
        return Ok(());
    }
    let Some(expected) = auth_token else {
        return Ok(());
    };
    let presented = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    ensure!(presented == Some(expected), UnauthorizedSnafu);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_bearer(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri("/x");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn none_routes_skip_the_check_even_with_a_wrong_token() {
        let req = request_with_bearer(Some("wrong"));
        assert!(check(&req, Some("right"), AuthType::None).is_ok());
    }

    #[test]
    fn required_routes_reject_a_missing_or_wrong_token() {
        assert!(check(&request_with_bearer(None), Some("right"), AuthType::Required).is_err());
        assert!(check(&request_with_bearer(Some("wrong")), Some("right"), AuthType::Required).is_err());
        assert!(check(&request_with_bearer(Some("right")), Some("right"), AuthType::Required).is_ok());
    }

    #[test]
    fn an_unset_auth_token_disables_checking() {
        let req = request_with_bearer(None);
        assert!(check(&req, None, AuthType::Required).is_ok());
    }
}
