use std::sync::Arc;

use czar_config::ConfigService;
use metric::Registry as MetricRegistry;
use replica_control::Controller;

/// Auth gating per §4.10: `None` routes are open; `Required` routes check
/// [`AppState::auth_token`] against the request's `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    None,
    Required,
}

/// Everything a handler needs, threaded through once at server construction.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ConfigService>,
    pub transactions: Arc<trans::Registry>,
    pub controller: Arc<Controller>,
    pub metrics: MetricRegistry,
    /// `None` disables bearer-token checking entirely (local/dev use);
    /// `Some(token)` is the single shared admin token mutating routes
    /// require, matching the spec's one-token `REQUIRED` auth type rather
    /// than a full user/role model, which is out of scope.
    pub auth_token: Option<String>,
}
