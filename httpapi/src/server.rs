//! Binds a `hyper` server and dispatches every request through
//! [`crate::routes::dispatch`], the same `Server::bind` + `make_service_fn`
//! shape every `hyper`-based service in the teacher's workspace uses.

use std::convert::Infallible;
use std::net::SocketAddr;

use hyper::service::{make_service_fn, service_fn};
use hyper::Server;
use observability_deps::tracing::info;

use crate::routes::dispatch;
use crate::state::AppState;

pub async fn serve(addr: SocketAddr, state: AppState) -> hyper::Result<()> {
    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(dispatch(req, state).await) }
            }))
        }
    });

    info!(%addr, "httpapi listening");
    Server::bind(&addr).serve(make_svc).await
}
