//! prbuild HTTP trigger surface.
//!
//! Binds a loopback HTTP server whose only behaviour is: take the request
//! path, hand it to [`pipeline::BuildTrigger::handle`], and answer
//!
//! | Outcome | Response |
//! |---------|----------|
//! | viewer location | `302 Found`, `Location: <viewer>/shas/<sha>` |
//! | any [`pipeline::TriggerError`] | `400 Bad Request`, error text as plain-text body |
//!
//! Every method and every path reaches the same handler; the path alone
//! decides what happens. The path is percent-decoded first, so `/%31%32`
//! names pull request 12.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP framing lives here. The [`pipeline`] crate never
//! sees status codes or headers.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use percent_encoding::percent_decode_str;
use pipeline::{BuildTrigger, TriggerError};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Builds the router serving every path with the trigger handler.
pub fn router(trigger: Arc<BuildTrigger>) -> Router {
    Router::new().fallback(trigger_handler).with_state(trigger)
}

async fn trigger_handler(State(trigger): State<Arc<BuildTrigger>>, uri: Uri) -> Response {
    let Ok(path) = percent_decode_str(uri.path()).decode_utf8() else {
        return reject(&uri, &TriggerError::BadPath);
    };
    let path = path.into_owned();
    // Run detached so a client disconnect does not abort a build half way.
    let task = tokio::spawn(async move { trigger.handle(&path).await });
    match task.await {
        Ok(Ok(location)) => (
            StatusCode::FOUND,
            [(header::LOCATION, location.to_string())],
        )
            .into_response(),
        Ok(Err(err)) => reject(&uri, &err),
        Err(join_error) => {
            error!(path = uri.path(), error = %join_error, "trigger task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

fn reject(uri: &Uri, err: &TriggerError) -> Response {
    warn!(path = uri.path(), error = %err, "request rejected");
    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
}

/// Serves `router` on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening for build triggers");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Binds `127.0.0.1:<port>`.
pub async fn bind_loopback(port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port))).await
}
