//! Claim header propagation.
//!
//! Reads the configured source header, resolves the claim (falling back when it
//! cannot be resolved) and writes the destination header before forwarding.
//!
//! Notes:
//! - The token is decoded WITHOUT signature verification. Downstream consumers must
//!   treat the propagated value as a hint (rate-limit key, routing), never as identity.
//! - The destination header is written at most once, replacing any client-sent value.

use std::net::SocketAddr;

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::claims::Decision;
use crate::state::AppState;

/// Install claim header propagation on every route of `router`.
///
/// ```ignore
/// let router = middleware::claim_header::apply(router, state.clone());
/// ```
pub fn apply(router: Router, state: AppState) -> Router {
    router.layer(middleware::from_fn_with_state(state, claim_header_middleware))
}

async fn claim_header_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());

    let claim_header = &state.claim_header;

    match claim_header.decide(req.headers(), remote_addr.as_deref()) {
        Decision::Propagate(value) => {
            req.headers_mut()
                .insert(claim_header.destination().clone(), value);
        }
        Decision::PassThrough => {}
        Decision::Reject(status) => return Err(AppError::Rejected(status)),
    }

    Ok(next.run(req).await)
}
