/*
 * Responsibility
 * - Shared context handed to the middleware (AppState)
 * - Clone is cheap (Arc inside); nothing in here is mutated after startup
 */
use std::sync::Arc;

use crate::services::claims::ClaimHeader;

#[derive(Clone, Debug)]
pub struct AppState {
    pub claim_header: Arc<ClaimHeader>,
}

impl AppState {
    pub fn new(claim_header: Arc<ClaimHeader>) -> Self {
        Self { claim_header }
    }
}
