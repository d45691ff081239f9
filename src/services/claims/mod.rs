//! Claim-to-header resolution.
//!
//! - `decoder`: unverified token decoding (trait + JWT implementation)
//! - `resolver`: source header -> claim value
//! - `fallback`: what to do when the claim cannot be resolved
//! - `service`: both combined into one per-request decision

/// `tracing::debug!`, emitted only when the instance was configured with `debug`.
macro_rules! debug_log {
    ($enabled:expr, $($arg:tt)+) => {{
        if $enabled {
            tracing::debug!($($arg)+);
        }
    }};
}
pub(crate) use debug_log;

pub mod decoder;
pub mod factory;
pub mod fallback;
pub mod resolver;
pub mod service;
pub mod types;

pub use decoder::{Claims, ClaimsDecoder, DecodeError, JwtClaimsDecoder};
pub use factory::build_claim_header;
pub use fallback::{Fallback, FallbackChain, FallbackOutcome, strip_port};
pub use resolver::{ClaimResolver, extract_claim};
pub use service::{ClaimHeader, Decision};
pub use types::{
    ClaimHeaderConfig, FallbackKind, FallbackSpec, ResolutionFailure, TokenScheme,
    parse_fallbacks,
};
