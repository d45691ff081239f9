use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName};
use serde_json::Value;

use super::debug_log;
use super::decoder::{Claims, ClaimsDecoder};
use super::types::{ResolutionFailure, TokenScheme};

const BEARER_PREFIX: &str = "Bearer ";

/// Turns the source header into a single claim value.
#[derive(Clone)]
pub struct ClaimResolver {
    source_header: HeaderName,
    claim_field: String,
    token_scheme: TokenScheme,
    decoder: Arc<dyn ClaimsDecoder>,
    debug: bool,
}

impl std::fmt::Debug for ClaimResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimResolver")
            .field("source_header", &self.source_header)
            .field("claim_field", &self.claim_field)
            .field("token_scheme", &self.token_scheme)
            .finish()
    }
}

impl ClaimResolver {
    pub fn new(
        source_header: HeaderName,
        claim_field: String,
        token_scheme: TokenScheme,
        decoder: Arc<dyn ClaimsDecoder>,
        debug: bool,
    ) -> Self {
        Self {
            source_header,
            claim_field,
            token_scheme,
            decoder,
            debug,
        }
    }

    pub fn resolve(&self, headers: &HeaderMap) -> Result<String, ResolutionFailure> {
        let Some(raw) = headers.get(&self.source_header) else {
            debug_log!(self.debug, header = %self.source_header, "source header absent");
            return Err(ResolutionFailure::MissingSourceHeader);
        };

        if raw.is_empty() {
            debug_log!(self.debug, header = %self.source_header, "source header empty");
            return Err(ResolutionFailure::MissingSourceHeader);
        }

        let raw = raw.to_str().map_err(|_| {
            debug_log!(self.debug, "source header is not visible ascii");
            ResolutionFailure::MalformedToken
        })?;

        let token = match self.token_scheme {
            TokenScheme::Raw => raw,
            // Prefix is mandatory: without it there is no token to decode.
            TokenScheme::Bearer => raw.strip_prefix(BEARER_PREFIX).unwrap_or(""),
        };

        let claims = self.decoder.decode_unverified(token).map_err(|err| {
            debug_log!(self.debug, error = %err, "could not decode token");
            ResolutionFailure::MalformedToken
        })?;

        let value = extract_claim(&claims, &self.claim_field);
        match &value {
            Ok(v) => debug_log!(self.debug, field = %self.claim_field, value = %v, "claim resolved"),
            Err(reason) => debug_log!(self.debug, field = %self.claim_field, %reason, "claim unusable"),
        }
        value
    }
}

/// Reads `field` from a decoded claim set.
///
/// A string is used as is. A list of strings yields its first element only.
pub fn extract_claim(claims: &Claims, field: &str) -> Result<String, ResolutionFailure> {
    match claims.get(field) {
        None => Err(ResolutionFailure::ClaimAbsent),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Array(items)) => {
            if !items.iter().all(Value::is_string) {
                return Err(ResolutionFailure::ClaimWrongType);
            }
            match items.first() {
                Some(Value::String(first)) => Ok(first.clone()),
                _ => Err(ResolutionFailure::ClaimEmptyList),
            }
        }
        Some(_) => Err(ResolutionFailure::ClaimWrongType),
    }
}
