//! Fallback strategies applied when a claim cannot be resolved.

use std::net::{IpAddr, SocketAddr};

use axum::http::{HeaderMap, HeaderName, StatusCode};

use super::debug_log;
use super::types::{FallbackKind, FallbackSpec, ResolutionFailure};
use crate::config::ConfigError;

/// A validated fallback strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// Reject with 400. Stops the chain wherever it appears.
    Error,
    /// Forward without touching the destination header.
    Pass,
    /// Use the remote address, port stripped.
    ClientIp,
    /// Copy another request header.
    Header {
        name: HeaderName,
        keep_if_empty: bool,
    },
    Unrecognized,
}

impl Fallback {
    pub fn from_spec(spec: &FallbackSpec) -> Result<Self, ConfigError> {
        Ok(match spec.kind {
            FallbackKind::Error => Self::Error,
            FallbackKind::Pass => Self::Pass,
            FallbackKind::Ip => Self::ClientIp,
            FallbackKind::Header => {
                let raw = spec
                    .header
                    .as_deref()
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .ok_or(ConfigError::Missing("CLAIM_FALLBACKS[].value"))?;
                let name = HeaderName::try_from(raw).map_err(|_| ConfigError::InvalidHeaderName {
                    key: "CLAIM_FALLBACKS[].value",
                    value: raw.to_string(),
                })?;
                Self::Header {
                    name,
                    keep_if_empty: spec.keep_if_empty,
                }
            }
            FallbackKind::Unrecognized => Self::Unrecognized,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    Value(String),
    PassThrough,
    Reject(StatusCode),
}

/// Ordered strategies; the first one that succeeds decides.
#[derive(Debug, Clone, Default)]
pub struct FallbackChain {
    strategies: Vec<Fallback>,
    debug: bool,
}

impl FallbackChain {
    pub fn new(strategies: Vec<Fallback>, debug: bool) -> Self {
        Self { strategies, debug }
    }

    pub fn from_specs(specs: &[FallbackSpec], debug: bool) -> Result<Self, ConfigError> {
        let strategies = specs
            .iter()
            .map(Fallback::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(strategies, debug))
    }

    pub fn resolve(
        &self,
        failure: ResolutionFailure,
        headers: &HeaderMap,
        remote_addr: Option<&str>,
    ) -> FallbackOutcome {
        if self.strategies.is_empty() {
            debug_log!(self.debug, %failure, "no fallback strategies, passing through");
            return FallbackOutcome::PassThrough;
        }

        debug_log!(self.debug, %failure, "finding fallback strategy");

        for (i, strategy) in self.strategies.iter().enumerate() {
            debug_log!(self.debug, index = i, ?strategy, "trying fallback strategy");

            let outcome = match strategy {
                Fallback::Error => FallbackOutcome::Reject(StatusCode::BAD_REQUEST),
                Fallback::Pass => FallbackOutcome::PassThrough,
                Fallback::ClientIp => {
                    FallbackOutcome::Value(strip_port(remote_addr.unwrap_or_default()))
                }
                Fallback::Header {
                    name,
                    keep_if_empty,
                } => {
                    // Absent, empty and non-ascii values are all treated as "".
                    let value = headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    if value.is_empty() && !keep_if_empty {
                        debug_log!(self.debug, header = %name, "header empty, skipping");
                        continue;
                    }
                    FallbackOutcome::Value(value.to_string())
                }
                Fallback::Unrecognized => {
                    debug_log!(self.debug, index = i, "unknown fallback type, skipping");
                    continue;
                }
            };

            debug_log!(self.debug, index = i, ?outcome, "fallback strategy succeeded");
            return outcome;
        }

        debug_log!(self.debug, "no fallback strategy succeeded, passing through");
        FallbackOutcome::PassThrough
    }
}

/// `1.2.3.4:5678` -> `1.2.3.4`, `[::1]:80` -> `::1`; bare addresses are unchanged.
pub fn strip_port(addr: &str) -> String {
    if let Ok(socket) = addr.parse::<SocketAddr>() {
        return socket.ip().to_string();
    }
    if addr.parse::<IpAddr>().is_ok() {
        return addr.to_string();
    }
    match addr.rfind(':') {
        Some(colon) => addr[..colon].to_string(),
        None => addr.to_string(),
    }
}
