//! Configuration and outcome types shared by the resolver and the fallback chain.

use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// How the raw token is carried in the source header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenScheme {
    /// The whole header value is the token.
    #[default]
    Raw,
    /// `Bearer <token>`; the prefix is required.
    Bearer,
}

impl FromStr for TokenScheme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "bearer" => Ok(Self::Bearer),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackKind {
    Error,
    Pass,
    #[serde(alias = "client_ip")]
    Ip,
    Header,
    /// Missing or unknown `type`. Skipped at request time.
    #[default]
    #[serde(other)]
    Unrecognized,
}

/// One fallback entry as written in configuration.
///
/// Field names follow the plugin config:
/// `{"type": "header", "value": "X-Forwarded-User", "keepIfEmpty": false}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FallbackSpec {
    #[serde(rename = "type")]
    pub kind: FallbackKind,
    /// Source header for `header` strategies.
    #[serde(rename = "value", alias = "header")]
    pub header: Option<String>,
    pub keep_if_empty: bool,
}

impl FallbackSpec {
    pub fn new(kind: FallbackKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn header(name: impl Into<String>, keep_if_empty: bool) -> Self {
        Self {
            kind: FallbackKind::Header,
            header: Some(name.into()),
            keep_if_empty,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<FallbackSpec>),
    One(FallbackSpec),
}

/// Parses a fallback setting: either a single strategy object or an ordered array.
pub fn parse_fallbacks(raw: &str) -> Result<Vec<FallbackSpec>, serde_json::Error> {
    let parsed: OneOrMany = serde_json::from_str(raw)?;
    Ok(match parsed {
        OneOrMany::Many(specs) => specs,
        OneOrMany::One(spec) => vec![spec],
    })
}

/// Unvalidated settings for one middleware instance.
#[derive(Debug, Clone, Default)]
pub struct ClaimHeaderConfig {
    /// Header carrying the raw token.
    pub source_header: String,
    /// Claim to extract.
    pub claim_field: String,
    /// Header written for downstream consumers.
    pub destination_header: String,
    pub token_scheme: TokenScheme,
    /// Tried in order; empty means pass through untouched.
    pub fallbacks: Vec<FallbackSpec>,
    pub debug: bool,
}

/// Why a claim could not be resolved. Every variant routes into the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    #[error("source header is missing or empty")]
    MissingSourceHeader,
    #[error("token could not be decoded")]
    MalformedToken,
    #[error("claim is absent")]
    ClaimAbsent,
    #[error("claim is an empty list")]
    ClaimEmptyList,
    #[error("claim has an unexpected type")]
    ClaimWrongType,
    #[error("claim value is not a valid header value")]
    ClaimInvalidHeaderValue,
}
