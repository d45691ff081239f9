use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use super::debug_log;
use super::decoder::{ClaimsDecoder, JwtClaimsDecoder};
use super::fallback::{FallbackChain, FallbackOutcome};
use super::resolver::ClaimResolver;
use super::types::{ClaimHeaderConfig, ResolutionFailure};
use crate::config::ConfigError;

/// What the middleware must do with the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Write the destination header, then forward.
    Propagate(HeaderValue),
    /// Forward with the destination header left as the client sent it.
    PassThrough,
    /// Answer with this status; the next handler is not called.
    Reject(StatusCode),
}

/// Validated, read-only claim-header settings.
///
/// Holds no per-request state, so one instance can be shared across all requests.
#[derive(Debug, Clone)]
pub struct ClaimHeader {
    resolver: ClaimResolver,
    fallbacks: FallbackChain,
    destination: HeaderName,
    debug: bool,
}

impl ClaimHeader {
    pub fn new(config: ClaimHeaderConfig) -> Result<Self, ConfigError> {
        Self::with_decoder(config, Arc::new(JwtClaimsDecoder))
    }

    pub fn with_decoder(
        config: ClaimHeaderConfig,
        decoder: Arc<dyn ClaimsDecoder>,
    ) -> Result<Self, ConfigError> {
        let source = parse_header_name("CLAIM_SOURCE_HEADER", &config.source_header)?;
        let destination =
            parse_header_name("CLAIM_DESTINATION_HEADER", &config.destination_header)?;

        if config.claim_field.is_empty() {
            return Err(ConfigError::Missing("CLAIM_FIELD"));
        }

        let fallbacks = FallbackChain::from_specs(&config.fallbacks, config.debug)?;
        let resolver = ClaimResolver::new(
            source,
            config.claim_field,
            config.token_scheme,
            decoder,
            config.debug,
        );

        Ok(Self {
            resolver,
            fallbacks,
            destination,
            debug: config.debug,
        })
    }

    pub fn destination(&self) -> &HeaderName {
        &self.destination
    }

    pub fn decide(&self, headers: &HeaderMap, remote_addr: Option<&str>) -> Decision {
        let failure = match self.resolver.resolve(headers) {
            Ok(value) => match HeaderValue::from_str(&value) {
                Ok(value) => return Decision::Propagate(value),
                Err(_) => ResolutionFailure::ClaimInvalidHeaderValue,
            },
            Err(failure) => failure,
        };

        match self.fallbacks.resolve(failure, headers, remote_addr) {
            FallbackOutcome::Value(value) => match HeaderValue::from_str(&value) {
                Ok(value) => Decision::Propagate(value),
                Err(_) => {
                    debug_log!(self.debug, "fallback value is not a valid header value, passing through");
                    Decision::PassThrough
                }
            },
            FallbackOutcome::PassThrough => Decision::PassThrough,
            FallbackOutcome::Reject(status) => Decision::Reject(status),
        }
    }
}

fn parse_header_name(key: &'static str, raw: &str) -> Result<HeaderName, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::Missing(key));
    }
    HeaderName::try_from(raw).map_err(|_| ConfigError::InvalidHeaderName {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::services::claims::{Claims, DecodeError, FallbackKind, FallbackSpec};

    /// Returns a fixed claim set for any token.
    struct StaticDecoder(serde_json::Value);

    impl ClaimsDecoder for StaticDecoder {
        fn decode_unverified(&self, _token: &str) -> Result<Claims, DecodeError> {
            Ok(self.0.as_object().cloned().unwrap_or_default())
        }
    }

    fn config(fallbacks: Vec<FallbackSpec>) -> ClaimHeaderConfig {
        ClaimHeaderConfig {
            source_header: "X-ApiKey".to_string(),
            claim_field: "customer_id".to_string(),
            destination_header: "X-UserId-RateLimit".to_string(),
            fallbacks,
            ..ClaimHeaderConfig::default()
        }
    }

    fn with_token() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-apikey", HeaderValue::from_static("anything"));
        headers
    }

    #[test]
    fn resolved_claim_is_propagated_without_fallback() {
        let decoder = Arc::new(StaticDecoder(json!({ "customer_id": "u-1" })));
        let header =
            ClaimHeader::with_decoder(config(vec![FallbackSpec::new(FallbackKind::Error)]), decoder)
                .unwrap();

        assert_eq!(
            header.decide(&with_token(), None),
            Decision::Propagate(HeaderValue::from_static("u-1"))
        );
    }

    #[test]
    fn unrepresentable_claim_goes_to_fallback() {
        let decoder = Arc::new(StaticDecoder(json!({ "customer_id": "line\nbreak" })));
        let header =
            ClaimHeader::with_decoder(config(vec![FallbackSpec::new(FallbackKind::Ip)]), decoder)
                .unwrap();

        assert_eq!(
            header.decide(&with_token(), Some("9.9.9.9:1")),
            Decision::Propagate(HeaderValue::from_static("9.9.9.9"))
        );
    }

    #[test]
    fn missing_header_with_error_fallback_rejects() {
        let header = ClaimHeader::new(config(vec![FallbackSpec::new(FallbackKind::Error)])).unwrap();

        assert_eq!(
            header.decide(&HeaderMap::new(), None),
            Decision::Reject(StatusCode::BAD_REQUEST)
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn decide_with_log(debug: bool, headers: &HeaderMap) -> (Decision, String) {
        let mut cfg = config(vec![
            FallbackSpec::header("X-Foo", false),
            FallbackSpec::new(FallbackKind::Ip),
        ]);
        cfg.debug = debug;
        let header = ClaimHeader::new(cfg).unwrap();

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        let decision = tracing::subscriber::with_default(subscriber, || {
            header.decide(headers, Some("1.2.3.4:5678"))
        });

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        (decision, output)
    }

    #[test]
    fn decision_lines_are_logged_only_in_debug_mode() {
        let (quiet, quiet_log) = decide_with_log(false, &HeaderMap::new());
        let (verbose, verbose_log) = decide_with_log(true, &HeaderMap::new());

        assert_eq!(quiet, verbose);
        assert_eq!(verbose, Decision::Propagate(HeaderValue::from_static("1.2.3.4")));
        assert!(quiet_log.is_empty(), "unexpected output: {quiet_log}");
        assert!(verbose_log.contains("source header absent"));
        assert!(verbose_log.contains("header empty, skipping"));
        assert!(verbose_log.contains("fallback strategy succeeded"));
    }

    #[test]
    fn destination_name_is_case_insensitive() {
        let header = ClaimHeader::new(config(vec![])).unwrap();
        assert_eq!(header.destination().as_str(), "x-userid-ratelimit");
    }

    #[test]
    fn invalid_settings_fail_construction() {
        let mut bad = config(vec![]);
        bad.destination_header = "not a header".to_string();
        assert!(matches!(
            ClaimHeader::new(bad),
            Err(ConfigError::InvalidHeaderName {
                key: "CLAIM_DESTINATION_HEADER",
                ..
            })
        ));

        let mut bad = config(vec![]);
        bad.claim_field.clear();
        assert!(matches!(
            ClaimHeader::new(bad),
            Err(ConfigError::Missing("CLAIM_FIELD"))
        ));
    }
}
