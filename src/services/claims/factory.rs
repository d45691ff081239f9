/// Factory: build `ClaimHeader` from application `Config`.
use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::services::claims::ClaimHeader;

pub fn build_claim_header(config: &Config) -> Result<Arc<ClaimHeader>, ConfigError> {
    let claim_header = ClaimHeader::new(config.claim_header.clone())?;
    Ok(Arc::new(claim_header))
}
