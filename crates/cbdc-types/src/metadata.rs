//! Token metadata
//!
//! Written exactly once by Initialize. Presence of the name field in the
//! world state is the sentinel for "contract initialized".

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of decimal places a token may declare
pub const MAX_DECIMALS: u8 = 18;

/// Immutable token metadata set at initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human-readable name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Display decimals, 0..=18
    pub decimals: u8,
}

/// Metadata validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("token name must not be empty")]
    EmptyName,

    #[error("token symbol must not be empty")]
    EmptySymbol,

    #[error("token decimals must be at most {MAX_DECIMALS}, got {decimals}")]
    DecimalsOutOfRange { decimals: u8 },
}

impl TokenMetadata {
    /// Validate and construct metadata.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
    ) -> Result<Self, MetadataError> {
        let name = name.into();
        let symbol = symbol.into();

        if name.trim().is_empty() {
            return Err(MetadataError::EmptyName);
        }
        if symbol.trim().is_empty() {
            return Err(MetadataError::EmptySymbol);
        }
        if decimals > MAX_DECIMALS {
            return Err(MetadataError::DecimalsOutOfRange { decimals });
        }

        Ok(Self {
            name,
            symbol,
            decimals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_metadata() {
        let meta = TokenMetadata::new("Digital Yuan", "DCEP", 2).unwrap();
        assert_eq!(meta.name, "Digital Yuan");
        assert_eq!(meta.symbol, "DCEP");
        assert_eq!(meta.decimals, 2);
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            TokenMetadata::new("  ", "DCEP", 2),
            Err(MetadataError::EmptyName)
        ));
    }

    #[test]
    fn test_decimals_out_of_range() {
        assert!(matches!(
            TokenMetadata::new("Digital Yuan", "DCEP", 19),
            Err(MetadataError::DecimalsOutOfRange { decimals: 19 })
        ));
        assert!(TokenMetadata::new("Digital Yuan", "DCEP", 18).is_ok());
    }
}
