//! # Configuration & Catalog Seams
//!
//! Read-only collaborators the register consumes at session start. Both
//! are external services; the engine only defines the boundary and the
//! fallback behavior when they are unreachable.

use async_trait::async_trait;
use tracing::warn;

use till_core::{CatalogItem, PricingConfig, TipConfig};

use crate::error::PersistenceError;

// =============================================================================
// Configuration Provider
// =============================================================================

/// Per-business pricing and tip settings.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    async fn pricing(&self) -> Result<PricingConfig, PersistenceError>;
    async fn tips(&self) -> Result<TipConfig, PersistenceError>;
}

/// Loads pricing configuration, falling back to the documented default
/// (8% tax on products, standard pricing) when the provider is down.
///
/// A register that cannot reach the config service must still ring sales;
/// failing the whole session over a config fetch would be worse than a
/// temporarily-default tax rate.
pub async fn load_pricing(provider: &dyn ConfigProvider) -> PricingConfig {
    match provider.pricing().await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "pricing config unavailable, using defaults");
            PricingConfig::default()
        }
    }
}

/// Same fallback policy for tip settings.
pub async fn load_tips(provider: &dyn ConfigProvider) -> TipConfig {
    match provider.tips().await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "tip config unavailable, using defaults");
            TipConfig::default()
        }
    }
}

/// Fixed-answer provider for tests and the demo binary.
#[derive(Debug, Clone)]
pub struct StaticConfigProvider {
    pub pricing: PricingConfig,
    pub tips: TipConfig,
}

#[async_trait]
impl ConfigProvider for StaticConfigProvider {
    async fn pricing(&self) -> Result<PricingConfig, PersistenceError> {
        Ok(self.pricing.clone())
    }

    async fn tips(&self) -> Result<TipConfig, PersistenceError> {
        Ok(self.tips.clone())
    }
}

// =============================================================================
// Catalog Provider
// =============================================================================

/// The service/product catalog, refreshed on demand.
///
/// Catalog editing, categories, and stock live entirely on the other side
/// of this seam; the register only needs ringable items.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn items(&self) -> Result<Vec<CatalogItem>, PersistenceError>;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use till_core::DEFAULT_TAX_RATE_BPS;

    struct DownProvider;

    #[async_trait]
    impl ConfigProvider for DownProvider {
        async fn pricing(&self) -> Result<PricingConfig, PersistenceError> {
            Err(PersistenceError("connection refused".into()))
        }

        async fn tips(&self) -> Result<TipConfig, PersistenceError> {
            Err(PersistenceError("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_falls_back_to_default_rate_when_provider_down() {
        let config = load_pricing(&DownProvider).await;
        assert_eq!(config.tax_rate.bps(), DEFAULT_TAX_RATE_BPS);

        let tips = load_tips(&DownProvider).await;
        assert!(tips.enabled);
    }

    #[tokio::test]
    async fn test_static_provider_round_trips() {
        let provider = StaticConfigProvider {
            pricing: PricingConfig::default(),
            tips: TipConfig {
                enabled: false,
                ..TipConfig::default()
            },
        };
        assert!(!load_tips(&provider).await.enabled);
    }
}
