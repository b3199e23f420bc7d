//! Merchant web service boundary
//!
//! [`MerchantApi`] is the seam between the sync engine and the remote
//! service. [`TradeTrackerClient`] implements it over SOAP; tests substitute
//! their own implementations.
//!
//! # Example
//!
//! ```ignore
//! use tap_tradetracker::merchant::{MerchantApi, TradeTrackerClient};
//!
//! let client = TradeTrackerClient::open(&config)?;
//! client.authenticate().await?;
//! let campaigns = client.campaigns().await?;
//! client.close();
//! ```

mod client;

pub use client::{into_records, TradeTrackerClient};

use crate::error::Result;
use crate::types::JsonValue;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Remote calls the sync engine depends on
///
/// Every method returns raw decoded documents with the service's own field
/// names; normalization happens in the engine.
#[async_trait]
pub trait MerchantApi: Send + Sync {
    /// Start an authenticated session
    async fn authenticate(&self) -> Result<()>;

    /// List every campaign of the merchant
    async fn campaigns(&self) -> Result<Vec<JsonValue>>;

    /// List affiliate sites registered for a campaign
    async fn affiliate_sites(&self, campaign_id: i64) -> Result<Vec<JsonValue>>;

    /// Aggregated campaign report for an inclusive date range
    async fn campaign_report(
        &self,
        campaign_id: i64,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<JsonValue>;
}

#[cfg(test)]
mod tests;
