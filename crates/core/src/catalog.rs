//! Catalog data types and the `CatalogStore` interface.
//!
//! The catalog (AI use cases, favorites, recents and usage records) lives
//! behind [`CatalogStore`]. The portal consumes it; it does not ship a storage
//! engine for it. Failures are reported once to the caller, with no retry and
//! no caching at this layer.

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CatalogEntryId, UsageRecordId, UserId};

/// Errors reported by a catalog backend.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The referenced entry does not exist (or no longer exists).
    #[error("catalog entry not found: {0}")]
    NotFound(CatalogEntryId),
    /// The backend could not serve the request.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// A catalog entry ("use case").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: CatalogEntryId,
    pub name: String,
    pub description: String,
    pub status: String,
    pub scope: String,
    pub owner_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guide_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_url: Option<String>,
}

/// Data for a new catalog entry. The backend assigns the id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCatalogEntry {
    pub name: String,
    pub description: String,
    pub status: String,
    pub scope: String,
    pub owner_id: UserId,
    #[serde(default)]
    pub guide_url: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub access_url: Option<String>,
}

/// Catalog listing filter. Every set field must match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogFilter {
    pub status: Option<String>,
    pub owner: Option<UserId>,
    /// Case-insensitive substring of the name or the description.
    pub search: Option<String>,
    pub scope: Option<String>,
}

impl CatalogFilter {
    /// Whether `entry` passes this filter.
    #[must_use]
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if self.status.as_ref().is_some_and(|s| *s != entry.status) {
            return false;
        }
        if self.owner.as_ref().is_some_and(|o| *o != entry.owner_id) {
            return false;
        }
        if self.scope.as_ref().is_some_and(|s| *s != entry.scope) {
            return false;
        }
        match &self.search {
            Some(search) => {
                let needle = search.to_lowercase();
                entry.name.to_lowercase().contains(&needle)
                    || entry.description.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// One access to a catalog entry, with its consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub id: UsageRecordId,
    pub user_id: UserId,
    pub use_case_id: CatalogEntryId,
    pub tokens_used: u64,
    pub cost_eur: Decimal,
    pub carbon_kg: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Most recent access of a user to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAccess {
    pub use_case_id: CatalogEntryId,
    pub last_accessed: DateTime<Utc>,
}

/// Portal-wide totals for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalMetrics {
    pub total_entries: u64,
    pub active_users: u64,
    pub total_accesses: u64,
    pub total_tokens: u64,
    pub total_cost_eur: Decimal,
    pub total_carbon_kg: Decimal,
}

/// Per-entry usage aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub use_case_id: CatalogEntryId,
    pub accesses: u64,
    pub distinct_users: u64,
    pub tokens_used: u64,
    pub cost_eur: Decimal,
}

/// The catalog data service consumed by the presentation layer.
pub trait CatalogStore: Send + Sync {
    fn fetch_entries(
        &self,
        filter: &CatalogFilter,
    ) -> impl Future<Output = Result<Vec<CatalogEntry>, CatalogError>> + Send;

    /// Record that `user` opened `entry`, returning the usage record.
    fn record_access(
        &self,
        entry: &CatalogEntryId,
        user: &UserId,
    ) -> impl Future<Output = Result<UsageRecord, CatalogError>> + Send;

    /// Adding an existing favorite is a no-op.
    fn add_favorite(
        &self,
        user: &UserId,
        entry: &CatalogEntryId,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;

    /// Removing a missing favorite is a no-op.
    fn remove_favorite(
        &self,
        user: &UserId,
        entry: &CatalogEntryId,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;

    fn list_favorites(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<Vec<CatalogEntryId>, CatalogError>> + Send;

    /// Most recent first.
    fn list_recents(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<Vec<RecentAccess>, CatalogError>> + Send;

    fn create_entry(
        &self,
        entry: NewCatalogEntry,
    ) -> impl Future<Output = Result<CatalogEntry, CatalogError>> + Send;

    fn global_metrics(&self) -> impl Future<Output = Result<GlobalMetrics, CatalogError>> + Send;

    fn usage_stats(&self) -> impl Future<Output = Result<Vec<UsageStats>, CatalogError>> + Send;
}
