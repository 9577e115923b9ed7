use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use storefront_cache::ResourceClass;
use utoipa::ToSchema;
use validator::Validate;

/// How a clear is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClearMode {
    /// Bump class versions. Constant cost; old entries expire on their own.
    #[default]
    Version,
    /// Delete matching entries from the store. Cost grows with the keyspace.
    Purge,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ClearCacheRequest {
    /// Class to clear. Omit to clear every class.
    #[schema(value_type = Option<String>, example = "search_results")]
    pub class: Option<ResourceClass>,
    #[serde(default)]
    pub mode: ClearMode,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CacheStatsResponse {
    pub backend: String,
    pub enabled: bool,
    pub namespace: String,
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub in_flight: u64,
    /// Current version per class.
    pub versions: BTreeMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_defaults_to_version() {
        let request: ClearCacheRequest = serde_json::from_str(r#"{"class": "search"}"#).unwrap();
        assert_eq!(request.class, Some(ResourceClass::SearchResults));
        assert_eq!(request.mode, ClearMode::Version);

        let everything: ClearCacheRequest = serde_json::from_str(r#"{"mode": "purge"}"#).unwrap();
        assert!(everything.class.is_none());
        assert_eq!(everything.mode, ClearMode::Purge);
    }
}
