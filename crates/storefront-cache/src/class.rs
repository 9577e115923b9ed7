//! Resource classes and their TTL policy.
//!
//! Every cached value belongs to exactly one [`ResourceClass`]. The class
//! decides the key segment, the TTL, how clients may cache the response and
//! which other classes are invalidated alongside it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Category of cached entity sharing a TTL and an invalidation policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ResourceClass {
    ProductDetail,
    SearchResults,
    CategoryFacets,
    CartSnapshot,
    SessionProfile,
    TrendingRollup,
    InventoryCount,
}

impl ResourceClass {
    pub const ALL: [ResourceClass; 7] = [
        ResourceClass::ProductDetail,
        ResourceClass::SearchResults,
        ResourceClass::CategoryFacets,
        ResourceClass::CartSnapshot,
        ResourceClass::SessionProfile,
        ResourceClass::TrendingRollup,
        ResourceClass::InventoryCount,
    ];

    /// Key segment identifying the class inside a cache key.
    pub fn kind(self) -> &'static str {
        match self {
            Self::ProductDetail => "product",
            Self::SearchResults => "search",
            Self::CategoryFacets => "facets",
            Self::CartSnapshot => "cart",
            Self::SessionProfile => "session",
            Self::TrendingRollup => "trending",
            Self::InventoryCount => "inventory",
        }
    }

    /// Snake-case name used in webhook and admin payloads.
    pub fn name(self) -> &'static str {
        match self {
            Self::ProductDetail => "product_detail",
            Self::SearchResults => "search_results",
            Self::CategoryFacets => "category_facets",
            Self::CartSnapshot => "cart_snapshot",
            Self::SessionProfile => "session_profile",
            Self::TrendingRollup => "trending_rollup",
            Self::InventoryCount => "inventory_count",
        }
    }

    /// Allowed TTL window in seconds. The upper bound is the acceptable
    /// staleness for the class.
    pub fn ttl_bounds(self) -> RangeInclusive<u64> {
        match self {
            Self::ProductDetail => 60..=120,
            Self::SearchResults => 30..=30,
            Self::CategoryFacets => 300..=600,
            Self::CartSnapshot => 30..=30,
            Self::SessionProfile => 120..=600,
            Self::TrendingRollup => 900..=900,
            Self::InventoryCount => 10..=10,
        }
    }

    pub fn default_ttl(self) -> Duration {
        let secs = match self {
            Self::ProductDetail => 90,
            Self::SearchResults => 30,
            Self::CategoryFacets => 300,
            Self::CartSnapshot => 30,
            Self::SessionProfile => 300,
            Self::TrendingRollup => 900,
            Self::InventoryCount => 10,
        };
        Duration::from_secs(secs)
    }

    /// User-specific classes must never be stored by shared caches.
    pub fn is_private(self) -> bool {
        matches!(self, Self::CartSnapshot | Self::SessionProfile)
    }

    /// Classes whose entity keys share this class's identifier, so a
    /// single-entity mutation deletes all of them.
    pub fn entity_companions(self) -> &'static [ResourceClass] {
        match self {
            Self::ProductDetail => &[Self::InventoryCount],
            Self::InventoryCount => &[Self::ProductDetail],
            _ => &[],
        }
    }

    /// Filter-dependent classes that embed data of this class and therefore
    /// need a version bump whenever it changes.
    pub fn cascade(self) -> &'static [ResourceClass] {
        match self {
            Self::ProductDetail => &[Self::SearchResults, Self::CategoryFacets],
            Self::InventoryCount => &[Self::SearchResults, Self::CategoryFacets],
            _ => &[],
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown resource class: {0}")]
pub struct UnknownResourceClass(pub String);

impl FromStr for ResourceClass {
    type Err = UnknownResourceClass;

    /// Accepts both the payload name (`product_detail`) and the key segment
    /// (`product`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|class| class.name() == needle || class.kind() == needle)
            .ok_or_else(|| UnknownResourceClass(s.to_string()))
    }
}

impl TryFrom<String> for ResourceClass {
    type Error = UnknownResourceClass;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Effective TTL per resource class.
///
/// # Environment Variables
///
/// - `CACHE_TTL_<CLASS>`: TTL override in seconds, e.g.
///   `CACHE_TTL_PRODUCT_DETAIL=120`. Values outside the class window are
///   clamped into it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TtlPolicy {
    overrides: HashMap<ResourceClass, Duration>,
}

impl TtlPolicy {
    pub fn from_env() -> Self {
        let mut policy = Self::default();
        for class in ResourceClass::ALL {
            let var = format!("CACHE_TTL_{}", class.name().to_ascii_uppercase());
            if let Some(secs) = std::env::var(&var).ok().and_then(|v| v.parse::<u64>().ok()) {
                policy = policy.with_override(class, Duration::from_secs(secs));
            }
        }
        policy
    }

    /// Overrides the TTL of a class, clamping it into the class window.
    pub fn with_override(mut self, class: ResourceClass, ttl: Duration) -> Self {
        let bounds = class.ttl_bounds();
        let requested = ttl.as_secs();
        let clamped = requested.clamp(*bounds.start(), *bounds.end());
        if clamped != requested {
            warn!(
                cache.class = %class,
                requested_secs = requested,
                applied_secs = clamped,
                "TTL override outside allowed window, clamping"
            );
        }
        self.overrides.insert(class, Duration::from_secs(clamped));
        self
    }

    pub fn ttl(&self, class: ResourceClass) -> Duration {
        self.overrides
            .get(&class)
            .copied()
            .unwrap_or_else(|| class.default_ttl())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttls_within_bounds() {
        for class in ResourceClass::ALL {
            let ttl = class.default_ttl().as_secs();
            assert!(
                class.ttl_bounds().contains(&ttl),
                "{class} default TTL {ttl}s outside its window"
            );
        }
    }

    #[test]
    fn test_inventory_is_near_real_time() {
        assert_eq!(ResourceClass::InventoryCount.default_ttl(), Duration::from_secs(10));
        assert_eq!(ResourceClass::TrendingRollup.default_ttl(), Duration::from_secs(900));
    }

    #[test]
    fn test_override_is_clamped_to_staleness_window() {
        let policy = TtlPolicy::default()
            .with_override(ResourceClass::ProductDetail, Duration::from_secs(3600))
            .with_override(ResourceClass::CategoryFacets, Duration::from_secs(5));

        assert_eq!(policy.ttl(ResourceClass::ProductDetail), Duration::from_secs(120));
        assert_eq!(policy.ttl(ResourceClass::CategoryFacets), Duration::from_secs(300));
        assert_eq!(policy.ttl(ResourceClass::SearchResults), Duration::from_secs(30));
    }

    #[test]
    fn test_parse_accepts_name_and_kind() {
        assert_eq!(
            "product_detail".parse::<ResourceClass>().unwrap(),
            ResourceClass::ProductDetail
        );
        assert_eq!("search".parse::<ResourceClass>().unwrap(), ResourceClass::SearchResults);
        assert!("widgets".parse::<ResourceClass>().is_err());
    }

    #[test]
    fn test_serde_names_match_display() {
        for class in ResourceClass::ALL {
            let json = serde_json::to_string(&class).unwrap();
            assert_eq!(json, format!("\"{}\"", class.name()));
            assert_eq!(serde_json::from_str::<ResourceClass>(&json).unwrap(), class);
        }

        let by_kind: ResourceClass = serde_json::from_str(r#""inventory""#).unwrap();
        assert_eq!(by_kind, ResourceClass::InventoryCount);
    }

    #[test]
    fn test_stock_changes_reach_facets() {
        // Facets carry an in-stock count, listings an in-stock filter.
        let cascade = ResourceClass::InventoryCount.cascade();
        assert!(cascade.contains(&ResourceClass::SearchResults));
        assert!(cascade.contains(&ResourceClass::CategoryFacets));
    }

    #[test]
    fn test_private_classes() {
        assert!(ResourceClass::CartSnapshot.is_private());
        assert!(ResourceClass::SessionProfile.is_private());
        assert!(!ResourceClass::ProductDetail.is_private());
    }
}
