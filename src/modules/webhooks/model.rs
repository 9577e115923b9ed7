use serde::{Deserialize, Serialize};
use std::fmt;
use storefront_cache::{InvalidationReport, ResourceClass};
use utoipa::ToSchema;
use validator::Validate;

/// Entity identifier as sent by upstream systems, which use both strings
/// and numbers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Out-of-band invalidation request, e.g. from the search indexer or an
/// admin tool writing to the catalog directly.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InvalidationRequest {
    /// Resource class, e.g. `product_detail` or `product`.
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "product_detail")]
    pub resource: ResourceClass,
    /// Affected entity. Omit to invalidate the whole class.
    pub id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BumpedVersion {
    pub class: String,
    pub version: i64,
}

/// What an invalidation did, in API form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct InvalidationSummary {
    pub deleted_keys: Vec<String>,
    pub bumped: Vec<BumpedVersion>,
    pub purged: u64,
}

impl From<InvalidationReport> for InvalidationSummary {
    fn from(report: InvalidationReport) -> Self {
        Self {
            deleted_keys: report
                .deleted_keys
                .into_iter()
                .map(|key| key.into_string())
                .collect(),
            bumped: report
                .bumped
                .into_iter()
                .map(|(class, version)| BumpedVersion {
                    class: class.name().to_string(),
                    version,
                })
                .collect(),
            purged: report.purged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_numeric_and_string_ids() {
        let numeric: InvalidationRequest =
            serde_json::from_str(r#"{"type": "product_detail", "id": 42}"#).unwrap();
        assert_eq!(numeric.resource, ResourceClass::ProductDetail);
        assert_eq!(numeric.id.unwrap().to_string(), "42");

        let text: InvalidationRequest =
            serde_json::from_str(r#"{"type": "inventory_count", "id": "sku-9"}"#).unwrap();
        assert_eq!(text.id, Some(EntityId::Text("sku-9".into())));

        let bulk: InvalidationRequest =
            serde_json::from_str(r#"{"type": "search_results"}"#).unwrap();
        assert!(bulk.id.is_none());
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(serde_json::from_str::<InvalidationRequest>(r#"{"type": "orders"}"#).is_err());
    }
}
