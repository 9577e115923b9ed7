//! Product and inventory models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    /// Slug of the category the product is listed under.
    pub category: String,
    pub price_cents: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct InventoryLevel {
    pub product_id: i64,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePriceDto {
    #[validate(range(min = 0, message = "price_cents must not be negative"))]
    pub price_cents: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStockDto {
    #[validate(range(min = 0, message = "quantity must not be negative"))]
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StockCount {
    pub product_id: i64,
    #[validate(range(min = 0, message = "quantity must not be negative"))]
    pub quantity: i64,
}

/// Full or partial stock recount, e.g. after a warehouse audit.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StockRecountDto {
    #[validate(length(min = 1, max = 10000, message = "counts must not be empty"), nested)]
    pub counts: Vec<StockCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_price_dto_validation() {
        assert!(UpdatePriceDto { price_cents: 0 }.validate().is_ok());
        assert!(UpdatePriceDto { price_cents: 1999 }.validate().is_ok());
        assert!(UpdatePriceDto { price_cents: -1 }.validate().is_err());
    }

    #[test]
    fn test_update_stock_dto_validation() {
        assert!(UpdateStockDto { quantity: 12 }.validate().is_ok());
        assert!(UpdateStockDto { quantity: -3 }.validate().is_err());
    }

    #[test]
    fn test_stock_recount_validation() {
        let empty = StockRecountDto { counts: vec![] };
        assert!(empty.validate().is_err());

        let negative = StockRecountDto {
            counts: vec![StockCount {
                product_id: 1,
                quantity: -5,
            }],
        };
        assert!(negative.validate().is_err());

        let valid = StockRecountDto {
            counts: vec![
                StockCount {
                    product_id: 1,
                    quantity: 5,
                },
                StockCount {
                    product_id: 2,
                    quantity: 0,
                },
            ],
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_product_json_round_trip() {
        let json = r#"{
            "id": 7,
            "sku": "SH-001",
            "name": "Trail Runner",
            "description": null,
            "category": "shoes",
            "price_cents": 8999,
            "currency": "USD",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-02T00:00:00Z"
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 7);
        assert_eq!(product.category, "shoes");

        let back: Product = serde_json::from_value(serde_json::to_value(&product).unwrap()).unwrap();
        assert_eq!(back, product);
    }
}
