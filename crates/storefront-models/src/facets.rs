//! Per-category aggregates shown beside listings.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Upper bounds (exclusive, in cents) of the price buckets. The last bucket
/// is open-ended.
pub const PRICE_BUCKET_BOUNDS: [i64; 4] = [2_500, 5_000, 10_000, 25_000];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceBucket {
    pub min_cents: i64,
    /// `None` for the open-ended top bucket.
    pub max_cents: Option<i64>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryFacets {
    pub category: String,
    pub product_count: i64,
    pub in_stock_count: i64,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    pub price_buckets: Vec<PriceBucket>,
}

impl CategoryFacets {
    /// Aggregates facets from `(price_cents, quantity)` pairs.
    pub fn from_listings(category: impl Into<String>, listings: &[(i64, i64)]) -> Self {
        let mut lower = 0;
        let mut price_buckets: Vec<PriceBucket> = PRICE_BUCKET_BOUNDS
            .iter()
            .map(|&upper| {
                let bucket = PriceBucket {
                    min_cents: lower,
                    max_cents: Some(upper),
                    count: 0,
                };
                lower = upper;
                bucket
            })
            .collect();
        price_buckets.push(PriceBucket {
            min_cents: lower,
            max_cents: None,
            count: 0,
        });

        for &(price, _) in listings {
            let index = PRICE_BUCKET_BOUNDS
                .iter()
                .position(|&upper| price < upper)
                .unwrap_or(PRICE_BUCKET_BOUNDS.len());
            price_buckets[index].count += 1;
        }

        Self {
            category: category.into(),
            product_count: listings.len() as i64,
            in_stock_count: listings.iter().filter(|(_, qty)| *qty > 0).count() as i64,
            min_price_cents: listings.iter().map(|(price, _)| *price).min(),
            max_price_cents: listings.iter().map(|(price, _)| *price).max(),
            price_buckets,
        }
    }
}
