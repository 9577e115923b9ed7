use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use storefront_models::{
    CategoryFacets, InventoryLevel, Product, SearchPage, SearchQuery, SearchSort, StockCount,
};
use tokio::sync::RwLock;
use tracing::instrument;

use super::{Catalog, CatalogError};

#[derive(Debug, Default)]
struct Inner {
    products: BTreeMap<i64, Product>,
    stock: HashMap<i64, InventoryLevel>,
}

/// Catalog held in process memory.
///
/// Serves demo mode when no database is configured, and lets tests count
/// how often the source of truth is actually queried.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<Inner>,
    reads: AtomicUsize,
    latency: Option<Duration>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-filled with a handful of products across two categories.
    pub fn seeded() -> Self {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().unwrap_or_default();
        let seed = [
            (1, "SH-001", "Trail Runner", "shoes", 8_999, 12),
            (2, "SH-002", "Road Racer", "shoes", 12_999, 0),
            (3, "SH-003", "Canvas Low", "shoes", 4_599, 40),
            (4, "BG-001", "Day Pack", "bags", 5_999, 7),
            (5, "BG-002", "Travel Duffel", "bags", 14_999, 3),
        ];

        let mut inner = Inner::default();
        for (id, sku, name, category, price_cents, quantity) in seed {
            let at = created + chrono::Duration::days(id);
            inner.products.insert(
                id,
                Product {
                    id,
                    sku: sku.into(),
                    name: name.into(),
                    description: None,
                    category: category.into(),
                    price_cents,
                    currency: "USD".into(),
                    created_at: at,
                    updated_at: at,
                },
            );
            inner.stock.insert(
                id,
                InventoryLevel {
                    product_id: id,
                    quantity,
                    updated_at: at,
                },
            );
        }

        Self {
            inner: RwLock::new(inner),
            ..Self::default()
        }
    }

    /// Delays every read, to widen race windows in tests.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of read queries served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    async fn begin_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn quantity(inner: &Inner, product_id: i64) -> i64 {
    inner.stock.get(&product_id).map(|s| s.quantity).unwrap_or(0)
}

fn matches(inner: &Inner, product: &Product, query: &SearchQuery) -> bool {
    if let Some(text) = query.text() {
        let text = text.to_lowercase();
        if !product.name.to_lowercase().contains(&text)
            && !product.sku.to_lowercase().contains(&text)
        {
            return false;
        }
    }
    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty())
        && product.category != category
    {
        return false;
    }
    if query.min_price.is_some_and(|min| product.price_cents < min) {
        return false;
    }
    if query.max_price.is_some_and(|max| product.price_cents > max) {
        return false;
    }
    if query.in_stock == Some(true) && quantity(inner, product.id) <= 0 {
        return false;
    }
    true
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    #[instrument(skip(self))]
    async fn product(&self, id: i64) -> Result<Product, CatalogError> {
        self.begin_read().await;
        self.inner
            .read()
            .await
            .products
            .get(&id)
            .cloned()
            .ok_or(CatalogError::ProductNotFound(id))
    }

    #[instrument(skip(self))]
    async fn inventory(&self, product_id: i64) -> Result<InventoryLevel, CatalogError> {
        self.begin_read().await;
        let inner = self.inner.read().await;
        let product = inner
            .products
            .get(&product_id)
            .ok_or(CatalogError::ProductNotFound(product_id))?;

        Ok(inner.stock.get(&product_id).cloned().unwrap_or(InventoryLevel {
            product_id,
            quantity: 0,
            updated_at: product.updated_at,
        }))
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, CatalogError> {
        self.begin_read().await;
        let inner = self.inner.read().await;

        let mut hits: Vec<&Product> = inner
            .products
            .values()
            .filter(|p| matches(&inner, p, query))
            .collect();

        match query.sort() {
            SearchSort::Relevance => {}
            SearchSort::PriceAsc => hits.sort_by_key(|p| (p.price_cents, p.id)),
            SearchSort::PriceDesc => {
                hits.sort_by_key(|p| (std::cmp::Reverse(p.price_cents), p.id))
            }
            SearchSort::Newest => hits.sort_by_key(|p| std::cmp::Reverse((p.created_at, p.id))),
        }

        let total = hits.len() as i64;
        let items = hits
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.per_page() as usize)
            .cloned()
            .collect();

        Ok(SearchPage {
            items,
            total,
            page: query.page(),
            per_page: query.per_page(),
        })
    }

    #[instrument(skip(self))]
    async fn category_facets(&self, slug: &str) -> Result<CategoryFacets, CatalogError> {
        self.begin_read().await;
        let inner = self.inner.read().await;

        let listings: Vec<(i64, i64)> = inner
            .products
            .values()
            .filter(|p| p.category == slug)
            .map(|p| (p.price_cents, quantity(&inner, p.id)))
            .collect();

        if listings.is_empty() {
            return Err(CatalogError::CategoryNotFound(slug.to_string()));
        }
        Ok(CategoryFacets::from_listings(slug, &listings))
    }

    #[instrument(skip(self))]
    async fn update_price(&self, id: i64, price_cents: i64) -> Result<Product, CatalogError> {
        let mut inner = self.inner.write().await;
        let product = inner
            .products
            .get_mut(&id)
            .ok_or(CatalogError::ProductNotFound(id))?;

        product.price_cents = price_cents;
        product.updated_at = now();
        Ok(product.clone())
    }

    #[instrument(skip(self))]
    async fn set_stock(
        &self,
        product_id: i64,
        quantity: i64,
    ) -> Result<InventoryLevel, CatalogError> {
        let mut inner = self.inner.write().await;
        if !inner.products.contains_key(&product_id) {
            return Err(CatalogError::ProductNotFound(product_id));
        }

        let level = InventoryLevel {
            product_id,
            quantity,
            updated_at: now(),
        };
        inner.stock.insert(product_id, level.clone());
        Ok(level)
    }

    #[instrument(skip(self, counts), fields(records = counts.len()))]
    async fn recount_stock(&self, counts: &[StockCount]) -> Result<u64, CatalogError> {
        let mut inner = self.inner.write().await;
        if let Some(unknown) = counts.iter().find(|c| !inner.products.contains_key(&c.product_id)) {
            return Err(CatalogError::ProductNotFound(unknown.product_id));
        }

        let at = now();
        for count in counts {
            inner.stock.insert(
                count.product_id,
                InventoryLevel {
                    product_id: count.product_id,
                    quantity: count.quantity,
                    updated_at: at,
                },
            );
        }
        Ok(counts.len() as u64)
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}
