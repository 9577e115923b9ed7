use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use storefront_models::{
    CategoryFacets, InventoryLevel, Product, SearchPage, SearchQuery, SearchSort, StockCount,
};
use tracing::instrument;

use super::{Catalog, CatalogError};

const PRODUCT_COLUMNS: &str =
    "p.id, p.sku, p.name, p.description, p.category, p.price_cents, p.currency, p.created_at, p.updated_at";

/// Catalog backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    db: PgPool,
}

impl PgCatalog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Appends the WHERE clause shared by the count and page queries.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &SearchQuery) {
    builder.push(" WHERE 1 = 1");

    if let Some(text) = query.text() {
        let pattern = format!("%{}%", text);
        builder
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        builder.push(" AND p.category = ").push_bind(category.to_string());
    }
    if let Some(min) = query.min_price {
        builder.push(" AND p.price_cents >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        builder.push(" AND p.price_cents <= ").push_bind(max);
    }
    if query.in_stock == Some(true) {
        builder.push(" AND COALESCE(i.quantity, 0) > 0");
    }
}

fn map_write_error(product_id: i64) -> impl FnOnce(sqlx::Error) -> CatalogError {
    move |e| {
        if let sqlx::Error::Database(db_err) = &e
            && db_err.is_foreign_key_violation()
        {
            return CatalogError::ProductNotFound(product_id);
        }
        CatalogError::from(e)
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    #[instrument(skip(self))]
    async fn product(&self, id: i64) -> Result<Product, CatalogError> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(CatalogError::ProductNotFound(id))
    }

    #[instrument(skip(self))]
    async fn inventory(&self, product_id: i64) -> Result<InventoryLevel, CatalogError> {
        sqlx::query_as::<_, InventoryLevel>(
            r#"SELECT p.id AS product_id,
                      COALESCE(i.quantity, 0) AS quantity,
                      COALESCE(i.updated_at, p.updated_at) AS updated_at
               FROM products p
               LEFT JOIN inventory_levels i ON i.product_id = p.id
               WHERE p.id = $1"#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(CatalogError::ProductNotFound(product_id))
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, CatalogError> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM products p LEFT JOIN inventory_levels i ON i.product_id = p.id",
        );
        push_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.db).await?;

        let mut page = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p LEFT JOIN inventory_levels i ON i.product_id = p.id"
        ));
        push_filters(&mut page, query);
        page.push(match query.sort() {
            SearchSort::Relevance => " ORDER BY p.id",
            SearchSort::PriceAsc => " ORDER BY p.price_cents ASC, p.id",
            SearchSort::PriceDesc => " ORDER BY p.price_cents DESC, p.id",
            SearchSort::Newest => " ORDER BY p.created_at DESC, p.id DESC",
        });
        page.push(" LIMIT ")
            .push_bind(i64::from(query.per_page()))
            .push(" OFFSET ")
            .push_bind(query.offset());

        let items = page.build_query_as::<Product>().fetch_all(&self.db).await?;

        Ok(SearchPage {
            items,
            total,
            page: query.page(),
            per_page: query.per_page(),
        })
    }

    #[instrument(skip(self))]
    async fn category_facets(&self, slug: &str) -> Result<CategoryFacets, CatalogError> {
        let listings = sqlx::query_as::<_, (i64, i64)>(
            r#"SELECT p.price_cents, COALESCE(i.quantity, 0)
               FROM products p
               LEFT JOIN inventory_levels i ON i.product_id = p.id
               WHERE p.category = $1"#,
        )
        .bind(slug)
        .fetch_all(&self.db)
        .await?;

        if listings.is_empty() {
            return Err(CatalogError::CategoryNotFound(slug.to_string()));
        }
        Ok(CategoryFacets::from_listings(slug, &listings))
    }

    #[instrument(skip(self))]
    async fn update_price(&self, id: i64, price_cents: i64) -> Result<Product, CatalogError> {
        sqlx::query_as::<_, Product>(&format!(
            "UPDATE products p SET price_cents = $1, updated_at = NOW() WHERE p.id = $2 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(price_cents)
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(CatalogError::ProductNotFound(id))
    }

    #[instrument(skip(self))]
    async fn set_stock(
        &self,
        product_id: i64,
        quantity: i64,
    ) -> Result<InventoryLevel, CatalogError> {
        sqlx::query_as::<_, InventoryLevel>(
            r#"INSERT INTO inventory_levels (product_id, quantity)
               VALUES ($1, $2)
               ON CONFLICT (product_id)
               DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()
               RETURNING product_id, quantity, updated_at"#,
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error(product_id))
    }

    #[instrument(skip(self, counts), fields(records = counts.len()))]
    async fn recount_stock(&self, counts: &[StockCount]) -> Result<u64, CatalogError> {
        let mut tx = self.db.begin().await?;
        let mut written = 0;

        for count in counts {
            let result = sqlx::query(
                r#"INSERT INTO inventory_levels (product_id, quantity)
                   VALUES ($1, $2)
                   ON CONFLICT (product_id)
                   DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()"#,
            )
            .bind(count.product_id)
            .bind(count.quantity)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error(count.product_id))?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }
}
