use emporium_store::{Filter, SortOrder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, trace};

use super::{optional_text, required_text};
use crate::{
    models::{Product, Stored},
    pagination::{Page, PageRequest},
    repository::{eq, CREATED_AT},
    tenancy::TenantContext,
    ApiError,
    ApiResult,
};

const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 5_000;
const MAX_IMAGES: usize = 10;
/// Default size of the top rated listing.
pub const DEFAULT_TOP_RATED: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name:        String,
    #[serde(default)]
    pub description: String,
    pub brand:       String,
    pub category:    String,
    pub price_cents: u64,
    #[serde(default)]
    pub stock:       u64,
    #[serde(default)]
    pub images:      Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name:        Option<String>,
    pub description: Option<String>,
    pub brand:       Option<String>,
    pub category:    Option<String>,
    pub price_cents: Option<u64>,
    pub stock:       Option<u64>,
    pub images:      Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    Name,
}

impl ProductSort {
    fn keys(self) -> Vec<(String, SortOrder)> {
        let key = |field: &str, order| (field.to_owned(), order);
        match self {
            Self::Newest => vec![key(CREATED_AT, SortOrder::Descending)],
            Self::PriceAsc => vec![key("price_cents", SortOrder::Ascending)],
            Self::PriceDesc => vec![key("price_cents", SortOrder::Descending)],
            Self::Rating => {
                vec![
                    key("rating", SortOrder::Descending),
                    key("num_reviews", SortOrder::Descending),
                ]
            },
            Self::Name => vec![key("name", SortOrder::Ascending)],
        }
    }
}

/// Catalogue search parameters. Prices are in cents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive match on name, brand or description.
    pub keyword:    Option<String>,
    pub category:   Option<String>,
    pub brand:      Option<String>,
    pub min_price:  Option<u64>,
    pub max_price:  Option<u64>,
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub in_stock:   bool,
    #[serde(default)]
    pub sort:       ProductSort,
}

impl ProductFilter {
    fn filters(&self) -> ApiResult<Vec<Filter>> {
        let mut filters = Vec::new();
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        if let Some(keyword) = non_empty(&self.keyword) {
            filters.push(Filter::Or(
                ["name", "brand", "description"]
                    .into_iter()
                    .map(|field| Filter::ContainsInsensitive(field.to_owned(), keyword.clone()))
                    .collect(),
            ));
        }
        if let Some(category) = non_empty(&self.category) {
            filters.push(eq("category", &category));
        }
        if let Some(brand) = non_empty(&self.brand) {
            filters.push(eq("brand", &brand));
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(ApiError::validation("min_price must not exceed max_price"));
        }
        if let Some(min) = self.min_price {
            filters.push(Filter::GreaterOrEqual("price_cents".to_owned(), json!(min)));
        }
        if let Some(max) = self.max_price {
            filters.push(Filter::LessOrEqual("price_cents".to_owned(), json!(max)));
        }
        if let Some(rating) = self.min_rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(ApiError::validation("min_rating must be between 0 and 5"));
            }
            filters.push(Filter::GreaterOrEqual("rating".to_owned(), json!(rating)));
        }
        if self.in_stock {
            filters.push(Filter::GreaterThan("stock".to_owned(), json!(0)));
        }
        Ok(filters)
    }
}

fn check_images(images: &[String]) -> ApiResult<Vec<String>> {
    if images.len() > MAX_IMAGES {
        return Err(ApiError::validation(format!(
            "a product has at most {MAX_IMAGES} images"
        )));
    }
    images
        .iter()
        .map(|url| required_text("image", url, 2_048))
        .collect()
}

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for TenantContext are intentional for organization"
)]
impl TenantContext {
    pub async fn create_product(&self, created_by: &str, input: NewProduct) -> ApiResult<Stored<Product>> {
        trace!("Creating product in tenant {}", self.slug);
        let product = Product {
            name:        required_text("name", &input.name, MAX_NAME_LEN)?,
            description: optional_text("description", Some(&input.description), MAX_DESCRIPTION_LEN)?
                .unwrap_or_default(),
            brand:       required_text("brand", &input.brand, MAX_NAME_LEN)?,
            category:    required_text("category", &input.category, MAX_NAME_LEN)?,
            price_cents: input.price_cents,
            stock:       input.stock,
            images:      check_images(&input.images)?,
            rating:      0.0,
            num_reviews: 0,
            created_by:  created_by.to_owned(),
        };
        let created = self.products.insert(product).await?;
        info!("Product {} created in tenant {}", created.id, self.slug);
        Ok(created)
    }

    pub async fn product(&self, id: &str) -> ApiResult<Stored<Product>> { self.products.require(id).await }

    /// Applies the given fields. Stock changes take the product lock so they
    /// never interleave with order placement.
    pub async fn update_product(&self, id: &str, patch: ProductPatch) -> ApiResult<Stored<Product>> {
        let _guard = self.locks.lock(&product_lock(id)).await;
        let mut changes = serde_json::Map::new();
        if let Some(ref name) = patch.name {
            changes.insert("name".to_owned(), json!(required_text("name", name, MAX_NAME_LEN)?));
        }
        if let Some(ref description) = patch.description {
            let description = optional_text("description", Some(description), MAX_DESCRIPTION_LEN)?;
            changes.insert("description".to_owned(), json!(description.unwrap_or_default()));
        }
        if let Some(ref brand) = patch.brand {
            changes.insert("brand".to_owned(), json!(required_text("brand", brand, MAX_NAME_LEN)?));
        }
        if let Some(ref category) = patch.category {
            changes.insert(
                "category".to_owned(),
                json!(required_text("category", category, MAX_NAME_LEN)?),
            );
        }
        if let Some(price) = patch.price_cents {
            changes.insert("price_cents".to_owned(), json!(price));
        }
        if let Some(stock) = patch.stock {
            changes.insert("stock".to_owned(), json!(stock));
        }
        if let Some(ref images) = patch.images {
            changes.insert("images".to_owned(), json!(check_images(images)?));
        }
        self.products.patch(id, Value::Object(changes)).await
    }

    /// Deletes a product and its reviews.
    pub async fn delete_product(&self, id: &str) -> ApiResult<()> {
        let _guard = self.locks.lock(&product_lock(id)).await;
        if !self.products.delete(id).await? {
            return Err(ApiError::not_found("Product", id));
        }
        let reviews = self.reviews.find(vec![eq("product_id", id)], vec![]).await?;
        for review in &reviews {
            self.reviews.delete(&review.id).await?;
        }
        info!(
            "Product {} deleted with {} reviews in tenant {}",
            id,
            reviews.len(),
            self.slug
        );
        Ok(())
    }

    pub async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> ApiResult<Page<Stored<Product>>> {
        let filters = filter.filters()?;
        debug!("Listing products with {} filters", filters.len());
        self.products.page(filters, filter.sort.keys(), page).await
    }

    /// Best rated products that have at least one review.
    pub async fn top_rated_products(&self, limit: usize) -> ApiResult<Vec<Stored<Product>>> {
        let page = PageRequest {
            page:  1,
            limit: limit.clamp(1, self.config.page_limits.max_limit.max(1)),
        };
        Ok(self
            .products
            .page(
                vec![Filter::GreaterThan("num_reviews".to_owned(), json!(0))],
                ProductSort::Rating.keys(),
                page,
            )
            .await?
            .items)
    }

    /// Distinct product categories, sorted.
    pub async fn product_categories(&self) -> ApiResult<Vec<String>> {
        Ok(self
            .products
            .distinct("category", &[])
            .await?
            .into_iter()
            .filter_map(|value| value.as_str().map(str::to_owned))
            .collect())
    }
}

/// Lock key serialising stock and rating changes of one product.
pub(crate) fn product_lock(product_id: &str) -> String { format!("product:{product_id}") }
