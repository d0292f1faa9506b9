use emporium_store::{Aggregation, StoreError};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, trace};

use super::{products::product_lock, required_text};
use crate::{
    events::DomainEvent,
    models::{OrderStatus, Review, Role, Stored, User},
    pagination::{Page, PageRequest},
    repository::{eq, newest_first},
    tenancy::TenantContext,
    ApiError,
    ApiResult,
};

const MAX_COMMENT_LEN: usize = 2_000;

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub order_id: String,
    pub rating:   u8,
    pub comment:  String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub rating:  Option<u8>,
    pub comment: Option<String>,
}

fn check_rating(rating: u8) -> ApiResult<u8> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    }
    else {
        Err(ApiError::validation("rating must be between 1 and 5"))
    }
}

/// Mean rounded to two decimals.
fn round_rating(mean: f64) -> f64 { (mean * 100.0).round() / 100.0 }

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for TenantContext are intentional for organization"
)]
impl TenantContext {
    /// Posts a review for a product of one of the author's delivered orders.
    ///
    /// # Errors
    ///
    /// * `NotFound` if the product or order does not exist
    /// * `Forbidden` if the order belongs to someone else
    /// * `Validation` if the order is not delivered or lacks the product
    /// * `Conflict` if the author already reviewed this product for this order
    pub async fn create_review(&self, author: &Stored<User>, product_id: &str, input: NewReview) -> ApiResult<Stored<Review>> {
        trace!("User {} reviewing product {}", author.id, product_id);
        let rating = check_rating(input.rating)?;
        let comment = required_text("comment", &input.comment, MAX_COMMENT_LEN)?;

        let _guard = self.locks.lock(&product_lock(product_id)).await;
        self.products.require(product_id).await?;
        let order = self.orders.require(&input.order_id).await?;
        if order.data.user_id != author.id {
            return Err(ApiError::forbidden("You can only review your own orders"));
        }
        if order.data.status != OrderStatus::Delivered {
            return Err(ApiError::validation("You can only review delivered orders"));
        }
        if !order.data.contains_product(product_id) {
            return Err(ApiError::validation("This order does not contain the product"));
        }

        let review = Review {
            product_id: product_id.to_owned(),
            user_id: author.id.clone(),
            user_name: author.data.name.clone(),
            order_id: order.id,
            rating,
            comment,
        };
        let created = self.reviews.insert(review).await.map_err(|e| {
            if matches!(
                e,
                ApiError::Store {
                    source: StoreError::UniqueViolation { .. },
                }
            ) {
                ApiError::conflict("You have already reviewed this product for this order")
            }
            else {
                e
            }
        })?;

        self.bus.publish(DomainEvent::ReviewPosted {
            review_id:  created.id.clone(),
            product_id: product_id.to_owned(),
            user_id:    author.id.clone(),
            rating,
        });
        self.recompute_rating(product_id).await?;
        info!("Review {} posted for product {}", created.id, product_id);
        Ok(created)
    }

    /// Changes the rating or comment of the caller's own review.
    pub async fn update_review(&self, author: &Stored<User>, review_id: &str, patch: ReviewPatch) -> ApiResult<Stored<Review>> {
        let review = self.reviews.require(review_id).await?;
        if review.data.user_id != author.id {
            return Err(ApiError::forbidden("You can only edit your own reviews"));
        }

        let _guard = self.locks.lock(&product_lock(&review.data.product_id)).await;
        let mut changes = serde_json::Map::new();
        if let Some(rating) = patch.rating {
            changes.insert("rating".to_owned(), json!(check_rating(rating)?));
        }
        if let Some(ref comment) = patch.comment {
            changes.insert(
                "comment".to_owned(),
                json!(required_text("comment", comment, MAX_COMMENT_LEN)?),
            );
        }
        let updated = self
            .reviews
            .patch(review_id, serde_json::Value::Object(changes))
            .await?;
        if patch.rating.is_some() {
            self.recompute_rating(&review.data.product_id).await?;
        }
        Ok(updated)
    }

    /// Deletes a review; allowed for its author and for admins.
    pub async fn delete_review(&self, actor: &Stored<User>, review_id: &str) -> ApiResult<()> {
        let review = self.reviews.require(review_id).await?;
        if review.data.user_id != actor.id && actor.data.role != Role::Admin {
            return Err(ApiError::forbidden("You can only delete your own reviews"));
        }
        let _guard = self.locks.lock(&product_lock(&review.data.product_id)).await;
        if self.reviews.delete(review_id).await? {
            self.recompute_rating(&review.data.product_id).await?;
        }
        Ok(())
    }

    /// Reviews of a product, newest first.
    pub async fn product_reviews(&self, product_id: &str, page: PageRequest) -> ApiResult<Page<Stored<Review>>> {
        self.products.require(product_id).await?;
        self.reviews
            .page(vec![eq("product_id", product_id)], newest_first(), page)
            .await
    }

    /// The caller's reviews, newest first.
    pub async fn user_reviews(&self, user_id: &str, page: PageRequest) -> ApiResult<Page<Stored<Review>>> {
        self.reviews
            .page(vec![eq("user_id", user_id)], newest_first(), page)
            .await
    }

    /// Re-aggregates every review of the product into its `rating` and
    /// `num_reviews`. The caller holds the product lock.
    async fn recompute_rating(&self, product_id: &str) -> ApiResult<()> {
        let filters = [eq("product_id", product_id)];
        let count = self
            .reviews
            .aggregate(&filters, Aggregation::Count)
            .await?
            .as_u64()
            .unwrap_or(0);
        let rating = if count == 0 {
            0.0
        }
        else {
            self.reviews
                .aggregate(&filters, Aggregation::Avg("rating".to_owned()))
                .await?
                .as_f64()
                .map_or(0.0, round_rating)
        };

        match self
            .products
            .patch(product_id, json!({ "rating": rating, "num_reviews": count }))
            .await
        {
            Ok(_) => {
                debug!("Product {} rated {} over {} reviews", product_id, rating, count);
                self.bus.publish(DomainEvent::ProductRatingChanged {
                    product_id: product_id.to_owned(),
                    rating,
                    num_reviews: count,
                });
                Ok(())
            },
            // The product was deleted; its reviews go with it
            Err(ApiError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{admin, customer, delivered_order, new_product, tenant};

    fn review(order_id: &str, rating: u8) -> NewReview {
        NewReview {
            order_id: order_id.to_owned(),
            rating,
            comment: "Does the job".to_owned(),
        }
    }

    #[test]
    fn test_round_rating() {
        assert!((round_rating(4.0 / 3.0) - 1.33).abs() < 1e-9);
        assert!((round_rating(2.675_1) - 2.68).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_rating_is_reaggregated_on_every_write() {
        let (ctx, _temp_dir) = tenant().await;
        let lamp = ctx
            .create_product("admin", new_product("Lamp", "home", 1_000, 10))
            .await
            .unwrap();
        let alice = customer(&ctx, "alice@example.com").await;
        let bob = customer(&ctx, "bob@example.com").await;
        let alice_order = delivered_order(&ctx, &alice, &lamp.id).await;
        let bob_order = delivered_order(&ctx, &bob, &lamp.id).await;

        let first = ctx
            .create_review(&alice, &lamp.id, review(&alice_order.id, 5))
            .await
            .unwrap();
        ctx.create_review(&bob, &lamp.id, review(&bob_order.id, 2))
            .await
            .unwrap();
        let rated = ctx.product(&lamp.id).await.unwrap();
        assert!((rated.data.rating - 3.5).abs() < 1e-9);
        assert_eq!(rated.data.num_reviews, 2);

        ctx.update_review(
            &alice,
            &first.id,
            ReviewPatch {
                rating:  Some(3),
                comment: None,
            },
        )
        .await
        .unwrap();
        let rated = ctx.product(&lamp.id).await.unwrap();
        assert!((rated.data.rating - 2.5).abs() < 1e-9);

        ctx.delete_review(&alice, &first.id).await.unwrap();
        let admin = admin(&ctx).await;
        let remaining = ctx
            .product_reviews(&lamp.id, PageRequest { page: 1, limit: 10 })
            .await
            .unwrap();
        assert_eq!(remaining.total, 1);
        ctx.delete_review(&admin, &remaining.items[0].id)
            .await
            .unwrap();

        let unrated = ctx.product(&lamp.id).await.unwrap();
        assert!(unrated.data.rating.abs() < f64::EPSILON);
        assert_eq!(unrated.data.num_reviews, 0);
    }

    #[tokio::test]
    async fn test_review_rules() {
        let (ctx, _temp_dir) = tenant().await;
        let lamp = ctx
            .create_product("admin", new_product("Lamp", "home", 1_000, 10))
            .await
            .unwrap();
        let mug = ctx
            .create_product("admin", new_product("Mug", "home", 500, 10))
            .await
            .unwrap();
        let alice = customer(&ctx, "alice@example.com").await;
        let mallory = customer(&ctx, "mallory@example.com").await;
        let order = delivered_order(&ctx, &alice, &lamp.id).await;

        assert!(matches!(
            ctx.create_review(&alice, &lamp.id, review(&order.id, 6)).await,
            Err(ApiError::Validation { .. })
        ));
        assert!(matches!(
            ctx.create_review(&mallory, &lamp.id, review(&order.id, 4)).await,
            Err(ApiError::Forbidden { .. })
        ));
        assert!(matches!(
            ctx.create_review(&alice, &mug.id, review(&order.id, 4)).await,
            Err(ApiError::Validation { .. })
        ));
        assert!(matches!(
            ctx.create_review(&alice, "missing", review(&order.id, 4)).await,
            Err(ApiError::NotFound { .. })
        ));

        let posted = ctx
            .create_review(&alice, &lamp.id, review(&order.id, 4))
            .await
            .unwrap();
        assert!(matches!(
            ctx.create_review(&alice, &lamp.id, review(&order.id, 5)).await,
            Err(ApiError::Conflict { .. })
        ));

        assert!(matches!(
            ctx.update_review(&mallory, &posted.id, ReviewPatch::default()).await,
            Err(ApiError::Forbidden { .. })
        ));
        assert!(matches!(
            ctx.delete_review(&mallory, &posted.id).await,
            Err(ApiError::Forbidden { .. })
        ));

        let mine = ctx
            .user_reviews(&alice.id, PageRequest { page: 1, limit: 10 })
            .await
            .unwrap();
        assert_eq!(mine.total, 1);
        assert_eq!(mine.items[0].data.user_name, alice.data.name);
    }

    #[tokio::test]
    async fn test_pending_order_cannot_be_reviewed() {
        let (ctx, _temp_dir) = tenant().await;
        let lamp = ctx
            .create_product("admin", new_product("Lamp", "home", 1_000, 10))
            .await
            .unwrap();
        let alice = customer(&ctx, "alice@example.com").await;
        let order = crate::services::testing::place_order(&ctx, &alice, &lamp.id, 1).await;

        assert!(matches!(
            ctx.create_review(&alice, &lamp.id, review(&order.id, 4)).await,
            Err(ApiError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_reviews_keep_count_consistent() {
        let (ctx, _temp_dir) = tenant().await;
        let ctx = std::sync::Arc::new(ctx);
        let lamp = ctx
            .create_product("admin", new_product("Lamp", "home", 100, 100))
            .await
            .unwrap();

        let mut authors = Vec::new();
        for i in 0..6 {
            let user = customer(&ctx, &format!("user{i}@example.com")).await;
            let order = delivered_order(&ctx, &user, &lamp.id).await;
            authors.push((user, order));
        }

        let mut handles = Vec::new();
        for (i, (user, order)) in authors.into_iter().enumerate() {
            let ctx = std::sync::Arc::clone(&ctx);
            let product_id = lamp.id.clone();
            let rating = u8::try_from(i % 5 + 1).unwrap();
            handles.push(tokio::spawn(async move {
                ctx.create_review(&user, &product_id, review(&order.id, rating))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let rated = ctx.product(&lamp.id).await.unwrap();
        assert_eq!(rated.data.num_reviews, 6);
        // ratings 1,2,3,4,5,1
        assert!((rated.data.rating - 2.67).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_top_rated_clamps_limit() {
        let (ctx, _temp_dir) = tenant().await;
        let alice = customer(&ctx, "alice@example.com").await;
        let lamp = ctx
            .create_product("admin", new_product("Lamp", "home", 100, 10))
            .await
            .unwrap();
        let mug = ctx
            .create_product("admin", new_product("Mug", "home", 100, 10))
            .await
            .unwrap();
        for (product, rating) in [(&lamp, 3), (&mug, 5)] {
            let order = delivered_order(&ctx, &alice, &product.id).await;
            ctx.create_review(&alice, &product.id, review(&order.id, rating))
                .await
                .unwrap();
        }

        let top = ctx.top_rated_products(5).await.unwrap();
        let names: Vec<&str> = top.iter().map(|p| p.data.name.as_str()).collect();
        assert_eq!(names, vec!["Mug", "Lamp"]);

        let zero = ctx.top_rated_products(0).await.unwrap();
        assert_eq!(zero.len(), 1);
        assert_eq!(zero[0].id, mug.id);
    }
}
