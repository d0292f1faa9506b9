use emporium_store::SortOrder;

use crate::{
    events::EventEnvelope,
    models::event::OCCURRED_AT_US,
    pagination::{Page, PageRequest},
    repository::eq,
    tenancy::TenantContext,
    ApiResult,
};

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for TenantContext are intentional for organization"
)]
impl TenantContext {
    /// Persisted events, most recent occurrence first, optionally of one `type`.
    pub async fn list_events(&self, event_type: Option<&str>, page: PageRequest) -> ApiResult<Page<EventEnvelope>> {
        let filters = event_type
            .map(|t| eq("type", t))
            .into_iter()
            .collect();
        let sort = vec![(OCCURRED_AT_US.to_owned(), SortOrder::Descending)];
        let records = self.events.page(filters, sort, page).await?;
        Ok(records.map(|record| record.data.envelope))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeDelta, Utc};

    use super::*;
    use crate::{
        events::DomainEvent,
        models::EventRecord,
        services::testing::{customer, new_product, tenant},
    };

    #[tokio::test]
    async fn test_events_are_persisted_and_filtered() {
        let (ctx, _temp_dir) = tenant().await;
        let alice = customer(&ctx, "alice@example.com").await;
        ctx.create_product("admin", new_product("Lamp", "home", 1_000, 1))
            .await
            .unwrap();
        let low = ctx.bus.publish(crate::events::DomainEvent::LowStock {
            product_id: "p1".to_owned(),
            name:       "Lamp".to_owned(),
            stock:      1,
        });

        let page = PageRequest { page: 1, limit: 10 };
        let mut all = ctx.list_events(None, page).await.unwrap();
        for _ in 0..100 {
            if all.total >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            all = ctx.list_events(None, page).await.unwrap();
        }
        assert_eq!(all.total, 2);
        assert_eq!(all.items[0].id, low.id);
        assert_eq!(all.items[0].tenant, "test");

        let registrations = ctx
            .list_events(Some("user_registered"), page)
            .await
            .unwrap();
        assert_eq!(registrations.total, 1);
        assert!(registrations.items[0].event.concerns_user(&alice.id));
        assert_eq!(ctx.list_events(Some("order_placed"), page).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_events_sorted_by_occurrence() {
        let (ctx, _temp_dir) = tenant().await;
        let now = Utc::now();
        let envelope = |id: &str, age_secs: i64| {
            EventEnvelope {
                id:          id.to_owned(),
                tenant:      "test".to_owned(),
                occurred_at: now - TimeDelta::seconds(age_secs),
                event:       DomainEvent::LowStock {
                    product_id: id.to_owned(),
                    name:       "Lamp".to_owned(),
                    stock:      1,
                },
            }
        };
        // persisted newest first, so persistence order disagrees with occurrence
        for (id, age) in [("recent", 1), ("older", 60), ("oldest", 3_600)] {
            ctx.events
                .insert_with_id(id, EventRecord::new(envelope(id, age)))
                .await
                .unwrap();
        }

        let page = ctx
            .list_events(Some("low_stock"), PageRequest { page: 1, limit: 10 })
            .await
            .unwrap();
        let ids: Vec<&str> = page.items.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["recent", "older", "oldest"]);
    }
}
