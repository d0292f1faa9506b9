use chrono::Utc;
use emporium_store::Filter;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, trace};

use super::{optional_text, products::product_lock, required_text};
use crate::{
    config::PricingConfig,
    events::DomainEvent,
    models::{Order, OrderItem, OrderStatus, Product, Role, ShippingAddress, Stored, User},
    pagination::{Page, PageRequest},
    repository::{eq, newest_first},
    tenancy::TenantContext,
    ApiError,
    ApiResult,
};

/// Most distinct lines an order may have.
pub const MAX_ORDER_LINES: usize = 50;
/// Largest quantity of one product in an order.
pub const MAX_LINE_QUANTITY: u32 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity:   u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub items:          Vec<OrderLine>,
    pub address_id:     String,
    pub payment_method: String,
}

/// Shipping and tax owed on an items total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charges {
    pub shipping_cents: u64,
    pub tax_cents:      u64,
}

impl Charges {
    /// Shipping is free at or above the threshold. Tax is rounded half up.
    pub const fn for_items(items_cents: u64, pricing: &PricingConfig) -> Self {
        let shipping_cents = if items_cents >= pricing.free_shipping_threshold_cents {
            0
        }
        else {
            pricing.flat_shipping_cents
        };
        let tax_cents = items_cents
            .saturating_mul(pricing.tax_basis_points)
            .saturating_add(5_000) /
            10_000;
        Self {
            shipping_cents,
            tax_cents,
        }
    }
}

fn order_lock(order_id: &str) -> String { format!("order:{order_id}") }

/// Validates the lines and merges repeated products, keeping first-seen order.
fn merge_lines(lines: Vec<OrderLine>) -> ApiResult<Vec<OrderLine>> {
    if lines.is_empty() {
        return Err(ApiError::validation("an order needs at least one item"));
    }
    if lines.len() > MAX_ORDER_LINES {
        return Err(ApiError::validation(format!(
            "an order may have at most {MAX_ORDER_LINES} items"
        )));
    }

    let mut merged: Vec<OrderLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if !(1..=MAX_LINE_QUANTITY).contains(&line.quantity) {
            return Err(ApiError::validation(format!(
                "quantity must be between 1 and {MAX_LINE_QUANTITY}"
            )));
        }
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(line),
        }
    }
    if let Some(line) = merged.iter().find(|l| l.quantity > MAX_LINE_QUANTITY) {
        return Err(ApiError::validation(format!(
            "quantity of product '{}' exceeds {MAX_LINE_QUANTITY}",
            line.product_id
        )));
    }
    Ok(merged)
}

#[allow(
    clippy::multiple_inherent_impl,
    reason = "multiple impl blocks for TenantContext are intentional for organization"
)]
impl TenantContext {
    /// Places an order for `user_id`.
    ///
    /// Stock of every product is checked before any of it is taken, all under
    /// the products' locks, so an order either reserves everything or nothing.
    ///
    /// # Errors
    ///
    /// * `Validation` for malformed lines or payment method
    /// * `NotFound` for an unknown product or an address the user does not own
    /// * `Conflict` when a product has insufficient stock
    pub async fn place_order(&self, user_id: &str, input: PlaceOrder) -> ApiResult<Stored<Order>> {
        trace!("Placing order for user {} in tenant {}", user_id, self.slug);
        let lines = merge_lines(input.items)?;
        let payment_method = required_text("payment_method", &input.payment_method, 50)?;
        let address = self.address(user_id, &input.address_id).await?;

        let keys: Vec<String> = lines.iter().map(|l| product_lock(&l.product_id)).collect();
        let _guards = self.locks.lock_many(&keys).await;

        let mut reserved: Vec<(Stored<Product>, u32)> = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = self.products.require(&line.product_id).await?;
            if product.data.stock < u64::from(line.quantity) {
                debug!(
                    "Insufficient stock for product {}: {} < {}",
                    product.id, product.data.stock, line.quantity
                );
                return Err(ApiError::conflict(format!(
                    "Insufficient stock for '{}'",
                    product.data.name
                )));
            }
            reserved.push((product, line.quantity));
        }

        for (taken, &(ref product, quantity)) in reserved.iter().enumerate() {
            let remaining = product.data.stock - u64::from(quantity);
            if let Err(e) = self
                .products
                .patch(&product.id, json!({ "stock": remaining }))
                .await
            {
                self.release_reservations(&reserved[.. taken]).await;
                return Err(e);
            }
        }

        let items: Vec<OrderItem> = reserved
            .iter()
            .map(|&(ref product, quantity)| {
                OrderItem {
                    product_id: product.id.clone(),
                    name: product.data.name.clone(),
                    image: product.data.images.first().cloned(),
                    unit_price_cents: product.data.price_cents,
                    quantity,
                }
            })
            .collect();
        let items_cents = items
            .iter()
            .map(OrderItem::line_total_cents)
            .fold(0_u64, u64::saturating_add);
        let charges = Charges::for_items(items_cents, &self.config.pricing);

        let order = Order {
            user_id: user_id.to_owned(),
            items,
            shipping_address: ShippingAddress::from(&address.data),
            payment_method,
            items_cents,
            shipping_cents: charges.shipping_cents,
            tax_cents: charges.tax_cents,
            total_cents: items_cents
                .saturating_add(charges.shipping_cents)
                .saturating_add(charges.tax_cents),
            status: OrderStatus::Pending,
            paid_at: None,
            payment_reference: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
        };
        let placed = match self.orders.insert(order).await {
            Ok(placed) => placed,
            Err(e) => {
                self.release_reservations(&reserved).await;
                return Err(e);
            },
        };

        self.bus.publish(DomainEvent::OrderPlaced {
            order_id:    placed.id.clone(),
            user_id:     user_id.to_owned(),
            total_cents: placed.data.total_cents,
        });
        for &(ref product, quantity) in &reserved {
            let remaining = product.data.stock - u64::from(quantity);
            if remaining <= self.config.low_stock_threshold {
                self.bus.publish(DomainEvent::LowStock {
                    product_id: product.id.clone(),
                    name:       product.data.name.clone(),
                    stock:      remaining,
                });
            }
        }
        info!(
            "Order {} placed by user {} for {} cents",
            placed.id, user_id, placed.data.total_cents
        );
        Ok(placed)
    }

    /// Puts back stock taken for an order that could not be completed. The
    /// product locks are still held, so the original values are restored.
    async fn release_reservations(&self, reserved: &[(Stored<Product>, u32)]) {
        for &(ref product, _) in reserved {
            if let Err(e) = self
                .products
                .patch(&product.id, json!({ "stock": product.data.stock }))
                .await
            {
                error!("Failed to restore stock of product {}: {}", product.id, e);
            }
        }
    }

    /// An order visible to `actor`: their own, or any order for admins.
    pub async fn order(&self, actor: &Stored<User>, id: &str) -> ApiResult<Stored<Order>> {
        let order = self.orders.require(id).await?;
        if order.data.user_id != actor.id && actor.data.role != Role::Admin {
            return Err(ApiError::forbidden("You cannot access this order"));
        }
        Ok(order)
    }

    pub async fn my_orders(&self, user_id: &str, page: PageRequest) -> ApiResult<Page<Stored<Order>>> {
        self.orders
            .page(vec![eq("user_id", user_id)], newest_first(), page)
            .await
    }

    pub async fn list_orders(&self, status: Option<OrderStatus>, page: PageRequest) -> ApiResult<Page<Stored<Order>>> {
        let filters: Vec<Filter> = status
            .map(|s| eq("status", s.as_str()))
            .into_iter()
            .collect();
        self.orders.page(filters, newest_first(), page).await
    }

    /// Marks the payer's own pending order as paid.
    pub async fn pay_order(&self, payer: &Stored<User>, id: &str, payment_reference: Option<&str>) -> ApiResult<Stored<Order>> {
        let payment_reference = optional_text("payment_reference", payment_reference, 200)?;
        self.advance_order(
            id,
            OrderStatus::Paid,
            |order| {
                if order.data.user_id == payer.id {
                    Ok(())
                }
                else {
                    Err(ApiError::forbidden("Only the buyer can pay for an order"))
                }
            },
            |order| {
                order.paid_at = Some(Utc::now());
                order.payment_reference = payment_reference;
            },
        )
        .await
    }

    pub async fn ship_order(&self, id: &str) -> ApiResult<Stored<Order>> {
        self.advance_order(id, OrderStatus::Shipped, |_| Ok(()), |order| {
            order.shipped_at = Some(Utc::now());
        })
        .await
    }

    pub async fn deliver_order(&self, id: &str) -> ApiResult<Stored<Order>> {
        self.advance_order(id, OrderStatus::Delivered, |_| Ok(()), |order| {
            order.delivered_at = Some(Utc::now());
        })
        .await
    }

    /// Cancels a pending or paid order and returns its items to stock.
    pub async fn cancel_order(&self, actor: &Stored<User>, id: &str) -> ApiResult<Stored<Order>> {
        let cancelled = self
            .advance_order(
                id,
                OrderStatus::Cancelled,
                |order| {
                    if order.data.user_id == actor.id || actor.data.role == Role::Admin {
                        Ok(())
                    }
                    else {
                        Err(ApiError::forbidden("You cannot cancel this order"))
                    }
                },
                |order| order.cancelled_at = Some(Utc::now()),
            )
            .await?;
        self.restock(&cancelled.data.items).await?;
        Ok(cancelled)
    }

    async fn restock(&self, items: &[OrderItem]) -> ApiResult<()> {
        let keys: Vec<String> = items.iter().map(|i| product_lock(&i.product_id)).collect();
        let _guards = self.locks.lock_many(&keys).await;
        for item in items {
            let Some(product) = self.products.get(&item.product_id).await?
            else {
                debug!("Product {} no longer exists, not restocking", item.product_id);
                continue;
            };
            let stock = product.data.stock.saturating_add(u64::from(item.quantity));
            self.products
                .patch(&product.id, json!({ "stock": stock }))
                .await?;
        }
        Ok(())
    }

    /// Moves an order to `next` under its lock.
    async fn advance_order<A, S>(&self, id: &str, next: OrderStatus, authorize: A, stamp: S) -> ApiResult<Stored<Order>>
    where
        A: FnOnce(&Stored<Order>) -> ApiResult<()>,
        S: FnOnce(&mut Order),
    {
        let _guard = self.locks.lock(&order_lock(id)).await;
        let current = self.orders.require(id).await?;
        authorize(&current)?;

        let from = current.data.status;
        if !from.can_transition_to(next) {
            return Err(ApiError::conflict(format!(
                "Cannot move order from {} to {}",
                from.as_str(),
                next.as_str()
            )));
        }
        let mut order = current.data;
        order.status = next;
        stamp(&mut order);
        let updated = self.orders.save(id, &order).await?;

        self.bus.publish(DomainEvent::OrderStatusChanged {
            order_id: updated.id.clone(),
            user_id:  updated.data.user_id.clone(),
            from:     from.as_str().to_owned(),
            to:       next.as_str().to_owned(),
        });
        info!("Order {} moved from {} to {}", id, from.as_str(), next.as_str());
        Ok(updated)
    }
}
