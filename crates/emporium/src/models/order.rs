use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Address, Entity};

/// Lifecycle of an order.
///
/// `pending -> paid -> shipped -> delivered`, and `pending | paid -> cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the machine allows moving from `self` to `next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Paid) |
                (Self::Paid, Self::Shipped) |
                (Self::Shipped, Self::Delivered) |
                (Self::Pending | Self::Paid, Self::Cancelled)
        )
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

/// One line of an order, with the product data snapshotted at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id:       String,
    pub name:             String,
    pub image:            Option<String>,
    pub unit_price_cents: u64,
    pub quantity:         u32,
}

impl OrderItem {
    pub const fn line_total_cents(&self) -> u64 { self.unit_price_cents.saturating_mul(self.quantity as u64) }
}

/// Copy of the address an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name:   String,
    pub line1:       String,
    pub line2:       Option<String>,
    pub city:        String,
    pub state:       Option<String>,
    pub postal_code: String,
    pub country:     String,
    pub phone:       Option<String>,
}

impl From<&Address> for ShippingAddress {
    fn from(address: &Address) -> Self {
        Self {
            full_name:   address.full_name.clone(),
            line1:       address.line1.clone(),
            line2:       address.line2.clone(),
            city:        address.city.clone(),
            state:       address.state.clone(),
            postal_code: address.postal_code.clone(),
            country:     address.country.clone(),
            phone:       address.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub user_id:           String,
    pub items:             Vec<OrderItem>,
    pub shipping_address:  ShippingAddress,
    pub payment_method:    String,
    pub items_cents:       u64,
    pub shipping_cents:    u64,
    pub tax_cents:         u64,
    pub total_cents:       u64,
    pub status:            OrderStatus,
    pub paid_at:           Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub shipped_at:        Option<DateTime<Utc>>,
    pub delivered_at:      Option<DateTime<Utc>>,
    pub cancelled_at:      Option<DateTime<Utc>>,
}

impl Order {
    pub fn contains_product(&self, product_id: &str) -> bool { self.items.iter().any(|item| item.product_id == product_id) }
}

impl Entity for Order {
    const COLLECTION: &'static str = "orders";
    const NAME: &'static str = "Order";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_machine() {
        use OrderStatus::{Cancelled, Delivered, Paid, Pending, Shipped};

        assert!(Pending.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Paid));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
