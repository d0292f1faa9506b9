//! Fixtures shared by the service tests.

use std::sync::Arc;

use emporium_crypto::PasswordParams;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use super::{
    addresses::NewAddress,
    orders::{OrderLine, PlaceOrder},
    products::NewProduct,
    users::RegisterUser,
};
use crate::{
    config::AppConfig,
    models::{Order, Stored, User},
    tenancy::TenantContext,
};

pub(crate) const PASSWORD: &str = "password1";

/// Config rooted in `dir` with cheap password hashing.
pub(crate) fn test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        data_dir: dir.path().to_path_buf(),
        password_params: PasswordParams::insecure_fast(),
        ..AppConfig::default()
    }
}

/// A fresh tenant named `test`. Keep the directory alive for the test.
pub(crate) async fn tenant() -> (TenantContext, TempDir) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let temp_dir = tempfile::tempdir().unwrap();
    let ctx = TenantContext::open("test", Arc::new(test_config(&temp_dir)))
        .await
        .unwrap();
    (ctx, temp_dir)
}

pub(crate) async fn customer(ctx: &TenantContext, email: &str) -> Stored<User> {
    ctx.register_user(RegisterUser {
        name:     "Customer".to_owned(),
        email:    email.to_owned(),
        password: PASSWORD.to_owned(),
    })
    .await
    .unwrap()
}

pub(crate) async fn admin(ctx: &TenantContext) -> Stored<User> {
    ctx.create_admin("Admin", "admin@example.com", PASSWORD)
        .await
        .unwrap()
}

pub(crate) fn new_product(name: &str, category: &str, price_cents: u64, stock: u64) -> NewProduct {
    NewProduct {
        name: name.to_owned(),
        description: String::new(),
        brand: "Acme".to_owned(),
        category: category.to_owned(),
        price_cents,
        stock,
        images: Vec::new(),
    }
}

pub(crate) fn address_input(line1: &str) -> NewAddress {
    NewAddress {
        full_name:   "Alice Liddell".to_owned(),
        line1:       line1.to_owned(),
        line2:       None,
        city:        "Oslo".to_owned(),
        state:       None,
        postal_code: "0150".to_owned(),
        country:     "NO".to_owned(),
        phone:       None,
        is_default:  false,
    }
}

/// Places a pending order for `quantity` of one product, reusing the user's
/// default address when there is one.
pub(crate) async fn place_order(ctx: &TenantContext, user: &Stored<User>, product_id: &str, quantity: u32) -> Stored<Order> {
    let existing = ctx.list_addresses(&user.id).await.unwrap();
    let address_id = match existing.into_iter().next() {
        Some(address) => address.id,
        None => {
            ctx.create_address(&user.id, address_input("1 Main St"))
                .await
                .unwrap()
                .id
        },
    };
    ctx.place_order(
        &user.id,
        PlaceOrder {
            items: vec![OrderLine {
                product_id: product_id.to_owned(),
                quantity,
            }],
            address_id,
            payment_method: "card".to_owned(),
        },
    )
    .await
    .unwrap()
}

/// An order of one unit of the product, taken all the way to delivered.
pub(crate) async fn delivered_order(ctx: &TenantContext, user: &Stored<User>, product_id: &str) -> Stored<Order> {
    let order = place_order(ctx, user, product_id, 1).await;
    ctx.pay_order(user, &order.id, None).await.unwrap();
    ctx.ship_order(&order.id).await.unwrap();
    ctx.deliver_order(&order.id).await.unwrap()
}
