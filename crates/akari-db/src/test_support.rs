//! Shared fixtures for the crate's unit tests.

use chrono::NaiveDate;

use crate::pool::{Database, DbConfig};
use akari_core::{
    CartLine, Client, NewProduct, NewPromoCode, NewUser, PaymentMethod, Product, PromoCode, User,
    UserType,
};

/// Fresh in-memory database with migrations applied.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub(crate) fn new_product(name: &str, price_sell_cents: i64, quantity: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        quantity,
        price_sell_cents,
        price_buy_cents: price_sell_cents / 2,
        ..Default::default()
    }
}

pub(crate) fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        phone: None,
        user_type: UserType::default(),
    }
}

/// A cashier with two pending lines worth 150.00:
/// one cuaderno at 100.00 and two plumas at 25.00.
pub(crate) struct SaleFixture {
    pub user: User,
    pub client: Client,
    pub cuaderno: Product,
    pub pluma: Product,
    /// SUMMER10, 10% off, active.
    pub promo: PromoCode,
    /// `[cuaderno ×1, pluma ×2]`
    pub lines: Vec<CartLine>,
}

pub(crate) async fn seed_sale_fixture(db: &Database) -> SaleFixture {
    let user = db.users().register(&new_user("ana")).await.unwrap();
    let client = db
        .clients()
        .create("Papelería Luna", Some("Av. Juárez 12"), None)
        .await
        .unwrap();
    let cuaderno = db
        .products()
        .create(&new_product("Cuaderno", 10_000, 10))
        .await
        .unwrap();
    let pluma = db
        .products()
        .create(&new_product("Pluma", 2_500, 20))
        .await
        .unwrap();
    let promo = db
        .promo_codes()
        .create(&NewPromoCode {
            code: "SUMMER10".to_string(),
            discount_bps: 1000,
            expires_on: NaiveDate::from_ymd_opt(2099, 12, 31),
            is_active: true,
        })
        .await
        .unwrap();

    let mut lines = Vec::new();
    lines.push(
        db.cart()
            .add_to_cart(&user.id, &cuaderno.id, 1, PaymentMethod::Cash)
            .await
            .unwrap(),
    );
    lines.push(
        db.cart()
            .add_to_cart(&user.id, &pluma.id, 2, PaymentMethod::Cash)
            .await
            .unwrap(),
    );

    SaleFixture {
        user,
        client,
        cuaderno,
        pluma,
        promo,
        lines,
    }
}
