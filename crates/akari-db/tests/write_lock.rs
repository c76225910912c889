//! Checkout while another connection holds the SQLite write lock.
//!
//! A second, raw connection runs `BEGIN IMMEDIATE` against the same file,
//! so every checkout write waits out the short busy timeout and fails with
//! `SQLITE_BUSY`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use akari_core::{
    CartLineStatus, CheckoutPolicy, CheckoutRequest, CoreError, NewProduct, NewUser,
    PaymentMethod, UserType,
};
use akari_db::{Database, DbConfig, ErrorCode, PosError};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use tempfile::TempDir;

struct Shop {
    db: Database,
    path: PathBuf,
    request: CheckoutRequest,
    product_id: String,
}

async fn open_shop(dir: &TempDir) -> Shop {
    let path = dir.path().join("akari.db");
    let config = DbConfig::new(&path)
        .max_connections(2)
        .busy_timeout(Duration::from_millis(50));
    let db = Database::new(config).await.unwrap();

    let user = db
        .users()
        .register(&NewUser {
            username: "caja1".to_string(),
            phone: None,
            user_type: UserType::Vendedor,
        })
        .await
        .unwrap();
    let client = db.clients().create("Mostrador", None, None).await.unwrap();
    let product = db
        .products()
        .create(&NewProduct {
            name: "Cuaderno".to_string(),
            quantity: 10,
            price_sell_cents: 5_000,
            ..Default::default()
        })
        .await
        .unwrap();
    db.cart()
        .add_to_cart(&user.id, &product.id, 2, PaymentMethod::Cash)
        .await
        .unwrap();

    Shop {
        db,
        path,
        request: CheckoutRequest::new(&user.id, &client.id),
        product_id: product.id,
    }
}

async fn hold_write_lock(path: &Path) -> SqliteConnection {
    let options = SqliteConnectOptions::new().filename(path);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
    sqlx::query("BEGIN IMMEDIATE").execute(&mut conn).await.unwrap();
    conn
}

async fn release_write_lock(mut conn: SqliteConnection) {
    sqlx::query("ROLLBACK").execute(&mut conn).await.unwrap();
    conn.close().await.unwrap();
}

fn assert_conflict(err: &PosError) {
    assert!(
        matches!(err, PosError::Core(CoreError::TransactionConflict { .. })),
        "unexpected error: {err:?}"
    );
    assert!(err.is_retryable());
    assert_eq!(err.code(), ErrorCode::TransactionConflict);
}

async fn assert_cart_untouched(shop: &Shop) {
    assert!(shop.db.tickets().list(10).await.unwrap().is_empty());

    let lines = shop.db.cart_lines().list_lines().await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].order_status, CartLineStatus::Pending);
    assert!(lines[0].ticket_id.is_none());

    let product = shop.db.products().get_by_id(&shop.product_id).await.unwrap().unwrap();
    assert_eq!(product.quantity, 10);
}

#[tokio::test]
async fn test_held_lock_is_a_retryable_conflict() {
    let dir = TempDir::new().unwrap();
    let shop = open_shop(&dir).await;

    let lock = hold_write_lock(&shop.path).await;
    let err = shop
        .db
        .checkout(CheckoutPolicy::default())
        .checkout(&shop.request)
        .await
        .unwrap_err();
    assert_conflict(&err);
    release_write_lock(lock).await;

    assert_cart_untouched(&shop).await;

    // Same request, lock gone: goes through.
    let ticket = shop
        .db
        .checkout(CheckoutPolicy::default())
        .checkout(&shop.request)
        .await
        .unwrap();
    assert_eq!(ticket.final_price_cents, 10_000);

    shop.db.close().await;
}

#[tokio::test]
async fn test_retry_gives_up_after_conflict_retries() {
    let dir = TempDir::new().unwrap();
    let shop = open_shop(&dir).await;
    let policy = CheckoutPolicy {
        conflict_retries: 2,
        ..Default::default()
    };

    let lock = hold_write_lock(&shop.path).await;
    let err = shop
        .db
        .checkout(policy)
        .checkout_with_retry(&shop.request)
        .await
        .unwrap_err();
    assert_conflict(&err);
    release_write_lock(lock).await;

    assert_cart_untouched(&shop).await;

    let ticket = shop
        .db
        .checkout(policy)
        .checkout_with_retry(&shop.request)
        .await
        .unwrap();

    let lines = shop.db.cart_lines().list_lines().await.unwrap();
    assert_eq!(lines[0].order_status, CartLineStatus::Completed);
    assert_eq!(lines[0].ticket_id.as_deref(), Some(ticket.id.as_str()));

    let product = shop.db.products().get_by_id(&shop.product_id).await.unwrap().unwrap();
    assert_eq!(product.quantity, 8);

    shop.db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_retry_succeeds_once_the_lock_is_released() {
    let dir = TempDir::new().unwrap();
    let shop = open_shop(&dir).await;
    let policy = CheckoutPolicy {
        conflict_retries: 50,
        ..Default::default()
    };

    // The lock outlives several 50 ms busy waits, so the first attempt fails.
    let lock = hold_write_lock(&shop.path).await;
    let releaser = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        release_write_lock(lock).await;
    });

    let ticket = shop
        .db
        .checkout(policy)
        .checkout_with_retry(&shop.request)
        .await
        .unwrap();
    releaser.await.unwrap();

    assert_eq!(ticket.prev_price_cents, 10_000);
    assert_eq!(shop.db.tickets().list(10).await.unwrap().len(), 1);

    let product = shop.db.products().get_by_id(&shop.product_id).await.unwrap().unwrap();
    assert_eq!(product.quantity, 8);

    shop.db.close().await;
}
