//! Sales commands: promo codes, carts, checkout, tickets and reports.

use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde_json::{json, Value};

use akari_core::{CheckoutPolicy, CheckoutRequest, CoreError, NewPromoCode, PaymentMethod};
use akari_db::{Database, PosError, DEFAULT_TOP_LIMIT};

use super::to_json;
use crate::error::CliResult;

// =============================================================================
// Promo codes
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum PromoCommand {
    Create {
        #[arg(long)]
        code: String,
        /// Discount in basis points (1000 = 10%)
        #[arg(long)]
        discount_bps: i64,
        /// Last valid day, YYYY-MM-DD
        #[arg(long)]
        expires_on: Option<NaiveDate>,
        #[arg(long)]
        inactive: bool,
    },
    Get { id: String },
    /// Look a code up by the text the customer presents
    Find { code: String },
    List,
    Activate { id: String },
    Deactivate { id: String },
}

pub async fn promo(db: &Database, command: PromoCommand) -> CliResult<Value> {
    let promos = db.promo_codes();
    match command {
        PromoCommand::Create {
            code,
            discount_bps,
            expires_on,
            inactive,
        } => to_json(
            promos
                .create(&NewPromoCode {
                    code,
                    discount_bps,
                    expires_on,
                    is_active: !inactive,
                })
                .await?,
        ),
        PromoCommand::Get { id } => {
            let promo = promos
                .get_by_id(&id)
                .await?
                .ok_or_else(|| PosError::from(CoreError::not_found("PromoCode", &id)))?;
            to_json(promo)
        }
        PromoCommand::Find { code } => {
            let promo = promos
                .get_by_code(&code)
                .await?
                .ok_or_else(|| PosError::from(CoreError::not_found("PromoCode", &code)))?;
            to_json(promo)
        }
        PromoCommand::List => to_json(promos.list().await?),
        PromoCommand::Activate { id } => to_json(promos.set_active(&id, true).await?),
        PromoCommand::Deactivate { id } => to_json(promos.set_active(&id, false).await?),
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Add a pending line to a user's cart
    Add {
        #[arg(long)]
        user: String,
        #[arg(long)]
        product: String,
        #[arg(long, default_value_t = 1)]
        quantity: i64,
        /// cash | card | transfer
        #[arg(long, default_value = "cash")]
        payment: PaymentMethod,
    },
    /// A user's pending lines and their total
    Show {
        #[arg(long)]
        user: String,
    },
    /// Change the quantity of a pending line
    SetQuantity { line: String, quantity: i64 },
    /// Every cart line, pending and completed
    Ledger,
}

pub async fn cart(db: &Database, command: CartCommand) -> CliResult<Value> {
    match command {
        CartCommand::Add {
            user,
            product,
            quantity,
            payment,
        } => to_json(
            db.cart()
                .add_to_cart(&user, &product, quantity, payment)
                .await?,
        ),
        CartCommand::Show { user } => {
            let lines = db.cart_lines().pending_lines(&user).await?;
            let total: i64 = lines.iter().map(|line| line.total_amount_cents).sum();
            Ok(json!({ "user_id": user, "lines": lines, "total_cents": total }))
        }
        CartCommand::SetQuantity { line, quantity } => {
            to_json(db.cart().update_pending_quantity(&line, quantity).await?)
        }
        CartCommand::Ledger => to_json(db.cart_lines().list_lines().await?),
    }
}

// =============================================================================
// Checkout
// =============================================================================

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub client: String,
    /// Promo code id
    #[arg(long, conflicts_with = "promo_code")]
    pub promo: Option<String>,
    /// Promo code text, resolved to its id
    #[arg(long)]
    pub promo_code: Option<String>,
    #[arg(long)]
    pub details: Option<String>,
    /// Retry on transaction conflicts up to `checkout.conflict_retries` times
    #[arg(long)]
    pub retry: bool,
}

pub async fn checkout(db: &Database, policy: CheckoutPolicy, args: CheckoutArgs) -> CliResult<Value> {
    let mut request = CheckoutRequest::new(args.user, args.client);

    let promo_id = match (args.promo, args.promo_code) {
        (Some(id), _) => Some(id),
        (None, Some(code)) => {
            let promo = db
                .promo_codes()
                .get_by_code(&code)
                .await?
                .ok_or_else(|| PosError::from(CoreError::not_found("PromoCode", &code)))?;
            Some(promo.id)
        }
        (None, None) => None,
    };
    if let Some(id) = promo_id {
        request = request.with_promo(id);
    }
    if let Some(details) = args.details {
        request = request.with_issue_details(details);
    }

    let service = db.checkout(policy);
    let ticket = if args.retry {
        service.checkout_with_retry(&request).await?
    } else {
        service.checkout(&request).await?
    };

    to_json(ticket)
}

// =============================================================================
// Tickets & reports
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum TicketCommand {
    /// Ticket with client, cashier and lines
    Show { id: String },
    /// Stamp `updated_at`
    Touch { id: String },
    List {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

pub async fn ticket(db: &Database, command: TicketCommand) -> CliResult<Value> {
    let tickets = db.tickets();
    match command {
        TicketCommand::Show { id } => to_json(tickets.detail(&id).await?),
        TicketCommand::Touch { id } => to_json(tickets.touch(&id).await?),
        TicketCommand::List { limit } => to_json(tickets.list(limit).await?),
    }
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Sum of all ticket final prices
    Sales,
    TopProducts {
        #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
        limit: u32,
    },
    TopClients {
        #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
        limit: u32,
    },
}

pub async fn report(db: &Database, command: ReportCommand) -> CliResult<Value> {
    let reports = db.reports();
    match command {
        ReportCommand::Sales => {
            let total = reports.total_sales().await?;
            Ok(json!({ "total_cents": total.cents(), "total": total.to_string() }))
        }
        ReportCommand::TopProducts { limit } => to_json(reports.top_products(limit).await?),
        ReportCommand::TopClients { limit } => to_json(reports.top_clients(limit).await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::test_db;
    use akari_core::{NewProduct, NewUser, UserType};

    struct Shop {
        user_id: String,
        client_id: String,
        product_id: String,
    }

    async fn shop(db: &Database) -> Shop {
        let user = db
            .users()
            .register(&NewUser {
                username: "caja1".into(),
                phone: None,
                user_type: UserType::Vendedor,
            })
            .await
            .unwrap();
        let client = db.clients().create("Mostrador", None, None).await.unwrap();
        let product = db
            .products()
            .create(&NewProduct {
                name: "Cuaderno".into(),
                quantity: 10,
                price_sell_cents: 5000,
                ..Default::default()
            })
            .await
            .unwrap();
        Shop {
            user_id: user.id,
            client_id: client.id,
            product_id: product.id,
        }
    }

    fn checkout_args(shop: &Shop) -> CheckoutArgs {
        CheckoutArgs {
            user: shop.user_id.clone(),
            client: shop.client_id.clone(),
            promo: None,
            promo_code: None,
            details: None,
            retry: false,
        }
    }

    #[tokio::test]
    async fn test_cart_checkout_with_promo_code_text() {
        let db = test_db().await;
        let shop = shop(&db).await;

        promo(
            &db,
            PromoCommand::Create {
                code: "SUMMER10".into(),
                discount_bps: 1000,
                expires_on: None,
                inactive: false,
            },
        )
        .await
        .unwrap();

        cart(
            &db,
            CartCommand::Add {
                user: shop.user_id.clone(),
                product: shop.product_id.clone(),
                quantity: 3,
                payment: PaymentMethod::Card,
            },
        )
        .await
        .unwrap();

        let pending = cart(&db, CartCommand::Show { user: shop.user_id.clone() })
            .await
            .unwrap();
        assert_eq!(pending["total_cents"], 15000);

        let ticket = checkout(
            &db,
            CheckoutPolicy::default(),
            CheckoutArgs {
                promo_code: Some("SUMMER10".into()),
                ..checkout_args(&shop)
            },
        )
        .await
        .unwrap();
        assert_eq!(ticket["prev_price_cents"], 15000);
        assert_eq!(ticket["final_price_cents"], 13500);

        let detail = super::ticket(
            &db,
            TicketCommand::Show {
                id: ticket["id"].as_str().unwrap().to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(detail["client_name"], "Mostrador");
        assert_eq!(detail["lines"].as_array().unwrap().len(), 1);

        let sales = report(&db, ReportCommand::Sales).await.unwrap();
        assert_eq!(sales["total_cents"], 13500);
        assert_eq!(sales["total"], "$135.00");
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_error() {
        let db = test_db().await;
        let shop = shop(&db).await;

        let err = checkout(&db, CheckoutPolicy::default(), checkout_args(&shop))
            .await
            .unwrap_err();
        assert_eq!(serde_json::to_value(&err).unwrap()["code"], "EMPTY_CART");

        let lenient = CheckoutPolicy {
            allow_empty: true,
            ..Default::default()
        };
        let ticket = checkout(&db, lenient, checkout_args(&shop)).await.unwrap();
        assert_eq!(ticket["final_price_cents"], 0);
    }

    #[tokio::test]
    async fn test_unknown_promo_code_text() {
        let db = test_db().await;
        let shop = shop(&db).await;

        let err = checkout(
            &db,
            CheckoutPolicy::default(),
            CheckoutArgs {
                promo_code: Some("NOPE".into()),
                ..checkout_args(&shop)
            },
        )
        .await
        .unwrap_err();
        assert_eq!(serde_json::to_value(&err).unwrap()["code"], "NOT_FOUND");
    }
}
