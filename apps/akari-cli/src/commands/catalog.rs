//! Catalog commands: products, categories, providers, stock alerts and
//! stock adjustment.

use clap::{Args, Subcommand};
use serde_json::{json, Value};

use akari_core::{CoreError, NewProduct, ProductUpdate};
use akari_db::{Database, PosError};

use super::to_json;
use crate::error::CliResult;

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    Create(ProductArgs),
    Get { id: String },
    /// List products, optionally only one category
    List {
        #[arg(long)]
        category: Option<String>,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: ProductUpdateArgs,
    },
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct ProductArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub sku: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    /// Initial stock
    #[arg(long, default_value_t = 0)]
    pub quantity: i64,
    /// Selling price in cents
    #[arg(long)]
    pub price_cents: i64,
    /// Purchase price in cents
    #[arg(long, default_value_t = 0)]
    pub cost_cents: i64,
    #[arg(long)]
    pub provider: Option<String>,
    #[arg(long)]
    pub image_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProductUpdateArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub sku: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub price_cents: Option<i64>,
    #[arg(long)]
    pub cost_cents: Option<i64>,
    #[arg(long)]
    pub provider: Option<String>,
    #[arg(long)]
    pub image_url: Option<String>,
}

impl From<ProductArgs> for NewProduct {
    fn from(args: ProductArgs) -> Self {
        NewProduct {
            name: args.name,
            sku: args.sku,
            color: args.color,
            quantity: args.quantity,
            price_sell_cents: args.price_cents,
            price_buy_cents: args.cost_cents,
            provider_id: args.provider,
            image_url: args.image_url,
        }
    }
}

impl From<ProductUpdateArgs> for ProductUpdate {
    fn from(args: ProductUpdateArgs) -> Self {
        ProductUpdate {
            name: args.name,
            sku: args.sku,
            color: args.color,
            price_sell_cents: args.price_cents,
            price_buy_cents: args.cost_cents,
            provider_id: args.provider,
            image_url: args.image_url,
        }
    }
}

pub async fn product(db: &Database, command: ProductCommand) -> CliResult<Value> {
    let products = db.products();
    match command {
        ProductCommand::Create(args) => to_json(products.create(&args.into()).await?),
        ProductCommand::Get { id } => {
            let product = products
                .get_by_id(&id)
                .await?
                .ok_or_else(|| PosError::from(CoreError::not_found("Product", &id)))?;
            let categories = db.categories().for_product(&id).await?;
            Ok(json!({ "product": product, "categories": categories }))
        }
        ProductCommand::List { category } => to_json(products.list(category.as_deref()).await?),
        ProductCommand::Update { id, fields } => to_json(products.update(&id, &fields.into()).await?),
        ProductCommand::Delete { id } => {
            products.delete(&id).await?;
            Ok(json!({ "deleted": id }))
        }
    }
}

// =============================================================================
// Categories & Providers
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image_url: Option<String>,
    },
    Get { id: String },
    List,
    /// Put a product in a category
    Link {
        #[arg(long)]
        product: String,
        #[arg(long)]
        category: String,
    },
}

pub async fn category(db: &Database, command: CategoryCommand) -> CliResult<Value> {
    let categories = db.categories();
    match command {
        CategoryCommand::Create { name, image_url } => {
            to_json(categories.create(&name, image_url.as_deref()).await?)
        }
        CategoryCommand::Get { id } => {
            let category = categories
                .get_by_id(&id)
                .await?
                .ok_or_else(|| PosError::from(CoreError::not_found("Category", &id)))?;
            to_json(category)
        }
        CategoryCommand::List => to_json(categories.list().await?),
        CategoryCommand::Link { product, category } => {
            categories.link_product(&product, &category).await?;
            Ok(json!({ "product_id": product, "category_id": category }))
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ProviderCommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        contact: Option<String>,
    },
    List,
}

pub async fn provider(db: &Database, command: ProviderCommand) -> CliResult<Value> {
    match command {
        ProviderCommand::Create {
            name,
            address,
            contact,
        } => to_json(
            db.providers()
                .create(&name, address.as_deref(), contact.as_deref())
                .await?,
        ),
        ProviderCommand::List => to_json(db.providers().list().await?),
    }
}

// =============================================================================
// Stock
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum AlertCommand {
    Create {
        #[arg(long)]
        product: String,
        #[arg(long)]
        min_stock: i64,
    },
    List,
    Update {
        id: String,
        #[arg(long)]
        min_stock: i64,
    },
    Delete { id: String },
    /// Products at or below their threshold
    LowStock,
}

pub async fn alert(db: &Database, command: AlertCommand) -> CliResult<Value> {
    let alerts = db.stock_alerts();
    match command {
        AlertCommand::Create { product, min_stock } => {
            to_json(alerts.create(&product, min_stock).await?)
        }
        AlertCommand::List => to_json(alerts.list().await?),
        AlertCommand::Update { id, min_stock } => to_json(alerts.update(&id, min_stock).await?),
        AlertCommand::Delete { id } => {
            alerts.delete(&id).await?;
            Ok(json!({ "deleted": id }))
        }
        AlertCommand::LowStock => to_json(alerts.low_stock().await?),
    }
}

#[derive(Debug, Subcommand)]
pub enum StockCommand {
    /// Add (or with a negative delta, remove) units
    Adjust {
        product: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
}

pub async fn stock(db: &Database, command: StockCommand) -> CliResult<Value> {
    match command {
        StockCommand::Adjust { product, delta } => {
            let quantity = db.stock().adjust_stock(&product, delta).await?;
            Ok(json!({ "product_id": product, "quantity": quantity }))
        }
    }
}
