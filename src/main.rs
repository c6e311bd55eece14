use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use niubiz_checkout::application::checkout::{
    CheckoutService, CheckoutSettings, ConfirmForm, seed_catalog,
};
use niubiz_checkout::config::{
    DEFAULT_AUTHORIZATION_ENDPOINT, DEFAULT_CURRENCY, DEFAULT_SECURITY_ENDPOINT,
    DEFAULT_SESSION_ENDPOINT, GatewayConfig, GatewayEnvironment, MerchantProfile,
};
use niubiz_checkout::domain::ports::{OrderStoreBox, ProductCatalogBox, TransactionStoreBox};
use niubiz_checkout::infrastructure::in_memory::{
    InMemoryOrderStore, InMemoryProductCatalog, InMemoryTransactionStore,
};
use niubiz_checkout::infrastructure::niubiz::NiubizClient;
use niubiz_checkout::interfaces::csv::product_reader::ProductReader;
use niubiz_checkout::interfaces::csv::product_writer::ProductWriter;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
#[cfg(not(feature = "storage-rocksdb"))]
use tracing::warn;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Products CSV (`id,name,price`) loaded into the catalog before running.
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(flatten)]
    gateway: GatewayArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GatewayArgs {
    /// Gateway environment: qa or prod.
    #[arg(long, env = "NIUBIZ_ENVIRONMENT", default_value = "qa")]
    environment: String,

    #[arg(long, env = "NIUBIZ_MERCHANT_ID", default_value = "")]
    merchant_id: String,

    #[arg(long, env = "NIUBIZ_USERNAME", default_value = "")]
    username: String,

    #[arg(long, env = "NIUBIZ_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    #[arg(long, env = "NIUBIZ_CURRENCY", default_value = DEFAULT_CURRENCY)]
    currency: String,

    /// Overrides the environment's default API base URL.
    #[arg(long, env = "NIUBIZ_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "NIUBIZ_SECURITY_ENDPOINT", default_value = DEFAULT_SECURITY_ENDPOINT)]
    security_endpoint: String,

    #[arg(long, env = "NIUBIZ_SESSION_ENDPOINT", default_value = DEFAULT_SESSION_ENDPOINT)]
    session_endpoint: String,

    #[arg(long, env = "NIUBIZ_AUTHORIZATION_ENDPOINT", default_value = DEFAULT_AUTHORIZATION_ENDPOINT)]
    authorization_endpoint: String,

    /// Overrides the environment's default payment widget script URL.
    #[arg(long, env = "NIUBIZ_STATIC_WIDGET_URL")]
    static_widget_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "NIUBIZ_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// JSON file with antifraud data and the card-holder identity.
    #[arg(long, env = "NIUBIZ_MERCHANT_PROFILE")]
    merchant_profile: Option<PathBuf>,
}

impl GatewayArgs {
    fn into_config(self) -> niubiz_checkout::error::Result<(GatewayConfig, MerchantProfile)> {
        let environment: GatewayEnvironment = self.environment.parse()?;
        let mut config = GatewayConfig::for_environment(environment);
        config.merchant_id = self.merchant_id;
        config.username = self.username;
        config.password = self.password;
        config.currency = self.currency.to_ascii_uppercase();
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        config.security_endpoint = self.security_endpoint;
        config.session_endpoint = self.session_endpoint;
        config.authorization_endpoint = self.authorization_endpoint;
        if let Some(url) = self.static_widget_url {
            config.static_widget_url = url;
        }
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.validate()?;

        let profile = match self.merchant_profile {
            Some(path) => MerchantProfile::from_json_file(path)?,
            None => MerchantProfile::default(),
        };
        Ok((config, profile))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the product catalog as CSV.
    Products,
    /// Create an order and open a payment session for a product.
    Init {
        #[arg(long)]
        product_id: Uuid,
        #[arg(long)]
        email: Option<String>,
    },
    /// Authorize the card token captured by the payment widget.
    Confirm {
        #[arg(long)]
        purchase_number: Option<String>,
        #[arg(long)]
        transaction_token: Option<String>,
        #[arg(long)]
        token_id: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
}

struct Stores {
    catalog: ProductCatalogBox,
    orders: OrderStoreBox,
    transactions: TransactionStoreBox,
}

fn open_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            use niubiz_checkout::infrastructure::rocksdb::RocksDBStore;
            let store = RocksDBStore::open(path).into_diagnostic()?;
            Ok(Stores {
                catalog: Box::new(store.clone()),
                orders: Box::new(store.clone()),
                transactions: Box::new(store),
            })
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            warn!(
                path = %path.display(),
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(in_memory_stores())
        }
        None => Ok(in_memory_stores()),
    }
}

fn in_memory_stores() -> Stores {
    Stores {
        catalog: Box::new(InMemoryProductCatalog::new()),
        orders: Box::new(InMemoryOrderStore::new()),
        transactions: Box::new(InMemoryTransactionStore::new()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).into_diagnostic()?;
    writeln!(out).into_diagnostic()?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let stores = open_stores(cli.db_path)?;

    if let Some(path) = cli.catalog {
        let file = File::open(path).into_diagnostic()?;
        let products = ProductReader::new(file)
            .products()
            .collect::<niubiz_checkout::error::Result<Vec<_>>>()
            .into_diagnostic()?;
        stores.catalog.add_range(products).await.into_diagnostic()?;
    }
    seed_catalog(stores.catalog.as_ref()).await.into_diagnostic()?;

    if let Command::Products = cli.command {
        let products = stores.catalog.list().await.into_diagnostic()?;
        let stdout = io::stdout();
        let mut writer = ProductWriter::new(stdout.lock());
        return writer.write_products(products).into_diagnostic();
    }

    // Bad credentials or endpoints must stop us before any gateway traffic.
    let (config, profile) = cli.gateway.into_config().into_diagnostic()?;
    let gateway = NiubizClient::new(&config, profile).into_diagnostic()?;
    let service = CheckoutService::new(
        stores.catalog,
        stores.orders,
        stores.transactions,
        Box::new(gateway),
        CheckoutSettings {
            merchant_id: config.merchant_id.clone(),
            currency: config.currency.clone(),
            static_widget_url: config.static_widget_url.clone(),
        },
    );

    match cli.command {
        Command::Products => Ok(()),
        Command::Init { product_id, email } => {
            let result = service.init(product_id, email).await.into_diagnostic()?;
            print_json(&result)
        }
        Command::Confirm {
            purchase_number,
            transaction_token,
            token_id,
            token,
        } => {
            let form = ConfirmForm {
                purchase_number,
                transaction_token,
                token_id,
                token,
            };
            let result = service.confirm_form(&form).await.into_diagnostic()?;
            print_json(&result)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Dropping the flow future cancels it at its next await point.
    tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => Err(miette!("Interrupted; checkout flow cancelled")),
    }
}
