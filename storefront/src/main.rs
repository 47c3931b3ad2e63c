//! `cyclecare` - command-line client for the CycleCare storefront backend
//!
//! Runs storefront flows against a live backend through the same store and
//! reducers the storefront uses.
//!
//! # Usage
//!
//! ```bash
//! # List cities and whether doorstep service is offered there
//! cyclecare cities
//!
//! # Service catalog with prices per cycle type
//! cyclecare services
//!
//! # Status and progress of one order
//! cyclecare track ord-1042
//!
//! # Orders of an account
//! cyclecare orders user-77
//!
//! # Which city a pincode belongs to
//! cyclecare check-pincode 411057
//!
//! # Verbose logging
//! RUST_LOG=debug cyclecare cities
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use cyclecare_api::{ApiClient, OrderId, UserId};
use cyclecare_core::environment::SystemClock;
use cyclecare_runtime::Store;
use cyclecare_storefront::app::{AppAction, AppReducer, AppState};
use cyclecare_storefront::city_gate::AreaCheck;
use cyclecare_storefront::config::AppConfig;
use cyclecare_storefront::environment::{AppEnvironment, NoIdentityProvider};
use cyclecare_storefront::request::Loadable;
use cyclecare_storefront::slices::{CityAction, OrderAction, OrderView, Route, ServicesAction, UiAction};
use cyclecare_storefront::status::OrderStatus;
use cyclecare_storefront::storage::{FileStore, KeyValueStore, NullStore};
use cyclecare_storefront::validation::sanitize_pincode;
use tracing::info;

type CliEnvironment = AppEnvironment<ApiClient, NoIdentityProvider>;
type CliStore = Store<AppState, AppAction, CliEnvironment, AppReducer<ApiClient, NoIdentityProvider>>;

/// CycleCare storefront client
#[derive(Parser, Debug)]
#[command(name = "cyclecare")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend base URL
    #[arg(long, env = "CYCLECARE_API_URL", value_name = "URL")]
    api_url: Option<String>,

    /// File holding the persisted session and city
    #[arg(long, env = "CYCLECARE_STORAGE_PATH", value_name = "FILE")]
    storage_path: Option<PathBuf>,

    /// Do not read or write persisted state
    #[arg(long)]
    no_persist: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "CYCLECARE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "CYCLECARE_HTTP_TIMEOUT_SECS", value_name = "SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List cities
    Cities,
    /// List the service catalog
    Services,
    /// Show the status of an order
    Track {
        /// Order id
        order_id: String,
    },
    /// List the orders of an account
    Orders {
        /// Account id
        user_id: String,
    },
    /// Look up the city of a pincode
    CheckPincode {
        /// Six-digit pincode
        pincode: String,
    },
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let timeout = args.timeout_secs.map(|secs| secs.to_string());
    let storage = args
        .storage_path
        .as_ref()
        .map(|path| path.to_string_lossy().into_owned());

    AppConfig::from_lookup(|name| {
        let flag = match name {
            "CYCLECARE_API_URL" => args.api_url.clone(),
            "CYCLECARE_STORAGE_PATH" => storage.clone(),
            "CYCLECARE_LOG_LEVEL" => args.log_level.clone(),
            "CYCLECARE_HTTP_TIMEOUT_SECS" => timeout.clone(),
            _ => None,
        };
        flag.or_else(|| std::env::var(name).ok())
    })
    .context("Invalid configuration")
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "warn,cyclecare={level},cyclecare_storefront={level},cyclecare_api={level},cyclecare_runtime={level}",
            level = config.log_level
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn build_store(config: &AppConfig, persist: bool) -> Result<CliStore> {
    let client = ApiClient::with_timeout(config.api_url.clone(), config.http_timeout())
        .context("Failed to build HTTP client")?;

    let storage: Arc<dyn KeyValueStore> = if persist {
        Arc::new(FileStore::new(config.storage_path.clone()))
    } else {
        Arc::new(NullStore)
    };

    let env = AppEnvironment::new(client, NoIdentityProvider, storage, Arc::new(SystemClock));
    Ok(Store::new(AppState::default(), AppReducer::new(), env))
}

async fn dispatch(store: &CliStore, action: AppAction) -> Result<()> {
    store
        .send(action)
        .await
        .context("Store rejected the action")?
        .wait()
        .await;
    Ok(())
}

fn loaded<'a, T>(what: &str, value: &'a Loadable<T>) -> Result<&'a T> {
    match value {
        Loadable::Fulfilled(value) => Ok(value),
        Loadable::Rejected(failure) => bail!("Could not load {what}: {failure}"),
        Loadable::Idle | Loadable::Pending => bail!("Could not load {what}: no response"),
    }
}

async fn list_cities(store: &CliStore) -> Result<()> {
    dispatch(store, AppAction::City(CityAction::Load)).await?;

    store
        .state(|state| -> Result<()> {
            let cities = loaded("cities", &state.city.cities)?;
            let selected = state.city.selected;
            for city in cities {
                let marker = if Some(city.id) == selected { "*" } else { " " };
                let availability = if city.serviceable { "" } else { " (not serviceable)" };
                println!("{marker} {:>4}  {}, {}{availability}", city.id.value(), city.name, city.state);
            }
            Ok(())
        })
        .await
}

async fn list_services(store: &CliStore) -> Result<()> {
    dispatch(store, AppAction::Services(ServicesAction::Load)).await?;

    store
        .state(|state| -> Result<()> {
            let services = loaded("services", &state.services.catalog)?;
            for service in services {
                println!(
                    "{:<24} gear Rs {:>5}  non-gear Rs {:>5}  {}",
                    service.name,
                    service.prices.gear,
                    service.prices.non_gear,
                    service.short_description
                );
            }
            Ok(())
        })
        .await
}

fn print_order(view: &OrderView) {
    let status = view.status.status;
    let progress = if status == OrderStatus::Cancelled {
        format!("cancelled after step {}", view.status.progress_index + 1)
    } else {
        format!("step {} of {}", view.status.progress_index + 1, OrderStatus::STEPS.len())
    };
    let created = view
        .order
        .created_at
        .map_or_else(String::new, |at| at.format("%Y-%m-%d %H:%M").to_string());

    println!("{}  {:<10} {progress:<24} {created}", view.order.id, status.label());
}

async fn track_order(store: &CliStore, order_id: String) -> Result<()> {
    let route = Route::OrderTracking(OrderId::new(order_id));
    info!(path = %route.path(), "Tracking order");
    dispatch(store, AppAction::Ui(UiAction::Navigate(route))).await?;

    store
        .state(|state| -> Result<()> {
            let view = loaded("order", &state.order.tracked)?;
            print_order(view);
            for event in &view.order.activity {
                let actor = event.actor.as_deref().unwrap_or("-");
                println!("  {}  {:<20} {actor}", event.timestamp.format("%Y-%m-%d %H:%M"), event.kind);
            }
            Ok(())
        })
        .await
}

async fn list_orders(store: &CliStore, user_id: String) -> Result<()> {
    let user_id = UserId::new(user_id);
    dispatch(store, AppAction::Order(OrderAction::LoadForUser { user_id })).await?;

    store
        .state(|state| -> Result<()> {
            let orders = loaded("orders", &state.order.orders)?;
            if orders.is_empty() {
                println!("No orders yet");
            }
            orders.iter().for_each(print_order);
            Ok(())
        })
        .await
}

async fn check_pincode(store: &CliStore, pincode: &str) -> Result<()> {
    let pincode = sanitize_pincode(pincode);
    if pincode.len() != 6 {
        bail!("Pincode must be exactly 6 digits");
    }
    dispatch(store, AppAction::City(CityAction::Load)).await?;

    store
        .state(|state| -> Result<()> {
            loaded("cities", &state.city.cities)?;
            let check = state.booking.area.check(&pincode);
            match &check {
                AreaCheck::Serviceable(city) => {
                    println!("{pincode}: {}, {}, {} (serviceable)", city.name, city.state, city.country);
                },
                AreaCheck::NotServiceable(city) => {
                    println!("{pincode}: {}, {}, {}", city.name, city.state, city.country);
                },
                AreaCheck::Unknown => println!("{pincode}: unknown pincode"),
            }
            if let Some(warning) = check.warning() {
                println!("warning: {warning}");
            }
            Ok(())
        })
        .await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config);

    info!(environment = %config.environment, api_url = %config.api_url, "Starting cyclecare");

    let store = build_store(&config, !args.no_persist)?;

    match args.command {
        Command::Cities => list_cities(&store).await,
        Command::Services => list_services(&store).await,
        Command::Track { order_id } => track_order(&store, order_id).await,
        Command::Orders { user_id } => list_orders(&store, user_id).await,
        Command::CheckPincode { pincode } => check_pincode(&store, &pincode).await,
    }
}
