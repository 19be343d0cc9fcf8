//! TravelRate CLI
//!
//! Converts an amount typed in the travel currency into the home currency,
//! using cached exchange rates that are refreshed in the background.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use travelrate_common::{catalog, Currency};
use travelrate_fx::{
    ConverterSession, DecimalSeparator, HttpRateFetcher, JsonFileStore, RateCache,
    RateCacheConfig, RateCacheManager, RateError, ScreenState, Settings,
};

mod config;

use config::CliConfig;

/// TravelRate CLI
#[derive(Parser, Debug)]
#[command(name = "travelrate")]
#[command(about = "Convert travel-currency amounts into your home currency")]
struct Args {
    /// Amount typed on the keypad, using the configured decimal separator
    amount: Option<String>,

    /// Set the home currency
    #[arg(long)]
    home: Option<String>,

    /// Set the travel currency
    #[arg(long)]
    travel: Option<String>,

    /// Set the decimal separator (comma or dot)
    #[arg(long)]
    separator: Option<DecimalSeparator>,

    /// Fetch fresh rates even if the cached ones are recent
    #[arg(long)]
    refresh: bool,

    /// List supported currencies and exit
    #[arg(long)]
    list: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = CliConfig::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    );
    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    if args.list {
        for info in catalog::all() {
            println!("{}  {:<4} {} ({})", info.code, info.symbol, info.name, info.country);
        }
        return Ok(());
    }

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let store = Arc::new(JsonFileStore::open(&config.store_path)?);
    info!(path = %store.path().display(), "Using store");

    let fetcher = Arc::new(HttpRateFetcher::new(config.provider.clone())?);
    let manager = RateCacheManager::new(
        fetcher,
        RateCache::with_store(store.clone()),
        RateCacheConfig::default(),
    );
    let mut session = ConverterSession::new(Settings::new(store), manager);

    if let Some(sep) = args.separator {
        session.set_decimal_separator(sep)?;
    }
    if let Some(code) = &args.home {
        session.select_home(&parse_currency(code)?)?;
    }
    if let Some(code) = &args.travel {
        session.select_travel(&parse_currency(code)?)?;
    }

    if session.settings().home_currency().is_none() {
        anyhow::bail!("No home currency selected, pass --home <CODE>");
    }

    let settled = if args.refresh {
        session.refresh().await
    } else {
        session.load().await
    };
    match settled {
        Ok(view) if view.is_stale => warn!(base = %view.base, "Showing outdated rates"),
        Ok(_) => {}
        Err(RateError::NoCacheAvailable(base)) => {
            warn!(base = %base, "No rates available yet");
        }
        Err(e) => return Err(e.into()),
    }

    if let Some(amount) = &args.amount {
        session.type_str(amount);
    }

    print_screen(&session.display());
    Ok(())
}

fn parse_currency(code: &str) -> anyhow::Result<Currency> {
    let currency = Currency::new(code);
    if currency.code().len() != 3 || !currency.code().chars().all(|c| c.is_ascii_alphabetic()) {
        anyhow::bail!("Invalid currency code '{}'", code);
    }
    if catalog::find(&currency).is_none() {
        warn!(currency = %currency, "Currency is not in the built-in catalog");
    }
    Ok(currency)
}

fn print_screen(screen: &ScreenState) {
    let home = screen
        .home_currency
        .as_ref()
        .map(|c| c.code())
        .unwrap_or("---");

    println!("{} {}", screen.input_text, screen.travel_currency);
    println!("= {} {}", screen.result_text, home);

    if let Some(label) = &screen.rate_label {
        match &screen.last_updated {
            Some(updated) => println!("{} · {}", label, updated),
            None => println!("{}", label),
        }
    }
    if screen.is_stale {
        println!("rates may be outdated");
    }
    if let Some(e) = &screen.error {
        println!("error: {}", e);
    }
}
