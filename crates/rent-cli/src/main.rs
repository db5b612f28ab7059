//! # rentcart
//!
//! Command-line front end for the rent-cart marketplace.
//!
//! ## Usage
//!
//! ```bash
//! # Point at the marketplace gateway
//! export RENT_API_BASE_URL=http://localhost:8080/api
//! export RENT_TOKEN_PATH=~/.config/rentcart/session
//! export STRIPE_PUBLISHABLE_KEY=pk_test_...
//!
//! rentcart login ana
//! rentcart items --available --order-by price
//! rentcart reserve 42 --pay pm_card_visa
//! ```

mod setup;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rent_client::Marketplace;
use rent_core::{
    ConfirmationOutcome, Currency, ItemQuery, OrderBy, OrderDir, PaymentMethodDetails,
    RentalWindow, Reservation, ReservationFailure,
};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rentcart")]
#[command(about = "Browse, reserve and pay for rentals", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Client config file (defaults to config/client.toml, then env vars)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and keep the session token
    Login {
        username: String,
        #[arg(long, env = "RENT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the session token
    Logout,

    /// Create an account and log in
    Signup {
        username: String,
        email: String,
        #[arg(long, env = "RENT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Request a password reset token
    Forgot { username: String },

    /// Set a new password with a reset token
    Reset {
        token: String,
        #[arg(long, env = "RENT_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },

    /// List catalog items
    Items {
        /// Substring match on the item name
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        /// Only items that can be rented now
        #[arg(long)]
        available: bool,
        /// Category id (repeatable)
        #[arg(long = "category", value_name = "ID")]
        categories: Vec<u64>,
        #[arg(long, value_enum)]
        order_by: Option<SortKey>,
        #[arg(long, value_enum, default_value = "asc")]
        order_dir: SortDir,
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Show one item
    Item { id: u64 },

    /// List categories
    Categories,

    /// List my rentals
    Rentals,

    /// Show when an item is already booked
    Availability { item_id: u64 },

    /// Reserve an item and optionally pay the deposit
    Reserve {
        item_id: u64,
        /// Window start (RFC 3339); defaults to now
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// Window end (RFC 3339); defaults to one hour after start
        #[arg(long, requires = "start")]
        end: Option<DateTime<Utc>>,
        /// Payment method to confirm with, e.g. pm_card_visa
        #[arg(long, value_name = "PAYMENT_METHOD")]
        pay: Option<String>,
    },

    /// Pay the deposit of an existing pending rental
    Pay {
        rental_id: u64,
        #[arg(long, value_name = "PAYMENT_METHOD")]
        with: String,
    },

    /// Upload an image
    Upload { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortKey {
    Price,
    Name,
    Id,
}

impl From<SortKey> for OrderBy {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Price => OrderBy::Price,
            SortKey::Name => OrderBy::Name,
            SortKey::Id => OrderBy::Id,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortDir {
    Asc,
    Desc,
}

impl From<SortDir> for OrderDir {
    fn from(dir: SortDir) -> Self {
        match dir {
            SortDir::Asc => OrderDir::Asc,
            SortDir::Desc => OrderDir::Desc,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let config = setup::load_config(cli.config.as_deref())?;
    let market = Marketplace::new(config, setup::load_processor())?;
    debug!("Using {}", market.config().api_base_url);

    run(&market, cli.command).await
}

async fn run(market: &Marketplace, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            market.auth.login(&username, &password).await?;
            println!("Logged in as {}", username);
        }
        Commands::Logout => {
            market.auth.logout()?;
            println!("Logged out");
        }
        Commands::Signup {
            username,
            email,
            password,
        } => {
            market
                .auth
                .register_and_login(&username, &email, &password)
                .await?;
            println!("Account created, logged in as {}", username);
        }
        Commands::Forgot { username } => {
            let token = market.auth.forgot_password(&username).await?;
            println!("Reset token: {}", token);
        }
        Commands::Reset {
            token,
            new_password,
        } => {
            market.auth.reset_password(&token, &new_password).await?;
            println!("Password updated");
        }
        Commands::Items {
            name,
            min_price,
            max_price,
            available,
            categories,
            order_by,
            order_dir,
            skip,
            limit,
        } => {
            let mut query = ItemQuery::new()
                .with_price_range(min_price, max_price)
                .page(skip, limit);
            if let Some(name) = name {
                query = query.with_name(name);
            }
            if available {
                query = query.only_available();
            }
            for category in categories {
                query = query.with_category(category);
            }
            if let Some(key) = order_by {
                query = query.sorted_by(key.into(), order_dir.into());
            }

            let page = market.catalog.list_items(&query).await?;
            for item in &page.items {
                println!(
                    "{:>6}  {:<32} {:>10}/h  {}",
                    item.id,
                    item.name,
                    item.hourly_price(Currency::EUR).display(),
                    if item.available { "available" } else { "rented" }
                );
            }
            if let Some(total) = page.total {
                println!("{} of {} items", page.items.len(), total);
            }
        }
        Commands::Item { id } => {
            let detail = market.catalog.get_item(id).await?;
            let item = &detail.item;
            println!("{} (#{})", item.name, item.id);
            println!("  price:     {}/h", item.hourly_price(Currency::EUR).display());
            println!("  available: {}", item.available);
            println!("  owner:     {}", detail.owner_username);
            println!("  stock:     {}", detail.stock);
            if let Some(ref description) = item.description {
                println!("  {}", description);
            }
            if !item.categories.is_empty() {
                let names: Vec<&str> = item.categories.iter().map(|c| c.name.as_str()).collect();
                println!("  categories: {}", names.join(", "));
            }
        }
        Commands::Categories => {
            for category in market.catalog.categories().await? {
                println!("{:>4}  {}", category.id, category.name);
            }
        }
        Commands::Rentals => {
            for rental in market.rentals.my_rentals().await? {
                println!(
                    "{:>6}  {:<32} {:<10} deposit {}",
                    rental.id,
                    rental.item_name().unwrap_or("-"),
                    rental.status.to_string(),
                    rental.deposit_price(Currency::EUR).display()
                );
            }
        }
        Commands::Availability { item_id } => {
            let ranges = market.rentals.occupied_ranges(item_id).await?;
            if ranges.is_empty() {
                println!("No bookings for item {}", item_id);
            }
            for range in ranges {
                println!("{} → {}", range.start_at, range.end_at);
            }
        }
        Commands::Reserve {
            item_id,
            start,
            end,
            pay,
        } => {
            let window = match (start, end) {
                (Some(start), Some(end)) => Some(RentalWindow::new(start, end)?),
                (Some(start), None) => Some(RentalWindow::default_from(start)),
                _ => None,
            };

            // load the item first so a known-unavailable one fails without a rental request
            let detail = market.catalog.get_item(item_id).await?;
            debug!("Reserving {} (available: {})", detail.item.name, detail.item.available);

            let reservation = match market.reservations.reserve(item_id, window).await {
                Ok(reservation) => reservation,
                Err(failure) => return Err(explain_failure(failure)),
            };
            println!(
                "Rental {} created, deposit {}",
                reservation.rental.id,
                reservation.rental.deposit_price(Currency::EUR).display()
            );

            if let Some(payment_method) = pay {
                pay_deposit(market, reservation, payment_method).await?;
            }
        }
        Commands::Pay { rental_id, with } => {
            let rentals = market.rentals.my_rentals().await?;
            let rental = rentals
                .iter()
                .find(|r| r.id == rental_id)
                .ok_or_else(|| anyhow::anyhow!("No rental {} in your account", rental_id))?;

            let reservation = market.reservations.retry_payment(rental).await?;
            pay_deposit(market, reservation, with).await?;
        }
        Commands::Upload { path } => {
            let uploaded = market.uploads.upload_path(&path).await?;
            println!("{}", uploaded.url);
        }
    }

    Ok(())
}

async fn pay_deposit(
    market: &Marketplace,
    reservation: Reservation,
    payment_method: String,
) -> anyhow::Result<()> {
    let rental_id = reservation.rental.id;
    let outcome = market
        .confirmation
        .confirm(
            reservation.handshake_secret,
            PaymentMethodDetails::Existing(payment_method),
        )
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "{} (retry with `rentcart pay {} --with <method>`)",
                e.user_message(),
                rental_id
            )
        })?;

    match outcome {
        ConfirmationOutcome::Succeeded { .. } => println!("Deposit paid"),
        ConfirmationOutcome::Processing { .. } => println!("Payment processing"),
        ConfirmationOutcome::RequiresAction { redirect_url, .. } => match redirect_url {
            Some(url) => println!("Finish the payment at {}", url),
            None => println!("The payment needs further action in the app"),
        },
    }
    Ok(())
}

fn explain_failure(failure: ReservationFailure) -> anyhow::Error {
    match failure.rental {
        Some(rental) => anyhow::anyhow!(
            "{} (rental {} was created; pay it with `rentcart pay {} --with <method>`)",
            failure.error.user_message(),
            rental.id,
            rental.id
        ),
        None if failure.outcome_unknown => anyhow::anyhow!(
            "{} (the rental may have been created; check `rentcart rentals`)",
            failure.error.user_message()
        ),
        None => anyhow::anyhow!("{}", failure.error.user_message()),
    }
}
