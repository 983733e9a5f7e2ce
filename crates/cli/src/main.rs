//! Shopsync CLI - drive a shopping session from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (persists identity for later commands)
//! shopsync login -e asha@example.com -p 'hunter2!'
//!
//! # Inspect the bag
//! shopsync bag show
//!
//! # Change a line's quantity
//! shopsync bag qty --item 66b2f0a1c4 --quantity 3
//!
//! # Manage addresses and orders
//! shopsync address list
//! shopsync address set-default 66b2f0a1c4
//! shopsync orders list
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPSYNC_API_BASE_URL` - Base URL of the shop backend (required)
//! - `SHOPSYNC_IDENTITY_PATH` - Where the signed-in identity is stored

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shopsync")]
#[command(author, version, about = "Shopsync session CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the identity
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and clear the persisted identity
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Bag operations
    Bag {
        #[command(subcommand)]
        action: BagAction,
    },
    /// Coupon operations
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Address operations
    Address {
        #[command(subcommand)]
        action: AddressAction,
    },
    /// Order operations
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum BagAction {
    /// Show bag lines and checkout totals
    Show,
    /// Change a line's quantity
    Qty {
        /// Bag line id
        #[arg(short, long)]
        item: String,

        /// New quantity (1-10)
        #[arg(short, long)]
        quantity: u32,
    },
    /// Remove a line
    Remove {
        /// Bag line id
        #[arg(short, long)]
        item: String,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Apply a coupon code to the bag
    Apply {
        /// Coupon code
        code: String,
    },
    /// Remove the applied coupon
    Remove,
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Mark an address as default
    SetDefault {
        /// Address id
        id: String,
    },
    /// Delete an address
    Delete {
        /// Address id
        id: String,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, most recent first
    List,
    /// Show one order
    Show {
        /// Order id
        id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&email, &password).await?,
        Commands::Logout => commands::auth::logout().await?,
        Commands::Whoami => commands::auth::whoami().await?,
        Commands::Bag { action } => match action {
            BagAction::Show => commands::bag::show().await?,
            BagAction::Qty { item, quantity } => commands::bag::set_quantity(&item, quantity).await?,
            BagAction::Remove { item } => commands::bag::remove(&item).await?,
        },
        Commands::Coupon { action } => match action {
            CouponAction::Apply { code } => commands::bag::apply_coupon(&code).await?,
            CouponAction::Remove => commands::bag::remove_coupon().await?,
        },
        Commands::Address { action } => match action {
            AddressAction::List => commands::address::list().await?,
            AddressAction::SetDefault { id } => commands::address::set_default(&id).await?,
            AddressAction::Delete { id } => commands::address::delete(&id).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list().await?,
            OrdersAction::Show { id } => commands::orders::show(&id).await?,
        },
    }
    Ok(())
}
