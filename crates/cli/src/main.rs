//! Resto CLI - courier client for the restaurant API Gateway.
//!
//! # Usage
//!
//! ```bash
//! # Log in (the session is kept in RESTO_STATE_FILE)
//! resto login -u jean -p secret
//!
//! # Make sure a delivery agent exists for the logged-in client
//! resto courier init
//!
//! # Work through assigned deliveries
//! resto deliveries list
//! resto deliveries advance 3
//!
//! # Kitchen side: hand a ready order over to delivery
//! resto deliveries dispatch --order 12 --address "5 avenue Foch" --phone 0600000000
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session management
//! - `courier init` - Find or create the delivery agent of the session's client
//! - `courier status` - Set the agent's availability
//! - `deliveries` - List, advance, cancel and dispatch deliveries

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resto_core::AgentAvailability;

mod commands;

#[derive(Parser)]
#[command(name = "resto")]
#[command(author, version, about = "Resto courier CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in through the API Gateway
    Login {
        /// Username
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(short, long, env = "RESTO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session and cached agent
    Logout,
    /// Show the stored session
    Whoami,
    /// Manage the courier's delivery agent
    Courier {
        #[command(subcommand)]
        action: CourierAction,
    },
    /// Work with deliveries
    Deliveries {
        #[command(subcommand)]
        action: DeliveryAction,
    },
}

#[derive(Subcommand)]
enum CourierAction {
    /// Find or create the delivery agent for the logged-in client
    Init,
    /// Set availability (`disponible`, `en_livraison`, `indisponible`)
    Status {
        availability: AgentAvailability,
    },
}

#[derive(Subcommand)]
enum DeliveryAction {
    /// List deliveries assigned to the agent
    List,
    /// Move a delivery to its next status
    Advance {
        /// Delivery id
        id: String,
    },
    /// Cancel a delivery
    Cancel {
        /// Delivery id
        id: String,
    },
    /// Create the delivery of a ready order (chef only)
    Dispatch {
        /// Order id
        #[arg(short, long)]
        order: String,

        /// Delivery address
        #[arg(short, long)]
        address: String,

        /// Client phone number
        #[arg(short, long)]
        phone: String,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "resto=info,resto_courier=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let context = commands::Context::load()?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::session::login(&context, &username, password.into()).await?;
        }
        Commands::Logout => commands::session::logout(&context)?,
        Commands::Whoami => commands::session::whoami(&context)?,
        Commands::Courier { action } => match action {
            CourierAction::Init => {
                commands::courier::init(&context).await?;
            }
            CourierAction::Status { availability } => {
                commands::courier::set_status(&context, availability).await?;
            }
        },
        Commands::Deliveries { action } => match action {
            DeliveryAction::List => commands::deliveries::list(&context).await?,
            DeliveryAction::Advance { id } => commands::deliveries::advance(&context, &id).await?,
            DeliveryAction::Cancel { id } => commands::deliveries::cancel(&context, &id).await?,
            DeliveryAction::Dispatch {
                order,
                address,
                phone,
            } => commands::deliveries::dispatch(&context, &order, &address, &phone).await?,
        },
    }
    Ok(())
}
