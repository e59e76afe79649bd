use clap::{Parser, Subcommand};
use tracing::info;

use clip_giveaway::config::Config;
use clip_giveaway::constants::DEFAULT_TOP_LIMIT;
use clip_giveaway::engine::EligibilityEngine;
use clip_giveaway::handlers::{Command, CommandHandlers};
use clip_giveaway::ledger::TicketLedger;
use clip_giveaway::logging::init_logging;
use clip_giveaway::sources::PlatformResolver;

#[derive(Parser)]
#[command(name = "clip-giveaway")]
#[command(about = "Giveaway engine with short-form video provenance checks")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Join the running giveaway (optionally via a referral payload)
    Start {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        handle: Option<String>,
        /// Referral payload from a deep link, e.g. "3_42"
        #[arg(long)]
        payload: Option<String>,
    },
    /// Show ticket standing for a user
    Profile {
        #[arg(long)]
        user: i64,
    },
    /// Submit a video URL for verification
    Submit {
        #[arg(long)]
        user: i64,
        url: String,
    },
    /// Start a new giveaway (admin)
    Create {
        name: String,
        hours: i64,
    },
    /// Pick a winner and close the giveaway (admin)
    Draw,
    /// Participant and ticket counts (admin)
    Stats,
    /// Top participants by ticket count (admin)
    Top {
        #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
        limit: usize,
    },
    /// Cancel the running giveaway (admin)
    Cancel,
    /// Revoke a user's video ticket (admin)
    RemoveVideo {
        user: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    init_logging();

    // Missing credentials are fatal before any I/O happens
    let config = Config::from_env()?;

    info!("Opening ticket ledger at {}", config.db_path);
    let ledger = TicketLedger::open(&config.db_path)?;
    let resolver = PlatformResolver::new(&config)?;
    let mut handlers = CommandHandlers::new(EligibilityEngine::new(
        ledger,
        Box::new(resolver),
        &config,
    ));

    let admin = config.admin_id;
    let (caller, handle, command) = match cli.command {
        CliCommand::Start { user, handle, payload } => (user, handle, Command::Start { payload }),
        CliCommand::Profile { user } => (user, None, Command::Profile),
        CliCommand::Submit { user, url } => (user, None, Command::Submit { url }),
        CliCommand::Create { name, hours } => (admin, None, Command::Create { name, hours }),
        CliCommand::Draw => (admin, None, Command::Draw),
        CliCommand::Stats => (admin, None, Command::Stats),
        CliCommand::Top { limit } => (admin, None, Command::Top { limit }),
        CliCommand::Cancel => (admin, None, Command::Cancel),
        CliCommand::RemoveVideo { user } => (admin, None, Command::RemoveVideo { user_id: user }),
    };

    let reply = handlers.dispatch(caller, handle.as_deref(), command).await?;
    if !reply.is_silent() {
        println!("{}", reply.text);
        for button in &reply.buttons {
            println!("[{button:?}]");
        }
    }

    Ok(())
}
