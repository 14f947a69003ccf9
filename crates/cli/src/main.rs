//! Ctrl Dot guard CLI: talk to the policy authority from a terminal.
//!
//! Commands:
//! - `status`   Show the resolved guard configuration
//! - `doctor`   Check configuration and daemon reachability
//! - `register` Register an agent
//! - `budget`   Show an agent's budget status
//! - `propose`  Submit a tool-call proposal and print the decision

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ctrldot-guard",
    about = "Ctrl Dot guard: client for the Ctrl Dot policy authority",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Policy authority address (overrides config and CTRLDOT_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Bearer token (overrides config and CTRLDOT_AUTH_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved configuration
    Status,

    /// Check configuration and daemon reachability
    Doctor,

    /// Register an agent with the policy authority
    Register {
        /// Agent identifier
        agent_id: String,

        /// Human-readable name
        #[arg(long)]
        name: Option<String>,

        /// Default operating mode
        #[arg(long, value_parser = ["normal", "cheap", "throttled"])]
        mode: Option<String>,
    },

    /// Show an agent's budget status
    Budget {
        /// Agent identifier
        agent_id: String,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Propose a tool call and print the decision
    Propose {
        /// Tool name, e.g. `git.push`
        tool_name: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,

        /// Agent identifier (defaults to config / CTRLDOT_AGENT_ID)
        #[arg(long)]
        agent: Option<String>,

        /// Session identifier (defaults to config / CTRLDOT_SESSION_ID, else a fresh one)
        #[arg(long)]
        session: Option<String>,

        /// Resolution token granted after an earlier denial
        #[arg(long)]
        resolution_token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let overrides = commands::Overrides {
        url: cli.url,
        token: cli.token,
    };

    match cli.command {
        Commands::Status => commands::status::run(&overrides).await?,
        Commands::Doctor => commands::doctor::run(&overrides).await?,
        Commands::Register {
            agent_id,
            name,
            mode,
        } => commands::register::run(&overrides, &agent_id, name, mode).await?,
        Commands::Budget { agent_id, json } => {
            commands::budget::run(&overrides, &agent_id, json).await?
        }
        Commands::Propose {
            tool_name,
            args,
            agent,
            session,
            resolution_token,
        } => {
            commands::propose::run(
                &overrides,
                commands::propose::ProposeArgs {
                    tool_name,
                    args,
                    agent,
                    session,
                    resolution_token,
                },
            )
            .await?
        }
    }

    Ok(())
}
