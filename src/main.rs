mod commands;
mod logging;
mod render;
mod settings;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use calref_core::reconcile::CombineMode;
use clap::{Parser, Subcommand};
use commands::{Context, ReferenceArgs, WindowArgs};
use render::{EventField, Format};
use settings::Settings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "calref", version)]
#[command(about = "Query calendars, combine their events, and fill in private events from calendars you can see")]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, hide = true)]
    debug: bool,

    /// Give up after this long (e.g. "30s", "2m")
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Columns of the events table, comma separated (default: date_time,summary)
    #[arg(long, global = true, value_enum, value_delimiter = ',')]
    fields: Vec<EventField>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List events of one calendar, completing private events
    #[command(visible_alias = "e")]
    Events {
        /// Calendar to list (default: primary)
        calendar_id: Option<String>,

        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        refs: ReferenceArgs,
    },
    /// Show events present in every given calendar
    #[command(visible_alias = "i")]
    Intersect {
        #[arg(required = true, num_args = 2..)]
        calendar_ids: Vec<String>,

        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        refs: ReferenceArgs,
    },
    /// Show events present in any given calendar
    #[command(visible_alias = "u")]
    Union {
        #[arg(required = true, num_args = 2..)]
        calendar_ids: Vec<String>,

        /// Keep calendar order instead of sorting by start
        #[arg(long)]
        no_sort: bool,

        #[command(flatten)]
        window: WindowArgs,

        #[command(flatten)]
        refs: ReferenceArgs,
    },
    /// List your calendars
    Ls,
    /// Directory calendar resources (rooms, equipment)
    Res {
        #[command(subcommand)]
        command: ResCommands,
    },
    /// Authorize calref with your Google account
    Auth {
        /// Delete the cached credential instead
        #[arg(long)]
        logout: bool,
    },
}

#[derive(Subcommand)]
enum ResCommands {
    /// List calendar resources
    #[command(visible_alias = "ls")]
    List {
        /// Only resources in this building
        #[arg(long)]
        building: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose || cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load()?;
    debug!(?settings, "Loaded settings");

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone(), cli.timeout);

    let ctx = Context::new(settings, cli.format, cli.fields, cancel);

    match cli.command {
        Commands::Events {
            calendar_id,
            window,
            refs,
        } => commands::events::run(&ctx, calendar_id, &window, &refs).await,
        Commands::Intersect {
            calendar_ids,
            window,
            refs,
        } => commands::combine::run(&ctx, calendar_ids, CombineMode::Intersection, &window, &refs).await,
        Commands::Union {
            calendar_ids,
            no_sort,
            window,
            refs,
        } => {
            let mode = CombineMode::Union { sort: !no_sort };
            commands::combine::run(&ctx, calendar_ids, mode, &window, &refs).await
        }
        Commands::Ls => commands::ls::run(&ctx).await,
        Commands::Res {
            command: ResCommands::List { building },
        } => commands::res::list(&ctx, building.as_deref()).await,
        Commands::Auth { logout } => commands::auth::run(&ctx, logout).await,
    }
}

/// Cancel in-flight work on Ctrl-C or once `timeout` elapses.
fn cancel_on_interrupt(cancel: CancellationToken, timeout: Option<Duration>) {
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => warn!("Interrupted, cancelling"),
            _ = deadline => warn!(?timeout, "Timed out, cancelling"),
        }

        cancel.cancel();
    });
}
