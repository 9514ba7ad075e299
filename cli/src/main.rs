use std::io::Write;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wardstone_cli::CliContext;
use wardstone_cli::commands;
use wardstone_cli::readline;

#[tokio::main]
async fn main() -> Result<(), String> {
    init_logging();

    let ctx = CliContext::new();

    // Hydrate the registry (empty store on first run) and arm the reset
    // schedules for every map in the table.
    let now = ctx.now().await;
    if let Err(err) = ctx.registry.load(now) {
        tracing::warn!(%err, "failed to load lock store");
    }

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

/// Stdout-only logging, debug level for wardstone crates when
/// `DEBUG_LOGGING=1`.
fn init_logging() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(true);

    let filter_directive = if debug_logging {
        "info,wardstone_core=debug,wardstone_cli=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(EnvFilter::new(filter_directive))
        .init();
}

#[derive(Parser)]
#[command(version, about = "cli")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an encounter script file (TOML)
    Script {
        #[arg(short, long)]
        path: String,
        #[arg(short, long, default_value = "normal")]
        difficulty: String,
    },
    /// Decode a save-document file with the loaded script's codec
    Decode {
        #[arg(short, long)]
        path: String,
    },
    /// Print the loaded script's fresh skeleton document
    Skeleton,
    /// Request a boss state change on the loaded script
    Boss {
        #[arg(short, long, default_value_t = 1)]
        owner: u64,
        #[arg(short, long)]
        id: u32,
        #[arg(short, long)]
        state: String,
        #[arg(short, long, default_value_t = 5)]
        players: u32,
    },
    /// Create a temporary lock (transfer without progress)
    Enter {
        #[arg(short, long, default_value_t = 1)]
        owner: u64,
        #[arg(short, long)]
        map: u32,
        #[arg(short, long, default_value = "normal")]
        difficulty: String,
        #[arg(short, long)]
        instance: u32,
    },
    /// Toggle lock extension
    Extend {
        #[arg(short, long, default_value_t = 1)]
        owner: u64,
        #[arg(short, long)]
        map: u32,
        #[arg(short, long, default_value = "normal")]
        difficulty: String,
        /// Clear the extension instead of setting it
        #[arg(long)]
        off: bool,
    },
    /// List all locks
    Locks,
    /// Show the next reset per scheduled map/difficulty
    NextResets,
    /// Advance the simulated clock and fire due reset events
    Tick {
        #[arg(short, long, default_value_t = 60)]
        advance_secs: i64,
    },
    /// Show the reset configuration
    Config,
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "wardstone".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Script { path, difficulty }) => {
            commands::load_script(path, difficulty, ctx).await?
        }
        Some(Commands::Decode { path }) => commands::decode(path, ctx).await?,
        Some(Commands::Skeleton) => commands::skeleton(ctx).await?,
        Some(Commands::Boss { owner, id, state, players }) => {
            commands::set_boss_state(*owner, *id, state, *players, ctx).await?
        }
        Some(Commands::Enter { owner, map, difficulty, instance }) => {
            commands::enter(*owner, *map, difficulty, *instance, ctx).await?
        }
        Some(Commands::Extend { owner, map, difficulty, off }) => {
            commands::extend(*owner, *map, difficulty, *off, ctx).await?
        }
        Some(Commands::Locks) => commands::show_locks(ctx).await?,
        Some(Commands::NextResets) => commands::next_resets(ctx).await?,
        Some(Commands::Tick { advance_secs }) => commands::tick(*advance_secs, ctx).await?,
        Some(Commands::Config) => commands::show_config(ctx).await?,
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
