//! Fleet Console - Entry Point
//!
//! Operator console for an orchestrator that launches, restarts and tears
//! down head/worker deployments.

use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use fleetconsole::app::commands;
use fleetconsole::app::options::AppOptions;
use fleetconsole::app::run::{tail, watch};
use fleetconsole::app::state::AppState;
use fleetconsole::config::args::CliArgs;
use fleetconsole::config::settings::{Settings, DEFAULT_SETTINGS_FILE};
use fleetconsole::errors::ConsoleError;
use fleetconsole::logs::init_logging;
use fleetconsole::ui::clipboard::StdoutClipboard;
use fleetconsole::ui::prompt::{AssumeYes, Confirm, StdinConfirm};
use fleetconsole::ui::row::RowOutcome;
use fleetconsole::utils::version_info;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli_args = CliArgs::parse(env::args().skip(1));

    // Print version and exit
    if cli_args.flag("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Unable to serialize version info: {e}"),
        }
        return;
    }

    // Retrieve the settings file
    let settings_path = cli_args
        .get("config")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    let mut settings = match Settings::load(&settings_path).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = settings.apply_args(&cli_args) {
        eprintln!("{e}");
        std::process::exit(2);
    }

    // Initialize logging
    let _log_guard = match init_logging(settings.log_options()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let mut options = settings.app_options();
    options.watch.color = std::io::stdout().is_terminal();
    options.watch.clear_screen = options.watch.color;

    info!("Running fleetconsole with options: {:?}", options);
    if let Err(e) = dispatch(&cli_args, &options).await {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn dispatch(args: &CliArgs, options: &AppOptions) -> Result<(), ConsoleError> {
    let state = Arc::new(AppState::init(options)?);
    let confirm: &dyn Confirm = if args.flag("yes") {
        &AssumeYes
    } else {
        &StdinConfirm
    };

    if args.flag("list") {
        print!("{}", commands::list(&state, options.watch.color).await?);
    } else if args.flag("keys") {
        print!("{}", commands::keys(&state).await?);
    } else if args.flag("launch") {
        let deployment_id = commands::launch(&state, args).await?;
        println!("Launched deployment {}", deployment_id);
    } else if args.flag("delete") {
        let id = args.required("delete")?;
        report("Deleted", id, commands::delete(&state, id, confirm).await?);
    } else if args.flag("restart") {
        let id = args.required("restart")?;
        report("Restarting", id, commands::restart(&state, id, confirm).await?);
    } else if args.flag("connect") {
        let id = args.required("connect")?;
        report("Connecting to", id, commands::connect(&state, id).await?);
    } else if args.flag("open-logs") {
        let id = args.required("open-logs")?;
        report("Opened logs for", id, commands::open_logs(&state, id).await?);
    } else if args.flag("clear-terminated") {
        let outcome = commands::clear_terminated(&state, confirm).await?;
        report("Cleared terminated deployments", "", outcome);
    } else if args.flag("export") {
        let id = args.required("export")?;
        if let RowOutcome::NotAllowed(reason) =
            commands::export(&state, id, &StdoutClipboard).await?
        {
            return Err(ConsoleError::ValidationError(reason));
        }
    } else if args.flag("logs") && !args.flag("watch") {
        let id = args.required("logs")?;
        let status = tail(state, options, id, await_shutdown_signal()).await?;
        if let Some(status) = status {
            println!("(finished: {})", status);
        }
    } else {
        let follow = args.get("logs").map(str::to_string);
        watch(state, options, follow, await_shutdown_signal()).await?;
    }
    Ok(())
}

fn report(done: &str, deployment_id: &str, outcome: RowOutcome) {
    match outcome {
        RowOutcome::Done => println!("{} {}", done, deployment_id),
        RowOutcome::Declined => println!("Cancelled"),
        RowOutcome::NotAllowed(reason) => println!("Not allowed: {}", reason),
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                _ => {
                    error!("Unable to install signal handlers, falling back to Ctrl+C");
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Ctrl+C received, shutting down...");
    }
}
