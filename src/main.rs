//! Mindful Breaks - a work/break focus timer
//! 
//! This is the main entry point: `serve` runs the background timer daemon,
//! every other command acts as a short-lived popup talking to it.

use std::{
    io::{self, Write},
    sync::Arc,
};
use anyhow::{anyhow, Context};
use tokio::net::TcpListener;
use tracing::info;

use mindful_breaks::{
    api::create_router,
    clock::SystemClock,
    config::{ClientConfig, Command, Config, ServeConfig},
    popup::{HttpControlClient, Popup, PopupView},
    services::{DesktopPresenter, NullPresenter, Presenter},
    state::{AppState, Store},
    tasks::alarm_listener_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("mindful_breaks={},tower_http=info", config.log_level()))
        .with_writer(io::stderr)
        .init();

    match config.command {
        Command::Serve(serve) => run_server(serve).await,
        Command::Start { minutes, client } => {
            let mut popup = open_popup(&client).await?;
            if popup.start(&minutes).await.map_err(|e| anyhow!(e))? {
                print_view(popup.view(), popup.is_paused());
            }
            Ok(())
        }
        Command::Toggle { client } => {
            let mut popup = open_popup(&client).await?;
            popup.toggle_pause().await.map_err(|e| anyhow!(e))?;
            print_view(popup.view(), popup.is_paused());
            Ok(())
        }
        Command::Status { client } => {
            let popup = open_popup(&client).await?;
            print_view(popup.view(), popup.is_paused());
            Ok(())
        }
        Command::Watch { client } => {
            let mut popup = open_popup(&client).await?;
            print_view(popup.view(), popup.is_paused());

            tokio::select! {
                result = popup.run_display_loop(|view| {
                    print!("\r{}   ", view.countdown);
                    let _ = io::stdout().flush();
                }) => {
                    println!();
                    result.map_err(|e| anyhow!(e))
                }
                _ = shutdown_signal() => {
                    println!();
                    Ok(())
                }
            }
        }
    }
}

async fn run_server(config: ServeConfig) -> anyhow::Result<()> {
    info!("Starting mindful-breaks daemon v{}", env!("CARGO_PKG_VERSION"));
    let state_path = config.state_path();
    info!("Configuration: host={}, port={}, state={}",
          config.host, config.port, state_path.display());

    let presenter: Arc<dyn Presenter> = if config.no_present {
        Arc::new(NullPresenter)
    } else {
        Arc::new(DesktopPresenter)
    };

    // Create application state
    let (state, fired_rx) = AppState::new(
        Arc::new(Store::open(&state_path)),
        Arc::new(SystemClock),
        presenter,
        config.host.clone(),
        config.port,
    );
    let state = Arc::new(state);

    // Alarm listener must be running before persisted alarms are re-armed
    tokio::spawn(alarm_listener_task(Arc::clone(&state), fired_rx));
    state.restore();

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /message - Control channel (startTimer, pauseTimer, resumeTimer, getTimerState)");
    info!("  GET  /status  - Timer, session type and uptime");
    info!("  GET  /break   - Break page");
    info!("  GET  /health  - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.stop_refresh_loop();
    info!("Server shutdown complete");
    Ok(())
}

async fn open_popup(client: &ClientConfig) -> anyhow::Result<Popup<HttpControlClient>> {
    Popup::open(HttpControlClient::new(client.server.clone()))
        .await
        .map_err(|e| anyhow!(e))
}

fn print_view(view: &PopupView, paused: bool) {
    let status = if view.start_enabled {
        "no active work session"
    } else if paused {
        "paused"
    } else {
        "running"
    };
    println!("{} ({})", view.countdown, status);
}
