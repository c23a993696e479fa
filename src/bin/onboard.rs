use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use device_onboard::app::OnboardApp;
use device_onboard::error::{OnboardError, Result};
use device_onboard::event::EventHandler;
use device_onboard::onboard::{self, OnboardConfig, OnboardContext};
use ratatui::prelude::*;
use std::io::stdout;
use std::panic;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "device-onboard")]
#[command(author, version, about = "First-boot onboarding wizard for FLECS devices")]
struct Args {
    /// Path to config file (default: /etc/device-onboard/onboard.toml)
    #[arg(long)]
    config: Option<String>,

    /// Run against a simulated device instead of the device API
    #[arg(long)]
    dryrun: bool,

    /// Override the device API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Log file path (logging disabled if not specified)
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging only if log file is specified
    if let Some(ref log_path) = args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .ok();

        if let Some(file) = file {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();

            info!("Starting device-onboard");
        }
    }

    let config = load_config(&args);
    let context = onboard::connect(&config)?;

    if !onboard::onboarding_status(&context).await.is_required() {
        info!("Device already onboarded, skipping wizard");
        println!("Device is already onboarded. Continue at the device login.");
        return Ok(());
    }

    // Set up panic handler to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let result = run_wizard(&mut terminal, config, context).await;
    restore_terminal()?;

    match result {
        Ok(true) => {
            println!("Onboarding complete. Continue at the device login.");
            Ok(())
        }
        Ok(false) => {
            println!("Onboarding was not finished.");
            Ok(())
        }
        Err(e) => {
            error!("Onboarding error: {}", e);
            Err(e)
        }
    }
}

fn load_config(args: &Args) -> OnboardConfig {
    let loaded = match args.config.as_deref() {
        Some(path) => OnboardConfig::load_from(path),
        None => OnboardConfig::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        OnboardConfig::default()
    });

    // Command line flags override config
    if args.dryrun {
        config.general.dryrun = true;
    }
    if let Some(ref url) = args.base_url {
        config.api.base_url = url.clone();
    }
    config
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode().map_err(|e| OnboardError::Terminal(e.to_string()))?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| OnboardError::Terminal(e.to_string()))?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| OnboardError::Terminal(e.to_string()))
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().map_err(|e| OnboardError::Terminal(e.to_string()))?;
    execute!(stdout(), LeaveAlternateScreen).map_err(|e| OnboardError::Terminal(e.to_string()))?;
    Ok(())
}

/// Returns whether onboarding finished and the login should take over
async fn run_wizard(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    config: OnboardConfig,
    context: OnboardContext,
) -> Result<bool> {
    let mut events = EventHandler::new(Duration::from_millis(250));

    let mut app = OnboardApp::new(config, context, events.sender());
    events.watch_wizard(app.subscribe());
    app.start();

    loop {
        app.on_render();

        terminal
            .draw(|frame| device_onboard::ui::draw(frame, &app))
            .map_err(|e| OnboardError::Terminal(e.to_string()))?;

        match events.next().await {
            Some(event) => app.handle_event(event),
            None => break,
        }

        if app.should_exit {
            break;
        }
    }

    Ok(app.handoff && app.wizard.is_completed)
}
