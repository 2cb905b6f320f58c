//! `strider` – headless vision-navigation run.
//!
//! 1. Loads `~/.strider/config.toml` (defaults when absent).
//! 2. Probes the local Ollama instance for the vision model.
//! 3. Starts the simulated robot's physics loop on its own thread.
//! 4. Runs the navigation loop until it gives up or spends its step budget,
//!    then stops the robot and prints a summary.
//!
//! **Ctrl-C** stops the robot and exits immediately.

mod config;
mod ollama;

use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

use strider_bridge::{CommandApi, CommandBridge, RobotControl};
use strider_hal::{PhysicsStepConsumer, SimCamera, SimRobot, TickLoop};
use strider_runtime::{NavLoop, NavSummary, Termination, VisionDriver, init_tracing};
use strider_types::Twist;

const SPAWN_POSITION: [f64; 3] = [0.0, 0.0, 0.8];
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

fn main() -> ExitCode {
    let _telemetry = init_tracing("strider");
    print_banner();

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("  {}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };
    info!(path = %config::config_path().display(), ?cfg, "configuration");

    probe_ollama(&cfg);

    // ── Physics side ──────────────────────────────────────────────────────
    let bridge = Arc::new(CommandBridge::new());
    let shutdown = Arc::new(AtomicBool::new(false));
    let consumer = PhysicsStepConsumer::new(
        Arc::clone(&bridge),
        SimRobot::new("sim_base", SPAWN_POSITION),
        SimCamera::new("front_rgb", cfg.camera_resolution()),
    );
    let physics = match TickLoop::new(consumer, cfg.tick_config()).spawn(Arc::clone(&shutdown)) {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "failed to start physics thread");
            return ExitCode::FAILURE;
        }
    };

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let bridge_ctrlc = Arc::clone(&bridge);
    let shutdown_ctrlc = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping robot …".yellow().bold());
        bridge_ctrlc.set_command(Twist::ZERO, 0.0);
        shutdown_ctrlc.store(true, Ordering::Release);
        println!("{}", "  ✓ Robot stopped.".green());
        std::process::exit(130);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; interrupting will not stop the robot");
    }

    // ── Navigation side ───────────────────────────────────────────────────
    let summary = match run_navigation(&cfg, Arc::clone(&bridge)) {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "navigation could not start");
            bridge.set_command(Twist::ZERO, 0.0);
            shutdown.store(true, Ordering::Release);
            let _ = physics.join();
            return ExitCode::FAILURE;
        }
    };

    shutdown.store(true, Ordering::Release);
    match physics.join() {
        Ok(ticks) => info!(ticks, "physics thread joined"),
        Err(_) => warn!("physics thread panicked"),
    }

    print_summary(&summary);
    ExitCode::SUCCESS
}

fn run_navigation(cfg: &config::Config, bridge: Arc<CommandBridge>) -> Result<NavSummary, String> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| format!("Failed to start async runtime: {e}"))?;
    let driver = VisionDriver::new(&cfg.ollama_url, &cfg.vision_model, cfg.classification_timeout())
        .map_err(|e| format!("Failed to build vision client: {e}"))?;
    let api = CommandApi::new(bridge);

    runtime.block_on(async {
        let summary = NavLoop::new(api.clone(), driver, cfg.nav_config()).run().await;
        if let Err(e) = api.stop().await {
            warn!(error = %e, "final stop failed");
        }
        Ok(summary)
    })
}

fn probe_ollama(cfg: &config::Config) {
    print!("\n  Probing Ollama at {} … ", cfg.ollama_url.dimmed());
    match ollama::fetch_models(&cfg.ollama_url, PROBE_TIMEOUT) {
        Ok(models) => {
            println!("{} ({} model(s) available)", "online".green(), models.len());
            if ollama::has_model(&models, &cfg.vision_model) {
                println!("  Vision model {} is ready.", cfg.vision_model.bold());
            } else {
                println!(
                    "  {}  Run `{}` first.",
                    format!("Vision model {} not found.", cfg.vision_model).yellow(),
                    format!("ollama pull {}", cfg.vision_model).bold()
                );
            }
        }
        Err(e) => {
            println!("{}", "offline".yellow());
            warn!(error = %e, "Ollama probe failed; classification will retry until it comes up");
            println!(
                "  {}  Run `{}` to start a local model server.",
                "No Ollama instance detected.".dimmed(),
                "ollama serve".bold()
            );
        }
    }
    println!();
}

fn print_summary(summary: &NavSummary) {
    let reason = match summary.termination {
        Termination::MaxSteps => "step budget spent",
        Termination::Blocked => "path blocked in every direction",
    };
    println!();
    println!("{}", "  Navigation complete".bold().green());
    println!("    Run:            {}", summary.run_id.to_string().dimmed());
    println!("    Reason:         {}", reason);
    println!("    Steps:          {}", summary.progress.step_count);
    println!("    Distance moved: {:.2} m", summary.progress.distance_moved);
    println!();
}

fn print_banner() {
    println!();
    println!("{}", r#"         __       _     __         "#.bold().cyan());
    println!("{}", r#"   _____/ /______(_)___/ /__  _____"#.bold().cyan());
    println!("{}", r#"  / ___/ __/ ___/ / __  / _ \/ ___/"#.bold().cyan());
    println!("{}", r#" (__  ) /_/ /  / / /_/ /  __/ /    "#.bold().cyan());
    println!("{}", r#"/____/\__/_/  /_/\__,_/\___/_/     "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "strider".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Vision-driven legged navigation");
    println!();
}
