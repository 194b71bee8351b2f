// catwatch command line interface
// Watches a snapshot camera and reacts when a cat shows up

mod runner;

use anyhow::Context;
use catwatch_cns::{ActionDispatcher, BurstSettings, HttpActuator, TelegramNotifier};
use catwatch_core::{CatwatchConfig, PresenceArbiter};
use catwatch_eye::{DetectionPipeline, HttpSnapshotCamera, RemoteDetector};
use clap::{Parser, Subcommand};
use runner::TickLoop;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "catwatch")]
#[command(about = "Camera-driven cat presence detector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the detection loop (default)
    Run,

    /// Load and validate the configuration, then print it
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json);

    let config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&redacted(&config))?);
            Ok(())
        }
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// File (or defaults), then environment overrides, then validation
fn load_config(path: Option<&Path>) -> anyhow::Result<CatwatchConfig> {
    let mut config = match path {
        Some(path) => CatwatchConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CatwatchConfig::default(),
    };
    config.apply_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn redacted(config: &CatwatchConfig) -> CatwatchConfig {
    let mut shown = config.clone();
    if !shown.notifier.bot_token.is_empty() {
        shown.notifier.bot_token = "***".to_string();
    }
    shown
}

async fn run(config: CatwatchConfig) -> anyhow::Result<()> {
    info!("Starting catwatch");

    let camera = Arc::new(HttpSnapshotCamera::new(&config.camera)?);
    info!("Snapshot camera: {}", camera.snapshot_url());

    let classifier = Arc::new(RemoteDetector::new(&config.classifier, config.runtime.input_size)?);
    let pipeline = DetectionPipeline::new(classifier, config.detection.clone());

    let actuator = Arc::new(HttpActuator::new(&config.actuator)?);
    let notifier = Arc::new(TelegramNotifier::new(&config.notifier)?);
    let dispatcher = ActionDispatcher::new(
        actuator,
        notifier,
        camera.clone(),
        BurstSettings::from(&config.runtime),
    );

    let arbiter = PresenceArbiter::new(config.presence.clone());
    let tick_loop = TickLoop::new(
        camera,
        pipeline,
        arbiter,
        dispatcher,
        config.runtime.tick_interval(),
    );

    info!("Detection loop running, tick every {:?}", config.runtime.tick_interval());
    tokio::select! {
        _ = tick_loop.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cli_defaults_to_run() {
        let cli = Cli::parse_from(["catwatch"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["catwatch", "check-config", "--config", "cat.toml", "--json"]);
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, Some(PathBuf::from("cat.toml")));
        assert!(cli.json);
    }

    #[test]
    fn test_load_config_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[presence]\nmin_hold_secs = 7\n\n[presence.policy]\nkind = \"recency_window\"\nignore_person_window_secs = 20\n"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.presence.min_hold_secs, 7);
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, r#"{{"detection": {{"cat_confidence_threshold": 1.5}}}}"#).unwrap();

        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Some(Path::new("/nonexistent/catwatch.toml"))).is_err());
    }

    #[test]
    fn test_redacted_hides_token() {
        let mut config = CatwatchConfig::default();
        config.notifier.bot_token = "123:secret".to_string();
        let shown = redacted(&config);
        assert_eq!(shown.notifier.bot_token, "***");
        assert_eq!(config.notifier.bot_token, "123:secret");
    }
}
