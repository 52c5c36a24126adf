use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use sensor_panel::sensor::system;
use sensor_panel::{
    ConsoleDisplay, Devices, FileLog, LogDisplay, LogSink, NotificationSink, Panel, PanelConfig,
    PushoverSink, SensorRegistry, TerminalDisplay, Theme,
};

/// Pause between steps of the start-up self test.
const SELF_TEST_STEP: Duration = Duration::from_millis(500);

/// How long exit waits for blocking work still running after release.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DisplayKind {
    /// One line per update on stdout
    Console,
    /// Updates go to the log
    Log,
    /// Inline terminal panel with a trend line
    Terminal,
}

#[derive(Parser, Debug)]
#[command(name = "sensor-panel")]
#[command(about = "Cycle through configured sensors with trend traces, severity lights and debounced alerts")]
struct Args {
    /// Panel document: order, polling, per-sensor screen settings
    #[arg(short, long, default_value = "conf/panel.toml")]
    panel: PathBuf,

    /// Sensor document: names, readers, baselines, thresholds
    #[arg(short, long, default_value = "conf/sensors.toml")]
    sensors: PathBuf,

    /// Display backend
    #[arg(short, long, value_enum, default_value_t = DisplayKind::Console)]
    display: DisplayKind,

    /// Validate the configuration, print the resolved sensors as JSON and exit
    #[arg(long)]
    check: bool,

    /// Light each indicator band and sound the buzzer before starting
    #[arg(long)]
    self_test: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // The terminal panel shares the tty with stderr; keep the log quiet there
    let default_level = match args.display {
        DisplayKind::Terminal => "warn",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = PanelConfig::load(&args.panel, &args.sensors).with_context(|| {
        format!(
            "Invalid configuration in {} / {}",
            args.panel.display(),
            args.sensors.display()
        )
    })?;

    // Handle check mode (non-interactive)
    if args.check {
        let registry = SensorRegistry::with_system_readers();
        for descriptor in &config.sensors {
            registry.resolve(descriptor)?;
        }
        println!("{}", serde_json::to_string_pretty(&config.sensors)?);
        return Ok(());
    }

    block_on(run(config, args.display, args.self_test))?
}

/// Drive `future` on a fresh tokio runtime.
///
/// Abandoned sensor reads may never return, so the runtime is shut down with
/// a bounded grace period instead of waiting for its blocking threads.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()?;
    let output = rt.block_on(future);
    rt.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}

async fn run(config: PanelConfig, display: DisplayKind, self_test: bool) -> Result<()> {
    let registry = SensorRegistry::with_system_readers();
    debug!(readers = ?registry.names().collect::<Vec<_>>(), "Reader registry ready");
    let devices = build_devices(&config, display)?;

    let mut panel = Panel::new(config, &registry, devices)?;
    if self_test {
        panel.self_test(SELF_TEST_STEP).await;
    }
    panel.run(shutdown_signal()).await;
    Ok(())
}

fn build_devices(config: &PanelConfig, display: DisplayKind) -> Result<Devices> {
    let width = config.trace_width;
    let mut devices = match display {
        DisplayKind::Console => Devices::new(Box::new(ConsoleDisplay::stdout(width))),
        DisplayKind::Log => Devices::new(Box::new(LogDisplay::new(width))),
        DisplayKind::Terminal => {
            let terminal = TerminalDisplay::stdout(Theme::auto_detect(), width)
                .context("Failed to open terminal display")?;
            let indicator = terminal.indicator();
            Devices::new(Box::new(terminal)).with_indicator(Box::new(indicator))
        }
    };

    let sink: Box<dyn NotificationSink> = match config.notify.pushover() {
        Some((token, user)) => Box::new(PushoverSink::builder().credentials(token, user).build()?),
        None => Box::new(LogSink),
    };
    info!(sink = sink.description(), "Notifications configured");
    devices = devices.with_sink(sink);

    if config.sensors.iter().any(|s| s.flags.log_enabled) {
        let path = config.log_path(&system::hostname());
        let log = FileLog::open(&path)
            .with_context(|| format!("Failed to open sensor log {}", path.display()))?;
        info!(path = %path.display(), "Logging readings");
        devices = devices.with_log(Box::new(log));
    }

    Ok(devices)
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
