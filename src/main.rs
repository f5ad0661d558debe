use anyhow::Result;
use clap::{Parser, Subcommand};
use emberd::config::WatcherConfig;
use emberd::connectivity::ConnectivityProber;
use emberd::display::{env::DisplayEnv, DisplaySupervisor};
use emberd::policy::Policy;
use emberd::reconcile::Reconciler;
use emberd::watcher::Watcher;
use emberd::{backoff, doctor};
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "emberd",
    about = "Ember Kiosk — fireplace display watcher daemon",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Data directory holding the state/policy documents and browser profile
    #[arg(long, env = "EMBERD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Path of the persisted kiosk state document
    #[arg(long, env = "EMBERD_STATE_FILE")]
    state_file: Option<std::path::PathBuf>,

    /// Path of the policy document
    #[arg(long, env = "EMBERD_POLICY_FILE")]
    policy_file: Option<std::path::PathBuf>,

    /// URL of the offline player page
    #[arg(long, env = "EMBERD_OFFLINE_URL")]
    offline_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "EMBERD_LOG")]
    log: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "EMBERD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the watcher loop (default when no subcommand given).
    ///
    /// Keeps the kiosk browser pointed at the reconciled target until a
    /// termination signal arrives.
    ///
    /// Examples:
    ///   emberd serve
    ///   emberd
    Serve,
    /// Run a single connectivity check against the policy endpoints.
    ///
    /// Prints the verdict. Exit code 0 when online, 1 when offline.
    ///
    /// Examples:
    ///   emberd check
    Check,
    /// Run diagnostic checks on watcher prerequisites.
    ///
    /// Checks browser binary availability, the input automation tool, the
    /// display environment, and the state/policy documents.
    ///
    /// Exit code 0 if all checks pass, 1 if any check fails.
    ///
    /// Examples:
    ///   emberd doctor
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Init once — must happen before any tracing calls.
    let log_level = args.log.as_deref().unwrap_or("info").to_owned();
    let log_format = std::env::var("EMBERD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let _file_guard = setup_logging(&log_level, args.log_file.as_deref(), &log_format);

    let cfg = WatcherConfig::new(
        args.data_dir,
        args.state_file,
        args.policy_file,
        args.offline_url,
        args.log,
    );

    match args.command {
        Some(Command::Doctor) => {
            let results = doctor::run_doctor(&cfg);
            doctor::print_doctor_results(&results);
            let failed = results.iter().filter(|r| !r.passed).count();
            std::process::exit(if failed == 0 { 0 } else { 1 });
        }
        Some(Command::Check) => {
            let policy = Policy::load(&cfg.policy_file);
            let mut prober = ConnectivityProber::new(policy.network);
            let online = prober.check().await;
            println!("{}", if online { "online" } else { "offline" });
            std::process::exit(if online { 0 } else { 1 });
        }
        None | Some(Command::Serve) => run_watcher(cfg).await,
    }
}

async fn run_watcher(cfg: WatcherConfig) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "emberd starting");
    info!(
        state_file = %cfg.state_file.display(),
        policy_file = %cfg.policy_file.display(),
        offline_url = %cfg.offline_url,
        "config loaded"
    );

    // An unreadable policy must not stop the kiosk: load() falls back to
    // built-in defaults and the display still reaches the offline player.
    let policy = Policy::load(&cfg.policy_file);

    let display_env = DisplayEnv::resolve();
    info!(
        display = %display_env.display,
        xauthority = ?display_env.xauthority,
        "display environment resolved"
    );

    let prober = ConnectivityProber::new(policy.network.clone());
    let supervisor = DisplaySupervisor::new(cfg.display.clone(), display_env);
    let reconciler = Reconciler::new(cfg.offline_url.clone(), policy.youtube.clone());

    let watcher = Watcher::new(
        cfg.state_file.clone(),
        reconciler,
        prober,
        supervisor,
        Duration::from_secs(policy.network.check_interval),
        backoff::BackoffConfig::default(),
    );

    watcher.run().await
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("emberd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}
