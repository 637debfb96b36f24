//! ghostpane - diagnostic front end for the embedded terminal engine
//!
//! Loads the configuration, brings the engine up and reports whether it is
//! usable. Surfaces need a real host view to render into, so this binary
//! never creates one; embedding applications do that through the library.
//!
//! ```text
//! ghostpane                      # bring up, print settings and readiness
//! ghostpane --check              # bring up, exit status only
//! ghostpane --config ./dev.toml  # use another config file
//! ```

use std::env;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ghostpane::config::Config;
use ghostpane::engine::{
    main_queue, EngineHandle, EngineSettings, HostServices, MainQueueReceiver, NativeEngine,
    Readiness,
};
use ghostpane::host::SystemPasteboard;

/// Command-line options
#[derive(Debug, Default)]
struct Options {
    /// Config file to use instead of `~/.ghostpane/config.toml`
    config_path: Option<PathBuf>,
    /// Report readiness through the exit status only
    check: bool,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("ghostpane {}", VERSION);
}

fn print_help() {
    eprintln!("ghostpane {} - embedded terminal engine host", VERSION);
    eprintln!();
    eprintln!("Usage: ghostpane [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <PATH>       Read configuration from PATH");
    eprintln!("  --check               Bring the engine up quietly; exit status tells readiness");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Configuration: ~/.ghostpane/config.toml");
    eprintln!("Log file:      ~/.ghostpane/ghostpane.log (RUST_LOG overrides log_level)");
    if cfg!(not(feature = "ghostty")) {
        eprintln!();
        eprintln!("Built without libghostty: the engine always reports an error.");
    }
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config path".to_string());
                }
                options.config_path = Some(PathBuf::from(&args[i]));
            }
            "--check" => {
                options.check = true;
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

fn init_logging(level: &str) {
    let Some(log_path) = Config::log_path() else {
        return;
    };
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    // Open log file (append mode)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

#[cfg(feature = "ghostty")]
fn native_engine() -> Rc<dyn NativeEngine> {
    Rc::new(ghostpane::engine::ghostty::GhosttyLib)
}

#[cfg(not(feature = "ghostty"))]
fn native_engine() -> Rc<dyn NativeEngine> {
    Rc::new(ghostpane::engine::UnavailableEngine)
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let config = match &options.config_path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load(),
    };

    init_logging(&config.log_level);
    info!("ghostpane {} starting...", VERSION);

    let (engine, receiver) = bring_up(native_engine(), &config, args);
    // Wakeups queued during bring-up
    receiver.drain(&engine);

    let readiness = engine.readiness();
    if !options.check {
        let settings = engine.settings();
        eprintln!("config:  {}", config_location(&options));
        eprintln!("font:    {}pt", settings.default_font_size);
        eprintln!("title:   {}", settings.default_title);
        eprintln!("engine:  {:?}", readiness);
    }
    if readiness != Readiness::Ready {
        anyhow::bail!("engine unavailable; see {}", log_location());
    }

    info!("ghostpane exiting");
    Ok(())
}

/// Create the engine handle and run its one-time initialization
fn bring_up(
    native: Rc<dyn NativeEngine>,
    config: &Config,
    args: Vec<String>,
) -> (EngineHandle, MainQueueReceiver) {
    let (queue, receiver) = main_queue();
    let host = HostServices {
        dispatcher: Arc::new(queue),
        pasteboard: Rc::new(SystemPasteboard),
        app_active: true,
    };
    let settings = EngineSettings::from_config(config).with_args(args);
    let engine = EngineHandle::new(native, host, settings);
    engine.initialize();
    (engine, receiver)
}

fn config_location(options: &Options) -> String {
    options
        .config_path
        .clone()
        .or_else(Config::config_path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string())
}

fn log_location() -> String {
    Config::log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "the log".to_string())
}
