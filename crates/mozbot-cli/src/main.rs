//! mozbot CLI: Run and configure the mozbot chat widget

use clap::{Parser, Subcommand};
use mozbot_engine::{classify, Session, SettingsError, SiteSettings, SubmitOutcome, WidgetConfig};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Demo chat widget with canned replies
#[derive(Parser)]
#[command(name = "mozbot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the widget in the terminal (default when no command specified)
    Tui {
        /// Settings file (default: .mozbot/settings.json if present)
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Chat line by line on stdin/stdout
    Chat {
        /// Settings file (default: .mozbot/settings.json if present)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Override the simulated thinking delay in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Print the canned reply for a message
    Ask {
        /// Message text
        text: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create .mozbot/settings.json with default values
    Init,

    /// Validate a settings file
    Check {
        /// Settings file (default: .mozbot/settings.json)
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

const MOZBOT_DIR: &str = ".mozbot";
const SETTINGS_FILE: &str = "settings.json";

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        None => cmd_tui(None),
        Some(Commands::Tui { settings }) => cmd_tui(settings.as_deref()),
        Some(Commands::Chat { settings, delay_ms }) => cmd_chat(settings.as_deref(), delay_ms),
        Some(Commands::Ask { text, json }) => cmd_ask(&text, json),
        Some(Commands::Init) => cmd_init(),
        Some(Commands::Check { settings, json }) => cmd_check(settings.as_deref(), json),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn default_settings_path() -> PathBuf {
    Path::new(MOZBOT_DIR).join(SETTINGS_FILE)
}

/// Resolve the widget configuration.
///
/// An explicit settings path must exist. Without one, the default settings
/// file is used if present, otherwise built-in defaults.
fn load_widget_config(settings: Option<&Path>) -> Result<WidgetConfig, SettingsError> {
    let path = match settings {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_settings_path();
            if !path.exists() {
                tracing::debug!("no settings file, using defaults");
                return Ok(WidgetConfig::default());
            }
            path
        }
    };
    tracing::debug!(path = %path.display(), "loading settings");
    SiteSettings::load(&path)?.sanitize().widget_config()
}

fn config_or_exit(settings: Option<&Path>) -> WidgetConfig {
    match load_widget_config(settings) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading settings: {e}");
            std::process::exit(1);
        }
    }
}

fn session_or_exit(config: WidgetConfig) -> Session {
    match Session::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_tui(settings: Option<&Path>) {
    let config = config_or_exit(settings);
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async {
        let session = session_or_exit(config);
        mozbot_tui::run_tui(session).await
    });
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_chat(settings: Option<&Path>, delay_ms: Option<u64>) {
    let mut config = config_or_exit(settings);
    if let Some(delay_ms) = delay_ms {
        config.reply_delay_ms = delay_ms;
    }

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    if let Err(e) = rt.block_on(run_chat(config)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_chat(config: WidgetConfig) -> std::io::Result<()> {
    let session = session_or_exit(config);
    let bot_name = session.config().bot_name.clone();
    session.open();

    for message in session.messages() {
        println!("{bot_name}: {}", message.text);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match session.send_message(&line) {
            SubmitOutcome::Accepted(pending) => {
                println!("you: {}", pending.user_message().text);
                match pending.wait().await {
                    Some(reply) => println!("{bot_name}: {}", reply.text),
                    None => eprintln!("Reply failed"),
                }
            }
            // Each reply is awaited before the next line is read, so Busy
            // cannot happen here.
            SubmitOutcome::Empty | SubmitOutcome::Busy => {}
        }
    }

    session.close();
    Ok(())
}

fn cmd_ask(text: &str, json: bool) {
    let kind = classify(text);

    if json {
        let output = serde_json::json!({
            "kind": kind,
            "reply": kind.text(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).expect("failed to serialize")
        );
        return;
    }

    println!("{}", kind.text());
}

fn cmd_init() {
    let path = default_settings_path();
    if path.exists() {
        println!("Settings already exist at {}", path.display());
        return;
    }

    match SiteSettings::default().save(&path) {
        Ok(()) => println!("Created {}", path.display()),
        Err(e) => {
            eprintln!("Failed to write settings: {e}");
            std::process::exit(1);
        }
    }

    println!("\nInitialization complete!");
    println!(
        "Set \"bot_id\" and \"enabled\" in {} to turn the widget on",
        path.display()
    );
}

/// Outcome of checking a settings file.
struct CheckReport {
    settings: SiteSettings,
    widget: Option<WidgetConfig>,
    errors: Vec<String>,
}

fn check_settings(path: &Path) -> Result<CheckReport, SettingsError> {
    let settings = SiteSettings::load(path)?.sanitize();
    let mut errors = Vec::new();

    if let Err(e) = settings.validate() {
        errors.push(e.to_string());
    }
    let widget = match settings.widget_config() {
        Ok(config) => Some(config),
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    };

    Ok(CheckReport {
        settings,
        widget,
        errors,
    })
}

fn cmd_check(settings: Option<&Path>, json: bool) {
    let path = settings.map_or_else(default_settings_path, Path::to_path_buf);

    let report = match check_settings(&path) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            std::process::exit(1);
        }
    };
    let valid = report.errors.is_empty();

    if json {
        let output = serde_json::json!({
            "valid": valid,
            "errors": report.errors,
            "settings": report.settings,
            "widget": report.widget,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).expect("failed to serialize")
        );
    } else {
        println!("Settings: {}\n", path.display());
        let s = &report.settings;
        println!("  Enabled: {}", s.enabled);
        println!(
            "  Bot ID: {}",
            if s.bot_id.is_empty() { "(none)" } else { &s.bot_id }
        );
        println!("  Bot name: {}", s.bot_name);
        println!("  Color: {}", s.primary_color);
        println!("  Position: {}", s.position);
        println!("  Pages: {}", s.show_on_pages.join(", "));
        println!();
        if valid {
            println!("Settings OK");
        } else {
            for error in &report.errors {
                println!("  Error: {error}");
            }
        }
    }

    if !valid {
        std::process::exit(1);
    }
}
