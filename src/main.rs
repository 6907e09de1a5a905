use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use opora_checker::config::Config;
use opora_checker::mailer::SmtpMailer;
use opora_checker::monitor::{Monitor, RunMode};
use opora_checker::scrapers::ChromeSession;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{error, info, warn, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "opora-checker",
    version,
    about = "Check availability for Opora Country Living"
)]
struct Cli {
    /// Check-in date (YYYY-MM-DD) [default: 2025-09-30]
    #[arg(long)]
    checkin: Option<NaiveDate>,

    /// Number of nights [default: 2]
    #[arg(long)]
    nights: Option<u32>,

    /// Number of adults [default: 2]
    #[arg(long)]
    adults: Option<u32>,

    /// Number of rooms [default: 1]
    #[arg(long)]
    rooms: Option<u32>,

    /// Currency [default: ILS]
    #[arg(long)]
    currency: Option<String>,

    /// Maximum price [default: 1500]
    #[arg(long, alias = "max_price")]
    max_price: Option<f64>,

    /// Run in loop mode (check every interval)
    #[arg(long = "loop")]
    run_loop: bool,

    /// Seconds between checks in loop mode
    #[arg(long)]
    interval: Option<u64>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// .env file holding EMAIL_USER / EMAIL_PASSWORD / EMAIL_RECIPIENTS
    #[arg(long, env = "OPORA_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Email template
    #[arg(long)]
    template: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, env = "OPORA_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    show_browser: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool, log_file: Option<&PathBuf>) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_file(true).with_line_number(true))
        .with(file_layer)
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file: {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let mut config = Config::load(cli.config.as_deref())?.with_env();

    let search = &mut config.search;
    if let Some(checkin) = cli.checkin {
        search.checkin = checkin;
    }
    if let Some(nights) = cli.nights {
        search.nights = nights;
    }
    if let Some(adults) = cli.adults {
        search.adults = adults;
    }
    if let Some(rooms) = cli.rooms {
        search.rooms = rooms;
    }
    if let Some(currency) = &cli.currency {
        search.currency = currency.clone();
    }
    if let Some(max_price) = cli.max_price {
        search.max_price = max_price;
    }

    if let Some(interval) = cli.interval {
        config.interval_secs = interval;
    }
    if let Some(template) = &cli.template {
        config.template_path = template.clone();
    }
    if let Some(log_file) = &cli.log_file {
        config.log_file = Some(log_file.clone());
    }
    if cli.show_browser {
        config.browser.headless = false;
    }

    Ok(config)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    init_logging(cli.verbose, config.log_file.as_ref())?;

    info!("🏨 Opora Country Living availability checker");
    match &config.source {
        Some(path) => info!("Config: {}", path.display()),
        None => info!("Config: defaults"),
    }
    info!("Target: {}", config.target_url());
    if !config.template_path.exists() {
        warn!("Email template {} does not exist yet", config.template_path.display());
    }

    let session = match ChromeSession::launch(&config.browser) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to start browser: {:#}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    let mailer = SmtpMailer::new(config.email.clone());
    let monitor = Monitor::new(session, mailer, &config);

    let mode = if cli.run_loop { RunMode::Loop } else { RunMode::Once };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    // The monitor logs its own failure.
    match monitor.run(mode, shutdown).await {
        Ok(Some(rooms)) => println!("{}", serde_json::to_string_pretty(&rooms)?),
        Ok(None) => {}
        Err(_) => return Ok(ExitCode::FAILURE),
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // Config and logging setup fail before any subscriber exists.
            eprintln!("opora-checker: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[search]
checkin = "2025-12-24"
nights = 3
currency = "EUR"
max_price = 900.0
"#
        )
        .unwrap();
        file
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("opora-checker").chain(args.iter().copied()))
    }

    #[test]
    fn test_toml_search_survives_without_flags() {
        let file = config_file();
        let path = file.path().to_str().unwrap();

        let config = load_config(&cli(&["--config", path])).unwrap();
        assert_eq!(
            config.search.checkin,
            NaiveDate::from_ymd_opt(2025, 12, 24).unwrap()
        );
        assert_eq!(config.search.nights, 3);
        assert_eq!(config.search.currency, "EUR");
        assert_eq!(config.search.max_price, 900.0);
        // Absent from the file, so the built-in defaults apply.
        assert_eq!(config.search.adults, 2);
        assert_eq!(config.search.rooms, 1);
    }

    #[test]
    fn test_flags_override_toml_search() {
        let file = config_file();
        let path = file.path().to_str().unwrap();

        let config = load_config(&cli(&[
            "--config",
            path,
            "--nights",
            "5",
            "--max_price",
            "1200",
        ]))
        .unwrap();
        assert_eq!(config.search.nights, 5);
        assert_eq!(config.search.max_price, 1200.0);
        assert_eq!(config.search.currency, "EUR");
    }

    #[test]
    fn test_config_source_is_recorded() {
        let file = config_file();
        let path = file.path().to_str().unwrap();

        let config = load_config(&cli(&["--config", path])).unwrap();
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }
}
