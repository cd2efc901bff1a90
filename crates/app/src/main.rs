use std::path::PathBuf;
use std::time::Duration;

use services::{
    AppServices, AppServicesError, Catalog, CatalogError, Clock, SessionConfig, SessionError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod repl;

#[derive(Debug, Error)]
enum ArgsError {
    #[error("{flag} requires a value")]
    MissingValue { flag: &'static str },
    #[error("unknown argument: {0}")]
    UnknownArg(String),
    #[error("invalid --db value: {raw}")]
    InvalidDbUrl { raw: String },
    #[error("invalid --reveal-delay-ms value: {raw}")]
    InvalidDelay { raw: String },
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Args(#[from] ArgsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Services(#[from] AppServicesError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  kioku [--db <sqlite_url>] [--data <dir>] [--reveal-delay-ms <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://kioku.sqlite3");
    eprintln!("  --data data");
    eprintln!("  --reveal-delay-ms 600");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  KIOKU_DB_URL, KIOKU_DATA_DIR, KIOKU_REVEAL_DELAY_MS, RUST_LOG");
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    db_url: String,
    data_dir: PathBuf,
    reveal_delay: Duration,
    help: bool,
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("KIOKU_DB_URL")
            .map_or_else(|| "sqlite://kioku.sqlite3".into(), normalize_sqlite_url);
        let mut data_dir =
            env("KIOKU_DATA_DIR").map_or_else(|| PathBuf::from("data"), PathBuf::from);
        let mut reveal_delay = match env("KIOKU_REVEAL_DELAY_MS") {
            Some(raw) => parse_delay(raw)?,
            None => services::session::DEFAULT_REVEAL_DELAY,
        };
        let mut help = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--data" => data_dir = PathBuf::from(require_value(args, "--data")?),
                "--reveal-delay-ms" => {
                    reveal_delay = parse_delay(require_value(args, "--reveal-delay-ms")?)?;
                }
                "--help" | "-h" => help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            data_dir,
            reveal_delay,
            help,
        })
    }
}

fn parse_delay(raw: String) -> Result<Duration, ArgsError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ArgsError::InvalidDelay { raw })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), AppError> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run() -> Result<(), AppError> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv, |key| std::env::var(key).ok())
        .inspect_err(|_| print_usage())?;
    if args.help {
        print_usage();
        return Ok(());
    }

    let catalog = Catalog::load_dir(&args.data_dir)?;
    info!(
        subjects = catalog.len(),
        data_dir = %args.data_dir.display(),
        "catalog loaded"
    );

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let config = SessionConfig::default().with_reveal_delay(args.reveal_delay);
    let services =
        AppServices::new_sqlite(&args.db_url, catalog, Clock::default_clock(), config).await?;

    repl::run(&services).await
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
