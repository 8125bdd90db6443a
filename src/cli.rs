//! CLI parsing and orchestration. Parses args, merges the optional config
//! file, builds the client, runs the fetch pass, and maps errors to exit
//! codes.

use crate::config;
use crate::fetcher::{
    run_fetch, FetchOptions, PageClient, RetryPolicy, DEFAULT_CONTENT_MARKER,
};
use crate::parse::SerpParser;
use crate::store::{PageStore, StoreError};
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("Degraded completion: {failed} of {total} targets produced no file")]
    Degraded { failed: usize, total: usize },
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Client(_) => 2,
            CliRunError::Store(_) => 3,
            CliRunError::Degraded { .. } => 4,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "hhfetch")]
#[command(about = "Fetch hh.ru vacancy search pages and save the raw HTML")]
#[command(
    after_help = "Config file keys (out_dir, user_agent, area, role_start, role_end, per_page, delay_min_secs, delay_max_secs, connect_timeout_secs, read_timeout_secs, retry_count, content_marker) are read from ./hhfetch.toml or $XDG_CONFIG_HOME/hhfetch/config.toml. CLI flags override config."
)]
pub struct Args {
    /// Role-id range to fetch (inclusive), e.g. 1-174 or 40-40.
    #[arg(long, value_parser = parse_role_range)]
    pub roles: Option<(u32, u32)>,

    /// hh area id (1 = Moscow).
    #[arg(long)]
    pub area: Option<u32>,

    /// Output directory for raw pages. Created if absent.
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Random inter-request delay bounds in seconds, e.g. 1.5-3.5.
    #[arg(long, value_parser = parse_delay_range)]
    pub delay: Option<(f64, f64)>,

    /// Connect-phase timeout in seconds.
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Read-phase timeout in seconds.
    #[arg(long)]
    pub read_timeout: Option<u64>,

    /// Total HTTP attempts per target for transient failures.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Marker substring a genuine listing page must contain; a 200 without
    /// it is treated as a block page and skipped.
    #[arg(long)]
    pub marker: Option<String>,

    /// HTTP User-Agent (overrides config).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Vacancies requested per page.
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Log level: error, warn, info, debug, or trace. RUST_LOG wins when set.
    #[arg(long, value_parser = parse_log_level)]
    pub log_level: Option<log::LevelFilter>,

    /// Exit non-zero when at least this fraction of targets fails (0.0-1.0).
    /// Default 1.0: only a run where every target failed is degraded.
    #[arg(long, value_parser = parse_fail_threshold)]
    pub fail_threshold: Option<f64>,

    /// Suppress the progress bar (log lines only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Print verbose error chain.
    #[arg(long)]
    pub verbose: bool,

    /// List targets and their output paths without fetching anything.
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_role_range(s: &str) -> Result<(u32, u32), String> {
    let s = s.trim();
    let (from_str, to_str) = s.split_once('-').ok_or_else(|| {
        format!(
            "Invalid --roles: expected 'from-to' (e.g. 1-174), got '{}'",
            s
        )
    })?;
    let from_str = from_str.trim();
    let to_str = to_str.trim();
    let from: u32 = from_str
        .parse()
        .map_err(|_| format!("Invalid --roles: '{}' is not a valid role id", from_str))?;
    let to: u32 = to_str
        .parse()
        .map_err(|_| format!("Invalid --roles: '{}' is not a valid role id", to_str))?;
    if from == 0 {
        return Err("Invalid --roles: role ids start at 1".to_string());
    }
    if from > to {
        return Err(format!(
            "Invalid --roles: start ({}) must be <= end ({})",
            from, to
        ));
    }
    Ok((from, to))
}

fn parse_delay_range(s: &str) -> Result<(f64, f64), String> {
    let s = s.trim();
    let (min_str, max_str) = s.split_once('-').ok_or_else(|| {
        format!(
            "Invalid --delay: expected 'min-max' in seconds (e.g. 1.5-3.5), got '{}'",
            s
        )
    })?;
    let min: f64 = min_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid --delay: '{}' is not a number", min_str.trim()))?;
    let max: f64 = max_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid --delay: '{}' is not a number", max_str.trim()))?;
    if min < 0.0 {
        return Err("Invalid --delay: bounds must be non-negative".to_string());
    }
    if min > max {
        return Err(format!(
            "Invalid --delay: min ({}) must be <= max ({})",
            min, max
        ));
    }
    Ok((min, max))
}

fn parse_log_level(s: &str) -> Result<log::LevelFilter, String> {
    match s.to_lowercase().as_str() {
        "error" => Ok(log::LevelFilter::Error),
        "warn" => Ok(log::LevelFilter::Warn),
        "info" => Ok(log::LevelFilter::Info),
        "debug" => Ok(log::LevelFilter::Debug),
        "trace" => Ok(log::LevelFilter::Trace),
        _ => Err(format!(
            "Invalid --log-level value: '{}'. Use error, warn, info, debug, or trace.",
            s
        )),
    }
}

fn parse_fail_threshold(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid --fail-threshold: '{}' is not a number", s))?;
    if !(0.0..=1.0).contains(&v) {
        return Err(format!(
            "Invalid --fail-threshold: {} is outside 0.0-1.0",
            v
        ));
    }
    Ok(v)
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code
/// and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    const DEFAULT_ROLES: (u32, u32) = (1, 174);
    const DEFAULT_AREA: u32 = 1; // Moscow
    const DEFAULT_PER_PAGE: u32 = 50;
    const DEFAULT_DELAY: (f64, f64) = (1.5, 3.5);
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_READ_TIMEOUT_SECS: u64 = 20;
    const DEFAULT_OUT_DIR: &str = "data/raw_html";

    let (role_start, role_end) = match args.roles {
        Some(range) => range,
        None => {
            let start = config
                .as_ref()
                .and_then(|c| c.role_start)
                .unwrap_or(DEFAULT_ROLES.0);
            let end = config
                .as_ref()
                .and_then(|c| c.role_end)
                .unwrap_or(DEFAULT_ROLES.1);
            if start == 0 || start > end {
                return Err(CliRunError::InvalidInput(format!(
                    "Invalid role range in config: {}-{}",
                    start, end
                )));
            }
            (start, end)
        }
    };
    let area = args
        .area
        .or_else(|| config.as_ref().and_then(|c| c.area))
        .unwrap_or(DEFAULT_AREA);
    let per_page = args
        .per_page
        .or_else(|| config.as_ref().and_then(|c| c.per_page))
        .unwrap_or(DEFAULT_PER_PAGE);
    let delay_range = match args.delay {
        Some(range) => range,
        None => {
            let min = config
                .as_ref()
                .and_then(|c| c.delay_min_secs)
                .unwrap_or(DEFAULT_DELAY.0);
            let max = config
                .as_ref()
                .and_then(|c| c.delay_max_secs)
                .unwrap_or(DEFAULT_DELAY.1);
            if min < 0.0 || min > max {
                return Err(CliRunError::InvalidInput(format!(
                    "Invalid delay range in config: {}-{}",
                    min, max
                )));
            }
            (min, max)
        }
    };
    let connect_timeout_secs = args
        .connect_timeout
        .or_else(|| config.as_ref().and_then(|c| c.connect_timeout_secs))
        .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
    let read_timeout_secs = args
        .read_timeout
        .or_else(|| config.as_ref().and_then(|c| c.read_timeout_secs))
        .unwrap_or(DEFAULT_READ_TIMEOUT_SECS);
    let retries = args
        .retries
        .or_else(|| config.as_ref().and_then(|c| c.retry_count));
    let marker = args
        .marker
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.content_marker.clone()))
        .unwrap_or_else(|| DEFAULT_CONTENT_MARKER.to_string());
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.user_agent.clone()));
    let out_dir = args
        .out_dir
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.out_dir.clone()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
    let fail_threshold = args.fail_threshold.unwrap_or(1.0);

    if args.dry_run {
        for id in role_start..=role_end {
            let target = crate::model::FetchTarget { id, area, per_page };
            println!("{}", target.file_path(&out_dir).display());
        }
        eprintln!("Targets: {}", role_end - role_start + 1);
        return Ok(());
    }

    let mut policy = RetryPolicy::default();
    if let Some(n) = retries {
        policy = policy.with_max_attempts(n);
    }
    let mut builder = PageClient::builder()
        .connect_timeout_secs(connect_timeout_secs)
        .read_timeout_secs(read_timeout_secs)
        .policy(policy);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    let mut client = builder.build()?;

    let store = PageStore::open(&out_dir)?;

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |n: u32, total: u32| {
        if total == 0 {
            return;
        }
        let mut state = progress_state.borrow_mut();
        let pb = state.get_or_insert_with(|| {
            let bar = indicatif::ProgressBar::new(total as u64);
            bar.set_style(
                indicatif::ProgressStyle::default_bar()
                    .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
                    .unwrap()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                    .progress_chars("█▉▊▋▌▍▎▏ "),
            );
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        pb.set_position(n as u64);
        pb.set_message(format!("Fetching role {}/{}", n, total));
    };
    let progress: Option<&dyn Fn(u32, u32)> = if args.quiet { None } else { Some(&progress_cb) };

    let parser = SerpParser;
    let options = FetchOptions {
        start: role_start,
        end: role_end,
        area,
        per_page,
        delay_range,
        marker: &marker,
        parser: Some(&parser),
        progress,
    };
    let summary = run_fetch(&mut client, &store, &options);

    if let Some(pb) = progress_state.borrow_mut().take() {
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }

    log::info!(
        "done: {} saved, {} rejected, {} errored ({} targets)",
        summary.saved,
        summary.rejected,
        summary.errored,
        summary.total()
    );

    let failed = summary.rejected + summary.errored;
    if summary.total() > 0 && failed > 0 && summary.failure_ratio() >= fail_threshold {
        return Err(CliRunError::Degraded {
            failed,
            total: summary.total(),
        });
    }
    Ok(())
}
