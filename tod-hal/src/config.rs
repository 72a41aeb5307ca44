//! Process environment: log level, signal configuration, thread count and
//! accelerator policy.
//!
//! An [`Environment`] is assembled once at startup by an
//! [`EnvironmentBuilder`] and threaded through context construction.
//! Precedence for every setting: explicit builder override, then the
//! corresponding environment variable, then the default.
//!
//! | Variable            | Meaning                                                   | Default              |
//! |---------------------|-----------------------------------------------------------|----------------------|
//! | `TOD_LOGLEVEL`      | `VERBOSE`, `DEBUG`, `INFO`, `WARNING`, `ERROR`, `CRITICAL` | `INFO`               |
//! | `TOD_SIGNALS`       | `ALL` or a comma-separated list of signal names           | none enabled         |
//! | `TOD_NUM_THREADS`   | positive worker thread count                              | available parallelism|
//! | `TOD_ACCEL_DISABLE` | any value disables accelerator use                        | unset                |

use std::{fmt::Display, str::FromStr};

use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

pub const ENV_LOGLEVEL: &str = "TOD_LOGLEVEL";
pub const ENV_SIGNALS: &str = "TOD_SIGNALS";
pub const ENV_NUM_THREADS: &str = "TOD_NUM_THREADS";
pub const ENV_ACCEL_DISABLE: &str = "TOD_ACCEL_DISABLE";

/// Signals that may be enabled for trapping. `SIGKILL` is never trappable.
pub const SIGNALS: [&str; 19] = [
    "SIGHUP", "SIGINT", "SIGQUIT", "SIGILL", "SIGTRAP", "SIGABRT", "SIGEMT", "SIGFPE", "SIGBUS", "SIGSEGV", "SIGSYS", "SIGPIPE",
    "SIGALRM", "SIGTERM", "SIGURG", "SIGTSTP", "SIGXCPU", "SIGXFSZ", "SIGVTALRM",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Verbose,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Verbose => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VERBOSE" => Ok(LogLevel::Verbose),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(Error::InvalidLogLevel(s.to_string())),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &str = match self {
            LogLevel::Verbose => "VERBOSE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        };
        write!(f, "{s}")
    }
}

/// Parses a signal specification: `ALL`, or a comma-separated list of
/// names from [`SIGNALS`]. Names are case-insensitive; whitespace around
/// names and empty items are ignored; duplicates collapse.
pub fn parse_signal_list(value: &str) -> Result<Vec<&'static str>> {
    if value.trim().eq_ignore_ascii_case("ALL") {
        return Ok(SIGNALS.to_vec());
    }
    let mut enabled: Vec<&'static str> = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let name: &'static str = SIGNALS
            .iter()
            .copied()
            .find(|sig| sig.eq_ignore_ascii_case(item))
            .ok_or_else(|| Error::UnknownSignal(item.to_string()))?;
        if !enabled.contains(&name) {
            enabled.push(name);
        }
    }
    Ok(enabled)
}

fn parse_threads(s: &str) -> Result<usize> {
    match s.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidThreadCount(s.to_string())),
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    log_level: LogLevel,
    signals_enabled: Vec<&'static str>,
    max_threads: usize,
    accel_disabled: bool,
    node_rank: usize,
    node_procs: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            signals_enabled: Vec::new(),
            max_threads: default_threads(),
            accel_disabled: false,
            node_rank: 0,
            node_procs: 1,
        }
    }
}

impl Environment {
    /// Reads the process environment with no explicit overrides.
    pub fn from_env() -> Result<Self> {
        EnvironmentBuilder::new().build()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// All signal names that can be configured.
    pub fn signals(&self) -> &'static [&'static str] {
        &SIGNALS
    }

    pub fn signal_enabled(&self, name: &str) -> bool {
        self.signals_enabled.iter().any(|s| s.eq_ignore_ascii_case(name))
    }

    pub fn enabled_signals(&self) -> &[&'static str] {
        &self.signals_enabled
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    pub fn accel_disabled(&self) -> bool {
        self.accel_disabled
    }

    pub fn node_rank(&self) -> usize {
        self.node_rank
    }

    pub fn node_procs(&self) -> usize {
        self.node_procs
    }

    /// Installs a global `tracing` subscriber filtered at [`Environment::log_level`],
    /// unless `RUST_LOG` provides a filter. Does nothing if a subscriber is
    /// already installed.
    pub fn init_logging(&self) {
        let filter: EnvFilter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.log_level.level_filter().to_string()));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    }

    /// Emits the configuration report at `info` level.
    pub fn log_summary(&self) {
        info!(log_level = %self.log_level, "environment");
        for sig in SIGNALS {
            info!(signal = sig, enabled = self.signal_enabled(sig), "signal handling");
        }
        info!(
            max_threads = self.max_threads,
            accel_disabled = self.accel_disabled,
            node_rank = self.node_rank,
            node_procs = self.node_procs,
            "execution"
        );
    }
}

/// Builds an [`Environment`]; see the module documentation for precedence.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentBuilder {
    log_level: Option<LogLevel>,
    signals: Option<String>,
    max_threads: Option<usize>,
    accel_disabled: Option<bool>,
    node: Option<(usize, usize)>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Signal specification, same syntax as `TOD_SIGNALS`.
    pub fn signals(mut self, value: impl Into<String>) -> Self {
        self.signals = Some(value.into());
        self
    }

    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = Some(n.max(1));
        self
    }

    pub fn accel_disabled(mut self, disabled: bool) -> Self {
        self.accel_disabled = Some(disabled);
        self
    }

    /// Rank of this process among the `procs` processes sharing the node's
    /// devices. Used to spread processes across devices.
    pub fn node(mut self, rank: usize, procs: usize) -> Self {
        self.node = Some((rank, procs.max(1)));
        self
    }

    /// Builds from the process environment.
    pub fn build(self) -> Result<Environment> {
        self.build_with(|name| std::env::var(name).ok())
    }

    /// Builds using `lookup` in place of the process environment.
    pub fn build_with<F>(self, lookup: F) -> Result<Environment>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level: LogLevel = match self.log_level {
            Some(level) => level,
            None => lookup(ENV_LOGLEVEL)
                .map(|s| s.parse::<LogLevel>())
                .transpose()?
                .unwrap_or(LogLevel::Info),
        };

        let signals_enabled: Vec<&'static str> = match self.signals.or_else(|| lookup(ENV_SIGNALS)) {
            Some(value) => parse_signal_list(&value)?,
            None => Vec::new(),
        };

        let max_threads: usize = match self.max_threads {
            Some(n) => n,
            None => lookup(ENV_NUM_THREADS)
                .map(|s| parse_threads(&s))
                .transpose()?
                .unwrap_or_else(default_threads),
        };

        let accel_disabled: bool = self
            .accel_disabled
            .unwrap_or_else(|| lookup(ENV_ACCEL_DISABLE).is_some());

        let (node_rank, node_procs) = self.node.unwrap_or((0, 1));

        Ok(Environment {
            log_level,
            signals_enabled,
            max_threads,
            accel_disabled,
            node_rank,
            node_procs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults() {
        let env: Environment = EnvironmentBuilder::new().build_with(|_| None).unwrap();
        assert_eq!(env.log_level(), LogLevel::Info);
        assert!(env.enabled_signals().is_empty());
        assert!(env.max_threads() >= 1);
        assert!(!env.accel_disabled());
        assert_eq!((env.node_rank(), env.node_procs()), (0, 1));
    }

    #[test]
    fn env_vars_applied() {
        let env: Environment = EnvironmentBuilder::new()
            .build_with(vars(&[
                (ENV_LOGLEVEL, "debug"),
                (ENV_SIGNALS, "SIGINT, sigterm"),
                (ENV_NUM_THREADS, "3"),
                (ENV_ACCEL_DISABLE, "1"),
            ]))
            .unwrap();
        assert_eq!(env.log_level(), LogLevel::Debug);
        assert_eq!(env.enabled_signals(), &["SIGINT", "SIGTERM"]);
        assert!(env.signal_enabled("SIGTERM"));
        assert!(!env.signal_enabled("SIGHUP"));
        assert_eq!(env.max_threads(), 3);
        assert!(env.accel_disabled());
    }

    #[test]
    fn overrides_beat_env_vars() {
        let env: Environment = EnvironmentBuilder::new()
            .log_level(LogLevel::Error)
            .signals("")
            .max_threads(2)
            .accel_disabled(false)
            .build_with(vars(&[
                (ENV_LOGLEVEL, "DEBUG"),
                (ENV_SIGNALS, "ALL"),
                (ENV_NUM_THREADS, "8"),
                (ENV_ACCEL_DISABLE, "yes"),
            ]))
            .unwrap();
        assert_eq!(env.log_level(), LogLevel::Error);
        assert!(env.enabled_signals().is_empty());
        assert_eq!(env.max_threads(), 2);
        assert!(!env.accel_disabled());
    }

    #[test]
    fn signal_list_parsing() {
        assert_eq!(parse_signal_list("ALL").unwrap().len(), SIGNALS.len());
        assert_eq!(parse_signal_list(" all ").unwrap().len(), SIGNALS.len());
        assert_eq!(parse_signal_list("SIGSEGV,,SIGSEGV, ").unwrap(), vec!["SIGSEGV"]);
        assert_eq!(parse_signal_list("").unwrap(), Vec::<&str>::new());
        assert_eq!(
            parse_signal_list("SIGINT,SIGKILL"),
            Err(Error::UnknownSignal("SIGKILL".to_string()))
        );
    }

    #[test]
    fn invalid_values_rejected() {
        assert_eq!(
            EnvironmentBuilder::new().build_with(vars(&[(ENV_LOGLEVEL, "LOUD")])),
            Err(Error::InvalidLogLevel("LOUD".to_string()))
        );
        assert_eq!(
            EnvironmentBuilder::new().build_with(vars(&[(ENV_NUM_THREADS, "0")])),
            Err(Error::InvalidThreadCount("0".to_string()))
        );
    }

    #[test]
    fn log_levels_map_to_filters() {
        assert_eq!(LogLevel::Verbose.level_filter(), LevelFilter::TRACE);
        assert_eq!(LogLevel::Warning.level_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Critical.level_filter(), LevelFilter::ERROR);
        assert_eq!("critical".parse::<LogLevel>().unwrap(), LogLevel::Critical);
    }
}
