//! Terminal configuration loaded from environment variables.

use chrono::{FixedOffset, Offset, Utc};
use domain::{DEFAULT_CONFLICT_RETRIES, DEFAULT_COUNTER_ATTEMPTS, OrderService};
use order_store::OrderStore;

/// What a terminal is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalRole {
    #[default]
    OrderEntry,
    Kitchen,
    Bar,
}

impl TerminalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalRole::OrderEntry => "order-entry",
            TerminalRole::Kitchen => "kitchen",
            TerminalRole::Bar => "bar",
        }
    }
}

impl std::fmt::Display for TerminalRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TerminalRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "order-entry" | "order_entry" | "pos" => Ok(TerminalRole::OrderEntry),
            "kitchen" => Ok(TerminalRole::Kitchen),
            "bar" | "serving" => Ok(TerminalRole::Bar),
            other => Err(format!("unknown terminal role: {other}")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Terminal configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `TERMINAL_ID`: name used in logs (default: `"terminal-1"`)
/// - `TERMINAL_ROLE`: `order-entry`, `kitchen` or `bar` (default: `order-entry`)
/// - `KITCHEN_CATEGORIES`: comma-separated menu categories a kitchen
///   terminal prepares (default: all)
/// - `BUSINESS_UTC_OFFSET_MINUTES`: offset defining the business day
///   for order numbers and tokens (default: `0`)
/// - `CONFLICT_RETRIES`: re-runs of a command after a write conflict (default: `3`)
/// - `COUNTER_RETRIES`: attempts per daily counter increment (default: `8`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
///
/// Unparseable values fall back to the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    pub terminal_id: String,
    pub role: TerminalRole,
    pub kitchen_categories: Vec<String>,
    pub utc_offset_minutes: i32,
    pub conflict_retries: u32,
    pub counter_retries: u32,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl TerminalConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|v| v.trim().parse().ok())
        }

        Self {
            terminal_id: lookup("TERMINAL_ID")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.terminal_id),
            role: parsed(&lookup, "TERMINAL_ROLE").unwrap_or(defaults.role),
            kitchen_categories: lookup("KITCHEN_CATEGORIES")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.kitchen_categories),
            utc_offset_minutes: parsed(&lookup, "BUSINESS_UTC_OFFSET_MINUTES")
                .unwrap_or(defaults.utc_offset_minutes),
            conflict_retries: parsed(&lookup, "CONFLICT_RETRIES").unwrap_or(defaults.conflict_retries),
            counter_retries: parsed(&lookup, "COUNTER_RETRIES").unwrap_or(defaults.counter_retries),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parsed(&lookup, "LOG_FORMAT").unwrap_or(defaults.log_format),
        }
    }

    /// Returns the business-day offset, or UTC when out of range.
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Applies numbering and retry settings to an order service.
    pub fn configure<S: OrderStore + Clone>(&self, service: OrderService<S>) -> OrderService<S> {
        service
            .with_utc_offset(self.utc_offset())
            .with_conflict_retries(self.conflict_retries)
            .with_counter_attempts(self.counter_retries)
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            terminal_id: "terminal-1".to_string(),
            role: TerminalRole::OrderEntry,
            kitchen_categories: Vec::new(),
            utc_offset_minutes: 0,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
            counter_retries: DEFAULT_COUNTER_ATTEMPTS,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
