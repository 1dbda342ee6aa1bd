//! Environment-driven configuration.

use thiserror::Error;

use library_application::{GetAuthors, GetBooks};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be true or false, got '{value}'")]
    InvalidFlag { var: &'static str, value: String },

    #[error("LIBRARY_DEFAULT_PAGE_SIZE ({default}) exceeds LIBRARY_MAX_PAGE_SIZE ({max})")]
    PageSizeBounds { default: u32, max: u32 },
}

/// Runtime settings for the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Postgres connection string; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Actor written into audit stamps.
    pub audit_actor: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Insert the sample author into an empty catalog at startup.
    pub seed_sample_data: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            audit_actor: "system".to_string(),
            default_page_size: 50,
            max_page_size: 500,
            log_filter: "info".to_string(),
            seed_sample_data: true,
        }
    }
}

impl LibraryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            database_url: get("DATABASE_URL"),
            audit_actor: get("LIBRARY_AUDIT_ACTOR").unwrap_or(defaults.audit_actor),
            default_page_size: match get("LIBRARY_DEFAULT_PAGE_SIZE") {
                Some(v) => parse_positive("LIBRARY_DEFAULT_PAGE_SIZE", &v)?,
                None => defaults.default_page_size,
            },
            max_page_size: match get("LIBRARY_MAX_PAGE_SIZE") {
                Some(v) => parse_positive("LIBRARY_MAX_PAGE_SIZE", &v)?,
                None => defaults.max_page_size,
            },
            log_filter: get("LIBRARY_LOG").unwrap_or(defaults.log_filter),
            seed_sample_data: match get("LIBRARY_SEED") {
                Some(v) => parse_flag("LIBRARY_SEED", &v)?,
                None => defaults.seed_sample_data,
            },
        };

        if config.default_page_size > config.max_page_size {
            return Err(ConfigError::PageSizeBounds {
                default: config.default_page_size,
                max: config.max_page_size,
            });
        }
        Ok(config)
    }

    /// First page of authors at the configured default size.
    pub fn first_authors_page(&self) -> GetAuthors {
        GetAuthors::page(1, self.default_page_size)
    }

    /// First page of books at the configured default size.
    pub fn first_books_page(&self) -> GetBooks {
        GetBooks::page(1, self.default_page_size)
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: value.to_string(),
        }),
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: value.to_string(),
        }),
    }
}
