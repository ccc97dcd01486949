use clap::{Parser, ValueEnum};
use glimpse_core::code::DEFAULT_CODE_LENGTH;
use glimpse_core::DEFAULT_MAX_VIEWS;
use glimpse_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const JSON_FILE_ENV: &str = "GLIMPSE_IMPORT_JSON_FILE";
pub const STORAGE_BACKEND_ENV: &str = "GLIMPSE_STORAGE_BACKEND";
pub const DATABASE_URL_ENV: &str = "GLIMPSE_DATABASE_URL";
pub const MAX_VIEWS_ENV: &str = "GLIMPSE_IMPORT_MAX_VIEWS";
pub const CODE_LENGTH_ENV: &str = "GLIMPSE_IMPORT_CODE_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "GLIMPSE_IMPORT_MAX_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "GLIMPSE_LOG_FORMAT";

pub const DEFAULT_JSON_FILE: &str = "cv.json";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://codes.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "sqlite")]
    Sqlite,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Import JSON data into the store with generated codes.
#[derive(Debug, Parser)]
#[command(name = "glimpse-import")]
pub struct CLI {
    /// Path to JSON file (object, array of objects, or JSON Lines).
    #[arg(long, env = JSON_FILE_ENV, default_value = DEFAULT_JSON_FILE)]
    pub json_file: PathBuf,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Sqlite
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = DATABASE_URL_ENV, default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Views granted to every imported entry.
    #[arg(
        long,
        env = MAX_VIEWS_ENV,
        default_value_t = DEFAULT_MAX_VIEWS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_views: u32,

    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,

    /// Give up on a record after this many colliding codes. Unbounded if unset.
    #[arg(long, env = MAX_ATTEMPTS_ENV)]
    pub max_attempts: Option<u32>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}
