use clap::{Parser, ValueEnum};
use showroom_telemetry::LogFormat;
use std::fmt::{Display, Formatter};

pub const BASE_ENDPOINT_ENV: &str = "SHOWROOM_BASE_ENDPOINT";
pub const ACCESS_TOKEN_ENV: &str = "SHOWROOM_ACCESS_TOKEN";
pub const LOG_FORMAT_ENV: &str = "SHOWROOM_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "pretty")]
    Pretty,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatArg::Pretty => write!(f, "pretty"),
            LogFormatArg::Json => write!(f, "json"),
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

/// Resolve media references the way a page view would and print the results.
#[derive(Debug, Parser)]
#[command(name = "showroom-resolve")]
pub struct CLI {
    /// Prefix for relative references, e.g. `https://cdn.example.com/`.
    #[arg(long, env = BASE_ENDPOINT_ENV)]
    pub base_endpoint: String,

    /// Query parameter appended to direct URLs, e.g. `sig=abc`.
    #[arg(long, env = ACCESS_TOKEN_ENV)]
    pub access_token: String,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    pub log_format: LogFormatArg,

    /// References to resolve, in output order.
    #[arg(required = true)]
    pub references: Vec<String>,
}
