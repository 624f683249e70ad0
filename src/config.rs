//! Configuration
//!
//! Every setting can be given as a flag or through the environment, and a
//! `.env` file is honoured when present.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

/// Pricing settings.
#[derive(Debug, Clone, Args)]
pub struct PricingConfig {
    /// Tax rate as a fraction of the subtotal (0.10 = 10%)
    #[arg(long, env = "TAX_RATE", default_value = "0.10")]
    pub tax_rate: Decimal,

    /// Subtotal above which shipping is free
    #[arg(long, env = "FREE_SHIPPING_THRESHOLD", default_value = "50.00")]
    pub free_shipping_threshold: Decimal,

    /// Flat shipping fee charged at or below the threshold
    #[arg(long, env = "SHIPPING_FEE", default_value = "5.99")]
    pub shipping_fee: Decimal,

    /// ISO 4217 currency code
    #[arg(long, env = "CURRENCY", default_value = "GBP")]
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            free_shipping_threshold: Decimal::new(50_00, 2),
            shipping_fee: Decimal::new(5_99, 2),
            currency: "GBP".to_string(),
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    #[default]
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Storage settings.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// File holding the persisted cart
    #[arg(long, env = "CART_FILE", default_value = ".su-curries/cart.json")]
    pub cart_file: PathBuf,

    /// Directory of seed YAML files; the bundled demo data is used when omitted
    #[arg(long, env = "SEED_DIR")]
    pub seed_dir: Option<PathBuf>,
}

/// Load `.env` into the process environment if one exists.
pub fn load_dotenv() {
    // A missing .env is normal.
    _ = dotenvy::dotenv();
}
