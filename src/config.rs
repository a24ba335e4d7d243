use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::models::{AlertMode, Locator, MissingElementPolicy, ProductSpec};
use crate::notifier::MailCredentials;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub notifications: NotificationsConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
    pub products: Vec<ProductSpec>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scraper: ScraperConfig::default(),
            notifications: NotificationsConfig::default(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
            products: default_products(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub request_timeout: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub max_concurrent_checks: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
            request_timeout: 20,
            retry_attempts: 2,
            retry_delay_ms: 1000,
            max_concurrent_checks: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotificationsConfig {
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub sender_address: Option<String>,
    pub sender_secret: Option<String>,
    pub recipient_address: Option<String>,
    pub from_name: Option<String>,
    /// Connection timeout in seconds.
    pub timeout: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            sender_address: None,
            sender_secret: None,
            recipient_address: None,
            from_name: None,
            timeout: 30,
        }
    }
}

impl SmtpConfig {
    pub fn credentials(&self) -> MailCredentials {
        MailCredentials {
            sender_address: self.sender_address.clone().unwrap_or_default(),
            sender_secret: self.sender_secret.clone().unwrap_or_default(),
            recipient_address: self.recipient_address.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Six-field cron expression (seconds first).
    pub cron: String,
    pub alert_mode: AlertMode,
    pub run_on_start: bool,
    pub stop_when_all_sent: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cron: "0 0 * * * *".to_string(),
            alert_mode: AlertMode::EveryCheck,
            run_on_start: true,
            stop_when_all_sent: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for the rolling log file; `None` disables file logging.
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: Some("logs".to_string()),
            file_prefix: "restock_watcher.log".to_string(),
        }
    }
}

/// Built-in product table used when no `products` are configured.
pub fn default_products() -> Vec<ProductSpec> {
    let ippodo = |name: &str, url: &str| {
        ProductSpec::new(
            name,
            url,
            Locator::new("span", "product-stock-status"),
            vec!["Sold Out".to_string()],
        )
        .with_in_stock_markers(vec!["Add to bag".to_string()])
        .with_missing_element_policy(MissingElementPolicy::AssumeOutOfStock)
        .with_vendor("ippodo")
    };

    vec![
        ippodo(
            "Ummon (40g Can)",
            "https://ippodotea.com/collections/matcha/products/ummon-no-mukashi-40g",
        ),
        ippodo(
            "Ummon (40g Bag)",
            "https://ippodotea.com/collections/matcha/products/ummon-40g-bag",
        ),
    ]
}

impl AppConfig {
    /// Load `.env`, optional config files, and `RESTOCK__*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // A missing .env file is normal in production.
        let _ = dotenvy::dotenv();

        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let s = builder
            // Add environment variables with prefix "RESTOCK"
            .add_source(Environment::with_prefix("RESTOCK").separator("__").try_parsing(true))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.apply_env_overrides(|key| env::var(key).ok().filter(|v| !v.is_empty()));
        config.validate()?;
        Ok(config)
    }

    /// Fill credentials from `SENDER_EMAIL`/`SENDER_PASSWORD`/`RECIPIENT_EMAIL`
    /// and apply `{VENDOR}_*` marker overrides.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let smtp = &mut self.notifications.smtp;
        if smtp.sender_address.is_none() {
            smtp.sender_address = lookup("SENDER_EMAIL");
        }
        if smtp.sender_secret.is_none() {
            smtp.sender_secret = lookup("SENDER_PASSWORD");
        }
        if smtp.recipient_address.is_none() {
            smtp.recipient_address = lookup("RECIPIENT_EMAIL");
        }

        for product in &mut self.products {
            let Some(vendor) = product.vendor.as_deref() else {
                continue;
            };
            let prefix = env_prefix(vendor);

            if let Some(text) = lookup(&format!("{}_IN_STOCK_TEXT", prefix)) {
                product.in_stock_markers = Some(vec![text]);
            }
            if let Some(text) = lookup(&format!("{}_SOLD_OUT_TEXT", prefix)) {
                product.sold_out_markers = vec![text];
            }
            if let Some(tag) = lookup(&format!("{}_ELEMENT_TO_FIND", prefix)) {
                product.locator.tag = tag;
            }
            if let Some(class) = lookup(&format!("{}_CLASS_TO_FIND", prefix)) {
                product.locator.class = class;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.products.is_empty() {
            return Err(ConfigError::Message("At least one product must be configured".into()));
        }

        for product in &self.products {
            product
                .validate()
                .map_err(|e| ConfigError::Message(e.to_string()))?;
        }

        if self.scraper.request_timeout == 0 {
            return Err(ConfigError::Message("Scraper request_timeout must be greater than 0".into()));
        }

        if self.scraper.max_concurrent_checks == 0 {
            return Err(ConfigError::Message("Scraper max_concurrent_checks must be greater than 0".into()));
        }

        if self.notifications.smtp.port == 0 {
            return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
        }

        if !is_valid_cron(&self.scheduler.cron) {
            return Err(ConfigError::Message("Invalid cron expression in scheduler.cron".into()));
        }

        Ok(())
    }
}

fn env_prefix(vendor: &str) -> String {
    vendor
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Basic shape check for six-field cron expressions.
pub fn is_valid_cron(cron_expr: &str) -> bool {
    let parts: Vec<&str> = cron_expr.split_whitespace().collect();
    if parts.len() != 6 {
        return false;
    }

    parts.iter().all(|part| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | '-' | ',' | '/' | '?'))
    })
}
