pub mod classifier;
pub mod config;
pub mod fetcher;
pub mod models;
pub mod normalizer;
pub mod notifier;
pub mod runner;
pub mod utils;
pub mod watcher;

// Re-export commonly used types
pub use classifier::{classify, StatusDocument};
pub use config::AppConfig;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use models::{
    MissingElementPolicy, NotificationOutcome, NotificationRecord, ProductSpec, RunSummary,
    StockState, StockStatus,
};
pub use normalizer::normalize;
pub use notifier::{MailCredentials, MailTransport, NotificationDispatcher, SmtpMailer};
pub use runner::TrackingRunner;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
