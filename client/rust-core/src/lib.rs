pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;
pub mod session;
pub mod utils;

pub use api::{ApiClient, Subject};
pub use config::Config;
pub use error::{ClientError, Result};
pub use services::DashboardService;
pub use session::AuthSession;
