pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;

pub use error::ApiError;
pub use models::Config;
