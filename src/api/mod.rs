pub mod client;
pub mod error;
pub mod helius;
pub mod rate_limiter;
pub mod secure_storage;

pub use client::{is_valid_token_address, MarketDataClient, MarketSnapshot, RateLimitConfig};
pub use error::ApiError;
pub use helius::HeliusClient;
pub use rate_limiter::RateLimiter;
pub use secure_storage::SecureStorage;
