pub mod demo;
pub mod reducer;
pub mod repository;

pub use demo::demo_trades;
pub use reducer::{TradeStore, generate_trade_id};
pub use repository::{CollectionChange, TradeRepository};
