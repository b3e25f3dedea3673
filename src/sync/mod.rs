pub mod refresher;
pub mod scheduler;

pub use refresher::{RefreshConfig, RefreshOutcome, UnrealizedRefresher};
pub use scheduler::RefreshScheduler;
