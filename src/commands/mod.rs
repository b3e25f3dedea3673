pub mod credentials;
pub mod export;
pub mod market;
pub mod session;
pub mod settings;
pub mod stats;
pub mod trades;
pub mod widgets;

#[cfg(test)]
pub(crate) mod test_support;

pub use credentials::*;
pub use export::*;
pub use market::*;
pub use session::*;
pub use settings::*;
pub use stats::*;
pub use trades::*;
pub use widgets::*;
