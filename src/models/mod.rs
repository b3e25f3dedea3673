pub mod settings;
pub mod trade;
pub mod widget;

pub use settings::*;
pub use trade::*;
pub use widget::*;
