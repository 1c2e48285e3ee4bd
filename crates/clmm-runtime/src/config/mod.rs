/// Device selection config module.
pub mod device;
/// Kernel dispatch config module.
pub mod dispatch;
/// Program image config module.
pub mod program;

mod base;
mod logger;

pub use base::*;
pub use logger::*;
