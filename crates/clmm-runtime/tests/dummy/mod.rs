mod runtime;
mod state;

pub use runtime::*;
pub use state::*;
