//! Command implementations.

mod bridge;
mod simulate;
mod validate;

pub use bridge::run_bridge;
pub use simulate::run_simulate;
pub use validate::run_validate;
