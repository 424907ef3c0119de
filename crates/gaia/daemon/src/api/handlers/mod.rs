//! API handlers

mod allocations;
mod breaker;
mod health;
mod journal;
mod monitor;
mod oracle;
mod proposals;
mod roles;

pub use allocations::*;
pub use breaker::*;
pub use health::*;
pub use journal::*;
pub use monitor::*;
pub use oracle::*;
pub use proposals::*;
pub use roles::*;
