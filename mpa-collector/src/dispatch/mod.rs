//! Ordered listener dispatch
//!
//! - [`ExecutionContext`]: the confined consumer that runs delivery jobs in FIFO order
//! - [`ListenerSet`]: listener membership, per-flag event times and aggregate flushing

mod context;
mod listener_set;

pub use context::ExecutionContext;
pub use listener_set::{AggregateFn, ListenerSet};
