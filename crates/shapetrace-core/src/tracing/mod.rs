//! Tracing subscriber setup.

mod setup;

pub use setup::init_tracing;
