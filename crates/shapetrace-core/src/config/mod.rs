//! Configuration: one TOML document, one section per subsystem.

pub mod compare_config;
pub mod pack_config;
pub mod scan_config;
pub mod trace_config;

pub use compare_config::CompareConfig;
pub use pack_config::PackConfig;
pub use scan_config::ScanConfig;
pub use trace_config::TraceConfig;
