#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

mod adaptive_filter;
pub mod config;
mod echo_canceller;
mod metrics;
mod render_history;

pub use config::EchoCancellerConfig;
pub use echo_canceller::EchoCanceller;
pub use metrics::EchoCancellerMetrics;
