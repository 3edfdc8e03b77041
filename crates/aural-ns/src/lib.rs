#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod config;
pub(crate) mod noise_estimator;
pub mod noise_suppressor;
pub(crate) mod speech_probability_estimator;
pub(crate) mod wiener_filter;

pub use config::{NsConfig, SuppressionLevel};
pub use noise_suppressor::NoiseSuppressor;
