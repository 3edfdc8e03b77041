#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod common;
pub mod config;
pub mod gain_applier;
pub mod gain_controller;
pub mod limiter;
pub mod noise_level_estimator;
pub mod speech_level_estimator;
pub mod vad;

pub use config::{AdaptiveDigitalConfig, FixedDigitalConfig, GainControllerConfig};
pub use gain_controller::{GainControlOutput, GainController};
pub use vad::VoiceActivityDetector;
