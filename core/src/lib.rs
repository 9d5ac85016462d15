//! Topdown Core - movement demo with recording and replay
//!
//! This crate provides the simulation and replay pieces shared by the
//! command-line tools.
//!
//! # Architecture
//!
//! - [`Actor`] - Something driven by held keys under fixed-step physics
//! - [`Player`] - The top-down character with sprint and adrenaline
//! - [`replay::Recorder`] - Writes `.dem` logs while playing
//! - [`replay::PlaybackEngine`] - Replays a log with seek, rewind and speed control

pub mod actor;
pub mod config;
pub mod replay;

pub use actor::{Actor, Key, Player, SimulatedKeys};
pub use config::{Config, PhysicsConfig, PlaybackConfig, RecordingConfig};

#[cfg(test)]
mod integration;
