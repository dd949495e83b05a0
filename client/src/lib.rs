//! # Statecast Client
//! The predicting side of a statecast simulation: sends input commands,
//! applies them locally before the server confirms, reconciles the
//! controlled entity against authoritative snapshots, and interpolates
//! every other replicated entity between them.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod client;
pub mod command_history;
pub mod config;
pub mod error;
pub mod events;
pub mod interpolation;
pub mod pending_spawns;

pub use client::{Client, FrameInput};
pub use command_history::CommandHistory;
pub use config::ClientConfig;
pub use error::ClientError;
pub use events::ClientEvent;
pub use interpolation::{EntityInterpolation, InterpolationBuffer};
pub use pending_spawns::PendingSpawns;
