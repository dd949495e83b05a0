//! # Statecast Server
//! The authoritative host of a statecast simulation: runs the fixed-rate
//! tick, applies client commands to controlled entities, scopes entities per
//! connection, and broadcasts capped-size delta packets.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod interest;
pub mod server;
pub mod update_packer;
pub mod user;

pub use config::ServerConfig;
pub use connection::Connection;
pub use error::ServerError;
pub use events::ServerEvent;
pub use interest::{interest_diff, FullInterest, InterestPolicy, RadiusInterest};
pub use server::{
    DeferredAction, NoSimulation, Server, SimulationHook, DEFAULT_INTEREST_RADIUS,
};
pub use update_packer::{pack, Candidate, PackedTick};
pub use user::UserKey;
