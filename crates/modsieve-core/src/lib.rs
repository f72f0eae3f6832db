//! Modsieve Core
//!
//! Core types, traits, and utilities shared across modsieve components.
//!
//! This crate provides:
//! - The event context threaded through rule evaluation and action execution
//! - Error types and result handling
//! - Gateway traits for the outbound moderation capabilities (DMs, message
//!   deletion, infractions, mention resolution)

pub mod context;
pub mod error;
pub mod gateway;

pub use context::{Author, Channel, Embed, EventContext, EventKind, SourceMessage};
pub use error::{Error, Result};
pub use gateway::{
    GatewayError, InfractionKind, InfractionRequest, MentionCache, ModerationGateway,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{Author, Channel, Embed, EventContext, EventKind, SourceMessage};
    pub use crate::error::{Error, Result};
    pub use crate::gateway::{
        GatewayError, InfractionKind, InfractionRequest, ModerationGateway,
    };
}
