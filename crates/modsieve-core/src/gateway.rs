//! Outbound moderation capabilities consumed by actions
//!
//! The evaluation core never talks to a chat platform directly. Everything
//! with a side effect (DMs, deletions, infractions) goes through the
//! [`ModerationGateway`] trait, supplied by the host.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::{Embed, SourceMessage};

/// Errors surfaced by gateway calls
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The platform refused the operation (e.g. the user blocks DMs)
    #[error("operation forbidden")]
    Forbidden,

    /// The target no longer exists (e.g. message already deleted)
    #[error("target not found")]
    NotFound,

    /// Any other transport or platform failure
    #[error("gateway failure: {0}")]
    Other(String),
}

/// An enumeration of infraction kinds, ordered by severity.
///
/// The ordering is fixed: `Ban` is the most severe, `None` the least. It is
/// used only as a tie-break when two simultaneously-triggered rules disagree
/// on the infraction to issue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum InfractionKind {
    #[default]
    None,
    Note,
    Superstar,
    Watch,
    Warning,
    VoiceBan,
    Mute,
    Kick,
    Ban,
}

impl InfractionKind {
    /// Parse a configured infraction name. Accepts spaces in place of
    /// underscores ("voice ban"), case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().replace(' ', "_").to_lowercase().as_str() {
            "" | "none" => Some(Self::None),
            "note" => Some(Self::Note),
            "superstar" => Some(Self::Superstar),
            "watch" => Some(Self::Watch),
            "warning" => Some(Self::Warning),
            "voice_ban" => Some(Self::VoiceBan),
            "mute" => Some(Self::Mute),
            "kick" => Some(Self::Kick),
            "ban" => Some(Self::Ban),
            _ => None,
        }
    }

    /// Canonical configuration name for this kind
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Note => "note",
            Self::Superstar => "superstar",
            Self::Watch => "watch",
            Self::Warning => "warning",
            Self::VoiceBan => "voice_ban",
            Self::Mute => "mute",
            Self::Kick => "kick",
            Self::Ban => "ban",
        }
    }
}

/// A request to issue an infraction against a user
#[derive(Debug, Clone, PartialEq)]
pub struct InfractionRequest {
    /// What kind of infraction to issue
    pub kind: InfractionKind,

    /// The offending user
    pub user_id: u64,

    /// How long the infraction lasts, in seconds
    pub duration_secs: f64,

    /// Reason recorded with the infraction
    pub reason: String,

    /// Route the announcement to the moderation-alerts channel instead of
    /// the origin channel (bans, or events with no guild channel)
    pub alert_channel_fallback: bool,
}

/// Outbound capabilities the action entries need from the host.
///
/// Implementations must be safe to call concurrently; each call is
/// independently fault-isolated by the aggregator.
#[async_trait]
pub trait ModerationGateway: Send + Sync {
    /// Send a direct message to a user
    async fn send_dm(
        &self,
        user_id: u64,
        text: &str,
        embed: &Embed,
    ) -> Result<(), GatewayError>;

    /// Post a message in a channel
    async fn send_channel_message(
        &self,
        channel_id: u64,
        text: &str,
        embed: &Embed,
    ) -> Result<(), GatewayError>;

    /// Delete a message
    async fn delete_message(&self, message: &SourceMessage) -> Result<(), GatewayError>;

    /// Issue an infraction
    async fn issue_infraction(&self, request: &InfractionRequest) -> Result<(), GatewayError>;

    /// Resolve a numeric id to a role-or-user mention string
    fn resolve_mention(&self, id: u64) -> String;
}

/// Per-id memoization for mention resolution.
///
/// Gateway implementations can wrap their role lookup in this so repeated
/// pings of the same id across one process resolve once.
#[derive(Debug, Default)]
pub struct MentionCache {
    inner: Mutex<HashMap<u64, String>>,
}

impl MentionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached mention for `id`, computing it with `resolve` on a
    /// cache miss
    pub fn resolve(&self, id: u64, resolve: impl FnOnce(u64) -> String) -> String {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entry(id).or_insert_with(|| resolve(id)).clone()
    }
}
