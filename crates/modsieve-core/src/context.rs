//! The event context threaded through evaluation and action execution

use serde::{Deserialize, Serialize};

/// The kind of inbound event being filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MessageCreate,
    MessageEdit,
}

/// The user who triggered the event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    /// User id
    pub id: u64,

    /// Mention string for the user, e.g. `<@123>`
    pub mention: String,

    /// Role ids the user holds; empty outside a guild
    #[serde(default)]
    pub roles: Vec<u64>,
}

/// The channel an event originated in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Channel id. For a thread, the host supplies the parent channel's id.
    pub id: u64,

    /// Guild id, or None for a DM channel
    pub guild_id: Option<u64>,

    /// Category id, if the channel belongs to one
    pub category_id: Option<u64>,
}

impl Channel {
    /// Whether this channel belongs to a guild
    pub fn in_guild(&self) -> bool {
        self.guild_id.is_some()
    }
}

/// A reference to the message that triggered the event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMessage {
    pub id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
}

/// A minimal embed body, used for the contexts' input embeds and the DM embed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub description: String,

    /// Colour as 0xRRGGBB; filled with a default by the notification action
    /// if still unset when the DM is composed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<u32>,
}

/// The context of one inbound event, threaded through rule evaluation and
/// action execution.
///
/// Input fields describe what happened; `content` may be rewritten in place
/// by normalization before rule matching. Output fields accumulate as actions
/// run. The context is owned exclusively by a single evaluation pass and is
/// never shared across events.
#[derive(Debug, Clone)]
pub struct EventContext {
    // Input context
    pub event: EventKind,
    pub author: Author,
    pub channel: Channel,
    pub content: String,
    pub message: Option<SourceMessage>,
    pub embeds: Vec<Embed>,

    // Output context
    pub dm_text: String,
    pub dm_embed: Embed,
    pub send_alert: bool,
    pub alert_content: String,
    pub alert_embeds: Vec<Embed>,
}

impl EventContext {
    /// Build a fresh context for one inbound event
    pub fn new(
        event: EventKind,
        author: Author,
        channel: Channel,
        content: impl Into<String>,
        message: Option<SourceMessage>,
        embeds: Vec<Embed>,
    ) -> Self {
        Self {
            event,
            author,
            channel,
            content: content.into(),
            message,
            embeds,
            dm_text: String::new(),
            dm_embed: Embed::default(),
            send_alert: true,
            alert_content: String::new(),
            alert_embeds: Vec::new(),
        }
    }
}
