//! Action setting entries
//!
//! An action entry describes a response to take when a filter applies, and
//! knows how to merge with another entry of the same kind. Each kind is
//! applied exactly once per event, after all fired filters' entries have
//! been folded together by the aggregator.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use modsieve_core::{
    Error, EventContext, GatewayError, InfractionKind, InfractionRequest, ModerationGateway,
    Result,
};

/// Embed colour used for the notification DM when nothing set one earlier
pub const DEFAULT_EMBED_COLOUR: u32 = 0x5865F2;

/// An action-capable setting entry.
///
/// The set of kinds is closed; `combine` and `apply` match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEntry {
    DeleteMessages(DeleteMessages),
    Ping(Ping),
    InfractionAndNotification(InfractionAndNotification),
}

/// Whether to delete the offending message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteMessages {
    pub delete: bool,
}

/// Who to ping on the moderator alert for a trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ping {
    /// Role/user ids to mention for a trigger inside a guild
    pub guild_mentions: BTreeSet<u64>,

    /// Role/user ids to mention for a trigger in DMs
    pub dm_mentions: BTreeSet<u64>,
}

/// Auxiliary superstar outcome carried alongside a primary infraction.
///
/// Produced when combining entries where one side's primary infraction is
/// `superstar`: the role restriction is still issued, but as a side channel
/// next to the other side's primary infraction.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperstarOutcome {
    pub reason: String,
    pub duration_secs: f64,
}

/// What infraction to issue and the notification to DM the user.
///
/// A DM cannot be sent once a user is banned or kicked, so the two concerns
/// are grouped into a single entry and applied together.
#[derive(Debug, Clone, PartialEq)]
pub struct InfractionAndNotification {
    pub kind: InfractionKind,
    pub reason: String,
    pub duration_secs: f64,
    pub dm_content: String,
    pub dm_embed: String,
    pub superstar: Option<SuperstarOutcome>,
}

#[derive(Debug, Deserialize)]
struct RawPing {
    ping_type: Option<Vec<u64>>,
    dm_ping_type: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize)]
struct RawInfraction {
    infraction_type: Option<String>,
    infraction_reason: Option<String>,
    infraction_duration: Option<Value>,
    dm_content: Option<String>,
    dm_embed: Option<String>,
}

fn parse_duration(name: &str, value: Option<&Value>) -> Result<f64> {
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| Error::config(format!("bad duration for setting {name}"))),
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| Error::config(format!("bad duration for setting {name}: {s:?}"))),
        Some(other) => Err(Error::config(format!(
            "bad duration for setting {name}: {other}"
        ))),
    }
}

impl ActionEntry {
    /// Construct the action entry registered under `name` from its raw
    /// configuration value.
    ///
    /// A `null` value means the entry holds no value and is skipped; a
    /// malformed non-null value is a fatal configuration error.
    pub fn create(name: &str, value: &Value) -> Result<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }

        let parse_err =
            |e: serde_json::Error| Error::config(format!("bad value for setting {name}: {e}"));

        let entry = match name {
            "delete_messages" => Self::DeleteMessages(DeleteMessages {
                delete: bool::deserialize(value).map_err(parse_err)?,
            }),
            "mentions" => {
                let raw = RawPing::deserialize(value).map_err(parse_err)?;
                Self::Ping(Ping {
                    guild_mentions: raw.ping_type.unwrap_or_default().into_iter().collect(),
                    dm_mentions: raw.dm_ping_type.unwrap_or_default().into_iter().collect(),
                })
            }
            "infraction_and_notification" => {
                let raw = RawInfraction::deserialize(value).map_err(parse_err)?;
                let kind = match raw.infraction_type.as_deref() {
                    None | Some("") => InfractionKind::None,
                    Some(type_name) => InfractionKind::parse(type_name).ok_or_else(|| {
                        Error::config(format!("unknown infraction type: {type_name:?}"))
                    })?,
                };
                Self::InfractionAndNotification(InfractionAndNotification {
                    kind,
                    reason: raw.infraction_reason.unwrap_or_default(),
                    duration_secs: parse_duration(name, raw.infraction_duration.as_ref())?,
                    dm_content: raw.dm_content.unwrap_or_default(),
                    dm_embed: raw.dm_embed.unwrap_or_default(),
                    superstar: None,
                })
            }
            _ => {
                return Err(Error::internal(format!(
                    "{name} is not a registered action entry"
                )))
            }
        };

        Ok(Some(entry))
    }

    /// The registered name of this entry's kind, used for grouping
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DeleteMessages(_) => "delete_messages",
            Self::Ping(_) => "mentions",
            Self::InfractionAndNotification(_) => "infraction_and_notification",
        }
    }

    /// Combine two entries of the same kind into one.
    ///
    /// Folding two different kinds is a programming error: grouping by kind
    /// precedes folding, so it fails loudly rather than being papered over.
    pub fn combine(self, other: ActionEntry) -> Result<ActionEntry> {
        match (self, other) {
            (Self::DeleteMessages(a), Self::DeleteMessages(b)) => {
                Ok(Self::DeleteMessages(DeleteMessages {
                    delete: a.delete || b.delete,
                }))
            }
            (Self::Ping(a), Self::Ping(b)) => Ok(Self::Ping(Ping {
                guild_mentions: a.guild_mentions.union(&b.guild_mentions).copied().collect(),
                dm_mentions: a.dm_mentions.union(&b.dm_mentions).copied().collect(),
            })),
            (Self::InfractionAndNotification(a), Self::InfractionAndNotification(b)) => {
                Ok(Self::InfractionAndNotification(a.combine(b)))
            }
            (a, b) => Err(Error::internal(format!(
                "cannot combine action entries of kinds {} and {}",
                a.kind(),
                b.kind()
            ))),
        }
    }

    /// Execute this entry against the context.
    ///
    /// Mutates the context's output fields and performs the entry's outbound
    /// side effects through the gateway.
    pub async fn apply(
        &self,
        ctx: &mut EventContext,
        gateway: &dyn ModerationGateway,
    ) -> std::result::Result<(), GatewayError> {
        match self {
            Self::DeleteMessages(entry) => entry.apply(ctx, gateway).await,
            Self::Ping(entry) => {
                entry.apply(ctx, gateway);
                Ok(())
            }
            Self::InfractionAndNotification(entry) => entry.apply(ctx, gateway).await,
        }
    }
}

impl DeleteMessages {
    /// Delete the context message, ignoring it if it's already gone
    pub async fn apply(
        &self,
        ctx: &EventContext,
        gateway: &dyn ModerationGateway,
    ) -> std::result::Result<(), GatewayError> {
        if !self.delete {
            return Ok(());
        }

        let Some(message) = &ctx.message else {
            return Ok(());
        };
        if message.guild_id.is_none() {
            return Ok(());
        }

        match gateway.delete_message(message).await {
            // Best effort: someone beat us to it.
            Err(GatewayError::NotFound) => Ok(()),
            other => other,
        }
    }
}

impl Ping {
    /// Prefix the configured mentions onto the alert content
    pub fn apply(&self, ctx: &mut EventContext, gateway: &dyn ModerationGateway) {
        let mentions = if ctx.channel.in_guild() {
            &self.guild_mentions
        } else {
            &self.dm_mentions
        };
        let resolved: Vec<String> = mentions
            .iter()
            .map(|id| gateway.resolve_mention(*id))
            .collect();
        if !resolved.is_empty() {
            ctx.alert_content = format!("{} {}", resolved.join(" "), ctx.alert_content);
        }
    }
}

impl InfractionAndNotification {
    /// Combine two infraction-and-notification entries.
    ///
    /// When exactly one side's primary infraction is superstar, that side is
    /// demoted to the auxiliary superstar outcome and the other side becomes
    /// the primary, its fields untouched. Otherwise the higher-severity kind
    /// wins and keeps its own duration; a tie on kind takes the longer
    /// duration, and the text fields are bullet-merged.
    pub fn combine(self, other: InfractionAndNotification) -> InfractionAndNotification {
        let one_is_superstar = self.kind != other.kind
            && (self.kind == InfractionKind::Superstar || other.kind == InfractionKind::Superstar);

        if one_is_superstar {
            let (star, primary) = if self.kind == InfractionKind::Superstar {
                (&self, &other)
            } else {
                (&other, &self)
            };

            let superstar = match self.superstar.as_ref().or(other.superstar.as_ref()) {
                Some(existing) => SuperstarOutcome {
                    reason: merge_messages(&star.reason, &existing.reason),
                    duration_secs: star.duration_secs.max(existing.duration_secs),
                },
                None => SuperstarOutcome {
                    reason: star.reason.clone(),
                    duration_secs: star.duration_secs,
                },
            };

            InfractionAndNotification {
                kind: primary.kind,
                reason: primary.reason.clone(),
                duration_secs: primary.duration_secs,
                dm_content: primary.dm_content.clone(),
                dm_embed: primary.dm_embed.clone(),
                superstar: Some(superstar),
            }
        } else {
            let (kind, duration_secs) = if self.kind != other.kind {
                // The more severe kind wins outright and keeps its own
                // duration; the loser's duration is discarded, not maximized.
                let winner = if self.kind > other.kind { &self } else { &other };
                (winner.kind, winner.duration_secs)
            } else {
                (self.kind, self.duration_secs.max(other.duration_secs))
            };

            InfractionAndNotification {
                kind,
                duration_secs,
                reason: merge_messages(&self.reason, &other.reason),
                dm_content: merge_messages(&self.dm_content, &other.dm_content),
                dm_embed: merge_messages(&self.dm_embed, &other.dm_embed),
                superstar: self.superstar.or(other.superstar),
            }
        }
    }

    /// Compose and send the notification DM, then issue the infractions.
    ///
    /// A forbidden DM falls back to posting the same content in the origin
    /// channel. Bans and guild-less events route the infraction announcement
    /// to the moderation-alerts channel.
    pub async fn apply(
        &self,
        ctx: &mut EventContext,
        gateway: &dyn ModerationGateway,
    ) -> std::result::Result<(), GatewayError> {
        ctx.dm_embed.description = format!(
            "Hey {}!\n{}",
            ctx.author.mention,
            merge_messages(&ctx.dm_embed.description, &self.dm_embed)
        );
        if ctx.dm_embed.colour.is_none() {
            ctx.dm_embed.colour = Some(DEFAULT_EMBED_COLOUR);
        }
        ctx.dm_text = merge_messages(&ctx.dm_text, &self.dm_content);

        match gateway
            .send_dm(ctx.author.id, &ctx.dm_text, &ctx.dm_embed)
            .await
        {
            Err(GatewayError::Forbidden) => {
                gateway
                    .send_channel_message(ctx.channel.id, &ctx.dm_text, &ctx.dm_embed)
                    .await?;
            }
            other => other?,
        }

        if let Some(superstar) = &self.superstar {
            gateway
                .issue_infraction(&InfractionRequest {
                    kind: InfractionKind::Superstar,
                    user_id: ctx.author.id,
                    duration_secs: superstar.duration_secs,
                    reason: superstar.reason.clone(),
                    alert_channel_fallback: !ctx.channel.in_guild(),
                })
                .await?;
        }

        if self.kind != InfractionKind::None {
            gateway
                .issue_infraction(&InfractionRequest {
                    kind: self.kind,
                    user_id: ctx.author.id,
                    duration_secs: self.duration_secs,
                    reason: self.reason.clone(),
                    alert_channel_fallback: self.kind == InfractionKind::Ban
                        || !ctx.channel.in_guild(),
                })
                .await?;
        }

        Ok(())
    }
}

/// Combine two messages into bullet points of a single message.
///
/// Either side empty returns the other unchanged; otherwise each side gets a
/// leading bullet (unless it already has one) and they're joined with a
/// blank line.
pub fn merge_messages(first: &str, second: &str) -> String {
    if first.is_empty() {
        return second.to_string();
    }
    if second.is_empty() {
        return first.to_string();
    }

    let bullet = |message: &str| {
        if message.starts_with('•') {
            message.to_string()
        } else {
            format!("• {message}")
        }
    };
    format!("{}\n\n{}", bullet(first), bullet(second))
}
