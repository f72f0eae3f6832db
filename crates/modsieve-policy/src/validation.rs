//! Validation setting entries
//!
//! A validation entry answers whether a filter should apply to a given
//! context. Entries are constructed once from raw configuration at load time
//! and are side-effect-free to evaluate.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use modsieve_core::{Error, EventContext, Result};

/// A validation-capable setting entry.
///
/// The set of kinds is closed; evaluation matches exhaustively so a new kind
/// cannot silently no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationEntry {
    /// Whether the filter is enabled at all
    Enabled(bool),

    /// Roles which allow the author to bypass the filter
    BypassRoles { roles: BTreeSet<u64> },

    /// Whether to apply the filter to DMs
    FilterDm { apply_in_dm: bool },

    /// Channel/category scoping for the filter
    ChannelScope {
        disabled_channels: BTreeSet<u64>,
        disabled_categories: BTreeSet<u64>,
        enabled_channels: BTreeSet<u64>,
    },
}

#[derive(Debug, Deserialize)]
struct RawChannelScope {
    disabled_channels: Option<Vec<u64>>,
    disabled_categories: Option<Vec<u64>>,
    enabled_channels: Option<Vec<u64>>,
}

fn id_set(ids: Option<Vec<u64>>) -> BTreeSet<u64> {
    ids.unwrap_or_default().into_iter().collect()
}

impl ValidationEntry {
    /// Construct the validation entry registered under `name` from its raw
    /// configuration value.
    ///
    /// A `null` value means the entry holds no value: it is skipped rather
    /// than counted, which is what lets a filter override only some of its
    /// list's settings. A malformed non-null value is a fatal configuration
    /// error. Unknown names are the caller's concern; this only accepts
    /// names registered as validations.
    pub fn create(name: &str, value: &Value) -> Result<Option<Self>> {
        if value.is_null() {
            return Ok(None);
        }

        let parse_err =
            |e: serde_json::Error| Error::config(format!("bad value for setting {name}: {e}"));

        let entry = match name {
            "enabled" => Self::Enabled(bool::deserialize(value).map_err(parse_err)?),
            "bypass_roles" => Self::BypassRoles {
                roles: Vec::<u64>::deserialize(value)
                    .map_err(parse_err)?
                    .into_iter()
                    .collect(),
            },
            "filter_dm" => Self::FilterDm {
                apply_in_dm: bool::deserialize(value).map_err(parse_err)?,
            },
            "channel_scope" => {
                let raw = RawChannelScope::deserialize(value).map_err(parse_err)?;
                Self::ChannelScope {
                    disabled_channels: id_set(raw.disabled_channels),
                    disabled_categories: id_set(raw.disabled_categories),
                    enabled_channels: id_set(raw.enabled_channels),
                }
            }
            _ => {
                return Err(Error::internal(format!(
                    "{name} is not a registered validation entry"
                )))
            }
        };

        Ok(Some(entry))
    }

    /// Return whether the filter should trigger on this context, as far as
    /// this entry is concerned.
    pub fn triggers_on(&self, ctx: &EventContext) -> bool {
        match self {
            Self::Enabled(enabled) => *enabled,

            Self::BypassRoles { roles } => {
                ctx.author.roles.iter().all(|role| !roles.contains(role))
            }

            Self::FilterDm { apply_in_dm } => ctx.channel.in_guild() || *apply_in_dm,

            Self::ChannelScope {
                disabled_channels,
                disabled_categories,
                enabled_channels,
            } => {
                // An explicitly enabled channel bypasses any disables.
                enabled_channels.contains(&ctx.channel.id)
                    || (!disabled_channels.contains(&ctx.channel.id)
                        && ctx
                            .channel
                            .category_id
                            .map_or(true, |category| !disabled_categories.contains(&category)))
            }
        }
    }
}
