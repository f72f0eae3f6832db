//! Action aggregation
//!
//! Collects the action entries of every filter that fired in one event,
//! groups them by kind, folds each group into a single effective entry, and
//! applies each folded entry exactly once.

use tracing::{debug, error};

use modsieve_core::{EventContext, ModerationGateway, Result};

use crate::action::ActionEntry;
use crate::filter::Filter;
use crate::registry::{SettingCapability, SETTING_TYPES};
use crate::settings::Settings;

/// One fired filter together with its owning list's default settings
#[derive(Debug, Clone, Copy)]
pub struct FiredFilter<'a> {
    pub filter: &'a Filter,
    pub defaults: &'a Settings,
}

impl<'a> FiredFilter<'a> {
    /// The effective action entry for `name`: the filter's own override if
    /// it has one, else the list default.
    fn effective_action(&self, name: &str) -> Option<&'a ActionEntry> {
        self.filter
            .settings
            .as_ref()
            .and_then(|settings| settings.action(name))
            .or_else(|| self.defaults.action(name))
    }
}

/// Fold the action entries of all fired filters into one entry per kind.
///
/// Filters are walked in discovery order (list, then filter, as fired) and
/// each filter's entries in registry order, so the fold order is
/// deterministic. Delete and ping combines are commutative; the
/// infraction/notification combine is not, by design, and relies on this
/// ordering.
pub fn aggregate(fired: &[FiredFilter<'_>]) -> Result<Vec<ActionEntry>> {
    let mut folded: Vec<ActionEntry> = Vec::new();

    for hit in fired {
        for (name, capability) in SETTING_TYPES {
            if *capability != SettingCapability::Action {
                continue;
            }
            let Some(entry) = hit.effective_action(name) else {
                continue;
            };

            if let Some(existing) = folded.iter_mut().find(|e| e.kind() == *name) {
                *existing = existing.clone().combine(entry.clone())?;
            } else {
                folded.push(entry.clone());
            }
        }
    }

    Ok(folded)
}

/// Apply each folded entry exactly once, in fold order.
///
/// A failing apply is logged and does not abort the remaining kinds; each
/// action's own fallback behaviour (channel post on forbidden DM, swallowed
/// not-found on delete) lives inside its `apply`.
pub async fn apply_all(
    entries: &[ActionEntry],
    ctx: &mut EventContext,
    gateway: &dyn ModerationGateway,
) {
    for entry in entries {
        debug!(kind = %entry.kind(), "applying aggregated action");
        if let Err(e) = entry.apply(ctx, gateway).await {
            error!(kind = %entry.kind(), error = %e, "action failed, continuing with remaining actions");
        }
    }
}
