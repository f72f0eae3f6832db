//! The filter engine: event dispatch and list management
//!
//! Owns the filter lists, subscribes each list to the events its type
//! handles, and runs the build-context → trigger → aggregate → apply flow
//! for one event at a time.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, OnceLock};

use tokio::sync::RwLock;
use tracing::warn;

use modsieve_core::{EventContext, EventKind, ModerationGateway, Result};

use crate::aggregator::{aggregate, apply_all, FiredFilter};
use crate::descriptor::FilterListDescriptor;
use crate::filter_list::{missing_defaults, FilterList, ListKind};
use crate::registry;

fn warned_list_names() -> &'static Mutex<HashSet<String>> {
    static WARNED: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    WARNED.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Summary of one fired filter, for the host's alerting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredFilter {
    pub list_name: String,
    pub filter_id: u64,
    pub token: String,
}

/// Evaluates inbound events against the loaded filter lists
#[derive(Debug, Default)]
pub struct FilterEngine {
    filter_lists: HashMap<String, FilterList>,
    subscriptions: HashMap<EventKind, Vec<String>>,
}

impl FilterEngine {
    pub fn new() -> Self {
        registry::assert_unique_names();
        Self::default()
    }

    /// Load one list descriptor.
    ///
    /// Additive and idempotent per list name. A descriptor whose name
    /// matches no registered list type is logged once and skipped; malformed
    /// filters or settings inside a known list are fatal.
    pub fn add_list(&mut self, descriptor: &FilterListDescriptor) -> Result<()> {
        let Some(spec) = registry::list_type(&descriptor.name) else {
            let mut warned = warned_list_names().lock().unwrap_or_else(|e| e.into_inner());
            if warned.insert(descriptor.name.clone()) {
                warn!(list = %descriptor.name, "unknown filter list type in configuration, skipping");
            }
            return Ok(());
        };

        let list = match self.filter_lists.entry(descriptor.name.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                for event in spec.events {
                    let subscribed = self.subscriptions.entry(*event).or_default();
                    if !subscribed.contains(&descriptor.name) {
                        subscribed.push(descriptor.name.clone());
                    }
                }
                entry.insert(FilterList::new(&descriptor.name, &descriptor.description)?)
            }
        };
        list.add_list(descriptor)
    }

    /// The loaded filter lists, by name
    pub fn filter_lists(&self) -> &HashMap<String, FilterList> {
        &self.filter_lists
    }

    /// Evaluate one event: dispatch the context to every subscribed list,
    /// aggregate the fired filters' actions, and apply them.
    ///
    /// Returns summaries of the fired filters so the host can compose its
    /// moderator alert from them and the context's output fields.
    pub async fn handle_event(
        &self,
        ctx: &mut EventContext,
        gateway: &dyn ModerationGateway,
    ) -> Result<Vec<TriggeredFilter>> {
        let Some(list_names) = self.subscriptions.get(&ctx.event) else {
            return Ok(Vec::new());
        };

        let mut fired = Vec::new();
        let mut summaries = Vec::new();
        for name in list_names {
            let Some(list) = self.filter_lists.get(name) else {
                continue;
            };

            let triggered = list.triggers_for(ctx);
            if triggered.is_empty() {
                continue;
            }
            let defaults = list
                .defaults(ListKind::Deny)
                .ok_or_else(|| missing_defaults(name))?;

            for filter in triggered {
                summaries.push(TriggeredFilter {
                    list_name: name.clone(),
                    filter_id: filter.id,
                    token: filter.token.clone(),
                });
                fired.push(FiredFilter { filter, defaults });
            }
        }

        let folded = aggregate(&fired)?;
        apply_all(&folded, ctx, gateway).await;

        Ok(summaries)
    }
}

/// Shared handle over a [`FilterEngine`] giving atomic reloads.
///
/// An evaluation holds the read guard for its whole pass and a reload swaps
/// in a fully built engine under the write guard, so an in-flight evaluation
/// sees either the whole prior snapshot or the whole new one.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    inner: Arc<RwLock<FilterEngine>>,
}

impl EngineHandle {
    pub fn new(engine: FilterEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Replace the whole configuration snapshot.
    ///
    /// The new engine is fully built before the swap; a failure leaves the
    /// previous snapshot in place.
    pub async fn reload(&self, descriptors: &[FilterListDescriptor]) -> Result<()> {
        let mut engine = FilterEngine::new();
        for descriptor in descriptors {
            engine.add_list(descriptor)?;
        }

        *self.inner.write().await = engine;
        Ok(())
    }

    /// Evaluate one event against the current snapshot
    pub async fn handle_event(
        &self,
        ctx: &mut EventContext,
        gateway: &dyn ModerationGateway,
    ) -> Result<Vec<TriggeredFilter>> {
        self.inner.read().await.handle_event(ctx, gateway).await
    }
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new(FilterEngine::new())
    }
}
