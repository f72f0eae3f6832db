//! A named collection of setting entries
//!
//! Each filter list and filter has its own settings. A filter is triggered
//! only if all of its validation settings approve; if it is triggered, its
//! action settings are combined with those of the other triggered filters in
//! the same event, and action is taken according to the combined result.
//!
//! A filter doesn't have to have its own settings. For every undefined
//! setting, it falls back to the value defined in the filter list which
//! contains the filter.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, OnceLock};

use serde_json::{Map, Value};
use tracing::warn;

use modsieve_core::{EventContext, Result};

use crate::action::ActionEntry;
use crate::registry::{setting_capability, SettingCapability};
use crate::validation::ValidationEntry;

fn already_warned() -> &'static Mutex<HashSet<String>> {
    static WARNED: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    WARNED.get_or_init(|| Mutex::new(HashSet::new()))
}

/// A collection of settings, partitioned into validations and actions
#[derive(Debug, Clone, Default)]
pub struct Settings {
    validations: BTreeMap<String, ValidationEntry>,
    actions: BTreeMap<String, ActionEntry>,
}

impl Settings {
    /// Build a `Settings` from raw configuration data, returning `None` if
    /// no entry holds a value.
    ///
    /// The `None` is significant: it distinguishes a filter with no
    /// overrides from one whose overrides are present but empty, which the
    /// trigger decision treats differently. Unknown setting names are logged
    /// once per distinct name and dropped; a malformed value for a known
    /// name is a fatal configuration error.
    pub fn create(settings_data: &Map<String, Value>) -> Result<Option<Self>> {
        let mut settings = Settings::default();

        for (name, value) in settings_data {
            match setting_capability(name) {
                Some(SettingCapability::Validation) => {
                    if let Some(entry) = ValidationEntry::create(name, value)? {
                        settings.validations.insert(name.clone(), entry);
                    }
                }
                Some(SettingCapability::Action) => {
                    if let Some(entry) = ActionEntry::create(name, value)? {
                        settings.actions.insert(name.clone(), entry);
                    }
                }
                None => {
                    let mut warned = already_warned().lock().unwrap_or_else(|e| e.into_inner());
                    if warned.insert(name.clone()) {
                        warn!(setting = %name, "unknown setting name in configuration, dropping");
                    }
                }
            }
        }

        if settings.validations.is_empty() && settings.actions.is_empty() {
            return Ok(None);
        }
        Ok(Some(settings))
    }

    /// Evaluate the validation entries against a context.
    ///
    /// Returns the names of the validations that passed and those that
    /// failed. Order-independent and side-effect-free; entries holding no
    /// value were already dropped at construction and count neither way.
    pub fn evaluate(&self, ctx: &EventContext) -> (BTreeSet<String>, BTreeSet<String>) {
        let mut passed = BTreeSet::new();
        let mut failed = BTreeSet::new();

        for (name, validation) in &self.validations {
            if validation.triggers_on(ctx) {
                passed.insert(name.clone());
            } else {
                failed.insert(name.clone());
            }
        }

        (passed, failed)
    }

    /// Look up an action entry by its registered name
    pub fn action(&self, name: &str) -> Option<&ActionEntry> {
        self.actions.get(name)
    }

    /// Whether this collection holds any validation entries
    pub fn has_validations(&self) -> bool {
        !self.validations.is_empty()
    }
}
