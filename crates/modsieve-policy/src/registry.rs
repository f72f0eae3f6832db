//! Static registries for setting entries and filter-list types
//!
//! Configuration refers to settings and lists by name. These tables are the
//! single source of truth for which names exist; an unknown name is a plain
//! lookup miss handled by the loader.

use modsieve_core::EventKind;

/// Which capability family a setting entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingCapability {
    /// Answers yes/no whether a rule applies to a context
    Validation,
    /// Describes a response to take when a rule applies
    Action,
}

/// All known setting-entry names and their capability
pub const SETTING_TYPES: &[(&str, SettingCapability)] = &[
    ("enabled", SettingCapability::Validation),
    ("bypass_roles", SettingCapability::Validation),
    ("filter_dm", SettingCapability::Validation),
    ("channel_scope", SettingCapability::Validation),
    ("delete_messages", SettingCapability::Action),
    ("mentions", SettingCapability::Action),
    ("infraction_and_notification", SettingCapability::Action),
];

/// A filter-list type: its external name and the events it subscribes to
#[derive(Debug, Clone, Copy)]
pub struct ListTypeSpec {
    pub name: &'static str,
    pub events: &'static [EventKind],
}

/// All known filter-list types
pub const LIST_TYPES: &[ListTypeSpec] = &[ListTypeSpec {
    name: "tokens",
    events: &[EventKind::MessageCreate, EventKind::MessageEdit],
}];

/// Look up the capability of a setting name
pub fn setting_capability(name: &str) -> Option<SettingCapability> {
    SETTING_TYPES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, capability)| *capability)
}

/// Look up a filter-list type by name
pub fn list_type(name: &str) -> Option<&'static ListTypeSpec> {
    LIST_TYPES.iter().find(|spec| spec.name == name)
}

/// Startup assertion: every registered name must be unique within its table.
///
/// Called once from `FilterEngine::new`. Duplicate names in these tables are
/// a programming error, not a configuration error.
pub fn assert_unique_names() {
    let mut seen = std::collections::HashSet::new();
    for (name, _) in SETTING_TYPES {
        assert!(seen.insert(*name), "duplicate setting name: {name}");
    }

    seen.clear();
    for spec in LIST_TYPES {
        assert!(seen.insert(spec.name), "duplicate list type name: {}", spec.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_names_are_unique() {
        assert_unique_names();
    }

    #[test]
    fn known_names_resolve() {
        assert_eq!(setting_capability("enabled"), Some(SettingCapability::Validation));
        assert_eq!(
            setting_capability("delete_messages"),
            Some(SettingCapability::Action)
        );
        assert_eq!(setting_capability("bogus"), None);
        assert!(list_type("tokens").is_some());
        assert!(list_type("bogus").is_none());
    }
}
