//! A named list of filters and the trigger decision
//!
//! A filter list holds, per mode, a set of filters plus list-wide default
//! settings, and decides for a given event which of its filters fire.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use modsieve_core::{Error, EventContext, Result};

use crate::descriptor::FilterListDescriptor;
use crate::filter::Filter;
use crate::normalize::ContentNormalizer;
use crate::settings::Settings;

/// Which mode a set of filters operates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Deny,
    Allow,
}

/// A list of filters, each looking for a specific token, sharing list-wide
/// default settings
#[derive(Debug)]
pub struct FilterList {
    pub name: String,
    pub description: String,
    filters: HashMap<ListKind, Vec<Filter>>,
    defaults: HashMap<ListKind, Settings>,
    normalizer: ContentNormalizer,
}

impl FilterList {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            description: description.into(),
            filters: HashMap::new(),
            defaults: HashMap::new(),
            normalizer: ContentNormalizer::new()?,
        })
    }

    /// Add (or replace) one mode of this list from its descriptor.
    ///
    /// Additive and idempotent per mode: loading the same descriptor twice
    /// leaves the list in the same state.
    pub fn add_list(&mut self, descriptor: &FilterListDescriptor) -> Result<()> {
        let filters = descriptor
            .filters
            .iter()
            .map(Filter::new)
            .collect::<Result<Vec<_>>>()?;
        let defaults = Settings::create(&descriptor.settings)?.unwrap_or_default();

        self.filters.insert(descriptor.list_type, filters);
        self.defaults.insert(descriptor.list_type, defaults);
        Ok(())
    }

    /// The default settings for one mode, if that mode has been loaded
    pub fn defaults(&self, kind: ListKind) -> Option<&Settings> {
        self.defaults.get(&kind)
    }

    /// Dispatch the given event to the list's filters, and return the
    /// filters triggered.
    ///
    /// The content is normalized in place first, so every later consumer of
    /// the context sees the normalized form. Token lists act on their
    /// deny-mode filters.
    pub fn triggers_for(&self, ctx: &mut EventContext) -> Vec<&Filter> {
        ctx.content = self.normalizer.normalize(&ctx.content);

        let (Some(filters), Some(defaults)) = (
            self.filters.get(&ListKind::Deny),
            self.defaults.get(&ListKind::Deny),
        ) else {
            return Vec::new();
        };
        Self::filter_list_result(ctx, filters, defaults)
    }

    /// Sift through `filters` and return only the ones which apply to the
    /// given context.
    ///
    /// The strategy is as follows:
    /// 1. The default settings are evaluated on the given context. The
    ///    default answer for whether a filter should trigger is whether
    ///    there aren't any validation settings which returned false.
    /// 2. For each filter whose token matches, its overrides are considered:
    ///    - if there are no overrides, the filter is triggered if that is
    ///      the default answer;
    ///    - otherwise it triggers if none of its own validations failed and
    ///      every failing default passes in the override, with the override
    ///      also passing at least one name beyond the failed-default set
    ///      (a strict subset check; an override correcting *exactly* the
    ///      failed defaults does not trigger).
    fn filter_list_result<'a>(
        ctx: &EventContext,
        filters: &'a [Filter],
        defaults: &Settings,
    ) -> Vec<&'a Filter> {
        let (_, failed_by_default) = defaults.evaluate(ctx);
        let default_answer = failed_by_default.is_empty();

        let mut triggered = Vec::new();
        for filter in filters {
            if !filter.triggered_on(ctx) {
                continue;
            }

            match &filter.settings {
                None => {
                    if default_answer {
                        triggered.push(filter);
                    }
                }
                Some(settings) => {
                    let (passed, failed) = settings.evaluate(ctx);
                    let strictly_overrides = failed_by_default.is_subset(&passed)
                        && failed_by_default.len() < passed.len();
                    if failed.is_empty() && strictly_overrides {
                        triggered.push(filter);
                    }
                }
            }
        }

        triggered
    }
}

/// Missing deny-mode defaults where filters fired; indicates a load-ordering
/// bug, not bad configuration.
pub(crate) fn missing_defaults(list_name: &str) -> Error {
    Error::internal(format!("deny-mode defaults missing for list {list_name}"))
}
