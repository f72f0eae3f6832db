//! A single filter: one pattern plus optional setting overrides

use regex::{Regex, RegexBuilder};

use modsieve_core::{Error, EventContext, Result};

use crate::descriptor::FilterDescriptor;
use crate::settings::Settings;

/// A filter looks for a specific token within an event, and can override its
/// list's default settings per entry name.
#[derive(Debug)]
pub struct Filter {
    pub id: u64,

    /// The configured pattern, as given
    pub token: String,

    pub description: String,

    /// Whether the token must match on word boundaries
    pub exact: bool,

    /// Per-filter overrides; `None` means the filter defers entirely to its
    /// list's defaults
    pub settings: Option<Settings>,

    pattern: Regex,
}

impl Filter {
    /// Build a filter from its descriptor, compiling the search pattern.
    ///
    /// A malformed pattern is a fatal configuration error for the list.
    pub fn new(descriptor: &FilterDescriptor) -> Result<Self> {
        let settings = Settings::create(&descriptor.settings)?;

        let mut pattern = descriptor.content.clone();
        if descriptor.additional_field {
            if !pattern.starts_with(r"\b") {
                pattern = format!(r"\b{pattern}");
            }
            if !pattern.ends_with(r"\b") {
                pattern.push_str(r"\b");
            }
        }
        let pattern = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                Error::config(format!(
                    "bad pattern {:?} in filter {}: {e}",
                    descriptor.content, descriptor.id
                ))
            })?;

        Ok(Self {
            id: descriptor.id,
            token: descriptor.content.clone(),
            description: descriptor.description.clone(),
            exact: descriptor.additional_field,
            settings,
            pattern,
        })
    }

    /// Search for this filter's token within the context's (normalized)
    /// content
    pub fn triggered_on(&self, ctx: &EventContext) -> bool {
        self.pattern.is_match(&ctx.content)
    }
}
