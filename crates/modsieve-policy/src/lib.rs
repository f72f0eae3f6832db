//! Modsieve Policy Engine
//!
//! Rule-based moderation policy core: given one inbound event, decide which
//! configured filters fire, and reduce their configured responses into a
//! single consolidated response to execute.
//!
//! The two load-bearing pieces are:
//! - the trigger decision in [`filter_list`], which combines list-wide
//!   default settings with per-filter overrides using set logic;
//! - the action aggregation in [`aggregator`], which folds the action
//!   entries of every fired filter, per kind, into one effective action.

pub mod action;
pub mod aggregator;
pub mod descriptor;
pub mod engine;
pub mod filter;
pub mod filter_list;
pub mod normalize;
pub mod registry;
pub mod settings;
pub mod validation;

pub use action::{ActionEntry, DeleteMessages, InfractionAndNotification, Ping, SuperstarOutcome};
pub use aggregator::{aggregate, apply_all, FiredFilter};
pub use descriptor::{FilterDescriptor, FilterListDescriptor};
pub use engine::{EngineHandle, FilterEngine, TriggeredFilter};
pub use filter::Filter;
pub use filter_list::{FilterList, ListKind};
pub use normalize::ContentNormalizer;
pub use settings::Settings;
pub use validation::ValidationEntry;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::action::ActionEntry;
    pub use crate::descriptor::{FilterDescriptor, FilterListDescriptor};
    pub use crate::engine::{EngineHandle, FilterEngine, TriggeredFilter};
    pub use crate::filter::Filter;
    pub use crate::filter_list::{FilterList, ListKind};
    pub use crate::settings::Settings;
    pub use crate::validation::ValidationEntry;
}
