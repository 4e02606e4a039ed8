// Core moderation module - decides whether review text may be published.
// Following the same port/service split as the other core modules.

pub mod classifier;
pub mod moderation_models;
pub mod moderation_service;
pub mod moderation_store;
pub mod rule_analyzer;

pub use classifier::*;
pub use moderation_models::*;
pub use moderation_service::*;
pub use moderation_store::*;
pub use rule_analyzer::*;
