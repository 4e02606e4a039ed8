// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "db.rs"]
pub mod db;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "reviews/mod.rs"]
pub mod reviews;

#[path = "ai/mod.rs"]
pub mod ai;
