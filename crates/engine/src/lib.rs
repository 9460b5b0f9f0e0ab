//! Traversal engine for Trellis
//!
//! This crate turns positions of the fluent API into backend operations:
//! - Inventory: entry point, tenants and relationships
//! - Positions: typed single, collection, association and relationship
//!   positions with capability traits
//! - Traversal contexts: immutable query pairs describing a position
//! - Fetcher and mutator: reads, creates, updates and cascading deletes
//! - Relationship rules: diamond, loop and delete checks
//! - Notifications: post-commit delivery to subscribers
//! - Configuration: feed id strategies, implementation settings, result filter
//!
//! The engine is generic over [`trellis_core::InventoryBackend`] and never
//! touches storage directly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod associator;
pub mod config;
pub mod context;
pub mod fetcher;
pub mod inventory;
pub mod mutator;
mod navigation;
pub mod notify;
pub mod positions;
pub mod rules;
pub mod transaction;

pub use config::{
    AcceptWhateverFeedIdStrategy, Configuration, ConfigurationBuilder, FeedIdStrategy,
    ResultFilter, UuidFeedIdStrategy, CONFIG_FILE_NAME,
};
pub use context::TraversalContext;
pub use inventory::Inventory;
pub use notify::{Action, ActionContext, Interest, Notification, Observers, Subscription};
pub use positions::{
    Associable, Associated, Creatable, Deletable, Fetchable, Multiple, Relationships, Single,
    Updatable,
};
pub use transaction::in_transaction;
