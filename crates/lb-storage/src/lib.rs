//! Local SQLite-backed cache (§4.1): issues, dependencies, labels, outbox,
//! and metadata, plus the reachability queries built on top of them.

pub mod dependencies;
pub mod error;
pub mod issues;
pub mod labels;
pub mod metadata;
pub mod outbox;
pub mod reachability;
pub mod schema;
pub mod store;

pub use dependencies::TreeNode;
pub use error::{Result, StorageError};
pub use issues::{IssueFilter, IssueUpdates};
pub use outbox::OutboxEntry;
pub use reachability::BlockedIssue;
pub use store::Store;
