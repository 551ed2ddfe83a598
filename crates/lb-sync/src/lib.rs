//! The outbox/background-worker protocol and the sync engine (§4.4, §4.5,
//! §4.9) -- the subsystems with no direct counterpart in the prior art.

pub mod engine;
pub mod error;
pub mod executor;
pub mod export;
pub mod launcher;
pub mod outbox_ops;
pub mod pidfile;
pub mod worker;

pub use engine::{RepoScope, SyncEngine, SyncReport};
pub use error::{Result, SyncError};
pub use executor::PushResult;
pub use pidfile::{PidFile, PidGuard};
