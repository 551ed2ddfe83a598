pub mod auth;
pub mod blocked;
pub mod close;
pub mod create;
pub mod delete;
pub mod dep;
pub mod export;
pub mod import;
pub mod init;
pub mod list;
pub mod migrate;
pub mod onboard;
pub mod ready;
pub mod show;
pub mod sync_cmd;
pub mod update;
pub mod whoami;
