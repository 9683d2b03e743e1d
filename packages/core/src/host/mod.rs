//! Host store module
//!
//! Loads SSH hosts from JSON store files and SSH config files, cleans and
//! validates them, and writes them back:
//! - Host schema, JSON codec and SSH config codec
//! - Cleaning, alias resolution and DNS canonicalization
//! - Find/add/merge of hosts between stores and ranked search

mod alias;
mod canonical;
mod clean;
mod error;
mod merge;
mod schema;
mod search;
mod ssh_config;
mod storage;
mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use alias::{AliasCollision, AliasMap};
pub use canonical::{Canonical, Resolve, SystemResolver, canonicalize, is_host_like, is_ip};
pub use clean::{DEFAULT_PORT, clean_host};
pub use error::StoreError;
pub use merge::{AddOutcome, FindResult, HostSearch, MergeSummary, host_diff};
pub use schema::{HostMeta, HostRecord, SWITCH_OFF, StoreData, StoreMeta};
pub use ssh_config::{STAMP_FORMAT, display_key, known_key, render_host};
pub use storage::{deep_merge, parse_host_json, parse_json};
pub use store::{ConfigStore, DEFAULT_TEAM_KEYS_IDENTIFIER, TeamKey, TeamKeys, TeamMember};
