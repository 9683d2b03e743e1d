//! pssh-core - Core library for pssh
//!
//! Keeps SSH host definitions in JSON store files, cleans and validates
//! them, and exports them as an OpenSSH client config. The `pssh` CLI is a
//! thin shell over this crate.

pub mod config;
pub mod host;
pub mod report;
pub mod version;

pub use config::{Environment, Settings, load_settings, save_settings};
pub use host::{AddOutcome, ConfigStore, HostRecord, HostSearch, StoreError};
pub use report::{RecordingReporter, Reporter, TracingReporter};
pub use version::{get_version, get_version_long};
