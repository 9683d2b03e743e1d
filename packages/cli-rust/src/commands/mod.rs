//! CLI command implementations
//!
//! One module per subcommand. Commands that change JSON files back them up,
//! clean, write, re-export the SSH config and sync.

mod add;
mod clean;
mod config;
mod delete_host;
mod edit_host;
mod export;
mod import;
mod init_host;
mod merge;
mod search;
mod sync;

pub use add::{AddArgs, cmd_add};
pub use clean::{CleanArgs, cmd_clean};
pub use config::{ConfigArgs, cmd_config};
pub use delete_host::{DeleteHostArgs, cmd_delete_host};
pub use edit_host::{EditHostArgs, cmd_edit_host};
pub use export::{ExportArgs, cmd_export};
pub use import::{ImportArgs, cmd_import};
pub use init_host::{InitHostArgs, cmd_init_host};
pub use merge::{MergeArgs, cmd_merge};
pub use search::{ListArgs, SearchArgs, cmd_list, cmd_search};
pub use sync::{SyncArgs, cmd_sync};
