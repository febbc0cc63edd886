pub mod system;

use crate::config::Config;
use crate::error::PassError;

/// One `/dev/disk/by-id` symlink: `alias` is the link name, `target` the
/// basename of what it points at (`sda`, `sda1`, `nvme0n1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByIdLink {
    pub alias: String,
    pub target: String,
}

/// Raw access to the host's storage and hypervisor state.
///
/// Implementations return tool output verbatim; `crate::parse` turns it
/// into typed rows.
#[allow(async_fn_in_trait)] // trait is internal-only
pub trait Host {
    /// stdout of `lsblk` invoked with `parse::LSBLK_ARGS`.
    async fn lsblk(&self) -> Result<String, PassError>;
    /// stdout of `zpool` invoked with `parse::ZPOOL_STATUS_ARGS`.
    async fn zpool_status(&self) -> Result<String, PassError>;
    /// stdout of `qm list`.
    async fn qm_list(&self) -> Result<String, PassError>;
    /// stdout of `qm config <vmid>`.
    async fn qm_config(&self, vmid: u32) -> Result<String, PassError>;
    /// Symlinks in the by-id directory, sorted by alias.
    async fn by_id_links(&self) -> Result<Vec<ByIdLink>, PassError>;
}

pub fn create_host(config: &Config) -> system::SystemHost {
    system::SystemHost::new(config)
}
