//! Host disk enumeration.
//!
//! Combines lsblk rows, ZFS pool membership and the by-id symlink directory
//! into a snapshot of whole disks that could be handed to a VM.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::PassError;
use crate::host::{ByIdLink, Host};
use crate::parse;
use crate::util::format_size;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    /// Kernel name, e.g. `sda`.
    pub name: String,
    pub size_bytes: u64,
    pub model: String,
    pub serial: String,
    /// Preferred `/dev/disk/by-id` path, WWN first.
    pub by_id: Option<PathBuf>,
    pub zfs_member: bool,
}

impl BlockDevice {
    pub fn by_id_alias(&self) -> Option<&str> {
        self.by_id
            .as_deref()
            .and_then(|p| p.file_name())
            .and_then(|f| f.to_str())
    }
}

impl fmt::Display for BlockDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8} {:>7}", self.name, format_size(self.size_bytes))?;
        if !self.model.is_empty() {
            write!(f, "  {}", self.model)?;
        }
        if !self.serial.is_empty() {
            write!(f, "  [{}]", self.serial)?;
        }
        match &self.by_id {
            Some(path) => write!(f, "  {}", path.display())?,
            None => write!(f, "  (no by-id alias)")?,
        }
        if self.zfs_member {
            write!(f, "  (zfs)")?;
        }
        Ok(())
    }
}

/// Every whole disk not excluded by config, with ZFS membership flagged.
pub async fn scan(host: &impl Host, config: &Config) -> Result<Vec<BlockDevice>, PassError> {
    let rows = parse::parse_lsblk(&host.lsblk().await?)?;
    let links = host.by_id_links().await?;
    let zfs = zfs_member_disks(&parse::parse_zpool_members(&host.zpool_status().await?), &links);
    tracing::debug!(?zfs, "disks claimed by ZFS");

    let aliases = aliases_by_target(&links);
    let by_id_dir = config.by_id_dir();

    let mut devices = Vec::new();
    for row in rows {
        if config.devices.exclude.iter().any(|e| *e == row.name) {
            tracing::info!(device = %row.name, "skipping excluded device");
            continue;
        }

        let by_id = aliases
            .get(row.name.as_str())
            .and_then(|a| preferred_alias(a))
            .map(|alias| by_id_dir.join(alias));

        devices.push(BlockDevice {
            zfs_member: zfs.contains(&row.name),
            name: row.name,
            size_bytes: row.size_bytes,
            model: row.model,
            serial: row.serial,
            by_id,
        });
    }
    Ok(devices)
}

/// Whole disks not claimed by ZFS or excluded by config.
///
/// Devices are returned with or without a by-id alias; use [`eligible`] to
/// get the ones that can actually be passed through.
pub async fn enumerate(host: &impl Host, config: &Config) -> Result<Vec<BlockDevice>, PassError> {
    let devices = scan(host, config)
        .await?
        .into_iter()
        .filter(|d| {
            if d.zfs_member {
                tracing::info!(device = %d.name, "skipping ZFS pool member");
            } else if d.by_id.is_none() {
                tracing::warn!(device = %d.name, "no /dev/disk/by-id alias");
            }
            !d.zfs_member
        })
        .collect();
    Ok(devices)
}

/// Devices that have a stable path and can be selected.
pub fn eligible(devices: Vec<BlockDevice>) -> Result<Vec<BlockDevice>, PassError> {
    let eligible: Vec<_> = devices.into_iter().filter(is_eligible).collect();
    if eligible.is_empty() {
        return Err(PassError::NoEligibleDisks);
    }
    Ok(eligible)
}

pub fn is_eligible(device: &BlockDevice) -> bool {
    !device.zfs_member && device.by_id.is_some()
}

/// Pick the alias to use for a device: a `wwn-` alias when one exists,
/// otherwise the first in sorted order.
pub fn preferred_alias<'a>(aliases: &[&'a str]) -> Option<&'a str> {
    let mut sorted = aliases.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .find(|a| a.starts_with("wwn-"))
        .or_else(|| sorted.first())
        .copied()
}

fn aliases_by_target(links: &[ByIdLink]) -> BTreeMap<&str, Vec<&str>> {
    let mut map: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for link in links {
        map.entry(link.target.as_str())
            .or_default()
            .push(link.alias.as_str());
    }
    map
}

/// Reduce `zpool status` member names to the kernel names of whole disks.
///
/// Members may be printed as paths (`/dev/sda3`), bare kernel names or
/// by-id aliases (`ata-XYZ-part3`); all resolve to the parent disk.
pub fn zfs_member_disks(members: &[String], links: &[ByIdLink]) -> BTreeSet<String> {
    let by_alias: BTreeMap<&str, &str> = links
        .iter()
        .map(|l| (l.alias.as_str(), l.target.as_str()))
        .collect();

    members
        .iter()
        .filter_map(|m| Path::new(m).file_name().and_then(|f| f.to_str()))
        .map(|base| {
            let kernel = by_alias
                .get(base)
                .or_else(|| strip_part_suffix(base).and_then(|a| by_alias.get(a)))
                .copied()
                .unwrap_or(base);
            parent_disk(kernel).to_string()
        })
        .collect()
}

/// `ata-XYZ-part3` → `ata-XYZ`
fn strip_part_suffix(alias: &str) -> Option<&str> {
    let (head, num) = alias.rsplit_once("-part")?;
    (!num.is_empty() && num.bytes().all(|b| b.is_ascii_digit())).then_some(head)
}

/// Kernel name of the disk a partition lives on.
///
/// `sda3` → `sda`, `nvme0n1p2` → `nvme0n1`, `mmcblk0p1` → `mmcblk0`.
/// Names that are not partitions are returned unchanged.
pub fn parent_disk(name: &str) -> &str {
    let trimmed = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.len() == name.len() {
        return name;
    }

    // nvme0n1p2 style: digit, 'p', partition number
    if let Some(head) = trimmed.strip_suffix('p')
        && head.ends_with(|c: char| c.is_ascii_digit())
    {
        return head;
    }

    const LETTER_DISKS: &[&str] = &["sd", "vd", "hd", "xvd"];
    if LETTER_DISKS.iter().any(|p| trimmed.starts_with(p)) && trimmed.len() > 2 {
        return trimmed;
    }
    name
}
