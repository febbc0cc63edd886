//! Parsers for the output of host tools.
//!
//! Each parser takes the complete stdout of one command and returns typed
//! rows. lsblk output is JSON and must decode; the text parsers never fail:
//! lines that do not fit the documented format are skipped (and logged at
//! debug level), so a new column or a stray warning line does not abort the
//! run.

use std::collections::BTreeSet;

use facet::Facet;

use crate::error::PassError;
use crate::vms::VmSummary;

// ── lsblk ────────────────────────────────────────────────

/// Arguments producing the JSON `parse_lsblk` expects: top-level devices
/// only, sizes in bytes.
pub const LSBLK_ARGS: &[&str] = &["-J", "-b", "-d", "-o", "NAME,SIZE,MODEL,SERIAL,TYPE"];

#[derive(Debug, Facet)]
struct LsblkResponse {
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Facet)]
struct LsblkDevice {
    name: String,
    #[facet(default)]
    size: Option<LsblkSize>,
    #[facet(default)]
    model: Option<String>,
    #[facet(default)]
    serial: Option<String>,
    #[facet(rename = "type")]
    kind: String,
}

/// util-linux before 2.33 prints every column as a string.
#[derive(Debug, Facet)]
#[repr(u8)]
#[facet(untagged)]
enum LsblkSize {
    Bytes(u64),
    Text(String),
}

impl LsblkSize {
    fn bytes(&self) -> u64 {
        match self {
            LsblkSize::Bytes(n) => *n,
            LsblkSize::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

/// One whole-disk row from lsblk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsblkDisk {
    pub name: String,
    pub size_bytes: u64,
    pub model: String,
    pub serial: String,
}

/// Decode `lsblk -J` output, keeping only `"type": "disk"` rows.
pub fn parse_lsblk(output: &str) -> Result<Vec<LsblkDisk>, PassError> {
    let decoded: LsblkResponse =
        facet_json::from_str(output).map_err(|e| PassError::ExternalCommand {
            command: "lsblk".into(),
            message: format!("failed to parse lsblk JSON output: {e}"),
        })?;

    let mut disks = Vec::new();
    for device in decoded.blockdevices {
        if device.kind != "disk" {
            tracing::debug!(name = %device.name, kind = %device.kind, "skipping non-disk device");
            continue;
        }
        disks.push(LsblkDisk {
            size_bytes: device.size.as_ref().map_or(0, LsblkSize::bytes),
            model: device.model.unwrap_or_default().trim().to_string(),
            serial: device.serial.unwrap_or_default().trim().to_string(),
            name: device.name,
        });
    }
    Ok(disks)
}

// ── zpool ────────────────────────────────────────────────

/// Full, symlink-resolved member paths (`/dev/sda3` rather than `ata-...`).
pub const ZPOOL_STATUS_ARGS: &[&str] = &["status", "-P", "-L"];

const VDEV_STATES: &[&str] = &[
    "ONLINE", "DEGRADED", "FAULTED", "OFFLINE", "UNAVAIL", "REMOVED", "AVAIL", "INUSE", "SPLIT",
];

/// Extract vdev and device names from `zpool status` output.
///
/// Returns the raw first column of every state-bearing row inside each
/// `config:` block (pool names excluded), plus the path from any
/// `was /dev/...` annotation on unavailable devices. Names are returned as
/// printed; normalizing them to kernel disk names is the caller's job.
pub fn parse_zpool_members(output: &str) -> Vec<String> {
    let mut members = Vec::new();
    let mut pool = String::new();
    let mut in_config = false;

    for line in output.lines() {
        let trimmed = line.trim();
        if let Some(name) = trimmed.strip_prefix("pool:") {
            pool = name.trim().to_string();
            in_config = false;
            continue;
        }
        if trimmed.starts_with("config:") {
            in_config = true;
            continue;
        }
        if trimmed.starts_with("errors:") {
            in_config = false;
            continue;
        }
        if !in_config {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.len() >= 2 && VDEV_STATES.contains(&tokens[1]) && tokens[0] != pool {
            members.push(tokens[0].to_string());
        }
        if let Some(pos) = trimmed.find("was /dev/")
            && let Some(path) = trimmed[pos + 4..].split_whitespace().next()
        {
            members.push(path.to_string());
        }
    }
    members
}

// ── qm ───────────────────────────────────────────────────

/// Parse `qm list`: a header line, then `VMID NAME STATUS ...` rows.
pub fn parse_qm_list(output: &str) -> Vec<VmSummary> {
    let mut vms = Vec::new();
    for line in output.lines().skip(1) {
        let mut cols = line.split_whitespace();
        let Some(first) = cols.next() else {
            continue;
        };
        let Ok(vmid) = first.parse::<u32>() else {
            tracing::debug!(line, "skipping qm list row without numeric VMID");
            continue;
        };
        vms.push(VmSummary {
            vmid,
            name: cols.next().unwrap_or_default().to_string(),
            status: cols.next().unwrap_or_default().to_string(),
        });
    }
    vms
}

/// Collect the `N` of every `scsiN` key in `qm config` output.
///
/// Only the current configuration counts: parsing stops at the first
/// snapshot section (`[name]`).
pub fn parse_scsi_slots(output: &str) -> BTreeSet<u32> {
    let mut slots = BTreeSet::new();
    for line in output.lines() {
        let line = line.trim_start();
        if line.starts_with('[') {
            break;
        }
        let Some(key_end) = line.find([':', '=']) else {
            continue;
        };
        let Some(digits) = line[..key_end].trim_end().strip_prefix("scsi") else {
            continue;
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if let Ok(slot) = digits.parse() {
            slots.insert(slot);
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSBLK: &str = r#"{
   "blockdevices": [
      {"name": "sda", "size": 2000398934016, "model": "Samsung SSD 870", "serial": "S6PNNX0R", "type": "disk"},
      {"name": "sr0", "size": 1073741312, "model": "QEMU DVD-ROM", "serial": "QM00003", "type": "rom"},
      {"name": "nvme0n1", "size": 512110190592, "model": "WD Blue  ", "serial": null, "type": "disk"},
      {"name": "loop0", "size": 67108864, "model": null, "serial": null, "type": "loop"}
   ]
}"#;

    #[test]
    fn lsblk_keeps_only_disks() {
        let disks = parse_lsblk(LSBLK).unwrap();
        let names: Vec<_> = disks.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["sda", "nvme0n1"]);
    }

    #[test]
    fn lsblk_fields() {
        let disks = parse_lsblk(LSBLK).unwrap();
        assert_eq!(disks[0].model, "Samsung SSD 870");
        assert_eq!(disks[0].serial, "S6PNNX0R");
        assert_eq!(disks[0].size_bytes, 2_000_398_934_016);
        assert_eq!(disks[1].model, "WD Blue");
        assert_eq!(disks[1].serial, "");
    }

    #[test]
    fn lsblk_string_sizes() {
        let disks = parse_lsblk(
            r#"{"blockdevices": [
                {"name": "sdb", "size": "4000787030016", "model": "WDC", "serial": "W1", "type": "disk"},
                {"name": "sdc", "size": "1.8T", "model": "WDC", "serial": "W2", "type": "disk"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(disks[0].size_bytes, 4_000_787_030_016);
        assert_eq!(disks[1].size_bytes, 0);
    }

    #[test]
    fn lsblk_empty_device_list() {
        assert!(parse_lsblk(r#"{"blockdevices": []}"#).unwrap().is_empty());
    }

    #[test]
    fn lsblk_invalid_json_is_an_error() {
        let err = parse_lsblk("lsblk: unknown column: SERIAL\n").unwrap_err();
        assert!(matches!(err, PassError::ExternalCommand { command, .. } if command == "lsblk"));
    }

    const ZPOOL: &str = "  pool: rpool
 state: ONLINE
config:

\tNAME           STATE     READ WRITE CKSUM
\trpool          ONLINE       0     0     0
\t  mirror-0     ONLINE       0     0     0
\t    /dev/sda3  ONLINE       0     0     0
\t    /dev/sdb3  ONLINE       0     0     0
\tspares
\t  /dev/sdf1    AVAIL

errors: No known data errors

  pool: tank
 state: DEGRADED
config:

\tNAME                      STATE     READ WRITE CKSUM
\ttank                      DEGRADED     0     0     0
\t  raidz1-0                DEGRADED     0     0     0
\t    /dev/nvme0n1p1        ONLINE       0     0     0
\t    9876543210123456789   UNAVAIL      0     0     0  was /dev/sdc1

errors: No known data errors
";

    #[test]
    fn zpool_members_across_pools() {
        let members = parse_zpool_members(ZPOOL);
        assert!(members.contains(&"/dev/sda3".to_string()));
        assert!(members.contains(&"/dev/sdb3".to_string()));
        assert!(members.contains(&"/dev/nvme0n1p1".to_string()));
    }

    #[test]
    fn zpool_spares_and_missing_devices() {
        let members = parse_zpool_members(ZPOOL);
        assert!(members.contains(&"/dev/sdf1".to_string()));
        assert!(members.contains(&"/dev/sdc1".to_string()));
    }

    #[test]
    fn zpool_excludes_pool_names_and_header() {
        let members = parse_zpool_members(ZPOOL);
        assert!(!members.contains(&"rpool".to_string()));
        assert!(!members.contains(&"tank".to_string()));
        assert!(!members.contains(&"NAME".to_string()));
    }

    #[test]
    fn zpool_no_pools() {
        assert!(parse_zpool_members("no pools available\n").is_empty());
    }

    #[test]
    fn qm_list_rows() {
        let out = "      VMID NAME                 STATUS     MEM(MB)    BOOTDISK(GB) PID
       100 debian               running    2048              32.00 1234
       101 truenas              stopped    8192              16.00 0
";
        let vms = parse_qm_list(out);
        assert_eq!(
            vms,
            vec![
                VmSummary {
                    vmid: 100,
                    name: "debian".into(),
                    status: "running".into()
                },
                VmSummary {
                    vmid: 101,
                    name: "truenas".into(),
                    status: "stopped".into()
                },
            ]
        );
    }

    #[test]
    fn qm_list_header_only() {
        assert!(parse_qm_list("      VMID NAME STATUS\n").is_empty());
    }

    #[test]
    fn scsi_slots_ignore_scsihw_and_other_buses() {
        let out = "boot: order=scsi0
scsihw: virtio-scsi-pci
scsi0: local-lvm:vm-100-disk-0,size=32G
scsi2: /dev/disk/by-id/wwn-0x5000c500a1b2c3d4,size=1T
sata0: local-lvm:vm-100-disk-1,size=8G
unused0: local-lvm:vm-100-disk-2
";
        let slots = parse_scsi_slots(out);
        assert_eq!(slots.into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn scsi_slots_stop_at_snapshot_section() {
        let out = "scsi1: local-lvm:vm-100-disk-0
[before-upgrade]
scsi5: local-lvm:vm-100-disk-5
";
        let slots = parse_scsi_slots(out);
        assert_eq!(slots.into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn scsi_slots_accept_equals_form() {
        let slots = parse_scsi_slots("scsi3=local:iso\n");
        assert!(slots.contains(&3));
    }
}
