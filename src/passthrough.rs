//! scsi slot allocation and `qm set` command rendering.

use std::fmt;
use std::path::PathBuf;

use facet::Facet;

use crate::disks::BlockDevice;
use crate::error::PassError;
use crate::vms::Vm;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughAssignment {
    pub vmid: u32,
    pub slot: u32,
    pub device: String,
    pub by_id: PathBuf,
}

impl PassthroughAssignment {
    pub fn slot_key(&self) -> String {
        format!("scsi{}", self.slot)
    }

    pub fn command(&self) -> String {
        format!("qm set {} -{} {}", self.vmid, self.slot_key(), self.by_id.display())
    }

    pub fn to_json(&self) -> AssignmentJson {
        AssignmentJson {
            vmid: self.vmid,
            slot: self.slot_key(),
            device: self.device.clone(),
            by_id: self.by_id.display().to_string(),
            command: self.command(),
        }
    }
}

impl fmt::Display for PassthroughAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command())
    }
}

#[derive(Debug, Facet)]
pub struct AssignmentJson {
    pub vmid: u32,
    pub slot: String,
    pub device: String,
    pub by_id: String,
    pub command: String,
}

/// Assign each disk, in order, the lowest scsi slot not yet used by `vm`.
///
/// Slots handed out earlier in the same call count as used, so repeated
/// disks still get distinct slots. Fails without partial output when a disk
/// lacks a by-id path or a slot above `max_slot` would be needed.
pub fn assign(
    disks: &[BlockDevice],
    vm: &Vm,
    max_slot: u32,
) -> Result<Vec<PassthroughAssignment>, PassError> {
    let mut occupied = vm.occupied.clone();
    let mut next = 0u32;
    let mut assignments = Vec::with_capacity(disks.len());

    for disk in disks {
        let by_id = disk.by_id.clone().ok_or_else(|| PassError::NoStableId {
            device: disk.name.clone(),
        })?;

        while occupied.contains(&next) {
            next += 1;
        }
        if next > max_slot {
            return Err(PassError::SlotsExhausted {
                vmid: vm.vmid,
                max_slot,
            });
        }
        occupied.insert(next);

        tracing::debug!(vmid = vm.vmid, slot = next, device = %disk.name, "assigned slot");
        assignments.push(PassthroughAssignment {
            vmid: vm.vmid,
            slot: next,
            device: disk.name.clone(),
            by_id,
        });
    }

    Ok(assignments)
}
