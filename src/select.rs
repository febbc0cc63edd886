use inquire::{MultiSelect, Select};

use crate::disks::BlockDevice;
use crate::error::PassError;
use crate::vms::VmSummary;

// ── explicit selections ──────────────────────────────────

/// Resolve disk selection tokens against the eligible list.
///
/// A numeric token is a 1-based index; anything else must equal a kernel
/// name or a by-id alias. Order and duplicates are preserved.
pub fn pick_disks(
    eligible: &[BlockDevice],
    tokens: &[String],
) -> Result<Vec<BlockDevice>, PassError> {
    if tokens.is_empty() {
        return Err(PassError::InvalidSelection {
            message: "no disks selected".into(),
        });
    }

    tokens
        .iter()
        .map(|raw| {
            let token = raw.trim();
            if token.is_empty() {
                return Err(PassError::InvalidSelection {
                    message: "empty disk entry".into(),
                });
            }
            if let Ok(index) = token.parse::<usize>() {
                return index
                    .checked_sub(1)
                    .and_then(|i| eligible.get(i))
                    .cloned()
                    .ok_or_else(|| PassError::InvalidSelection {
                        message: format!(
                            "disk index {index} out of range (1..={})",
                            eligible.len()
                        ),
                    });
            }
            eligible
                .iter()
                .find(|d| d.name == token || d.by_id_alias() == Some(token))
                .cloned()
                .ok_or_else(|| PassError::InvalidSelection {
                    message: format!("'{token}' is not an eligible disk"),
                })
        })
        .collect()
}

// ── interactive prompts ──────────────────────────────────

pub fn prompt_disks(eligible: &[BlockDevice]) -> Result<Vec<BlockDevice>, PassError> {
    let chosen = MultiSelect::new("Disks to pass through:", eligible.to_vec())
        .with_help_message("space to toggle, enter to confirm")
        .with_page_size(15)
        .prompt()
        .map_err(map_inquire_err)?;

    if chosen.is_empty() {
        return Err(PassError::InvalidSelection {
            message: "no disks selected".into(),
        });
    }
    Ok(chosen)
}

pub fn prompt_vm(vms: &[VmSummary]) -> Result<VmSummary, PassError> {
    Select::new("Target VM:", vms.to_vec())
        .with_page_size(15)
        .prompt()
        .map_err(map_inquire_err)
}

// ── error mapping ────────────────────────────────────────

fn map_inquire_err(e: inquire::InquireError) -> PassError {
    match e {
        inquire::InquireError::OperationCanceled | inquire::InquireError::OperationInterrupted => {
            PassError::Cancelled
        }
        inquire::InquireError::NotTTY => PassError::InvalidSelection {
            message: "stdin is not a terminal; pass --disks and --vm".into(),
        },
        other => PassError::Validation {
            message: format!("prompt error: {other}"),
        },
    }
}
