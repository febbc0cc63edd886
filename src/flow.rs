//! One enumerate → choose → generate pass.

use std::io::IsTerminal;

use crate::config::Config;
use crate::disks::{self, BlockDevice};
use crate::error::PassError;
use crate::host::Host;
use crate::parse;
use crate::passthrough::{self, PassthroughAssignment};
use crate::progress::StepProgress;
use crate::select;
use crate::vms::{self, Vm, VmSummary};

/// Number of `StepProgress` steps `plan` runs.
pub const PLAN_STEPS: usize = 3;
/// Number of `StepProgress` steps `inventory` runs.
pub const INVENTORY_STEPS: usize = 2;

/// Selections made up front. `None` means ask interactively.
#[derive(Debug, Clone, Default)]
pub struct Choices {
    pub disks: Option<Vec<String>>,
    pub vmid: Option<u32>,
}

#[derive(Debug)]
pub struct Plan {
    pub vm: Vm,
    pub assignments: Vec<PassthroughAssignment>,
}

#[derive(Debug)]
pub struct Inventory {
    pub devices: Vec<BlockDevice>,
    pub vms: Vec<VmSummary>,
}

/// Enumerate, select and assign. Either every selected disk gets a slot or
/// the whole run fails.
pub async fn plan(
    host: &impl Host,
    config: &Config,
    choices: &Choices,
    progress: &mut StepProgress,
) -> Result<Plan, PassError> {
    let devices = progress
        .run("Enumerating disks", disks::enumerate(host, config))
        .await?;
    let eligible = disks::eligible(devices)?;
    progress.info(&format!("{} eligible disk(s)", eligible.len()));

    let selected = match &choices.disks {
        Some(tokens) => select::pick_disks(&eligible, tokens)?,
        None => {
            require_terminal("--disks")?;
            select::prompt_disks(&eligible)?
        }
    };

    let vms = progress.run("Listing VMs", vms::list(host)).await?;
    let summary = match choices.vmid {
        Some(vmid) => vms::find(&vms, vmid)?.clone(),
        None => {
            require_terminal("--vm")?;
            select::prompt_vm(&vms)?
        }
    };

    let vm = progress
        .run(
            &format!("Reading config of VM {}", summary.vmid),
            vms::load(host, &summary),
        )
        .await?;

    let assignments = passthrough::assign(&selected, &vm, config.passthrough.max_slot)?;
    Ok(Plan { vm, assignments })
}

/// All disks (ZFS members and alias-less ones included) and VMs, for `--list`.
/// Unlike `plan`, an empty VM list is not an error.
pub async fn inventory(
    host: &impl Host,
    config: &Config,
    progress: &mut StepProgress,
) -> Result<Inventory, PassError> {
    let devices = progress
        .run("Enumerating disks", disks::scan(host, config))
        .await?;
    let vms = progress
        .run("Listing VMs", async {
            Ok::<_, PassError>(parse::parse_qm_list(&host.qm_list().await?))
        })
        .await?;
    Ok(Inventory { devices, vms })
}

fn require_terminal(flag: &str) -> Result<(), PassError> {
    if std::io::stdin().is_terminal() {
        Ok(())
    } else {
        Err(PassError::InvalidSelection {
            message: format!("stdin is not a terminal; pass {flag}"),
        })
    }
}
