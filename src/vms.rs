use std::collections::BTreeSet;
use std::fmt;

use crate::error::PassError;
use crate::host::Host;
use crate::parse;

/// A VM as reported by `qm list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmSummary {
    pub vmid: u32,
    pub name: String,
    pub status: String,
}

impl fmt::Display for VmSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6} {:<24} {}", self.vmid, self.name, self.status)
    }
}

/// A selected VM together with the scsi slots its config already uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vm {
    pub vmid: u32,
    pub name: String,
    pub occupied: BTreeSet<u32>,
}

/// All VMs known to the hypervisor, in `qm list` order.
pub async fn list(host: &impl Host) -> Result<Vec<VmSummary>, PassError> {
    let vms = parse::parse_qm_list(&host.qm_list().await?);
    if vms.is_empty() {
        return Err(PassError::NoVms);
    }
    Ok(vms)
}

/// Find `vmid` among the listed VMs.
pub fn find(vms: &[VmSummary], vmid: u32) -> Result<&VmSummary, PassError> {
    vms.iter()
        .find(|vm| vm.vmid == vmid)
        .ok_or(PassError::UnknownVm { vmid })
}

/// Read the VM's current config and collect its occupied scsi slots.
pub async fn load(host: &impl Host, summary: &VmSummary) -> Result<Vm, PassError> {
    let occupied = parse::parse_scsi_slots(&host.qm_config(summary.vmid).await?);
    tracing::debug!(vmid = summary.vmid, ?occupied, "occupied scsi slots");
    Ok(Vm {
        vmid: summary.vmid,
        name: summary.name.clone(),
        occupied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;

    const QM_LIST: &str = "      VMID NAME                 STATUS     MEM(MB)    BOOTDISK(GB) PID
       100 debian               running    2048              32.00 1234
       105 truenas              stopped    8192              16.00 0
";

    fn host() -> FakeHost {
        let mut host = FakeHost {
            qm_list: QM_LIST.into(),
            ..Default::default()
        };
        host.qm_configs.insert(
            105,
            "scsihw: virtio-scsi-single\nscsi0: local-lvm:vm-105-disk-0,size=16G\nscsi2: /dev/disk/by-id/wwn-0x1,size=4T\n"
                .into(),
        );
        host
    }

    #[tokio::test]
    async fn list_in_order() {
        let vms = list(&host()).await.unwrap();
        let ids: Vec<_> = vms.iter().map(|v| v.vmid).collect();
        assert_eq!(ids, vec![100, 105]);
    }

    #[tokio::test]
    async fn empty_list_is_error() {
        let host = FakeHost {
            qm_list: "      VMID NAME STATUS MEM(MB) BOOTDISK(GB) PID\n".into(),
            ..Default::default()
        };
        assert!(matches!(list(&host).await, Err(PassError::NoVms)));
    }

    #[tokio::test]
    async fn load_collects_occupied_slots() {
        let host = host();
        let vms = list(&host).await.unwrap();
        let vm = load(&host, find(&vms, 105).unwrap()).await.unwrap();
        assert_eq!(vm.name, "truenas");
        assert_eq!(vm.occupied.into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[tokio::test]
    async fn load_propagates_qm_failure() {
        let host = host();
        let vms = list(&host).await.unwrap();
        let err = load(&host, find(&vms, 100).unwrap()).await.unwrap_err();
        assert!(matches!(err, PassError::ExternalCommand { .. }));
    }

    #[test]
    fn find_unknown_vmid() {
        let vms = vec![VmSummary {
            vmid: 100,
            name: "debian".into(),
            status: "running".into(),
        }];
        assert!(matches!(find(&vms, 999), Err(PassError::UnknownVm { vmid: 999 })));
    }
}
