use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PassError {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` not found")]
    #[diagnostic(help("run pvpass on a Proxmox VE host, or set the tool path under [tools]"))]
    CommandNotFound { command: String },

    #[error("`{command}` was denied: {message}")]
    #[diagnostic(help("re-run as root"))]
    PermissionDenied { command: String, message: String },

    #[error("`{command}` failed: {message}")]
    ExternalCommand { command: String, message: String },

    #[error("no eligible disks found")]
    #[diagnostic(help(
        "disks in a ZFS pool, listed in devices.exclude, or without a /dev/disk/by-id alias are skipped"
    ))]
    NoEligibleDisks,

    #[error("no VMs found")]
    NoVms,

    #[error("invalid selection: {message}")]
    InvalidSelection { message: String },

    #[error("VM {vmid} does not exist")]
    UnknownVm { vmid: u32 },

    #[error("disk {device} has no stable /dev/disk/by-id alias")]
    NoStableId { device: String },

    #[error("VM {vmid} has not enough free scsi slots in scsi0..scsi{max_slot}")]
    SlotsExhausted { vmid: u32, max_slot: u32 },

    #[error("cancelled")]
    Cancelled,
}
