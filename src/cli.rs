use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pvpass",
    version,
    about = "Generate Proxmox disk passthrough commands",
    long_about = "Lists host disks that are not part of a ZFS pool, lets you pick disks and a VM, \
                  and prints the `qm set` commands that attach the disks to free scsi slots. \
                  Nothing is executed."
)]
pub struct Cli {
    /// Path to config file [default: ~/.config/pvpass/config.toml]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Disks to pass through: 1-based indices, kernel names or by-id aliases
    #[arg(long, value_delimiter = ',', value_name = "LIST")]
    pub disks: Option<Vec<String>>,

    /// Target VM id
    #[arg(long, value_name = "VMID")]
    pub vm: Option<u32>,

    /// Print eligible disks and VMs, then exit
    #[arg(long, conflicts_with_all = ["disks", "vm"])]
    pub list: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Also write a debug log to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Interactive when stderr is a terminal, plain otherwise
    Auto,
    Interactive,
    Plain,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn disks_split_on_commas() {
        let cli = Cli::parse_from(["pvpass", "--disks", "1,sdc,1", "--vm", "100"]);
        assert_eq!(cli.disks.unwrap(), vec!["1", "sdc", "1"]);
        assert_eq!(cli.vm, Some(100));
    }

    #[test]
    fn no_flags_is_interactive() {
        let cli = Cli::parse_from(["pvpass"]);
        assert!(cli.disks.is_none());
        assert!(cli.vm.is_none());
        assert_eq!(cli.output, OutputFormat::Auto);
    }

    #[test]
    fn list_conflicts_with_selection() {
        assert!(Cli::try_parse_from(["pvpass", "--list", "--vm", "100"]).is_err());
    }
}
