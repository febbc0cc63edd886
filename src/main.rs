use std::io::IsTerminal;

use clap::Parser;

use pvpass::cli::{Cli, OutputFormat};
use pvpass::config;
use pvpass::disks;
use pvpass::flow::{self, Choices, INVENTORY_STEPS, PLAN_STEPS};
use pvpass::host;
use pvpass::logging;
use pvpass::passthrough::AssignmentJson;
use pvpass::progress::{OutputMode, StepProgress};

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let output_format = resolve_output_format(cli.output);
    let mode = resolve_output_mode(output_format, cli.quiet);

    logging::init(cli.verbose, cli.log_file.as_deref())?;

    let config = config::load_config(cli.config.as_deref())?;
    let host = host::create_host(&config);

    if cli.list {
        let mut progress = StepProgress::new(INVENTORY_STEPS, mode);
        let inventory = flow::inventory(&host, &config, &mut progress).await?;
        print_inventory(&inventory);
        return Ok(());
    }

    let choices = Choices {
        disks: cli.disks,
        vmid: cli.vm,
    };
    let mut progress = StepProgress::new(PLAN_STEPS, mode);
    let plan = flow::plan(&host, &config, &choices, &mut progress).await?;

    if matches!(output_format, OutputFormat::Json) {
        let rows: Vec<AssignmentJson> = plan.assignments.iter().map(|a| a.to_json()).collect();
        println!(
            "{}",
            facet_json::to_string(&rows).expect("JSON serialization")
        );
    } else {
        if mode != OutputMode::Quiet {
            eprintln!();
            eprintln!(
                "Review, then run on the host to attach to VM {} ({}):",
                plan.vm.vmid, plan.vm.name
            );
        }
        for assignment in &plan.assignments {
            println!("{assignment}");
        }
    }

    Ok(())
}

fn print_inventory(inventory: &flow::Inventory) {
    println!("Disks:");
    let mut index = 0;
    for device in &inventory.devices {
        if disks::is_eligible(device) {
            index += 1;
            println!("  [{index:>2}] {device}");
        } else {
            println!("  [ -] {device}");
        }
    }
    if index == 0 {
        println!("  (no eligible disks)");
    }

    println!();
    println!("VMs:");
    for vm in &inventory.vms {
        println!("  {vm}");
    }
    if inventory.vms.is_empty() {
        println!("  (no VMs)");
    }
}

/// Resolve `Auto` to a concrete format based on terminal detection.
fn resolve_output_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if std::io::stderr().is_terminal() {
                OutputFormat::Interactive
            } else {
                OutputFormat::Plain
            }
        }
        other => other,
    }
}

/// Map the resolved output format (plus `--quiet`) to the progress mode.
fn resolve_output_mode(format: OutputFormat, quiet: bool) -> OutputMode {
    if quiet {
        return OutputMode::Quiet;
    }
    match format {
        OutputFormat::Interactive | OutputFormat::Auto => OutputMode::Normal,
        OutputFormat::Plain | OutputFormat::Json => OutputMode::Plain,
    }
}
