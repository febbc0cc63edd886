#![allow(unused_assignments)] // thiserror/miette proc macros trigger false positives

pub mod cli;
pub mod config;
pub mod disks;
pub mod error;
pub mod flow;
pub mod host;
pub mod logging;
pub mod parse;
pub mod passthrough;
pub mod paths;
pub mod progress;
pub mod select;
pub mod util;
pub mod vms;
