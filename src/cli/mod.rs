//! Command-line interface definitions for the `mcn-conform` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Parser, Subcommand};

/// Top-level CLI for the `mcn-conform` binary.
#[derive(Debug, Parser)]
#[command(
    name = "mcn-conform",
    about = "Exercise a multi-cloud network provisioning API and report conformance",
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Subcommands of `mcn-conform`.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Create many VPCs, one per CIDR block.
    #[command(name = "bulk-vpc")]
    BulkVpc(BulkVpcCommand),
    /// Create many subnets inside an existing VPC.
    #[command(name = "bulk-subnet")]
    BulkSubnet(BulkSubnetCommand),
    /// Delete VPCs by id.
    #[command(name = "delete-vpc")]
    DeleteVpc(DeleteCommand),
    /// Delete subnets by id.
    #[command(name = "delete-subnet")]
    DeleteSubnet(DeleteCommand),
    /// Run one built-in scenario.
    #[command(name = "scenario")]
    Scenario(ScenarioCommand),
    /// Probe the configured health endpoint.
    #[command(name = "health")]
    Health,
}

/// Arguments for `mcn-conform bulk-vpc`.
#[derive(Debug, Parser)]
pub(crate) struct BulkVpcCommand {
    /// Number of VPCs to create.
    #[arg(value_name = "COUNT")]
    pub(crate) count: usize,
    /// CIDR blocks, one per iteration; at least COUNT are required.
    #[arg(value_name = "CIDR", required = true)]
    pub(crate) cidrs: Vec<String>,
    /// Delete every recovered VPC once the run completes.
    #[arg(long)]
    pub(crate) teardown: bool,
}

/// Arguments for `mcn-conform bulk-subnet`.
#[derive(Debug, Parser)]
pub(crate) struct BulkSubnetCommand {
    /// Parent VPC id (must start with `vpc-`).
    #[arg(long, value_name = "ID")]
    pub(crate) vpc_id: String,
    /// Number of subnets to create.
    #[arg(value_name = "COUNT")]
    pub(crate) count: usize,
    /// CIDR blocks, one per iteration; at least COUNT are required.
    #[arg(value_name = "CIDR", required = true)]
    pub(crate) cidrs: Vec<String>,
    /// Delete every recovered subnet once the run completes.
    #[arg(long)]
    pub(crate) teardown: bool,
}

/// Arguments for the delete subcommands.
#[derive(Debug, Parser)]
pub(crate) struct DeleteCommand {
    /// Identifiers to delete, in order.
    #[arg(value_name = "ID", required = true)]
    pub(crate) ids: Vec<String>,
}

/// Arguments for `mcn-conform scenario`.
#[derive(Debug, Parser)]
pub(crate) struct ScenarioCommand {
    /// Scenario name: create-vpc, create-subnet, delete-vpc, or delete-subnet.
    #[arg(value_name = "NAME")]
    pub(crate) name: String,
    /// File holding the `key=value` field table.
    #[arg(long, value_name = "PATH")]
    pub(crate) fields: Option<String>,
    /// Resource id for delete scenarios.
    #[arg(long, value_name = "ID")]
    pub(crate) target_id: Option<String>,
}
