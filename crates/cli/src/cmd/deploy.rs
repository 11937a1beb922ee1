//! Implementation of the `ephstack deploy` command.
//!
//! Plans the stack like `ephstack plan`, then hands the request to the
//! configured provisioner and reports the outputs it returns.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use ephstack_lib::provision::{CommandProvisioner, Provisioner};
use ephstack_lib::settings::ProvisionSettings;

use super::plan::{prepare, print_summary};
use crate::output::{OutputFormat, display_value, print_json, print_stat, print_success};

/// Execute the deploy command.
///
/// # Errors
///
/// Fails if the stack or config files do not load, if a target cloud cannot
/// be provisioned, if no provisioner is configured, or if the provisioner
/// itself fails.
pub fn cmd_deploy(
  stack_file: &Path,
  config_dir: &Path,
  provisioner: Option<PathBuf>,
  format: OutputFormat,
) -> Result<()> {
  let mut settings = ProvisionSettings::from_env();
  if let Some(program) = provisioner {
    settings = settings.with_provisioner(program);
  }

  let prepared = prepare(stack_file, config_dir, &settings)?;
  prepared.request.ensure_provisionable()?;

  let Some(program) = settings.provisioner.clone() else {
    bail!("no provisioner configured; pass --provisioner or set EPHSTACK_PROVISIONER");
  };

  if !format.is_json() {
    print_summary(&prepared.request, &prepared.plan);
    println!();
  }

  info!(plan = %prepared.plan.id, "deploying stack");
  let provisioner = CommandProvisioner::new(program);
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let outputs = rt
    .block_on(provisioner.up(&prepared.request))
    .with_context(|| format!("Failed to deploy stack {}", prepared.request.project))?;

  if format.is_json() {
    return print_json(&outputs);
  }

  print_success(&format!(
    "Deployed stack {} ({})",
    prepared.request.project, prepared.request.stack_name
  ));
  for (key, value) in outputs.iter() {
    print_stat(key, &display_value(value));
  }
  if let Some(ip) = outputs.ip() {
    println!("deployed server running at public IP {}", ip);
  }

  Ok(())
}
