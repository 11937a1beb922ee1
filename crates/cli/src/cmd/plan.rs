//! Implementation of the `ephstack plan` command.
//!
//! Loads the stack file and config directory, resolves every application to
//! its hardware profile and writes the resulting request to the plan store.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};

use ephstack_lib::load::load_deployment;
use ephstack_lib::plan::{PlanStore, SavedPlan};
use ephstack_lib::provision::ProvisionRequest;
use ephstack_lib::settings::ProvisionSettings;

use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

/// A resolved request, already saved as a plan.
pub struct Prepared {
  pub request: ProvisionRequest,
  pub plan: SavedPlan,
}

/// Load, validate, resolve and save.
pub fn prepare(stack_file: &Path, config_dir: &Path, settings: &ProvisionSettings) -> Result<Prepared> {
  let deployment = load_deployment(stack_file, config_dir)
    .with_context(|| format!("Failed to load deployment from {}", stack_file.display()))?;

  let request = ProvisionRequest::build(&deployment, settings).context("Failed to build provisioning request")?;

  let plan = PlanStore::default_store()
    .save(&request)
    .context("Failed to save plan")?;

  Ok(Prepared { request, plan })
}

pub fn cmd_plan(stack_file: &Path, config_dir: &Path, format: OutputFormat) -> Result<()> {
  let settings = ProvisionSettings::from_env();
  let prepared = prepare(stack_file, config_dir, &settings)?;

  if format.is_json() {
    return print_json(&prepared.request.redacted());
  }

  print_summary(&prepared.request, &prepared.plan);
  Ok(())
}

pub fn print_summary(request: &ProvisionRequest, plan: &SavedPlan) {
  print_info(&format!("Stack: {}", request.project));
  print_stat("Project", &format!("{}/{}", request.project, request.stack_name));
  print_stat("Backend", &request.backend_url);
  print_stat("Apps", &request.targets.len().to_string());
  for target in &request.targets {
    println!(
      "    {} {} {} {}/{} (image: {}, type: {}, region: {})",
      symbols::INFO,
      target.app,
      symbols::ARROW,
      target.cloud,
      target.profile.name,
      target.profile.image,
      target.profile.machine_type,
      target.region
    );
  }

  let clouds: BTreeSet<_> = request.targets.iter().map(|t| t.cloud.as_str()).collect();
  print_stat("Clouds", &clouds.into_iter().collect::<Vec<_>>().join(", "));
  if !request.plugins.is_empty() {
    let plugins: Vec<_> = request
      .plugins
      .iter()
      .map(|p| format!("{}@{}", p.name, p.version))
      .collect();
    print_stat("Plugins", &plugins.join(", "));
  }
  print_stat("Plan", &plan.id.to_string());
  print_stat("Path", &plan.path.display().to_string());
}
