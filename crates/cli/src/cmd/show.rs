//! Implementation of the `ephstack show` command.

use anyhow::{Context, Result};

use ephstack_lib::plan::{PlanStore, SavedPlan};
use ephstack_lib::util::hash::ObjectHash;

use super::plan::print_summary;
use crate::output::{OutputFormat, print_json};

/// Print a stored plan, as `plan` printed it when it was saved.
pub fn cmd_show(id: &str, format: OutputFormat) -> Result<()> {
  let store = PlanStore::default_store();
  let request = store
    .load(id)
    .with_context(|| format!("Failed to load plan {}", id))?;

  if format.is_json() {
    return print_json(&request);
  }

  let plan = SavedPlan {
    id: ObjectHash(id.to_string()),
    path: store.plan_path(id),
  };
  print_summary(&request, &plan);
  Ok(())
}
