//! Plan storage.
//!
//! A plan is a provisioning request with its secrets redacted, written under
//! its content hash so that re-planning an unchanged stack reuses the same
//! directory.
//!
//! # Storage Layout
//!
//! ```text
//! {data_dir}/plans/
//! └── <id>/
//!     └── request.json
//! ```

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::consts::OBJ_HASH_PREFIX_LEN;
use crate::platform::paths::plans_dir;
use crate::provision::ProvisionRequest;
use crate::util::hash::{HashError, Hashable, ObjectHash};

/// File name of the stored request within a plan directory.
const REQUEST_FILENAME: &str = "request.json";

/// Errors that can occur when storing or loading plans.
#[derive(Debug, Error)]
pub enum PlanError {
  #[error("failed to hash plan: {0}")]
  Hash(#[source] HashError),

  #[error("failed to create plan directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to write plan: {0}")]
  Write(#[source] io::Error),

  #[error("failed to read plan: {0}")]
  Read(#[source] io::Error),

  #[error("failed to serialize plan: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to parse plan: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("plan not found: {0}")]
  NotFound(String),
}

/// A plan written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPlan {
  pub id: ObjectHash,
  pub path: PathBuf,
}

/// Reads and writes plans below a base directory.
#[derive(Debug, Clone)]
pub struct PlanStore {
  base_path: PathBuf,
}

impl PlanStore {
  pub fn new(base_path: PathBuf) -> Self {
    Self { base_path }
  }

  /// Store at the platform data directory (e.g. `~/.local/share/ephstack/plans`).
  pub fn default_store() -> Self {
    Self::new(plans_dir())
  }

  /// Where the request of plan `id` is stored.
  pub fn plan_path(&self, id: &str) -> PathBuf {
    self.base_path.join(id).join(REQUEST_FILENAME)
  }

  /// Redact and persist a request.
  ///
  /// Uses atomic write (write to temp, then rename) to prevent corruption.
  pub fn save(&self, request: &ProvisionRequest) -> Result<SavedPlan, PlanError> {
    let redacted = request.redacted();
    let id = redacted.compute_hash().map_err(PlanError::Hash)?;

    let dir = self.base_path.join(&id.0);
    fs::create_dir_all(&dir).map_err(PlanError::CreateDir)?;

    let path = dir.join(REQUEST_FILENAME);
    let temp_path = dir.join(format!("{}.tmp", REQUEST_FILENAME));
    let content = serde_json::to_string_pretty(&redacted).map_err(PlanError::Serialize)?;
    fs::write(&temp_path, content).map_err(PlanError::Write)?;
    fs::rename(&temp_path, &path).map_err(PlanError::Write)?;

    debug!(id = %id, path = %path.display(), "saved plan");
    Ok(SavedPlan { id, path })
  }

  /// Load a stored plan by id.
  ///
  /// An id that is not a plan hash is reported as `NotFound`.
  pub fn load(&self, id: &str) -> Result<ProvisionRequest, PlanError> {
    if !is_plan_id(id) {
      return Err(PlanError::NotFound(id.to_string()));
    }
    let path = self.plan_path(id);
    let content = fs::read_to_string(&path).map_err(|e| {
      if e.kind() == io::ErrorKind::NotFound {
        PlanError::NotFound(id.to_string())
      } else {
        PlanError::Read(e)
      }
    })?;
    debug!(id, path = %path.display(), "loaded plan");
    serde_json::from_str(&content).map_err(PlanError::Parse)
  }
}

fn is_plan_id(id: &str) -> bool {
  id.len() == OBJ_HASH_PREFIX_LEN && id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
