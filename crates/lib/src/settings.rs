//! Provisioning settings.
//!
//! Defaults match a local file backend and the `dev` stack in `westus`. Each
//! value can be overridden through an `EPHSTACK_*` environment variable.

use std::path::PathBuf;

use crate::consts::ENV_PREFIX;
use crate::platform::paths::home_dir;

pub const DEFAULT_STACK_NAME: &str = "dev";
pub const DEFAULT_LOCATION: &str = "westus";

/// Settings handed to the provisioning collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionSettings {
  /// Stack name within the project (`EPHSTACK_STACK`).
  pub stack_name: String,
  /// Default cloud location (`EPHSTACK_LOCATION`).
  pub location: String,
  /// State backend URL (`EPHSTACK_BACKEND_URL`).
  pub backend_url: String,
  /// Program that performs provisioning (`EPHSTACK_PROVISIONER`).
  pub provisioner: Option<PathBuf>,
}

impl ProvisionSettings {
  /// Build settings from the environment, falling back to defaults.
  pub fn from_env() -> Self {
    Self {
      stack_name: env_var("STACK").unwrap_or_else(|| DEFAULT_STACK_NAME.to_string()),
      location: env_var("LOCATION").unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
      backend_url: env_var("BACKEND_URL").unwrap_or_else(default_backend_url),
      provisioner: env_var("PROVISIONER").map(PathBuf::from),
    }
  }

  pub fn with_provisioner(mut self, program: PathBuf) -> Self {
    self.provisioner = Some(program);
    self
  }
}

/// Local file backend under the user's home directory.
pub fn default_backend_url() -> String {
  format!("file://{}", home_dir().join(".pulumi").display())
}

fn env_var(suffix: &str) -> Option<String> {
  std::env::var(format!("{}_{}", ENV_PREFIX, suffix))
    .ok()
    .filter(|value| !value.is_empty())
}
