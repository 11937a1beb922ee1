//! Stack file parsing.
//!
//! A stack file declares a named stack and its application instances:
//!
//! ```yaml
//! stack:
//!   name: demo
//!   apps:
//!     web1:
//!       infra: small
//!       config: web.yaml
//!       facts:
//!         role: frontend
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, info};

use crate::document::{
  DocumentError, Entries, MergeFields, MergeSource, child_label, decode_str, fill, parse_document, read_source,
  reject_unknown_keys, require_mapping, require_string, root_mapping, string_map,
};
use crate::schema::{ApplicationInstance, Credentials, Stack};

/// Keys allowed under `stack`.
pub const STACK_FIELDS: &[&str] = &["name", "apps"];

/// Keys allowed under `stack.apps.<name>`.
pub const APP_FIELDS: &[&str] = &[
  "config",
  "infra",
  "facts",
  "tags",
  "cloud",
  "region",
  "resource_group",
  "storage",
  "credentials",
];

#[derive(Deserialize)]
struct StackDocument {
  stack: StackSection,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StackSection {
  #[serde(rename = "<<", default)]
  merge: MergeSource<StackSection>,
  name: Option<String>,
  apps: Option<Entries<Option<AppFields>>>,
}

impl MergeFields for StackSection {
  fn take_sources(&mut self) -> MergeSource<Self> {
    std::mem::take(&mut self.merge)
  }

  fn fill_from(&mut self, other: Self) {
    fill(&mut self.name, other.name);
    fill(&mut self.apps, other.apps);
  }
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AppFields {
  #[serde(rename = "<<", default)]
  merge: MergeSource<AppFields>,
  infra: Option<String>,
  config: Option<String>,
  cloud: Option<String>,
  region: Option<String>,
  resource_group: Option<String>,
  credentials: Option<CredentialFields>,
  #[serde(default, deserialize_with = "string_map")]
  facts: Option<BTreeMap<String, String>>,
  #[serde(default, deserialize_with = "string_map")]
  tags: Option<BTreeMap<String, String>>,
  storage: Option<Vec<u32>>,
}

impl MergeFields for AppFields {
  fn take_sources(&mut self) -> MergeSource<Self> {
    std::mem::take(&mut self.merge)
  }

  fn fill_from(&mut self, other: Self) {
    fill(&mut self.infra, other.infra);
    fill(&mut self.config, other.config);
    fill(&mut self.cloud, other.cloud);
    fill(&mut self.region, other.region);
    fill(&mut self.resource_group, other.resource_group);
    fill(&mut self.credentials, other.credentials);
    fill(&mut self.facts, other.facts);
    fill(&mut self.tags, other.tags);
    fill(&mut self.storage, other.storage);
  }
}

impl AppFields {
  fn into_instance(self) -> ApplicationInstance {
    let fields = self.resolve();
    ApplicationInstance {
      infra: fields.infra.unwrap_or_default(),
      config: fields.config.unwrap_or_default(),
      credentials: fields
        .credentials
        .map(CredentialFields::into_credentials)
        .unwrap_or_default(),
      facts: fields.facts.unwrap_or_default(),
      cloud: fields.cloud.unwrap_or_default(),
      region: fields.region.unwrap_or_default(),
      resource_group: fields.resource_group.unwrap_or_default(),
      tags: fields.tags.unwrap_or_default(),
      storage: fields.storage.unwrap_or_default(),
    }
  }
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CredentialFields {
  #[serde(rename = "<<", default)]
  merge: MergeSource<CredentialFields>,
  username: Option<String>,
  password: Option<String>,
  private_key: Option<String>,
}

impl MergeFields for CredentialFields {
  fn take_sources(&mut self) -> MergeSource<Self> {
    std::mem::take(&mut self.merge)
  }

  fn fill_from(&mut self, other: Self) {
    fill(&mut self.username, other.username);
    fill(&mut self.password, other.password);
    fill(&mut self.private_key, other.private_key);
  }
}

impl CredentialFields {
  fn into_credentials(self) -> Credentials {
    let fields = self.resolve();
    Credentials {
      username: fields.username.unwrap_or_default(),
      password: fields.password.unwrap_or_default(),
      private_key: fields.private_key.unwrap_or_default(),
    }
  }
}

/// Read and parse a stack file.
pub fn parse_stack_file(path: &Path) -> Result<Stack, DocumentError> {
  info!(path = %path.display(), "reading stack file");
  let content = read_source(path)?;
  parse_stack_str(&content, path)
}

/// Parse stack file content. `path` is only used for error reporting.
pub fn parse_stack_str(content: &str, path: &Path) -> Result<Stack, DocumentError> {
  let document = parse_document(content, path)?;
  check_layout(&document, path)?;

  let parsed: StackDocument = decode_str(content, path)?;
  let section = parsed.stack.resolve();
  let apps: BTreeMap<String, ApplicationInstance> = section
    .apps
    .unwrap_or_default()
    .into_iter()
    .map(|(name, app)| (name, app.map(AppFields::into_instance).unwrap_or_default()))
    .collect();

  for (name, app) in &apps {
    debug!(app = %name, infra = %app.infra, facts = app.facts.len(), "parsed application instance");
  }
  let id = section.name.unwrap_or_default();
  info!(stack = %id, apps = apps.len(), "parsed stack");

  Ok(Stack { id, apps })
}

/// Verify required sections and reject unknown keys before the typed decode.
fn check_layout(document: &Value, path: &Path) -> Result<(), DocumentError> {
  let root = root_mapping(document, path)?;
  let stack = require_mapping(root, "stack", "stack", path)?;
  let apps = require_mapping(stack, "apps", "stack.apps", path)?;
  require_string(stack, "name", "stack.name", path)?;
  reject_unknown_keys(stack, STACK_FIELDS, "stack", path)?;

  for (name, app) in apps {
    if let Value::Mapping(fields) = app {
      reject_unknown_keys(fields, APP_FIELDS, &child_label("stack.apps", name), path)?;
    }
  }

  Ok(())
}
