//! Config directory parsing.
//!
//! Every regular file below the config directory describes the hardware
//! profiles of one cloud:
//!
//! ```yaml
//! config:
//!   cloud: azure
//!   infra:
//!     small:
//!       image: ubuntu
//!       region: westus
//!       type: Standard_A0
//!       disk: [os]
//!       tags:
//!         env: dev
//! ```
//!
//! Files are visited in file-name order. Several files may describe the same
//! cloud; their profiles are merged and a profile defined twice keeps the
//! definition from the file visited last.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::{
  DocumentError, Entries, MergeFields, MergeSource, child_label, decode_str, fill, parse_document, read_source,
  reject_unknown_keys, require_mapping, require_string, root_mapping, string_list, string_map,
};
use crate::schema::{HardwareCatalog, HardwareProfile};

/// Keys allowed under `config`.
pub const CONFIG_FIELDS: &[&str] = &["cloud", "infra"];

/// Keys allowed under `config.infra.<profile>`.
pub const PROFILE_FIELDS: &[&str] = &["image", "region", "type", "disk", "tags"];

/// Errors that can occur while loading a config directory.
#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("unable to open config directory {}: {source}", path.display())]
  ConfigDir { path: PathBuf, source: walkdir::Error },

  #[error(transparent)]
  Document(#[from] DocumentError),
}

/// Hardware profiles declared by a single config file.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudConfig {
  pub cloud: String,
  pub profiles: BTreeMap<String, HardwareProfile>,
}

#[derive(Deserialize)]
struct ConfigDocument {
  config: ConfigSection,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigSection {
  #[serde(rename = "<<", default)]
  merge: MergeSource<ConfigSection>,
  cloud: Option<String>,
  infra: Option<Entries<Option<ProfileFields>>>,
}

impl MergeFields for ConfigSection {
  fn take_sources(&mut self) -> MergeSource<Self> {
    std::mem::take(&mut self.merge)
  }

  fn fill_from(&mut self, other: Self) {
    fill(&mut self.cloud, other.cloud);
    fill(&mut self.infra, other.infra);
  }
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileFields {
  #[serde(rename = "<<", default)]
  merge: MergeSource<ProfileFields>,
  image: Option<String>,
  region: Option<String>,
  #[serde(rename = "type")]
  machine_type: Option<String>,
  #[serde(default, deserialize_with = "string_list")]
  disk: Option<Vec<String>>,
  #[serde(default, deserialize_with = "string_map")]
  tags: Option<BTreeMap<String, String>>,
}

impl MergeFields for ProfileFields {
  fn take_sources(&mut self) -> MergeSource<Self> {
    std::mem::take(&mut self.merge)
  }

  fn fill_from(&mut self, other: Self) {
    fill(&mut self.image, other.image);
    fill(&mut self.region, other.region);
    fill(&mut self.machine_type, other.machine_type);
    fill(&mut self.disk, other.disk);
    fill(&mut self.tags, other.tags);
  }
}

impl ProfileFields {
  fn into_profile(self, name: String) -> HardwareProfile {
    let fields = self.resolve();
    HardwareProfile {
      name,
      region: fields.region.unwrap_or_default(),
      machine_type: fields.machine_type.unwrap_or_default(),
      image: fields.image.unwrap_or_default(),
      disks: fields.disk.unwrap_or_default(),
      tags: fields.tags.unwrap_or_default(),
    }
  }
}

/// List the regular files below `dir`, in file-name order.
pub fn config_files(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
  let mut files = Vec::new();
  for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
    let entry = entry.map_err(|source| CatalogError::ConfigDir {
      path: dir.to_path_buf(),
      source,
    })?;
    if entry.file_type().is_file() {
      files.push(entry.into_path());
    }
  }
  Ok(files)
}

/// Load every config file below `dir` into one catalog.
///
/// The first file that fails to parse aborts the whole pass.
pub fn parse_config_dir(dir: &Path) -> Result<HardwareCatalog, CatalogError> {
  let files = config_files(dir)?;
  info!(dir = %dir.display(), files = files.len(), "reading config directory");

  let mut catalog = HardwareCatalog::new();
  for file in &files {
    let config = parse_config_file(file)?;
    merge_into(&mut catalog, config, file);
  }

  info!(clouds = catalog.len(), "parsed hardware catalog");
  Ok(catalog)
}

/// Add one file's profiles to the catalog, later definitions winning.
pub fn merge_into(catalog: &mut HardwareCatalog, config: CloudConfig, origin: &Path) {
  catalog.ensure_cloud(&config.cloud);
  for profile in config.profiles.into_values() {
    let name = profile.name.clone();
    if catalog.insert_profile(&config.cloud, profile).is_some() {
      warn!(
        cloud = %config.cloud,
        profile = %name,
        file = %origin.display(),
        "hardware profile redefined, keeping the later definition"
      );
    }
  }
}

/// Read and parse a single config file.
pub fn parse_config_file(path: &Path) -> Result<CloudConfig, DocumentError> {
  debug!(path = %path.display(), "reading config file");
  let content = read_source(path)?;
  parse_config_str(&content, path)
}

/// Parse config file content. `path` is only used for error reporting.
pub fn parse_config_str(content: &str, path: &Path) -> Result<CloudConfig, DocumentError> {
  let document = parse_document(content, path)?;
  check_layout(&document, path)?;

  let parsed: ConfigDocument = decode_str(content, path)?;
  let section = parsed.config.resolve();
  let profiles = section
    .infra
    .unwrap_or_default()
    .into_iter()
    .map(|(name, fields)| {
      let profile = fields.unwrap_or_default().into_profile(name.clone());
      (name, profile)
    })
    .collect::<BTreeMap<_, _>>();

  let cloud = section.cloud.unwrap_or_default();
  debug!(cloud = %cloud, profiles = profiles.len(), "parsed config file");
  Ok(CloudConfig { cloud, profiles })
}

fn check_layout(document: &Value, path: &Path) -> Result<(), DocumentError> {
  let root = root_mapping(document, path)?;
  let config = require_mapping(root, "config", "config", path)?;
  if !config.contains_key("infra") {
    return Err(DocumentError::malformed(
      path,
      "'config.infra' is missing, YAML syntax is not correct",
    ));
  }
  let infra = require_mapping(config, "infra", "config.infra", path)?;
  require_string(config, "cloud", "config.cloud", path)?;
  reject_unknown_keys(config, CONFIG_FIELDS, "config", path)?;

  for (name, profile) in infra {
    if let Value::Mapping(fields) = profile {
      reject_unknown_keys(fields, PROFILE_FIELDS, &child_label("config.infra", name), path)?;
    }
  }

  Ok(())
}
