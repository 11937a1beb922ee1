//! Stack, application and hardware catalog types.
//!
//! # Stack file
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
//!
//! # Config file
//!
//! ```yaml
//! config:
//!   cloud: azure
//!   infra:
//!     small:
//!       image: ubuntu
//!       region: westus
//!       type: Standard_A0
//!       disk: [os, data]
//!       tags:
//!         env: dev
//! ```
//!
//! All maps are [`BTreeMap`]s so that listings and serialized plans come out in
//! a stable order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named deployment unit composed of application instances.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Stack {
  /// The `stack.name` value. Used as the project name when provisioning.
  pub id: String,
  /// Application instances keyed by name.
  pub apps: BTreeMap<String, ApplicationInstance>,
}

impl Stack {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      apps: BTreeMap::new(),
    }
  }

  pub fn app(&self, name: &str) -> Option<&ApplicationInstance> {
    self.apps.get(name)
  }
}

/// One deployable unit of a stack.
///
/// Only `infra` is needed to resolve a hardware profile; every other field
/// defaults to empty.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ApplicationInstance {
  /// Name of a hardware profile in the catalog.
  pub infra: String,
  /// Pointer to the application's configuration blob.
  pub config: String,
  pub credentials: Credentials,
  pub facts: BTreeMap<String, String>,
  /// Restricts `infra` resolution to one cloud. Empty means any cloud.
  pub cloud: String,
  /// Overrides the profile's region.
  pub region: String,
  pub resource_group: String,
  /// Overlaid on top of the profile's tags.
  pub tags: BTreeMap<String, String>,
  /// Extra disk sizes in GB.
  pub storage: Vec<u32>,
}

/// Login material for an application's machine.
///
/// Stored in plain text; `Debug` output hides the secrets.
#[derive(Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Credentials {
  pub username: String,
  pub password: String,
  pub private_key: String,
}

impl Credentials {
  /// Copy with the password and private key blanked out.
  pub fn redacted(&self) -> Self {
    Self {
      username: self.username.clone(),
      password: redact(&self.password),
      private_key: redact(&self.private_key),
    }
  }
}

fn redact(secret: &str) -> String {
  if secret.is_empty() {
    String::new()
  } else {
    "<redacted>".to_string()
  }
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("password", &redact(&self.password))
      .field("private_key", &redact(&self.private_key))
      .finish()
  }
}

/// A named machine template available on one cloud.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HardwareProfile {
  /// Profile name, taken from its key under `config.infra`.
  pub name: String,
  pub region: String,
  #[serde(rename = "type")]
  pub machine_type: String,
  pub image: String,
  #[serde(rename = "disk")]
  pub disks: Vec<String>,
  pub tags: BTreeMap<String, String>,
}

/// Hardware profiles of every cloud, keyed by cloud name then profile name.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareCatalog {
  clouds: BTreeMap<String, BTreeMap<String, HardwareProfile>>,
}

impl HardwareCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a cloud without adding profiles to it.
  pub fn ensure_cloud(&mut self, cloud: &str) {
    self.clouds.entry(cloud.to_string()).or_default();
  }

  /// Insert a profile, returning the definition it replaced if any.
  pub fn insert_profile(&mut self, cloud: &str, profile: HardwareProfile) -> Option<HardwareProfile> {
    self
      .clouds
      .entry(cloud.to_string())
      .or_default()
      .insert(profile.name.clone(), profile)
  }

  pub fn profile(&self, cloud: &str, name: &str) -> Option<&HardwareProfile> {
    self.clouds.get(cloud).and_then(|profiles| profiles.get(name))
  }

  /// Cloud names in sorted order.
  pub fn clouds(&self) -> impl Iterator<Item = &str> {
    self.clouds.keys().map(String::as_str)
  }

  /// Every cloud that defines a profile called `name`.
  pub fn find_profile(&self, name: &str) -> Vec<(&str, &HardwareProfile)> {
    self
      .clouds
      .iter()
      .filter_map(|(cloud, profiles)| profiles.get(name).map(|p| (cloud.as_str(), p)))
      .collect()
  }

  /// Number of clouds.
  pub fn len(&self) -> usize {
    self.clouds.len()
  }

  pub fn is_empty(&self) -> bool {
    self.clouds.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, HardwareProfile>)> {
    self.clouds.iter().map(|(cloud, profiles)| (cloud.as_str(), profiles))
  }
}

/// A stack together with the catalog its infra references resolve against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deployment {
  pub stack: Stack,
  pub catalog: HardwareCatalog,
}

/// Cloud providers known to ephstack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudKind {
  Vsphere,
  Aws,
  Azure,
}

impl CloudKind {
  pub fn parse(name: &str) -> Option<Self> {
    match name.to_ascii_lowercase().as_str() {
      "vsphere" => Some(Self::Vsphere),
      "aws" => Some(Self::Aws),
      "azure" => Some(Self::Azure),
      _ => None,
    }
  }

  /// Whether machines on this cloud can be provisioned.
  pub fn is_provisionable(&self) -> bool {
    matches!(self, Self::Azure)
  }

  /// Provider plugin the automation engine needs for this cloud.
  pub fn plugin(&self) -> Option<PluginSpec> {
    match self {
      Self::Azure => Some(PluginSpec::new("azure", "v4.0.0")),
      Self::Vsphere | Self::Aws => None,
    }
  }
}

/// A provider plugin name and version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginSpec {
  pub name: String,
  pub version: String,
}

impl PluginSpec {
  pub fn new(name: &str, version: &str) -> Self {
    Self {
      name: name.to_string(),
      version: version.to_string(),
    }
  }
}
