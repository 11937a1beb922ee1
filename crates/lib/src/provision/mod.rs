//! Handing a validated deployment to the provisioning collaborator.
//!
//! The collaborator (an infrastructure-automation program) owns the resource
//! graph, state backend and apply cycle. ephstack only builds a
//! [`ProvisionRequest`] describing what to create and reads back the output
//! values the collaborator reports.

mod command;

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{CloudKind, Credentials, Deployment, HardwareProfile, PluginSpec};
use crate::settings::ProvisionSettings;
use crate::util::hash::Hashable;
use crate::validate::{ReferenceProblem, resolve};

pub use command::CommandProvisioner;

/// Errors that can occur while preparing or running provisioning.
#[derive(Debug, Error)]
pub enum ProvisionError {
  #[error("cannot resolve app '{app}': {problem}")]
  Unresolved { app: String, problem: ReferenceProblem },

  #[error("app '{app}' targets cloud '{cloud}', which cannot be provisioned (supported: azure)")]
  UnsupportedCloud { app: String, cloud: String },

  #[error("failed to start provisioner {program}: {source}")]
  Spawn { program: String, source: std::io::Error },

  #[error("provisioner {program} failed with exit code {code:?}")]
  Failed { program: String, code: Option<i32> },

  #[error("failed to encode provisioning request: {0}")]
  Encode(#[source] serde_json::Error),

  #[error("provisioner {program} returned invalid outputs: {reason}")]
  Outputs { program: String, reason: String },
}

/// One application resolved against its hardware profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionTarget {
  pub app: String,
  pub cloud: String,
  pub profile: HardwareProfile,
  /// App region, else profile region, else the settings location.
  pub region: String,
  pub resource_group: String,
  /// Profile tags overlaid with the app's tags.
  pub tags: BTreeMap<String, String>,
  pub config: String,
  pub facts: BTreeMap<String, String>,
  pub storage: Vec<u32>,
  pub credentials: Credentials,
}

/// Everything the collaborator needs to provision a stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionRequest {
  /// Project name, taken from the stack id.
  pub project: String,
  pub stack_name: String,
  pub backend_url: String,
  pub location: String,
  /// Provider plugins required by the targeted clouds.
  pub plugins: Vec<PluginSpec>,
  pub targets: Vec<ProvisionTarget>,
}

impl Hashable for ProvisionRequest {}

impl ProvisionRequest {
  /// Resolve every application of a deployment into a target.
  pub fn build(deployment: &Deployment, settings: &ProvisionSettings) -> Result<Self, ProvisionError> {
    let mut targets = Vec::with_capacity(deployment.stack.apps.len());
    let mut plugins = BTreeSet::new();

    for (name, app) in &deployment.stack.apps {
      let (cloud, profile) =
        resolve(name, app, &deployment.catalog).map_err(|problem| ProvisionError::Unresolved {
          app: name.clone(),
          problem,
        })?;

      if let Some(plugin) = CloudKind::parse(cloud).and_then(|kind| kind.plugin()) {
        plugins.insert(plugin);
      }

      let region = [&app.region, &profile.region, &settings.location]
        .into_iter()
        .find(|r| !r.is_empty())
        .cloned()
        .unwrap_or_default();

      let mut tags = profile.tags.clone();
      tags.extend(app.tags.iter().map(|(k, v)| (k.clone(), v.clone())));

      targets.push(ProvisionTarget {
        app: name.clone(),
        cloud: cloud.to_string(),
        profile: profile.clone(),
        region,
        resource_group: app.resource_group.clone(),
        tags,
        config: app.config.clone(),
        facts: app.facts.clone(),
        storage: app.storage.clone(),
        credentials: app.credentials.clone(),
      });
    }

    Ok(Self {
      project: deployment.stack.id.clone(),
      stack_name: settings.stack_name.clone(),
      backend_url: settings.backend_url.clone(),
      location: settings.location.clone(),
      plugins: plugins.into_iter().collect(),
      targets,
    })
  }

  /// Fail on the first target whose cloud cannot be provisioned.
  pub fn ensure_provisionable(&self) -> Result<(), ProvisionError> {
    for target in &self.targets {
      let supported = CloudKind::parse(&target.cloud).is_some_and(|kind| kind.is_provisionable());
      if !supported {
        return Err(ProvisionError::UnsupportedCloud {
          app: target.app.clone(),
          cloud: target.cloud.clone(),
        });
      }
    }
    Ok(())
  }

  /// Copy with every target's secrets blanked out.
  pub fn redacted(&self) -> Self {
    let mut copy = self.clone();
    for target in &mut copy.targets {
      target.credentials = target.credentials.redacted();
    }
    copy
  }
}

/// Output values reported by the collaborator after provisioning.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvisionOutputs(pub BTreeMap<String, serde_json::Value>);

impl ProvisionOutputs {
  pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
    self.0.get(key)
  }

  /// The public IP address, when reported as the `ip` output.
  pub fn ip(&self) -> Option<&str> {
    self.get("ip").and_then(|v| v.as_str())
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
    self.0.iter()
  }
}

/// An infrastructure-automation backend able to bring a stack up.
pub trait Provisioner {
  fn up(&self, request: &ProvisionRequest) -> impl Future<Output = Result<ProvisionOutputs, ProvisionError>> + Send;
}
