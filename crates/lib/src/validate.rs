//! Cross-reference validation between a stack and the hardware catalog.
//!
//! Every application instance must name exactly one hardware profile. All
//! problems are collected so a single run reports every broken reference.

use std::fmt;

use thiserror::Error;

use crate::schema::{ApplicationInstance, HardwareCatalog, HardwareProfile, Stack};

/// One broken reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceProblem {
  EmptyStack,
  MissingInfra { app: String },
  UnknownCloud { app: String, cloud: String },
  Unresolved { app: String, infra: String, cloud: Option<String> },
  Ambiguous { app: String, infra: String, clouds: Vec<String> },
}

impl fmt::Display for ReferenceProblem {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::EmptyStack => write!(f, "stack declares no applications"),
      Self::MissingInfra { app } => write!(f, "app '{}' has no infra reference", app),
      Self::UnknownCloud { app, cloud } => {
        write!(f, "app '{}' targets cloud '{}' which has no config file", app, cloud)
      }
      Self::Unresolved {
        app,
        infra,
        cloud: Some(cloud),
      } => write!(f, "app '{}' references infra '{}' which is not defined for cloud '{}'", app, infra, cloud),
      Self::Unresolved { app, infra, cloud: None } => {
        write!(f, "app '{}' references infra '{}' which is not defined for any cloud", app, infra)
      }
      Self::Ambiguous { app, infra, clouds } => write!(
        f,
        "app '{}' references infra '{}' which is defined for several clouds ({}); set 'cloud' to choose one",
        app,
        infra,
        clouds.join(", ")
      ),
    }
  }
}

/// Validation failed with one or more problems.
#[derive(Debug, Error)]
#[error("stack '{stack}' has {} unresolved reference(s):\n{}", problems.len(), format_problems(problems))]
pub struct ValidationError {
  pub stack: String,
  pub problems: Vec<ReferenceProblem>,
}

fn format_problems(problems: &[ReferenceProblem]) -> String {
  problems
    .iter()
    .map(|p| format!("  - {}", p))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Check that every application resolves to exactly one hardware profile.
pub fn validate(stack: &Stack, catalog: &HardwareCatalog) -> Result<(), ValidationError> {
  let mut problems = Vec::new();

  if stack.apps.is_empty() {
    problems.push(ReferenceProblem::EmptyStack);
  }

  for (name, app) in &stack.apps {
    if let Err(problem) = resolve(name, app, catalog) {
      problems.push(problem);
    }
  }

  if problems.is_empty() {
    Ok(())
  } else {
    Err(ValidationError {
      stack: stack.id.clone(),
      problems,
    })
  }
}

/// Find the cloud and profile an application's infra reference points at.
pub fn resolve<'c>(
  name: &str,
  app: &ApplicationInstance,
  catalog: &'c HardwareCatalog,
) -> Result<(&'c str, &'c HardwareProfile), ReferenceProblem> {
  if app.infra.is_empty() {
    return Err(ReferenceProblem::MissingInfra { app: name.to_string() });
  }

  if !app.cloud.is_empty() {
    let Some((cloud, profiles)) = catalog.iter().find(|(cloud, _)| *cloud == app.cloud) else {
      return Err(ReferenceProblem::UnknownCloud {
        app: name.to_string(),
        cloud: app.cloud.clone(),
      });
    };
    return profiles
      .get(&app.infra)
      .map(|profile| (cloud, profile))
      .ok_or_else(|| ReferenceProblem::Unresolved {
        app: name.to_string(),
        infra: app.infra.clone(),
        cloud: Some(app.cloud.clone()),
      });
  }

  let mut found = catalog.find_profile(&app.infra);
  match found.len() {
    0 => Err(ReferenceProblem::Unresolved {
      app: name.to_string(),
      infra: app.infra.clone(),
      cloud: None,
    }),
    1 => Ok(found.remove(0)),
    _ => Err(ReferenceProblem::Ambiguous {
      app: name.to_string(),
      infra: app.infra.clone(),
      clouds: found.iter().map(|(cloud, _)| cloud.to_string()).collect(),
    }),
  }
}
