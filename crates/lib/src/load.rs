//! Loading a complete deployment description.
//!
//! Runs the stack parser, the config directory parser and reference
//! validation in that order. The first failing stage stops the run and
//! nothing is returned for the stages that did succeed.

use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::catalog::{CatalogError, parse_config_dir};
use crate::document::DocumentError;
use crate::schema::Deployment;
use crate::stack::parse_stack_file;
use crate::validate::{ValidationError, validate};

/// Errors from any stage of [`load_deployment`].
#[derive(Debug, Error)]
pub enum LoadError {
  #[error(transparent)]
  Stack(DocumentError),

  #[error(transparent)]
  Catalog(#[from] CatalogError),

  #[error(transparent)]
  Validation(#[from] ValidationError),
}

/// Parse `stack_file`, then every file under `config_dir`, then validate.
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use ephstack_lib::load::load_deployment;
///
/// let deployment = load_deployment(Path::new("stack.yaml"), Path::new("config"))?;
/// println!("Apps: {}", deployment.stack.apps.len());
/// ```
pub fn load_deployment(stack_file: &Path, config_dir: &Path) -> Result<Deployment, LoadError> {
  let stack = parse_stack_file(stack_file).map_err(LoadError::Stack)?;
  let catalog = parse_config_dir(config_dir)?;
  validate(&stack, &catalog)?;

  info!(stack = %stack.id, apps = stack.apps.len(), clouds = catalog.len(), "deployment loaded");
  Ok(Deployment { stack, catalog })
}
