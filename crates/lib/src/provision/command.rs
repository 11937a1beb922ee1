//! Provisioning through an external program.
//!
//! The program is invoked as `<program> [args...] up` with the JSON request on stdin
//! and the project, stack, backend and location in its environment. Its
//! stderr is inherited so progress streams straight to the terminal; stdout
//! must be empty or a JSON object of output values.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::{ProvisionError, ProvisionOutputs, ProvisionRequest, Provisioner};

/// Runs an external automation program for each request.
#[derive(Debug, Clone)]
pub struct CommandProvisioner {
  program: PathBuf,
  args: Vec<String>,
}

impl CommandProvisioner {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  /// Add an argument placed before `up`.
  pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  fn program_name(&self) -> String {
    self.program.display().to_string()
  }
}

impl Provisioner for CommandProvisioner {
  async fn up(&self, request: &ProvisionRequest) -> Result<ProvisionOutputs, ProvisionError> {
    let payload = serde_json::to_vec(request).map_err(ProvisionError::Encode)?;
    info!(program = %self.program.display(), project = %request.project, stack = %request.stack_name, "running provisioner");

    let mut child = Command::new(&self.program)
      .args(&self.args)
      .arg("up")
      .env("EPHSTACK_PROJECT", &request.project)
      .env("EPHSTACK_STACK", &request.stack_name)
      .env("EPHSTACK_BACKEND_URL", &request.backend_url)
      .env("EPHSTACK_LOCATION", &request.location)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::inherit())
      .spawn()
      .map_err(|source| ProvisionError::Spawn {
        program: self.program_name(),
        source,
      })?;

    // Write the request while stdout is being drained.
    let stdin = child.stdin.take();
    let write_request = async move {
      if let Some(mut stdin) = stdin {
        // A program that exits without reading its input closes the pipe early.
        if let Err(e) = stdin.write_all(&payload).await {
          debug!(error = %e, "provisioner did not read the full request");
        }
      }
    };

    let ((), output) = tokio::join!(write_request, child.wait_with_output());
    let output = output.map_err(|source| ProvisionError::Spawn {
      program: self.program_name(),
      source,
    })?;

    if !output.status.success() {
      return Err(ProvisionError::Failed {
        program: self.program_name(),
        code: output.status.code(),
      });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stdout = stdout.trim();
    if stdout.is_empty() {
      return Ok(ProvisionOutputs::default());
    }
    debug!(stdout = %stdout, "provisioner output");

    serde_json::from_str(stdout).map_err(|e| ProvisionError::Outputs {
      program: self.program_name(),
      reason: e.to_string(),
    })
  }
}
