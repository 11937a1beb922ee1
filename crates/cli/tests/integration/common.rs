//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the stack file, the
/// `config` directory and the plan store.
pub struct TestEnv {
  pub temp: TempDir,
  pub stack_path: PathBuf,
}

impl TestEnv {
  /// Copy a stack fixture and the fixture config directory into a temp dir.
  pub fn from_fixture(stack: &str) -> Self {
    let env = Self::empty();
    std::fs::write(&env.stack_path, fixture_content(stack)).unwrap();
    for name in ["azure.yaml", "aws.yaml"] {
      env.write_file(&format!("config/{}", name), &fixture_content(&format!("config/{}", name)));
    }
    env
  }

  /// Create an empty test environment.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let stack_path = temp.path().join("stack.yaml");
    Self { temp, stack_path }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Write an executable shell script acting as the provisioner.
  #[cfg(unix)]
  pub fn write_provisioner(&self, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = self.write_file("provision.sh", &format!("#!/bin/sh\n{}\n", body));
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
  }

  /// Data path for plans.
  pub fn data_path(&self) -> PathBuf {
    let p = self.temp.path().join("data");
    std::fs::create_dir_all(&p).unwrap();
    p
  }

  pub fn plans_path(&self) -> PathBuf {
    self.data_path().join("ephstack").join("plans")
  }

  /// Get a pre-configured Command for the ephstack binary.
  ///
  /// Runs inside the temp dir so the default `config` directory resolves
  /// there, with the plan store and home directory isolated.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("ephstack");
    cmd.current_dir(self.temp.path());
    cmd.env("XDG_DATA_HOME", self.data_path());
    cmd.env("APPDATA", self.data_path()); // For Windows
    cmd.env("HOME", self.temp.path());
    for var in [
      "EPHSTACK_STACK",
      "EPHSTACK_LOCATION",
      "EPHSTACK_BACKEND_URL",
      "EPHSTACK_PROVISIONER",
    ] {
      cmd.env_remove(var);
    }
    cmd
  }
}

/// Every stored plan request below `plans`.
pub fn stored_plans(plans: &Path) -> Vec<PathBuf> {
  let Ok(entries) = std::fs::read_dir(plans) else {
    return Vec::new();
  };
  entries
    .filter_map(|e| e.ok())
    .map(|e| e.path().join("request.json"))
    .filter(|p| p.exists())
    .collect()
}
