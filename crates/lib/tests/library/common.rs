//! Shared helpers for library tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A scratch project with a stack file and a `config/` directory.
pub struct Project {
  pub temp: TempDir,
}

impl Project {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("config")).unwrap();
    Self { temp }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn stack_path(&self) -> PathBuf {
    self.root().join("stack.yaml")
  }

  pub fn config_dir(&self) -> PathBuf {
    self.root().join("config")
  }

  pub fn with_stack(self, content: &str) -> Self {
    std::fs::write(self.stack_path(), content).unwrap();
    self
  }

  /// Write a file relative to the config directory.
  pub fn with_config(self, relative: &str, content: &str) -> Self {
    let path = self.config_dir().join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
    self
  }
}

/// A stack file with one app per `(name, infra)` pair.
pub fn stack_yaml(name: &str, apps: &[(&str, &str)]) -> String {
  let mut yaml = format!("stack:\n  name: {}\n  apps:\n", name);
  for (app, infra) in apps {
    yaml.push_str(&format!("    {}:\n      infra: {}\n", app, infra));
  }
  yaml
}

/// A config file for `cloud` with one profile per `(name, image)` pair.
pub fn config_yaml(cloud: &str, profiles: &[(&str, &str)]) -> String {
  let mut yaml = format!("config:\n  cloud: {}\n  infra:\n", cloud);
  for (profile, image) in profiles {
    yaml.push_str(&format!("    {}:\n      image: {}\n", profile, image));
  }
  yaml
}
