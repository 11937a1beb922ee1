//! Plan command integration tests.

use predicates::prelude::*;
use serial_test::serial;

use super::common::{TestEnv, stored_plans};

#[test]
#[serial]
fn plan_shows_resolved_apps() {
  let env = TestEnv::from_fixture("stack.yaml");

  env
    .cmd()
    .arg("plan")
    .arg(&env.stack_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Stack: demo"))
    .stdout(predicate::str::contains("web1 → azure/small"))
    .stdout(predicate::str::contains("db1 → azure/medium"))
    .stdout(predicate::str::contains("azure@v4.0.0"));
}

#[test]
#[serial]
fn plan_stores_redacted_request() {
  let env = TestEnv::from_fixture("stack.yaml");

  env.cmd().arg("plan").arg(&env.stack_path).assert().success();

  let plans = stored_plans(&env.plans_path());
  assert_eq!(plans.len(), 1);
  let content = std::fs::read_to_string(&plans[0]).unwrap();
  assert!(content.contains("<redacted>"));
  assert!(!content.contains("hunter2"));
}

#[test]
#[serial]
fn plan_twice_reuses_plan() {
  let env = TestEnv::from_fixture("stack.yaml");

  env.cmd().arg("plan").arg(&env.stack_path).assert().success();
  env.cmd().arg("plan").arg(&env.stack_path).assert().success();

  assert_eq!(stored_plans(&env.plans_path()).len(), 1);
}

#[test]
#[serial]
fn plan_json_output() {
  let env = TestEnv::from_fixture("stack.yaml");

  let output = env
    .cmd()
    .arg("plan")
    .arg(&env.stack_path)
    .arg("--output")
    .arg("json")
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["project"], "demo");
  assert_eq!(json["stack_name"], "dev");
  assert_eq!(json["targets"].as_array().unwrap().len(), 2);

  let web = json["targets"]
    .as_array()
    .unwrap()
    .iter()
    .find(|t| t["app"] == "web1")
    .unwrap();
  assert_eq!(web["region"], "eastus");
  assert_eq!(web["facts"]["replicas"], "2");
  assert_eq!(web["tags"]["env"], "dev");
  assert_eq!(web["tags"]["team"], "web");
  assert_eq!(web["credentials"]["password"], "<redacted>");
}

#[test]
#[serial]
fn plan_honors_stack_and_location_env() {
  let env = TestEnv::from_fixture("stack.yaml");

  let output = env
    .cmd()
    .arg("plan")
    .arg(&env.stack_path)
    .arg("--output")
    .arg("json")
    .env("EPHSTACK_STACK", "prod")
    .env("EPHSTACK_LOCATION", "northeurope")
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["stack_name"], "prod");
  assert_eq!(json["location"], "northeurope");
}

#[test]
#[serial]
fn plan_with_explicit_config_dir() {
  let env = TestEnv::empty();
  std::fs::write(&env.stack_path, super::common::fixture_content("stack.yaml")).unwrap();
  env.write_file(
    "hardware/azure.yaml",
    &super::common::fixture_content("config/azure.yaml"),
  );

  env
    .cmd()
    .arg("plan")
    .arg(&env.stack_path)
    .arg("--config-dir")
    .arg(env.temp.path().join("hardware"))
    .assert()
    .success()
    .stdout(predicate::str::contains("Clouds: azure"));
}

#[test]
#[serial]
fn plan_reports_unexpected_field() {
  let env = TestEnv::from_fixture("stack.yaml");
  env.write_file("stack.yaml", "stack:\n  name: demo\n  apps:\n    web1:\n      infra: small\n      bogus: 1\n");

  env
    .cmd()
    .arg("plan")
    .arg(&env.stack_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("unexpected field 'bogus'"))
    .stderr(predicate::str::contains("stack.apps.web1"));
}

#[test]
#[serial]
fn plan_reports_unresolved_infra() {
  let env = TestEnv::from_fixture("stack.yaml");
  env.write_file("stack.yaml", "stack:\n  name: demo\n  apps:\n    web1:\n      infra: huge\n");

  env
    .cmd()
    .arg("plan")
    .arg(&env.stack_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("infra 'huge'"));
}

#[test]
#[serial]
fn plan_missing_config_dir_fails() {
  let env = TestEnv::empty();
  std::fs::write(&env.stack_path, super::common::fixture_content("stack.yaml")).unwrap();

  env
    .cmd()
    .arg("plan")
    .arg(&env.stack_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load deployment from"))
    .stderr(predicate::str::contains("config directory"));
}
