//! Deploy command integration tests.
//!
//! A shell script stands in for the infrastructure-automation program.

use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

#[test]
#[serial]
fn deploy_without_provisioner_fails() {
  let env = TestEnv::from_fixture("stack.yaml");

  env
    .cmd()
    .arg("deploy")
    .arg(&env.stack_path)
    .assert()
    .failure()
    .stderr(predicate::str::contains("no provisioner configured"));
}

#[test]
#[serial]
fn deploy_unsupported_cloud_fails() {
  let env = TestEnv::from_fixture("aws_stack.yaml");

  env
    .cmd()
    .arg("deploy")
    .arg(&env.stack_path)
    .arg("--provisioner")
    .arg("/nonexistent/provisioner")
    .assert()
    .failure()
    .stderr(predicate::str::contains("cloud 'aws'"));
}

#[cfg(unix)]
#[test]
#[serial]
fn deploy_reports_public_ip() {
  let env = TestEnv::from_fixture("stack.yaml");
  let provisioner = env.write_provisioner("cat > /dev/null\necho '{\"ip\": \"10.0.0.4\"}'");

  env
    .cmd()
    .arg("deploy")
    .arg(&env.stack_path)
    .arg("--provisioner")
    .arg(&provisioner)
    .assert()
    .success()
    .stdout(predicate::str::contains("Deployed stack demo (dev)"))
    .stdout(predicate::str::contains("deployed server running at public IP 10.0.0.4"));
}

#[cfg(unix)]
#[test]
#[serial]
fn deploy_sends_unredacted_request() {
  let env = TestEnv::from_fixture("stack.yaml");
  let captured = env.temp.path().join("request.json");
  let provisioner = env.write_provisioner(&format!("cat > {}", captured.display()));

  env
    .cmd()
    .arg("deploy")
    .arg(&env.stack_path)
    .env("EPHSTACK_PROVISIONER", &provisioner)
    .assert()
    .success();

  let request: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(captured).unwrap()).unwrap();
  assert_eq!(request["project"], "demo");
  let web = request["targets"]
    .as_array()
    .unwrap()
    .iter()
    .find(|t| t["app"] == "web1")
    .unwrap();
  assert_eq!(web["credentials"]["password"], "hunter2");
  assert_eq!(web["profile"]["type"], "Standard_A0");
}

#[cfg(unix)]
#[test]
#[serial]
fn deploy_json_outputs() {
  let env = TestEnv::from_fixture("stack.yaml");
  let provisioner = env.write_provisioner("cat > /dev/null\necho '{\"ip\": \"10.0.0.4\", \"vms\": 2}'");

  let output = env
    .cmd()
    .arg("deploy")
    .arg(&env.stack_path)
    .arg("--provisioner")
    .arg(&provisioner)
    .arg("--output")
    .arg("json")
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["ip"], "10.0.0.4");
  assert_eq!(json["vms"], 2);
}

#[cfg(unix)]
#[test]
#[serial]
fn deploy_provisioner_failure_fails() {
  let env = TestEnv::from_fixture("stack.yaml");
  let provisioner = env.write_provisioner("cat > /dev/null\nexit 2");

  env
    .cmd()
    .arg("deploy")
    .arg(&env.stack_path)
    .arg("--provisioner")
    .arg(&provisioner)
    .assert()
    .failure()
    .stderr(predicate::str::contains("exit code Some(2)"));
}
