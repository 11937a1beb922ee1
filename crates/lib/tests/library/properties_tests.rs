//! Properties that hold for any well-formed input, checked over a few sizes.

use ephstack_lib::catalog::parse_config_dir;
use ephstack_lib::stack::parse_stack_file;

use super::common::{Project, config_yaml, stack_yaml};

#[test]
fn stack_has_one_entry_per_app_name() {
  for count in [1usize, 3, 12] {
    let names: Vec<String> = (0..count).map(|i| format!("app{}", i)).collect();
    let apps: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "small")).collect();
    let project = Project::new().with_stack(&stack_yaml("demo", &apps));

    let stack = parse_stack_file(&project.stack_path()).unwrap();

    assert_eq!(stack.apps.len(), count);
    for name in &names {
      assert!(stack.apps.contains_key(name), "missing {}", name);
    }
  }
}

#[test]
fn catalog_keys_match_declared_clouds() {
  let project = Project::new()
    .with_config("a.yaml", &config_yaml("azure", &[("small", "ubuntu")]))
    .with_config("b.yaml", &config_yaml("aws", &[("small", "ami-1")]))
    .with_config("c/d.yaml", &config_yaml("azure", &[("small", "debian")]));

  let catalog = parse_config_dir(&project.config_dir()).unwrap();

  let clouds: Vec<_> = catalog.clouds().collect();
  assert_eq!(clouds, vec!["aws", "azure"]);
  // c/d.yaml is visited after a.yaml
  assert_eq!(catalog.profile("azure", "small").unwrap().image, "debian");
}

#[test]
fn scalar_strings_survive_unchanged() {
  let project = Project::new().with_stack(
    r#"
stack:
  name: demo
  apps:
    web1:
      infra: "small-v2 "
      config: ./conf/web.yaml
      facts:
        motd: "Hello, world: 42"
        empty: ""
"#,
  );

  let stack = parse_stack_file(&project.stack_path()).unwrap();
  let web = stack.app("web1").unwrap();

  assert_eq!(web.infra, "small-v2 ");
  assert_eq!(web.config, "./conf/web.yaml");
  assert_eq!(web.facts["motd"], "Hello, world: 42");
  assert_eq!(web.facts["empty"], "");
}
