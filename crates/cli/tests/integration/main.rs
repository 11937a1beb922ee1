mod common;
mod deploy_tests;
mod plan_tests;
