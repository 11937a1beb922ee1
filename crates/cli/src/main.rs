use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ephstack_lib::consts::DEFAULT_CONFIG_DIR;

mod cmd;
mod output;

use output::OutputFormat;

/// ephstack - deploy application stacks onto per-cloud hardware profiles
#[derive(Parser)]
#[command(name = "ephstack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Deploy the app(s) specified in the stack file
  Deploy {
    /// Path to the stack file
    stack_file: PathBuf,

    /// Directory of per-cloud config files
    #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    /// Program that performs provisioning (overrides EPHSTACK_PROVISIONER)
    #[arg(long)]
    provisioner: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show what would be deployed without provisioning anything
  Plan {
    /// Path to the stack file
    stack_file: PathBuf,

    /// Directory of per-cloud config files
    #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,

    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show a previously saved plan
  Show {
    /// Plan id printed by `plan` or `deploy`
    plan_id: String,

    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn init_logging(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let result = match cli.command {
    Commands::Deploy {
      stack_file,
      config_dir,
      provisioner,
      output,
    } => cmd::cmd_deploy(&stack_file, &config_dir, provisioner, output),
    Commands::Plan {
      stack_file,
      config_dir,
      output,
    } => cmd::cmd_plan(&stack_file, &config_dir, output),
    Commands::Show { plan_id, output } => cmd::cmd_show(&plan_id, output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      output::print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
