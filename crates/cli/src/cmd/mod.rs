mod deploy;
mod plan;
mod show;

pub use deploy::cmd_deploy;
pub use plan::cmd_plan;
pub use show::cmd_show;
