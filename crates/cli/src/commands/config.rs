//! Config command handler.

use clap::Args;
use kbrag_core::{config::AppConfig, AppResult};

/// Show the resolved configuration
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Also check that a query could be issued with this configuration
    #[arg(long)]
    pub check: bool,
}

impl ConfigCommand {
    /// Execute the config command.
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing config command");

        print!("{}", config.to_redacted_yaml()?);

        if self.check {
            config.validate()?;
            println!("# configuration is complete");
        }

        Ok(())
    }
}
