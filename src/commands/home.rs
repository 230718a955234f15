use async_trait::async_trait;

use super::{Command, CommandResult, HostInfo};

/// Reload the content surface from the home endpoint.
pub struct HomeCommand;

#[async_trait]
impl Command for HomeCommand {
    fn name(&self) -> &str {
        "/home"
    }

    fn aliases(&self) -> &[&str] {
        &["/reload"]
    }

    fn description(&self) -> &str {
        "fetch and load the content surface"
    }

    async fn execute(&self, _args: &str, info: &HostInfo<'_>) -> CommandResult {
        if info.controller.load_home().await.is_none() {
            eprintln!("  could not load the content surface");
        }
        CommandResult::Handled
    }
}
