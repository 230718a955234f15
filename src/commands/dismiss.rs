use async_trait::async_trait;

use super::{Command, CommandResult, HostInfo};

/// Simulates the user closing the scan screen.
pub struct DismissCommand;

#[async_trait]
impl Command for DismissCommand {
    fn name(&self) -> &str {
        "/dismiss"
    }

    fn description(&self) -> &str {
        "close the scan screen, abandoning recognition and parsing"
    }

    async fn execute(&self, _args: &str, info: &HostInfo<'_>) -> CommandResult {
        info.controller.recognition_dismissed();
        CommandResult::Handled
    }
}
