use async_trait::async_trait;

use super::{Command, CommandResult, HostInfo};

/// Listed for discovery; the registry renders the text itself.
pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "/help"
    }

    fn aliases(&self) -> &[&str] {
        &["/h", "/?"]
    }

    fn description(&self) -> &str {
        "list commands"
    }

    async fn execute(&self, _args: &str, _info: &HostInfo<'_>) -> CommandResult {
        CommandResult::Handled
    }
}
