use async_trait::async_trait;

use super::{Command, CommandResult, HostInfo};

pub struct QuitCommand;

#[async_trait]
impl Command for QuitCommand {
    fn name(&self) -> &str {
        "/quit"
    }

    fn aliases(&self) -> &[&str] {
        &["quit", "exit", "/exit"]
    }

    fn description(&self) -> &str {
        "cancel pending work and exit"
    }

    async fn execute(&self, _args: &str, _info: &HostInfo<'_>) -> CommandResult {
        CommandResult::Quit
    }
}
