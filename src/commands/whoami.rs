use async_trait::async_trait;

use super::{Command, CommandResult, HostInfo};

pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    fn name(&self) -> &str {
        "/whoami"
    }

    fn description(&self) -> &str {
        "show device id, platform and API endpoint"
    }

    async fn execute(&self, _args: &str, info: &HostInfo<'_>) -> CommandResult {
        eprintln!("  device    {}", info.device_id);
        eprintln!("  platform  {}", info.platform);
        eprintln!("  api       {}", info.base_url);
        eprintln!("  config    {}", info.db_path);
        eprintln!("  tasks     {}", info.controller.tasks().len());
        CommandResult::Handled
    }
}
