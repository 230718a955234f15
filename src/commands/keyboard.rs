use async_trait::async_trait;

use super::{Command, CommandResult, HostInfo};

/// Simulates the on-screen keyboard showing (`/keyboard 291`) or hiding
/// (`/keyboard` or `/keyboard 0`).
pub struct KeyboardCommand;

fn parse_height(args: &str) -> Option<f64> {
    if args.is_empty() {
        return Some(0.0);
    }
    args.parse::<f64>()
        .ok()
        .filter(|px| px.is_finite() && *px >= 0.0)
}

#[async_trait]
impl Command for KeyboardCommand {
    fn name(&self) -> &str {
        "/keyboard"
    }

    fn aliases(&self) -> &[&str] {
        &["/kb"]
    }

    fn description(&self) -> &str {
        "report keyboard height in pixels (0 hides it)"
    }

    async fn execute(&self, args: &str, info: &HostInfo<'_>) -> CommandResult {
        match parse_height(args) {
            Some(pixels) => info.controller.keyboard_changed(pixels),
            None => eprintln!("  usage: /keyboard <pixels>"),
        }
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::Fixture;
    use crate::platform::mock::HostEvent;
    use std::time::Duration;

    #[test]
    fn parses_heights() {
        assert_eq!(parse_height(""), Some(0.0));
        assert_eq!(parse_height("291.5"), Some(291.5));
        assert_eq!(parse_height("tall"), None);
        assert_eq!(parse_height("-3"), None);
        assert_eq!(parse_height("NaN"), None);
    }

    #[tokio::test]
    async fn empty_args_hide_the_keyboard() {
        let mut fixture = Fixture::new();
        KeyboardCommand.execute("", &fixture.info()).await;
        let event = tokio::time::timeout(Duration::from_secs(1), fixture.events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            HostEvent::Script(
                r#"window.response.receiveKeyboardHeight('{"height":"0"}');"#.to_string()
            )
        );
    }

    #[tokio::test]
    async fn bad_height_sends_nothing() {
        let mut fixture = Fixture::new();
        KeyboardCommand.execute("tall", &fixture.info()).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(fixture.events.try_recv().is_err());
    }
}
