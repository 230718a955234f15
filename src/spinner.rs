//! A terminal spinner that follows a loading-state channel.

use std::io::Write;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Braille spinner frames.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Frame interval.
const INTERVAL: Duration = Duration::from_millis(80);

fn clear_line() {
    // \x1b[2K clears the line, \r returns to its start
    eprint!("\x1b[2K\r");
    let _ = std::io::stderr().flush();
}

/// Spin on stderr while the last value seen on `loading` is `true`.
/// The task ends, clearing its line, once the channel closes.
pub fn follow(mut loading: broadcast::Receiver<bool>, message: &str) -> JoinHandle<()> {
    let message = message.to_string();

    tokio::spawn(async move {
        let mut active = false;
        let mut frame = 0;
        loop {
            let next = if active {
                eprint!("\x1b[2K\r{} {message}", FRAMES[frame % FRAMES.len()]);
                let _ = std::io::stderr().flush();
                tokio::select! {
                    _ = tokio::time::sleep(INTERVAL) => {
                        frame += 1;
                        continue;
                    }
                    next = loading.recv() => next,
                }
            } else {
                loading.recv().await
            };

            match next {
                Ok(is_loading) => {
                    if active && !is_loading {
                        clear_line();
                    }
                    active = is_loading;
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        if active {
            clear_line();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_single_braille_chars() {
        assert!(!FRAMES.is_empty());
        for frame in FRAMES {
            assert_eq!(frame.chars().count(), 1);
        }
    }

    #[tokio::test]
    async fn spinner_ends_when_channel_closes() {
        let (tx, rx) = broadcast::channel(4);
        let handle = follow(rx, "recognizing");
        tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        tx.send(false).unwrap();
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn spinner_closed_while_idle() {
        let (tx, rx) = broadcast::channel::<bool>(4);
        let handle = follow(rx, "idle");
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
