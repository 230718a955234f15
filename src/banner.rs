//! Startup banner and session farewell, printed to stderr.

use crate::consts::{AUTHOR, HOMEPAGE, REPO};

/// Session configuration for display in the startup banner.
pub struct BannerInfo<'a> {
    pub base_url: &'a str,
    pub device_id: &'a str,
    pub platform: &'a str,
    pub recognizer: &'a str,
    pub commands: &'a [&'static str],
}

pub fn banner_text(info: &BannerInfo) -> String {
    format!(
        r#"
   ╔═══════════════════════════════════════╗
   ║              M I S I K                ║
   ║     receipts in, reviews out          ║
   ╚═══════════════════════════════════════╝

   version   {}
   by        {}
   home      {}
   repo      {}
   api       {}
   device    {}
   platform  {}
   ocr       {}
   bridge    {}
"#,
        env!("CARGO_PKG_VERSION"),
        AUTHOR,
        HOMEPAGE,
        REPO,
        info.base_url,
        info.device_id,
        info.platform,
        info.recognizer,
        info.commands.join(", "),
    )
}

/// Print the startup banner with session info.
pub fn print_banner(info: &BannerInfo) {
    eprint!("{}", banner_text(info));
}

/// Print the farewell, noting any work abandoned on exit.
pub fn print_session_summary(cancelled: usize) {
    if cancelled > 0 {
        eprintln!("cancelled {cancelled} pending task(s)");
    }
    eprintln!("goodbye.");
}
