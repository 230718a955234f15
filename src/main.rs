use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use misik::banner::{BannerInfo, print_banner, print_session_summary};
use misik::bridge::command::COMMAND_NAMES;
use misik::bridge::{BridgeCommand, BridgeController, BridgeMessage};
use misik::commands::{CommandRegistry, CommandResult, HostInfo};
use misik::config::{ClientSettings, Config};
use misik::consts::{DEFAULT_BASE_URL, DEFAULT_PLATFORM, default_db_path};
use misik::logging;
use misik::platform::Platform;
use misik::platform::terminal::{
    BrowserUpdatePrompt, FilePicker, MemoryClipboard, SpinnerRecognitionSurface, StdoutSurface,
    TerminalShare,
};
use misik::recognition::tesseract::{DEFAULT_LANGUAGES, TesseractConfig, TesseractRecognizer};
use misik::review::http::HttpReviewClient;

#[derive(Parser)]
#[command(
    name = "misik",
    version,
    about = "Terminal host for the Misik bridge: bridge messages in on stdin, script calls out on stdout."
)]
struct Cli {
    /// Review service base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// SQLite database path for persisted settings (use :memory: for ephemeral)
    #[arg(short, long)]
    db: Option<String>,

    /// Platform tag sent with every request
    #[arg(long, default_value = DEFAULT_PLATFORM)]
    platform: String,

    /// Pause before each script call into the content surface, in milliseconds
    #[arg(long, default_value_t = 500)]
    delivery_delay_ms: u64,

    /// HTTP request timeout in seconds (0 disables it)
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    /// Image returned when the surface opens the camera
    #[arg(long)]
    camera: Option<PathBuf>,

    /// Image returned when the surface opens the gallery
    #[arg(long)]
    gallery: Option<PathBuf>,

    /// Path to the tesseract binary
    #[arg(long, default_value = "tesseract")]
    tesseract: PathBuf,

    /// Recognition languages, tesseract style
    #[arg(long, default_value = DEFAULT_LANGUAGES)]
    languages: String,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Do not fetch and load the content surface at startup
    #[arg(long, default_value_t = false)]
    no_home: bool,
}

fn open_config(db: Option<String>) -> anyhow::Result<(Config, String)> {
    let path = match db {
        Some(path) => path,
        None => {
            let path = default_db_path()?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            path.to_string_lossy().into_owned()
        }
    };
    let config = Config::open(&path)?;
    Ok((config, path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let (config, db_path) = open_config(cli.db)?;
    let device_id = config.device_id()?;

    let mut settings = ClientSettings::new(device_id.clone());
    settings.base_url = cli.base_url;
    settings.platform = cli.platform;
    settings.request_timeout = (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout));
    settings.delivery_delay = Duration::from_millis(cli.delivery_delay_ms);

    let recognizer_label = format!("{} ({})", cli.tesseract.display(), cli.languages);
    let recognizer = TesseractRecognizer::new(TesseractConfig {
        binary: cli.tesseract,
        languages: cli.languages,
    });

    let platform = Platform {
        picker: Arc::new(FilePicker {
            camera: cli.camera,
            gallery: cli.gallery,
        }),
        share: Arc::new(TerminalShare),
        clipboard: Arc::new(MemoryClipboard::default()),
        prompt: Arc::new(BrowserUpdatePrompt { open_browser: true }),
        content: Arc::new(StdoutSurface),
        recognition: Arc::new(SpinnerRecognitionSurface),
    };

    let delivery_delay = settings.delivery_delay;
    let base_url = settings.base_url.clone();
    let platform_tag = settings.platform.clone();
    let review = HttpReviewClient::new(settings)?;
    let controller = BridgeController::new(
        Arc::new(review),
        Arc::new(recognizer),
        platform,
        delivery_delay,
    );

    print_banner(&BannerInfo {
        base_url: &base_url,
        device_id: &device_id,
        platform: &platform_tag,
        recognizer: &recognizer_label,
        commands: &COMMAND_NAMES,
    });

    if !cli.no_home {
        controller.load_home().await;
    }

    BridgeCommand::register(|name| debug!(name, "bridge channel registered"));

    let commands = CommandRegistry::new();
    let info = HostInfo {
        base_url: &base_url,
        device_id: &device_id,
        platform: &platform_tag,
        db_path: &db_path,
        controller: &controller,
    };

    // REPL on async stdin so Ctrl+C is caught at the prompt too
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        eprint!("misik> ");
        io::stderr().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        eprintln!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {e}");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match commands.dispatch(input, &info).await {
            CommandResult::Quit => break,
            CommandResult::Handled => continue,
            CommandResult::NotACommand => {}
        }

        match serde_json::from_str::<BridgeMessage>(input) {
            Ok(message) => controller.handle_message(&message),
            Err(e) => {
                warn!(error = %e, "input is neither a command nor a bridge message");
                eprintln!("expected a /command or a bridge message like {{\"name\":\"openCamera\"}}");
            }
        }
    }

    let pending = controller.tasks().pending();
    controller.tasks().cancel_all();
    print_session_summary(pending);
    Ok(())
}
