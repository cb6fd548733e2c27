use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::error;

use srcdoc_preview::console::DEFAULT_MAX_ENTRIES;
use srcdoc_preview::server::{run_dev_server, DevOptions};
use srcdoc_preview::telemetry::{self, LogFormat};
use srcdoc_preview::{PreviewConfig, PreviewError};

#[derive(Parser)]
#[command(name = "preview", version)]
#[command(about = "Live preview for HTML, CSS and JS snippets")]
struct Cli {
    /// Log line format
    #[arg(long, global = true, value_enum, env = "PREVIEW_LOG_FORMAT", default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the live-preview dev server
    Dev {
        /// Project directory with index.html, style.css and script.js
        dir: Option<PathBuf>,

        /// Server port
        #[arg(long, env = "PREVIEW_PORT", default_value_t = 3333)]
        port: u16,

        /// Address to bind
        #[arg(long, env = "PREVIEW_HOST", default_value = "127.0.0.1")]
        host: IpAddr,

        /// Quiet period after the last edit before reloading (milliseconds)
        #[arg(long, env = "PREVIEW_DEBOUNCE_MS", default_value_t = 800)]
        debounce_ms: u64,

        /// Console entries kept before the oldest are dropped
        #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES)]
        max_log_entries: usize,
    },

    /// Write the preview document for a project directory
    Render {
        /// Project directory with index.html, style.css and script.js
        dir: PathBuf,

        /// Write output to file instead of stdout
        #[arg(short)]
        o: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = telemetry::init(cli.log_format) {
        eprintln!("error: {e}");
        process::exit(1);
    }

    let result = match cli.command {
        Commands::Dev {
            dir,
            port,
            host,
            debounce_ms,
            max_log_entries,
        } => {
            let opts = DevOptions {
                dir,
                addr: SocketAddr::new(host, port),
                config: PreviewConfig::default()
                    .with_debounce(Duration::from_millis(debounce_ms))
                    .with_max_log_entries(max_log_entries),
            };
            run_dev(opts)
        }
        Commands::Render { dir, o } => render(dir, o),
    };

    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run_dev(opts: DevOptions) -> Result<(), PreviewError> {
    let rt = tokio::runtime::Runtime::new().map_err(PreviewError::Runtime)?;
    rt.block_on(run_dev_server(opts))
}

fn render(dir: PathBuf, o: Option<PathBuf>) -> Result<(), PreviewError> {
    let document = srcdoc_preview::render_dir(&dir)?;
    match o {
        Some(path) => {
            fs::write(&path, document.as_str()).map_err(|e| PreviewError::io(&path, e))?;
            eprintln!("wrote {} ({} bytes)", path.display(), document.len());
        }
        None => print!("{document}"),
    }
    Ok(())
}
