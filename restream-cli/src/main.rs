//! restream CLI - resumable HTTP(S) downloads from the command line.
//!
//! Thin frontend over the `restream` library: parses arguments, opens a
//! resumable stream and copies it to a file or stdout with a progress bar.
//! All reconnect behavior lives in the library.

mod error;

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use restream::{LimitedRetryPolicy, ReqwestConnector, ResumableHttpStream, Url};

use crate::error::CliError;

/// Copy buffer size (64KB).
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Download an HTTP(S) resource, transparently resuming dropped connections.
#[derive(Debug, Parser)]
#[command(name = "restream", version, about)]
struct Args {
    /// URL to download.
    url: String,

    /// Output file; defaults to the last URL path segment. Use `-` for stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Proxy URL to route the download through.
    #[arg(long)]
    proxy: Option<String>,

    /// Maximum reconnect attempts before giving up.
    #[arg(long, default_value_t = restream::DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Suppress the progress bar.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    match run(&args) {
        Ok(bytes) => {
            tracing::info!(bytes, url = %args.url, "Download complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("restream: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args) -> Result<u64, CliError> {
    let url = Url::parse(&args.url)
        .map_err(|e| CliError::Usage(format!("invalid URL {}: {}", args.url, e)))?;

    let connector = match &args.proxy {
        Some(proxy) => {
            let proxy = restream::Proxy::all(proxy.as_str())
                .map_err(|e| CliError::Usage(format!("invalid proxy {}: {}", proxy, e)))?;
            ReqwestConnector::with_proxy(proxy)
        }
        None => ReqwestConnector::new(),
    };
    let policy = LimitedRetryPolicy::new(args.max_retries);

    let mut stream = ResumableHttpStream::with_connector(
        url.clone(),
        Box::new(connector),
        Box::new(policy),
    )?;

    let mut sink = open_output(args.output.as_deref(), &url)?;
    let progress = (!args.quiet).then(|| make_progress(stream.total_len()));

    let mut written: u64 = 0;
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n])?;
        written += n as u64;
        if let Some(bar) = &progress {
            bar.set_position(written);
        }
    }
    sink.flush()?;
    if let Some(bar) = &progress {
        bar.finish();
    }

    Ok(written)
}

/// Resolve the output sink: an explicit path, stdout for `-`, or a file
/// named after the last URL path segment.
fn open_output(output: Option<&std::path::Path>, url: &Url) -> Result<Box<dyn Write>, CliError> {
    let path = match output {
        Some(path) if path.as_os_str() == "-" => return Ok(Box::new(io::stdout())),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_file_name(url)),
    };
    let file = File::create(&path)
        .map_err(|e| CliError::Usage(format!("cannot create {}: {}", path.display(), e)))?;
    Ok(Box::new(file))
}

fn default_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("download.bin")
        .to_string()
}

fn make_progress(total: Option<u64>) -> ProgressBar {
    match total {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template(
                    "{bar:40} {bytes}/{total_bytes} {bytes_per_sec} eta {eta}",
                )
                .expect("valid progress template"),
            );
            bar
        }
        None => ProgressBar::new_spinner(),
    }
}
