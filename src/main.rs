use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use wireprobe::http::headers::{base_request, parse_header_lines, request_id};
use wireprobe::http::tls::KeyLogSink;
use wireprobe::http::{self, ClientConfig, Protocol, Target};

#[derive(Parser)]
#[command(name = "wireprobe")]
#[command(about = "Send one raw HTTP/2 or HTTP/3 request and print the response", long_about = None)]
struct Cli {
    /// Target URL, e.g. https://example.com/path
    target: String,

    /// Protocol to use: h2 or h3
    #[arg(short, long, default_value = "h2", value_parser = ["h2", "h3"])]
    protocol: String,

    /// Overall timeout in seconds
    #[arg(short, long, default_value = "10")]
    timeout: u64,

    /// Write TLS secrets to this file (NSS key log format)
    #[arg(short = 'k', long = "keylogfile")]
    keylog: Option<PathBuf>,

    /// Extra header, "name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Add an x-id header with a random UUID and print it
    #[arg(long)]
    id_header: bool,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request body
    #[arg(short, long)]
    data: Option<String>,

    /// Log connection details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: Cli) -> http::Result<()> {
    let target = Target::parse(&cli.target)?;
    let protocol = Protocol::from_str(&cli.protocol)?;

    let mut config = ClientConfig::new(protocol).timeout(Duration::from_secs(cli.timeout));
    if let Some(path) = &cli.keylog {
        let sink = KeyLogSink::create(path).map_err(|e| {
            http::Error::Io(io::Error::other(format!("key log file {}: {}", path.display(), e)))
        })?;
        config = config.key_log(sink);
    }

    let mut request = base_request(&cli.method, &target);
    for field in parse_header_lines(&cli.headers)? {
        request.push_header(field);
    }
    if cli.id_header {
        let id = request_id();
        println!("x-id: {}", id);
        request = request.header("x-id", id);
    }
    if let Some(data) = cli.data {
        request = request.body(data);
    }

    let response = http::send_request(&target, &config, &request)?;

    let mut out = std::io::stdout().lock();
    for field in response.headers() {
        writeln!(out, "{}", field)?;
    }
    writeln!(out)?;
    out.write_all(response.body_bytes())?;
    out.flush()?;

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    wireprobe::logging::init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "request failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
