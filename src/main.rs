use clap::Parser;
use log::info;

use qrstyle::config::{Limits, MAX_PIXEL_SIZE};
use qrstyle::engine::{Delivery, Generator};
use qrstyle::server::{QrServer, ServerConfig, DEFAULT_MAX_BODY};

/// Styled QR code generator API.
#[derive(Parser, Debug)]
#[command(name = "qrstyle", version, about)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Worker threads; defaults to the number of CPUs.
    #[arg(long, env = "QR_WORKERS")]
    workers: Option<usize>,

    /// `json` wraps PNG/SVG in a JSON object, `raw` streams them as files.
    #[arg(long, env = "QR_DELIVERY", default_value = "json")]
    delivery: Delivery,

    /// Largest accepted `size` in pixels.
    #[arg(long, env = "QR_MAX_SIZE", default_value_t = MAX_PIXEL_SIZE)]
    max_size: u32,

    /// Largest accepted request body in bytes.
    #[arg(long, env = "QR_MAX_BODY", default_value_t = DEFAULT_MAX_BODY)]
    max_body: usize,
}

fn main() -> anyhow::Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let limits = Limits { max_pixel_size: cli.max_size, ..Limits::default() };
    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        workers: cli.workers.unwrap_or_else(num_cpus::get),
        max_body: cli.max_body,
    };
    info!(
        "starting with delivery {:?}, max size {}px, max body {} bytes",
        cli.delivery, limits.max_pixel_size, config.max_body
    );

    let server = QrServer::bind(config)?;
    server.run(Generator::new(limits, cli.delivery))
}
