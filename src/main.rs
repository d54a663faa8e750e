mod context;
mod error;
mod forward;
mod relay;
mod stream;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use context::RelayContext;
use forward::{ForwardRequest, DEFAULT_LOCAL_PORT, DEFAULT_REMOTE_PORT, DEFAULT_TOOL};
use stream::Console;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("GPS_RELAY_BUILD_TIME"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "gps_relay", version, long_version = LONG_VERSION)]
#[command(about = "Streams GPS data from an Android device over adb", long_about = None)]
struct Cli {
    /// adb executable to run
    #[arg(long, default_value = DEFAULT_TOOL)]
    adb: String,

    /// Local port to forward and connect to
    #[arg(short, long, default_value_t = DEFAULT_LOCAL_PORT)]
    local_port: u16,

    /// Port the GPS server listens on, on the device
    #[arg(short, long, default_value_t = DEFAULT_REMOTE_PORT)]
    remote_port: u16,

    /// Milliseconds to wait after forwarding before connecting
    #[arg(long, default_value_t = 1000)]
    settle_ms: u64,
}

impl From<Cli> for RelayContext {
    fn from(cli: Cli) -> Self {
        RelayContext {
            request: ForwardRequest {
                tool: cli.adb,
                local_port: cli.local_port,
                remote_port: cli.remote_port,
            },
            settle: Duration::from_millis(cli.settle_ms),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let ctx = RelayContext::from(Cli::parse());

    info!("GPS relay client starting");

    match relay::run(&ctx, &mut Console::stdout()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            if let Some(output) = e.diagnostic_output() {
                error!("adb output: {}", output);
            }
            ExitCode::from(e.exit_code())
        }
    }
}
