use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::{info, warn};
use pantilt::{
    Backend, DryRunActuator, LineReceiver, Link, SerialLink, Tracker, XArmActuator, BAUD_RATE,
    DEFAULT_MAX_LINE, SELF_TEST_STEP_MS,
};
use std::error::Error;
use tokio::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    /// USB HID first, then Bluetooth
    Auto,
    Hid,
    Ble,
    /// Log moves without driving hardware
    DryRun,
}

/// Track a target by driving pan/tilt servos from `X:<int>,Y:<int>` lines.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Serial device carrying the command stream, `-` for stdin/stdout
    #[arg(long, default_value = "-")]
    port: String,

    /// Serial line speed
    #[arg(long, default_value_t = BAUD_RATE)]
    baud: u32,

    #[arg(long, value_enum, default_value_t = BackendArg::Auto)]
    backend: BackendArg,

    /// Line buffer capacity in bytes, 0 for unbounded
    #[arg(long, default_value_t = DEFAULT_MAX_LINE)]
    max_line: usize,

    /// Echo applied angles back over the serial link
    #[arg(long)]
    echo: bool,

    /// Run the servo test sequence before accepting input
    #[arg(long)]
    self_test: bool,

    /// Idle time between input polls
    #[arg(long, default_value_t = 1)]
    poll_interval_ms: u64,
}

async fn connect(backend: BackendArg) -> Result<Backend, Box<dyn Error + Send + Sync>> {
    let link = match backend {
        BackendArg::DryRun => return Ok(Backend::DryRun(DryRunActuator)),
        BackendArg::Auto => Link::Auto,
        BackendArg::Hid => Link::Hid,
        BackendArg::Ble => Link::Bluetooth,
    };
    Ok(Backend::XArm(XArmActuator::connect(link).await?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.baud != BAUD_RATE {
        warn!("Baud rate {} differs from the protocol rate {}", args.baud, BAUD_RATE);
    }

    let SerialLink { mut input, mut output } = SerialLink::open(&args.port, args.baud)?;
    let backend = connect(args.backend).await?;
    let mut tracker = Tracker::launch(backend, LineReceiver::new(args.max_line), &mut output).await?;

    if args.self_test {
        info!("Running servo self-test");
        tracker.run_self_test(Duration::from_millis(SELF_TEST_STEP_MS)).await;
    }

    if args.echo {
        tracker = tracker.with_echo(output);
    }

    let poll_interval = Duration::from_millis(args.poll_interval_ms);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, stopping");
                break;
            }
            _ = tokio::time::sleep(poll_interval) => {}
        }

        tracker.poll(&mut input).await;

        if input.is_closed() {
            info!("Serial input closed");
            break;
        }
    }

    let angles = tracker.angles();
    info!("Last position pan={} tilt={}", angles.pan(), angles.tilt());
    Ok(())
}
