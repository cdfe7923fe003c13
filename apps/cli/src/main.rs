use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use cctalk_core::protocol::constants::{COIN_ACCEPTOR_ADDRESS, CREDIT_SLOTS};
use cctalk_core::{BusConfig, CreditInfo, Device, Host, ObservableHost, StreamHost, TracingObserver};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "ccTalk coin validator tool", long_about = None)]
struct Args {
    /// Path to a TOML bus configuration
    #[arg(short, long)]
    config: Option<String>,

    /// Serial port (overrides the configuration)
    #[arg(long)]
    port: Option<String>,

    /// Baud rate (overrides the configuration)
    #[arg(long)]
    baud: Option<u32>,

    /// Device address (defaults to the first configured device)
    #[arg(short, long)]
    address: Option<u8>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial ports
    Ports,
    /// Identify the device and show its inhibit support
    Scan,
    /// Enable coin acceptance
    Accept,
    /// Inhibit coin acceptance
    Inhibit,
    /// Set the per-coin inhibit mask
    Mask {
        /// Mask, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_mask)]
        mask: u16,
    },
    /// Poll the credit buffer and print new events
    Poll {
        /// Delay between polls
        #[arg(long, default_value_t = 200)]
        interval_ms: u64,

        /// Stop after this many polls (runs forever if omitted)
        #[arg(long)]
        count: Option<u64>,
    },
}

fn parse_mask(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid mask '{}': {}", s, e))
}

fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(args) {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => BusConfig::load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path))?,
        None => BusConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }

    if let Command::Ports = args.command {
        for port in StreamHost::list_ports()? {
            println!("{}", port);
        }
        return Ok(());
    }

    let address = args
        .address
        .or_else(|| config.devices.first().map(|d| d.address))
        .unwrap_or(COIN_ACCEPTOR_ADDRESS);

    info!(port = %config.port, baud = config.baud_rate, address, "Opening bus");
    let serial = StreamHost::open_serial(&config)?;
    let host = ObservableHost::new(&serial, &TracingObserver);

    let mut device = Device::scan(&host, address)?;

    if let Some(mask) = config
        .devices
        .iter()
        .find(|d| d.address == address)
        .and_then(|d| d.coin_mask)
    {
        device.set_coin_mask(mask)?;
    }

    match args.command {
        Command::Ports => {}
        Command::Scan => {
            println!("address:           {}", device.address());
            println!("comms revision:    {}.{}", device.version() >> 8, device.version() & 0xFF);
            println!("master inhibit:    {}", device.supports_master_inhibit());
            println!("per-coin inhibit:  {}", device.supports_per_coin_inhibit());
            println!("inhibit control:   {}", device.inhibit_control());
            println!("coin mask:         0x{:04X}", device.coin_mask());
        }
        Command::Accept => {
            device.set_accept_coins(true)?;
            info!("Coin acceptance enabled");
        }
        Command::Inhibit => {
            device.set_accept_coins(false)?;
            info!("Coin acceptance inhibited");
        }
        Command::Mask { mask } => {
            device.set_coin_mask(mask)?;
            if !device.supports_per_coin_inhibit() {
                warn!("Device has no per-coin inhibit, mask kept for acceptance only");
            }
            info!(mask = %format!("0x{:04X}", mask), "Coin mask set");
        }
        Command::Poll { interval_ms, count } => {
            device.set_accept_coins(true)?;
            poll(&device, Duration::from_millis(interval_ms), count)?;
        }
    }

    Ok(())
}

fn poll<H: Host>(device: &Device<'_, H>, interval: Duration, count: Option<u64>) -> Result<()> {
    let mut last: Option<u8> = None;
    let mut polls = 0u64;

    while count.is_none_or(|c| polls < c) {
        polls += 1;

        match device.query_credits() {
            Ok(info) => {
                if let Some(prev) = last {
                    print_new_events(&info, new_events(prev, info.sequence));
                }
                last = Some(info.sequence);
            }
            Err(e) => warn!(error = %e, "Poll failed"),
        }

        thread::sleep(interval);
    }

    Ok(())
}

/// Number of buffer entries added since `prev`, at most the buffer depth.
fn new_events(prev: u8, current: u8) -> usize {
    (current.wrapping_sub(prev) as usize).min(CREDIT_SLOTS)
}

fn print_new_events(info: &CreditInfo, n: usize) {
    // Newest entry first.
    for slot in info.coins.iter().take(n) {
        if slot.value == 0 {
            println!("[{:3}] error  code={}", info.sequence, slot.error_code);
        } else {
            println!(
                "[{:3}] credit coin={} sorter={}",
                info.sequence, slot.value, slot.sorter_position
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mask() {
        assert_eq!(parse_mask("0x00FF"), Ok(0x00FF));
        assert_eq!(parse_mask("255"), Ok(255));
        assert!(parse_mask("0x10000").is_err());
        assert!(parse_mask("coins").is_err());
    }

    #[test]
    fn test_new_events() {
        assert_eq!(new_events(5, 5), 0);
        assert_eq!(new_events(5, 7), 2);
        assert_eq!(new_events(254, 1), 3);
        assert_eq!(new_events(0, 200), CREDIT_SLOTS);
    }
}
