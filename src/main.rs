use autoterm::config::{Config, ConfigLoader, LogFormat, LoggingConfig};
use autoterm::encoding::TextEncoding;
use autoterm::error::{AppError, AppResult};
use autoterm::link::LinkConfig;
use autoterm::negotiation::AutoNegotiator;
use autoterm::port::{list_ports, Parity, StopBits, SystemPortOpener};
use autoterm::relay::Relay;
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tokio::signal;
use tokio::task::JoinError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "autoterm",
    version,
    about = "Serial console terminal that detects the device's baud rate and text encoding.",
    long_about = "Connects to a serial console, probes it at the common baud rates to find the one \
                  the device answers at, guesses its Japanese or UTF-8 text encoding, then relays \
                  keystrokes and output until Ctrl+C. Output can be appended to a session log."
)]
struct Args {
    /// Port to connect to (device path, COM name or configured alias).
    /// Without it, the available ports are listed for selection.
    port: Option<String>,

    /// Baud rate used when negotiation is off or detects nothing.
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    baud: Option<u32>,

    /// Encoding used when detection is off or inconclusive
    /// (UTF-8, Shift-JIS, EUC-JP, ISO-2022-JP).
    #[arg(short, long)]
    encoding: Option<TextEncoding>,

    /// Parity bit.
    #[arg(long, value_enum)]
    parity: Option<ParityArg>,

    /// Number of stop bits.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    stop_bits: Option<u8>,

    /// Skip baud rate negotiation.
    #[arg(long)]
    no_negotiate: bool,

    /// Keep the configured encoding even when negotiation succeeds.
    #[arg(long)]
    no_detect_encoding: bool,

    /// Append session output to this file.
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Configuration file to use instead of the standard locations.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List available serial ports and exit.
    #[arg(long)]
    list: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ParityArg {
    None,
    Odd,
    Even,
}

impl From<ParityArg> for Parity {
    fn from(arg: ParityArg) -> Self {
        match arg {
            ParityArg::None => Parity::None,
            ParityArg::Odd => Parity::Odd,
            ParityArg::Even => Parity::Even,
        }
    }
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(args: Args) -> AppResult<()> {
    let config = load_config(args.config.as_deref())?;
    init_tracing(&config.logging);

    if args.list {
        return print_ports();
    }

    let port_name = match args.port.as_deref() {
        Some(name) => config.serial.resolve_port(name),
        None => pick_port()?,
    };
    let base = base_link_config(&args, &config, port_name);
    let detect_encoding = config.serial.auto_detect_encoding && !args.no_detect_encoding;

    let link = if config.serial.auto_negotiate && !args.no_negotiate {
        let options = config.negotiation.options(detect_encoding);
        let report = tokio::task::spawn_blocking(move || {
            AutoNegotiator::new(SystemPortOpener, options).negotiate(&base.port_name, &base)
        })
        .await
        .map_err(task_error)?;
        debug!(candidates = ?report.candidates, "Negotiation finished");
        report.config
    } else {
        base
    };

    print_summary(&link);

    let relay = Relay::new(config.relay.options());
    let shutdown = relay.shutdown_handle();
    let mut relay_task = tokio::task::spawn_blocking(move || {
        let mut display = io::stdout().lock();
        relay.connect(&SystemPortOpener, &link, io::stdin(), &mut display)
    });

    let result = tokio::select! {
        result = &mut relay_task => result,
        _ = shutdown_signal() => {
            shutdown.store(true, Ordering::SeqCst);
            relay_task.await
        }
    };
    result.map_err(task_error)??;

    println!("\nDisconnected.");
    Ok(())
}

fn load_config(path: Option<&Path>) -> AppResult<Config> {
    let loader = match path {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    Ok(loader.into_config())
}

/// Diagnostics go to stderr; stdout belongs to the device output.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("autoterm={}", logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

/// Caller-supplied defaults: config file first, command line on top.
fn base_link_config(args: &Args, config: &Config, port_name: String) -> LinkConfig {
    let parity = args.parity.map(Parity::from).unwrap_or(config.serial.parity);
    let stop_bits = match args.stop_bits {
        Some(2) => StopBits::Two,
        Some(_) => StopBits::One,
        None => config.serial.stop_bits,
    };

    let link = LinkConfig::new(port_name, args.baud.unwrap_or(config.serial.default_baud))
        .with_encoding(args.encoding.unwrap_or(config.serial.default_encoding))
        .with_framing(parity, stop_bits);

    match args.log.clone().or_else(|| config.logging.session_log.clone()) {
        Some(path) => link.with_log_path(path),
        None => link,
    }
}

fn print_ports() -> AppResult<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        return Err(AppError::NoPorts);
    }
    println!("Available serial ports:");
    for port in &ports {
        println!("  {}", port);
    }
    Ok(())
}

/// Numbered port list on stdout, selection read from stdin.
fn pick_port() -> AppResult<String> {
    let ports = list_ports()?;
    if ports.is_empty() {
        return Err(AppError::NoPorts);
    }

    println!("Available serial ports:");
    for (index, port) in ports.iter().enumerate() {
        println!("  {}: {}", index + 1, port);
    }
    print!("Select port [1-{}]: ", ports.len());
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let choice = line.trim();

    choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| ports.get(index))
        .map(|port| port.name.clone())
        .ok_or_else(|| AppError::InvalidSelection(choice.to_string()))
}

/// Connection summary for the operator, on stdout ahead of the device output.
fn print_summary(link: &LinkConfig) {
    let mut out = io::stdout().lock();
    if let Err(e) = write_summary(&mut out, link) {
        debug!(error = %e, "Failed to print connection summary");
    }
}

fn write_summary(out: &mut impl Write, link: &LinkConfig) -> io::Result<()> {
    writeln!(out, "Connecting to {}", link.port_name)?;
    writeln!(out, "  Baud rate: {}", link.baud_rate)?;
    writeln!(out, "  Data bits: {}", link.data_bits.bits())?;
    writeln!(out, "  Encoding:  {}", link.encoding)?;
    if let Some(path) = &link.log_path {
        writeln!(out, "  Log file:  {}", path.display())?;
    }
    writeln!(out, "Press Ctrl+C to exit")?;
    writeln!(out)
}

fn task_error(e: JoinError) -> AppError {
    AppError::Task(e.to_string())
}

// --- Graceful Shutdown Handler ---
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            debug!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                debug!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, closing session");
}
