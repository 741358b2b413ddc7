#![deny(clippy::unwrap_used)]

use chrono::Local;
use clap::{arg, command, value_parser};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use tpg26x::proto::{self, Result};
use tpg26x::{Device, Settings, DEFAULT_BAUDRATE, DEFAULT_TIMEOUT, DEFAULT_TTY};

#[tokio::main]
async fn main() {
    let matches = command!() // requires `cargo` feature
        .arg(
            arg!(
                -p --device <PORT> "Port for RS-232 adapter"
            )
            .default_value(DEFAULT_TTY)
            .required(false)
            .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(
            -d --debug ... "Turn debugging information on"
        ))
        .arg(
            arg!(
                -b --baudrate <BAUDRATE> "Baudrate"
            )
            .default_value(DEFAULT_BAUDRATE.to_string())
            .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(
                -t --timeout <MS> "Read/write timeout in milliseconds"
            )
            .default_value(DEFAULT_TIMEOUT.as_millis().to_string())
            .value_parser(value_parser!(u64)),
        )
        .arg(
            arg!(
                --"lock-file" <FILE> "Lock file shared with other programs using the gauge"
            )
            .required(false)
            .value_parser(value_parser!(PathBuf)),
        )
        .subcommand(clap::Command::new("ident").about("Gauge identification"))
        .subcommand(
            clap::Command::new("pressure").about("Pressure measurement").arg(
                arg!([gauge] "Gauge channel")
                    .value_parser(value_parser!(u8).range(1..=2))
                    .default_value("1"),
            ),
        )
        .subcommand(
            clap::Command::new("unit").about("Set pressure unit").arg(
                arg!(<unit> "0 = mbar/bar, 1 = Torr, 2 = Pascal")
                    .value_parser(value_parser!(u8).range(0..=2)),
            ),
        )
        .subcommand(
            clap::Command::new("gauge")
                .about("Switch first gauge on or off")
                .arg(arg!(<state> "New state").value_parser(["on", "off"])),
        )
        .subcommand(clap::Command::new("error").about("Error status"))
        .subcommand(clap::Command::new("reset").about("Reset controller"))
        .subcommand(clap::Command::new("clear").about("Stop continuous mode and clear the line"))
        .subcommand(
            clap::Command::new("stream")
                .about("Continuous measurement")
                .arg(
                    arg!(--mode <MODE> "0 = 100 ms, 1 = 1 s, 2 = 1 min")
                        .value_parser(value_parser!(u8).range(0..=2))
                        .default_value("1"),
                )
                .arg(
                    arg!(--count <N> "Number of frames to read")
                        .value_parser(value_parser!(u32))
                        .default_value("10"),
                ),
        )
        .subcommand_required(true)
        .get_matches();

    init_tracing(matches.get_count("debug"));

    let port = matches
        .get_one::<PathBuf>("device")
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| DEFAULT_TTY.to_string());

    match handle_args(&matches).await {
        Ok(()) => {}
        Err(e) => {
            match &e {
                proto::ProtoError::Serial(err) => {
                    if err.kind() == tokio_serial::ErrorKind::NoDevice
                        || matches!(err.kind(), tokio_serial::ErrorKind::Io(ErrorKind::NotFound))
                    {
                        eprintln!("{}: File not found", port);
                    } else {
                        eprintln!("I/O Error: {} [device: {}]", err, port);
                    }
                }
                proto::ProtoError::Io(err) => {
                    if err.kind() == ErrorKind::NotFound {
                        eprintln!("{}: File not found", port);
                    } else {
                        eprintln!("I/O Error: {} [device: {}]", err, port);
                    }
                }
                proto::ProtoError::Timeout | proto::ProtoError::Abort => {
                    eprintln!("Failed to communicate with gauge, aborting!");
                }
                proto::ProtoError::Communication(err) => {
                    eprintln!("{}", err);
                    eprintln!("Is the gauge still in continuous mode? Try the clear command.");
                }
                proto::ProtoError::Decoding(err) => {
                    eprintln!("Received an unexpected response from gauge: {}", err);
                }
                proto::ProtoError::InvalidArgument { .. } => {
                    eprintln!("{}", e);
                }
                proto::ProtoError::Unexpected(_) => {
                    eprintln!("Received an unexpected response from gauge, aborting!");
                }
            }
            exit(-1);
        }
    }
}

fn init_tracing(debug: u8) {
    let level = match debug {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_args(matches: &clap::ArgMatches) -> Result<()> {
    let mut settings = Settings::default();
    if let Some(port_path) = matches.get_one::<PathBuf>("device") {
        settings.tty = port_path.to_string_lossy().to_string();
    }
    if let Some(baudrate) = matches.get_one::<u32>("baudrate") {
        settings.baudrate = *baudrate;
    }
    if let Some(ms) = matches.get_one::<u64>("timeout") {
        settings.timeout = Duration::from_millis(*ms);
    }
    settings.lock_file = matches.get_one::<PathBuf>("lock-file").cloned();

    let mut device = Device::open(&settings)?;
    eprintln!("Connected to: {}\n", settings.tty);

    match matches.subcommand() {
        Some(("ident", _args)) => {
            let (first, second) = device.identification().await?;
            println!("Gauge 1: {}", first);
            println!("Gauge 2: {}", second);
        }
        Some(("pressure", args)) => {
            let gauge = args.get_one::<u8>("gauge").copied().unwrap_or(1);
            let mea = device.pressure_measurement(gauge).await?;
            println!("Gauge {}: {}", gauge, mea);
        }
        Some(("unit", args)) => {
            if let Some(unit) = args.get_one::<u8>("unit") {
                let unit = device.set_pressure_unit(*unit).await?;
                println!("Unit: {}", unit);
            }
        }
        Some(("gauge", args)) => {
            let (first, second) = match args.get_one::<String>("state").map(String::as_str) {
                Some("on") => device.turn_on_first_gauge().await?,
                _ => device.turn_off_first_gauge().await?,
            };
            println!("Gauge 1: {}", first);
            println!("Gauge 2: {}", second);
        }
        Some(("error", _args)) => {
            println!("Error status: {}", device.error_status().await?);
        }
        Some(("reset", _args)) => {
            let causes = device.reset().await?;
            for cause in causes {
                println!("{}", cause);
            }
        }
        Some(("clear", _args)) => {
            device.stop_continuous_measurement().await?;
            println!("OK");
        }
        Some(("stream", args)) => {
            let mode = args.get_one::<u8>("mode").copied().unwrap_or(1);
            let count = args.get_one::<u32>("count").copied().unwrap_or(10);
            let mut stream = device.start_continuous_measurement(mode).await?;
            let mut result = Ok(());
            for _ in 0..count {
                match stream.read_frame().await {
                    Ok((first, second)) => {
                        println!(
                            "{}\t{}\t{}",
                            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                            first,
                            second
                        );
                    }
                    Err(err) => {
                        result = Err(err);
                        break;
                    }
                }
            }
            stream.stop().await?;
            result?;
        }
        _ => unreachable!("subcommand is required"),
    }

    Ok(())
}
