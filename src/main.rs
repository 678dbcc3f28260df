use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use roomguard_decoder::{
    BeaconReading, DecodedFields, EnvironmentState, UplinkInput, decode_field_list,
    decode_uplink, encode,
};

mod config;

use config::{AppConfig, OutputFormat};

#[derive(Parser, Debug)]
#[command(version, about = "Decode RoomGuard occupancy uplinks")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode hex payloads given as arguments, or one per line on stdin
    Decode {
        payloads: Vec<String>,
        #[arg(short, long)]
        port: Option<u8>,
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the hex payload carrying the given readings
    Encode {
        #[arg(long)]
        wifi: u16,
        #[arg(long)]
        ble: u16,
        /// Beacon RSSI in dBm (-255..=-1), 0 for no beacon
        #[arg(long, allow_negative_numbers = true)]
        rssi: Option<i16>,
        #[arg(long)]
        environment: Option<EnvironmentState>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: AppConfig = toml::de::from_str(&contents)
        .with_context(|| format!("parsing config {}", path.display()))?;
    debug!("Loaded config: {:?}", config);
    Ok(config)
}

fn parse_hex(payload: &str) -> Result<Vec<u8>> {
    let cleaned: String = payload
        .split_whitespace()
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .collect();
    hex::decode(&cleaned).with_context(|| format!("invalid hex payload {payload:?}"))
}

fn render(bytes: Vec<u8>, port: u8, format: OutputFormat, pretty: bool) -> Result<String> {
    let json = match format {
        OutputFormat::Structured => {
            let result = decode_uplink(&UplinkInput {
                bytes,
                f_port: port,
            });
            if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            }
        }
        OutputFormat::Flat => {
            let records = decode_field_list(&bytes, port);
            if pretty {
                serde_json::to_string_pretty(&records)?
            } else {
                serde_json::to_string(&records)?
            }
        }
    };
    Ok(json)
}

/// One payload per line. Lines that are not hex are logged and skipped.
fn decode_lines(
    input: impl BufRead,
    out: &mut impl Write,
    port: u8,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    for (number, line) in input.lines().enumerate() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_hex(&line) {
            Ok(bytes) => writeln!(out, "{}", render(bytes, port, format, pretty)?)?,
            Err(err) => warn!("Skipping line {}: {:#}", number + 1, err),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Decode {
            payloads,
            port,
            format,
            pretty,
        } => {
            let port = port.unwrap_or_else(|| config.port());
            let format = format.unwrap_or_else(|| config.format());
            let pretty = pretty || config.pretty();

            if payloads.is_empty() {
                info!("Reading payloads from stdin");
                decode_lines(io::stdin().lock(), &mut io::stdout().lock(), port, format, pretty)?;
            } else {
                for payload in &payloads {
                    println!("{}", render(parse_hex(payload)?, port, format, pretty)?);
                }
            }
        }
        Command::Encode {
            wifi,
            ble,
            rssi,
            environment,
        } => {
            let beacon = match rssi {
                Some(dbm) => match BeaconReading::from_rssi(dbm) {
                    Some(beacon) => Some(beacon),
                    None => bail!("RSSI {dbm} dBm is outside -255..=0"),
                },
                None => None,
            };
            let bytes = encode(&DecodedFields {
                wifi_count: wifi,
                ble_count: ble,
                beacon,
                environment_state: environment,
            });
            println!("{}", hex::encode(bytes));
        }
    }

    Ok(())
}
