use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use metexon_ble::codec::FieldKind;
use metexon_ble::uuids::{self, Characteristic};
use metexon_ble::{decode, encode, Record, StructKind};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Offline encoder/decoder for Metexon Zellenradschleuse characteristic payloads
#[derive(Parser)]
#[command(name = "metexon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a hex payload into a JSON record
    Decode {
        #[arg(value_enum)]
        kind: KindArg,

        /// Payload as hex (an optional 0x prefix and whitespace are ignored)
        #[arg(value_name = "HEX")]
        payload: String,
    },

    /// Encode a JSON record into a hex payload
    Encode {
        #[arg(value_enum)]
        kind: KindArg,

        /// JSON object of field values, or @FILE to read it from a file.
        /// Omitted fields and nulls are left unchanged on the device.
        #[arg(value_name = "JSON")]
        record: String,

        /// Previously read payload (hex) to fill omitted fields from
        #[arg(short, long, value_name = "HEX")]
        baseline: Option<String>,
    },

    /// Show the field layout of a structure
    Schema {
        #[arg(value_enum)]
        kind: KindArg,
    },

    /// List the service and characteristic UUIDs
    Uuids,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    SystemState,
    ManualControl,
    BlowerPid,
}

impl From<KindArg> for StructKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::SystemState => StructKind::SystemState,
            KindArg::ManualControl => StructKind::ManualControl,
            KindArg::BlowerPid => StructKind::BlowerPid,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Decode { kind, payload } => decode_command(kind.into(), &payload)?,

        Commands::Encode {
            kind,
            record,
            baseline,
        } => encode_command(kind.into(), &record, baseline.as_deref())?,

        Commands::Schema { kind } => schema_command(kind.into()),

        Commands::Uuids => uuids_command(),
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(&cleaned);
    hex::decode(digits).with_context(|| format!("Invalid hex payload: {}", text))
}

fn decode_command(kind: StructKind, payload: &str) -> Result<()> {
    let data = parse_hex(payload)?;
    debug!(%kind, len = data.len(), "decoding payload");

    let record = decode(kind, &data).with_context(|| format!("Failed to decode {}", kind))?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}

fn encode_command(kind: StructKind, input: &str, baseline: Option<&str>) -> Result<()> {
    let text = match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read record file: {}", path))?,
        None => input.to_string(),
    };
    let json: serde_json::Value = serde_json::from_str(&text).context("Record is not valid JSON")?;
    let record = Record::from_json(&json)?;

    let baseline = baseline
        .map(|payload| -> Result<Record> {
            let data = parse_hex(payload)?;
            decode(kind, &data).context("Failed to decode baseline")
        })
        .transpose()?;

    debug!(%kind, fields = record.len(), baseline = baseline.is_some(), "encoding record");
    let bytes = encode(kind, &record, baseline.as_ref())
        .with_context(|| format!("Failed to encode {}", kind))?;
    println!("{}", hex::encode(bytes));

    Ok(())
}

fn schema_command(kind: StructKind) {
    let schema = kind.schema();

    println!(
        "{} ({} bytes, {})",
        schema.name,
        schema.total_size,
        if kind.is_writable() { "read/write" } else { "read-only" }
    );
    println!("characteristic {}\n", kind.characteristic().uuid());
    println!("  {:24} {:>6} {:>4}  {:10} {}", "field", "offset", "size", "type", "sentinel");

    for field in &schema.fields {
        let (ty, sentinel) = match field.kind {
            FieldKind::Scalar {
                ty,
                fill: Some(fill),
                ..
            } => (ty.to_string(), format!("- (fill {})", fill)),
            FieldKind::Scalar { ty, sentinel, .. } => (ty.to_string(), sentinel.to_string()),
            FieldKind::Reserved { .. } => ("reserved".to_string(), "zero".to_string()),
        };
        println!(
            "  {:24} {:>6} {:>4}  {:10} {}",
            field.name,
            field.offset,
            field.size(),
            ty,
            sentinel
        );
    }
}

fn uuids_command() {
    println!(
        "  {:16} {:38} {}",
        "service",
        uuids::SERVICE_UUID.to_string(),
        hex::encode(uuids::to_firmware_bytes(&uuids::SERVICE_UUID))
    );
    for c in Characteristic::ALL {
        println!(
            "  {:16} {:38} {}",
            c.name(),
            c.uuid().to_string(),
            hex::encode(c.firmware_bytes())
        );
    }
}
