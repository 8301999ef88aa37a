use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use wupcrypt::{CommonKeyTable, Ticket, TicketRecord};

/**
    Wii U CDN ticket tool.
*/
#[derive(Parser)]
#[command(name = "wupcrypt")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the fields of a ticket.
    Info {
        /// Path to the ticket (.tik) file.
        ticket: PathBuf,

        #[command(flatten)]
        location: Location,
    },
    /// Decrypt the title key of a ticket.
    Titlekey {
        /// Path to the ticket (.tik) file.
        ticket: PathBuf,

        /// Common key as 32 hex digits.
        #[arg(
            short,
            long,
            env = "WUPCRYPT_COMMON_KEY",
            hide_env_values = true,
            value_parser = parse_common_key
        )]
        common_key: [u8; 16],

        /// Common-key index the key is registered under.
        #[arg(short, long, default_value_t = 0)]
        index: u8,

        /// Fail instead of printing a zeroed key when the ticket names another index.
        #[arg(long)]
        strict: bool,

        /// Read only the key and title id fields without decoding the ticket.
        #[arg(long, conflicts_with_all = ["strict", "offset", "size"])]
        quick: bool,

        #[command(flatten)]
        location: Location,
    },
    /// Check a ticket's RSA-2048 signature.
    Verify {
        /// Path to the ticket (.tik) file.
        ticket: PathBuf,

        /// File holding the raw 256-byte big-endian modulus of the signer.
        #[arg(short, long)]
        modulus: PathBuf,

        #[command(flatten)]
        location: Location,
    },
}

/// Where the ticket sits inside the file.
#[derive(clap::Args)]
struct Location {
    /// Byte offset of the ticket in the file.
    #[arg(long, default_value_t = 0, value_parser = parse_number)]
    offset: u64,

    /// Ticket size in bytes. Defaults to the rest of the file.
    #[arg(long, value_parser = parse_number)]
    size: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Command::Info { ticket, location } => cmd_info(&ticket, &location),
        Command::Titlekey {
            ticket,
            common_key,
            index,
            strict,
            quick,
            location,
        } => {
            if quick {
                cmd_titlekey_quick(&ticket, &common_key)
            } else {
                cmd_titlekey(&ticket, common_key, index, strict, &location)
            }
        }
        Command::Verify {
            ticket,
            modulus,
            location,
        } => cmd_verify(&ticket, &modulus, &location),
    }
}

fn load_ticket(path: &Path, location: &Location) -> Result<Ticket> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let len = file
        .metadata()
        .context("failed to read ticket file metadata")?
        .len();

    let size = match location.size {
        Some(size) => size,
        None => len.saturating_sub(location.offset),
    };
    let size = usize::try_from(size).context("ticket size does not fit in memory")?;

    log::debug!(
        "loading ticket from {} (offset {:#x}, {size} bytes)",
        path.display(),
        location.offset
    );
    Ticket::read_from(&mut file, location.offset, size).context("failed to parse ticket")
}

fn cmd_info(path: &Path, location: &Location) -> Result<()> {
    let ticket = load_ticket(path, location)?;
    print_record(ticket.record());
    Ok(())
}

fn print_record(r: &TicketRecord) {
    let sig_name = r
        .signature_type()
        .map_or_else(|| "unknown".to_string(), |t| t.to_string());

    println!("Signature Type:      {:08x} ({sig_name})", r.sig_type());
    println!("Issuer:              {}", r.issuer());
    println!("Signature:");
    print_hex_rows(r.signature(), 16);
    println!("Version:             {}", r.format_version());
    println!("CA CRL Version:      {}", r.ca_crl_version());
    println!("Signer CRL Version:  {}", r.signer_crl_version());
    println!("Encrypted Titlekey:  {}", hex::encode(r.encrypted_title_key()));
    println!("Ticket ID:           {}", hex::encode(r.ticket_id()));
    println!("Device ID:           {}", hex::encode(r.device_id()));
    println!("Title ID:            {}", hex::encode(r.title_id()));
    println!("Ticket Version:      {}", r.ticket_version());
    println!("License Type:        {}", r.license_type());
    println!("Common Key Index:    {}", r.common_key_index());
    println!("Account ID:          {}", hex::encode(r.account_id()));
    println!("Audit:               {}", r.audit());
    println!("Limit Entries:");
    print_hex_rows(r.limit_entries(), 8);
}

fn print_hex_rows(bytes: &[u8], width: usize) {
    for row in bytes.chunks(width) {
        let line: Vec<String> = row.iter().map(|b| format!("{b:02x}")).collect();
        println!("  {}", line.join(" "));
    }
}

fn cmd_titlekey(
    path: &Path,
    common_key: [u8; 16],
    index: u8,
    strict: bool,
    location: &Location,
) -> Result<()> {
    let ticket = load_ticket(path, location)?;
    let keys = CommonKeyTable::with_key(index, common_key);

    let unwrapped = if strict {
        ticket
            .unwrap_title_key_strict(&keys)
            .context("failed to unwrap title key")?
    } else {
        ticket.unwrap_title_key(&keys)
    };

    if let Some(warning) = unwrapped.warning() {
        eprintln!("Warning: {warning}");
    }

    println!("Title ID:   {}", hex::encode(unwrapped.title_id()));
    println!("Title Key:  {}", unwrapped.title_key());
    Ok(())
}

fn cmd_titlekey_quick(path: &Path, common_key: &[u8; 16]) -> Result<()> {
    let title_key = wupcrypt::unwrap_title_key_from_file(path, common_key)
        .context("failed to read title key")?;
    println!("{title_key}");
    Ok(())
}

fn cmd_verify(path: &Path, modulus_path: &Path, location: &Location) -> Result<()> {
    let ticket = load_ticket(path, location)?;
    let modulus = std::fs::read(modulus_path).context("failed to read modulus file")?;

    let valid = ticket
        .record()
        .verify_signature(&modulus)
        .context("failed to check ticket signature")?;

    if !valid {
        bail!("signature does NOT match");
    }
    println!("Signature OK ({})", ticket.record().issuer());
    Ok(())
}

fn parse_common_key(s: &str) -> Result<[u8; 16]> {
    let bytes = hex::decode(s.trim()).context("common key is not valid hex")?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("common key must be 16 bytes, got {len}"))
}

/// Decimal or `0x`-prefixed hex.
fn parse_number(s: &str) -> Result<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => u64::from_str_radix(digits, 16).context("invalid hex number"),
        None => s.parse().context("invalid number"),
    }
}
