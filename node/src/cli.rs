//! # CLI Interface
//!
//! Command-line structure for `tessera`, built with `clap` derive.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Tessera transaction tool.
///
/// Generates keys, turns JSON transactions into signed canonical blobs,
/// decodes and verifies blobs, and renders persistence records.
#[derive(Parser, Debug)]
#[command(
    name = "tessera",
    about = "Tessera signed transaction tool",
    version,
    propagate_version = true
)]
pub struct TesseraCli {
    /// Log output format.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "TESSERA_LOG_FORMAT",
        default_value = "pretty"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate an Ed25519 keypair and print its account address.
    Keygen(KeygenArgs),
    /// Sign a JSON transaction and print the canonical blob.
    Sign(SignArgs),
    /// Decode a canonical blob into JSON.
    Decode(BlobArgs),
    /// Run the local checks and the signature check on a blob.
    Verify(VerifyArgs),
    /// Render (and optionally store) the persistence record of a blob.
    Record(RecordArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Derive the keypair from this 32-byte hex seed instead of the OS RNG.
    #[arg(long)]
    pub seed: Option<String>,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// JSON file holding the transaction. `-` reads stdin.
    #[arg(long, short = 't')]
    pub tx: PathBuf,

    /// Hex-encoded Ed25519 secret key of the issuing account.
    #[arg(long, env = "TESSERA_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,
}

#[derive(Args, Debug)]
pub struct BlobArgs {
    /// Hex-encoded canonical transaction bytes.
    pub blob: String,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub blob: BlobArgs,

    /// Accept multi-signed transactions.
    #[arg(long)]
    pub allow_multi_sign: bool,
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    #[command(flatten)]
    pub blob: BlobArgs,

    /// Ledger the transaction belongs to.
    #[arg(long, default_value_t = 0)]
    pub ledger_seq: u32,

    /// Status code: N, C, H, V, I or U.
    #[arg(long, default_value = "V")]
    pub status: char,

    /// Hex-encoded execution metadata.
    #[arg(long, default_value = "")]
    pub meta: String,

    /// Also upsert the record into the sled store at this path.
    #[arg(long, env = "TESSERA_DB")]
    pub db: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        TesseraCli::command().debug_assert();
    }

    #[test]
    fn parses_record_flags() {
        let cli = TesseraCli::parse_from([
            "tessera",
            "--log-format",
            "json",
            "record",
            "AB",
            "--ledger-seq",
            "9",
            "--status",
            "H",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Commands::Record(args) => {
                assert_eq!(args.blob.blob, "AB");
                assert_eq!(args.ledger_seq, 9);
                assert_eq!(args.status, 'H');
                assert!(args.meta.is_empty());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
