//! CLI command definitions and argument parsing

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use prov_record::{
    decode_envelope, decode_payload, encode_envelope, Envelope, Identity, RawPayload,
    RecordError, UnsignedEnvelope,
};
use tracing::{debug, info};

use crate::config::Config;
use crate::keys::{self, KeyFileError};
use crate::output::{OutputFormat, OutputFormatter};
use crate::ExitCode;

/// provrec - sign and verify provider records
#[derive(Parser, Debug)]
#[command(name = "provrec")]
#[command(version, about = "Sign, verify and inspect provider records")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: table, json, quiet (overrides config)
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug mode (signing and verification tracing)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true, env = "PROVREC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Protocol tag for new envelopes (overrides config)
    #[arg(long, global = true)]
    pub protocol: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new peer key file
    Keygen {
        /// Where to write the key file
        #[arg(long)]
        out: PathBuf,
        /// Replace an existing key file
        #[arg(long)]
        force: bool,
    },
    /// Print the peer identity of a key file
    PeerId {
        /// Key file (defaults to identity.key_path from config)
        #[arg(long)]
        key: Option<PathBuf>,
    },
    /// Sign a payload and write the wire envelope
    Sign(SignArgs),
    /// Verify a signed envelope ("-" reads stdin)
    Verify {
        /// Envelope file
        input: PathBuf,
    },
    /// Print an envelope's fields without verifying it ("-" reads stdin)
    Inspect {
        /// Envelope file
        input: PathBuf,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file (the commented sample unless --key is given)
    Init {
        /// Where to write it (defaults to --config, then the platform config path)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Record this key file as identity.key_path
        #[arg(long)]
        key: Option<PathBuf>,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration after flags are applied
    Show,
}

/// Arguments for the sign command
#[derive(Parser, Debug)]
pub struct SignArgs {
    /// Key file (defaults to identity.key_path from config)
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Payload JSON file ("-" reads stdin)
    #[arg(long)]
    pub payload: PathBuf,

    /// Sign the payload file bytes as given instead of re-encoding them
    /// (whitespace around the JSON value is trimmed)
    #[arg(long)]
    pub verbatim: bool,

    /// Set the payload timestamp to now
    #[arg(long, conflicts_with = "verbatim")]
    pub stamp: bool,

    /// Set the payload's advisory TTL in seconds
    #[arg(long, conflicts_with = "verbatim")]
    pub ttl_secs: Option<u64>,

    /// Write the envelope here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl Cli {
    /// Execute the CLI command with a pre-loaded configuration
    ///
    /// `config` is expected to already carry the CLI overrides.
    pub fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let format = config.output.format.parse().unwrap_or_default();
        let formatter = OutputFormatter::new(format, config.output.verbose);

        match self.command {
            Commands::Keygen { out, force } => run_keygen(&formatter, &out, force),
            Commands::PeerId { key } => {
                let identity = match load_key(&formatter, key.as_deref(), &config)? {
                    Ok(identity) => identity,
                    Err(code) => return Ok(code),
                };
                print_nonempty(&formatter.format_peer_id(&identity.peer_id(), "peer-id"));
                Ok(ExitCode::Success)
            }
            Commands::Sign(args) => args.execute(&formatter, &config),
            Commands::Verify { input } => run_verify(&formatter, &input),
            Commands::Inspect { input } => run_inspect(&formatter, &input),
            Commands::Config { action } => run_config(&formatter, action, self.config, &config),
        }
    }
}

impl SignArgs {
    pub fn execute(self, formatter: &OutputFormatter, config: &Config) -> anyhow::Result<ExitCode> {
        let identity = match load_key(formatter, self.key.as_deref(), config)? {
            Ok(identity) => identity,
            Err(code) => return Ok(code),
        };
        let peer_id = identity.peer_id();

        formatter.progress(&format!("Reading payload from {}...", self.payload.display()));
        let bytes = read_input(&self.payload)?;

        let unsigned = match self.build_unsigned(&config.record.protocol, &bytes, &identity) {
            Ok(unsigned) => unsigned,
            Err(e) => return Ok(report(formatter, &e)),
        };

        let mut envelope = Envelope::from(unsigned);
        if let Err(e) = envelope.sign(&peer_id, Some(identity.keypair())) {
            return Ok(report(formatter, &e));
        }
        info!(peer_id = %peer_id, protocol = envelope.protocol(), "signed provider record");

        let wire = encode_envelope(&envelope)?;
        match &self.out {
            Some(path) => {
                std::fs::write(path, &wire)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                formatter.success(&format!("Envelope written to {}", path.display()));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&wire)?;
                stdout.write_all(b"\n")?;
            }
        }
        Ok(ExitCode::Success)
    }

    fn build_unsigned(
        &self,
        protocol: &str,
        bytes: &[u8],
        identity: &Identity,
    ) -> Result<UnsignedEnvelope, RecordError> {
        let raw = RawPayload::from_bytes(bytes)?;
        if self.verbatim {
            return UnsignedEnvelope::from_raw_payload(protocol, raw);
        }

        let mut payload = decode_payload(&raw)?;
        if payload.id.is_none() {
            debug!(peer_id = %identity.peer_id(), "payload has no ID, using signer");
            payload.id = Some(identity.peer_id());
        }
        if self.stamp {
            payload.timestamp = Some(chrono::Utc::now());
        }
        if let Some(secs) = self.ttl_secs {
            payload.advisory_ttl = Some(Duration::from_secs(secs));
        }
        Ok(UnsignedEnvelope::new(protocol, payload))
    }
}

fn run_keygen(formatter: &OutputFormatter, out: &Path, force: bool) -> anyhow::Result<ExitCode> {
    formatter.progress("Generating key...");
    let identity = match keys::generate_key_file(out, force) {
        Ok(identity) => identity,
        Err(e @ KeyFileError::AlreadyExists(_)) => {
            eprintln!("Error: {e} (use --force to replace it)");
            return Ok(ExitCode::InvalidInput);
        }
        Err(e) => return Err(e.into()),
    };
    formatter.success(&format!("Key written to {}", out.display()));
    print_nonempty(&formatter.format_peer_id(&identity.peer_id(), "keygen"));
    Ok(ExitCode::Success)
}

fn run_verify(formatter: &OutputFormatter, input: &Path) -> anyhow::Result<ExitCode> {
    formatter.progress(&format!("Reading envelope from {}...", input.display()));
    let bytes = read_input(input)?;

    let verified = match decode_envelope(&bytes).and_then(Envelope::into_verified) {
        Ok(verified) => verified,
        Err(e) => return Ok(report(formatter, &e)),
    };

    print_nonempty(&formatter.format_verified(&verified));
    Ok(ExitCode::Success)
}

fn run_inspect(formatter: &OutputFormatter, input: &Path) -> anyhow::Result<ExitCode> {
    let bytes = read_input(input)?;
    let envelope = match decode_envelope(&bytes) {
        Ok(envelope) => envelope,
        Err(e) => return Ok(report(formatter, &e)),
    };

    print_nonempty(&formatter.format_envelope(&envelope));
    Ok(ExitCode::Success)
}

fn run_config(
    formatter: &OutputFormatter,
    action: ConfigAction,
    config_flag: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<ExitCode> {
    match action {
        ConfigAction::Init { path, key, force } => {
            let Some(path) = path.or(config_flag).or_else(Config::default_path) else {
                eprintln!("Error: no platform config directory (pass --path)");
                return Ok(ExitCode::InvalidInput);
            };
            if path.exists() && !force {
                eprintln!(
                    "Error: {} already exists (use --force to replace it)",
                    path.display()
                );
                return Ok(ExitCode::InvalidInput);
            }

            match key {
                Some(key_path) => {
                    let mut initial = Config::default();
                    initial.identity.key_path = Some(key_path);
                    initial.save(&path)?;
                }
                None => Config::write_sample(&path)?,
            }
            formatter.success(&format!("Configuration written to {}", path.display()));
            Ok(ExitCode::Success)
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::Success)
        }
    }
}

/// Resolve and load the signing key.
///
/// Key problems the user can fix are reported and turned into an exit code;
/// anything else propagates.
fn load_key(
    formatter: &OutputFormatter,
    key: Option<&Path>,
    config: &Config,
) -> anyhow::Result<Result<Identity, ExitCode>> {
    let Some(path) = key.or(config.identity.key_path.as_deref()) else {
        eprintln!("Error: no key file given (pass --key or set identity.key_path in config)");
        return Ok(Err(ExitCode::InvalidInput));
    };

    formatter.progress(&format!("Loading key from {}...", path.display()));
    match keys::load_identity(path) {
        Ok(identity) => Ok(Ok(identity)),
        Err(KeyFileError::Io(e)) => {
            Err(e).with_context(|| format!("failed to read key file {}", path.display()))
        }
        Err(e) => {
            eprintln!("Error: {}: {e}", path.display());
            Ok(Err(ExitCode::InvalidInput))
        }
    }
}

fn report(formatter: &OutputFormatter, error: &RecordError) -> ExitCode {
    let code = ExitCode::for_record_error(error);
    let message = formatter.format_record_error(error, code);
    if formatter.format() == OutputFormat::Json {
        println!("{message}");
    } else if !message.is_empty() {
        eprintln!("{message}");
    }
    code
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("failed to read stdin")?;
        return Ok(bytes);
    }
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_nonempty(output: &str) {
    if !output.is_empty() {
        println!("{output}");
    }
}
