//! Output formatting for CLI results
//!
//! This module provides consistent output formatting across all CLI commands.
//! It supports three output formats:
//! - Table: Human-readable tables (default)
//! - JSON: Structured JSON for scripting and automation
//! - Quiet: Minimal output, exit codes only

use std::str::FromStr;

use comfy_table::{presets::UTF8_FULL, Table};
use prov_record::{Envelope, PeerId, RecordError, VerifiedRecord};
use serde::Serialize;

use crate::ExitCode;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for scripting
    Json,
    /// Minimal output - exit codes only
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper for consistent schema
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    /// Whether the operation was successful
    pub success: bool,
    /// The response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// Command that was executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            command: None,
        }
    }

    /// Create a successful response with command context
    pub fn success_with_command(data: T, command: &str) -> Self {
        Self {
            command: Some(command.to_string()),
            ..Self::success(data)
        }
    }
}

/// Formats output for different modes
pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a record whose signature checked out
    pub fn format_verified(&self, record: &VerifiedRecord) -> String {
        match self.format {
            OutputFormat::Table => self.verified_table(record),
            OutputFormat::Json => {
                self.to_json_response(&VerifiedRecordOutput::from(record), "verify")
            }
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format an envelope's fields without any trust claim
    pub fn format_envelope(&self, envelope: &Envelope) -> String {
        match self.format {
            OutputFormat::Table => self.envelope_table(envelope),
            OutputFormat::Json => {
                self.to_json_response(&EnvelopeOutput::from(envelope), "inspect")
            }
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format the peer identity of a key
    pub fn format_peer_id(&self, peer_id: &PeerId, command: &str) -> String {
        match self.format {
            OutputFormat::Table => peer_id.to_string(),
            OutputFormat::Json => self.to_json_response(
                &PeerIdOutput {
                    peer_id: peer_id.to_string(),
                },
                command,
            ),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format a record error together with the exit code it maps to
    pub fn format_record_error(&self, error: &RecordError, code: ExitCode) -> String {
        match self.format {
            OutputFormat::Table => {
                if error.is_trust_failure() {
                    format!("✗ Rejected: {error}")
                } else {
                    format!("Error: {error}")
                }
            }
            OutputFormat::Json => self.to_json(&RecordErrorOutput {
                success: false,
                error: error.to_string(),
                trust_failure: error.is_trust_failure(),
                exit_code: code as i32,
                exit_code_name: code.name(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            }),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format progress message (only shown in verbose mode)
    pub fn progress(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            eprintln!("... {message}");
        }
    }

    /// Format success message
    pub fn success(&self, message: &str) {
        if self.format == OutputFormat::Table {
            eprintln!("✓ {message}");
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    /// Format data with consistent JSON response wrapper
    fn to_json_response<T: Serialize>(&self, value: &T, command: &str) -> String {
        self.to_json(&JsonResponse::success_with_command(value, command))
    }

    fn verified_table(&self, record: &VerifiedRecord) -> String {
        let payload = record.payload();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Property", "Value"]);
        table.add_row(vec!["Status", "✓ signature verified"]);
        table.add_row(vec!["Peer ID", &record.peer_id().to_string()]);
        table.add_row(vec!["Protocol", record.protocol()]);
        table.add_row(vec!["Keys", &join_lines(&payload.keys)]);
        table.add_row(vec!["Addrs", &join_lines(&payload.addrs)]);
        table.add_row(vec!["Timestamp", &optional(payload.timestamp.map(|t| t.to_rfc3339()))]);
        table.add_row(vec!["Advisory TTL", &optional(payload.advisory_ttl.map(format_ttl))]);
        table.add_row(vec![
            "Advisory Expiry",
            &optional(record.advisory_expiry().map(|t| t.to_rfc3339())),
        ]);
        if self.verbose {
            table.add_row(vec!["Signature", record.signature()]);
            table.add_row(vec!["Payload Bytes", &record.raw_payload().as_bytes().len().to_string()]);
        }
        table.to_string()
    }

    fn envelope_table(&self, envelope: &Envelope) -> String {
        let payload = envelope.payload();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Property", "Value"]);
        table.add_row(vec!["Status", "unverified"]);
        table.add_row(vec!["Protocol", envelope.protocol()]);
        table.add_row(vec!["Signature", envelope.signature().unwrap_or("(none)")]);
        table.add_row(vec!["Claimed ID", &optional(payload.id.map(|id| id.to_string()))]);
        table.add_row(vec!["Keys", &join_lines(&payload.keys)]);
        table.add_row(vec!["Addrs", &join_lines(&payload.addrs)]);
        table.add_row(vec!["Timestamp", &optional(payload.timestamp.map(|t| t.to_rfc3339()))]);
        table.add_row(vec!["Advisory TTL", &optional(payload.advisory_ttl.map(format_ttl))]);
        if self.verbose {
            if let Some(raw) = envelope.raw_payload() {
                table.add_row(vec!["Raw Payload", raw.as_str()]);
            }
        }
        table.to_string()
    }
}

fn join_lines<T: ToString>(items: &[T]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "(none)".to_string())
}

fn format_ttl(ttl: std::time::Duration) -> String {
    let secs = ttl.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Verified record output for JSON
#[derive(Serialize)]
pub struct VerifiedRecordOutput {
    pub peer_id: String,
    pub protocol: String,
    pub keys: Vec<String>,
    pub addrs: Vec<String>,
    pub timestamp: Option<String>,
    pub advisory_ttl_ms: Option<u128>,
    pub advisory_expiry: Option<String>,
    pub signature: String,
}

impl From<&VerifiedRecord> for VerifiedRecordOutput {
    fn from(record: &VerifiedRecord) -> Self {
        let payload = record.payload();
        Self {
            peer_id: record.peer_id().to_string(),
            protocol: record.protocol().to_string(),
            keys: payload.keys.iter().map(ToString::to_string).collect(),
            addrs: payload.addrs.iter().map(ToString::to_string).collect(),
            timestamp: payload.timestamp.map(|t| t.to_rfc3339()),
            advisory_ttl_ms: payload.advisory_ttl.map(|d| d.as_millis()),
            advisory_expiry: record.advisory_expiry().map(|t| t.to_rfc3339()),
            signature: record.signature().to_string(),
        }
    }
}

/// Unverified envelope output for JSON
#[derive(Serialize)]
pub struct EnvelopeOutput {
    pub verified: bool,
    pub protocol: String,
    pub signature: Option<String>,
    pub claimed_id: Option<String>,
    pub keys: Vec<String>,
    pub addrs: Vec<String>,
    pub timestamp: Option<String>,
    pub advisory_ttl_ms: Option<u128>,
    pub raw_payload: Option<String>,
}

impl From<&Envelope> for EnvelopeOutput {
    fn from(envelope: &Envelope) -> Self {
        let payload = envelope.payload();
        Self {
            verified: false,
            protocol: envelope.protocol().to_string(),
            signature: envelope.signature().map(str::to_string),
            claimed_id: payload.id.map(|id| id.to_string()),
            keys: payload.keys.iter().map(ToString::to_string).collect(),
            addrs: payload.addrs.iter().map(ToString::to_string).collect(),
            timestamp: payload.timestamp.map(|t| t.to_rfc3339()),
            advisory_ttl_ms: payload.advisory_ttl.map(|d| d.as_millis()),
            raw_payload: envelope.raw_payload().map(|raw| raw.as_str().to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct PeerIdOutput {
    pub peer_id: String,
}

#[derive(Serialize)]
struct RecordErrorOutput {
    success: bool,
    error: String,
    trust_failure: bool,
    exit_code: i32,
    exit_code_name: &'static str,
    timestamp: String,
}
