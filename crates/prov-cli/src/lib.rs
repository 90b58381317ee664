//! provrec - command-line tooling for signed provider records
//!
//! This crate provides a command-line interface for:
//! - Signing provider payloads with a peer's Ed25519 key
//! - Verifying signed envelopes received from other peers
//! - Inspecting envelopes without trusting them

pub mod cli;
pub mod config;
pub mod keys;
pub mod output;

pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use output::{JsonResponse, OutputFormat, OutputFormatter};

use prov_record::RecordError;

/// Exit codes for CLI operations
///
/// - 0: Success
/// - 1: General error (I/O, signing primitive failure)
/// - 2: Verification failed - the record's signature was rejected
/// - 5: Invalid input - malformed envelope, payload, key or arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    VerificationFailed = 2,
    InvalidInput = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Map a record error to the exit code scripts should see.
    pub fn for_record_error(error: &RecordError) -> Self {
        match error {
            RecordError::SignatureVerification => ExitCode::VerificationFailed,
            RecordError::Signing(_) => ExitCode::GeneralError,
            _ => ExitCode::InvalidInput,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::VerificationFailed => "VERIFICATION_FAILED",
            ExitCode::InvalidInput => "INVALID_INPUT",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::VerificationFailed => "Provider record signature did not verify",
            ExitCode::InvalidInput => "Invalid arguments or data provided",
        }
    }
}

#[cfg(test)]
mod exit_code_tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(i32::from(ExitCode::Success), 0);
        assert_eq!(i32::from(ExitCode::GeneralError), 1);
        assert_eq!(i32::from(ExitCode::VerificationFailed), 2);
        assert_eq!(i32::from(ExitCode::InvalidInput), 5);
    }

    #[test]
    fn test_record_error_mapping() {
        assert_eq!(
            ExitCode::for_record_error(&RecordError::SignatureVerification),
            ExitCode::VerificationFailed
        );
        assert_eq!(
            ExitCode::for_record_error(&RecordError::MissingIdentity),
            ExitCode::InvalidInput
        );
        assert_eq!(
            ExitCode::for_record_error(&RecordError::KeyMismatch),
            ExitCode::InvalidInput
        );
    }

    #[test]
    fn test_exit_code_names() {
        assert_eq!(ExitCode::Success.name(), "SUCCESS");
        assert_eq!(ExitCode::VerificationFailed.name(), "VERIFICATION_FAILED");
        assert!(!ExitCode::InvalidInput.description().is_empty());
    }
}
