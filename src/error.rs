use thiserror::Error;

/// Errors raised by the control-plane-facing, fallible surface of the crate:
/// configuration loading and interface/ACL binding. The per-packet hot path
/// never returns a `Result`; outcomes there are reported through
/// [`crate::pipeline::PacketOutcome`] instead.
#[derive(Error, Debug)]
pub enum AclDataplaneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("invalid ACL rule: {0}")]
    InvalidRule(String),

    #[error("unknown lookup context: {0}")]
    UnknownLookupContext(u32),

    #[error("no interfaces configured")]
    NoInterfaces,
}

pub type Result<T> = std::result::Result<T, AclDataplaneError>;
