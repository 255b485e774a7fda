//! Error types
//!
//! The carry computation itself is total; every error here is a
//! construction-time contract violation or a malformed netlist.

use thiserror::Error;

/// Rejected builder / enumerator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A carry vector needs at least one operand bit.
    #[error("operand width must be at least 1")]
    ZeroWidth,

    /// Term count grows as 2^(w+1); widths past the cap are refused.
    #[error("operand width {width} exceeds the supported maximum of {max}")]
    WidthTooLarge { width: usize, max: usize },

    /// Operands must both match the configured width.
    #[error("operand width mismatch: expected {expected}, got a={a} b={b}")]
    OperandWidthMismatch { expected: usize, a: usize, b: usize },

    /// Term index past `2^(width+1) - 2`.
    #[error("term index {index} out of range for width {width} ({count} terms)")]
    TermIndexOutOfRange { width: usize, index: u64, count: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A prefix width of at least 1 came back without its generate term.
    #[error("width {width} produced no generate term")]
    MissingGenerate { width: usize },
}

/// Errors raised while loading or driving a gate-level netlist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetlistError {
    #[error("failed to parse netlist JSON: {0}")]
    Parse(String),

    #[error("unknown input: {0}")]
    UnknownInput(String),

    #[error("unknown output: {0}")]
    UnknownOutput(String),

    /// A gate or port references a net past `net_count`.
    #[error("net {net} out of range ({net_count} nets)")]
    NetOutOfRange { net: usize, net_count: usize },

    /// A gate has the wrong number of inputs for its type.
    #[error("gate {gate} has {got} inputs, expected {expected}")]
    GateArity { gate: usize, got: usize, expected: usize },

    #[error("schedule entry {gate} out of range ({gate_count} gates)")]
    ScheduleOutOfRange { gate: usize, gate_count: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
