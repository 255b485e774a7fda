//! Flat sum-of-products carry generation
//!
//! Every carry of an N-bit addition is computed as one OR over explicitly
//! enumerated product terms of the operands and the carry-in, with no carry
//! chain. The term count doubles with each bit; the logic depth does not grow.
//!
//! The crate is organized as:
//! - term.rs: term indexing, decoding and per-width evaluation
//! - builder.rs: per-prefix-width assembly of the carry vector
//! - ripple.rs: sequential reference carries
//! - lanes.rs: u64 lane packing (64 additions per evaluation)
//! - netlist.rs: gate-level export and a lane-parallel netlist simulator
//! - select.rs: bounded bit selection with fill values
//! - ffi.rs: C ABI exports

pub mod builder;
pub mod error;
pub mod ffi;
pub mod lanes;
pub mod netlist;
pub mod ripple;
pub mod select;
pub mod term;

pub use builder::{BuilderConfig, CarryVector, CarryVectorBuilder, ScalarCarries};
pub use error::{ConfigError, NetlistError};
pub use lanes::{lane_mask, pack_lanes, unpack_lanes};
pub use netlist::{Netlist, NetlistSimulator, NetlistStats, MAX_NETLIST_WIDTH};
pub use ripple::{ripple_carries, ripple_carries_scalar};
pub use select::select_bits;
pub use term::{
    decode_digits, decode_term, term_count, DigitSequence, Factor, Term, TermEnumerator, Terminal,
    WidthResult, MAX_WIDTH,
};
