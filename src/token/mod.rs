//! Token Handling
//!
//! Decoding of compact tokens into payloads and expiration instants.

pub mod codec;

pub use codec::{decode, decode_expiration, encode_unsigned, expiration_instant};
