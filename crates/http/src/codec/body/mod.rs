//! Request body handling.
//!
//! Only length-delimited bodies are supported; see [`LengthDecoder`].

mod length_decoder;

pub use length_decoder::LengthDecoder;
