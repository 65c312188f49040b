pub mod decoder;
pub mod fingerprint;

pub use decoder::{decode_mono, DecodedAudio};
pub use fingerprint::{content_fingerprint, metadata_fingerprint};
