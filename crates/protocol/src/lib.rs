//! soundproof-protocol – Transportierbare Nachrichts- und Record-Formen
//!
//! Dieses Crate definiert alle Formen, die eine Prozessgrenze ueberqueren:
//! verschluesselte Chunk-Records und Signalisierungs-Nachrichten. Binaeres
//! Material ist hier ausnahmslos Base64-Text; Schlusselmaterial im
//! Klartext kommt in keiner dieser Formen vor.

pub mod chunk;
pub mod signaling;

pub use chunk::{AeadAlgorithm, EncryptedChunk};
pub use signaling::{
    MemorySignaling, MemorySignalingEmpfaenger, SignalingChannel, SignalingMessage,
};
