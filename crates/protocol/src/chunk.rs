//! Verschluesselte Chunk-Records
//!
//! Der `EncryptedChunk` ist die einzige Form, in der Aufnahme-Daten eine
//! Prozessgrenze ueberqueren. Alle binaeren Felder sind Base64-Text; der
//! Record enthaelt niemals Schluesselmaterial oder Klartext.
//!
//! ## Aufbau
//! - `nonce`: 12 Bytes, Base64
//! - `ciphertext`: Ciphertext inkl. 16 Bytes Auth-Tag (angehaengt), Base64
//! - `sequenz`: streng monoton steigend pro Teilnehmer-Stream

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use soundproof_core::{ParticipantId, SessionId};

/// AEAD-Verschluesselungsalgorithmus eines Session-Schluessels
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AeadAlgorithm {
    /// AES-256-GCM
    #[default]
    Aes256Gcm,
    /// ChaCha20-Poly1305
    ChaCha20Poly1305,
}

impl std::fmt::Display for AeadAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AeadAlgorithm::Aes256Gcm => write!(f, "aes-256-gcm"),
            AeadAlgorithm::ChaCha20Poly1305 => write!(f, "chacha20-poly1305"),
        }
    }
}

impl std::str::FromStr for AeadAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aes-256-gcm" => Ok(Self::Aes256Gcm),
            "chacha20-poly1305" => Ok(Self::ChaCha20Poly1305),
            other => Err(format!("Unbekannter AEAD-Algorithmus: '{}'", other)),
        }
    }
}

/// Ein verschluesselter Medien-Chunk samt Metadaten
///
/// Unveraenderlich nach Erstellung. Der Kustode speichert diese Records
/// blind; entschluesseln koennen sie nur Inhaber des Session-Schluessels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedChunk {
    /// Session zu der dieser Chunk gehoert
    pub session_id: SessionId,
    /// Teilnehmer von dem der Chunk stammt
    pub participant_id: ParticipantId,
    /// Sequenz-Nummer innerhalb des Teilnehmer-Streams (monoton steigend)
    pub sequenz: u64,
    /// Verwendeter AEAD-Algorithmus
    pub algorithm: AeadAlgorithm,
    /// Nonce (12 Bytes, Base64)
    pub nonce: String,
    /// Ciphertext inkl. Auth-Tag (Base64)
    pub ciphertext: String,
    /// Laenge des urspruenglichen Klartexts in Bytes
    pub klartext_laenge: u64,
    /// Erstellungszeitpunkt (UTC)
    pub erstellt_am: DateTime<Utc>,
}

impl EncryptedChunk {
    /// Eindeutiger Schluessel eines Chunks innerhalb seiner Session
    /// (Teilnehmer + Sequenz), fuer geordnete Wiederzusammensetzung
    pub fn stream_schluessel(&self) -> (ParticipantId, u64) {
        (self.participant_id.clone(), self.sequenz)
    }
}
