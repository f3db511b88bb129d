//! Gemeinsame Identifikationstypen fuer Soundproof
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.
//!
//! Session- und Teilnehmer-IDs werden vom externen Session-Management
//! vergeben und sind daher opake Strings. Storage-IDs vergibt der
//! Kustode selbst als UUIDs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Session-ID (vom externen Session-Management vergeben)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Erstellt eine SessionId aus einem beliebigen String
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt die ID als String-Slice zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Eindeutige Teilnehmer-ID (Host oder Gast einer Aufnahme-Session)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Erstellt eine ParticipantId aus einem beliebigen String
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt die ID als String-Slice zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "participant:{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Eindeutige Storage-ID eines gespeicherten Chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageId(pub Uuid);

impl StorageId {
    /// Erstellt eine neue zufaellige StorageId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for StorageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StorageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "storage:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_roundtrip() {
        let id = SessionId::new("s1");
        assert_eq!(id.as_str(), "s1");
        assert_eq!(id.to_string(), "session:s1");
    }

    #[test]
    fn participant_id_aus_str() {
        let id: ParticipantId = "u1".into();
        assert_eq!(id, ParticipantId::new("u1"));
    }

    #[test]
    fn storage_id_eindeutig() {
        let a = StorageId::new();
        let b = StorageId::new();
        assert_ne!(a, b, "Zwei neue StorageIds muessen verschieden sein");
    }

    #[test]
    fn ids_sind_serde_kompatibel() {
        let sid = SessionId::new("aufnahme-42");
        let json = serde_json::to_string(&sid).unwrap();
        let sid2: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(sid, sid2);

        let uid = ParticipantId::new("gast-7");
        let json = serde_json::to_string(&uid).unwrap();
        let uid2: ParticipantId = serde_json::from_str(&json).unwrap();
        assert_eq!(uid, uid2);
    }
}
