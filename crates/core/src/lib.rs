//! soundproof-core – Gemeinsame Typen, Traits und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Soundproof-Crates gemeinsam genutzt werden.

pub mod error;
pub mod event;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{Result, SoundproofError};
pub use event::{EventBus, SoundproofEvent};
pub use types::{ParticipantId, SessionId, StorageId};
