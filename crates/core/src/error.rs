//! Fehlertypen fuer Soundproof
//!
//! Zentraler Fehler-Enum fuer crate-uebergreifende Belange.
//! Untermodule definieren eigene Fehler und konvertieren via `#[from]`.

use thiserror::Error;

/// Globaler Result-Alias fuer Soundproof
pub type Result<T> = std::result::Result<T, SoundproofError>;

/// Crate-uebergreifende Fehler im Soundproof-System
#[derive(Debug, Error)]
pub enum SoundproofError {
    #[error("Event-Bus-Fehler: {0}")]
    EventBus(String),

    #[error("Signalisierungsfehler: {0}")]
    Signalisierung(String),

    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl SoundproofError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}
