//! Fehlertypen fuer das Kryptografie-Subsystem
//!
//! Kryptografische Fehler werden niemals lokal "repariert" (kein
//! Default-Schluessel, kein Weiterlaufen ohne Verschluesselung) -
//! jeder Fehler erreicht den Aufrufer mit einer spezifischen Art.

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Schluessel-Generierung fehlgeschlagen: {0}")]
    SchluesselGenerierung(String),

    #[error("Sicherheits-Initialisierung fehlgeschlagen: {0}")]
    SicherheitsInit(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    #[error("Authentifizierung fehlgeschlagen: {0}")]
    Authentifizierung(String),

    #[error("Teilnehmer-Import fehlgeschlagen: {0}")]
    TeilnehmerImport(String),

    #[error("Key-Exchange fehlgeschlagen: {0}")]
    KeyExchange(String),

    #[error("Payload zu gross fuer asymmetrische Verschluesselung: {erhalten} Bytes (Maximum: {maximum})")]
    PayloadZuGross { maximum: usize, erhalten: usize },

    #[error("Ungueltiger Zustand: erwartet {erwartet}, aktuell {aktuell}")]
    UngueltigerZustand {
        erwartet: &'static str,
        aktuell: &'static str,
    },

    #[error("Ungueltige Nonce-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeNonce { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Schluessel-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),

    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Unerwarteter Fehler: {0}")]
    Anyhow(#[from] anyhow::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
