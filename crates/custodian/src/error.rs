//! Fehlertypen fuer das Kustoden-Crate

use thiserror::Error;

/// Kustoden-Fehlertypen
#[derive(Debug, Error)]
pub enum CustodianError {
    #[error("Session nicht gefunden: {0}")]
    SessionNichtGefunden(String),

    #[error("Session bereits vorhanden: {0}")]
    SessionBereitsVorhanden(String),

    #[error("Session beendet: {0}")]
    SessionBeendet(String),

    #[error("Keine Berechtigung: {0}")]
    KeineBerechtigung(String),

    #[error("Chunk zu gross: {groesse} Bytes (Maximum: {max} Bytes)")]
    ChunkZuGross { groesse: u64, max: u64 },

    #[error("Kontingent erschoepft: {belegt} von {max}")]
    KontingentErschoepft { belegt: u64, max: u64 },

    #[error("Ungueltige Sequenz fuer {participant}: letzte {letzte}, erhalten {erhalten}")]
    UngueltigeSequenz {
        participant: String,
        letzte: u64,
        erhalten: u64,
    },

    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Unerwarteter Fehler: {0}")]
    Anyhow(#[from] anyhow::Error),
}

pub type CustodianResult<T> = Result<T, CustodianError>;
