//! soundproof-custodian – Zero-Knowledge-Speicher fuer Aufnahme-Sessions
//!
//! Der Kustode nimmt verschluesselte Chunks und Session-Metadaten an,
//! listet und loescht sie - und haelt dabei zu keinem Zeitpunkt einen
//! Entschluesselungs-Schluessel. Die Grenze ist strukturell verankert:
//! dieses Crate haengt ausschliesslich von `soundproof-core` und
//! `soundproof-protocol` ab; `soundproof-crypto` kommt in seinem
//! Abhaengigkeitsbaum nicht vor.

pub mod config;
pub mod error;
pub mod repository;
pub mod service;
pub mod types;

// Bequeme Re-Exports
pub use config::{CustodianConfig, LimitEinstellungen};
pub use error::{CustodianError, CustodianResult};
pub use repository::{MemoryRepository, SessionRepository};
pub use service::CustodianService;
pub use types::{NeueSession, RosterEintrag, SessionSecurityRecord, SessionStatus};
