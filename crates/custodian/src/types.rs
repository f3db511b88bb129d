//! Record-Typen des Kustoden
//!
//! Alle Typen hier sind frei von kryptografischen Geheimnissen: das
//! Roster fuehrt ausschliesslich Fingerprints, nie Schluesselmaterial.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use soundproof_core::{ParticipantId, SessionId};

/// Status einer Session beim Kustoden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session laeuft, Chunks werden angenommen
    #[default]
    Aktiv,
    /// Session beendet, keine weiteren Chunks
    Beendet,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Aktiv => write!(f, "aktiv"),
            SessionStatus::Beendet => write!(f, "beendet"),
        }
    }
}

/// Roster-Eintrag einer Session (Audit-Material, kein Schluessel)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEintrag {
    /// Teilnehmer-ID
    pub participant_id: ParticipantId,
    /// Anzeigename
    pub name: String,
    /// Fingerprint des oeffentlichen Schluessels des Teilnehmers
    pub fingerprint: String,
    /// Zeitpunkt der Registrierung
    pub registriert_am: DateTime<Utc>,
}

/// Anlage-Daten einer neuen Session
#[derive(Debug, Clone)]
pub struct NeueSession {
    /// Session-ID (vom externen Session-Management vergeben)
    pub session_id: SessionId,
    /// Teilnehmer-ID des Hosts
    pub host_id: ParticipantId,
    /// Anzeigename des Hosts
    pub host_name: String,
    /// Fingerprint des Host-Schluessels
    pub host_fingerprint: String,
}

/// Sicherheits-Record einer Session beim Kustoden
///
/// Enthaelt null kryptografische Geheimnisse. Wird beim Anlegen erstellt,
/// bei jedem Chunk-Eingang und Roster-Wechsel fortgeschrieben und bei der
/// Loeschung atomar mit allen Chunks entfernt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSecurityRecord {
    /// Session-ID
    pub session_id: SessionId,
    /// Teilnehmer-ID des Hosts
    pub host_id: ParticipantId,
    /// Roster der registrierten Teilnehmer (inkl. Host)
    pub roster: Vec<RosterEintrag>,
    /// Anzahl gespeicherter Chunks
    pub chunk_anzahl: u64,
    /// Gesamte Klartext-Groesse aller Chunks in Bytes
    pub gesamt_bytes: u64,
    /// Status der Session
    pub status: SessionStatus,
    /// Anlage-Zeitpunkt
    pub erstellt_am: DateTime<Utc>,
    /// Letzter Aenderungs-Zeitpunkt
    pub aktualisiert_am: DateTime<Utc>,
}

impl SessionSecurityRecord {
    /// Erstellt einen frischen Record fuer eine neue Session
    pub fn neu(daten: NeueSession) -> Self {
        let jetzt = Utc::now();
        Self {
            session_id: daten.session_id,
            host_id: daten.host_id.clone(),
            roster: vec![RosterEintrag {
                participant_id: daten.host_id,
                name: daten.host_name,
                fingerprint: daten.host_fingerprint,
                registriert_am: jetzt,
            }],
            chunk_anzahl: 0,
            gesamt_bytes: 0,
            status: SessionStatus::Aktiv,
            erstellt_am: jetzt,
            aktualisiert_am: jetzt,
        }
    }

    /// Prueft ob ein Aufrufer Host oder aktuell registrierter Teilnehmer ist
    pub fn ist_autorisiert(&self, caller: &ParticipantId) -> bool {
        if &self.host_id == caller {
            return true;
        }
        self.roster
            .iter()
            .any(|eintrag| &eintrag.participant_id == caller)
    }
}
