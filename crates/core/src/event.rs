//! Event-Bus Trait-Definitionen
//!
//! Definiert die Schnittstelle fuer den internen Event-Bus.
//! Der Kustode meldet Speicher-Ereignisse ueber diesen Bus, damit
//! umgebende Schichten (UI, Monitoring) nicht pollen muessen.
//! Ereignisse enthalten grundsaetzlich keine Schluessel und keinen
//! Klartext - nur IDs und Zaehler.

use crate::types::{ParticipantId, SessionId, StorageId};
use serde::{Deserialize, Serialize};

/// Alle systemweiten Ereignisse die ueber den Event-Bus fliessen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SoundproofEvent {
    // --- Session-Ereignisse ---
    /// Eine Session wurde beim Kustoden angelegt
    SessionAngelegt { session_id: SessionId },
    /// Eine Session wurde beendet (keine weiteren Chunks)
    SessionBeendet { session_id: SessionId },
    /// Eine Session wurde samt aller Chunks geloescht
    SessionGeloescht {
        session_id: SessionId,
        chunks_entfernt: u64,
    },

    // --- Teilnehmer-Ereignisse ---
    /// Ein Teilnehmer wurde im Roster registriert
    TeilnehmerRegistriert {
        session_id: SessionId,
        participant_id: ParticipantId,
    },
    /// Ein Teilnehmer wurde aus dem Roster entfernt
    TeilnehmerEntfernt {
        session_id: SessionId,
        participant_id: ParticipantId,
    },

    // --- Chunk-Ereignisse ---
    /// Ein verschluesselter Chunk wurde gespeichert
    ChunkGespeichert {
        session_id: SessionId,
        participant_id: ParticipantId,
        sequenz: u64,
        storage_id: StorageId,
    },
}

/// Trait fuer den Event-Bus
///
/// Die konkrete Implementierung (tokio broadcast, Logging-Senke, etc.)
/// wird von der einbettenden Anwendung bereitgestellt und dem Kustoden
/// beim Konstruieren injiziert.
pub trait EventBus: Send + Sync + 'static {
    /// Sendet ein Ereignis an alle Abonnenten
    fn senden(&self, event: SoundproofEvent) -> crate::Result<()>;
}
