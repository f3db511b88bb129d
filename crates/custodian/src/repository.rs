//! Repository-Abstraktion fuer Kustoden-Daten
//!
//! Das `SessionRepository`-Trait entkoppelt die Kustoden-Logik vom
//! konkreten Speicher (In-Memory, SQL, Objekt-Storage). Die mitgelieferte
//! `MemoryRepository`-Implementierung haelt alle Daten in einer einzigen
//! `DashMap`, sodass das Loeschen einer Session den Record und alle
//! Chunks atomar entfernt.
//!
//! Das Repository wird beim Prozess-Start erstellt und dem Kustoden
//! injiziert; es gibt keinen modul-globalen Zustand.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use soundproof_core::{ParticipantId, SessionId, StorageId};
use soundproof_protocol::EncryptedChunk;

use crate::error::{CustodianError, CustodianResult};
use crate::types::{NeueSession, RosterEintrag, SessionSecurityRecord, SessionStatus};

/// Repository fuer Session-Records und verschluesselte Chunks
#[allow(async_fn_in_trait)]
pub trait SessionRepository: Send + Sync {
    /// Legt eine neue Session an
    async fn create(&self, neu: NeueSession) -> CustodianResult<SessionSecurityRecord>;

    /// Laedt den Record einer Session
    async fn get(&self, id: &SessionId) -> CustodianResult<Option<SessionSecurityRecord>>;

    /// Traegt einen Teilnehmer ins Roster ein (ersetzt bei gleicher ID)
    async fn upsert_roster_entry(
        &self,
        id: &SessionId,
        eintrag: RosterEintrag,
    ) -> CustodianResult<()>;

    /// Entfernt einen Teilnehmer aus dem Roster
    async fn remove_roster_entry(
        &self,
        id: &SessionId,
        participant_id: &ParticipantId,
    ) -> CustodianResult<bool>;

    /// Setzt den Session-Status
    async fn set_status(&self, id: &SessionId, status: SessionStatus) -> CustodianResult<()>;

    /// Speichert einen Chunk und schreibt die Record-Zaehler fort
    async fn insert_chunk(
        &self,
        storage_id: StorageId,
        chunk: EncryptedChunk,
    ) -> CustodianResult<()>;

    /// Hoechste gespeicherte Sequenz-Nummer eines Teilnehmer-Streams
    async fn last_sequence(
        &self,
        id: &SessionId,
        participant_id: &ParticipantId,
    ) -> CustodianResult<Option<u64>>;

    /// Alle Chunks einer Session, geordnet nach (Teilnehmer, Sequenz)
    async fn chunks(&self, id: &SessionId) -> CustodianResult<Vec<EncryptedChunk>>;

    /// Loescht Record und alle Chunks atomar; gibt die Chunk-Anzahl zurueck
    async fn delete(&self, id: &SessionId) -> CustodianResult<u64>;

    /// Anzahl aktuell gehaltener Sessions
    async fn session_count(&self) -> CustodianResult<u64>;
}

struct SessionDaten {
    record: SessionSecurityRecord,
    chunks: Vec<(StorageId, EncryptedChunk)>,
}

/// In-Memory-Repository auf Basis einer `DashMap`
///
/// Record und Chunks einer Session liegen im selben Map-Eintrag;
/// `delete` entfernt beides in einem Schritt.
#[derive(Default)]
pub struct MemoryRepository {
    sessions: DashMap<SessionId, SessionDaten>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for MemoryRepository {
    async fn create(&self, neu: NeueSession) -> CustodianResult<SessionSecurityRecord> {
        let session_id = neu.session_id.clone();
        match self.sessions.entry(session_id) {
            Entry::Occupied(vorhanden) => Err(CustodianError::SessionBereitsVorhanden(
                vorhanden.key().as_str().to_string(),
            )),
            Entry::Vacant(platz) => {
                let record = SessionSecurityRecord::neu(neu);
                platz.insert(SessionDaten {
                    record: record.clone(),
                    chunks: Vec::new(),
                });
                Ok(record)
            }
        }
    }

    async fn get(&self, id: &SessionId) -> CustodianResult<Option<SessionSecurityRecord>> {
        Ok(self.sessions.get(id).map(|daten| daten.record.clone()))
    }

    async fn upsert_roster_entry(
        &self,
        id: &SessionId,
        eintrag: RosterEintrag,
    ) -> CustodianResult<()> {
        let mut daten = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| CustodianError::SessionNichtGefunden(id.as_str().to_string()))?;

        let roster = &mut daten.record.roster;
        match roster
            .iter_mut()
            .find(|e| e.participant_id == eintrag.participant_id)
        {
            Some(vorhanden) => *vorhanden = eintrag,
            None => roster.push(eintrag),
        }
        daten.record.aktualisiert_am = Utc::now();
        Ok(())
    }

    async fn remove_roster_entry(
        &self,
        id: &SessionId,
        participant_id: &ParticipantId,
    ) -> CustodianResult<bool> {
        let mut daten = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| CustodianError::SessionNichtGefunden(id.as_str().to_string()))?;

        let vorher = daten.record.roster.len();
        daten
            .record
            .roster
            .retain(|e| &e.participant_id != participant_id);
        let entfernt = daten.record.roster.len() < vorher;
        if entfernt {
            daten.record.aktualisiert_am = Utc::now();
        }
        Ok(entfernt)
    }

    async fn set_status(&self, id: &SessionId, status: SessionStatus) -> CustodianResult<()> {
        let mut daten = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| CustodianError::SessionNichtGefunden(id.as_str().to_string()))?;
        daten.record.status = status;
        daten.record.aktualisiert_am = Utc::now();
        Ok(())
    }

    async fn insert_chunk(
        &self,
        storage_id: StorageId,
        chunk: EncryptedChunk,
    ) -> CustodianResult<()> {
        let mut daten = self.sessions.get_mut(&chunk.session_id).ok_or_else(|| {
            CustodianError::SessionNichtGefunden(chunk.session_id.as_str().to_string())
        })?;

        daten.record.chunk_anzahl += 1;
        daten.record.gesamt_bytes += chunk.klartext_laenge;
        daten.record.aktualisiert_am = Utc::now();
        daten.chunks.push((storage_id, chunk));
        Ok(())
    }

    async fn last_sequence(
        &self,
        id: &SessionId,
        participant_id: &ParticipantId,
    ) -> CustodianResult<Option<u64>> {
        let daten = self
            .sessions
            .get(id)
            .ok_or_else(|| CustodianError::SessionNichtGefunden(id.as_str().to_string()))?;

        Ok(daten
            .chunks
            .iter()
            .filter(|(_, chunk)| &chunk.participant_id == participant_id)
            .map(|(_, chunk)| chunk.sequenz)
            .max())
    }

    async fn chunks(&self, id: &SessionId) -> CustodianResult<Vec<EncryptedChunk>> {
        let daten = self
            .sessions
            .get(id)
            .ok_or_else(|| CustodianError::SessionNichtGefunden(id.as_str().to_string()))?;

        let mut chunks: Vec<EncryptedChunk> =
            daten.chunks.iter().map(|(_, chunk)| chunk.clone()).collect();
        chunks.sort_by(|a, b| a.stream_schluessel().cmp(&b.stream_schluessel()));
        Ok(chunks)
    }

    async fn delete(&self, id: &SessionId) -> CustodianResult<u64> {
        match self.sessions.remove(id) {
            Some((_, daten)) => Ok(daten.chunks.len() as u64),
            None => Err(CustodianError::SessionNichtGefunden(
                id.as_str().to_string(),
            )),
        }
    }

    async fn session_count(&self) -> CustodianResult<u64> {
        Ok(self.sessions.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
