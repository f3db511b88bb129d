//! CustodianService – verschluesselte Chunks annehmen, auflisten, loeschen
//!
//! Der Kustode ist die Server-Seite der E2E-Architektur: er speichert
//! Chunk-Records und Session-Metadaten, erhaelt aber zu keinem Zeitpunkt
//! Schluesselmaterial oder Klartext. Diese Eigenschaft ist strukturell:
//! das Crate haengt nicht von `soundproof-crypto` ab und besitzt damit
//! zur Compilezeit keine Entschluesselungs-Faehigkeit.

use std::sync::Arc;

use soundproof_core::{EventBus, ParticipantId, SessionId, SoundproofEvent, StorageId};
use soundproof_protocol::EncryptedChunk;

use crate::{
    config::CustodianConfig,
    error::{CustodianError, CustodianResult},
    repository::SessionRepository,
    types::{NeueSession, RosterEintrag, SessionSecurityRecord, SessionStatus},
};

/// CustodianService verwaltet Session-Records und verschluesselte Chunks
pub struct CustodianService<R: SessionRepository> {
    repo: Arc<R>,
    config: CustodianConfig,
    event_bus: Option<Arc<dyn EventBus>>,
}

impl<R: SessionRepository> CustodianService<R> {
    /// Erstellt einen neuen CustodianService
    pub fn neu(repo: Arc<R>, config: CustodianConfig) -> Arc<Self> {
        Arc::new(Self {
            repo,
            config,
            event_bus: None,
        })
    }

    /// Erstellt einen CustodianService mit Event-Bus
    pub fn mit_event_bus(
        repo: Arc<R>,
        config: CustodianConfig,
        event_bus: Arc<dyn EventBus>,
    ) -> Arc<Self> {
        Arc::new(Self {
            repo,
            config,
            event_bus: Some(event_bus),
        })
    }

    /// Legt eine Session beim Kustoden an
    pub async fn session_anlegen(
        &self,
        neu: NeueSession,
    ) -> CustodianResult<SessionSecurityRecord> {
        let belegt = self.repo.session_count().await?;
        if belegt >= self.config.limits.max_sessions {
            return Err(CustodianError::KontingentErschoepft {
                belegt,
                max: self.config.limits.max_sessions,
            });
        }

        let session_id = neu.session_id.clone();
        let record = self.repo.create(neu).await?;

        tracing::debug!(session = %session_id, "Session angelegt");
        self.event_senden(SoundproofEvent::SessionAngelegt { session_id });
        Ok(record)
    }

    /// Registriert einen Teilnehmer im Roster einer aktiven Session
    ///
    /// Idempotent pro Teilnehmer-ID (Reconnect ersetzt den Eintrag).
    pub async fn teilnehmer_registrieren(
        &self,
        session_id: &SessionId,
        eintrag: RosterEintrag,
    ) -> CustodianResult<()> {
        let record = self.record_laden(session_id).await?;
        if record.status == SessionStatus::Beendet {
            return Err(CustodianError::SessionBeendet(
                session_id.as_str().to_string(),
            ));
        }

        let participant_id = eintrag.participant_id.clone();
        self.repo.upsert_roster_entry(session_id, eintrag).await?;

        tracing::debug!(session = %session_id, teilnehmer = %participant_id, "Teilnehmer registriert");
        self.event_senden(SoundproofEvent::TeilnehmerRegistriert {
            session_id: session_id.clone(),
            participant_id,
        });
        Ok(())
    }

    /// Entfernt einen Teilnehmer aus dem Roster
    ///
    /// Danach ist der Teilnehmer fuer neue Lese-Zugriffe nicht mehr
    /// autorisiert. Bereits bei ihm liegende Schluessel werden dadurch
    /// nicht entwertet - das entscheidet die Host-Seite per Rotation.
    pub async fn teilnehmer_entfernen(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
    ) -> CustodianResult<bool> {
        let entfernt = self
            .repo
            .remove_roster_entry(session_id, participant_id)
            .await?;

        if entfernt {
            tracing::debug!(session = %session_id, teilnehmer = %participant_id, "Teilnehmer entfernt");
            self.event_senden(SoundproofEvent::TeilnehmerEntfernt {
                session_id: session_id.clone(),
                participant_id: participant_id.clone(),
            });
        }
        Ok(entfernt)
    }

    /// Nimmt einen verschluesselten Chunk zur Speicherung an
    ///
    /// Prueft Session-Status, Autorisierung des Absenders, Groessen-
    /// und Kontingent-Grenzen sowie die strenge Monotonie der
    /// Sequenz-Nummern pro Teilnehmer-Stream. Luecken sind erlaubt
    /// (ein verworfener Chunk blockiert den Stream nicht).
    pub async fn chunk_speichern(&self, chunk: EncryptedChunk) -> CustodianResult<StorageId> {
        let record = self.record_laden(&chunk.session_id).await?;

        if record.status == SessionStatus::Beendet {
            return Err(CustodianError::SessionBeendet(
                chunk.session_id.as_str().to_string(),
            ));
        }

        if !record.ist_autorisiert(&chunk.participant_id) {
            return Err(CustodianError::KeineBerechtigung(format!(
                "{} ist nicht im Roster von {}",
                chunk.participant_id, chunk.session_id
            )));
        }

        if chunk.klartext_laenge > self.config.limits.max_chunk_bytes {
            return Err(CustodianError::ChunkZuGross {
                groesse: chunk.klartext_laenge,
                max: self.config.limits.max_chunk_bytes,
            });
        }

        if record.chunk_anzahl >= self.config.limits.max_chunks_pro_session {
            return Err(CustodianError::KontingentErschoepft {
                belegt: record.chunk_anzahl,
                max: self.config.limits.max_chunks_pro_session,
            });
        }

        if let Some(letzte) = self
            .repo
            .last_sequence(&chunk.session_id, &chunk.participant_id)
            .await?
        {
            if chunk.sequenz <= letzte {
                return Err(CustodianError::UngueltigeSequenz {
                    participant: chunk.participant_id.as_str().to_string(),
                    letzte,
                    erhalten: chunk.sequenz,
                });
            }
        }

        let storage_id = StorageId::new();
        let session_id = chunk.session_id.clone();
        let participant_id = chunk.participant_id.clone();
        let sequenz = chunk.sequenz;

        self.repo.insert_chunk(storage_id, chunk).await?;

        tracing::debug!(
            session = %session_id,
            teilnehmer = %participant_id,
            sequenz,
            %storage_id,
            "Chunk gespeichert"
        );
        self.event_senden(SoundproofEvent::ChunkGespeichert {
            session_id,
            participant_id,
            sequenz,
            storage_id,
        });
        Ok(storage_id)
    }

    /// Listet alle Chunks einer Session, geordnet nach (Teilnehmer, Sequenz)
    ///
    /// Autorisierung: der Aufrufer muss Host oder aktuell registrierter
    /// Teilnehmer sein. Entfernte Teilnehmer erhalten keine neuen
    /// Lese-Zugriffe mehr.
    pub async fn chunks_auflisten(
        &self,
        session_id: &SessionId,
        caller_id: &ParticipantId,
    ) -> CustodianResult<Vec<EncryptedChunk>> {
        let record = self.record_laden(session_id).await?;

        if !record.ist_autorisiert(caller_id) {
            return Err(CustodianError::KeineBerechtigung(format!(
                "{} ist nicht fuer {} autorisiert",
                caller_id, session_id
            )));
        }

        self.repo.chunks(session_id).await
    }

    /// Beendet eine Session (nur Host); danach werden keine Chunks mehr
    /// angenommen
    pub async fn session_beenden(
        &self,
        session_id: &SessionId,
        requester_id: &ParticipantId,
    ) -> CustodianResult<()> {
        let record = self.record_laden(session_id).await?;
        self.nur_host(&record, requester_id)?;

        self.repo
            .set_status(session_id, SessionStatus::Beendet)
            .await?;

        tracing::debug!(session = %session_id, "Session beendet");
        self.event_senden(SoundproofEvent::SessionBeendet {
            session_id: session_id.clone(),
        });
        Ok(())
    }

    /// Loescht eine Session samt aller Chunks (nur Host)
    ///
    /// Die Loeschung ist total und sofort: Record und Chunks verschwinden
    /// atomar (Compliance-Loeschung).
    pub async fn session_loeschen(
        &self,
        session_id: &SessionId,
        requester_id: &ParticipantId,
    ) -> CustodianResult<u64> {
        let record = self.record_laden(session_id).await?;
        self.nur_host(&record, requester_id)?;

        let chunks_entfernt = self.repo.delete(session_id).await?;

        tracing::debug!(session = %session_id, chunks_entfernt, "Session geloescht");
        self.event_senden(SoundproofEvent::SessionGeloescht {
            session_id: session_id.clone(),
            chunks_entfernt,
        });
        Ok(chunks_entfernt)
    }

    /// Laedt den Sicherheits-Record einer Session
    pub async fn session_record(
        &self,
        session_id: &SessionId,
    ) -> CustodianResult<SessionSecurityRecord> {
        self.record_laden(session_id).await
    }

    async fn record_laden(&self, session_id: &SessionId) -> CustodianResult<SessionSecurityRecord> {
        self.repo
            .get(session_id)
            .await?
            .ok_or_else(|| CustodianError::SessionNichtGefunden(session_id.as_str().to_string()))
    }

    fn nur_host(
        &self,
        record: &SessionSecurityRecord,
        requester_id: &ParticipantId,
    ) -> CustodianResult<()> {
        if &record.host_id != requester_id {
            return Err(CustodianError::KeineBerechtigung(format!(
                "{} ist nicht Host von {}",
                requester_id, record.session_id
            )));
        }
        Ok(())
    }

    fn event_senden(&self, event: SoundproofEvent) {
        if let Some(bus) = &self.event_bus {
            if let Err(e) = bus.senden(event) {
                tracing::warn!(fehler = %e, "Event-Zustellung fehlgeschlagen");
            }
        }
    }
}
