//! Signalisierungs-Nachrichten fuer den Schluesselaustausch
//!
//! Der Signalisierungskanal ist ein externer Kollaborateur (WebSocket,
//! Server-Relay, etc.). Dieses Modul definiert nur die Nachrichtsformen
//! und eine In-Prozess-Implementierung fuer Tests.
//!
//! Zustellgarantie: mindestens einmal pro Teilnehmer. Empfaenger muessen
//! Duplikate gefahrlos ignorieren koennen (identischer Grant idempotent,
//! abweichender Grant: der zuletzt empfangene gewinnt).

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use soundproof_core::{ParticipantId, Result, SessionId, SoundproofError};

use crate::chunk::AeadAlgorithm;

/// Signalisierungs-Nachricht zwischen Host und Teilnehmern
///
/// Alle binaeren Felder (Schluessel, Grants) sind Base64-Text. Private
/// Schluessel und Session-Schluessel im Klartext kommen hier nie vor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SignalingMessage {
    /// Host kuendigt eine gesicherte Session an
    ///
    /// Passphrase und Fingerprint dienen der Out-of-Band-Verifikation
    /// durch die Teilnehmer (z.B. Vorlesen im Call).
    SessionAnnounce {
        /// Session-ID
        session_id: SessionId,
        /// Oeffentlicher Schluessel des Hosts (Base64)
        host_public_key: String,
        /// Menschenlesbare Passphrase
        passphrase: String,
        /// Fingerprint des Host-Schluessels
        host_fingerprint: String,
    },

    /// Teilnehmer meldet sich mit seinem oeffentlichen Schluessel
    ParticipantHello {
        /// Session-ID
        session_id: SessionId,
        /// Teilnehmer-ID
        participant_id: ParticipantId,
        /// Anzeigename des Teilnehmers
        participant_name: String,
        /// Oeffentlicher Schluessel des Teilnehmers (Base64)
        public_key: String,
    },

    /// Host liefert den versiegelten Session-Schluessel an einen Teilnehmer
    KeyGrant {
        /// Session-ID
        session_id: SessionId,
        /// Empfaenger des Grants
        participant_id: ParticipantId,
        /// Versiegelter Session-Schluessel (Base64)
        sealed_session_key: String,
        /// Algorithmus des enthaltenen Session-Schluessels
        algorithm: AeadAlgorithm,
    },
}

/// Trait fuer den Signalisierungskanal (Sende-Seite)
///
/// Die produktive Implementierung (WebSocket-Relay o.ae.) liegt ausserhalb
/// dieses Workspaces; fuer Tests und In-Prozess-Betrieb gibt es
/// [`MemorySignaling`].
#[allow(async_fn_in_trait)]
pub trait SignalingChannel: Send + Sync {
    /// Stellt eine Nachricht zu (mindestens einmal)
    async fn senden(&self, nachricht: SignalingMessage) -> Result<()>;
}

/// In-Prozess-Signalisierung ueber einen tokio-Kanal
#[derive(Debug, Clone)]
pub struct MemorySignaling {
    tx: mpsc::UnboundedSender<SignalingMessage>,
}

/// Empfaenger-Seite der In-Prozess-Signalisierung
#[derive(Debug)]
pub struct MemorySignalingEmpfaenger {
    rx: mpsc::UnboundedReceiver<SignalingMessage>,
}

impl MemorySignaling {
    /// Erstellt ein verbundenes Sender/Empfaenger-Paar
    pub fn paar() -> (Self, MemorySignalingEmpfaenger) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, MemorySignalingEmpfaenger { rx })
    }
}

impl SignalingChannel for MemorySignaling {
    async fn senden(&self, nachricht: SignalingMessage) -> Result<()> {
        self.tx
            .send(nachricht)
            .map_err(|e| SoundproofError::Signalisierung(e.to_string()))
    }
}

impl MemorySignalingEmpfaenger {
    /// Empfaengt die naechste Nachricht; `None` wenn alle Sender weg sind
    pub async fn empfangen(&mut self) -> Option<SignalingMessage> {
        self.rx.recv().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
