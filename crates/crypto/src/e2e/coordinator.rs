//! Session-Sicherheits-Koordination
//!
//! Orchestriert die Host- und Teilnehmer-Rolle einer gesicherten
//! Aufnahme-Session:
//! - Host: erzeugt Session-Schluessel + Identitaet, versiegelt den
//!   Schluessel pro Teilnehmer, fuehrt das Roster
//! - Teilnehmer: erzeugt eigene Identitaet, empfaengt und verifiziert
//!   den versiegelten Session-Schluessel
//!
//! Beide Rollen geben niemals Session-Schluessel oder private Schluessel
//! nach aussen - nur oeffentliches Material (Public Key, Passphrase,
//! Fingerprint).
//!
//! Koordinator-Instanzen werden pro Prozess/Session konstruiert und
//! injiziert; es gibt keinen globalen Zustand.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

use soundproof_core::{ParticipantId, SessionId};
use soundproof_protocol::AeadAlgorithm;

use crate::codec;
use crate::e2e::cipher;
use crate::e2e::key_exchange;
use crate::error::{CryptoError, CryptoResult};
use crate::types::{IdentityKeyPair, KeyGrant, PublicKey, SessionKey};

/// Alphabet fuer Passphrasen (ohne verwechselbare Zeichen wie I/1, O/0)
const PASSPHRASE_ZEICHEN: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const PASSPHRASE_GRUPPEN: usize = 3;
const PASSPHRASE_GRUPPEN_LAENGE: usize = 4;

/// Testdaten fuer die Selbst-Verifikation eines empfangenen Schluessels
const SELBSTTEST_DATEN: &[u8] = b"soundproof-selbsttest";

/// Phase der Host-Rolle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    Uninitialisiert,
    SchluesselErzeugt,
    Bereit,
}

impl HostPhase {
    fn as_str(self) -> &'static str {
        match self {
            HostPhase::Uninitialisiert => "uninitialisiert",
            HostPhase::SchluesselErzeugt => "schluessel_erzeugt",
            HostPhase::Bereit => "bereit",
        }
    }
}

/// Phase der Teilnehmer-Rolle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantPhase {
    Uninitialisiert,
    WartetAufGrant,
    SchluesselErhalten,
}

/// Oeffentliches Material des Hosts nach der Initialisierung
///
/// Enthaelt bewusst weder Session-Schluessel noch privaten Schluessel.
#[derive(Debug, Clone)]
pub struct HostPublicMaterial {
    /// Oeffentlicher Schluessel des Hosts (Base64)
    pub public_key_b64: String,
    /// Menschenlesbare Passphrase fuer die Out-of-Band-Verifikation
    pub passphrase: String,
    /// Fingerprint des Host-Schluessels
    pub fingerprint: String,
}

/// Oeffentliches Material eines Teilnehmers nach der Initialisierung
#[derive(Debug, Clone)]
pub struct ParticipantPublicMaterial {
    /// Eigener oeffentlicher Schluessel (Base64)
    pub public_key_b64: String,
    /// Eigener Fingerprint
    pub fingerprint: String,
    /// Fingerprint des importierten Host-Schluessels (fuer gegenseitige Anzeige)
    pub host_fingerprint: String,
}

/// Roster-Eintrag eines Teilnehmers (nur Audit-Material, kein Schluessel)
#[derive(Debug, Clone)]
pub struct RosterEntry {
    /// Teilnehmer-ID
    pub participant_id: ParticipantId,
    /// Anzeigename
    pub name: String,
    /// Fingerprint des importierten oeffentlichen Schluessels
    pub fingerprint: String,
    /// Zeitpunkt der Aufnahme ins Roster
    pub hinzugefuegt_am: DateTime<Utc>,
}

struct HostInner {
    session_id: SessionId,
    session_key: Arc<SessionKey>,
    identity: IdentityKeyPair,
    passphrase: String,
    fingerprint: String,
}

/// Host-Seite der Session-Sicherheit
///
/// Phasen: `Uninitialisiert -> SchluesselErzeugt -> Bereit` (terminal
/// bis `cleanup`). Methoden nehmen `&self`; das Roster liegt in einer
/// `DashMap`, der restliche Zustand hinter einem `RwLock`, damit
/// nebenlaeufige `add_participant`-Aufrufe sicher sind.
pub struct HostCoordinator {
    phase: RwLock<HostPhase>,
    inner: RwLock<Option<HostInner>>,
    roster: DashMap<ParticipantId, RosterEntry>,
}

impl HostCoordinator {
    pub fn new() -> Self {
        Self {
            phase: RwLock::new(HostPhase::Uninitialisiert),
            inner: RwLock::new(None),
            roster: DashMap::new(),
        }
    }

    /// Initialisiert die Host-Rolle fuer eine Session
    ///
    /// Erzeugt Session-Schluessel, Identitaets-Paar und Passphrase.
    /// Alles-oder-nichts: schlaegt ein Schritt fehl, bleibt kein
    /// benutzbarer Teilzustand zurueck.
    pub fn initialize(
        &self,
        session_id: SessionId,
        algorithm: AeadAlgorithm,
    ) -> CryptoResult<HostPublicMaterial> {
        let mut inner = self.inner.write();
        if inner.is_some() {
            return Err(CryptoError::UngueltigerZustand {
                erwartet: "uninitialisiert",
                aktuell: self.phase.read().as_str(),
            });
        }

        let session_key = cipher::generate_session_key(&session_id, algorithm)
            .map_err(|e| CryptoError::SicherheitsInit(e.to_string()))?;
        *self.phase.write() = HostPhase::SchluesselErzeugt;

        let identity = match key_exchange::generate_identity_pair() {
            Ok(identity) => identity,
            Err(e) => {
                // Kein Teilzustand: Phase vollstaendig zuruecksetzen
                *self.phase.write() = HostPhase::Uninitialisiert;
                return Err(CryptoError::SicherheitsInit(e.to_string()));
            }
        };

        let passphrase = passphrase_generieren();
        let fingerprint = codec::fingerprint(identity.public_key.as_bytes());
        let public_key_b64 = codec::encode_binary(identity.public_key.as_bytes());

        *inner = Some(HostInner {
            session_id: session_id.clone(),
            session_key: Arc::new(session_key),
            identity,
            passphrase: passphrase.clone(),
            fingerprint: fingerprint.clone(),
        });
        *self.phase.write() = HostPhase::Bereit;

        tracing::debug!(session = %session_id, %fingerprint, "Host-Koordinator bereit");

        Ok(HostPublicMaterial {
            public_key_b64,
            passphrase,
            fingerprint,
        })
    }

    /// Nimmt einen Teilnehmer auf und versiegelt den Session-Schluessel
    /// fuer dessen oeffentlichen Schluessel
    ///
    /// Idempotent pro Teilnehmer-ID: erneutes Aufnehmen (Reconnect)
    /// ersetzt den frueheren Roster-Eintrag und liefert einen frischen
    /// Grant. Das Roster speichert nur den Fingerprint, nie den vollen
    /// Schluessel.
    pub fn add_participant(
        &self,
        participant_id: ParticipantId,
        name: &str,
        public_key_b64: &str,
    ) -> CryptoResult<KeyGrant> {
        let inner_guard = self.inner.read();
        let inner = inner_guard.as_ref().ok_or(CryptoError::UngueltigerZustand {
            erwartet: "bereit",
            aktuell: "uninitialisiert",
        })?;

        let key_bytes = codec::decode_binary(public_key_b64)
            .map_err(|e| CryptoError::TeilnehmerImport(e.to_string()))?;
        let public_key = PublicKey::from_slice(&key_bytes)
            .map_err(|e| CryptoError::TeilnehmerImport(e.to_string()))?;

        let sealed = key_exchange::encrypt_for_public_key(
            &public_key,
            inner.session_key.key_bytes.as_bytes(),
        )?;

        let fingerprint = codec::fingerprint(public_key.as_bytes());
        self.roster.insert(
            participant_id.clone(),
            RosterEntry {
                participant_id: participant_id.clone(),
                name: name.to_string(),
                fingerprint: fingerprint.clone(),
                hinzugefuegt_am: Utc::now(),
            },
        );

        tracing::debug!(teilnehmer = %participant_id, %fingerprint, "Session-Schluessel versiegelt");

        Ok(KeyGrant {
            session_id: inner.session_id.clone(),
            participant_id,
            sealed_session_key: codec::encode_binary(&sealed),
            algorithm: inner.session_key.algorithm,
        })
    }

    /// Entfernt einen Teilnehmer aus dem Roster
    ///
    /// Reine Buchfuehrung: bereits zugestellte Grants bleiben technisch
    /// gueltig. Harte Ausgrenzung erfordert anschliessend
    /// [`rotate_session_key`](Self::rotate_session_key).
    pub fn remove_participant(&self, participant_id: &ParticipantId) -> bool {
        let entfernt = self.roster.remove(participant_id).is_some();
        if entfernt {
            tracing::debug!(teilnehmer = %participant_id, "Teilnehmer aus Roster entfernt");
        }
        entfernt
    }

    /// Rotiert den Session-Schluessel und versiegelt ihn neu fuer die
    /// verbliebenen Teilnehmer
    ///
    /// `empfaenger` liefert die aktuellen oeffentlichen Schluessel
    /// (Base64) pro Teilnehmer-ID; jeder Empfaenger muss im Roster
    /// stehen und sein Fingerprint zum Roster-Eintrag passen. Chunks,
    /// die unter dem alten Schluessel verschluesselt wurden, bleiben
    /// nur fuer dessen Inhaber lesbar.
    pub fn rotate_session_key(
        &self,
        empfaenger: &HashMap<ParticipantId, String>,
    ) -> CryptoResult<HashMap<ParticipantId, KeyGrant>> {
        let mut inner_guard = self.inner.write();
        let inner = inner_guard.as_mut().ok_or(CryptoError::UngueltigerZustand {
            erwartet: "bereit",
            aktuell: "uninitialisiert",
        })?;

        // Erst alle Empfaenger validieren, dann den Schluessel tauschen
        let mut keys: Vec<(ParticipantId, PublicKey)> = Vec::with_capacity(empfaenger.len());
        for (id, pk_b64) in empfaenger {
            let eintrag = self.roster.get(id).ok_or_else(|| {
                CryptoError::TeilnehmerImport(format!("{} steht nicht im Roster", id))
            })?;
            let bytes = codec::decode_binary(pk_b64)
                .map_err(|e| CryptoError::TeilnehmerImport(e.to_string()))?;
            let pk = PublicKey::from_slice(&bytes)
                .map_err(|e| CryptoError::TeilnehmerImport(e.to_string()))?;
            if codec::fingerprint(pk.as_bytes()) != eintrag.fingerprint {
                return Err(CryptoError::TeilnehmerImport(format!(
                    "Fingerprint-Abweichung fuer {}",
                    id
                )));
            }
            keys.push((id.clone(), pk));
        }

        let neuer_schluessel =
            cipher::generate_session_key(&inner.session_id, inner.session_key.algorithm)?;
        inner.session_key = Arc::new(neuer_schluessel);

        let mut grants = HashMap::with_capacity(keys.len());
        for (id, pk) in keys {
            let sealed =
                key_exchange::encrypt_for_public_key(&pk, inner.session_key.key_bytes.as_bytes())?;
            grants.insert(
                id.clone(),
                KeyGrant {
                    session_id: inner.session_id.clone(),
                    participant_id: id,
                    sealed_session_key: codec::encode_binary(&sealed),
                    algorithm: inner.session_key.algorithm,
                },
            );
        }

        tracing::debug!(grants = grants.len(), "Session-Schluessel rotiert");
        Ok(grants)
    }

    /// Prueft eine Passphrase in Konstantzeit gegen die gespeicherte
    pub fn verify_passphrase(&self, kandidat: &str) -> bool {
        match self.inner.read().as_ref() {
            Some(inner) => passphrase_vergleich(&inner.passphrase, kandidat),
            None => false,
        }
    }

    /// Gibt den Session-Schluessel fuer die Pipeline zurueck
    pub fn session_key(&self) -> CryptoResult<Arc<SessionKey>> {
        self.inner
            .read()
            .as_ref()
            .map(|inner| Arc::clone(&inner.session_key))
            .ok_or(CryptoError::UngueltigerZustand {
                erwartet: "bereit",
                aktuell: "uninitialisiert",
            })
    }

    /// Eigener Schluessel-Fingerprint (None vor der Initialisierung)
    pub fn fingerprint(&self) -> Option<String> {
        self.inner.read().as_ref().map(|i| i.fingerprint.clone())
    }

    /// Eigener oeffentlicher Schluessel als Base64 (None vor der Initialisierung)
    pub fn public_key_b64(&self) -> Option<String> {
        self.inner
            .read()
            .as_ref()
            .map(|i| codec::encode_binary(i.identity.public_key.as_bytes()))
    }

    /// Aktuelle Phase der Host-Rolle
    pub fn phase(&self) -> HostPhase {
        *self.phase.read()
    }

    /// Kopie der aktuellen Roster-Eintraege (Audit-Ansicht)
    pub fn roster_eintraege(&self) -> Vec<RosterEntry> {
        self.roster.iter().map(|e| e.value().clone()).collect()
    }

    /// Verwirft Session-Schluessel, Identitaet, Roster und Passphrase
    ///
    /// Idempotent; gefahrlos auf uninitialisiertem Zustand aufrufbar.
    /// Laufende Verschluesselungen auf bereits geklonten `Arc`-Handles
    /// laufen unbeeinflusst zu Ende.
    pub fn cleanup(&self) {
        *self.inner.write() = None;
        self.roster.clear();
        *self.phase.write() = HostPhase::Uninitialisiert;
        tracing::debug!("Host-Koordinator bereinigt");
    }
}

impl Default for HostCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

struct ParticipantInner {
    session_id: SessionId,
    identity: IdentityKeyPair,
    passphrase: String,
    fingerprint: String,
    host_fingerprint: String,
    session_key: Option<Arc<SessionKey>>,
    letzter_grant: Option<Vec<u8>>,
}

/// Teilnehmer-Seite der Session-Sicherheit
///
/// Phasen: `Uninitialisiert -> WartetAufGrant -> SchluesselErhalten`
/// (terminal bis `cleanup`).
pub struct ParticipantCoordinator {
    inner: RwLock<Option<ParticipantInner>>,
}

impl ParticipantCoordinator {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Initialisiert die Teilnehmer-Rolle
    ///
    /// Erzeugt das eigene Identitaets-Paar, importiert den oeffentlichen
    /// Schluessel des Hosts und berechnet beide Fingerprints fuer die
    /// gegenseitige Anzeige. Der Session-Schluessel liegt danach noch
    /// NICHT vor.
    pub fn initialize(
        &self,
        session_id: SessionId,
        host_public_key_b64: &str,
        passphrase: &str,
    ) -> CryptoResult<ParticipantPublicMaterial> {
        let mut inner = self.inner.write();
        if inner.is_some() {
            return Err(CryptoError::UngueltigerZustand {
                erwartet: "uninitialisiert",
                aktuell: "initialisiert",
            });
        }

        let host_key_bytes = codec::decode_binary(host_public_key_b64)
            .map_err(|e| CryptoError::SicherheitsInit(e.to_string()))?;
        let host_public_key = PublicKey::from_slice(&host_key_bytes)
            .map_err(|e| CryptoError::SicherheitsInit(e.to_string()))?;

        let identity = key_exchange::generate_identity_pair()
            .map_err(|e| CryptoError::SicherheitsInit(e.to_string()))?;

        let fingerprint = codec::fingerprint(identity.public_key.as_bytes());
        let host_fingerprint = codec::fingerprint(host_public_key.as_bytes());
        let public_key_b64 = codec::encode_binary(identity.public_key.as_bytes());

        *inner = Some(ParticipantInner {
            session_id: session_id.clone(),
            identity,
            passphrase: passphrase.to_string(),
            fingerprint: fingerprint.clone(),
            host_fingerprint: host_fingerprint.clone(),
            session_key: None,
            letzter_grant: None,
        });

        tracing::debug!(session = %session_id, %fingerprint, "Teilnehmer-Koordinator wartet auf Grant");

        Ok(ParticipantPublicMaterial {
            public_key_b64,
            fingerprint,
            host_fingerprint,
        })
    }

    /// Empfaengt den versiegelten Session-Schluessel
    ///
    /// Oeffnet den Grant mit dem eigenen privaten Schluessel und fuehrt
    /// VOR der Uebernahme einen Selbsttest-Roundtrip durch, damit ein
    /// korrupter Schluessel sofort auffaellt statt beim ersten echten
    /// Chunk. Bei Fehlern bleibt die Phase `WartetAufGrant`; die
    /// Zustellung darf wiederholt werden. Identische Mehrfach-Zustellung
    /// ist ein No-Op, ein abweichender gueltiger Grant gewinnt.
    pub fn receive_session_key(&self, grant: &KeyGrant) -> CryptoResult<()> {
        let mut guard = self.inner.write();
        let inner = guard.as_mut().ok_or(CryptoError::UngueltigerZustand {
            erwartet: "wartet_auf_grant",
            aktuell: "uninitialisiert",
        })?;

        if grant.session_id != inner.session_id {
            return Err(CryptoError::KeyExchange(format!(
                "Grant gehoert zu {}, erwartet {}",
                grant.session_id, inner.session_id
            )));
        }

        let sealed = codec::decode_binary(&grant.sealed_session_key)
            .map_err(|e| CryptoError::KeyExchange(e.to_string()))?;

        if inner.session_key.is_some() && inner.letzter_grant.as_deref() == Some(sealed.as_slice())
        {
            return Ok(());
        }

        let key_bytes = key_exchange::decrypt_with_private_key(&inner.identity, &sealed)
            .map_err(|e| CryptoError::KeyExchange(e.to_string()))?;

        let kandidat = SessionKey::new(inner.session_id.clone(), grant.algorithm, key_bytes)
            .map_err(|e| CryptoError::KeyExchange(e.to_string()))?;

        selbsttest(&kandidat)?;

        inner.session_key = Some(Arc::new(kandidat));
        inner.letzter_grant = Some(sealed);

        tracing::debug!(session = %inner.session_id, "Session-Schluessel empfangen und verifiziert");
        Ok(())
    }

    /// Prueft eine Passphrase in Konstantzeit gegen die gespeicherte
    pub fn verify_passphrase(&self, kandidat: &str) -> bool {
        match self.inner.read().as_ref() {
            Some(inner) => passphrase_vergleich(&inner.passphrase, kandidat),
            None => false,
        }
    }

    /// Gibt den empfangenen Session-Schluessel fuer die Pipeline zurueck
    pub fn session_key(&self) -> CryptoResult<Arc<SessionKey>> {
        self.inner
            .read()
            .as_ref()
            .and_then(|inner| inner.session_key.as_ref().map(Arc::clone))
            .ok_or(CryptoError::UngueltigerZustand {
                erwartet: "schluessel_erhalten",
                aktuell: "wartet_auf_grant",
            })
    }

    /// Eigener Schluessel-Fingerprint (None vor der Initialisierung)
    pub fn fingerprint(&self) -> Option<String> {
        self.inner.read().as_ref().map(|i| i.fingerprint.clone())
    }

    /// Fingerprint des Host-Schluessels (None vor der Initialisierung)
    pub fn host_fingerprint(&self) -> Option<String> {
        self.inner
            .read()
            .as_ref()
            .map(|i| i.host_fingerprint.clone())
    }

    /// Eigener oeffentlicher Schluessel als Base64 (None vor der Initialisierung)
    pub fn public_key_b64(&self) -> Option<String> {
        self.inner
            .read()
            .as_ref()
            .map(|i| codec::encode_binary(i.identity.public_key.as_bytes()))
    }

    /// Aktuelle Phase der Teilnehmer-Rolle
    pub fn phase(&self) -> ParticipantPhase {
        match self.inner.read().as_ref() {
            None => ParticipantPhase::Uninitialisiert,
            Some(inner) if inner.session_key.is_none() => ParticipantPhase::WartetAufGrant,
            Some(_) => ParticipantPhase::SchluesselErhalten,
        }
    }

    /// Verwirft Identitaet, Session-Schluessel und Passphrase
    ///
    /// Idempotent; gefahrlos auf uninitialisiertem Zustand aufrufbar.
    pub fn cleanup(&self) {
        *self.inner.write() = None;
        tracing::debug!("Teilnehmer-Koordinator bereinigt");
    }
}

impl Default for ParticipantCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Selbst-Verifikation eines empfangenen Schluessels (Roundtrip mit Testdaten)
fn selbsttest(key: &SessionKey) -> CryptoResult<()> {
    let payload = cipher::encrypt(key, SELBSTTEST_DATEN, b"selbsttest")
        .map_err(|e| CryptoError::KeyExchange(format!("Selbsttest: {}", e)))?;
    let zurueck = cipher::decrypt(key, &payload, b"selbsttest")
        .map_err(|e| CryptoError::KeyExchange(format!("Selbsttest: {}", e)))?;
    if zurueck != SELBSTTEST_DATEN {
        return Err(CryptoError::KeyExchange(
            "Selbsttest-Roundtrip weicht ab".to_string(),
        ));
    }
    Ok(())
}

/// Konstantzeit-Vergleich zweier Passphrasen
fn passphrase_vergleich(gespeichert: &str, kandidat: &str) -> bool {
    let a = gespeichert.as_bytes();
    let b = kandidat.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Generiert eine menschenlesbare Passphrase (z.B. `A2B4-CD9K-XY7Q`)
fn passphrase_generieren() -> String {
    let mut bytes = [0u8; PASSPHRASE_GRUPPEN * PASSPHRASE_GRUPPEN_LAENGE];
    OsRng.fill_bytes(&mut bytes);
    bytes
        .chunks(PASSPHRASE_GRUPPEN_LAENGE)
        .map(|gruppe| {
            gruppe
                .iter()
                .map(|b| PASSPHRASE_ZEICHEN[(*b as usize) % PASSPHRASE_ZEICHEN.len()] as char)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bereiter_host() -> (HostCoordinator, HostPublicMaterial) {
        let host = HostCoordinator::new();
        let material = host
            .initialize(SessionId::new("s1"), AeadAlgorithm::Aes256Gcm)
            .unwrap();
        (host, material)
    }

    fn wartender_teilnehmer(
        host_material: &HostPublicMaterial,
    ) -> (ParticipantCoordinator, ParticipantPublicMaterial) {
        let teilnehmer = ParticipantCoordinator::new();
        let material = teilnehmer
            .initialize(
                SessionId::new("s1"),
                &host_material.public_key_b64,
                &host_material.passphrase,
            )
            .unwrap();
        (teilnehmer, material)
    }

    #[test]
    fn host_initialisierung_liefert_nur_oeffentliches_material() {
        let (host, material) = bereiter_host();
        assert_eq!(host.phase(), HostPhase::Bereit);
        assert!(!material.public_key_b64.is_empty());
        assert!(!material.passphrase.is_empty());
        assert_eq!(material.fingerprint.split(':').count(), 8);
    }

    #[test]
    fn host_doppelte_initialisierung_schlaegt_fehl() {
        let (host, _) = bereiter_host();
        let result = host.initialize(SessionId::new("s2"), AeadAlgorithm::Aes256Gcm);
        assert!(matches!(
            result,
            Err(CryptoError::UngueltigerZustand { .. })
        ));
    }

    #[test]
    fn passphrase_format() {
        let (_, material) = bereiter_host();
        // 3 Gruppen zu 4 Zeichen, Bindestrich-getrennt
        assert_eq!(material.passphrase.len(), 14);
        assert_eq!(material.passphrase.split('-').count(), 3);
        assert!(!material.passphrase.contains('I'));
        assert!(!material.passphrase.contains('O'));
        assert!(!material.passphrase.contains('0'));
        assert!(!material.passphrase.contains('1'));
    }

    #[test]
    fn add_participant_liefert_grant() {
        let (host, host_material) = bereiter_host();
        let (_, teilnehmer_material) = wartender_teilnehmer(&host_material);

        let grant = host
            .add_participant(
                ParticipantId::new("u1"),
                "Alice",
                &teilnehmer_material.public_key_b64,
            )
            .unwrap();

        assert_eq!(grant.session_id, SessionId::new("s1"));
        assert_eq!(grant.participant_id, ParticipantId::new("u1"));
        assert!(!grant.sealed_session_key.is_empty());
        assert_eq!(host.roster_eintraege().len(), 1);
    }

    #[test]
    fn roster_speichert_nur_fingerprint() {
        let (host, host_material) = bereiter_host();
        let (_, teilnehmer_material) = wartender_teilnehmer(&host_material);

        host.add_participant(
            ParticipantId::new("u1"),
            "Alice",
            &teilnehmer_material.public_key_b64,
        )
        .unwrap();

        let eintrag = &host.roster_eintraege()[0];
        assert_eq!(eintrag.fingerprint, teilnehmer_material.fingerprint);
        assert_eq!(eintrag.name, "Alice");
    }

    #[test]
    fn kaputter_public_key_wird_abgelehnt() {
        let (host, _) = bereiter_host();

        let result = host.add_participant(ParticipantId::new("u1"), "Alice", "kein base64!");
        assert!(matches!(result, Err(CryptoError::TeilnehmerImport(_))));

        // Falsche Laenge (gueltiges Base64, aber kein X25519-Schluessel)
        let result = host.add_participant(ParticipantId::new("u1"), "Alice", "dGVzdA==");
        assert!(matches!(result, Err(CryptoError::TeilnehmerImport(_))));

        // Andere Teilnehmer bleiben unberuehrt
        assert!(host.roster_eintraege().is_empty());
    }

    #[test]
    fn erneutes_add_ersetzt_grant() {
        let (host, host_material) = bereiter_host();
        let (_, teilnehmer_material) = wartender_teilnehmer(&host_material);

        let g1 = host
            .add_participant(
                ParticipantId::new("u1"),
                "Alice",
                &teilnehmer_material.public_key_b64,
            )
            .unwrap();
        let g2 = host
            .add_participant(
                ParticipantId::new("u1"),
                "Alice",
                &teilnehmer_material.public_key_b64,
            )
            .unwrap();

        // Frische Versiegelung (neue Nonce), ein Roster-Eintrag
        assert_ne!(g1.sealed_session_key, g2.sealed_session_key);
        assert_eq!(host.roster_eintraege().len(), 1);
    }

    #[test]
    fn remove_participant_buchfuehrung() {
        let (host, host_material) = bereiter_host();
        let (_, teilnehmer_material) = wartender_teilnehmer(&host_material);

        host.add_participant(
            ParticipantId::new("u1"),
            "Alice",
            &teilnehmer_material.public_key_b64,
        )
        .unwrap();

        assert!(host.remove_participant(&ParticipantId::new("u1")));
        assert!(!host.remove_participant(&ParticipantId::new("u1")));
        assert!(host.roster_eintraege().is_empty());
    }

    #[test]
    fn teilnehmer_empfaengt_session_key() {
        let (host, host_material) = bereiter_host();
        let (teilnehmer, teilnehmer_material) = wartender_teilnehmer(&host_material);
        assert_eq!(teilnehmer.phase(), ParticipantPhase::WartetAufGrant);

        let grant = host
            .add_participant(
                ParticipantId::new("u1"),
                "Alice",
                &teilnehmer_material.public_key_b64,
            )
            .unwrap();

        teilnehmer.receive_session_key(&grant).unwrap();
        assert_eq!(teilnehmer.phase(), ParticipantPhase::SchluesselErhalten);

        // Beide Seiten halten denselben Schluessel
        let host_key = host.session_key().unwrap();
        let teilnehmer_key = teilnehmer.session_key().unwrap();
        assert_eq!(
            host_key.key_bytes.as_bytes(),
            teilnehmer_key.key_bytes.as_bytes()
        );
    }

    #[test]
    fn fremder_grant_wird_abgelehnt() {
        let (host, host_material) = bereiter_host();
        let (teilnehmer_a, material_a) = wartender_teilnehmer(&host_material);
        let (teilnehmer_b, material_b) = wartender_teilnehmer(&host_material);

        let grant_b = host
            .add_participant(ParticipantId::new("u2"), "Bob", &material_b.public_key_b64)
            .unwrap();

        // Teilnehmer A erhaelt den fuer B versiegelten Grant
        let result = teilnehmer_a.receive_session_key(&grant_b);
        assert!(matches!(result, Err(CryptoError::KeyExchange(_))));
        // Phase bleibt WartetAufGrant - Zustellung darf wiederholt werden
        assert_eq!(teilnehmer_a.phase(), ParticipantPhase::WartetAufGrant);

        // Der richtige Grant funktioniert danach weiterhin
        let grant_a = host
            .add_participant(ParticipantId::new("u1"), "Alice", &material_a.public_key_b64)
            .unwrap();
        teilnehmer_a.receive_session_key(&grant_a).unwrap();
        let _ = teilnehmer_b;
    }

    #[test]
    fn identische_mehrfachzustellung_ist_idempotent() {
        let (host, host_material) = bereiter_host();
        let (teilnehmer, material) = wartender_teilnehmer(&host_material);

        let grant = host
            .add_participant(ParticipantId::new("u1"), "Alice", &material.public_key_b64)
            .unwrap();

        teilnehmer.receive_session_key(&grant).unwrap();
        teilnehmer.receive_session_key(&grant).unwrap();
        assert_eq!(teilnehmer.phase(), ParticipantPhase::SchluesselErhalten);
    }

    #[test]
    fn abweichender_grant_gewinnt() {
        let (host, host_material) = bereiter_host();
        let (teilnehmer, material) = wartender_teilnehmer(&host_material);

        let g1 = host
            .add_participant(ParticipantId::new("u1"), "Alice", &material.public_key_b64)
            .unwrap();
        teilnehmer.receive_session_key(&g1).unwrap();

        // Rotation: der Teilnehmer erhaelt einen neuen Grant
        let mut empfaenger = HashMap::new();
        empfaenger.insert(ParticipantId::new("u1"), material.public_key_b64.clone());
        let grants = host.rotate_session_key(&empfaenger).unwrap();
        let g2 = grants.get(&ParticipantId::new("u1")).unwrap();

        teilnehmer.receive_session_key(g2).unwrap();
        assert_eq!(
            teilnehmer.session_key().unwrap().key_bytes.as_bytes(),
            host.session_key().unwrap().key_bytes.as_bytes()
        );
    }

    #[test]
    fn rotation_prueft_roster_und_fingerprint() {
        let (host, host_material) = bereiter_host();
        let (_, material) = wartender_teilnehmer(&host_material);

        // Unbekannter Empfaenger
        let mut empfaenger = HashMap::new();
        empfaenger.insert(ParticipantId::new("u9"), material.public_key_b64.clone());
        assert!(matches!(
            host.rotate_session_key(&empfaenger),
            Err(CryptoError::TeilnehmerImport(_))
        ));

        // Empfaenger im Roster, aber mit fremdem Schluessel
        host.add_participant(ParticipantId::new("u1"), "Alice", &material.public_key_b64)
            .unwrap();
        let fremd = key_exchange::generate_identity_pair().unwrap();
        let mut empfaenger = HashMap::new();
        empfaenger.insert(
            ParticipantId::new("u1"),
            codec::encode_binary(fremd.public_key.as_bytes()),
        );
        assert!(matches!(
            host.rotate_session_key(&empfaenger),
            Err(CryptoError::TeilnehmerImport(_))
        ));
    }

    #[test]
    fn rotation_erzeugt_neuen_schluessel() {
        let (host, host_material) = bereiter_host();
        let (_, material) = wartender_teilnehmer(&host_material);
        host.add_participant(ParticipantId::new("u1"), "Alice", &material.public_key_b64)
            .unwrap();

        let alter_key = host.session_key().unwrap().key_bytes.as_bytes().to_vec();

        let mut empfaenger = HashMap::new();
        empfaenger.insert(ParticipantId::new("u1"), material.public_key_b64.clone());
        host.rotate_session_key(&empfaenger).unwrap();

        assert_ne!(
            host.session_key().unwrap().key_bytes.as_bytes(),
            alter_key.as_slice()
        );
    }

    #[test]
    fn passphrase_verifikation() {
        let (host, material) = bereiter_host();
        assert!(host.verify_passphrase(&material.passphrase));
        assert!(!host.verify_passphrase("FALSCH-FALSCH"));

        let (teilnehmer, _) = wartender_teilnehmer(&material);
        assert!(teilnehmer.verify_passphrase(&material.passphrase));
        assert!(!teilnehmer.verify_passphrase(""));
    }

    #[test]
    fn cleanup_ist_idempotent() {
        let (host, _) = bereiter_host();
        host.cleanup();
        host.cleanup();
        assert_eq!(host.phase(), HostPhase::Uninitialisiert);
        assert!(host.session_key().is_err());

        // Auch auf uninitialisiertem Teilnehmer gefahrlos
        let teilnehmer = ParticipantCoordinator::new();
        teilnehmer.cleanup();
        teilnehmer.cleanup();
        assert_eq!(teilnehmer.phase(), ParticipantPhase::Uninitialisiert);
    }

    #[test]
    fn cleanup_erlaubt_neu_initialisierung() {
        let (host, _) = bereiter_host();
        host.cleanup();
        let material = host
            .initialize(SessionId::new("s2"), AeadAlgorithm::ChaCha20Poly1305)
            .unwrap();
        assert!(!material.passphrase.is_empty());
        assert_eq!(host.phase(), HostPhase::Bereit);
    }

    #[test]
    fn teilnehmer_ohne_grant_hat_keinen_schluessel() {
        let (_, host_material) = bereiter_host();
        let (teilnehmer, _) = wartender_teilnehmer(&host_material);
        assert!(matches!(
            teilnehmer.session_key(),
            Err(CryptoError::UngueltigerZustand { .. })
        ));
    }

    #[test]
    fn grant_fuer_fremde_session_wird_abgelehnt() {
        let (host, host_material) = bereiter_host();
        let (teilnehmer, material) = wartender_teilnehmer(&host_material);

        let mut grant = host
            .add_participant(ParticipantId::new("u1"), "Alice", &material.public_key_b64)
            .unwrap();
        grant.session_id = SessionId::new("andere-session");

        let result = teilnehmer.receive_session_key(&grant);
        assert!(matches!(result, Err(CryptoError::KeyExchange(_))));
    }
}
