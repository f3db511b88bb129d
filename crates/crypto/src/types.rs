//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use soundproof_core::{ParticipantId, SessionId};
use soundproof_protocol::{AeadAlgorithm, SignalingMessage};

use crate::error::{CryptoError, CryptoResult};

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Eine kryptografische Nonce (Number used once, 96 Bit)
///
/// Wird pro Verschluesselungs-Aufruf frisch zufaellig erzeugt.
/// Wiederverwendung unter demselben Schluessel bricht Vertraulichkeit
/// und Integritaet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nonce {
    bytes: [u8; 12],
}

impl Nonce {
    /// Erzeugt eine frische zufaellige Nonce aus dem OS-CSPRNG
    pub fn zufaellig() -> Self {
        let mut bytes = [0u8; 12];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Rekonstruiert eine Nonce aus rohen Bytes (z.B. aus einem Chunk-Record)
    pub fn from_slice(slice: &[u8]) -> CryptoResult<Self> {
        if slice.len() != 12 {
            return Err(CryptoError::UngueltigeNonce {
                erwartet: 12,
                erhalten: slice.len(),
            });
        }
        let mut bytes = [0u8; 12];
        bytes.copy_from_slice(slice);
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.bytes
    }
}

/// Symmetrischer Session-Schluessel einer Aufnahme-Session
///
/// Existiert ausschliesslich im Speicher von Host und autorisierten
/// Teilnehmern. Wird niemals serialisiert oder persistiert; `cleanup()`
/// im Koordinator verwirft ihn.
#[derive(Debug, Clone)]
pub struct SessionKey {
    /// Session zu der dieser Schluessel gehoert
    pub session_id: SessionId,
    /// Fester AEAD-Algorithmus dieses Schluessels
    pub algorithm: AeadAlgorithm,
    /// Der eigentliche Schluessel (32 Bytes)
    pub key_bytes: SecretBytes,
}

impl SessionKey {
    /// Erstellt einen SessionKey aus rohen Bytes (muss 32 Bytes sein)
    pub fn new(
        session_id: SessionId,
        algorithm: AeadAlgorithm,
        key_bytes: Vec<u8>,
    ) -> CryptoResult<Self> {
        if key_bytes.len() != 32 {
            return Err(CryptoError::UngueltigeSchluesselLaenge {
                erwartet: 32,
                erhalten: key_bytes.len(),
            });
        }
        Ok(Self {
            session_id,
            algorithm,
            key_bytes: SecretBytes::new(key_bytes),
        })
    }
}

/// Oeffentlicher X25519-Schluessel (32 Bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; 32],
}

impl PublicKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Importiert einen oeffentlichen Schluessel aus rohen Bytes
    pub fn from_slice(slice: &[u8]) -> CryptoResult<Self> {
        if slice.len() != 32 {
            return Err(CryptoError::UngueltigeSchluesselLaenge {
                erwartet: 32,
                erhalten: slice.len(),
            });
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

/// Identitaets-Schluessel-Paar eines Teilnehmers (X25519)
///
/// Wird pro Teilnehmer und Session frisch erzeugt und dient ausschliesslich
/// dem sicheren Transport des Session-Schluessels. Der private Teil
/// verlaesst den erzeugenden Prozess nie.
pub struct IdentityKeyPair {
    /// Privater Schluessel (32 Bytes, wird beim Drop genullt)
    pub private_key: SecretBytes,
    /// Oeffentlicher Schluessel
    pub public_key: PublicKey,
}

impl IdentityKeyPair {
    /// Gibt den privaten Schluessel als Array zurueck (fuer X25519-DH)
    pub(crate) fn private_key_array(&self) -> CryptoResult<[u8; 32]> {
        let slice = self.private_key.as_bytes();
        slice
            .try_into()
            .map_err(|_| CryptoError::UngueltigeSchluesselLaenge {
                erwartet: 32,
                erhalten: slice.len(),
            })
    }
}

impl std::fmt::Debug for IdentityKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityKeyPair {{ public_key: {:02x?}.. }}", &self.public_key.as_bytes()[..4])
    }
}

/// Verschluesselter Payload (Nonce + Ciphertext inkl. Auth-Tag)
#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    /// 12 Bytes Nonce
    pub nonce: Nonce,
    /// Verschluesselter Inhalt inkl. 16 Bytes Auth-Tag (angehaengt)
    pub ciphertext: Vec<u8>,
}

/// Session-Schluessel-Grant fuer genau einen Teilnehmer
///
/// Der Session-Schluessel, versiegelt fuer den oeffentlichen Schluessel
/// eines bestimmten Teilnehmers. Nur der passende private Schluessel
/// kann ihn oeffnen; ein fremder Schluessel fuehrt zu einem harten
/// Entschluesselungs-Fehler, nie zu stiller Korruption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyGrant {
    /// Session zu der der Grant gehoert
    pub session_id: SessionId,
    /// Teilnehmer fuer den der Grant versiegelt wurde
    pub participant_id: ParticipantId,
    /// Versiegelter Session-Schluessel (Base64)
    pub sealed_session_key: String,
    /// Algorithmus des enthaltenen Session-Schluessels
    pub algorithm: AeadAlgorithm,
}

impl KeyGrant {
    /// Verpackt den Grant als Signalisierungs-Nachricht fuer die Zustellung
    pub fn als_signaling_nachricht(&self) -> SignalingMessage {
        SignalingMessage::KeyGrant {
            session_id: self.session_id.clone(),
            participant_id: self.participant_id.clone(),
            sealed_session_key: self.sealed_session_key.clone(),
            algorithm: self.algorithm,
        }
    }
}
