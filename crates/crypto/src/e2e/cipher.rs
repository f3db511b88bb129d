//! Symmetrische Chunk-Verschluesselung (AEAD)
//!
//! Verschluesselt und entschluesselt Byte-Puffer mit dem Session-Schluessel.
//! Pro Aufruf wird eine frische zufaellige Nonce erzeugt; der Auth-Tag
//! haengt am Ciphertext. Ein fehlschlagender Tag ist ein harter Fehler -
//! es gibt keinen Teil-Klartext und kein "best effort".

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use chacha20poly1305::{ChaCha20Poly1305, Key as ChaChaKey, Nonce as ChaChaNonce};
use rand::rngs::OsRng;
use rand::RngCore;

use soundproof_core::SessionId;
use soundproof_protocol::AeadAlgorithm;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{EncryptedPayload, Nonce, SessionKey};

/// Erzeugt einen frischen zufaelligen Session-Schluessel (256 Bit)
pub fn generate_session_key(
    session_id: &SessionId,
    algorithm: AeadAlgorithm,
) -> CryptoResult<SessionKey> {
    let mut key_bytes = vec![0u8; 32];
    OsRng
        .try_fill_bytes(&mut key_bytes)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;

    SessionKey::new(session_id.clone(), algorithm, key_bytes)
}

/// Verschluesselt einen Klartext mit dem Session-Schluessel
///
/// # Parameter
/// - `plaintext`: Rohe Chunk-Daten (leer ist erlaubt und wird
///   trotzdem authentifiziert)
/// - `aad`: Authenticated Additional Data (bindet Session, Teilnehmer
///   und Sequenz an den Ciphertext)
pub fn encrypt(key: &SessionKey, plaintext: &[u8], aad: &[u8]) -> CryptoResult<EncryptedPayload> {
    let nonce = Nonce::zufaellig();

    let ciphertext = match key.algorithm {
        AeadAlgorithm::Aes256Gcm => {
            encrypt_aes256gcm(plaintext, key.key_bytes.as_bytes(), nonce.as_bytes(), aad)?
        }
        AeadAlgorithm::ChaCha20Poly1305 => {
            encrypt_chacha20(plaintext, key.key_bytes.as_bytes(), nonce.as_bytes(), aad)?
        }
    };

    Ok(EncryptedPayload { nonce, ciphertext })
}

/// Entschluesselt einen Payload mit dem Session-Schluessel
///
/// Verifiziert den Auth-Tag und die AAD. Bei Manipulation oder falschem
/// Schluessel: `Authentifizierung`-Fehler, niemals Teil-Klartext.
pub fn decrypt(key: &SessionKey, payload: &EncryptedPayload, aad: &[u8]) -> CryptoResult<Vec<u8>> {
    match key.algorithm {
        AeadAlgorithm::Aes256Gcm => decrypt_aes256gcm(
            &payload.ciphertext,
            key.key_bytes.as_bytes(),
            payload.nonce.as_bytes(),
            aad,
        ),
        AeadAlgorithm::ChaCha20Poly1305 => decrypt_chacha20(
            &payload.ciphertext,
            key.key_bytes.as_bytes(),
            payload.nonce.as_bytes(),
            aad,
        ),
    }
}

fn encrypt_aes256gcm(
    plaintext: &[u8],
    key_bytes: &[u8],
    nonce_bytes: &[u8; 12],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    if key_bytes.len() != 32 {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: 32,
            erhalten: key_bytes.len(),
        });
    }

    let key = Key::<Aes256Gcm>::from_slice(key_bytes);
    let cipher = Aes256Gcm::new(key);
    let nonce = AesNonce::from_slice(nonce_bytes);

    cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))
}

fn encrypt_chacha20(
    plaintext: &[u8],
    key_bytes: &[u8],
    nonce_bytes: &[u8; 12],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    if key_bytes.len() != 32 {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: 32,
            erhalten: key_bytes.len(),
        });
    }

    let key = ChaChaKey::from_slice(key_bytes);
    let cipher = ChaCha20Poly1305::new(key);
    let nonce = ChaChaNonce::from_slice(nonce_bytes);

    cipher
        .encrypt(nonce, chacha20poly1305::aead::Payload { msg: plaintext, aad })
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))
}

fn decrypt_aes256gcm(
    ciphertext: &[u8],
    key_bytes: &[u8],
    nonce_bytes: &[u8; 12],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    if key_bytes.len() != 32 {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: 32,
            erhalten: key_bytes.len(),
        });
    }

    let key = Key::<Aes256Gcm>::from_slice(key_bytes);
    let cipher = Aes256Gcm::new(key);
    let nonce = AesNonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::Authentifizierung("Auth-Tag ungueltig".to_string()))
}

fn decrypt_chacha20(
    ciphertext: &[u8],
    key_bytes: &[u8],
    nonce_bytes: &[u8; 12],
    aad: &[u8],
) -> CryptoResult<Vec<u8>> {
    if key_bytes.len() != 32 {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: 32,
            erhalten: key_bytes.len(),
        });
    }

    let key = ChaChaKey::from_slice(key_bytes);
    let cipher = ChaCha20Poly1305::new(key);
    let nonce = ChaChaNonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, chacha20poly1305::aead::Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::Authentifizierung("Auth-Tag ungueltig".to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(algorithm: AeadAlgorithm) -> SessionKey {
        generate_session_key(&SessionId::new("test"), algorithm).unwrap()
    }

    #[test]
    fn session_key_generierung() {
        let key = test_key(AeadAlgorithm::Aes256Gcm);
        assert_eq!(key.key_bytes.len(), 32);
        assert_eq!(key.algorithm, AeadAlgorithm::Aes256Gcm);
        assert_eq!(key.session_id, SessionId::new("test"));
    }

    #[test]
    fn zwei_schluessel_sind_verschieden() {
        let k1 = test_key(AeadAlgorithm::Aes256Gcm);
        let k2 = test_key(AeadAlgorithm::Aes256Gcm);
        assert_ne!(k1.key_bytes.as_bytes(), k2.key_bytes.as_bytes());
    }

    #[test]
    fn roundtrip_aes256gcm() {
        let key = test_key(AeadAlgorithm::Aes256Gcm);
        let plaintext = b"Podcast-Audio-Daten 1234567890";

        let payload = encrypt(&key, plaintext, b"aad").unwrap();
        let decrypted = decrypt(&key, &payload, b"aad").unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn roundtrip_chacha20() {
        let key = test_key(AeadAlgorithm::ChaCha20Poly1305);
        let plaintext = b"ChaCha20-Chunk";

        let payload = encrypt(&key, plaintext, b"").unwrap();
        let decrypted = decrypt(&key, &payload, b"").unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn leerer_klartext_wird_authentifiziert() {
        let key = test_key(AeadAlgorithm::Aes256Gcm);

        let payload = encrypt(&key, b"", b"aad").unwrap();
        // Auch der leere Chunk traegt einen Auth-Tag
        assert_eq!(payload.ciphertext.len(), 16);

        let decrypted = decrypt(&key, &payload, b"aad").unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn falscher_schluessel_schlaegt_fehl() {
        let k1 = test_key(AeadAlgorithm::Aes256Gcm);
        let k2 = test_key(AeadAlgorithm::Aes256Gcm);

        let payload = encrypt(&k1, b"Geheime Daten", b"").unwrap();
        let result = decrypt(&k2, &payload, b"");

        assert!(matches!(result, Err(CryptoError::Authentifizierung(_))));
    }

    #[test]
    fn jedes_bit_kippen_schlaegt_fehl() {
        let key = test_key(AeadAlgorithm::Aes256Gcm);
        let payload = encrypt(&key, b"ab", b"").unwrap();

        // Jedes einzelne Bit des Ciphertexts kippen - jede Variante
        // muss am Auth-Tag scheitern
        for byte_idx in 0..payload.ciphertext.len() {
            for bit in 0..8 {
                let mut manipuliert = payload.clone();
                manipuliert.ciphertext[byte_idx] ^= 1 << bit;
                let result = decrypt(&key, &manipuliert, b"");
                assert!(
                    matches!(result, Err(CryptoError::Authentifizierung(_))),
                    "Bit {} in Byte {} nicht erkannt",
                    bit,
                    byte_idx
                );
            }
        }
    }

    #[test]
    fn abweichende_aad_schlaegt_fehl() {
        let key = test_key(AeadAlgorithm::Aes256Gcm);
        let payload = encrypt(&key, b"daten", b"sequenz-1").unwrap();

        let result = decrypt(&key, &payload, b"sequenz-2");
        assert!(matches!(result, Err(CryptoError::Authentifizierung(_))));
    }

    #[test]
    fn nonces_werden_nicht_wiederverwendet() {
        let key = test_key(AeadAlgorithm::Aes256Gcm);
        let p1 = encrypt(&key, b"x", b"").unwrap();
        let p2 = encrypt(&key, b"x", b"").unwrap();
        assert_ne!(p1.nonce, p2.nonce);
        assert_ne!(p1.ciphertext, p2.ciphertext);
    }
}
