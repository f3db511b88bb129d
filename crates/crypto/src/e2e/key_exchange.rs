//! Asymmetrischer Schluessel-Transport (X25519 Sealed Box)
//!
//! Erzeugt pro Teilnehmer ein Identitaets-Schluessel-Paar und versiegelt
//! kleine Payloads (den Session-Schluessel) fuer einen oeffentlichen
//! Schluessel. Niemals fuer Mediendaten - die Payload-Groesse ist hart
//! begrenzt.
//!
//! ## Schema (ECIES-aehnlich)
//! 1. Ephemeres X25519-Schluessel-Paar generieren
//! 2. DH mit Empfaenger-Public-Key
//! 3. HKDF-SHA256 -> Wrapping Key
//! 4. AES-256-GCM versiegeln
//!
//! Output: `[ephemeral_public(32)] [nonce(12)] [ciphertext + tag]`

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{CryptoError, CryptoResult};
use crate::types::{IdentityKeyPair, PublicKey, SecretBytes};

/// Maximale Payload-Groesse fuer die asymmetrische Versiegelung
///
/// Dieses Primitiv transportiert Schluessel (32 Bytes), keine
/// Mediendaten. Die Grenze verhindert Fehlgebrauch als Bulk-Cipher.
pub const MAX_SEALED_PAYLOAD: usize = 256;

/// Domaenen-Trennung fuer die HKDF-Ableitung des Wrapping Keys
const HKDF_INFO: &[u8] = b"soundproof-grant-wrap-v1";

/// Generiert ein frisches Identitaets-Schluessel-Paar (X25519)
pub fn generate_identity_pair() -> CryptoResult<IdentityKeyPair> {
    let mut private_bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut private_bytes)
        .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;

    let private = StaticSecret::from(private_bytes);
    let public = X25519PublicKey::from(&private);

    Ok(IdentityKeyPair {
        private_key: SecretBytes::new(private_bytes.to_vec()),
        public_key: PublicKey::from_bytes(*public.as_bytes()),
    })
}

/// Versiegelt einen kleinen Payload fuer einen oeffentlichen Schluessel
///
/// Nur der Inhaber des zugehoerigen privaten Schluessels kann das
/// Ergebnis oeffnen. CCA-resistent durch AEAD ueber dem DH-abgeleiteten
/// Wrapping Key.
pub fn encrypt_for_public_key(recipient: &PublicKey, payload: &[u8]) -> CryptoResult<Vec<u8>> {
    if payload.len() > MAX_SEALED_PAYLOAD {
        return Err(CryptoError::PayloadZuGross {
            maximum: MAX_SEALED_PAYLOAD,
            erhalten: payload.len(),
        });
    }

    // Ephemeres Schluessel-Paar
    let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral_secret);

    // DH-Austausch
    let recipient_pk = X25519PublicKey::from(*recipient.as_bytes());
    let dh_output = ephemeral_secret.diffie_hellman(&recipient_pk);

    // HKDF -> Wrapping Key (32 Bytes)
    let wrapping_key = hkdf_derive(dh_output.as_bytes(), recipient.as_bytes(), HKDF_INFO, 32)?;

    // AES-256-GCM versiegeln
    let cipher_key = Key::<Aes256Gcm>::from_slice(&wrapping_key);
    let cipher = Aes256Gcm::new(cipher_key);

    let mut nonce_bytes = [0u8; 12];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = AesNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, payload)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    // Output: [ephemeral_public(32)] + [nonce(12)] + [ciphertext]
    let mut out = Vec::with_capacity(32 + 12 + ciphertext.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);

    Ok(out)
}

/// Oeffnet einen versiegelten Payload mit dem eigenen privaten Schluessel
///
/// Schlaegt mit `Entschluesselung` fehl bei fremdem Schluessel oder
/// korruptem Ciphertext.
pub fn decrypt_with_private_key(keypair: &IdentityKeyPair, sealed: &[u8]) -> CryptoResult<Vec<u8>> {
    if sealed.len() < 32 + 12 + 16 {
        return Err(CryptoError::UngueltigeDaten(
            "Versiegelter Payload zu kurz".to_string(),
        ));
    }

    let ephemeral_pub_bytes: [u8; 32] = sealed[0..32]
        .try_into()
        .map_err(|_| CryptoError::UngueltigeDaten("Ephemeral-Key unlesbar".to_string()))?;
    let nonce_bytes: [u8; 12] = sealed[32..44]
        .try_into()
        .map_err(|_| CryptoError::UngueltigeDaten("Nonce unlesbar".to_string()))?;
    let ciphertext = &sealed[44..];

    // DH mit dem eigenen privaten Schluessel
    let private_key = StaticSecret::from(keypair.private_key_array()?);
    let ephemeral_pub = X25519PublicKey::from(ephemeral_pub_bytes);
    let dh_output = private_key.diffie_hellman(&ephemeral_pub);

    // HKDF -> Wrapping Key (Salt ist der eigene oeffentliche Schluessel)
    let wrapping_key = hkdf_derive(
        dh_output.as_bytes(),
        keypair.public_key.as_bytes(),
        HKDF_INFO,
        32,
    )?;

    let cipher_key = Key::<Aes256Gcm>::from_slice(&wrapping_key);
    let cipher = Aes256Gcm::new(cipher_key);
    let nonce = AesNonce::from_slice(&nonce_bytes);

    cipher.decrypt(nonce, ciphertext).map_err(|_| {
        CryptoError::Entschluesselung("Falscher Schluessel oder korrupte Daten".to_string())
    })
}

/// HKDF-basierte Key Derivation (allgemein verwendbar)
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> CryptoResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(okm)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
