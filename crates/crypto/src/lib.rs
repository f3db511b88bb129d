//! # soundproof-crypto
//!
//! E2E-Verschluesselung und Schluesselaustausch fuer Soundproof.
//!
//! ## Module
//! - `e2e` - Ende-zu-Ende Verschluesselung (Koordination, Cipher, Pipeline)
//! - `codec` - Base64-Kodierung und Schluessel-Fingerprints
//! - `types` - Gemeinsame Typen (SessionKey, IdentityKeyPair, KeyGrant, etc.)
//! - `error` - Fehlertypen

pub mod codec;
pub mod e2e;
pub mod error;
pub mod types;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use types::{
    EncryptedPayload, IdentityKeyPair, KeyGrant, Nonce, PublicKey, SecretBytes, SessionKey,
};

pub use e2e::{
    decrypt, decrypt_chunk, decrypt_with_private_key, encrypt, encrypt_chunk,
    encrypt_for_public_key, generate_identity_pair, generate_session_key, hkdf_derive,
    HostCoordinator, HostPhase, HostPublicMaterial, MediaPipeline, ParticipantCoordinator,
    ParticipantPhase, ParticipantPublicMaterial, RosterEntry, MAX_SEALED_PAYLOAD,
};
