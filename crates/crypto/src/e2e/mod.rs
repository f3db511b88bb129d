//! E2E Verschluesselung (End-to-End)
//!
//! Host <-> Teilnehmer Verschluesselung. Der Kustode speichert Chunks
//! blind und kann den Medien-Inhalt nicht entschluesseln.
//!
//! ## Ablauf
//! 1. Host initialisiert die Session: Session-Schluessel + Identitaet + Passphrase
//! 2. Passphrase und Fingerprint gehen out-of-band an die Teilnehmer
//! 3. Jeder Teilnehmer erzeugt eine eigene Identitaet und meldet seinen Public Key
//! 4. Host versiegelt den Session-Schluessel pro Teilnehmer (X25519 Sealed Box)
//! 5. Teilnehmer oeffnet und verifiziert den Grant (Selbsttest-Roundtrip)
//! 6. Medien-Chunks werden mit dem Session-Schluessel (AES-256-GCM) verschluesselt

pub mod cipher;
pub mod coordinator;
pub mod key_exchange;
pub mod pipeline;

pub use cipher::{decrypt, encrypt, generate_session_key};
pub use coordinator::{
    HostCoordinator, HostPhase, HostPublicMaterial, ParticipantCoordinator, ParticipantPhase,
    ParticipantPublicMaterial, RosterEntry,
};
pub use key_exchange::{
    decrypt_with_private_key, encrypt_for_public_key, generate_identity_pair, hkdf_derive,
    MAX_SEALED_PAYLOAD,
};
pub use pipeline::{decrypt_chunk, encrypt_chunk, MediaPipeline};
