//! Schluessel- und Blob-Kodierung (KeyCodec)
//!
//! Alles was eine Prozessgrenze ueberquert (oeffentliche Schluessel,
//! Grants, Chunk-Felder) wird hier in Base64-Text ueberfuehrt und
//! zurueckgelesen. Zusaetzlich: kurze Fingerprints fuer die menschliche
//! Out-of-Band-Verifikation von Schluesseln.

use sha2::{Digest, Sha256};

use crate::error::CryptoResult;

/// Kodiert beliebige Bytes als Base64-Text (verlustfrei, auch leer)
pub fn encode_binary(bytes: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

/// Dekodiert Base64-Text zurueck zu Bytes
pub fn decode_binary(text: &str) -> CryptoResult<Vec<u8>> {
    Ok(base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        text,
    )?)
}

/// Berechnet den kurzen Fingerprint eines oeffentlichen Schluessels
///
/// SHA-256 ueber die Schluessel-Bytes, auf 8 Bytes gekuerzt und als
/// Doppelpunkt-getrennte Hex-Paare formatiert (z.B. `AB:12:...`).
/// Deterministisch: derselbe Schluessel ergibt immer denselben
/// Fingerprint; Kollisionsresistenz erbt von SHA-256.
pub fn fingerprint(public_key_bytes: &[u8]) -> String {
    let hash = Sha256::digest(public_key_bytes);
    hash.iter()
        .take(8)
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
