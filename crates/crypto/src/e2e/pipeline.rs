//! Verschluesselnde Medien-Pipeline
//!
//! Konsumiert einen laufenden Medien-Byte-Strom, segmentiert ihn in
//! Chunks fester Groesse und verschluesselt jeden Chunk mit dem
//! Session-Schluessel. Pro Teilnehmer-Stream existiert genau eine
//! Pipeline-Instanz; sie vergibt die streng monoton steigenden
//! Sequenz-Nummern.
//!
//! ## AAD-Bindung
//! Die AAD bindet `session_id`, `participant_id` und `sequenz` an den
//! Ciphertext. Ein Chunk kann dadurch nicht in einen fremden Stream
//! oder an eine andere Position verpflanzt werden, ohne dass die
//! Entschluesselung am Auth-Tag scheitert.

use std::sync::Arc;

use chrono::Utc;

use soundproof_core::{ParticipantId, SessionId};
use soundproof_protocol::EncryptedChunk;

use crate::codec;
use crate::e2e::cipher;
use crate::error::{CryptoError, CryptoResult};
use crate::types::{Nonce, SessionKey};

/// Verschluesselt einen einzelnen Chunk
///
/// Reine Funktion aus (Schluessel, Daten, Position) plus frischer Nonce.
/// Auch ein leerer Chunk ergibt einen strukturell gueltigen, am Auth-Tag
/// verifizierbaren Record.
pub fn encrypt_chunk(
    key: &SessionKey,
    daten: &[u8],
    participant_id: &ParticipantId,
    sequenz: u64,
) -> CryptoResult<EncryptedChunk> {
    let aad = chunk_aad(&key.session_id, participant_id, sequenz);
    let payload = cipher::encrypt(key, daten, &aad)?;

    Ok(EncryptedChunk {
        session_id: key.session_id.clone(),
        participant_id: participant_id.clone(),
        sequenz,
        algorithm: key.algorithm,
        nonce: codec::encode_binary(payload.nonce.as_bytes()),
        ciphertext: codec::encode_binary(&payload.ciphertext),
        klartext_laenge: daten.len() as u64,
        erstellt_am: Utc::now(),
    })
}

/// Entschluesselt einen Chunk (symmetrische Umkehrung, nur fuer
/// Schluessel-Inhaber - genutzt bei der Wiedergabe)
pub fn decrypt_chunk(key: &SessionKey, chunk: &EncryptedChunk) -> CryptoResult<Vec<u8>> {
    if chunk.session_id != key.session_id {
        return Err(CryptoError::UngueltigeDaten(format!(
            "Chunk gehoert zu {}, Schluessel zu {}",
            chunk.session_id, key.session_id
        )));
    }
    if chunk.algorithm != key.algorithm {
        return Err(CryptoError::UngueltigeDaten(format!(
            "Algorithmus-Abweichung: Chunk {}, Schluessel {}",
            chunk.algorithm, key.algorithm
        )));
    }

    let nonce_bytes = codec::decode_binary(&chunk.nonce)?;
    let nonce = Nonce::from_slice(&nonce_bytes)?;
    let ciphertext = codec::decode_binary(&chunk.ciphertext)?;

    let aad = chunk_aad(&chunk.session_id, &chunk.participant_id, chunk.sequenz);
    cipher::decrypt(
        key,
        &crate::types::EncryptedPayload { nonce, ciphertext },
        &aad,
    )
}

/// Pipeline fuer einen Teilnehmer-Stream
///
/// Nicht zwischen Streams teilen: die Sequenz-Nummern gelten pro
/// Teilnehmer. `&mut self` erzwingt, dass Chunks desselben Streams in
/// Einreichungs-Reihenfolge verschluesselt werden; Pipelines
/// verschiedener Teilnehmer sind voneinander unabhaengig.
pub struct MediaPipeline {
    session_key: Arc<SessionKey>,
    participant_id: ParticipantId,
    chunk_groesse: usize,
    puffer: Vec<u8>,
    naechste_sequenz: u64,
}

impl MediaPipeline {
    /// Erstellt eine Pipeline mit fester Chunk-Groesse (in Bytes)
    pub fn new(
        session_key: Arc<SessionKey>,
        participant_id: ParticipantId,
        chunk_groesse: usize,
    ) -> CryptoResult<Self> {
        if chunk_groesse == 0 {
            return Err(CryptoError::UngueltigeDaten(
                "Chunk-Groesse muss groesser 0 sein".to_string(),
            ));
        }
        Ok(Self {
            session_key,
            participant_id,
            chunk_groesse,
            puffer: Vec::new(),
            naechste_sequenz: 0,
        })
    }

    /// Fuettert Stream-Daten ein und liefert alle vollstaendigen,
    /// verschluesselten Chunks
    ///
    /// Schlaegt die Verschluesselung eines Chunks fehl, wird genau
    /// dieser Chunk verworfen und der Fehler gemeldet; Puffer und
    /// Sequenz-Zaehler bleiben fuer nachfolgende Chunks nutzbar.
    pub fn push(&mut self, daten: &[u8]) -> CryptoResult<Vec<EncryptedChunk>> {
        self.puffer.extend_from_slice(daten);

        let mut chunks = Vec::new();
        while self.puffer.len() >= self.chunk_groesse {
            let klartext: Vec<u8> = self.puffer.drain(..self.chunk_groesse).collect();
            chunks.push(self.chunk_verschluesseln(&klartext)?);
        }
        Ok(chunks)
    }

    /// Verschluesselt den Puffer-Rest als letzten (kuerzeren) Chunk
    ///
    /// `None` wenn der Puffer leer ist - ein leerer Abschluss-Chunk
    /// wird nicht erzeugt.
    pub fn flush(&mut self) -> CryptoResult<Option<EncryptedChunk>> {
        if self.puffer.is_empty() {
            return Ok(None);
        }
        let klartext: Vec<u8> = self.puffer.drain(..).collect();
        Ok(Some(self.chunk_verschluesseln(&klartext)?))
    }

    /// Naechste zu vergebende Sequenz-Nummer
    pub fn naechste_sequenz(&self) -> u64 {
        self.naechste_sequenz
    }

    fn chunk_verschluesseln(&mut self, klartext: &[u8]) -> CryptoResult<EncryptedChunk> {
        let sequenz = self.naechste_sequenz;
        match encrypt_chunk(&self.session_key, klartext, &self.participant_id, sequenz) {
            Ok(chunk) => {
                self.naechste_sequenz += 1;
                Ok(chunk)
            }
            Err(e) => {
                tracing::warn!(
                    teilnehmer = %self.participant_id,
                    sequenz,
                    fehler = %e,
                    "Chunk verworfen"
                );
                Err(e)
            }
        }
    }
}

/// AAD eines Chunks: laengen-praefixierte IDs + Sequenz (Big-Endian)
fn chunk_aad(session_id: &SessionId, participant_id: &ParticipantId, sequenz: u64) -> Vec<u8> {
    let s = session_id.as_str().as_bytes();
    let p = participant_id.as_str().as_bytes();
    let mut aad = Vec::with_capacity(2 + s.len() + 2 + p.len() + 8);
    aad.extend_from_slice(&(s.len() as u16).to_be_bytes());
    aad.extend_from_slice(s);
    aad.extend_from_slice(&(p.len() as u16).to_be_bytes());
    aad.extend_from_slice(p);
    aad.extend_from_slice(&sequenz.to_be_bytes());
    aad
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
