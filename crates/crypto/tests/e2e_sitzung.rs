//! End-zu-End-Test einer gesicherten Aufnahme-Session
//!
//! Deckt den vollen Ablauf ab: Host-Initialisierung, Teilnehmer-Beitritt
//! ueber den Signalisierungskanal, Schluessel-Zustellung, verschluesselte
//! Chunk-Pipeline, Speicherung beim Kustoden und Wiedergabe-
//! Entschluesselung durch einen Schluessel-Inhaber.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;

use soundproof_core::{ParticipantId, SessionId};
use soundproof_crypto::{
    codec, decrypt_chunk, generate_identity_pair, CryptoError, HostCoordinator, MediaPipeline,
    ParticipantCoordinator, ParticipantPhase,
};
use soundproof_custodian::{
    CustodianConfig, CustodianService, MemoryRepository, NeueSession, RosterEintrag,
};
use soundproof_protocol::{
    AeadAlgorithm, MemorySignaling, SignalingChannel, SignalingMessage,
};

#[tokio::test]
async fn gesicherte_session_ende_zu_ende() {
    // --- Host-Seite ---
    let host = HostCoordinator::new();
    let host_material = host
        .initialize(SessionId::new("s1"), AeadAlgorithm::Aes256Gcm)
        .unwrap();

    // --- Teilnehmerin initialisiert mit Out-of-Band-Material ---
    let teilnehmerin = ParticipantCoordinator::new();
    let teilnehmerin_material = teilnehmerin
        .initialize(
            SessionId::new("s1"),
            &host_material.public_key_b64,
            &host_material.passphrase,
        )
        .unwrap();

    // Beide Seiten sehen denselben Host-Fingerprint
    assert_eq!(
        teilnehmerin.host_fingerprint().unwrap(),
        host_material.fingerprint
    );
    assert!(teilnehmerin.verify_passphrase(&host_material.passphrase));

    // --- Schluessel-Zustellung ueber den Signalisierungskanal ---
    let (kanal, mut empfaenger) = MemorySignaling::paar();
    let grant = host
        .add_participant(
            ParticipantId::new("u1"),
            "Alice",
            &teilnehmerin_material.public_key_b64,
        )
        .unwrap();
    kanal.senden(grant.als_signaling_nachricht()).await.unwrap();

    match empfaenger.empfangen().await.unwrap() {
        SignalingMessage::KeyGrant {
            session_id,
            participant_id,
            sealed_session_key,
            algorithm,
        } => {
            let erhalten = soundproof_crypto::KeyGrant {
                session_id,
                participant_id,
                sealed_session_key,
                algorithm,
            };
            teilnehmerin.receive_session_key(&erhalten).unwrap();
        }
        other => panic!("Unerwartete Nachricht: {:?}", other),
    }
    assert_eq!(teilnehmerin.phase(), ParticipantPhase::SchluesselErhalten);

    // --- Kustode kennt Session und Roster (nur Fingerprints) ---
    let custodian = CustodianService::neu(
        Arc::new(MemoryRepository::new()),
        CustodianConfig::default(),
    );
    custodian
        .session_anlegen(NeueSession {
            session_id: SessionId::new("s1"),
            host_id: ParticipantId::new("host"),
            host_name: "Hosterin".into(),
            host_fingerprint: host_material.fingerprint.clone(),
        })
        .await
        .unwrap();
    custodian
        .teilnehmer_registrieren(
            &SessionId::new("s1"),
            RosterEintrag {
                participant_id: ParticipantId::new("u1"),
                name: "Alice".into(),
                fingerprint: teilnehmerin_material.fingerprint.clone(),
                registriert_am: Utc::now(),
            },
        )
        .await
        .unwrap();

    // --- Host streamt verschluesselte Chunks zum Kustoden ---
    let original = b"Aufnahme-Spur des Hosts: viele Audio-Bytes fuer mehrere Chunks.";
    let mut pipeline = MediaPipeline::new(
        host.session_key().unwrap(),
        ParticipantId::new("host"),
        16,
    )
    .unwrap();

    let mut chunks = pipeline.push(original).unwrap();
    if let Some(rest) = pipeline.flush().unwrap() {
        chunks.push(rest);
    }
    for chunk in chunks {
        custodian.chunk_speichern(chunk).await.unwrap();
    }

    // --- Teilnehmerin laedt und entschluesselt mit ihrem Schluessel ---
    let geladen = custodian
        .chunks_auflisten(&SessionId::new("s1"), &ParticipantId::new("u1"))
        .await
        .unwrap();

    let teilnehmerin_key = teilnehmerin.session_key().unwrap();
    let mut wiedergabe = Vec::new();
    for chunk in &geladen {
        wiedergabe.extend_from_slice(&decrypt_chunk(&teilnehmerin_key, chunk).unwrap());
    }
    assert_eq!(wiedergabe, original);
}

#[tokio::test]
async fn fremder_grant_laesst_teilnehmer_unkeyed() {
    let host = HostCoordinator::new();
    let host_material = host
        .initialize(SessionId::new("s1"), AeadAlgorithm::Aes256Gcm)
        .unwrap();

    let alice = ParticipantCoordinator::new();
    let alice_material = alice
        .initialize(
            SessionId::new("s1"),
            &host_material.public_key_b64,
            &host_material.passphrase,
        )
        .unwrap();

    let bob = ParticipantCoordinator::new();
    let bob_material = bob
        .initialize(
            SessionId::new("s1"),
            &host_material.public_key_b64,
            &host_material.passphrase,
        )
        .unwrap();

    let grant_fuer_bob = host
        .add_participant(ParticipantId::new("u2"), "Bob", &bob_material.public_key_b64)
        .unwrap();

    // Alice erhaelt Bobs Grant: harter Fehler, Phase unveraendert
    let result = alice.receive_session_key(&grant_fuer_bob);
    assert!(matches!(result, Err(CryptoError::KeyExchange(_))));
    assert_eq!(alice.phase(), ParticipantPhase::WartetAufGrant);

    // Erneute, korrekte Zustellung funktioniert
    let grant_fuer_alice = host
        .add_participant(
            ParticipantId::new("u1"),
            "Alice",
            &alice_material.public_key_b64,
        )
        .unwrap();
    alice.receive_session_key(&grant_fuer_alice).unwrap();
    assert_eq!(alice.phase(), ParticipantPhase::SchluesselErhalten);
}

#[tokio::test]
async fn rotation_schliesst_entfernte_teilnehmer_aus() {
    let host = HostCoordinator::new();
    let host_material = host
        .initialize(SessionId::new("s1"), AeadAlgorithm::Aes256Gcm)
        .unwrap();

    let alice = ParticipantCoordinator::new();
    let alice_material = alice
        .initialize(
            SessionId::new("s1"),
            &host_material.public_key_b64,
            &host_material.passphrase,
        )
        .unwrap();
    let bob = ParticipantCoordinator::new();
    let bob_material = bob
        .initialize(
            SessionId::new("s1"),
            &host_material.public_key_b64,
            &host_material.passphrase,
        )
        .unwrap();

    let grant_alice = host
        .add_participant(
            ParticipantId::new("u1"),
            "Alice",
            &alice_material.public_key_b64,
        )
        .unwrap();
    alice.receive_session_key(&grant_alice).unwrap();
    let grant_bob = host
        .add_participant(ParticipantId::new("u2"), "Bob", &bob_material.public_key_b64)
        .unwrap();
    bob.receive_session_key(&grant_bob).unwrap();

    let alter_bob_key = bob.session_key().unwrap();

    // Bob fliegt raus, danach Rotation an die Verbliebenen
    host.remove_participant(&ParticipantId::new("u2"));
    let mut empfaenger = HashMap::new();
    empfaenger.insert(
        ParticipantId::new("u1"),
        alice_material.public_key_b64.clone(),
    );
    let neue_grants = host.rotate_session_key(&empfaenger).unwrap();
    alice
        .receive_session_key(neue_grants.get(&ParticipantId::new("u1")).unwrap())
        .unwrap();

    // Neuer Chunk unter dem rotierten Schluessel
    let chunk = soundproof_crypto::encrypt_chunk(
        &host.session_key().unwrap(),
        b"nach der rotation",
        &ParticipantId::new("host"),
        0,
    )
    .unwrap();

    // Alice liest mit, Bobs alter Schluessel scheitert am Auth-Tag
    assert_eq!(
        decrypt_chunk(&alice.session_key().unwrap(), &chunk).unwrap(),
        b"nach der rotation"
    );
    assert!(matches!(
        decrypt_chunk(&alter_bob_key, &chunk),
        Err(CryptoError::Authentifizierung(_))
    ));
}

#[test]
fn fingerprints_kollidieren_nicht() {
    // 1000 frische Schluessel-Paare: alle Fingerprints paarweise verschieden
    let mut gesehen = HashSet::new();
    for _ in 0..1000 {
        let pair = generate_identity_pair().unwrap();
        let fp = codec::fingerprint(pair.public_key.as_bytes());
        // Stabil bei Wiederholung
        assert_eq!(fp, codec::fingerprint(pair.public_key.as_bytes()));
        assert!(gesehen.insert(fp), "Fingerprint-Kollision");
    }
}
