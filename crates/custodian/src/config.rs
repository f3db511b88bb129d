//! Kustoden-Konfiguration
//!
//! Wird von der einbettenden Anwendung aus einer TOML-Datei geladen.
//! Alle Felder haben sinnvolle Standardwerte, sodass der Kustode ohne
//! Konfigurationsdatei lauffaehig ist.

use serde::{Deserialize, Serialize};

use crate::error::{CustodianError, CustodianResult};

/// Vollstaendige Kustoden-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodianConfig {
    /// Speicher-Grenzen
    pub limits: LimitEinstellungen,
}

/// Speicher-Grenzen des Kustoden
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitEinstellungen {
    /// Maximale Klartext-Groesse eines einzelnen Chunks in Bytes
    pub max_chunk_bytes: u64,
    /// Maximale Anzahl Chunks pro Session
    pub max_chunks_pro_session: u64,
    /// Maximale Anzahl gleichzeitig gehaltener Sessions
    pub max_sessions: u64,
}

impl Default for LimitEinstellungen {
    fn default() -> Self {
        Self {
            max_chunk_bytes: 4 * 1024 * 1024,
            max_chunks_pro_session: 100_000,
            max_sessions: 256,
        }
    }
}

impl CustodianConfig {
    /// Parst eine Konfiguration aus einem TOML-String
    pub fn aus_toml_str(inhalt: &str) -> CustodianResult<Self> {
        let config: CustodianConfig =
            toml::from_str(inhalt).map_err(|e| CustodianError::Konfiguration(e.to_string()))?;
        config.validieren()?;
        Ok(config)
    }

    /// Prueft die Konfiguration auf offensichtlich unbrauchbare Werte
    pub fn validieren(&self) -> CustodianResult<()> {
        if self.limits.max_chunk_bytes == 0 {
            return Err(CustodianError::Konfiguration(
                "limits.max_chunk_bytes muss groesser 0 sein".into(),
            ));
        }
        if self.limits.max_chunks_pro_session == 0 {
            return Err(CustodianError::Konfiguration(
                "limits.max_chunks_pro_session muss groesser 0 sein".into(),
            ));
        }
        if self.limits.max_sessions == 0 {
            return Err(CustodianError::Konfiguration(
                "limits.max_sessions muss groesser 0 sein".into(),
            ));
        }
        Ok(())
    }
}
