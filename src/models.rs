use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::schema::{self, FEATURE_COUNT};

/// Type de paquets détectés
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Copy)]
pub enum PacketType {
    Tcp,
    Udp,
    Icmp,
    Other,
}

impl PacketType {
    /// Indicateur numérique de protocole (numéros IANA, 0 pour inconnu)
    pub fn code(&self) -> u8 {
        match self {
            PacketType::Tcp => 6,
            PacketType::Udp => 17,
            PacketType::Icmp => 1,
            PacketType::Other => 0,
        }
    }
}

/// Informations sur un paquet réseau capturé
#[derive(Debug, Clone)]
pub struct PacketInfo {
    pub timestamp: SystemTime,
    pub source_ip: IpAddr,
    pub dest_ip: IpAddr,
    pub source_port: Option<u16>,
    pub dest_port: Option<u16>,
    pub protocol: PacketType,
    pub size: usize,
    /// Bits de drapeaux TCP bruts, absents hors TCP
    pub tcp_flags: Option<u8>,
    pub ttl: Option<u8>,
}

/// Enregistrement de caractéristiques d'un paquet
///
/// Vecteur de taille fixe suivant l'ordre de `schema::FEATURE_ORDER`.
/// Les adresses IP et l'indicateur de protocole voyagent hors schéma.
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    values: [f64; FEATURE_COUNT],
    pub src_ip: Option<IpAddr>,
    pub dst_ip: Option<IpAddr>,
    pub protocol: u8,
}

impl FeatureRecord {
    /// Crée un enregistrement entièrement rempli de zéros
    pub fn new() -> Self {
        Self {
            values: [0.0; FEATURE_COUNT],
            src_ip: None,
            dst_ip: None,
            protocol: 0,
        }
    }

    pub fn get(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        schema::feature_index(name).map(|i| self.values[i])
    }

    /// Vecteur positionnel complet, dans l'ordre du schéma
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }
}

impl Default for FeatureRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Classification d'une fenêtre de trafic, ensemble fermé
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlertType {
    #[serde(rename = "Possible Port Scan")]
    PortScan,
    #[serde(rename = "Possible DDoS")]
    Ddos,
    #[serde(rename = "Normal Traffic")]
    Normal,
}

impl AlertType {
    pub fn is_normal(&self) -> bool {
        matches!(self, AlertType::Normal)
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlertType::PortScan => "Possible Port Scan",
            AlertType::Ddos => "Possible DDoS",
            AlertType::Normal => "Normal Traffic",
        };
        f.write_str(label)
    }
}

/// Alerte classifiée, immuable une fois construite
///
/// C'est le message de fil tel quel: tout changement de champ casse
/// l'ensemble des observateurs, il n'y a pas de champ de version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub alert_type: AlertType,
    pub src_ip: String,
    pub description: String,
    /// Secondes depuis l'époque Unix, précision flottante
    pub timestamp: f64,
}

impl Alert {
    pub fn new(alert_type: AlertType, src_ip: String, description: String) -> Self {
        Self {
            alert_type,
            src_ip,
            description,
            timestamp: epoch_seconds(),
        }
    }

    /// Alerte de repli quand la sérialisation d'une alerte échoue
    pub fn fallback() -> Self {
        Self::new(
            AlertType::Normal,
            "unknown".to_string(),
            "Alert serialization failed".to_string(),
        )
    }

    /// Sérialise l'alerte pour le fil
    ///
    /// Ne supprime jamais une émission: en cas d'échec de sérialisation,
    /// dégrade vers l'alerte de repli.
    pub fn to_wire(&self) -> Vec<u8> {
        match serde_json::to_vec(self) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Erreur de sérialisation d'une alerte, repli: {}", e);
                serde_json::to_vec(&Self::fallback()).unwrap_or_else(|_| {
                    br#"{"alert_type":"Normal Traffic","src_ip":"unknown","description":"Alert serialization failed","timestamp":0.0}"#.to_vec()
                })
            }
        }
    }
}

/// Horloge murale en secondes depuis l'époque
pub fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// État de trafic du classifieur, propre à une session d'agent
///
/// Repart toujours de `Unknown` au redémarrage du processus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrafficState {
    #[default]
    Unknown,
    Normal,
    Abnormal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_record_zero_filled() {
        let rec = FeatureRecord::new();
        assert!(rec.values().iter().all(|v| *v == 0.0));
        assert_eq!(rec.src_ip, None);
        assert_eq!(rec.get_by_name("flow duration"), Some(0.0));
    }

    #[test]
    fn test_feature_record_out_of_range_is_inert() {
        let mut rec = FeatureRecord::new();
        rec.set(FEATURE_COUNT + 10, 1.0);
        assert_eq!(rec.get(FEATURE_COUNT + 10), 0.0);
    }

    #[test]
    fn test_alert_wire_field_names() {
        let alert = Alert::new(
            AlertType::PortScan,
            "10.0.0.9".to_string(),
            "High number of forward packets".to_string(),
        );
        let value: serde_json::Value = serde_json::from_slice(&alert.to_wire()).unwrap();
        assert_eq!(value["alert_type"], "Possible Port Scan");
        assert_eq!(value["src_ip"], "10.0.0.9");
        assert_eq!(value["description"], "High number of forward packets");
        assert!(value["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_alert_type_round_trip() {
        for (ty, label) in [
            (AlertType::PortScan, "\"Possible Port Scan\""),
            (AlertType::Ddos, "\"Possible DDoS\""),
            (AlertType::Normal, "\"Normal Traffic\""),
        ] {
            assert_eq!(serde_json::to_string(&ty).unwrap(), label);
            let back: AlertType = serde_json::from_str(label).unwrap();
            assert_eq!(back, ty);
        }
    }

    #[test]
    fn test_protocol_codes() {
        assert_eq!(PacketType::Tcp.code(), 6);
        assert_eq!(PacketType::Udp.code(), 17);
        assert_eq!(PacketType::Icmp.code(), 1);
        assert_eq!(PacketType::Other.code(), 0);
    }
}
