use pnet::packet::tcp::TcpFlags;

use crate::models::{FeatureRecord, PacketInfo};
use crate::schema::{
    IDX_ACK_FLAG_COUNT, IDX_AVERAGE_PACKET_SIZE, IDX_DESTINATION_PORT, IDX_FIN_FLAG_COUNT,
    IDX_FLOW_DURATION, IDX_MAX_PACKET_LENGTH, IDX_MIN_PACKET_LENGTH, IDX_PACKET_LENGTH_MEAN,
    IDX_PSH_FLAG_COUNT, IDX_RST_FLAG_COUNT, IDX_SYN_FLAG_COUNT, IDX_TOTAL_FWD_PACKETS,
    IDX_TOTAL_LEN_FWD_PACKETS, IDX_URG_FLAG_COUNT,
};

/// Durée attribuée à un paquet isolé, la capture n'en fournit pas
const DEFAULT_PACKET_DURATION: f64 = 0.01;

/// Convertit un paquet capturé en enregistrement de caractéristiques
///
/// Ne peut pas échouer: tout attribut absent ou inexploitable garde sa
/// valeur par défaut, l'enregistrement reste complet et ordonné.
pub fn extract(packet: &PacketInfo) -> FeatureRecord {
    let mut record = FeatureRecord::new();
    let size = packet.size as f64;

    record.set(IDX_FLOW_DURATION, DEFAULT_PACKET_DURATION);
    record.set(IDX_TOTAL_FWD_PACKETS, 1.0);
    record.set(IDX_TOTAL_LEN_FWD_PACKETS, size);

    // Statistiques de longueur dégénérées pour un enregistrement mono-paquet
    record.set(IDX_MIN_PACKET_LENGTH, size);
    record.set(IDX_MAX_PACKET_LENGTH, size);
    record.set(IDX_PACKET_LENGTH_MEAN, size);
    record.set(IDX_AVERAGE_PACKET_SIZE, size);

    // Port nul quand le paquet ne porte pas de couche transport exploitable
    record.set(
        IDX_DESTINATION_PORT,
        packet.dest_port.map(f64::from).unwrap_or(0.0),
    );

    if let Some(flags) = packet.tcp_flags {
        record.set(IDX_FIN_FLAG_COUNT, flag_bit(flags, TcpFlags::FIN));
        record.set(IDX_SYN_FLAG_COUNT, flag_bit(flags, TcpFlags::SYN));
        record.set(IDX_RST_FLAG_COUNT, flag_bit(flags, TcpFlags::RST));
        record.set(IDX_PSH_FLAG_COUNT, flag_bit(flags, TcpFlags::PSH));
        record.set(IDX_ACK_FLAG_COUNT, flag_bit(flags, TcpFlags::ACK));
        record.set(IDX_URG_FLAG_COUNT, flag_bit(flags, TcpFlags::URG));
    }

    record.src_ip = Some(packet.source_ip);
    record.dst_ip = Some(packet.dest_ip);
    record.protocol = packet.protocol.code();

    record
}

fn flag_bit(flags: u8, mask: u8) -> f64 {
    if flags & mask != 0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PacketType;
    use crate::schema::{FEATURE_COUNT, FEATURE_ORDER};
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::SystemTime;

    fn tcp_packet() -> PacketInfo {
        PacketInfo {
            timestamp: SystemTime::now(),
            source_ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            dest_ip: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)),
            source_port: Some(52100),
            dest_port: Some(443),
            protocol: PacketType::Tcp,
            size: 120,
            tcp_flags: Some(TcpFlags::SYN | TcpFlags::ACK),
            ttl: Some(64),
        }
    }

    #[test]
    fn test_schema_completeness() {
        // Chaque canal du schéma existe exactement une fois, dans l'ordre,
        // quel que soit le paquet d'entrée
        let record = extract(&tcp_packet());
        assert_eq!(record.values().len(), FEATURE_COUNT);
        for name in FEATURE_ORDER {
            assert!(record.get_by_name(name).is_some(), "canal absent: {}", name);
        }
    }

    #[test]
    fn test_tcp_fields_populated() {
        let record = extract(&tcp_packet());
        assert_eq!(record.get(IDX_DESTINATION_PORT), 443.0);
        assert_eq!(record.get(IDX_FLOW_DURATION), 0.01);
        assert_eq!(record.get(IDX_TOTAL_FWD_PACKETS), 1.0);
        assert_eq!(record.get(IDX_TOTAL_LEN_FWD_PACKETS), 120.0);
        assert_eq!(record.get(IDX_SYN_FLAG_COUNT), 1.0);
        assert_eq!(record.get(IDX_ACK_FLAG_COUNT), 1.0);
        assert_eq!(record.get(IDX_FIN_FLAG_COUNT), 0.0);
        assert_eq!(record.protocol, 6);
        assert_eq!(record.src_ip.unwrap().to_string(), "10.0.0.1");
    }

    #[test]
    fn test_packet_without_transport_defaults() {
        let packet = PacketInfo {
            dest_port: None,
            source_port: None,
            protocol: PacketType::Icmp,
            tcp_flags: None,
            ..tcp_packet()
        };
        let record = extract(&packet);
        assert_eq!(record.get(IDX_DESTINATION_PORT), 0.0);
        assert_eq!(record.get(IDX_SYN_FLAG_COUNT), 0.0);
        assert_eq!(record.protocol, 1);
        // Le reste du schéma reste rempli de zéros
        assert_eq!(record.get_by_name("idle min"), Some(0.0));
    }
}
