use crate::aggregator::WindowBuffer;
use crate::classifier::AlertClassifier;
use crate::error::ZwatchError;
use crate::features;
use crate::logger::Logger;
use crate::models::{PacketInfo, PacketType};
use crate::outbound::AlertSender;
use log::{debug, error, info, warn};
use pcap::{Capture, Device};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::{TcpFlags, TcpPacket};
use pnet::packet::udp::UdpPacket;
use pnet::packet::Packet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Source de paquets bruts
///
/// `Ok(None)` signale une itération sans paquet (délai de lecture ou trame
/// inexploitable), jamais une fin de flux.
pub trait PacketSource {
    fn next_packet(&mut self) -> Result<Option<PacketInfo>, ZwatchError>;
}

/// Capture vivante sur une interface réseau via pcap
pub struct LiveSource {
    capture: Capture<pcap::Active>,
}

impl LiveSource {
    /// Ouvre l'interface en mode promiscuité
    ///
    /// Le délai de lecture d'une seconde garantit que la boucle de capture
    /// reprend la main sur un lien silencieux et peut fermer ses fenêtres.
    pub fn open(interface_name: &str) -> Result<Self, ZwatchError> {
        let devices = Device::list().map_err(|e| ZwatchError::Capture(e.to_string()))?;

        let device = devices
            .into_iter()
            .find(|d| d.name == interface_name)
            .ok_or_else(|| {
                ZwatchError::Capture(format!("interface {} non trouvée", interface_name))
            })?;

        info!("Démarrage de la capture sur l'interface {}", interface_name);

        let capture = Capture::from_device(device)
            .map_err(|e| ZwatchError::Capture(e.to_string()))?
            .promisc(true)
            .snaplen(65535)
            .timeout(1000)
            .open()
            .map_err(|e| ZwatchError::Capture(e.to_string()))?;

        Ok(Self { capture })
    }
}

impl PacketSource for LiveSource {
    fn next_packet(&mut self) -> Result<Option<PacketInfo>, ZwatchError> {
        match self.capture.next_packet() {
            Ok(packet) => Ok(parse_packet(packet.data)),
            // Un délai de lecture n'est pas une erreur, juste une itération vide
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(e) => Err(ZwatchError::Capture(e.to_string())),
        }
    }
}

/// Source simulée pour faire tourner le pipeline sans privilèges de capture
pub struct SimulatedSource {
    pause: Duration,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self {
            pause: Duration::from_millis(10),
        }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketSource for SimulatedSource {
    fn next_packet(&mut self) -> Result<Option<PacketInfo>, ZwatchError> {
        std::thread::sleep(self.pause);
        Ok(Some(simulate_packet()))
    }
}

/// Génère un paquet simulé aléatoire
fn simulate_packet() -> PacketInfo {
    use rand::Rng;
    use std::net::Ipv4Addr;

    let mut rng = rand::rng();

    // Répartition approximative des protocoles d'un lien ordinaire
    let packet_type = match rng.random_range(0..100) {
        0..=70 => PacketType::Tcp,
        71..=85 => PacketType::Udp,
        _ => PacketType::Icmp,
    };

    let source_ip = IpAddr::V4(Ipv4Addr::new(
        rng.random_range(1..255),
        rng.random_range(0..255),
        rng.random_range(0..255),
        rng.random_range(1..255),
    ));

    let (source_port, dest_port) = match packet_type {
        PacketType::Tcp | PacketType::Udp => (
            Some(rng.random_range(1024..65535)),
            Some(rng.random_range(1..65535)),
        ),
        _ => (None, None),
    };

    PacketInfo {
        timestamp: SystemTime::now(),
        source_ip,
        dest_ip: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)),
        source_port,
        dest_port,
        protocol: packet_type,
        size: rng.random_range(40..1500),
        tcp_flags: if packet_type == PacketType::Tcp {
            Some(TcpFlags::SYN | TcpFlags::ACK)
        } else {
            None
        },
        ttl: Some(rng.random_range(32..128)),
    }
}

/// Analyse un paquet réseau brut et retourne une structure PacketInfo
pub fn parse_packet(packet_data: &[u8]) -> Option<PacketInfo> {
    if let Some(ethernet) = EthernetPacket::new(packet_data) {
        match ethernet.get_ethertype() {
            EtherTypes::Ipv4 => {
                if let Some(ipv4) = Ipv4Packet::new(ethernet.payload()) {
                    return parse_ip_packet(
                        IpAddr::V4(ipv4.get_source()),
                        IpAddr::V4(ipv4.get_destination()),
                        ipv4.get_next_level_protocol(),
                        ipv4.payload(),
                        packet_data.len(),
                        Some(ipv4.get_ttl()),
                    );
                }
            }
            EtherTypes::Ipv6 => {
                if let Some(ipv6) = Ipv6Packet::new(ethernet.payload()) {
                    return parse_ip_packet(
                        IpAddr::V6(ipv6.get_source()),
                        IpAddr::V6(ipv6.get_destination()),
                        ipv6.get_next_header(),
                        ipv6.payload(),
                        packet_data.len(),
                        Some(ipv6.get_hop_limit()),
                    );
                }
            }
            _ => {
                // Trame non IP, ignorée
            }
        }
    }
    None
}

/// Analyse un paquet IP et extrait les informations de transport
fn parse_ip_packet(
    source_ip: IpAddr,
    destination_ip: IpAddr,
    protocol: IpNextHeaderProtocol,
    payload: &[u8],
    size: usize,
    ttl: Option<u8>,
) -> Option<PacketInfo> {
    let (protocol_type, source_port, dest_port, tcp_flags) = match protocol {
        IpNextHeaderProtocols::Tcp => {
            if let Some(tcp) = TcpPacket::new(payload) {
                (
                    PacketType::Tcp,
                    Some(tcp.get_source()),
                    Some(tcp.get_destination()),
                    Some(tcp.get_flags()),
                )
            } else {
                // En-tête TCP tronqué: on garde le paquet, ports par défaut
                (PacketType::Tcp, None, None, None)
            }
        }
        IpNextHeaderProtocols::Udp => {
            if let Some(udp) = UdpPacket::new(payload) {
                (
                    PacketType::Udp,
                    Some(udp.get_source()),
                    Some(udp.get_destination()),
                    None,
                )
            } else {
                (PacketType::Udp, None, None, None)
            }
        }
        IpNextHeaderProtocols::Icmp | IpNextHeaderProtocols::Icmpv6 => {
            (PacketType::Icmp, None, None, None)
        }
        _ => (PacketType::Other, None, None, None),
    };

    Some(PacketInfo {
        timestamp: SystemTime::now(),
        source_ip,
        dest_ip: destination_ip,
        source_port,
        dest_port,
        protocol: protocol_type,
        size,
        tcp_flags,
        ttl,
    })
}

/// Boucle capture, extraction, agrégation et classification
///
/// Tourne de manière synchrone sur son propre thread: chaque paquet est
/// extrait puis accumulé, la fenêtre se ferme à l'horloge murale quel que
/// soit son contenu. Seul le canal sortant la relie au côté réseau.
pub fn run_pipeline<S: PacketSource>(
    mut source: S,
    window_interval: Duration,
    mut classifier: AlertClassifier,
    outbound: AlertSender,
    logger: Arc<Logger>,
) {
    let mut buffer = WindowBuffer::new();

    loop {
        match source.next_packet() {
            Ok(Some(packet)) => {
                logger.log_packet(&packet);
                buffer.push(features::extract(&packet));
            }
            Ok(None) => {}
            Err(e @ ZwatchError::Capture(_)) => {
                error!("Arrêt de la capture: {}", e);
                break;
            }
            Err(e) => {
                // Erreur d'analyse absorbée, la boucle continue
                warn!("Paquet inexploitable: {}", e);
            }
        }

        if buffer.should_flush(window_interval) {
            let window = buffer.flush();
            if window.is_empty() {
                debug!("Fenêtre vide écartée");
                continue;
            }

            if let Some(alert) = classifier.process(&window) {
                info!(
                    "Alerte: {} (IP dominante: {})",
                    alert.alert_type, alert.src_ip
                );
                logger.log_alert(&alert);
                if outbound.send(alert).is_err() {
                    error!("Canal sortant fermé, arrêt de la capture");
                    break;
                }
            }
        }
    }
}
