use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Nombre de canaux du schéma de caractéristiques
pub const FEATURE_COUNT: usize = 78;

/// Ordre canonique des canaux de caractéristiques
///
/// L'ordre fait partie du contrat: l'agrégation et le service d'inférence
/// indexent positionnellement. Ne jamais réordonner ni renommer.
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "destination port",
    "flow duration",
    "total fwd packets",
    "total backward packets",
    "total length of fwd packets",
    "total length of bwd packets",
    "fwd packet length max",
    "fwd packet length min",
    "fwd packet length mean",
    "fwd packet length std",
    "bwd packet length max",
    "bwd packet length min",
    "bwd packet length mean",
    "bwd packet length std",
    "flow bytes/s",
    "flow packets/s",
    "flow iat mean",
    "flow iat std",
    "flow iat max",
    "flow iat min",
    "fwd iat total",
    "fwd iat mean",
    "fwd iat std",
    "fwd iat max",
    "fwd iat min",
    "bwd iat total",
    "bwd iat mean",
    "bwd iat std",
    "bwd iat max",
    "bwd iat min",
    "fwd psh flags",
    "bwd psh flags",
    "fwd urg flags",
    "bwd urg flags",
    "fwd header length",
    "bwd header length",
    "fwd packets/s",
    "bwd packets/s",
    "min packet length",
    "max packet length",
    "packet length mean",
    "packet length std",
    "packet length variance",
    "fin flag count",
    "syn flag count",
    "rst flag count",
    "psh flag count",
    "ack flag count",
    "urg flag count",
    "cwe flag count",
    "ece flag count",
    "down/up ratio",
    "average packet size",
    "avg fwd segment size",
    "avg bwd segment size",
    "fwd header length.1",
    "fwd avg bytes/bulk",
    "fwd avg packets/bulk",
    "fwd avg bulk rate",
    "bwd avg bytes/bulk",
    "bwd avg packets/bulk",
    "bwd avg bulk rate",
    "subflow fwd packets",
    "subflow fwd bytes",
    "subflow bwd packets",
    "subflow bwd bytes",
    "init_win_bytes_forward",
    "init_win_bytes_backward",
    "act_data_pkt_fwd",
    "min_seg_size_forward",
    "active mean",
    "active std",
    "active max",
    "active min",
    "idle mean",
    "idle std",
    "idle max",
    "idle min",
];

/// Indices des canaux utilisés directement par l'extracteur et le classifieur
pub const IDX_DESTINATION_PORT: usize = 0;
pub const IDX_FLOW_DURATION: usize = 1;
pub const IDX_TOTAL_FWD_PACKETS: usize = 2;
pub const IDX_TOTAL_BWD_PACKETS: usize = 3;
pub const IDX_TOTAL_LEN_FWD_PACKETS: usize = 4;
pub const IDX_MIN_PACKET_LENGTH: usize = 38;
pub const IDX_MAX_PACKET_LENGTH: usize = 39;
pub const IDX_PACKET_LENGTH_MEAN: usize = 40;
pub const IDX_FIN_FLAG_COUNT: usize = 43;
pub const IDX_SYN_FLAG_COUNT: usize = 44;
pub const IDX_RST_FLAG_COUNT: usize = 45;
pub const IDX_PSH_FLAG_COUNT: usize = 46;
pub const IDX_ACK_FLAG_COUNT: usize = 47;
pub const IDX_URG_FLAG_COUNT: usize = 48;
pub const IDX_AVERAGE_PACKET_SIZE: usize = 52;

static FEATURE_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    FEATURE_ORDER
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, i))
        .collect()
});

/// Retourne l'indice positionnel d'un canal à partir de son nom
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_INDEX.get(name).copied()
}
