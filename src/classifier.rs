use log::debug;

use crate::aggregator::AggregatedWindow;
use crate::models::{Alert, AlertType, TrafficState};
use crate::schema::{IDX_TOTAL_BWD_PACKETS, IDX_TOTAL_FWD_PACKETS};

/// Classifieur d'alertes à seuils avec suppression des alertes normales
///
/// Les seuils sont strictement exclusifs: une moyenne égale au seuil reste
/// du trafic normal. L'état de trafic ne sert qu'à décider si une alerte
/// normale vaut la peine d'être émise.
pub struct AlertClassifier {
    state: TrafficState,
    fwd_packet_threshold: f64,
    bwd_packet_threshold: f64,
}

impl AlertClassifier {
    pub fn new(fwd_packet_threshold: f64, bwd_packet_threshold: f64) -> Self {
        Self {
            state: TrafficState::Unknown,
            fwd_packet_threshold,
            bwd_packet_threshold,
        }
    }

    pub fn state(&self) -> TrafficState {
        self.state
    }

    /// Classification pure d'un agrégat, sans effet sur l'état
    ///
    /// Les règles s'évaluent dans cet ordre fixe: scan de ports, puis DDoS,
    /// puis trafic normal.
    pub fn classify(&self, window: &AggregatedWindow) -> Alert {
        let src_ip = window.dominant_src_ip.clone();

        if window.mean[IDX_TOTAL_FWD_PACKETS] > self.fwd_packet_threshold {
            Alert::new(
                AlertType::PortScan,
                src_ip,
                "High number of forward packets".to_string(),
            )
        } else if window.mean[IDX_TOTAL_BWD_PACKETS] > self.bwd_packet_threshold {
            Alert::new(
                AlertType::Ddos,
                src_ip,
                "High backward traffic detected".to_string(),
            )
        } else {
            Alert::new(
                AlertType::Normal,
                src_ip,
                "No intrusion detected".to_string(),
            )
        }
    }

    /// Classifie puis applique la politique d'émission
    ///
    /// Une alerte anormale est toujours émise et fait passer l'état à
    /// `Abnormal`. Une alerte normale n'est émise qu'à l'entrée dans l'état
    /// `Normal`; les fenêtres normales consécutives sont supprimées sans
    /// rafraîchir l'horodatage de la dernière émission.
    pub fn process(&mut self, window: &AggregatedWindow) -> Option<Alert> {
        let alert = self.classify(window);

        if alert.alert_type.is_normal() {
            if self.state == TrafficState::Normal {
                debug!("Fenêtre normale consécutive supprimée");
                return None;
            }
            self.state = TrafficState::Normal;
            Some(alert)
        } else {
            self.state = TrafficState::Abnormal;
            Some(alert)
        }
    }
}
