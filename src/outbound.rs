use tokio::sync::mpsc;

use crate::models::Alert;

/// Côté producteur du canal sortant, tenu par la boucle de capture
pub type AlertSender = mpsc::UnboundedSender<Alert>;

/// Côté consommateur du canal sortant, tenu par le client de relais
pub type AlertReceiver = mpsc::UnboundedReceiver<Alert>;

/// Crée le canal sortant entre la capture et l'envoi réseau
///
/// FIFO mono-producteur mono-consommateur, non borné comme la file de
/// l'agent d'origine. Les alertes composées pendant une coupure attendent
/// ici; seule une fin brutale du processus entre mise en file et envoi
/// peut en perdre.
pub fn channel() -> (AlertSender, AlertReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertType;
    use tokio::sync::mpsc::error::TryRecvError;

    #[tokio::test]
    async fn test_fifo_order_preserved() {
        let (tx, mut rx) = channel();

        for i in 0..5 {
            let alert = Alert::new(
                AlertType::PortScan,
                format!("10.0.0.{}", i),
                "High number of forward packets".to_string(),
            );
            tx.send(alert).unwrap();
        }

        for i in 0..5 {
            let alert = rx.recv().await.unwrap();
            assert_eq!(alert.src_ip, format!("10.0.0.{}", i));
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_items_survive_while_consumer_absent() {
        let (tx, mut rx) = channel();
        tx.send(Alert::new(
            AlertType::Ddos,
            "10.0.0.1".to_string(),
            "High backward traffic detected".to_string(),
        ))
        .unwrap();

        // Le consommateur peut arriver bien plus tard, rien n'est perdu
        let alert = rx.try_recv().unwrap();
        assert_eq!(alert.alert_type, AlertType::Ddos);
    }
}
