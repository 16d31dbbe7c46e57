use log::{debug, info, warn};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::sleep;

use crate::error::ZwatchError;
use crate::outbound::AlertReceiver;
use crate::wire::{self, Hello};

/// Client de relais de l'agent vers le hub
///
/// Entretient une seule connexion logique à la fois. Toute panne se
/// résout par fermeture, attente fixe puis nouvelle tentative, sans
/// limite d'essais: la disponibilité prime sur l'échec rapide.
pub struct RelayClient {
    hub_addr: String,
    backoff: Duration,
    poll_interval: Duration,
}

impl RelayClient {
    pub fn new(hub_addr: String, backoff: Duration, poll_interval: Duration) -> Self {
        Self {
            hub_addr,
            backoff,
            poll_interval,
        }
    }

    /// Tâche de fond permanente de l'agent
    ///
    /// Ne rend la main que si le canal sortant est fermé, c'est à dire
    /// quand le côté capture s'est arrêté.
    pub async fn run(self, mut outbound: AlertReceiver) {
        loop {
            match TcpStream::connect(&self.hub_addr).await {
                Ok(mut stream) => {
                    info!("Connecté au hub {}", self.hub_addr);
                    match self.drive_connection(&mut stream, &mut outbound).await {
                        Ok(()) => {
                            info!("Canal sortant fermé, arrêt du relais");
                            return;
                        }
                        Err(e) => {
                            warn!("Connexion au hub perdue: {}", e);
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "Connexion au hub {} impossible, nouvel essai dans {}s: {}",
                        self.hub_addr,
                        self.backoff.as_secs(),
                        e
                    );
                }
            }

            sleep(self.backoff).await;
        }
    }

    /// Présente le rôle d'agent puis draine le canal sortant
    ///
    /// Les alertes partent en ordre FIFO, une trame par alerte. Une alerte
    /// déjà sortie de la file quand la connexion casse est perdue, au plus
    /// une fois par coupure; celles encore en file attendent la reconnexion.
    async fn drive_connection(
        &self,
        stream: &mut TcpStream,
        outbound: &mut AlertReceiver,
    ) -> Result<(), ZwatchError> {
        wire::write_hello(stream, &Hello::agent()).await?;

        loop {
            match outbound.try_recv() {
                Ok(alert) => {
                    let payload = alert.to_wire();
                    if let Err(e) = wire::write_frame(stream, &payload).await {
                        warn!("Alerte {} perdue pendant la coupure", alert.alert_type);
                        return Err(e);
                    }
                    debug!("Alerte envoyée: {}", alert.alert_type);
                }
                Err(TryRecvError::Empty) => {
                    // Sondage court pour borner la latence sans brûler de CPU
                    sleep(self.poll_interval).await;
                }
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
    }
}
