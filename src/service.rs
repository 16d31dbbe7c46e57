use crate::capture::{self, LiveSource, SimulatedSource};
use crate::classifier::AlertClassifier;
use crate::config::Config;
use crate::hub::HubState;
use crate::logger::Logger;
use crate::outbound;
use crate::relay::RelayClient;
use crate::{api, hub};
use futures::executor;
use log::{error, info};
use std::sync::Arc;
use std::thread;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

/// Service zwatch: assemble et démarre l'agent ou le hub
pub struct ZwatchService {
    config: Arc<RwLock<Config>>,
    logger: Arc<Logger>,
}

impl ZwatchService {
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        // Récupérer les paramètres de journalisation pour le logger
        let log_config = executor::block_on(async {
            let config_guard = config.read().await;
            (config_guard.log_file.clone(), config_guard.log_mode)
        });

        Self {
            config,
            logger: Arc::new(Logger::new_with_mode(log_config.0, log_config.1)),
        }
    }

    /// Démarre l'agent et bloque jusqu'à l'arrêt du processus
    ///
    /// Deux contextes d'exécution seulement: le thread de capture qui
    /// traite chaque paquet de manière synchrone, et la tâche de relais.
    /// Ils ne partagent que le canal sortant.
    pub async fn run_agent(&self, simulate: bool) -> anyhow::Result<()> {
        let (interface, hub_addr, window_interval, fwd, bwd, backoff, poll) = {
            let config = self.config.read().await;
            (
                config.interface.clone(),
                config.hub_addr.clone(),
                config.window_interval(),
                config.fwd_packet_threshold,
                config.bwd_packet_threshold,
                config.reconnect_backoff(),
                config.send_poll_interval(),
            )
        };

        let (outbound_tx, outbound_rx) = outbound::channel();
        let classifier = AlertClassifier::new(fwd, bwd);
        let logger = self.logger.clone();

        // La capture bloque, elle vit sur son propre thread
        let _capture_thread = thread::spawn(move || {
            if simulate {
                info!("Capture simulée activée");
                capture::run_pipeline(
                    SimulatedSource::new(),
                    window_interval,
                    classifier,
                    outbound_tx,
                    logger,
                );
            } else {
                match LiveSource::open(&interface) {
                    Ok(source) => {
                        capture::run_pipeline(
                            source,
                            window_interval,
                            classifier,
                            outbound_tx,
                            logger,
                        );
                    }
                    Err(e) => {
                        error!("Capture impossible sur {}: {}", interface, e);
                    }
                }
            }
        });

        let relay = RelayClient::new(hub_addr, backoff, poll);
        let relay_task = tokio::spawn(relay.run(outbound_rx));

        info!("Agent démarré");
        tokio::signal::ctrl_c().await?;
        info!("Arrêt de l'agent");
        relay_task.abort();
        Ok(())
    }

    /// Démarre le hub et bloque jusqu'à l'arrêt du processus
    pub async fn run_hub(&self) -> anyhow::Result<()> {
        let (listen_addr, http_addr, keepalive, reject_second_agent) = {
            let config = self.config.read().await;
            (
                config.listen_addr.clone(),
                config.http_addr.clone(),
                config.keepalive_interval(),
                config.reject_second_agent,
            )
        };

        let state = HubState::new(reject_second_agent);
        let listener = TcpListener::bind(&listen_addr).await?;

        tokio::spawn(api::serve(http_addr, state.clone()));
        let hub_task = tokio::spawn(hub::run(listener, state, keepalive));

        info!("Hub démarré");
        tokio::signal::ctrl_c().await?;
        info!("Arrêt du hub");
        hub_task.abort();
        Ok(())
    }

    /// Affiche un résumé de la configuration effective
    pub async fn status(&self) {
        // Recharger depuis le fichier pour refléter l'état le plus récent
        let config = match Config::load() {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("Erreur lors du chargement de la configuration: {}", e);
                self.config.read().await.clone()
            }
        };

        println!("=== Configuration de zwatch ===");
        println!("Interface capturée: {}", config.interface);
        println!("Hub cible: {}", config.hub_addr);
        println!("Écoute du hub: {}", config.listen_addr);
        println!("API de statut: {}", config.http_addr);
        println!("Fenêtre d'agrégation: {} secondes", config.window_interval_secs);
        println!(
            "Seuils: {} paquets avant, {} paquets arrière",
            config.fwd_packet_threshold, config.bwd_packet_threshold
        );
        println!(
            "Reconnexion: toutes les {} secondes",
            config.reconnect_backoff_secs
        );
        println!(
            "Second agent: {}",
            if config.reject_second_agent {
                "refusé"
            } else {
                "remplace le premier"
            }
        );
        println!("Fichier de log: {}", config.log_file);
    }
}
