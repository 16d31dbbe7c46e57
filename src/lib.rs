//! Bibliothèque zwatch pour la télémétrie réseau en temps réel
//!
//! Cette bibliothèque transforme le trafic capturé en résumés statistiques
//! par fenêtre de temps, classe chaque fenêtre en alerte lisible et
//! achemine les alertes d'un agent de capture vers des observateurs via
//! un hub central de diffusion.

// Modules du pipeline de capture
pub mod schema;     // Schéma fixe des canaux de caractéristiques
pub mod models;     // Structures de données partagées
pub mod features;   // Extraction de caractéristiques par paquet
pub mod aggregator; // Agrégation par fenêtre de temps
pub mod classifier; // Classification et suppression d'alertes

// Modules de distribution
pub mod outbound; // Canal sortant entre capture et envoi réseau
pub mod wire;     // Codec du protocole de relais
pub mod relay;    // Client de relais de l'agent
pub mod hub;      // Hub central de diffusion
pub mod api;      // API HTTP de statut du hub

// Modules utilitaires et services
pub mod capture; // Sources de paquets et boucle de capture
pub mod cli;     // Interface en ligne de commande
pub mod config;  // Configuration du système
pub mod error;   // Taxonomie des erreurs
pub mod logger;  // Journalisation des paquets et alertes
pub mod service; // Assemblage de l'agent et du hub

// Re-export des structures principales pour faciliter l'utilisation
pub use aggregator::{aggregate, AggregatedWindow, WindowBuffer};
pub use classifier::AlertClassifier;
pub use config::Config;
pub use error::ZwatchError;
pub use hub::HubState;
pub use models::{Alert, AlertType, FeatureRecord, PacketInfo, PacketType, TrafficState};
pub use relay::RelayClient;
pub use service::ZwatchService;
