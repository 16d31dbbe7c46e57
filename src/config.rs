use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "/etc/zwatch/config.json";
const CONFIG_DIR: &str = "/etc/zwatch";

/// Mode de journalisation utilisé par le système
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LogMode {
    /// Journal dans un fichier local
    #[default]
    File,
    /// Journal via systemd-journal
    SystemdJournal,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Version actuelle du logiciel
    pub version: String,

    /// Interface réseau à capturer
    pub interface: String,

    /// Adresse du hub vers laquelle l'agent relaie ses alertes
    pub hub_addr: String,

    /// Adresse d'écoute du hub pour les agents et observateurs
    pub listen_addr: String,

    /// Adresse d'écoute de l'API HTTP de statut du hub
    pub http_addr: String,

    /// Durée (en secondes) d'une fenêtre d'agrégation
    pub window_interval_secs: u64,

    /// Seuil de moyenne de paquets avant (au-delà: scan de ports)
    pub fwd_packet_threshold: f64,

    /// Seuil de moyenne de paquets arrière (au-delà: DDoS)
    pub bwd_packet_threshold: f64,

    /// Attente fixe (en secondes) entre deux tentatives de reconnexion
    pub reconnect_backoff_secs: u64,

    /// Intervalle (en millisecondes) de sondage du canal sortant
    pub send_poll_interval_ms: u64,

    /// Intervalle (en secondes) des trames de maintien vers les observateurs
    pub keepalive_interval_secs: u64,

    /// Refuser un second agent au lieu de remplacer le premier
    pub reject_second_agent: bool,

    /// Chemin vers le fichier de log
    pub log_file: String,

    /// Niveau de log
    pub log_level: String,

    /// Mode de journalisation (fichier ou systemd-journal)
    pub log_mode: LogMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: env!("CARGO_PKG_VERSION").to_string(),
            interface: "eth0".to_string(),
            hub_addr: "127.0.0.1:8790".to_string(),
            listen_addr: "127.0.0.1:8790".to_string(),
            http_addr: "127.0.0.1:8791".to_string(),
            window_interval_secs: 10,
            fwd_packet_threshold: 1000.0,
            bwd_packet_threshold: 500.0,
            reconnect_backoff_secs: 5,
            send_poll_interval_ms: 100,
            keepalive_interval_secs: 1,
            reject_second_agent: false,
            log_file: "/var/log/zwatch/zwatch.log".to_string(),
            log_level: "info".to_string(),
            log_mode: LogMode::File,
        }
    }
}

impl Config {
    /// Charge la configuration depuis le fichier système
    pub fn load() -> Result<Self, Box<dyn Error>> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Charge la configuration depuis un chemin explicite
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn Error>> {
        if !path.exists() {
            // Créer la configuration par défaut si elle n'existe pas
            let default_config = Config::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Sauvegarde la configuration dans le fichier système
    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let _ = fs::create_dir_all(CONFIG_DIR);
        self.save_to(Path::new(CONFIG_FILE))
    }

    /// Sauvegarde la configuration vers un chemin explicite
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let config_json = serde_json::to_string_pretty(self)?;
        fs::write(path, config_json)?;
        Ok(())
    }

    pub fn window_interval(&self) -> Duration {
        Duration::from_secs(self.window_interval_secs)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }

    pub fn send_poll_interval(&self) -> Duration {
        Duration::from_millis(self.send_poll_interval_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }
}
