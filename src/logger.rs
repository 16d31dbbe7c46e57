use crate::config::LogMode;
use crate::models::{Alert, AlertType, PacketInfo, PacketType};
use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

pub struct Logger {
    log_file: Mutex<Option<File>>,
    log_path: String,
    log_mode: LogMode,
}

impl Logger {
    pub fn new(log_path: String) -> Self {
        Self::new_with_mode(log_path, LogMode::File)
    }

    pub fn new_with_mode(log_path: String, log_mode: LogMode) -> Self {
        // En mode fichier, ouvrir le fichier de log dès la création
        let file = if log_mode == LogMode::File {
            if let Some(parent) = Path::new(&log_path).parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    error!("Erreur lors de la création du répertoire de logs: {}", e);
                }
            }

            match OpenOptions::new().create(true).append(true).open(&log_path) {
                Ok(file) => Some(file),
                Err(e) => {
                    error!("Erreur lors de l'ouverture du fichier de log {}: {}", log_path, e);
                    None
                }
            }
        } else {
            // En mode systemd-journal, pas besoin de fichier
            None
        };

        Self {
            log_file: Mutex::new(file),
            log_path,
            log_mode,
        }
    }

    pub fn log_packet(&self, packet: &PacketInfo) {
        let timestamp: DateTime<Local> = packet.timestamp.into();
        let formatted_time = timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let protocol = match packet.protocol {
            PacketType::Tcp => "TCP",
            PacketType::Udp => "UDP",
            PacketType::Icmp => "ICMP",
            PacketType::Other => "OTHER",
        };

        let log_entry = format!(
            "[{}] {} -> {} | Protocol: {} | Size: {} bytes | Src Port: {:?} | Dst Port: {:?}",
            formatted_time,
            packet.source_ip,
            packet.dest_ip,
            protocol,
            packet.size,
            packet.source_port,
            packet.dest_port
        );

        match self.log_mode {
            LogMode::File => {
                self.write_to_log(&format!("{}\n", log_entry));
            }
            LogMode::SystemdJournal => {
                debug!("{}", log_entry);
            }
        }
    }

    pub fn log_alert(&self, alert: &Alert) {
        let now: DateTime<Local> = Local::now();
        let formatted_time = now.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let log_entry = format!(
            "[{}] [ALERT] [IP: {}] {} - {}",
            formatted_time, alert.src_ip, alert.alert_type, alert.description
        );

        match self.log_mode {
            LogMode::File => {
                self.write_to_log(&format!("{}\n", log_entry));
            }
            LogMode::SystemdJournal => match alert.alert_type {
                AlertType::Normal => info!("{}", log_entry),
                AlertType::PortScan | AlertType::Ddos => warn!("{}", log_entry),
            },
        }
    }

    fn write_to_log(&self, message: &str) {
        if self.log_mode == LogMode::SystemdJournal {
            return;
        }

        let mut log_file_guard = match self.log_file.lock() {
            Ok(guard) => guard,
            Err(e) => {
                error!("Erreur lors de l'acquisition du verrou pour le fichier de log: {}", e);
                return;
            }
        };

        if let Some(file) = log_file_guard.as_mut() {
            if let Err(e) = file.write_all(message.as_bytes()) {
                error!("Erreur lors de l'écriture dans le fichier de log: {}", e);

                // Essayer de réouvrir le fichier
                *log_file_guard = match OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.log_path)
                {
                    Ok(file) => Some(file),
                    Err(e) => {
                        error!("Erreur lors de la réouverture du fichier de log: {}", e);
                        None
                    }
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::SystemTime;

    #[test]
    fn test_packet_and_alert_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zwatch.log");
        let logger = Logger::new(path.to_string_lossy().to_string());

        logger.log_packet(&PacketInfo {
            timestamp: SystemTime::now(),
            source_ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            dest_ip: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)),
            source_port: Some(44231),
            dest_port: Some(443),
            protocol: PacketType::Tcp,
            size: 60,
            tcp_flags: None,
            ttl: Some(64),
        });
        logger.log_alert(&Alert::new(
            AlertType::Ddos,
            "10.0.0.1".to_string(),
            "High backward traffic detected".to_string(),
        ));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("10.0.0.1 -> 192.168.1.1"));
        assert!(content.contains("[ALERT] [IP: 10.0.0.1] Possible DDoS"));
    }
}
