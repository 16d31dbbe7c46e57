use clap::Parser;
use std::sync::Arc;
use tokio::sync::RwLock;
use zwatch::cli::{Cli, Command};
use zwatch::config::{Config, LogMode};
use zwatch::service::ZwatchService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger la configuration pour déterminer le mode de log
    let config = Config::load().unwrap_or_else(|_| Config::default());

    // Initialiser le logger approprié
    match config.log_mode {
        LogMode::File => {
            env_logger::init_from_env(
                env_logger::Env::default().default_filter_or(&config.log_level),
            );
        }
        LogMode::SystemdJournal => {
            // Logger systemd-journal uniquement si la feature est activée
            #[cfg(feature = "systemd")]
            {
                use systemd_journal_logger::JournalLog;

                let log_level = match config.log_level.to_lowercase().as_str() {
                    "trace" => log::LevelFilter::Trace,
                    "debug" => log::LevelFilter::Debug,
                    "info" => log::LevelFilter::Info,
                    "warn" => log::LevelFilter::Warn,
                    "error" => log::LevelFilter::Error,
                    _ => log::LevelFilter::Info,
                };

                match JournalLog::new() {
                    Ok(logger) => {
                        if let Err(e) = logger
                            .with_syslog_identifier("zwatch".to_string())
                            .install()
                        {
                            eprintln!("Erreur lors de l'installation du logger systemd: {}", e);
                            env_logger::init_from_env(
                                env_logger::Env::default().default_filter_or(&config.log_level),
                            );
                        } else {
                            log::set_max_level(log_level);
                            log::info!("Logger systemd initialisé avec niveau: {}", config.log_level);
                        }
                    }
                    Err(e) => {
                        eprintln!("Erreur lors de l'initialisation du logger systemd: {}", e);
                        env_logger::init_from_env(
                            env_logger::Env::default().default_filter_or(&config.log_level),
                        );
                    }
                }
            }

            // Repli si la feature systemd n'est pas activée
            #[cfg(not(feature = "systemd"))]
            {
                eprintln!("AVERTISSEMENT: le mode SystemdJournal n'est pas disponible (feature 'systemd' non activée). Logger standard utilisé à la place.");
                env_logger::init_from_env(
                    env_logger::Env::default().default_filter_or(&config.log_level),
                );
            }
        }
    }

    // Analyser les arguments de ligne de commande
    let cli = Cli::parse();
    let config = Arc::new(RwLock::new(config));

    match cli.command {
        Command::Agent {
            interface,
            hub,
            simulate,
        } => {
            {
                let mut config = config.write().await;
                if let Some(interface) = interface {
                    config.interface = interface;
                }
                if let Some(hub) = hub {
                    config.hub_addr = hub;
                }
            }
            let service = ZwatchService::new(config.clone());
            service.run_agent(simulate).await
        }
        Command::Hub { listen, http } => {
            {
                let mut config = config.write().await;
                if let Some(listen) = listen {
                    config.listen_addr = listen;
                }
                if let Some(http) = http {
                    config.http_addr = http;
                }
            }
            let service = ZwatchService::new(config.clone());
            service.run_hub().await
        }
        Command::Status => {
            let service = ZwatchService::new(config.clone());
            service.status().await;
            Ok(())
        }
    }
}
