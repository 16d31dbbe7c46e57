use clap::{Parser, Subcommand};

/// Interface en ligne de commande de zwatch
#[derive(Parser)]
#[command(name = "zwatch", version, about = "Pipeline de télémétrie réseau en temps réel")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Démarre l'agent: capture, agrégation, classification et relais
    Agent {
        /// Interface réseau à capturer
        #[arg(short, long)]
        interface: Option<String>,

        /// Adresse du hub destinataire des alertes
        #[arg(long)]
        hub: Option<String>,

        /// Remplace la capture vivante par un trafic simulé
        #[arg(long)]
        simulate: bool,
    },

    /// Démarre le hub de diffusion des alertes
    Hub {
        /// Adresse d'écoute pour l'agent et les observateurs
        #[arg(short, long)]
        listen: Option<String>,

        /// Adresse d'écoute de l'API HTTP de statut
        #[arg(long)]
        http: Option<String>,
    },

    /// Affiche la configuration effective
    Status,
}
