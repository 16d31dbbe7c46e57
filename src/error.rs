use thiserror::Error;

/// Taxonomie des erreurs du pipeline
///
/// Chaque variante a une politique de traitement fixe:
/// - `Parse`: absorbée, l'enregistrement est émis avec des valeurs par défaut
/// - `Connection`: côté agent, reconnexion avec backoff; côté hub, déconnexion du pair concerné
/// - `Serialization`: l'alerte est remplacée par une alerte par défaut, jamais abandonnée
/// - `Protocol`: le pair fautif est déconnecté, le hub continue
#[derive(Debug, Error)]
pub enum ZwatchError {
    #[error("erreur d'analyse de paquet: {0}")]
    Parse(String),

    #[error("erreur de capture: {0}")]
    Capture(String),

    #[error("erreur de connexion: {0}")]
    Connection(#[from] std::io::Error),

    #[error("erreur de sérialisation: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("erreur de protocole: {0}")]
    Protocol(String),
}
