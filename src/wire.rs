//! Codec du protocole de relais
//!
//! Format de fil: [4 octets: longueur big-endian][charge utile JSON].
//! Une trame de longueur nulle est le maintien de connexion sans contenu;
//! la première trame de toute connexion est le `hello` déclarant le rôle.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ZwatchError;

/// Taille maximale acceptée pour une trame
const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Rôle déclaré par un pair à la connexion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerRole {
    Agent,
    Observer,
}

/// Trame d'ouverture envoyée par chaque pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hello {
    pub role: PeerRole,
}

impl Hello {
    pub fn agent() -> Self {
        Self {
            role: PeerRole::Agent,
        }
    }

    pub fn observer() -> Self {
        Self {
            role: PeerRole::Observer,
        }
    }
}

/// Écrit une trame complète
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), ZwatchError> {
    let len = (payload.len() as u32).to_be_bytes();
    writer.write_all(&len).await?;
    if !payload.is_empty() {
        writer.write_all(payload).await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Écrit la trame de maintien sans contenu
pub async fn write_keepalive<W: AsyncWrite + Unpin>(writer: &mut W) -> Result<(), ZwatchError> {
    write_frame(writer, &[]).await
}

/// Lit une trame complète; un vecteur vide est un maintien de connexion
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ZwatchError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_FRAME_LEN {
        return Err(ZwatchError::Protocol(format!(
            "trame trop grande: {} octets",
            len
        )));
    }

    let mut payload = vec![0u8; len];
    if len > 0 {
        reader.read_exact(&mut payload).await?;
    }
    Ok(payload)
}

/// Envoie la trame d'ouverture
pub async fn write_hello<W: AsyncWrite + Unpin>(
    writer: &mut W,
    hello: &Hello,
) -> Result<(), ZwatchError> {
    let payload = serde_json::to_vec(hello)?;
    write_frame(writer, &payload).await
}

/// Lit et décode la trame d'ouverture d'un pair
pub async fn read_hello<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Hello, ZwatchError> {
    let payload = read_frame(reader).await?;
    if payload.is_empty() {
        return Err(ZwatchError::Protocol(
            "trame d'ouverture vide".to_string(),
        ));
    }
    serde_json::from_slice(&payload)
        .map_err(|e| ZwatchError::Protocol(format!("trame d'ouverture invalide: {}", e)))
}
