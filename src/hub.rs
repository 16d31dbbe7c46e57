use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::RwLock;

use crate::error::ZwatchError;
use crate::wire::{self, PeerRole};

/// Profondeur de file par observateur avant d'écarter des trames
const OBSERVER_QUEUE_LEN: usize = 64;

/// État partagé du hub de diffusion
///
/// L'emplacement d'agent est unique et distinct de l'ensemble des
/// observateurs. Les deux ne changent que sur connexion acceptée ou
/// déconnexion constatée.
pub struct HubState {
    observers: DashMap<u64, mpsc::Sender<Arc<Vec<u8>>>>,
    agent_slot: RwLock<Option<u64>>,
    next_id: AtomicU64,
    reject_second_agent: bool,
}

impl HubState {
    pub fn new(reject_second_agent: bool) -> Arc<Self> {
        Arc::new(Self {
            observers: DashMap::new(),
            agent_slot: RwLock::new(None),
            next_id: AtomicU64::new(1),
            reject_second_agent,
        })
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub async fn agent_connected(&self) -> bool {
        self.agent_slot.read().await.is_some()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Prend l'emplacement d'agent
    ///
    /// Par défaut un nouvel agent remplace l'ancien, dernier arrivé gagnant;
    /// l'ancienne connexion constatera elle-même sa fin. En mode strict, un
    /// second agent est refusé tant que l'emplacement est occupé.
    async fn claim_agent(&self, id: u64) -> bool {
        let mut slot = self.agent_slot.write().await;
        match *slot {
            Some(previous) if self.reject_second_agent => {
                warn!(
                    "Agent {} refusé, l'emplacement est tenu par l'agent {}",
                    id, previous
                );
                false
            }
            Some(previous) => {
                warn!("L'agent {} remplace l'agent {}", id, previous);
                *slot = Some(id);
                true
            }
            None => {
                *slot = Some(id);
                true
            }
        }
    }

    /// Libère l'emplacement d'agent, sans toucher à un remplaçant déjà en place
    async fn release_agent(&self, id: u64) {
        let mut slot = self.agent_slot.write().await;
        if *slot == Some(id) {
            *slot = None;
        }
    }

    fn register_observer(&self, id: u64, tx: mpsc::Sender<Arc<Vec<u8>>>) {
        self.observers.insert(id, tx);
    }

    /// Retire un observateur; transition terminale et idempotente
    fn remove_observer(&self, id: u64) {
        self.observers.remove(&id);
    }

    /// Diffuse une charge utile telle quelle à tous les observateurs vivants
    ///
    /// Itère sur un instantané de l'ensemble pour tolérer les retraits
    /// concurrents. L'échec d'un destinataire le retire sans interrompre la
    /// diffusion aux autres ni la connexion d'agent.
    pub fn broadcast(&self, payload: Arc<Vec<u8>>) {
        let targets: Vec<(u64, mpsc::Sender<Arc<Vec<u8>>>)> = self
            .observers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        for (id, tx) in targets {
            match tx.try_send(payload.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    // Observateur à la traîne: la trame est écartée pour lui seul
                    warn!("Observateur {} en retard, trame écartée", id);
                }
                Err(TrySendError::Closed(_)) => {
                    self.remove_observer(id);
                }
            }
        }
    }
}

/// Boucle d'acceptation du hub
///
/// Chaque connexion vit dans sa propre tâche. Les erreurs d'un
/// gestionnaire sont journalisées et valent déconnexion de ce seul pair,
/// jamais un arrêt du hub.
pub async fn run(listener: TcpListener, state: Arc<HubState>, keepalive: Duration) {
    if let Ok(addr) = listener.local_addr() {
        info!("Hub en écoute sur {}", addr);
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state, keepalive).await {
                        warn!("Connexion {} terminée: {}", addr, e);
                    }
                });
            }
            Err(e) => {
                error!("Échec d'acceptation d'une connexion: {}", e);
            }
        }
    }
}

/// Route une connexion entrante d'après sa trame d'ouverture
async fn handle_connection(
    mut stream: TcpStream,
    state: Arc<HubState>,
    keepalive: Duration,
) -> Result<(), ZwatchError> {
    let hello = wire::read_hello(&mut stream).await?;
    let id = state.next_id();

    match hello.role {
        PeerRole::Agent => handle_agent(stream, state, id).await,
        PeerRole::Observer => handle_observer(stream, state, id, keepalive).await,
    }

    Ok(())
}

/// Reçoit les trames de l'agent et les rediffuse
async fn handle_agent(mut stream: TcpStream, state: Arc<HubState>, id: u64) {
    if !state.claim_agent(id).await {
        return;
    }
    info!("Agent {} connecté", id);

    if let Err(e) = forward_agent_frames(&mut stream, &state).await {
        info!("Agent {} déconnecté: {}", id, e);
    }

    state.release_agent(id).await;
}

async fn forward_agent_frames(
    stream: &mut TcpStream,
    state: &HubState,
) -> Result<(), ZwatchError> {
    loop {
        let payload = wire::read_frame(stream).await?;
        if payload.is_empty() {
            continue;
        }
        // Rediffusion telle quelle, ni revalidation ni resérialisation
        debug!("Trame d'agent rediffusée ({} octets)", payload.len());
        state.broadcast(Arc::new(payload));
    }
}

/// Sert un observateur jusqu'à sa déconnexion
///
/// L'observateur n'envoie rien après son ouverture; sa vivacité se
/// constate sur l'échec d'une écriture, trame utile ou maintien périodique.
async fn handle_observer(
    mut stream: TcpStream,
    state: Arc<HubState>,
    id: u64,
    keepalive: Duration,
) {
    let (tx, mut rx) = mpsc::channel::<Arc<Vec<u8>>>(OBSERVER_QUEUE_LEN);
    state.register_observer(id, tx);
    info!(
        "Observateur {} connecté ({} au total)",
        id,
        state.observer_count()
    );

    let mut keepalive_timer = tokio::time::interval(keepalive);

    let result: Result<(), ZwatchError> = async {
        loop {
            tokio::select! {
                frame = rx.recv() => match frame {
                    Some(payload) => wire::write_frame(&mut stream, &payload).await?,
                    // Retiré de l'ensemble pendant une diffusion
                    None => return Ok(()),
                },
                _ = keepalive_timer.tick() => {
                    wire::write_keepalive(&mut stream).await?;
                }
            }
        }
    }
    .await;

    if let Err(e) = result {
        debug!("Écriture vers l'observateur {} échouée: {}", id, e);
    }

    state.remove_observer(id);
    info!(
        "Observateur {} retiré ({} restants)",
        id,
        state.observer_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_agent_slot_last_writer_wins() {
        let state = HubState::new(false);

        assert!(state.claim_agent(1).await);
        assert!(state.claim_agent(2).await);
        assert!(state.agent_connected().await);

        // L'ancien agent ne libère pas l'emplacement de son remplaçant
        state.release_agent(1).await;
        assert!(state.agent_connected().await);

        state.release_agent(2).await;
        assert!(!state.agent_connected().await);
    }

    #[tokio::test]
    async fn test_agent_slot_reject_mode() {
        let state = HubState::new(true);

        assert!(state.claim_agent(1).await);
        assert!(!state.claim_agent(2).await);

        state.release_agent(1).await;
        assert!(state.claim_agent(2).await);
    }

    #[tokio::test]
    async fn test_broadcast_drops_closed_observer() {
        let state = HubState::new(false);
        let (tx_alive, mut rx_alive) = mpsc::channel(4);
        let (tx_dead, rx_dead) = mpsc::channel(4);

        state.register_observer(1, tx_alive);
        state.register_observer(2, tx_dead);
        drop(rx_dead);

        state.broadcast(Arc::new(b"frame".to_vec()));

        assert_eq!(&*rx_alive.recv().await.unwrap(), &b"frame".to_vec());
        assert_eq!(state.observer_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_observer_is_idempotent() {
        let state = HubState::new(false);
        let (tx, _rx) = mpsc::channel(4);
        state.register_observer(7, tx);

        state.remove_observer(7);
        state.remove_observer(7);
        assert_eq!(state.observer_count(), 0);
    }
}
