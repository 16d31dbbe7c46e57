use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use zwatch::hub::{self, HubState};
use zwatch::wire::{self, Hello};

const KEEPALIVE: Duration = Duration::from_millis(50);

async fn start_hub(reject_second_agent: bool) -> (SocketAddr, Arc<HubState>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = HubState::new(reject_second_agent);
    tokio::spawn(hub::run(listener, state.clone(), KEEPALIVE));
    (addr, state)
}

async fn connect_observer(addr: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    wire::write_hello(&mut stream, &Hello::observer()).await.unwrap();
    stream
}

async fn connect_agent(addr: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    wire::write_hello(&mut stream, &Hello::agent()).await.unwrap();
    stream
}

/// Lit la prochaine trame utile en sautant les maintiens de connexion
async fn read_alert_frame(stream: &mut TcpStream) -> Vec<u8> {
    loop {
        let frame = timeout(Duration::from_secs(5), wire::read_frame(stream))
            .await
            .expect("aucune trame reçue à temps")
            .expect("lecture de trame échouée");
        if !frame.is_empty() {
            return frame;
        }
    }
}

/// Attend qu'une condition sur l'état du hub devienne vraie
async fn wait_until<F: Fn() -> bool>(condition: F, what: &str) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(30)).await;
    }
    panic!("condition jamais atteinte: {}", what);
}

#[tokio::test]
async fn test_fanout_reaches_every_observer() {
    let (addr, state) = start_hub(false).await;

    let mut obs_a = connect_observer(addr).await;
    let mut obs_b = connect_observer(addr).await;
    {
        let state = state.clone();
        wait_until(move || state.observer_count() == 2, "2 observateurs").await;
    }

    let mut agent = connect_agent(addr).await;
    wire::write_frame(&mut agent, br#"{"alert_type":"Possible DDoS"}"#)
        .await
        .unwrap();

    // La trame arrive telle quelle chez chaque observateur
    assert_eq!(read_alert_frame(&mut obs_a).await, br#"{"alert_type":"Possible DDoS"}"#);
    assert_eq!(read_alert_frame(&mut obs_b).await, br#"{"alert_type":"Possible DDoS"}"#);
}

#[tokio::test]
async fn test_disconnected_observer_does_not_break_fanout() {
    let (addr, state) = start_hub(false).await;

    let mut obs_a = connect_observer(addr).await;
    let obs_b = connect_observer(addr).await;
    let mut obs_c = connect_observer(addr).await;
    {
        let state = state.clone();
        wait_until(move || state.observer_count() == 3, "3 observateurs").await;
    }

    // Déconnexion brutale d'un observateur
    drop(obs_b);
    {
        let state = state.clone();
        wait_until(
            move || state.observer_count() == 2,
            "retrait de l'observateur déconnecté",
        )
        .await;
    }

    let mut agent = connect_agent(addr).await;
    wire::write_frame(&mut agent, b"alerte-1").await.unwrap();

    assert_eq!(read_alert_frame(&mut obs_a).await, b"alerte-1");
    assert_eq!(read_alert_frame(&mut obs_c).await, b"alerte-1");

    // Les diffusions suivantes ne sont pas affectées non plus
    wire::write_frame(&mut agent, b"alerte-2").await.unwrap();
    assert_eq!(read_alert_frame(&mut obs_a).await, b"alerte-2");
    assert_eq!(read_alert_frame(&mut obs_c).await, b"alerte-2");
    assert_eq!(state.observer_count(), 2);
}

#[tokio::test]
async fn test_second_agent_replaces_the_first() {
    let (addr, state) = start_hub(false).await;

    let mut obs = connect_observer(addr).await;
    {
        let state = state.clone();
        wait_until(move || state.observer_count() == 1, "1 observateur").await;
    }

    let _agent_one = connect_agent(addr).await;
    {
        let state = state.clone();
        wait_until_async_agent(&state).await;
    }

    // Le second agent prend l'emplacement et ses trames passent
    let mut agent_two = connect_agent(addr).await;
    sleep(Duration::from_millis(100)).await;
    wire::write_frame(&mut agent_two, b"depuis-le-second").await.unwrap();
    assert_eq!(read_alert_frame(&mut obs).await, b"depuis-le-second");
    assert!(state.agent_connected().await);

    // Le départ du second libère l'emplacement
    drop(agent_two);
    for _ in 0..100 {
        if !state.agent_connected().await {
            return;
        }
        sleep(Duration::from_millis(30)).await;
    }
    panic!("l'emplacement d'agent n'a jamais été libéré");
}

async fn wait_until_async_agent(state: &Arc<HubState>) {
    for _ in 0..100 {
        if state.agent_connected().await {
            return;
        }
        sleep(Duration::from_millis(30)).await;
    }
    panic!("l'agent n'a jamais pris l'emplacement");
}

#[tokio::test]
async fn test_reject_mode_refuses_second_agent() {
    let (addr, state) = start_hub(true).await;

    let mut obs = connect_observer(addr).await;
    {
        let state = state.clone();
        wait_until(move || state.observer_count() == 1, "1 observateur").await;
    }

    let mut agent_one = connect_agent(addr).await;
    wait_until_async_agent(&state).await;

    // Le second agent est éconduit, ses trames ne sont jamais rediffusées
    let mut agent_two = connect_agent(addr).await;
    sleep(Duration::from_millis(100)).await;
    let _ = wire::write_frame(&mut agent_two, b"intrus").await;

    wire::write_frame(&mut agent_one, b"titulaire").await.unwrap();
    assert_eq!(read_alert_frame(&mut obs).await, b"titulaire");
    assert!(state.agent_connected().await);
}
