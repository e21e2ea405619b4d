//! Initiator and responder talking to each other over simulated streams.

use std::{
    collections::{HashMap, HashSet},
    io,
    sync::Arc,
    time::Duration,
};

use assert_matches::assert_matches;
use async_trait::async_trait;
use libp2p::{PeerId, StreamProtocol};
use parking_lot::Mutex;
use pinger_net_addr::PeerAddrInfo;
use pinger_net_ping::{
    ClientError, Initiator, PING_INTERVAL, PING_LENGTH, PingConfig, PingError, PingEvent,
    PingStream, Probe, RecordingObserver, Responder, StreamHandler, StreamHost, TracingObserver,
    memory::{self, MemoryStream},
    read_message, run_client, serve,
};

#[tokio::test(start_paused = true)]
async fn three_probes_over_simulated_pair() {
    let (mut client, server) = memory::pair(PeerId::random(), PeerId::random());
    let client_status = client.status();
    let server_status = server.status();

    let server_events = RecordingObserver::new();
    let responder = Responder::new(server_events.clone());
    let server_task = tokio::spawn(async move { responder.handle(server).await });

    let client_events = RecordingObserver::new();
    let mut initiator = Initiator::new(PingConfig::default(), client_events.clone());
    for _ in 0..3 {
        assert_matches!(initiator.probe(&mut client).await, Ok(Probe::Pong { .. }));
    }

    assert_eq!(client_events.pongs(), 3);
    assert_eq!(
        server_events.count(|e| matches!(e, PingEvent::PongSent { .. })),
        3
    );
    assert!(client_status.is_open());
    assert!(server_status.is_open());
    assert!(!server_task.is_finished());

    client.close().await.unwrap();
    server_task.await.unwrap().unwrap();
    assert!(server_status.is_closed());
}

#[tokio::test(start_paused = true)]
async fn loop_runs_until_cancelled() {
    let (client, server) = memory::pair(PeerId::random(), PeerId::random());
    let server_status = server.status();
    let server_task = tokio::spawn(async move { Responder::new(()).handle(server).await });

    let events = RecordingObserver::new();
    let (signal, shutdown) = pinger_tasks::channel();
    let client_task = tokio::spawn({
        let events = events.clone();
        async move {
            Initiator::new(PingConfig::default(), events)
                .run(client, &shutdown)
                .await
        }
    });

    while events.pongs() < 3 {
        tokio::time::sleep(PING_INTERVAL / 4).await;
    }
    signal.fire();

    client_task.await.unwrap().unwrap();
    assert!(events.pongs() >= 3);
    assert_eq!(events.mismatches(), 0);

    // The initiator closed its stream, which ends the responder cleanly.
    server_task.await.unwrap().unwrap();
    assert!(server_status.is_closed());
}

#[tokio::test(start_paused = true)]
async fn responder_reset_fails_initiator() {
    let (client, mut server) = memory::pair(PeerId::random(), PeerId::random());

    tokio::spawn(async move {
        let mut buf = [0u8; PING_LENGTH];
        read_message(&mut server, &mut buf).await.unwrap();
        server.reset().await;
    });

    let (_signal, shutdown) = pinger_tasks::channel();
    let err = Initiator::new(PingConfig::default(), ())
        .run(client, &shutdown)
        .await
        .unwrap_err();

    assert_matches!(err, PingError::Read(ref e) if e.kind() == io::ErrorKind::ConnectionReset);
}

#[tokio::test(start_paused = true)]
async fn unresponsive_peer_times_out() {
    let (client, _server) = memory::pair(PeerId::random(), PeerId::random());
    let config = PingConfig::default().with_timeout(Duration::from_secs(2));
    let (_signal, shutdown) = pinger_tasks::channel();

    let err = Initiator::new(config, ())
        .run(client, &shutdown)
        .await
        .unwrap_err();

    assert_matches!(err, PingError::Timeout(t) if t == Duration::from_secs(2));
}

// ---------------------------------------------------------------------------
// In-memory host
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
enum MemoryHostError {
    #[error("peer {0} is unreachable")]
    Unreachable(PeerId),
    #[error("not connected to {0}")]
    NotConnected(PeerId),
    #[error("peer does not support {0}")]
    Unsupported(StreamProtocol),
    #[error("handler for {0} already registered")]
    AlreadyRegistered(StreamProtocol),
}

type Handlers = HashMap<StreamProtocol, StreamHandler<MemoryStream>>;

#[derive(Clone, Default)]
struct Network {
    peers: Arc<Mutex<HashMap<PeerId, Handlers>>>,
}

struct MemoryHost {
    id: PeerId,
    network: Network,
    connected: Mutex<HashSet<PeerId>>,
    streams_opened: Mutex<usize>,
}

impl MemoryHost {
    fn new(network: &Network) -> Self {
        let id = PeerId::random();
        network.peers.lock().insert(id, HashMap::new());
        Self {
            id,
            network: network.clone(),
            connected: Mutex::default(),
            streams_opened: Mutex::new(0),
        }
    }

    fn addr_info(&self) -> PeerAddrInfo {
        PeerAddrInfo::new(self.id, vec!["/memory/1".parse().unwrap()])
    }
}

#[async_trait]
impl StreamHost for MemoryHost {
    type Stream = MemoryStream;
    type Error = MemoryHostError;

    async fn connect(&self, target: &PeerAddrInfo) -> Result<(), Self::Error> {
        let peer = *target.peer_id();
        if !self.network.peers.lock().contains_key(&peer) {
            return Err(MemoryHostError::Unreachable(peer));
        }
        self.connected.lock().insert(peer);
        Ok(())
    }

    async fn open_stream(
        &self,
        peer: PeerId,
        protocol: StreamProtocol,
    ) -> Result<Self::Stream, Self::Error> {
        if !self.connected.lock().contains(&peer) {
            return Err(MemoryHostError::NotConnected(peer));
        }
        let handler = self
            .network
            .peers
            .lock()
            .get(&peer)
            .and_then(|handlers| handlers.get(&protocol).cloned())
            .ok_or(MemoryHostError::Unsupported(protocol))?;

        let (local, remote) = memory::pair(self.id, peer);
        tokio::spawn(handler(remote));
        *self.streams_opened.lock() += 1;
        Ok(local)
    }

    fn register_handler(
        &self,
        protocol: StreamProtocol,
        handler: StreamHandler<Self::Stream>,
    ) -> Result<(), Self::Error> {
        let mut peers = self.network.peers.lock();
        let handlers = peers.entry(self.id).or_default();
        if handlers.contains_key(&protocol) {
            return Err(MemoryHostError::AlreadyRegistered(protocol));
        }
        handlers.insert(protocol, handler);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn client_pings_served_host() {
    let network = Network::default();
    let server = MemoryHost::new(&network);
    let client = MemoryHost::new(&network);

    let server_events = RecordingObserver::new();
    serve(&server, (server_events.clone(), TracingObserver)).unwrap();

    let client_events = RecordingObserver::new();
    let (signal, shutdown) = pinger_tasks::channel();
    let target = server.addr_info();
    let client_task = tokio::spawn({
        let client_events = client_events.clone();
        async move {
            run_client(
                &client,
                &target,
                PingConfig::default(),
                client_events,
                &shutdown,
            )
            .await
            .map(|()| *client.streams_opened.lock())
        }
    });

    while client_events.pongs() < 2 {
        tokio::time::sleep(PING_INTERVAL / 4).await;
    }
    signal.fire();

    let streams_opened = client_task.await.unwrap().unwrap();
    assert_eq!(streams_opened, 1);
    assert!(
        server_events.count(|e| matches!(e, PingEvent::PingReceived { .. })) >= 2
    );
}

#[tokio::test]
async fn serving_twice_is_rejected() {
    let network = Network::default();
    let server = MemoryHost::new(&network);

    serve(&server, ()).unwrap();
    assert_matches!(
        serve(&server, ()),
        Err(MemoryHostError::AlreadyRegistered(_))
    );
}

#[tokio::test]
async fn unreachable_peer_fails_before_any_stream() {
    let network = Network::default();
    let client = MemoryHost::new(&network);
    let target = PeerAddrInfo::new(PeerId::random(), vec!["/memory/2".parse().unwrap()]);
    let (_signal, shutdown) = pinger_tasks::channel();

    let err = run_client(&client, &target, PingConfig::default(), (), &shutdown)
        .await
        .unwrap_err();

    assert_matches!(err, ClientError::Connect(MemoryHostError::Unreachable(_)));
    assert_eq!(*client.streams_opened.lock(), 0);
}

#[tokio::test]
async fn peer_without_responder_cannot_be_pinged() {
    let network = Network::default();
    let server = MemoryHost::new(&network);
    let client = MemoryHost::new(&network);
    let (_signal, shutdown) = pinger_tasks::channel();

    let err = run_client(
        &client,
        &server.addr_info(),
        PingConfig::default(),
        (),
        &shutdown,
    )
    .await
    .unwrap_err();

    assert_matches!(err, ClientError::OpenStream(MemoryHostError::Unsupported(_)));
}

#[tokio::test]
async fn shutdown_before_connect_is_not_an_error() {
    let network = Network::default();
    let client = MemoryHost::new(&network);
    let target = PeerAddrInfo::new(PeerId::random(), vec!["/memory/3".parse().unwrap()]);
    let (signal, shutdown) = pinger_tasks::channel();
    signal.fire();

    run_client(&client, &target, PingConfig::default(), (), &shutdown)
        .await
        .unwrap();
    assert_eq!(*client.streams_opened.lock(), 0);
}
