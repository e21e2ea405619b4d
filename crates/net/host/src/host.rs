use std::collections::HashMap;

use async_trait::async_trait;
use futures::StreamExt;
use libp2p::{
    Multiaddr, PeerId, StreamProtocol, Swarm, SwarmBuilder, noise,
    swarm::{SwarmEvent, dial_opts::DialOpts},
    tcp, yamux,
};
use libp2p_stream::{self as stream, Control};
use pinger_net_addr::PeerAddrInfo;
use pinger_net_ping::{DeadlineStream, StreamHandler, StreamHost};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::{HostConfig, HostError, keypair_from_seed};

/// Stream type handed to the ping protocol.
pub type HostStream = DeadlineStream<libp2p::Stream>;

type DialReply = oneshot::Sender<Result<(), HostError>>;

/// Commands processed by the swarm task.
#[derive(Debug)]
enum Command {
    /// Connect to a peer at the given addresses.
    Dial { target: PeerAddrInfo, reply: DialReply },
}

/// Handle to a libp2p swarm running on a background task.
///
/// Cloning is cheap. The swarm task stops once every handle is dropped.
#[derive(Clone)]
pub struct Libp2pHost {
    local_peer_id: PeerId,
    control: Control,
    commands: mpsc::Sender<Command>,
    listen_addrs: watch::Receiver<Vec<Multiaddr>>,
}

impl std::fmt::Debug for Libp2pHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Libp2pHost")
            .field("local_peer_id", &self.local_peer_id)
            .finish_non_exhaustive()
    }
}

impl Libp2pHost {
    /// Build the swarm, start listening and drive it on a new task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: &HostConfig) -> Result<Self, HostError> {
        let keypair = keypair_from_seed(config.seed)?;
        let idle_timeout = config.idle_timeout();

        let mut swarm = SwarmBuilder::with_existing_identity(keypair)
            .with_tokio()
            .with_tcp(
                tcp::Config::default(),
                noise::Config::new,
                yamux::Config::default,
            )
            .map_err(HostError::transport)?
            .with_quic()
            .with_dns()
            .map_err(HostError::transport)?
            .with_behaviour(|_| stream::Behaviour::new())
            .map_err(HostError::transport)?
            .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(idle_timeout))
            .build();

        let addr = config.listen_multiaddr();
        swarm
            .listen_on(addr.clone())
            .map_err(|source| HostError::Listen { addr, source })?;

        let local_peer_id = *swarm.local_peer_id();
        info!(%local_peer_id, transport = ?config.transport, "Host peer ID");

        let control = swarm.behaviour().new_control();
        let (commands, command_rx) = mpsc::channel(32);
        let (listen_tx, listen_addrs) = watch::channel(Vec::new());

        let event_loop = EventLoop {
            swarm,
            commands: command_rx,
            listen_addrs: listen_tx,
            pending_dials: HashMap::new(),
        };
        tokio::spawn(event_loop.run());

        Ok(Self {
            local_peer_id,
            control,
            commands,
            listen_addrs,
        })
    }

    pub fn local_peer_id(&self) -> PeerId {
        self.local_peer_id
    }

    /// Addresses the host listens on, waiting for the first one to be bound.
    pub async fn listen_addrs(&self) -> Result<Vec<Multiaddr>, HostError> {
        let mut rx = self.listen_addrs.clone();
        let addrs = rx
            .wait_for(|addrs| !addrs.is_empty())
            .await
            .map_err(|_| HostError::Shutdown)?;
        Ok(addrs.clone())
    }

    /// This host as a dialable peer address.
    pub async fn addr_info(&self) -> Result<PeerAddrInfo, HostError> {
        Ok(PeerAddrInfo::new(self.local_peer_id, self.listen_addrs().await?))
    }
}

#[async_trait]
impl StreamHost for Libp2pHost {
    type Stream = HostStream;
    type Error = HostError;

    async fn connect(&self, target: &PeerAddrInfo) -> Result<(), HostError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Dial {
                target: target.clone(),
                reply,
            })
            .await
            .map_err(|_| HostError::Shutdown)?;
        rx.await.map_err(|_| HostError::Shutdown)?
    }

    async fn open_stream(
        &self,
        peer_id: PeerId,
        protocol: StreamProtocol,
    ) -> Result<HostStream, HostError> {
        let stream = self
            .control
            .clone()
            .open_stream(peer_id, protocol)
            .await
            .map_err(|source| HostError::OpenStream { peer_id, source })?;
        Ok(DeadlineStream::new(peer_id, stream))
    }

    fn register_handler(
        &self,
        protocol: StreamProtocol,
        handler: StreamHandler<HostStream>,
    ) -> Result<(), HostError> {
        let mut incoming = self
            .control
            .clone()
            .accept(protocol.clone())
            .map_err(|_| HostError::AlreadyRegistered(protocol.clone()))?;

        tokio::spawn(async move {
            while let Some((peer_id, stream)) = incoming.next().await {
                debug!(%peer_id, %protocol, "Inbound stream");
                tokio::spawn(handler(DeadlineStream::new(peer_id, stream)));
            }
        });
        Ok(())
    }
}

/// Owns the swarm and serves [`Command`]s.
struct EventLoop {
    swarm: Swarm<stream::Behaviour>,
    commands: mpsc::Receiver<Command>,
    listen_addrs: watch::Sender<Vec<Multiaddr>>,
    pending_dials: HashMap<PeerId, Vec<DialReply>>,
}

impl EventLoop {
    async fn run(mut self) {
        debug!("Starting host event loop");
        loop {
            tokio::select! {
                event = self.swarm.select_next_some() => self.handle_swarm_event(event),
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
        }
        debug!("Host event loop stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Dial { target, reply } => self.dial(target, reply),
        }
    }

    fn dial(&mut self, target: PeerAddrInfo, reply: DialReply) {
        let (peer_id, addrs) = target.into_parts();

        if self.swarm.is_connected(&peer_id) {
            let _ = reply.send(Ok(()));
            return;
        }

        if let Some(waiting) = self.pending_dials.get_mut(&peer_id) {
            waiting.push(reply);
            return;
        }

        debug!(%peer_id, ?addrs, "Dialing");
        let opts = DialOpts::peer_id(peer_id).addresses(addrs).build();
        match self.swarm.dial(opts) {
            Ok(()) => {
                self.pending_dials.insert(peer_id, vec![reply]);
            }
            Err(e) => {
                let _ = reply.send(Err(HostError::Dial {
                    peer_id,
                    reason: e.to_string(),
                }));
            }
        }
    }

    fn resolve_dial(&mut self, peer_id: &PeerId, result: impl Fn() -> Result<(), HostError>) {
        for reply in self.pending_dials.remove(peer_id).into_iter().flatten() {
            let _ = reply.send(result());
        }
    }

    fn handle_swarm_event(&mut self, event: SwarmEvent<()>) {
        match event {
            SwarmEvent::NewListenAddr { address, .. } => {
                info!(%address, "New listen address");
                self.listen_addrs.send_modify(|addrs| addrs.push(address));
            }
            SwarmEvent::ExpiredListenAddr { address, .. } => {
                info!(%address, "Expired listen address");
                self.listen_addrs
                    .send_modify(|addrs| addrs.retain(|a| *a != address));
            }
            SwarmEvent::ConnectionEstablished {
                peer_id,
                endpoint,
                num_established,
                ..
            } => {
                debug!(
                    %peer_id,
                    endpoint = %endpoint.get_remote_address(),
                    num_established,
                    "Connection established"
                );
                self.resolve_dial(&peer_id, || Ok(()));
            }
            SwarmEvent::ConnectionClosed {
                peer_id,
                cause,
                num_established,
                ..
            } => {
                info!(%peer_id, num_established, cause = ?cause, "Connection closed");
            }
            SwarmEvent::IncomingConnection {
                local_addr,
                send_back_addr,
                ..
            } => {
                debug!(%local_addr, %send_back_addr, "Incoming connection");
            }
            SwarmEvent::OutgoingConnectionError {
                peer_id: Some(peer_id),
                error,
                ..
            } => {
                warn!(%peer_id, %error, "Outgoing connection failed");
                let reason = error.to_string();
                self.resolve_dial(&peer_id, || {
                    Err(HostError::Dial {
                        peer_id,
                        reason: reason.clone(),
                    })
                });
            }
            SwarmEvent::ListenerError { error, .. } => {
                warn!(%error, "Listener error");
            }
            other => {
                debug!(event = ?other, "Swarm event");
            }
        }
    }
}
