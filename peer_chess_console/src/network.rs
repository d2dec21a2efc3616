// WebSocket-over-TCP transport. Every channel gets a reader thread that turns socket input into
// `IncomingEvent`s and a writer thread fed by `WsChannel::send`.
//
// Improvement potential. Support NAT traversal. Currently the joiner must be able to reach the
// room owner's address directly.

use std::io;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;

use anyhow::Context;
use peer_chess::match_controller::IncomingEvent;
use peer_chess::network::{ChannelId, Connector, PeerChannel, TransportError};
use tungstenite::protocol::Role;
use tungstenite::{Message, WebSocket};


pub const DEFAULT_PORT: u16 = 38617;

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);


#[derive(Debug)]
pub struct WsChannel {
    id: ChannelId,
    // `None` once closed.
    outgoing: Option<mpsc::Sender<String>>,
    stream: TcpStream,
    closed_locally: Arc<AtomicBool>,
}

impl PeerChannel for WsChannel {
    fn id(&self) -> ChannelId { self.id }

    fn send(&mut self, data: String) -> Result<(), TransportError> {
        let outgoing = self.outgoing.as_ref().ok_or(TransportError::ChannelClosed)?;
        outgoing.send(data).map_err(|_| TransportError::ChannelClosed)
    }

    fn close(&mut self) {
        if self.outgoing.take().is_some() {
            self.closed_locally.store(true, Ordering::SeqCst);
            // Wakes up the reader thread, which then reports `Disconnected`.
            if let Err(err) = self.stream.shutdown(Shutdown::Both) {
                log::debug!("Shutting down channel {:?}: {err}", self.id);
            }
        }
    }
}


// TODO: Instead of cloning the socket, consider calling TcpStream.set_nonblocking on the
//   underlying stream and doing read/writes in the same thread.
fn clone_websocket(socket: &WebSocket<TcpStream>, role: Role) -> io::Result<WebSocket<TcpStream>> {
    let stream = socket.get_ref().try_clone()?;
    let config = *socket.get_config();
    Ok(WebSocket::from_raw_socket(stream, role, Some(config)))
}

// Hands the channel to the event loop via `announce` before starting the reader, so that the
// channel is always known by the time its first `Data` event arrives.
fn spawn_channel(
    mut socket_in: WebSocket<TcpStream>, role: Role, events: &mpsc::Sender<IncomingEvent>,
    announce: fn(Box<dyn PeerChannel>) -> IncomingEvent,
) -> io::Result<()> {
    let id = ChannelId(NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed));
    let stream = socket_in.get_ref().try_clone()?;
    let mut socket_out = clone_websocket(&socket_in, role)?;
    let (outgoing_tx, outgoing_rx) = mpsc::channel::<String>();
    let closed_locally = Arc::new(AtomicBool::new(false));
    let reader_closed_locally = Arc::clone(&closed_locally);

    thread::spawn(move || {
        for data in outgoing_rx {
            if let Err(err) = socket_out.send(Message::text(data)) {
                log::warn!("Channel {id:?}: write failed: {err}");
                break;
            }
        }
    });

    let channel = WsChannel {
        id,
        outgoing: Some(outgoing_tx),
        stream,
        closed_locally,
    };
    if events.send(announce(Box::new(channel))).is_err() {
        return Ok(());
    }

    let events = events.clone();
    thread::spawn(move || {
        loop {
            let event = match socket_in.read() {
                Ok(Message::Text(text)) => IncomingEvent::Data(id, text.as_str().to_owned()),
                Ok(Message::Close(_)) => break,
                Ok(other) => {
                    log::debug!("Channel {id:?}: ignoring non-text frame {other:?}");
                    continue;
                }
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    break;
                }
                Err(_) if reader_closed_locally.load(Ordering::SeqCst) => break,
                Err(err) => IncomingEvent::PeerError { reason: err.to_string() },
            };
            let is_error = matches!(event, IncomingEvent::PeerError { .. });
            if events.send(event).is_err() || is_error {
                break;
            }
        }
        // The receiver is gone only when the app is shutting down.
        let _ = events.send(IncomingEvent::Disconnected(id));
    });
    Ok(())
}


// Starts accepting peers in the background. Reports the bound address via `HostOpen`.
pub fn listen(address: &str, events: mpsc::Sender<IncomingEvent>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address).with_context(|| format!("Listening on {address}"))?;
    let local_address = listener.local_addr()?.to_string();
    events
        .send(IncomingEvent::HostOpen { local_address })
        .map_err(|_| anyhow::anyhow!("Event loop is gone"))?;
    thread::spawn(move || {
        for stream in listener.incoming() {
            let result = stream
                .map_err(|err| err.to_string())
                .and_then(|stream| tungstenite::accept(stream).map_err(|err| err.to_string()))
                .and_then(|socket| {
                    spawn_channel(socket, Role::Server, &events, IncomingEvent::IncomingConnection)
                        .map_err(|err| err.to_string())
                });
            if let Err(err) = result {
                log::warn!("Failed to accept a peer: {err}");
            }
        }
    });
    Ok(())
}


pub struct WsConnector {
    events: mpsc::Sender<IncomingEvent>,
}

impl WsConnector {
    pub fn new(events: mpsc::Sender<IncomingEvent>) -> Self { WsConnector { events } }
}

impl Connector for WsConnector {
    fn connect(&mut self, remote_address: &str) {
        let remote_address = remote_address.to_owned();
        let events = self.events.clone();
        thread::spawn(move || {
            if let Err(reason) = open_channel(&remote_address, &events) {
                let _ = events.send(IncomingEvent::ConnectionFailed { reason });
            }
        });
    }
}

fn open_channel(remote_address: &str, events: &mpsc::Sender<IncomingEvent>) -> Result<(), String> {
    let stream = TcpStream::connect(remote_address).map_err(|err| err.to_string())?;
    // Improvement potential: Test if nodelay helps. Should it be set on both sides or just one?
    //   net_stream.set_nodelay(true)?;
    let request = format!("ws://{remote_address}");
    let (socket, _) =
        tungstenite::client(request.as_str(), stream).map_err(|err| err.to_string())?;
    spawn_channel(socket, Role::Client, events, IncomingEvent::ConnectionOpened)
        .map_err(|err| err.to_string())
}
