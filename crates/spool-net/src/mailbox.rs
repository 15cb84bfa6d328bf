//! UDP message mailbox
//!
//! A `MailBox` owns a non-blocking UDP socket registered with a
//! caller-owned reactor ([`mio::Poll`]). When the poll loop reports the
//! mailbox's token readable, [`MailBox::on_readable`] drains every
//! pending datagram and hands each one to the registered handler.

use mio::net::UdpSocket;
use mio::{Interest, Registry, Token};
use spool_core::log_warn;
use std::io;
use std::net::SocketAddr;

/// Largest datagram the mailbox will receive; longer ones are truncated
/// by the socket layer.
pub const MAX_MSG_SIZE: usize = 1024;

/// One received datagram.
#[derive(Debug, Clone)]
pub struct MsgBuf {
    /// Source address of the message.
    pub src: SocketAddr,
    /// Message content.
    pub data: Vec<u8>,
}

/// Control handle passed to the message handler.
///
/// Lets a handler ask for the mailbox to be deregistered from the reactor
/// once the current dispatch returns.
pub struct Dispatch {
    remove: bool,
}

impl Dispatch {
    /// Stop receiving: deregister the mailbox after this dispatch.
    pub fn stop(&mut self) {
        self.remove = true;
    }
}

type Handler = Box<dyn FnMut(&mut Dispatch, MsgBuf) + Send>;

/// UDP receive mailbox.
#[derive(Default)]
pub struct MailBox {
    socket: Option<UdpSocket>,
    token: Option<Token>,
    handler: Option<Handler>,
}

impl MailBox {
    /// Create an unbound mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the mailbox socket to `addr`. The socket is non-blocking.
    pub fn bind(&mut self, addr: SocketAddr) -> io::Result<()> {
        self.socket = Some(UdpSocket::bind(addr)?);
        Ok(())
    }

    /// Local address of the bound socket.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Register a handler invoked once per received datagram.
    pub fn set_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Dispatch, MsgBuf) + Send + 'static,
    {
        self.handler = Some(Box::new(handler));
    }

    /// Token the mailbox is registered under, if any.
    pub fn token(&self) -> Option<Token> {
        self.token
    }

    /// Register the mailbox with a reactor for readability events.
    pub fn register(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        let socket = self
            .socket
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        registry.register(socket, token, Interest::READABLE)?;
        self.token = Some(token);
        Ok(())
    }

    /// Remove the mailbox from the reactor. A no-op when not registered.
    pub fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        if self.token.take().is_some() {
            if let Some(socket) = self.socket.as_mut() {
                registry.deregister(socket)?;
            }
        }
        Ok(())
    }

    /// Drain pending datagrams and dispatch each to the handler. Called
    /// by the poll loop when this mailbox's token is readable. Transient
    /// receive errors are logged and end the drain without tearing the
    /// mailbox down.
    pub fn on_readable(&mut self, registry: &Registry) -> io::Result<()> {
        let MailBox {
            socket, handler, ..
        } = self;
        let Some(socket) = socket.as_ref() else {
            return Ok(());
        };

        let mut remove = false;
        let mut buf = [0u8; MAX_MSG_SIZE];
        loop {
            match socket.recv_from(&mut buf) {
                Ok((len, src)) => {
                    let msg = MsgBuf {
                        src,
                        data: buf[..len].to_vec(),
                    };
                    if let Some(handler) = handler.as_mut() {
                        let mut dispatch = Dispatch { remove: false };
                        handler(&mut dispatch, msg);
                        if dispatch.remove {
                            remove = true;
                            break;
                        }
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    log_warn!("recv from socket failed: {}", err);
                    break;
                }
            }
        }

        if remove {
            self.deregister(registry)?;
        }
        Ok(())
    }
}

/// UDP send side, lazily bound on first use.
#[derive(Default)]
pub struct MailSender {
    socket: Option<std::net::UdpSocket>,
}

impl MailSender {
    /// Create a sender with no socket yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Send one datagram to `addr`. The socket is bound to an ephemeral
    /// port on first use and reused afterwards.
    pub fn send(&mut self, addr: SocketAddr, data: &[u8]) -> io::Result<usize> {
        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => {
                let socket = std::net::UdpSocket::bind((std::net::Ipv4Addr::UNSPECIFIED, 0))?;
                socket.set_nonblocking(true)?;
                socket
            }
        };
        let result = socket.send_to(data, addr);
        self.socket = Some(socket);
        result
    }
}
