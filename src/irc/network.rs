//! Entities the reconciler operates on: downstream clients and the
//! per-user-per-network upstream session.
//!
//! The host connection layer owns the sockets; here a connection is just a
//! nickname, an away flag and an outbound sink. Sends never block and never
//! fail loudly — a closed sink means the connection is already going down and
//! the message has nowhere useful to go.
use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::message::Message;

/// Opaque handle for one attached downstream connection.
///
/// Allocated by [`Network::attach`]; never reused within one Network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

/// One downstream connection into the bouncer.
#[derive(Debug)]
pub struct Client {
    nick: String,
    is_away: bool,
    sink: UnboundedSender<Message>,
}

impl Client {
    fn new(nick: String, sink: UnboundedSender<Message>) -> Self {
        Self {
            nick,
            // A freshly attached client is presumed present.
            is_away: false,
            sink,
        }
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn is_away(&self) -> bool {
        self.is_away
    }

    pub fn set_away(&mut self, away: bool) {
        self.is_away = away;
    }

    /// Queue a message for delivery to this client.
    pub fn send(&self, msg: Message) {
        if self.sink.send(msg).is_err() {
            debug!(client = %self.nick, "downstream sink closed, dropping message");
        }
    }
}

/// The single upstream identity shared by every attached client of one
/// user+network pair. Outlives any individual client connection.
#[derive(Debug)]
pub struct Network {
    /// Our `nick!user@host` mask on the upstream server.
    nick_mask: String,
    /// What the server last acknowledged our away state to be.
    irc_away: bool,
    /// Upstream away state we have requested but not yet seen acknowledged.
    pending_away: Option<bool>,
    clients: HashMap<ClientId, Client>,
    next_client_id: u64,
    upstream: UnboundedSender<Message>,
}

impl Network {
    pub fn new(nick_mask: impl Into<String>, upstream: UnboundedSender<Message>) -> Self {
        Self {
            nick_mask: nick_mask.into(),
            irc_away: false,
            pending_away: None,
            clients: HashMap::new(),
            next_client_id: 0,
            upstream,
        }
    }

    pub fn nick_mask(&self) -> &str {
        &self.nick_mask
    }

    /// The nick may change over the session (upstream NICK); the mask the
    /// connection layer tracks moves with it.
    pub fn set_nick_mask(&mut self, nick_mask: impl Into<String>) {
        self.nick_mask = nick_mask.into();
    }

    pub fn irc_away(&self) -> bool {
        self.irc_away
    }

    /// Record the server-acknowledged away state and settle any request that
    /// was in flight.
    pub fn set_irc_away(&mut self, away: bool) {
        self.irc_away = away;
        self.pending_away = None;
    }

    pub fn pending_away(&self) -> Option<bool> {
        self.pending_away
    }

    pub fn set_pending_away(&mut self, pending: Option<bool>) {
        self.pending_away = pending;
    }

    /// Register a new downstream connection. The caller still owes a
    /// [`crate::irc::away::on_client_attach`] to bring aggregation up to date.
    pub fn attach(&mut self, nick: impl Into<String>, sink: UnboundedSender<Message>) -> ClientId {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;
        self.clients.insert(id, Client::new(nick.into(), sink));
        id
    }

    /// Remove a downstream connection from the live set.
    pub fn detach(&mut self, id: ClientId) -> Option<Client> {
        self.clients.remove(&id)
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn client_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    /// Queue a raw message for the upstream server.
    pub fn send_upstream(&self, msg: Message) {
        if self.upstream.send(msg).is_err() {
            debug!("upstream sink closed, dropping message");
        }
    }

    /// Queue a message for one specific downstream client. Unknown ids are
    /// ignored — the client raced its own disconnect.
    pub fn send_to_client(&self, id: ClientId, msg: Message) {
        if let Some(client) = self.clients.get(&id) {
            client.send(msg);
        }
    }
}
