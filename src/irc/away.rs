//! Away-state reconciliation between downstream clients and the upstream
//! server.
//!
//! Each attached client keeps its own away flag, answered locally and
//! immediately; the single upstream identity is marked away only when every
//! attached client is away. The server's own 305/306 acknowledgments update
//! the cached upstream state and are swallowed — each client already received
//! a personalized acknowledgment when it toggled.
//!
//! ## Design decisions
//!
//! - **Counts are never cached**: [`AwaySummary`] is recomputed from the live
//!   client set before every decision. Attach, detach and toggles all
//!   invalidate it.
//!
//! - **Optimistic requests, authoritative acks**: emitting an upstream AWAY
//!   request does not touch the cached `irc_away` flag. Only the server's
//!   305/306 does. A pending-request marker keeps an unacknowledged request
//!   from being re-sent on every event in the in-flight window.
//!
//! - **Zero clients counts as all-away**: with nobody attached there is no
//!   one to be present for, so the upstream identity goes (or stays) away
//!   after the last client disconnects.
use std::fmt;

use tracing::{debug, info};

use super::message::{numeric, Message};
use super::network::{ClientId, Network};

/// Reason sent with the upstream AWAY request when every client is away.
const AWAY_REASON: &str = "Away";

/// Prefix on acknowledgments the bouncer synthesizes itself.
const SYNTHETIC_PREFIX: &str = "bnc.breakwater.in";

/// What the host dispatch layer should do with an intercepted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not ours; deliver it where it was headed.
    Forward,
    /// Fully handled here; do not forward in any direction.
    Halt,
}

/// Away/total counts over the currently attached clients.
///
/// A transient value, recomputed per event. Displays as `away/total`, the
/// ratio quoted in acknowledgment text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwaySummary {
    pub num_away: usize,
    pub num_clients: usize,
}

impl AwaySummary {
    /// Count away and total clients over the network's live client set.
    pub fn collect(net: &Network) -> Self {
        let num_clients = net.num_clients();
        let num_away = net.clients().filter(|c| c.is_away()).count();
        Self {
            num_away,
            num_clients,
        }
    }

    /// True when every attached client is away — vacuously true for zero
    /// clients, which is what keeps the upstream identity away after the
    /// last client disconnects.
    pub fn all_away(&self) -> bool {
        self.num_away == self.num_clients
    }
}

impl fmt::Display for AwaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num_away, self.num_clients)
    }
}

/// Re-run the aggregate decision and emit at most one upstream request.
///
/// Compares what the client set wants against what the server last
/// acknowledged. The cached flag is deliberately not updated here — the
/// server's 305/306 is the authority ([`on_upstream_numeric`]).
pub fn reconcile(net: &mut Network, summary: AwaySummary) {
    let all_away = summary.all_away();
    if !all_away && net.irc_away() {
        if net.pending_away() != Some(false) {
            info!(%summary, "marking upstream as present since at least one client is back");
            net.send_upstream(away_request(net, false));
            net.set_pending_away(Some(false));
        }
    } else if all_away && !net.irc_away() {
        if net.pending_away() != Some(true) {
            info!(%summary, "marking upstream as away since all attached clients are away");
            net.send_upstream(away_request(net, true));
            net.set_pending_away(Some(true));
        }
    } else {
        // Cached state already matches the client set; whatever was in
        // flight is no longer wanted.
        net.set_pending_away(None);
    }
}

/// A client finished logging in: it is presumed present.
pub fn on_client_attach(net: &mut Network, id: ClientId) {
    if let Some(client) = net.client_mut(id) {
        client.set_away(false);
    }
    let summary = AwaySummary::collect(net);
    reconcile(net, summary);
}

/// A client disconnected: an absent client cannot be present.
///
/// The flag is forced on the live reference before the client leaves the
/// set, so the connection layer may tear the object down right after.
pub fn on_client_detach(net: &mut Network, id: ClientId) {
    if let Some(client) = net.client_mut(id) {
        client.set_away(true);
    }
    net.detach(id);
    let summary = AwaySummary::collect(net);
    reconcile(net, summary);
}

/// Intercept a raw command from a downstream client before it is forwarded
/// upstream.
///
/// Anything but AWAY passes through untouched. An AWAY toggle is answered
/// here, acting as the real server would: the client's flag is updated, the
/// client gets its own 305/306 acknowledgment, and an actual upstream request
/// goes out only if the aggregate decision calls for one. The original
/// command never reaches the server.
pub fn on_client_message(net: &mut Network, id: ClientId, msg: &Message) -> Verdict {
    if !msg.command.eq_ignore_ascii_case("AWAY") {
        return Verdict::Forward;
    }

    // A reason parameter sets away; a bare AWAY clears it.
    let is_away = !msg.params.is_empty();

    let Some(client) = net.client_mut(id) else {
        // No originating client to answer; drop the command entirely.
        return Verdict::Halt;
    };
    client.set_away(is_away);
    let nick = client.nick().to_owned();

    let summary = AwaySummary::collect(net);
    net.send_to_client(id, away_ack(&nick, is_away, summary));
    debug!(client = %nick, away = is_away, %summary, "answered away toggle locally");

    reconcile(net, summary);
    Verdict::Halt
}

/// Intercept a numeric reply from the upstream server before it is forwarded
/// downstream.
///
/// 305/306 only update the cached upstream state and are swallowed; the
/// clients already received their own acknowledgments. No reconciliation
/// happens here — reacting to an acknowledgment with another request would
/// loop.
pub fn on_upstream_numeric(net: &mut Network, msg: &Message) -> Verdict {
    match msg.numeric_code() {
        Some(numeric::RPL_UNAWAY) => {
            net.set_irc_away(false);
            Verdict::Halt
        }
        Some(numeric::RPL_NOWAWAY) => {
            net.set_irc_away(true);
            Verdict::Halt
        }
        _ => Verdict::Forward,
    }
}

/// The upstream AWAY request: `AWAY :Away` to set, bare `AWAY` to clear,
/// from our own nick mask.
fn away_request(net: &Network, away: bool) -> Message {
    let params = if away {
        vec![AWAY_REASON.to_owned()]
    } else {
        Vec::new()
    };
    Message::with_prefix(net.nick_mask(), "AWAY", params)
}

/// The synthetic acknowledgment sent back to the toggling client only.
fn away_ack(nick: &str, away: bool, summary: AwaySummary) -> Message {
    let (code, text) = if away {
        (
            numeric::RPL_NOWAWAY,
            format!("Your client is marked as away ({summary} clients away)"),
        )
    } else {
        (
            numeric::RPL_UNAWAY,
            format!("Your client is no longer marked as away ({summary} clients away)"),
        )
    };
    Message::with_prefix(SYNTHETIC_PREFIX, code.to_string(), vec![nick.to_owned(), text])
}
