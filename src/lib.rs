//! breakwater — the away-state core of a multi-client IRC bouncer.
//!
//! An IRC server holds exactly one away/not-away state per identity, but a
//! bouncer multiplexes several downstream clients (phone, laptop, web) onto
//! one upstream connection. This crate answers each client's AWAY command
//! locally and immediately, and marks the upstream identity away only when
//! every attached client is away.
//!
//! The host connection layer owns sockets, auth and framing; it feeds parsed
//! messages and attach/detach events into [`irc::away`] and honors the
//! [`irc::away::Verdict`] each hook returns.

pub mod irc;
