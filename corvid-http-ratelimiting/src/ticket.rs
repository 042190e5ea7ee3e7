//! Flow for managing ratelimit tickets.
//!
//! Tickets are the [`Ratelimiter`]'s method of managing approval for a
//! consumer to send a request.
//!
//! # Consumer
//!
//! 1. Call [`Ratelimiter::ticket`] to request a ticket.
//! 2. Poll the returned [`TicketReceiver`] until the ratelimiter grants the
//!    ticket, producing a [`TicketSender`].
//! 3. Perform the HTTP request.
//! 4. Parse the response's ratelimit headers and send them via
//!    [`TicketSender::headers`], completing the cycle.
//!
//! # Ratelimiter
//!
//! 1. Create a channel with [`channel`] when a ticket is requested.
//! 2. Keep the [`TicketNotifier`] half; hand the [`TicketReceiver`] half to
//!    the consumer.
//! 3. Once free to let the request through, call
//!    [`TicketNotifier::available`]. This yields a [`TicketHeaders`] future
//!    to poll for the headers the consumer will later report.
//!
//! [`Ratelimiter::ticket`]: super::Ratelimiter::ticket
//! [`Ratelimiter`]: super::Ratelimiter

use crate::headers::RatelimitHeaders;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::oneshot::{self, error::RecvError, Receiver, Sender};

/// Receiver that resolves once the consumer has reported response headers.
///
/// An error means the consumer dropped its [`TicketSender`] without
/// reporting; treat this as if the request happened with no bucket info.
#[derive(Debug)]
pub struct TicketHeaders(Receiver<Option<RatelimitHeaders>>);

impl Future for TicketHeaders {
    type Output = Result<Option<RatelimitHeaders>, RecvError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

/// Held by the ratelimiter; signals the consumer that their ticket has been
/// granted.
#[derive(Debug)]
pub struct TicketNotifier(Sender<Sender<Option<RatelimitHeaders>>>);

impl TicketNotifier {
    /// Signal the consumer that a request may now be performed.
    ///
    /// Returns `None` if the consumer has already dropped its
    /// [`TicketReceiver`] half, meaning the ticket was canceled.
    #[must_use]
    pub fn available(self) -> Option<TicketHeaders> {
        let (tx, rx) = oneshot::channel();

        self.0.send(tx).ok()?;

        Some(TicketHeaders(rx))
    }
}

/// Awaited by the consumer to learn when their ratelimit ticket is granted.
#[derive(Debug)]
pub struct TicketReceiver(Receiver<Sender<Option<RatelimitHeaders>>>);

impl Future for TicketReceiver {
    type Output = Result<TicketSender, RecvError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx).map_ok(TicketSender)
    }
}

/// Sends response ratelimit headers back to the ratelimiter once a granted
/// request completes.
#[derive(Debug)]
pub struct TicketSender(Sender<Option<RatelimitHeaders>>);

impl TicketSender {
    /// Report the response's ratelimit headers, or `None` if the request
    /// failed before headers could be parsed.
    ///
    /// # Errors
    ///
    /// Returns the input headers back if the ratelimiter has already
    /// dropped its receiving half.
    pub fn headers(
        self,
        headers: Option<RatelimitHeaders>,
    ) -> Result<(), Option<RatelimitHeaders>> {
        self.0.send(headers)
    }
}

/// Create a fresh ticket channel: a [`TicketNotifier`] for the ratelimiter
/// to hold, and a [`TicketReceiver`] to hand the consumer.
#[must_use]
pub fn channel() -> (TicketNotifier, TicketReceiver) {
    let (tx, rx) = oneshot::channel();

    (TicketNotifier(tx), TicketReceiver(rx))
}
