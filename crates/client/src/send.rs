//! Send path
//!
//! Turns application buffers into [`ByteMessage`]s, submits them with a
//! fresh [`TrackingToken`] and remembers who wants to hear about the outcome.
//! Every send attempt consumes a token, including one whose buffer cannot
//! be wrapped.

use std::collections::HashMap;

use hublink_core::{ByteMessage, Confirmation, TrackingToken};
use hublink_ports::Transport;
use log::{error, info, warn};

use crate::client::DeviceClient;
use crate::error::{ClientError, Result};

/// Callback fired once with the outcome of a send
pub type ConfirmationCallback = Box<dyn FnOnce(Confirmation)>;

/// Token counter plus the callbacks of sends awaiting confirmation
pub(crate) struct PendingSends {
    next_token: TrackingToken,
    /// `None` means the send uses the default (logging) confirmation
    pending: HashMap<TrackingToken, Option<ConfirmationCallback>>,
}

impl PendingSends {
    pub(crate) fn new() -> Self {
        Self {
            next_token: TrackingToken::new(0),
            pending: HashMap::new(),
        }
    }

    /// Hand out the next token
    pub(crate) fn issue(&mut self) -> TrackingToken {
        let token = self.next_token;
        self.next_token = token.next();
        token
    }

    pub(crate) fn track(&mut self, token: TrackingToken, callback: Option<ConfirmationCallback>) {
        if self.pending.insert(token, callback).is_some() {
            // Only reachable after 2^64 sends with one still outstanding
            warn!("Tracking token {} reused while still pending", token);
        }
    }

    /// Fire the callback registered for this confirmation.
    ///
    /// Returns false if the token was not pending.
    pub(crate) fn resolve(&mut self, confirmation: Confirmation) -> bool {
        match self.pending.remove(&confirmation.token) {
            Some(Some(callback)) => {
                callback(confirmation);
                true
            }
            Some(None) => {
                log_confirmation(confirmation);
                true
            }
            None => {
                warn!(
                    "Confirmation for unknown message {}: {}",
                    confirmation.token,
                    confirmation.result.as_str()
                );
                false
            }
        }
    }

    /// Tokens still awaiting confirmation, oldest first
    pub(crate) fn pending_tokens(&self) -> Vec<TrackingToken> {
        let mut tokens: Vec<_> = self.pending.keys().copied().collect();
        tokens.sort();
        tokens
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn log_confirmation(confirmation: Confirmation) {
    if confirmation.result.is_success() {
        info!(
            "Message {} confirmed: {}",
            confirmation.token,
            confirmation.result.as_str()
        );
    } else {
        warn!(
            "Message {} not delivered: {}",
            confirmation.token,
            confirmation.result.as_str()
        );
    }
}

impl<T: Transport> DeviceClient<T> {
    /// Send a copy of `buffer`; `on_confirm` fires once with the outcome.
    ///
    /// The caller keeps ownership of `buffer`. Returns the token the
    /// confirmation will carry.
    pub fn send_event<F>(&mut self, buffer: &[u8], on_confirm: F) -> Result<TrackingToken>
    where
        F: FnOnce(Confirmation) + 'static,
    {
        let token = self.sends.issue();
        let message = ByteMessage::from_bytes(buffer).map_err(|e| {
            error!("Unable to create a new message: {}", e);
            ClientError::Message(e)
        })?;
        self.submit(token, message, Some(Box::new(on_confirm)))
    }

    /// Fire-and-forget send that takes ownership of `buffer`.
    ///
    /// The buffer is released exactly once whatever happens: on a failed
    /// wrap or a rejected submission it is dropped here, otherwise it goes
    /// with the message to the transport. The outcome is logged.
    pub fn send_event_owned(&mut self, buffer: Vec<u8>) -> Result<TrackingToken> {
        let token = self.sends.issue();
        let message = match ByteMessage::from_vec(buffer) {
            Ok(message) => message,
            Err(wrap) => {
                error!("Unable to create a new message: {}", wrap.error);
                let error = wrap.error.clone();
                drop(wrap.into_buffer());
                return Err(ClientError::Message(error));
            }
        };
        self.submit(token, message, None)
    }

    /// Send a prepared message (e.g. one carrying properties)
    pub fn send_message<F>(&mut self, message: ByteMessage, on_confirm: F) -> Result<TrackingToken>
    where
        F: FnOnce(Confirmation) + 'static,
    {
        let token = self.sends.issue();
        self.submit(token, message, Some(Box::new(on_confirm)))
    }

    fn submit(
        &mut self,
        token: TrackingToken,
        message: ByteMessage,
        callback: Option<ConfirmationCallback>,
    ) -> Result<TrackingToken> {
        let size = message.len();

        match self.transport.submit(message, token) {
            Ok(()) => {
                info!(
                    "Transport accepted message {} ({} bytes) for delivery",
                    token, size
                );
                self.sends.track(token, callback);
                Ok(token)
            }
            Err(rejected) => {
                warn!(
                    "Failed to hand over message {} to the transport: {}",
                    token, rejected
                );
                let reason = rejected.reason;
                drop(rejected.into_message());
                Err(ClientError::Submit { token, reason })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hublink_core::ConfirmationResult;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_tokens_increase() {
        let mut sends = PendingSends::new();
        assert_eq!(sends.issue(), TrackingToken::new(0));
        assert_eq!(sends.issue(), TrackingToken::new(1));
        assert_eq!(sends.issue(), TrackingToken::new(2));
    }

    #[test]
    fn test_callback_fires_once() {
        let mut sends = PendingSends::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let token = sends.issue();
        let sink = seen.clone();
        sends.track(token, Some(Box::new(move |c| sink.borrow_mut().push(c))));

        let confirmation = Confirmation::new(token, ConfirmationResult::Ok);
        assert!(sends.resolve(confirmation));
        assert!(!sends.resolve(confirmation));

        assert_eq!(*seen.borrow(), vec![confirmation]);
        assert_eq!(sends.len(), 0);
    }

    #[test]
    fn test_default_confirmation_is_tracked() {
        let mut sends = PendingSends::new();
        let token = sends.issue();
        sends.track(token, None);

        assert_eq!(sends.pending_tokens(), vec![token]);
        assert!(sends.resolve(Confirmation::new(token, ConfirmationResult::Error)));
        assert!(sends.pending_tokens().is_empty());
    }
}
