//! Work pump
//!
//! The only place where the client makes progress: each call gives the
//! transport one slice of work, then processes every event it reported.

use hublink_core::{Confirmation, Disposition};
use hublink_ports::{Transport, TransportEvent};
use log::{trace, warn};

use crate::client::DeviceClient;
use crate::dispatch::dispatch;

/// What one [`pump`](DeviceClient::pump) call processed, in event order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkSummary {
    /// Sends resolved during this call
    pub confirmations: Vec<Confirmation>,
    /// Inbound messages settled during this call
    pub dispositions: Vec<Disposition>,
}

impl WorkSummary {
    /// True if nothing happened
    pub fn is_idle(&self) -> bool {
        self.confirmations.is_empty() && self.dispositions.is_empty()
    }
}

impl<T: Transport> DeviceClient<T> {
    /// Give the transport a chance to do network I/O, then fire due
    /// confirmation callbacks and dispatch inbound messages.
    ///
    /// Must be called repeatedly; it returns as soon as the queued events
    /// are processed.
    pub fn pump(&mut self) -> WorkSummary {
        self.transport.do_work();
        let summary = self.drain_events(true);
        if !summary.is_idle() {
            trace!(
                "Pump processed {} confirmations and {} inbound messages",
                summary.confirmations.len(),
                summary.dispositions.len()
            );
        }
        summary
    }

    /// Process every event queued by the transport so far.
    ///
    /// With `dispatch_inbound` false, inbound messages are abandoned without
    /// reaching the model (used while shutting down).
    pub(crate) fn drain_events(&mut self, dispatch_inbound: bool) -> WorkSummary {
        let mut summary = WorkSummary::default();

        while let Some(event) = self.events.try_next() {
            match event {
                TransportEvent::Confirmation(confirmation) => {
                    self.sends.resolve(confirmation);
                    summary.confirmations.push(confirmation);
                }
                TransportEvent::Message(delivery) => {
                    let disposition = match self.model.as_mut() {
                        Some(model) if dispatch_inbound => {
                            dispatch(&mut **model, delivery.message())
                        }
                        Some(_) => Disposition::Abandoned,
                        None => {
                            warn!("Inbound message with no device model registered");
                            Disposition::Abandoned
                        }
                    };
                    if !delivery.settle(disposition) {
                        warn!(
                            "Transport stopped waiting for a {} disposition",
                            disposition.as_str()
                        );
                    }
                    summary.dispositions.push(disposition);
                }
            }
        }

        summary
    }
}
