//! Dispatch path
//!
//! Routes inbound messages to the bound [`DeviceModel`] and turns its verdict
//! into a [`Disposition`] for the transport.

use std::ffi::CStr;

use hublink_core::{ByteMessage, Disposition, MessageError};
use hublink_ports::{DeviceModel, Transport};
use log::{debug, error, info, warn};

use crate::client::DeviceClient;
use crate::error::{ClientError, Result};

/// Run one inbound message through `model`.
///
/// The model sees a NUL-terminated copy of the payload; the copy is released
/// before this returns, whatever the outcome. Messages whose bytes cannot be
/// read, or that cannot be copied, are abandoned so the transport may
/// redeliver them.
pub fn dispatch<M>(model: &mut M, message: &ByteMessage) -> Disposition
where
    M: DeviceModel + ?Sized,
{
    let payload = match message.byte_array() {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Unable to read inbound message bytes: {}", e);
            return Disposition::Abandoned;
        }
    };

    let scratch = match terminated_copy(payload) {
        Ok(scratch) => scratch,
        Err(e) => {
            error!("Failed to copy inbound message: {}", e);
            return Disposition::Abandoned;
        }
    };

    let Some(command) = as_command(&scratch) else {
        return Disposition::Abandoned;
    };

    let result = model.execute_command(command);
    let disposition = Disposition::from(result);
    debug!(
        "{} returned {:?} for {} byte message -> {}",
        model.name(),
        result,
        payload.len(),
        disposition.as_str()
    );
    disposition
}

/// View a terminated copy as the command handed to the model.
///
/// An embedded NUL ends the command early, as it would for any C string.
fn as_command(scratch: &[u8]) -> Option<&CStr> {
    match CStr::from_bytes_until_nul(scratch) {
        Ok(command) => Some(command),
        Err(_) => {
            warn!("Inbound message copy of {} bytes is not NUL-terminated", scratch.len());
            None
        }
    }
}

/// Copy `payload` into a fresh buffer with a trailing NUL
fn terminated_copy(payload: &[u8]) -> std::result::Result<Vec<u8>, MessageError> {
    let size = payload
        .len()
        .checked_add(1)
        .ok_or(MessageError::Allocation(usize::MAX))?;

    let mut scratch = Vec::new();
    scratch
        .try_reserve_exact(size)
        .map_err(|_| MessageError::Allocation(size))?;
    scratch.extend_from_slice(payload);
    scratch.push(0);
    Ok(scratch)
}

impl<T: Transport> DeviceClient<T> {
    /// Bind the model that receives every inbound message.
    ///
    /// The binding lasts for the lifetime of the client; there is no way to
    /// unbind or replace it.
    pub fn register_model<M>(&mut self, model: M) -> Result<()>
    where
        M: DeviceModel + 'static,
    {
        if self.model.is_some() {
            warn!("Device model already registered, keeping the existing one");
            return Err(ClientError::ModelAlreadyRegistered);
        }

        self.transport.enable_inbound().map_err(|e| {
            error!("Unable to enable inbound messages: {}", e);
            ClientError::Transport(e)
        })?;

        info!(
            "Registered model {} for device {}",
            model.name(),
            self.connection.device_id()
        );
        self.model = Some(Box::new(model));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hublink_core::ExecuteCommandResult;

    /// Records what it was given and answers with a fixed result
    struct Recorder {
        answer: ExecuteCommandResult,
        seen: Vec<Vec<u8>>,
    }

    impl Recorder {
        fn answering(answer: ExecuteCommandResult) -> Self {
            Self {
                answer,
                seen: Vec::new(),
            }
        }
    }

    impl DeviceModel for Recorder {
        fn execute_command(&mut self, command: &CStr) -> ExecuteCommandResult {
            self.seen.push(command.to_bytes_with_nul().to_vec());
            self.answer
        }
    }

    #[test]
    fn test_model_sees_terminated_copy() {
        let mut model = Recorder::answering(ExecuteCommandResult::Success);
        let message = ByteMessage::from_bytes(b"ledId=1").unwrap();

        let disposition = dispatch(&mut model, &message);

        assert_eq!(disposition, Disposition::Accepted);
        assert_eq!(model.seen, vec![b"ledId=1\0".to_vec()]);
        // The message itself is untouched
        assert_eq!(message.byte_array().unwrap(), b"ledId=1");
    }

    #[test]
    fn test_every_result_maps() {
        let cases = [
            (ExecuteCommandResult::Success, Disposition::Accepted),
            (ExecuteCommandResult::Rejected, Disposition::Rejected),
            (ExecuteCommandResult::Error, Disposition::Abandoned),
        ];
        for (answer, expected) in cases {
            let mut model = Recorder::answering(answer);
            let message = ByteMessage::from_bytes(b"cmd").unwrap();
            assert_eq!(dispatch(&mut model, &message), expected);
            assert_eq!(model.seen.len(), 1);
        }
    }

    #[test]
    fn test_text_message_is_abandoned_without_calling_model() {
        let mut model = Recorder::answering(ExecuteCommandResult::Success);
        let message = ByteMessage::from_text("ledId=1").unwrap();

        assert_eq!(dispatch(&mut model, &message), Disposition::Abandoned);
        assert!(model.seen.is_empty());
    }

    #[test]
    fn test_empty_payload() {
        let mut model = Recorder::answering(ExecuteCommandResult::Rejected);
        let message = ByteMessage::from_bytes(b"").unwrap();

        assert_eq!(dispatch(&mut model, &message), Disposition::Rejected);
        assert_eq!(model.seen, vec![b"\0".to_vec()]);
    }

    #[test]
    fn test_embedded_nul_truncates() {
        let mut model = Recorder::answering(ExecuteCommandResult::Success);
        let message = ByteMessage::from_bytes(b"on\0trailing").unwrap();

        dispatch(&mut model, &message);
        assert_eq!(model.seen, vec![b"on\0".to_vec()]);
    }

    #[test]
    fn test_unterminated_copy_is_not_a_command() {
        assert!(as_command(b"ledId=1").is_none());
        assert_eq!(as_command(b"on\0off\0").unwrap().to_bytes(), b"on");
    }

    #[test]
    fn test_terminated_copy() {
        assert_eq!(terminated_copy(b"abc").unwrap(), b"abc\0");
        assert_eq!(terminated_copy(b"").unwrap(), b"\0");
    }
}
