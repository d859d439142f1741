//! Hublink Core
//!
//! Pure value types shared by the device client, the transports and the
//! device models. This crate contains no I/O and is fully unit testable.

pub mod confirmation;
pub mod connection_string;
pub mod disposition;
pub mod error;
pub mod message;
pub mod options;
pub mod token;
pub mod values;

// Re-export commonly used types at crate root
pub use confirmation::{Confirmation, ConfirmationResult};
pub use connection_string::ConnectionString;
pub use disposition::{Disposition, ExecuteCommandResult};
pub use error::{ConnectionStringError, MessageError, WrapError};
pub use message::{ByteMessage, MAX_MESSAGE_SIZE, MessageContent};
pub use options::ClientOption;
pub use token::TrackingToken;
pub use values::{DeviceId, Timestamp};
