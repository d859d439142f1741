use hublink_core::ExecuteCommandResult;
use std::ffi::CStr;

/// Port for the device model that executes inbound commands
///
/// The client never looks inside the model; it hands over each inbound
/// payload as a NUL-terminated string and maps the result to a disposition.
pub trait DeviceModel {
    /// Execute one command payload
    fn execute_command(&mut self, command: &CStr) -> ExecuteCommandResult;

    /// Get the model's name for logging
    fn name(&self) -> &str {
        "DeviceModel"
    }
}

impl<M: DeviceModel + ?Sized> DeviceModel for Box<M> {
    fn execute_command(&mut self, command: &CStr) -> ExecuteCommandResult {
        (**self).execute_command(command)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
