// SPDX-License-Identifier: CEPL-1.0
use std::borrow::Cow;
use std::ffi::{c_void, CStr};

use ash::vk;
use tracing::{debug, error, info, warn, Level};

use crate::driver::{DebugUtilsDriver, InstanceDriver};
use crate::error::{DiagnosticsFailure, InitError};

/// Verbose, warning and error messages of every category.
pub fn messenger_info() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
}

pub fn severity_level(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Level {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        Level::ERROR
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        Level::WARN
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        Level::INFO
    } else {
        Level::DEBUG
    }
}

fn relay(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    message: &str,
) {
    let level = severity_level(severity);
    if level == Level::ERROR {
        error!(target: "vulkan", "[{types:?}] {message}");
    } else if level == Level::WARN {
        warn!(target: "vulkan", "[{types:?}] {message}");
    } else if level == Level::INFO {
        info!(target: "vulkan", "[{types:?}] {message}");
    } else {
        debug!(target: "vulkan", "[{types:?}] {message}");
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user: *mut c_void,
) -> vk::Bool32 {
    if !data.is_null() {
        // SAFETY: the layer passes a valid struct for the duration of the call.
        let data = unsafe { &*data };
        let message = if data.p_message.is_null() {
            Cow::Borrowed("")
        } else {
            // SAFETY: p_message is a NUL-terminated string owned by the layer.
            unsafe { CStr::from_ptr(data.p_message) }.to_string_lossy()
        };
        relay(severity, types, &message);
    }
    // never suppress the call that triggered the message
    vk::FALSE
}

/// A live debug messenger and the entry points needed to detach it.
pub struct DebugBridge<U> {
    utils: U,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl<U: DebugUtilsDriver> DebugBridge<U> {
    /// Must run before the owning instance is destroyed.
    pub(crate) unsafe fn detach(self) {
        unsafe { self.utils.destroy_messenger(self.messenger) }
    }
}

/// Returns `None` without touching the driver when diagnostics are off.
pub(crate) unsafe fn attach<I: InstanceDriver>(
    instance: &I,
    enabled: bool,
) -> Result<Option<DebugBridge<I::DebugUtils>>, InitError> {
    if !enabled {
        return Ok(None);
    }

    let utils = instance
        .debug_utils()
        .ok_or(InitError::DiagnosticsSetupFailed(DiagnosticsFailure::Unavailable))?;
    let messenger = unsafe { utils.create_messenger(&messenger_info()) }
        .map_err(|result| InitError::DiagnosticsSetupFailed(result.into()))?;
    info!("debug messenger attached");

    Ok(Some(DebugBridge { utils, messenger }))
}
