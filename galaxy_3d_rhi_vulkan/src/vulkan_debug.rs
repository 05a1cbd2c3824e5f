/// Vulkan debug messenger - routes validation layer messages to the engine logger
///
/// Only installed when the `vulkan-validation` feature is enabled.

use ash::vk;
use galaxy_3d_rhi::galaxy3d::Result;
use galaxy_3d_rhi::galaxy3d::log::LogSeverity;
use galaxy_3d_rhi::engine_err;
use std::ffi::CStr;

const LOG_SOURCE: &str = "galaxy3d::vulkan::validation";

/// Engine severity for a validation message severity
pub(crate) fn message_severity(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Debug
    } else {
        LogSeverity::Trace
    }
}

/// Vulkan debug messenger callback
pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity_flags: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = unsafe { &*p_callback_data };

    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown".to_string()
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message_id_name) }.to_string_lossy().into_owned()
    };
    let message = if callback_data.p_message.is_null() {
        "No message".to_string()
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message) }.to_string_lossy().into_owned()
    };

    galaxy_3d_rhi::galaxy3d::Engine::log(
        message_severity(message_severity_flags),
        LOG_SOURCE,
        format!("[{}] {}", message_id_name, message),
    );

    // Never abort the Vulkan call
    vk::FALSE
}

pub(crate) fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
) -> Result<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)> {
    let loader = ash::ext::debug_utils::Instance::new(entry, instance);
    let info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(vulkan_debug_callback));

    let messenger = unsafe { loader.create_debug_utils_messenger(&info, None) }
        .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create debug messenger: {:?}", e))?;
    Ok((loader, messenger))
}

#[cfg(test)]
#[path = "vulkan_debug_tests.rs"]
mod tests;
