//! Unit tests for validation message routing

use super::*;

#[test]
fn test_message_severity_mapping() {
    assert_eq!(message_severity(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR), LogSeverity::Error);
    assert_eq!(message_severity(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING), LogSeverity::Warn);
    assert_eq!(message_severity(vk::DebugUtilsMessageSeverityFlagsEXT::INFO), LogSeverity::Debug);
    assert_eq!(message_severity(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE), LogSeverity::Trace);
}

#[test]
fn test_message_severity_prefers_highest_bit() {
    let flags = vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR;
    assert_eq!(message_severity(flags), LogSeverity::Error);
}

#[test]
fn test_null_callback_data_is_ignored() {
    let result = unsafe {
        vulkan_debug_callback(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
            std::ptr::null(),
            std::ptr::null_mut(),
        )
    };
    assert_eq!(result, vk::FALSE);
}
