/// GpuContext - Vulkan instance and logical device shared by backend objects
///
/// Contains everything the descriptor backend needs:
/// - Device for Vulkan API calls
/// - Physical device and graphics queue family it was created from
/// - Validation messenger when the `vulkan-validation` feature is enabled
///
/// The context owns the instance and the device and destroys them on drop,
/// so every object holding an `Arc<GpuContext>` must be dropped first.

use ash::vk;
use galaxy_3d_rhi::galaxy3d::{Result, Error};
use galaxy_3d_rhi::{engine_info, engine_error, engine_err};
use std::ffi::CString;

const LOG_SOURCE: &str = "galaxy3d::vulkan";

pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    pub physical_device: vk::PhysicalDevice,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    instance: ash::Instance,

    /// Keeps the Vulkan library loaded for the lifetime of the instance
    _entry: ash::Entry,

    /// Debug utils loader and messenger (validation builds only)
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl GpuContext {
    /// Create an instance and a device without any surface
    ///
    /// Picks the first physical device exposing a graphics queue. With the
    /// `vulkan-validation` feature, `VK_LAYER_KHRONOS_validation` is enabled
    /// and its messages are routed to the engine logger.
    pub fn new_headless(app_name: &str) -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }.map_err(|e| {
            engine_error!(LOG_SOURCE, "Failed to load Vulkan library: {:?}", e);
            Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
        })?;

        let app_name = CString::new(app_name)
            .map_err(|_| Error::InitializationFailed("application name contains a NUL byte".to_string()))?;
        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .engine_name(c"Galaxy3D")
            .api_version(vk::API_VERSION_1_1);

        let validation = cfg!(feature = "vulkan-validation");
        let layers = if validation { vec![c"VK_LAYER_KHRONOS_validation".as_ptr()] } else { Vec::new() };
        let extensions = if validation { vec![ash::ext::debug_utils::NAME.as_ptr()] } else { Vec::new() };

        let instance_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions);

        let instance = unsafe { entry.create_instance(&instance_info, None) }.map_err(|e| {
            engine_error!(LOG_SOURCE, "Failed to create Vulkan instance: {:?}", e);
            Error::InitializationFailed(format!("Failed to create Vulkan instance: {:?}", e))
        })?;

        let debug_messenger = if validation {
            match crate::vulkan_debug::create_debug_messenger(&entry, &instance) {
                Ok(messenger) => Some(messenger),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        let (physical_device, graphics_queue_family) = match Self::pick_physical_device(&instance) {
            Ok(found) => found,
            Err(e) => {
                Self::destroy_instance(&instance, &debug_messenger);
                return Err(e);
            }
        };

        let priorities = [1.0f32];
        let queue_info = vk::DeviceQueueCreateInfo::default()
            .queue_family_index(graphics_queue_family)
            .queue_priorities(&priorities);
        let device_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(std::slice::from_ref(&queue_info));

        let device = match unsafe { instance.create_device(physical_device, &device_info, None) } {
            Ok(device) => device,
            Err(e) => {
                Self::destroy_instance(&instance, &debug_messenger);
                return Err(engine_err!(LOG_SOURCE, "Failed to create logical device: {:?}", e));
            }
        };

        engine_info!(LOG_SOURCE, "Headless Vulkan device created (queue family {})", graphics_queue_family);

        Ok(Self {
            device,
            physical_device,
            graphics_queue_family,
            instance,
            _entry: entry,
            debug_messenger,
        })
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Index of a host visible, host coherent memory type allowed by `type_bits`
    pub fn find_host_visible_memory(&self, type_bits: u32) -> Option<u32> {
        let properties = unsafe { self.instance.get_physical_device_memory_properties(self.physical_device) };
        let wanted = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        (0..properties.memory_type_count).find(|&i| {
            type_bits & (1 << i) != 0
                && properties.memory_types[i as usize].property_flags.contains(wanted)
        })
    }

    fn pick_physical_device(instance: &ash::Instance) -> Result<(vk::PhysicalDevice, u32)> {
        let devices = unsafe { instance.enumerate_physical_devices() }
            .map_err(|e| engine_err!(LOG_SOURCE, "Failed to enumerate physical devices: {:?}", e))?;

        for physical_device in devices {
            let families = unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
            if let Some(index) = families.iter().position(|f| f.queue_flags.contains(vk::QueueFlags::GRAPHICS)) {
                return Ok((physical_device, index as u32));
            }
        }

        engine_error!(LOG_SOURCE, "No physical device with a graphics queue");
        Err(Error::InitializationFailed("No physical device with a graphics queue".to_string()))
    }

    fn destroy_instance(
        instance: &ash::Instance,
        debug_messenger: &Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    ) {
        unsafe {
            if let Some((loader, messenger)) = debug_messenger {
                loader.destroy_debug_utils_messenger(*messenger, None);
            }
            instance.destroy_instance(None);
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
        Self::destroy_instance(&self.instance, &self.debug_messenger);
    }
}
