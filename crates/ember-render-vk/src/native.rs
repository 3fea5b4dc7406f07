// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, CStr, CString};

use ash::ext::debug_utils;
use ash::khr::{surface, swapchain};
use ash::prelude::VkResult;
use ash::{vk, Entry};
use ember_render::PresentTarget;

use crate::driver::{
    DebugUtilsDriver, DeviceDriver, DeviceRequest, Driver, InstanceDriver, InstanceRequest,
};
use crate::error::SurfaceError;
use crate::swapchain::SwapchainPlan;

const APP_VERSION: u32 = vk::make_api_version(0, 1, 0, 0);

/// The real Vulkan loader, statically linked.
pub struct AshDriver {
    entry: Entry,
}

impl AshDriver {
    pub fn linked() -> Self {
        Self {
            entry: Entry::linked(),
        }
    }
}

impl Default for AshDriver {
    fn default() -> Self {
        Self::linked()
    }
}

fn name_ptrs(names: &[CString]) -> Vec<*const c_char> {
    names.iter().map(|n| n.as_ptr()).collect()
}

impl Driver for AshDriver {
    type Instance = AshInstance;

    fn available_layers(&self) -> VkResult<Vec<CString>> {
        // SAFETY: global command, no handles involved.
        let layers = unsafe { self.entry.enumerate_instance_layer_properties()? };
        Ok(layers
            .iter()
            .filter_map(|l| l.layer_name_as_c_str().ok())
            .map(CStr::to_owned)
            .collect())
    }

    fn presentation_extensions(
        &self,
        target: &dyn PresentTarget,
    ) -> Result<Vec<CString>, SurfaceError> {
        let display = target.display_handle()?.as_raw();
        let names = ash_window::enumerate_required_extensions(display)?;
        // SAFETY: ash-window hands out pointers to static NUL-terminated names.
        Ok(names
            .iter()
            .map(|&p| unsafe { CStr::from_ptr(p) }.to_owned())
            .collect())
    }

    fn create_instance(&self, request: &InstanceRequest<'_>) -> VkResult<AshInstance> {
        let app_info = vk::ApplicationInfo::default()
            .application_name(request.app_name)
            .application_version(APP_VERSION)
            .engine_name(request.engine_name)
            .engine_version(APP_VERSION)
            .api_version(vk::API_VERSION_1_0);

        let extensions = name_ptrs(request.extensions);
        let layers = name_ptrs(request.layers);
        let mut messenger = request.messenger;

        let mut create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers);
        if let Some(messenger) = messenger.as_mut() {
            create_info = create_info.push_next(messenger);
        }

        // SAFETY: every pointer in create_info borrows a local that outlives the call.
        let instance = unsafe { self.entry.create_instance(&create_info, None)? };
        let surface = surface::Instance::new(&self.entry, &instance);
        Ok(AshInstance {
            entry: self.entry.clone(),
            instance,
            surface,
        })
    }
}

pub struct AshInstance {
    entry: Entry,
    instance: ash::Instance,
    surface: surface::Instance,
}

impl InstanceDriver for AshInstance {
    type DebugUtils = debug_utils::Instance;
    type Device = AshDevice;

    fn debug_utils(&self) -> Option<debug_utils::Instance> {
        // SAFETY: live instance handle and a static name.
        let create = unsafe {
            self.entry.get_instance_proc_addr(
                self.instance.handle(),
                c"vkCreateDebugUtilsMessengerEXT".as_ptr(),
            )
        };
        create.map(|_| debug_utils::Instance::new(&self.entry, &self.instance))
    }

    unsafe fn create_surface(
        &self,
        target: &dyn PresentTarget,
    ) -> Result<vk::SurfaceKHR, SurfaceError> {
        let display = target.display_handle()?.as_raw();
        let window = target.window_handle()?.as_raw();
        // SAFETY: caller keeps `target` alive for the lifetime of the surface.
        let surface = unsafe {
            ash_window::create_surface(&self.entry, &self.instance, display, window, None)?
        };
        Ok(surface)
    }

    fn enumerate_accelerators(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        // SAFETY: live instance.
        unsafe { self.instance.enumerate_physical_devices() }
    }

    unsafe fn accelerator_name(&self, accelerator: vk::PhysicalDevice) -> String {
        let props = unsafe { self.instance.get_physical_device_properties(accelerator) };
        props
            .device_name_as_c_str()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from("<unnamed>"))
    }

    unsafe fn queue_families(
        &self,
        accelerator: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        unsafe {
            self.instance
                .get_physical_device_queue_family_properties(accelerator)
        }
    }

    unsafe fn presentation_support(
        &self,
        accelerator: vk::PhysicalDevice,
        family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        unsafe {
            self.surface
                .get_physical_device_surface_support(accelerator, family, surface)
        }
    }

    unsafe fn device_extensions(&self, accelerator: vk::PhysicalDevice) -> VkResult<Vec<CString>> {
        let props = unsafe {
            self.instance
                .enumerate_device_extension_properties(accelerator)?
        };
        Ok(props
            .iter()
            .filter_map(|e| e.extension_name_as_c_str().ok())
            .map(CStr::to_owned)
            .collect())
    }

    unsafe fn surface_capabilities(
        &self,
        accelerator: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface
                .get_physical_device_surface_capabilities(accelerator, surface)
        }
    }

    unsafe fn surface_formats(
        &self,
        accelerator: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.surface
                .get_physical_device_surface_formats(accelerator, surface)
        }
    }

    unsafe fn present_modes(
        &self,
        accelerator: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface
                .get_physical_device_surface_present_modes(accelerator, surface)
        }
    }

    unsafe fn create_device(
        &self,
        accelerator: vk::PhysicalDevice,
        request: &DeviceRequest<'_>,
    ) -> VkResult<AshDevice> {
        let queue_infos: Vec<_> = request
            .queues
            .iter()
            .map(|q| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(q.family)
                    .queue_priorities(std::slice::from_ref(&q.priority))
            })
            .collect();
        let extensions: Vec<*const c_char> =
            request.extensions.iter().map(|e| e.as_ptr()).collect();
        let layers = name_ptrs(request.layers);
        let features = vk::PhysicalDeviceFeatures::default();

        #[allow(deprecated)]
        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layers)
            .enabled_features(&features);

        let device = unsafe {
            self.instance
                .create_device(accelerator, &create_info, None)?
        };
        let swapchain = swapchain::Device::new(&self.instance, &device);
        Ok(AshDevice { device, swapchain })
    }

    unsafe fn destroy_surface(&self, surface: vk::SurfaceKHR) {
        unsafe { self.surface.destroy_surface(surface, None) }
    }

    unsafe fn destroy(self) {
        unsafe { self.instance.destroy_instance(None) }
    }
}

impl DebugUtilsDriver for debug_utils::Instance {
    unsafe fn create_messenger(
        &self,
        info: &vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        unsafe { self.create_debug_utils_messenger(info, None) }
    }

    unsafe fn destroy_messenger(&self, messenger: vk::DebugUtilsMessengerEXT) {
        unsafe { self.destroy_debug_utils_messenger(messenger, None) }
    }
}

pub struct AshDevice {
    device: ash::Device,
    swapchain: swapchain::Device,
}

impl DeviceDriver for AshDevice {
    unsafe fn queue(&self, family: u32, index: u32) -> vk::Queue {
        unsafe { self.device.get_device_queue(family, index) }
    }

    unsafe fn create_swapchain(
        &self,
        surface: vk::SurfaceKHR,
        plan: &SwapchainPlan,
    ) -> VkResult<vk::SwapchainKHR> {
        let create_info = plan.create_info(surface);
        unsafe { self.swapchain.create_swapchain(&create_info, None) }
    }

    unsafe fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        unsafe { self.swapchain.get_swapchain_images(swapchain) }
    }

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        unsafe { self.swapchain.destroy_swapchain(swapchain, None) }
    }

    unsafe fn create_image_view(
        &self,
        info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView> {
        unsafe { self.device.create_image_view(info, None) }
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe { self.device.destroy_image_view(view, None) }
    }

    unsafe fn destroy(self) {
        unsafe { self.device.destroy_device(None) }
    }
}
