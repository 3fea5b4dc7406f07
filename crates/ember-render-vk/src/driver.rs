// SPDX-License-Identifier: CEPL-1.0
//! The seam between the bring-up stages and the Vulkan loader.
//!
//! Stages talk to the driver only through these traits, so the negotiation
//! logic runs the same against [`crate::AshDriver`] and an in-memory driver.
//!
//! # Safety
//!
//! Every `unsafe fn` below takes raw handles. Callers must pass handles that
//! were produced by the same driver object (or an object it created) and that
//! have not been destroyed yet. `destroy*` additionally requires that nothing
//! created from the handle is still alive.

use std::ffi::{CStr, CString};

use ash::prelude::VkResult;
use ash::vk;
use ember_render::PresentTarget;

use crate::error::SurfaceError;
use crate::swapchain::SwapchainPlan;

pub struct InstanceRequest<'a> {
    pub app_name: &'a CStr,
    pub engine_name: &'a CStr,
    pub extensions: &'a [CString],
    pub layers: &'a [CString],
    /// Chained onto instance creation so create/destroy of the instance
    /// itself is reported.
    pub messenger: Option<vk::DebugUtilsMessengerCreateInfoEXT<'static>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueueRequest {
    pub family: u32,
    pub priority: f32,
}

pub struct DeviceRequest<'a> {
    pub queues: &'a [QueueRequest],
    pub extensions: &'a [&'a CStr],
    /// Device layers are ignored by current loaders; older ones still read
    /// them.
    pub layers: &'a [CString],
}

/// Entry point: global queries and instance creation.
pub trait Driver {
    type Instance: InstanceDriver;

    fn available_layers(&self) -> VkResult<Vec<CString>>;

    /// Instance extensions the window system needs to present to `target`.
    fn presentation_extensions(
        &self,
        target: &dyn PresentTarget,
    ) -> Result<Vec<CString>, SurfaceError>;

    fn create_instance(&self, request: &InstanceRequest<'_>) -> VkResult<Self::Instance>;
}

pub trait InstanceDriver {
    type DebugUtils: DebugUtilsDriver;
    type Device: DeviceDriver;

    /// Resolves the debug messenger entry points by name. `None` if the
    /// loaded driver does not export them.
    fn debug_utils(&self) -> Option<Self::DebugUtils>;

    /// `target` must outlive the returned surface.
    unsafe fn create_surface(
        &self,
        target: &dyn PresentTarget,
    ) -> Result<vk::SurfaceKHR, SurfaceError>;

    fn enumerate_accelerators(&self) -> VkResult<Vec<vk::PhysicalDevice>>;

    unsafe fn accelerator_name(&self, accelerator: vk::PhysicalDevice) -> String;

    unsafe fn queue_families(&self, accelerator: vk::PhysicalDevice)
        -> Vec<vk::QueueFamilyProperties>;

    unsafe fn presentation_support(
        &self,
        accelerator: vk::PhysicalDevice,
        family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;

    unsafe fn device_extensions(&self, accelerator: vk::PhysicalDevice) -> VkResult<Vec<CString>>;

    unsafe fn surface_capabilities(
        &self,
        accelerator: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;

    unsafe fn surface_formats(
        &self,
        accelerator: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;

    unsafe fn present_modes(
        &self,
        accelerator: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;

    unsafe fn create_device(
        &self,
        accelerator: vk::PhysicalDevice,
        request: &DeviceRequest<'_>,
    ) -> VkResult<Self::Device>;

    unsafe fn destroy_surface(&self, surface: vk::SurfaceKHR);

    unsafe fn destroy(self);
}

pub trait DebugUtilsDriver {
    unsafe fn create_messenger(
        &self,
        info: &vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    ) -> VkResult<vk::DebugUtilsMessengerEXT>;

    unsafe fn destroy_messenger(&self, messenger: vk::DebugUtilsMessengerEXT);
}

pub trait DeviceDriver {
    unsafe fn queue(&self, family: u32, index: u32) -> vk::Queue;

    unsafe fn create_swapchain(
        &self,
        surface: vk::SurfaceKHR,
        plan: &SwapchainPlan,
    ) -> VkResult<vk::SwapchainKHR>;

    unsafe fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>>;

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);

    unsafe fn create_image_view(&self, info: &vk::ImageViewCreateInfo<'_>)
        -> VkResult<vk::ImageView>;

    unsafe fn destroy_image_view(&self, view: vk::ImageView);

    unsafe fn destroy(self);
}
