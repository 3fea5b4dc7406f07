// SPDX-License-Identifier: CEPL-1.0
//! Vulkan bring-up: instance, debug messenger, surface, GPU selection,
//! logical device, swapchain and its image views.
//!
//! [`GpuContext::new`] runs the stages in order against any [`Driver`];
//! [`AshDriver`] is the real loader.
#![deny(unsafe_op_in_unsafe_fn)]

mod context;
mod debug;
mod device;
mod driver;
mod error;
mod instance;
mod logical;
mod native;
mod swapchain;
mod views;

#[cfg(test)]
mod mock;

pub use ash::vk;
pub use context::{GpuContext, PipelineSettings};
pub use debug::{messenger_info, severity_level};
pub use device::{
    find_queue_families, missing_extensions, QueueFamilies, QueueFamilyIndices,
    SelectedAccelerator, Suitability, DEVICE_EXTENSIONS,
};
pub use driver::{
    DebugUtilsDriver, DeviceDriver, DeviceRequest, Driver, InstanceDriver, InstanceRequest,
    QueueRequest,
};
pub use error::{DiagnosticsFailure, InitError, Stage, SurfaceError};
pub use instance::{check_layers, required_extensions, InstanceBundle, ENGINE_NAME, VALIDATION_LAYERS};
pub use logical::{queue_requests, LogicalDevice};
pub use native::{AshDevice, AshDriver, AshInstance};
pub use swapchain::{
    choose_extent, choose_image_count, choose_present_mode, choose_surface_format, ImageSharing,
    SupportSnapshot, Swapchain, SwapchainPlan,
};
pub use views::view_info;

/// The production pipeline.
pub type VulkanContext = GpuContext<AshDriver>;
