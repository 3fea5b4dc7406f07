// SPDX-License-Identifier: CEPL-1.0
use std::fmt;

use ash::vk;
use raw_window_handle::HandleError;
use thiserror::Error;

/// Failure at the window boundary: either the platform refused to hand out
/// its raw handles or the driver refused the surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("window handle unavailable: {0}")]
    Handle(#[from] HandleError),
    #[error(transparent)]
    Vulkan(#[from] vk::Result),
}

#[derive(Debug, Error)]
pub enum DiagnosticsFailure {
    /// `vkCreateDebugUtilsMessengerEXT` could not be resolved by name.
    #[error("debug messenger entry points are not exported by the loaded driver")]
    Unavailable,
    #[error(transparent)]
    Vulkan(#[from] vk::Result),
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("validation layer {0:?} requested, but not available")]
    UnsupportedLayer(String),
    #[error("failed to create instance: {0}")]
    InstanceCreationFailed(#[source] vk::Result),
    #[error("failed to set up debug messenger: {0}")]
    DiagnosticsSetupFailed(#[source] DiagnosticsFailure),
    #[error("failed to create window surface: {0}")]
    SurfaceCreationFailed(#[source] SurfaceError),
    #[error("failed to find GPUs with Vulkan support")]
    NoAcceleratorFound,
    #[error("failed to find a suitable GPU")]
    NoSuitableAccelerator,
    #[error("failed to create logical device: {0}")]
    DeviceCreationFailed(#[source] vk::Result),
    #[error("failed to create swap chain: {0}")]
    SwapchainCreationFailed(#[source] vk::Result),
    #[error("failed to create image view for swapchain image {index}: {result}")]
    ImageViewCreationFailed {
        index: usize,
        #[source]
        result: vk::Result,
    },
    #[error("{call} failed: {result}")]
    DriverQuery {
        call: &'static str,
        #[source]
        result: vk::Result,
    },
}

/// Pipeline stage an [`InitError`] was raised in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Instance,
    Diagnostics,
    Surface,
    DeviceSelection,
    LogicalDevice,
    Swapchain,
    ImageViews,
}

impl InitError {
    pub fn stage(&self) -> Stage {
        match self {
            InitError::UnsupportedLayer(_) | InitError::InstanceCreationFailed(_) => {
                Stage::Instance
            }
            InitError::DiagnosticsSetupFailed(_) => Stage::Diagnostics,
            InitError::SurfaceCreationFailed(_) => Stage::Surface,
            InitError::NoAcceleratorFound
            | InitError::NoSuitableAccelerator
            | InitError::DriverQuery { .. } => Stage::DeviceSelection,
            InitError::DeviceCreationFailed(_) => Stage::LogicalDevice,
            InitError::SwapchainCreationFailed(_) => Stage::Swapchain,
            InitError::ImageViewCreationFailed { .. } => Stage::ImageViews,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Instance => "instance",
            Stage::Diagnostics => "diagnostics",
            Stage::Surface => "surface",
            Stage::DeviceSelection => "device selection",
            Stage::LogicalDevice => "logical device",
            Stage::Swapchain => "swapchain",
            Stage::ImageViews => "image views",
        })
    }
}
