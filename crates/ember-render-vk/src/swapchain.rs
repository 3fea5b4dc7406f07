// SPDX-License-Identifier: CEPL-1.0
use ash::prelude::VkResult;
use ash::vk;
use ember_render::RenderSize;
use tracing::{debug, info};

use crate::device::QueueFamilies;
use crate::driver::{DeviceDriver, InstanceDriver};
use crate::error::InitError;
use crate::logical::LogicalDevice;

/// What a surface supports for one accelerator, queried fresh every time.
#[derive(Clone, Debug, Default)]
pub struct SupportSnapshot {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SupportSnapshot {
    pub(crate) unsafe fn query<I: InstanceDriver>(
        instance: &I,
        accelerator: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Self> {
        unsafe {
            Ok(Self {
                capabilities: instance.surface_capabilities(accelerator, surface)?,
                formats: instance.surface_formats(accelerator, surface)?,
                present_modes: instance.present_modes(accelerator, surface)?,
            })
        }
    }

    /// At least one format and one presentation mode.
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// BGRA8 sRGB if offered, otherwise whatever the driver lists first.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first().copied())
}

/// MAILBOX if offered. FIFO is always available, listed or not.
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// The surface's current extent, or `want` pulled into the reported bounds.
/// Inverted bounds resolve to the minimum rather than panicking.
pub fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, want: RenderSize) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }
    let (min, max) = (caps.min_image_extent, caps.max_image_extent);
    vk::Extent2D {
        width: want.width.min(max.width).max(min.width),
        height: want.height.min(max.height).max(min.height),
    }
}

/// One more than the minimum, capped by a nonzero maximum.
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        count.min(caps.max_image_count)
    } else {
        count
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageSharing {
    Exclusive,
    /// Graphics family first, presentation family second.
    Concurrent([u32; 2]),
}

impl ImageSharing {
    pub fn for_families(families: QueueFamilies) -> Self {
        if families.is_shared() {
            ImageSharing::Exclusive
        } else {
            ImageSharing::Concurrent([families.graphics, families.presentation])
        }
    }

    pub fn mode(&self) -> vk::SharingMode {
        match self {
            ImageSharing::Exclusive => vk::SharingMode::EXCLUSIVE,
            ImageSharing::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    pub fn family_indices(&self) -> &[u32] {
        match self {
            ImageSharing::Exclusive => &[],
            ImageSharing::Concurrent(indices) => indices,
        }
    }
}

/// Every negotiated parameter of a swapchain, before it exists.
#[derive(Clone, Copy, Debug)]
pub struct SwapchainPlan {
    pub image_count: u32,
    pub format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub transform: vk::SurfaceTransformFlagsKHR,
    pub sharing: ImageSharing,
}

impl SwapchainPlan {
    pub fn negotiate(
        support: &SupportSnapshot,
        families: QueueFamilies,
        target: RenderSize,
    ) -> Result<Self, InitError> {
        let format = choose_surface_format(&support.formats).ok_or(
            InitError::SwapchainCreationFailed(vk::Result::ERROR_FORMAT_NOT_SUPPORTED),
        )?;
        Ok(Self {
            image_count: choose_image_count(&support.capabilities),
            format,
            present_mode: choose_present_mode(&support.present_modes),
            extent: choose_extent(&support.capabilities, target),
            transform: support.capabilities.current_transform,
            sharing: ImageSharing::for_families(families),
        })
    }

    pub fn create_info(&self, surface: vk::SurfaceKHR) -> vk::SwapchainCreateInfoKHR<'_> {
        vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(self.image_count)
            .image_format(self.format.format)
            .image_color_space(self.format.color_space)
            .image_extent(self.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(self.sharing.mode())
            .queue_family_indices(self.sharing.family_indices())
            .pre_transform(self.transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(self.present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null())
    }
}

pub struct Swapchain {
    pub(crate) handle: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    plan: SwapchainPlan,
}

impl Swapchain {
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    /// In the order the driver reported them.
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    pub fn format(&self) -> vk::Format {
        self.plan.format.format
    }

    pub fn color_space(&self) -> vk::ColorSpaceKHR {
        self.plan.format.color_space
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.plan.extent
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.plan.present_mode
    }

    pub fn sharing(&self) -> ImageSharing {
        self.plan.sharing
    }
}

pub(crate) unsafe fn create_swapchain<I: InstanceDriver>(
    instance: &I,
    device: &LogicalDevice<I::Device>,
    accelerator: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    target: RenderSize,
) -> Result<Swapchain, InitError> {
    let support = unsafe { SupportSnapshot::query(instance, accelerator, surface) }
        .map_err(InitError::SwapchainCreationFailed)?;
    let plan = SwapchainPlan::negotiate(&support, device.families(), target)?;
    debug!(?plan, "swapchain plan");

    let driver = device.driver();
    let handle = unsafe { driver.create_swapchain(surface, &plan) }
        .map_err(InitError::SwapchainCreationFailed)?;
    let images = match unsafe { driver.swapchain_images(handle) } {
        Ok(images) => images,
        Err(result) => {
            unsafe { driver.destroy_swapchain(handle) };
            return Err(InitError::SwapchainCreationFailed(result));
        }
    };

    info!(
        "Vulkan swapchain ready ({}x{}, {:?}/{:?}, {:?}, {} images, {:?})",
        plan.extent.width,
        plan.extent.height,
        plan.format.format,
        plan.format.color_space,
        plan.present_mode,
        images.len(),
        plan.sharing.mode(),
    );

    Ok(Swapchain {
        handle,
        images,
        plan,
    })
}
