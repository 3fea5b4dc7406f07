// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CString;

use ash::vk;
use tracing::info;

use crate::device::{QueueFamilies, SelectedAccelerator, DEVICE_EXTENSIONS};
use crate::driver::{DeviceDriver, DeviceRequest, InstanceDriver, QueueRequest};
use crate::error::InitError;

const QUEUE_PRIORITY: f32 = 1.0;

/// One single-queue request per distinct family.
pub fn queue_requests(families: QueueFamilies) -> Vec<QueueRequest> {
    families
        .unique()
        .into_iter()
        .map(|family| QueueRequest {
            family,
            priority: QUEUE_PRIORITY,
        })
        .collect()
}

pub struct LogicalDevice<D> {
    device: D,
    families: QueueFamilies,
    graphics_queue: vk::Queue,
    presentation_queue: vk::Queue,
}

impl<D: DeviceDriver> LogicalDevice<D> {
    pub fn driver(&self) -> &D {
        &self.device
    }

    pub fn families(&self) -> QueueFamilies {
        self.families
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// Same handle as [`Self::graphics_queue`] when one family does both.
    pub fn presentation_queue(&self) -> vk::Queue {
        self.presentation_queue
    }

    /// Everything created from the device must be gone already.
    pub(crate) unsafe fn destroy(self) {
        unsafe { self.device.destroy() }
    }
}

pub(crate) unsafe fn create_logical_device<I: InstanceDriver>(
    instance: &I,
    accelerator: &SelectedAccelerator,
    layers: &[CString],
) -> Result<LogicalDevice<I::Device>, InitError> {
    let families = accelerator.families;
    let queues = queue_requests(families);
    let request = DeviceRequest {
        queues: &queues,
        extensions: DEVICE_EXTENSIONS,
        layers,
    };

    let device = unsafe { instance.create_device(accelerator.handle, &request) }
        .map_err(InitError::DeviceCreationFailed)?;
    let (graphics_queue, presentation_queue) = unsafe {
        (
            device.queue(families.graphics, 0),
            device.queue(families.presentation, 0),
        )
    };
    info!(
        "logical device ready on {:?} ({} queue families)",
        accelerator.name,
        queues.len()
    );

    Ok(LogicalDevice {
        device,
        families,
        graphics_queue,
        presentation_queue,
    })
}
