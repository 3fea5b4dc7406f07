// SPDX-License-Identifier: CEPL-1.0
use std::collections::BTreeSet;
use std::ffi::{CStr, CString};

use ash::vk;
use tracing::{debug, info, warn};

use crate::driver::InstanceDriver;
use crate::error::InitError;
use crate::swapchain::SupportSnapshot;

pub const DEVICE_EXTENSIONS: &[&CStr] = &[ash::khr::swapchain::NAME];

/// Family indices as found by the scan; either may be missing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub presentation: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.presentation.is_some()
    }

    pub fn resolve(&self) -> Option<QueueFamilies> {
        Some(QueueFamilies {
            graphics: self.graphics?,
            presentation: self.presentation?,
        })
    }
}

/// A complete pair of family indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub presentation: u32,
}

impl QueueFamilies {
    /// One family serves both roles.
    pub fn is_shared(&self) -> bool {
        self.graphics == self.presentation
    }

    /// Distinct indices, ascending.
    pub fn unique(&self) -> Vec<u32> {
        BTreeSet::from([self.graphics, self.presentation])
            .into_iter()
            .collect()
    }
}

/// First graphics family and first presenting family, in enumeration order.
pub fn find_queue_families(
    families: &[vk::QueueFamilyProperties],
    mut presents: impl FnMut(u32) -> bool,
) -> QueueFamilyIndices {
    let mut indices = QueueFamilyIndices::default();
    for (index, family) in (0u32..).zip(families) {
        if indices.graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            indices.graphics = Some(index);
        }
        if indices.presentation.is_none() && presents(index) {
            indices.presentation = Some(index);
        }
        if indices.is_complete() {
            break;
        }
    }
    indices
}

/// Required names not present in `available`. Empty means supported.
pub fn missing_extensions<'a>(available: &[CString], required: &[&'a CStr]) -> Vec<&'a CStr> {
    let mut remaining: BTreeSet<&'a CStr> = required.iter().copied().collect();
    for name in available {
        remaining.remove(name.as_c_str());
    }
    remaining.into_iter().collect()
}

/// The outcome of the three suitability checks for one candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Suitability {
    pub indices: QueueFamilyIndices,
    pub extensions_supported: bool,
    pub swapchain_adequate: bool,
}

impl Suitability {
    pub fn families(&self) -> Option<QueueFamilies> {
        if self.extensions_supported && self.swapchain_adequate {
            self.indices.resolve()
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct SelectedAccelerator {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub families: QueueFamilies,
}

pub(crate) unsafe fn assess<I: InstanceDriver>(
    instance: &I,
    accelerator: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> Suitability {
    let families = unsafe { instance.queue_families(accelerator) };
    let indices = find_queue_families(&families, |index| {
        let supported = unsafe { instance.presentation_support(accelerator, index, surface) };
        supported.unwrap_or_else(|e| {
            warn!("presentation support query for family {index} failed: {e}");
            false
        })
    });

    let available = unsafe { instance.device_extensions(accelerator) }.unwrap_or_else(|e| {
        warn!("device extension query failed: {e}");
        Vec::new()
    });
    let missing = missing_extensions(&available, DEVICE_EXTENSIONS);
    if !missing.is_empty() {
        debug!(?missing, "missing device extensions");
    }
    let extensions_supported = missing.is_empty();

    // only meaningful once the swapchain extension is known to exist
    let swapchain_adequate = extensions_supported
        && match unsafe { SupportSnapshot::query(instance, accelerator, surface) } {
            Ok(support) => support.is_adequate(),
            Err(e) => {
                warn!("surface support query failed: {e}");
                false
            }
        };

    Suitability {
        indices,
        extensions_supported,
        swapchain_adequate,
    }
}

/// First accelerator, in enumeration order, that passes every check.
pub(crate) unsafe fn select_accelerator<I: InstanceDriver>(
    instance: &I,
    surface: vk::SurfaceKHR,
) -> Result<SelectedAccelerator, InitError> {
    let candidates = instance
        .enumerate_accelerators()
        .map_err(|result| InitError::DriverQuery {
            call: "vkEnumeratePhysicalDevices",
            result,
        })?;
    if candidates.is_empty() {
        return Err(InitError::NoAcceleratorFound);
    }

    for handle in candidates {
        let name = unsafe { instance.accelerator_name(handle) };
        debug!("considering GPU {name:?}");
        let verdict = unsafe { assess(instance, handle, surface) };
        match verdict.families() {
            Some(families) => {
                info!(
                    "selected GPU {name:?} (graphics family {}, present family {})",
                    families.graphics, families.presentation
                );
                return Ok(SelectedAccelerator {
                    handle,
                    name,
                    families,
                });
            }
            None => warn!(?verdict, "GPU {name:?} is not suitable"),
        }
    }

    Err(InitError::NoSuitableAccelerator)
}
