// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use tracing::debug;

use crate::driver::DeviceDriver;
use crate::error::InitError;

/// 2D color view over the single mip level and array layer of `image`.
pub fn view_info(image: vk::Image, format: vk::Format) -> vk::ImageViewCreateInfo<'static> {
    vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        })
}

/// One view per image, same order. Stops at the first failure and releases
/// the views already made.
pub(crate) unsafe fn create_image_views<D: DeviceDriver>(
    device: &D,
    images: &[vk::Image],
    format: vk::Format,
) -> Result<Vec<vk::ImageView>, InitError> {
    let mut views = Vec::with_capacity(images.len());
    for (index, &image) in images.iter().enumerate() {
        match unsafe { device.create_image_view(&view_info(image, format)) } {
            Ok(view) => views.push(view),
            Err(result) => {
                for view in views.drain(..).rev() {
                    unsafe { device.destroy_image_view(view) };
                }
                return Err(InitError::ImageViewCreationFailed { index, result });
            }
        }
    }
    debug!("{} image views created", views.len());
    Ok(views)
}
