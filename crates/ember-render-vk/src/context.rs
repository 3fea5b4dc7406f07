// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CString;

use ash::vk;
use ember_render::{PresentTarget, RenderSize};
use tracing::info;

use crate::debug::{self, DebugBridge};
use crate::device::{self, SelectedAccelerator};
use crate::driver::{DeviceDriver, Driver, InstanceDriver};
use crate::error::InitError;
use crate::instance::{self, InstanceBundle};
use crate::logical::{self, LogicalDevice};
use crate::swapchain::{self, Swapchain};
use crate::views;

type InstanceOf<D> = <D as Driver>::Instance;
type DeviceOf<D> = <InstanceOf<D> as InstanceDriver>::Device;
type DebugUtilsOf<D> = <InstanceOf<D> as InstanceDriver>::DebugUtils;

#[derive(Clone, Debug)]
pub struct PipelineSettings {
    /// Reported to the driver in the application info.
    pub app_name: CString,
    /// Validation layers, debug-utils extension and the debug messenger.
    pub diagnostics: bool,
}

impl PipelineSettings {
    /// Diagnostics follow the build profile.
    pub fn new(app_name: CString) -> Self {
        Self {
            app_name,
            diagnostics: cfg!(debug_assertions),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::new(c"Hello Triangle".to_owned())
    }
}

/// Every object the bring-up creates, from instance to image views.
///
/// Slots fill in creation order. Dropping the context, including a
/// half-built one abandoned by a failing stage, releases whatever exists in
/// exactly the reverse order.
pub struct GpuContext<D: Driver> {
    driver: D,
    instance: Option<InstanceBundle<InstanceOf<D>>>,
    debug: Option<DebugBridge<DebugUtilsOf<D>>>,
    surface: Option<vk::SurfaceKHR>,
    accelerator: Option<SelectedAccelerator>,
    device: Option<LogicalDevice<DeviceOf<D>>>,
    swapchain: Option<Swapchain>,
    views: Vec<vk::ImageView>,
}

impl<D: Driver> GpuContext<D> {
    /// Runs every stage against `target`. `target` must outlive the context.
    pub fn new(
        driver: D,
        target: &dyn PresentTarget,
        settings: &PipelineSettings,
    ) -> Result<Self, InitError> {
        let mut ctx = Self {
            driver,
            instance: None,
            debug: None,
            surface: None,
            accelerator: None,
            device: None,
            swapchain: None,
            views: Vec::new(),
        };
        ctx.bring_up(target, settings)?;
        Ok(ctx)
    }

    fn bring_up(
        &mut self,
        target: &dyn PresentTarget,
        settings: &PipelineSettings,
    ) -> Result<(), InitError> {
        let bundle: &InstanceBundle<_> = self
            .instance
            .insert(instance::create_instance(&self.driver, target, settings)?);
        let instance = &bundle.instance;

        // SAFETY: each stage only receives handles created by the stages
        // before it, all still alive and owned by `self`.
        unsafe {
            self.debug = debug::attach(instance, settings.diagnostics)?;

            let surface = *self.surface.insert(
                instance
                    .create_surface(target)
                    .map_err(InitError::SurfaceCreationFailed)?,
            );

            let accelerator: &SelectedAccelerator = self
                .accelerator
                .insert(device::select_accelerator(instance, surface)?);

            let device: &LogicalDevice<_> = self.device.insert(logical::create_logical_device(
                instance,
                accelerator,
                bundle.layers(),
            )?);

            let swapchain: &Swapchain = self.swapchain.insert(swapchain::create_swapchain(
                instance,
                device,
                accelerator.handle,
                surface,
                target.size(),
            )?);

            self.views =
                views::create_image_views(device.driver(), swapchain.images(), swapchain.format())?;
        }

        info!("GPU bring-up complete ({} image views)", self.views.len());
        Ok(())
    }

    /// Replaces the swapchain and its views with ones negotiated against a
    /// fresh support snapshot.
    ///
    /// On failure the context is left without a swapchain or views; dropping
    /// it is still sound, and a later call may succeed.
    pub fn rebuild_swapchain(&mut self, target: RenderSize) -> Result<(), InitError> {
        let (Some(bundle), Some(surface), Some(accelerator), Some(device)) =
            (&self.instance, self.surface, &self.accelerator, &self.device)
        else {
            return Err(InitError::SwapchainCreationFailed(
                vk::Result::ERROR_INITIALIZATION_FAILED,
            ));
        };

        // SAFETY: views and swapchain belong to `device`, nothing submits
        // work to them, and the replacement is built from live handles.
        unsafe {
            for view in self.views.drain(..) {
                device.driver().destroy_image_view(view);
            }
            if let Some(old) = self.swapchain.take() {
                device.driver().destroy_swapchain(old.handle);
            }

            let swapchain: &Swapchain = self.swapchain.insert(swapchain::create_swapchain(
                &bundle.instance,
                device,
                accelerator.handle,
                surface,
                target,
            )?);
            match views::create_image_views(device.driver(), swapchain.images(), swapchain.format())
            {
                Ok(views) => self.views = views,
                Err(e) => {
                    if let Some(orphan) = self.swapchain.take() {
                        device.driver().destroy_swapchain(orphan.handle);
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    pub fn instance_layers(&self) -> &[CString] {
        self.instance.as_ref().map_or(&[], |b| b.layers())
    }

    pub fn instance_extensions(&self) -> &[CString] {
        self.instance.as_ref().map_or(&[], |b| b.extensions())
    }

    pub fn diagnostics_attached(&self) -> bool {
        self.debug.is_some()
    }

    pub fn surface(&self) -> Option<vk::SurfaceKHR> {
        self.surface
    }

    pub fn accelerator(&self) -> Option<&SelectedAccelerator> {
        self.accelerator.as_ref()
    }

    pub fn device(&self) -> Option<&LogicalDevice<DeviceOf<D>>> {
        self.device.as_ref()
    }

    pub fn swapchain(&self) -> Option<&Swapchain> {
        self.swapchain.as_ref()
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.views
    }

    fn teardown(&mut self) {
        // SAFETY: everything below was created by this context and is
        // released once, dependants before the objects they were made from.
        unsafe {
            if let Some(device) = &self.device {
                for view in self.views.drain(..) {
                    device.driver().destroy_image_view(view);
                }
                if let Some(swapchain) = self.swapchain.take() {
                    device.driver().destroy_swapchain(swapchain.handle);
                }
            }
            if let Some(device) = self.device.take() {
                device.destroy();
            }
            self.accelerator = None;
            if let (Some(bundle), Some(surface)) = (&self.instance, self.surface.take()) {
                bundle.instance.destroy_surface(surface);
            }
            if let Some(debug) = self.debug.take() {
                debug.detach();
            }
            if let Some(bundle) = self.instance.take() {
                bundle.instance.destroy();
            }
        }
    }
}

impl<D: Driver> Drop for GpuContext<D> {
    fn drop(&mut self) {
        self.teardown();
        info!("GPU context torn down");
    }
}
