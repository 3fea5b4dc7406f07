// SPDX-License-Identifier: CEPL-1.0
//! In-memory driver that records every create and destroy call.

use std::cell::{Cell, RefCell};
use std::ffi::{CStr, CString};
use std::rc::Rc;

use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use ember_render::{PresentTarget, RenderSize, WINDOW_SIZE};
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};

use crate::driver::{
    DebugUtilsDriver, DeviceDriver, DeviceRequest, Driver, InstanceDriver, InstanceRequest,
    QueueRequest,
};
use crate::error::SurfaceError;
use crate::instance::ENGINE_NAME;
use crate::swapchain::SwapchainPlan;

const SURFACE: u64 = 0x5;
const MESSENGER: u64 = 0x6;
const SWAPCHAIN: u64 = 0x7;
const NO_NAMES: &[CString] = &[];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    CreateInstance,
    CreateMessenger,
    CreateSurface,
    CreateDevice,
    CreateSwapchain,
    CreateImageView,
    DestroyImageView,
    DestroySwapchain,
    DestroyDevice,
    DestroySurface,
    DestroyMessenger,
    DestroyInstance,
}

/// Driver queries that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Query {
    EnumerateAccelerators,
    PresentationSupport,
    DeviceExtensions,
    SurfaceCapabilities,
    SurfaceFormats,
    PresentModes,
    SwapchainImages,
}

pub fn surface() -> vk::SurfaceKHR {
    vk::SurfaceKHR::from_raw(SURFACE)
}

pub fn presentation_extensions() -> Vec<CString> {
    vec![c"VK_KHR_surface".to_owned(), c"VK_KHR_xcb_surface".to_owned()]
}

pub fn empty_request() -> InstanceRequest<'static> {
    InstanceRequest {
        app_name: c"mock",
        engine_name: ENGINE_NAME,
        extensions: NO_NAMES,
        layers: NO_NAMES,
        messenger: None,
    }
}

#[derive(Clone, Debug)]
pub struct MockAccelerator {
    pub name: String,
    /// Flags and presentation support per family.
    pub families: Vec<(vk::QueueFlags, bool)>,
    pub extensions: Vec<CString>,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
    /// Queries against this accelerator that return an error.
    pub failing: Vec<Query>,
}

impl MockAccelerator {
    /// One family doing graphics and presentation, the swapchain extension,
    /// a fixed 800x600 surface, one UNORM format and FIFO.
    pub fn suitable(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            families: vec![(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER, true)],
            extensions: vec![ash::khr::swapchain::NAME.to_owned()],
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 0,
                current_extent: vk::Extent2D {
                    width: WINDOW_SIZE.width,
                    height: WINDOW_SIZE.height,
                },
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO],
            failing: Vec::new(),
        }
    }

    pub fn with_failing(mut self, queries: &[Query]) -> Self {
        self.failing = queries.to_vec();
        self
    }

    pub fn with_families(mut self, families: &[(vk::QueueFlags, bool)]) -> Self {
        self.families = families.to_vec();
        self
    }

    pub fn with_extensions(mut self, extensions: &[&CStr]) -> Self {
        self.extensions = extensions.iter().map(|&e| e.to_owned()).collect();
        self
    }

    pub fn with_capabilities(mut self, capabilities: vk::SurfaceCapabilitiesKHR) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_formats(mut self, formats: &[vk::SurfaceFormatKHR]) -> Self {
        self.formats = formats.to_vec();
        self
    }

    pub fn with_present_modes(mut self, modes: &[vk::PresentModeKHR]) -> Self {
        self.present_modes = modes.to_vec();
        self
    }
}

#[derive(Default)]
pub struct MockConfig {
    pub layers: Vec<CString>,
    pub accelerators: Vec<MockAccelerator>,
    /// Whether `vkCreateDebugUtilsMessengerEXT` resolves.
    pub debug_utils_exported: bool,
    /// This create call fails with `ERROR_INITIALIZATION_FAILED`.
    pub fail: Option<Call>,
    /// This query fails with `ERROR_SURFACE_LOST_KHR` on every accelerator.
    pub fail_query: Option<Query>,
    /// Images handed back per swapchain instead of the planned count.
    pub realized_images: Option<u32>,
}

pub struct RecordedInstance {
    pub app_name: CString,
    pub extensions: Vec<CString>,
    pub layers: Vec<CString>,
    pub chained_messenger: bool,
}

pub struct RecordedDevice {
    pub queues: Vec<QueueRequest>,
    pub extensions: Vec<CString>,
    pub layers: Vec<CString>,
}

pub struct RecordedView {
    pub image: vk::Image,
    pub format: vk::Format,
}

#[derive(Default)]
pub struct MockLog {
    /// Successful creates and every destroy, in order.
    pub calls: Vec<Call>,
    /// Surface support snapshots taken.
    pub support_queries: usize,
    pub instance: Option<RecordedInstance>,
    pub device: Option<RecordedDevice>,
    pub plan: Option<SwapchainPlan>,
    pub views: Vec<RecordedView>,
    /// The view at this index of each batch fails. Can be armed between
    /// calls.
    pub fail_view_at: Option<usize>,
    next_view: u64,
}

type SharedLog = Rc<RefCell<MockLog>>;

#[derive(Clone)]
struct Shared {
    config: Rc<MockConfig>,
    log: SharedLog,
}

impl Shared {
    fn attempt(&self, call: Call) -> VkResult<()> {
        if self.config.fail == Some(call) {
            return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
        }
        self.log.borrow_mut().calls.push(call);
        Ok(())
    }

    fn query(&self, query: Query) -> VkResult<()> {
        if self.config.fail_query == Some(query) {
            return Err(vk::Result::ERROR_SURFACE_LOST_KHR);
        }
        Ok(())
    }

    fn query_on(&self, handle: vk::PhysicalDevice, query: Query) -> VkResult<&MockAccelerator> {
        self.query(query)?;
        let accelerator = self.accelerator(handle);
        if accelerator.failing.contains(&query) {
            return Err(vk::Result::ERROR_SURFACE_LOST_KHR);
        }
        Ok(accelerator)
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().calls.push(call);
    }

    fn accelerator(&self, handle: vk::PhysicalDevice) -> &MockAccelerator {
        &self.config.accelerators[handle.as_raw() as usize - 1]
    }
}

pub struct MockDriver {
    shared: Shared,
}

impl MockDriver {
    pub fn new(config: MockConfig) -> (Self, SharedLog) {
        let log = SharedLog::default();
        let shared = Shared {
            config: Rc::new(config),
            log: log.clone(),
        };
        (Self { shared }, log)
    }
}

impl Driver for MockDriver {
    type Instance = MockInstance;

    fn available_layers(&self) -> VkResult<Vec<CString>> {
        Ok(self.shared.config.layers.clone())
    }

    fn presentation_extensions(
        &self,
        _target: &dyn PresentTarget,
    ) -> Result<Vec<CString>, SurfaceError> {
        Ok(presentation_extensions())
    }

    fn create_instance(&self, request: &InstanceRequest<'_>) -> VkResult<MockInstance> {
        self.shared.attempt(Call::CreateInstance)?;
        self.shared.log.borrow_mut().instance = Some(RecordedInstance {
            app_name: request.app_name.to_owned(),
            extensions: request.extensions.to_vec(),
            layers: request.layers.to_vec(),
            chained_messenger: request.messenger.is_some(),
        });
        Ok(MockInstance {
            shared: self.shared.clone(),
        })
    }
}

pub struct MockInstance {
    shared: Shared,
}

impl InstanceDriver for MockInstance {
    type DebugUtils = MockDebugUtils;
    type Device = MockDevice;

    fn debug_utils(&self) -> Option<MockDebugUtils> {
        self.shared
            .config
            .debug_utils_exported
            .then(|| MockDebugUtils {
                shared: self.shared.clone(),
            })
    }

    unsafe fn create_surface(
        &self,
        _target: &dyn PresentTarget,
    ) -> Result<vk::SurfaceKHR, SurfaceError> {
        self.shared.attempt(Call::CreateSurface)?;
        Ok(surface())
    }

    fn enumerate_accelerators(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        self.shared.query(Query::EnumerateAccelerators)?;
        Ok((1..=self.shared.config.accelerators.len() as u64)
            .map(vk::PhysicalDevice::from_raw)
            .collect())
    }

    unsafe fn accelerator_name(&self, accelerator: vk::PhysicalDevice) -> String {
        self.shared.accelerator(accelerator).name.clone()
    }

    unsafe fn queue_families(
        &self,
        accelerator: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        self.shared
            .accelerator(accelerator)
            .families
            .iter()
            .map(|&(queue_flags, _)| vk::QueueFamilyProperties {
                queue_flags,
                queue_count: 1,
                ..Default::default()
            })
            .collect()
    }

    unsafe fn presentation_support(
        &self,
        accelerator: vk::PhysicalDevice,
        family: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        let accelerator = self.shared.query_on(accelerator, Query::PresentationSupport)?;
        Ok(accelerator.families[family as usize].1)
    }

    unsafe fn device_extensions(&self, accelerator: vk::PhysicalDevice) -> VkResult<Vec<CString>> {
        let accelerator = self.shared.query_on(accelerator, Query::DeviceExtensions)?;
        Ok(accelerator.extensions.clone())
    }

    unsafe fn surface_capabilities(
        &self,
        accelerator: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        self.shared.log.borrow_mut().support_queries += 1;
        let accelerator = self.shared.query_on(accelerator, Query::SurfaceCapabilities)?;
        Ok(accelerator.capabilities)
    }

    unsafe fn surface_formats(
        &self,
        accelerator: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        let accelerator = self.shared.query_on(accelerator, Query::SurfaceFormats)?;
        Ok(accelerator.formats.clone())
    }

    unsafe fn present_modes(
        &self,
        accelerator: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        let accelerator = self.shared.query_on(accelerator, Query::PresentModes)?;
        Ok(accelerator.present_modes.clone())
    }

    unsafe fn create_device(
        &self,
        _accelerator: vk::PhysicalDevice,
        request: &DeviceRequest<'_>,
    ) -> VkResult<MockDevice> {
        self.shared.attempt(Call::CreateDevice)?;
        self.shared.log.borrow_mut().device = Some(RecordedDevice {
            queues: request.queues.to_vec(),
            extensions: request.extensions.iter().map(|&e| e.to_owned()).collect(),
            layers: request.layers.to_vec(),
        });
        Ok(MockDevice {
            shared: self.shared.clone(),
            batch: Cell::new(0),
        })
    }

    unsafe fn destroy_surface(&self, _surface: vk::SurfaceKHR) {
        self.shared.record(Call::DestroySurface);
    }

    unsafe fn destroy(self) {
        self.shared.record(Call::DestroyInstance);
    }
}

pub struct MockDebugUtils {
    shared: Shared,
}

impl DebugUtilsDriver for MockDebugUtils {
    unsafe fn create_messenger(
        &self,
        _info: &vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        self.shared.attempt(Call::CreateMessenger)?;
        Ok(vk::DebugUtilsMessengerEXT::from_raw(MESSENGER))
    }

    unsafe fn destroy_messenger(&self, _messenger: vk::DebugUtilsMessengerEXT) {
        self.shared.record(Call::DestroyMessenger);
    }
}

pub struct MockDevice {
    shared: Shared,
    /// Views requested since the last swapchain was created.
    batch: Cell<usize>,
}

impl DeviceDriver for MockDevice {
    unsafe fn queue(&self, family: u32, _index: u32) -> vk::Queue {
        vk::Queue::from_raw(0x100 + u64::from(family))
    }

    unsafe fn create_swapchain(
        &self,
        _surface: vk::SurfaceKHR,
        plan: &SwapchainPlan,
    ) -> VkResult<vk::SwapchainKHR> {
        self.shared.attempt(Call::CreateSwapchain)?;
        self.shared.log.borrow_mut().plan = Some(*plan);
        self.batch.set(0);
        Ok(vk::SwapchainKHR::from_raw(SWAPCHAIN))
    }

    unsafe fn swapchain_images(&self, _swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        self.shared.query(Query::SwapchainImages)?;
        let log = self.shared.log.borrow();
        let planned = log.plan.map_or(0, |p| p.image_count);
        let count = self.shared.config.realized_images.unwrap_or(planned);
        Ok((0..u64::from(count))
            .map(|i| vk::Image::from_raw(0x1000 + i))
            .collect())
    }

    unsafe fn destroy_swapchain(&self, _swapchain: vk::SwapchainKHR) {
        self.shared.record(Call::DestroySwapchain);
    }

    unsafe fn create_image_view(
        &self,
        info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView> {
        let index = self.batch.replace(self.batch.get() + 1);
        let armed = self.shared.log.borrow().fail_view_at;
        if armed == Some(index) {
            return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        }
        self.shared.attempt(Call::CreateImageView)?;

        let mut log = self.shared.log.borrow_mut();
        log.next_view += 1;
        log.views.push(RecordedView {
            image: info.image,
            format: info.format,
        });
        Ok(vk::ImageView::from_raw(0x2000 + log.next_view))
    }

    unsafe fn destroy_image_view(&self, _view: vk::ImageView) {
        self.shared.record(Call::DestroyImageView);
    }

    unsafe fn destroy(self) {
        self.shared.record(Call::DestroyDevice);
    }
}

/// A target with a size but no window behind it.
pub struct HeadlessTarget {
    pub size: RenderSize,
}

impl Default for HeadlessTarget {
    fn default() -> Self {
        Self { size: WINDOW_SIZE }
    }
}

impl HasDisplayHandle for HeadlessTarget {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HasWindowHandle for HeadlessTarget {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl PresentTarget for HeadlessTarget {
    fn size(&self) -> RenderSize {
        self.size
    }
}
