// SPDX-License-Identifier: CEPL-1.0
pub use winit;

use ember_render::{PresentTarget, RenderSize};
use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
};
use tracing::info;
use winit::{
    dpi::PhysicalSize,
    error::OsError,
    event_loop::ActiveEventLoop,
    window::{Window, WindowAttributes, WindowId},
};

pub fn window_attributes(title: &str, size: RenderSize) -> WindowAttributes {
    Window::default_attributes()
        .with_title(title)
        .with_inner_size(PhysicalSize::new(size.width, size.height))
        .with_resizable(false)
}

/// A native window plus the size the renderer should target for it.
pub struct AppWindow {
    window: Window,
    size: RenderSize,
}

impl AppWindow {
    pub fn open(event_loop: &ActiveEventLoop, title: &str, size: RenderSize) -> Result<Self, OsError> {
        let window = event_loop.create_window(window_attributes(title, size))?;
        info!("window open ({}x{}, {title:?})", size.width, size.height);
        Ok(Self { window, size })
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }

    /// Records a size reported by the platform. Returns `true` if it changed.
    pub fn set_size(&mut self, size: RenderSize) -> bool {
        let changed = self.size != size;
        self.size = size;
        changed
    }
}

impl HasDisplayHandle for AppWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl HasWindowHandle for AppWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl PresentTarget for AppWindow {
    fn size(&self) -> RenderSize {
        self.size
    }
}
