// SPDX-License-Identifier: CEPL-1.0
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Fixed size of the window the pipeline presents to.
pub const WINDOW_SIZE: RenderSize = RenderSize {
    width: 800,
    height: 600,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

/// Something a backend can bind a presentation surface to.
///
/// The handles are borrowed only for the duration of surface creation; the
/// implementor must outlive any surface created from it.
pub trait PresentTarget: HasDisplayHandle + HasWindowHandle {
    /// Size the swapchain should aim for when the surface leaves the choice
    /// to the application.
    fn size(&self) -> RenderSize;
}
