// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{CStr, CString};

use ash::ext::debug_utils;
use ember_render::PresentTarget;
use tracing::{debug, info};

use crate::context::PipelineSettings;
use crate::debug::messenger_info;
use crate::driver::{Driver, InstanceRequest};
use crate::error::InitError;

pub const VALIDATION_LAYERS: &[&CStr] = &[c"VK_LAYER_KHRONOS_validation"];
pub const ENGINE_NAME: &CStr = c"No Engine";

/// A created instance plus the layer and extension lists it was created
/// with.
pub struct InstanceBundle<I> {
    pub(crate) instance: I,
    layers: Vec<CString>,
    extensions: Vec<CString>,
}

impl<I> InstanceBundle<I> {
    pub fn layers(&self) -> &[CString] {
        &self.layers
    }

    pub fn extensions(&self) -> &[CString] {
        &self.extensions
    }
}

/// Fails with the first requested layer missing from `available`.
pub fn check_layers(available: &[CString], requested: &[&CStr]) -> Result<(), InitError> {
    match requested
        .iter()
        .find(|name| !available.iter().any(|a| a.as_c_str() == **name))
    {
        Some(missing) => Err(InitError::UnsupportedLayer(
            missing.to_string_lossy().into_owned(),
        )),
        None => Ok(()),
    }
}

/// The window system's extensions, plus debug-utils when diagnostics are on.
pub fn required_extensions(mut presentation: Vec<CString>, diagnostics: bool) -> Vec<CString> {
    if diagnostics {
        presentation.push(debug_utils::NAME.to_owned());
    }
    presentation
}

pub(crate) fn create_instance<D: Driver>(
    driver: &D,
    target: &dyn PresentTarget,
    settings: &PipelineSettings,
) -> Result<InstanceBundle<D::Instance>, InitError> {
    let layers: Vec<CString> = if settings.diagnostics {
        let available = driver
            .available_layers()
            .map_err(InitError::InstanceCreationFailed)?;
        check_layers(&available, VALIDATION_LAYERS)?;
        VALIDATION_LAYERS.iter().map(|&l| l.to_owned()).collect()
    } else {
        Vec::new()
    };

    let presentation = driver
        .presentation_extensions(target)
        .map_err(InitError::SurfaceCreationFailed)?;
    let extensions = required_extensions(presentation, settings.diagnostics);
    debug!(?extensions, ?layers, "instance request");

    let request = InstanceRequest {
        app_name: &settings.app_name,
        engine_name: ENGINE_NAME,
        extensions: &extensions,
        layers: &layers,
        messenger: settings.diagnostics.then(messenger_info),
    };
    let instance = driver
        .create_instance(&request)
        .map_err(InitError::InstanceCreationFailed)?;
    info!(
        "Vulkan instance ready ({} extensions, {} layers)",
        extensions.len(),
        layers.len()
    );

    Ok(InstanceBundle {
        instance,
        layers,
        extensions,
    })
}
