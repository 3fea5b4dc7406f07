// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
mod config;

use std::ffi::CString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ember_core::init_tracing;
use ember_platform::AppWindow;
use ember_render::{RenderSize, WINDOW_SIZE};
use ember_render_vk::{AshDriver, DiagnosticsFailure, InitError, PipelineSettings, VulkanContext};
use tracing::{error, info, warn};

use ember_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::WindowId,
};

use crate::config::AppCfg;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file; defaults apply if it does not exist
    #[arg(long, default_value = "ember.toml")]
    config: PathBuf,
}

struct App {
    title: String,
    settings: PipelineSettings,
    // drops before `window`: the surface must go first
    gpu: Option<VulkanContext>,
    window: Option<AppWindow>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn bring_up(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = self.window.insert(
            AppWindow::open(event_loop, &self.title, WINDOW_SIZE)
                .context("failed to create window")?,
        );
        let gpu = VulkanContext::new(AshDriver::linked(), &*window, &self.settings)?;
        self.gpu = Some(gpu);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.gpu = None;
        self.window = None;
        self.failure = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if self.window.is_some() || self.failure.is_some() {
            return;
        }
        if let Err(e) = self.bring_up(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = &mut self.window else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("CloseRequested");
                self.gpu = None;
                self.window = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                let size = RenderSize {
                    width: new_size.width,
                    height: new_size.height,
                };
                if size.width == 0 || size.height == 0 || !window.set_size(size) {
                    return;
                }
                info!("Resized to {}x{}", size.width, size.height);
                if let Some(gpu) = &mut self.gpu {
                    if let Err(e) = gpu.rebuild_swapchain(size) {
                        self.fail(event_loop, e.into());
                    }
                }
            }

            _ => {}
        }
    }
}

fn hint(err: &InitError) -> Option<&'static str> {
    match err {
        InitError::UnsupportedLayer(_) => {
            Some("install the Khronos validation layer, or run a release build")
        }
        InitError::DiagnosticsSetupFailed(DiagnosticsFailure::Unavailable) => {
            Some("the driver has no VK_EXT_debug_utils support; run a release build")
        }
        InitError::NoAcceleratorFound => Some("no Vulkan-capable driver is installed"),
        InitError::NoSuitableAccelerator => {
            Some("no GPU offers graphics, presentation and a usable swapchain for this window")
        }
        _ => None,
    }
}

fn log_failure(err: &anyhow::Error) {
    match err.downcast_ref::<InitError>() {
        Some(init) => {
            error!("GPU bring-up failed at the {} stage: {init}", init.stage());
            if let Some(hint) = hint(init) {
                warn!("{hint}");
            }
        }
        None => error!("{err:#}"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = AppCfg::load(&args.config)?;
    init_tracing(&cfg.log.filter);

    let settings = PipelineSettings::new(
        CString::new(cfg.app.name).context("application name contains a NUL byte")?,
    );
    info!(
        "diagnostics {}",
        if settings.diagnostics { "on" } else { "off" }
    );

    let event_loop: EventLoop<()> = EventLoop::new()?;
    let mut app = App {
        title: cfg.window.title,
        settings,
        gpu: None,
        window: None,
        failure: None,
    };
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.failure.take() {
        log_failure(&err);
        return Err(err);
    }
    Ok(())
}
