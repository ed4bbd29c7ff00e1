//! The demo window and its Vulkan surface.

use std::ffi::{CStr, c_char};

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window as WinitWindow, WindowAttributes};

use prism_core::{Error, Result};

/// A `VkSurfaceKHR` plus the loader that destroys it. Drop it before the
/// instance it was created from.
pub struct Surface {
    handle: vk::SurfaceKHR,
    loader: ash::khr::surface::Instance,
}

impl Surface {
    #[inline]
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    #[inline]
    pub fn loader(&self) -> &ash::khr::surface::Instance {
        &self.loader
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        // SAFETY: created by ash_window on the loader's instance and
        // destroyed only here.
        unsafe { self.loader.destroy_surface(self.handle, None) };
        tracing::debug!("Destroyed surface");
    }
}

/// Resizable window with its last known inner size in physical pixels.
pub struct Window {
    window: WinitWindow,
    width: u32,
    height: u32,
}

impl Window {
    /// Opens a window asking for a `width` x `height` inner size.
    ///
    /// The platform may pick another size; [`Window::width`] and
    /// [`Window::height`] report the one actually granted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Window`] if winit cannot create the window.
    pub fn new(event_loop: &ActiveEventLoop, width: u32, height: u32, title: &str) -> Result<Self> {
        let attributes = WindowAttributes::default()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(true);

        let window = event_loop
            .create_window(attributes)
            .map_err(|e| Error::Window(format!("cannot open window: {}", e)))?;

        let PhysicalSize { width, height } = window.inner_size();
        tracing::info!("Opened window '{}' at {}x{}", title, width, height);

        Ok(Self {
            window,
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        tracing::debug!("Window now {}x{}", width, height);
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    fn raw_handles(&self) -> Result<(RawDisplayHandle, RawWindowHandle)> {
        let display = self
            .window
            .display_handle()
            .map_err(|e| Error::Window(format!("display handle unavailable: {}", e)))?;
        let window = self
            .window
            .window_handle()
            .map_err(|e| Error::Window(format!("window handle unavailable: {}", e)))?;
        Ok((display.as_raw(), window.as_raw()))
    }

    /// Instance extensions a surface on this window's platform needs.
    ///
    /// # Errors
    ///
    /// Returns an error if the handles are unavailable or `ash-window` does
    /// not support the platform.
    pub fn required_extensions(&self) -> Result<Vec<*const c_char>> {
        let (display, _) = self.raw_handles()?;
        let extensions = ash_window::enumerate_required_extensions(display)
            .map_err(|e| Error::Vulkan(format!("no surface support for this platform: {}", e)))?;

        tracing::debug!(
            "Surface extensions: {:?}",
            extensions
                .iter()
                // SAFETY: ash-window returns static NUL-terminated names.
                .map(|&name| unsafe { CStr::from_ptr(name) })
                .collect::<Vec<_>>()
        );

        Ok(extensions.to_vec())
    }

    /// Creates a surface for this window on `instance`.
    ///
    /// The window must outlive the returned surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the handles are unavailable or surface creation
    /// fails.
    pub fn create_surface(&self, entry: &ash::Entry, instance: &ash::Instance) -> Result<Surface> {
        let (display, window) = self.raw_handles()?;

        // SAFETY: entry and instance are live and the raw handles belong to
        // this window.
        let handle = unsafe { ash_window::create_surface(entry, instance, display, window, None) }
            .map_err(|e| Error::Vulkan(format!("surface creation failed: {}", e)))?;

        tracing::info!("Created Vulkan surface");

        Ok(Surface {
            handle,
            loader: ash::khr::surface::Instance::new(entry, instance),
        })
    }
}
