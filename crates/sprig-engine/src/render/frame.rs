use std::time::Instant;

use crate::coords::Color;
use crate::device::RenderDevice;
use crate::error::RenderError;

use super::renderer::Renderer;

/// Counters for one frame, returned by [`Renderer::end_frame`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub sprites: u32,
}

impl<D: RenderDevice> Renderer<D> {
    /// Opens a frame and clears the target to `clear`.
    ///
    /// Before any draw work this polls the shader file for changes and
    /// resizes the device if the window size changed.
    pub fn begin_frame(&mut self, clear: Color) -> Result<(), RenderError> {
        self.begin_frame_at(clear, Instant::now())
    }

    pub(crate) fn begin_frame_at(&mut self, clear: Color, now: Instant) -> Result<(), RenderError> {
        if self.frame_open {
            return Err(RenderError::FrameInProgress);
        }
        self.stats = FrameStats::default();

        if self.config.hot_reload {
            self.shaders
                .poll_hot_reload(now, &mut self.device, self.files.as_ref());
        }

        let size = self.device.window_size();
        if size != self.window_size {
            log::debug!(
                "window resized {}x{} -> {}x{}",
                self.window_size.width,
                self.window_size.height,
                size.width,
                size.height
            );
            self.device.resize(size);
            self.window_size = size;
        }

        self.device.begin_frame(clear)?;
        self.frame_open = true;
        Ok(())
    }

    /// Flushes the open batch and presents. `vsync` picks the present mode.
    ///
    /// The frame is closed even if flushing or presenting fails.
    pub fn end_frame(&mut self, vsync: bool) -> Result<FrameStats, RenderError> {
        if !self.frame_open {
            return Err(RenderError::NoFrameInProgress);
        }
        self.frame_open = false;

        let flushed = self.flush();
        let presented = self.device.present(vsync);
        flushed?;
        presented?;
        Ok(self.stats)
    }
}
