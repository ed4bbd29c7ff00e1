//! Frames-in-flight protocol.
//!
//! [`FramePacer`] owns the bookkeeping for N frame slots and M swapchain
//! images and drives one frame at a time through a [`FrameBackend`]:
//!
//! 1. wait for the current slot's previous submission
//! 2. acquire an image (signals the slot's image-available semaphore)
//! 3. if another slot still owns that image, wait for it too, then take it
//! 4. reset the slot and record its command buffer
//! 5. submit (signals render-finished and the slot's fence)
//! 6. present (waits on render-finished)
//! 7. advance to the next slot
//!
//! The pacer never touches Vulkan itself, so the ordering can be exercised
//! against a simulated GPU.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{trace, warn};

use prism_rhi::RhiError;
use prism_rhi::swapchain::{AcquireResult, PresentResult};

/// Point in the frame at which the surface was found stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStage {
    Acquire,
    Present,
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameStage::Acquire => f.write_str("acquire"),
            FrameStage::Present => f.write_str("present"),
        }
    }
}

/// Per-frame failure.
#[derive(Error, Debug)]
pub enum FrameError {
    /// The swapchain no longer matches the surface.
    #[error("surface out of date during {stage}")]
    SurfaceOutOfDate { stage: FrameStage },

    #[error(transparent)]
    Device(#[from] RhiError),
}

pub type FrameResult<T> = std::result::Result<T, FrameError>;

/// What a call to [`FramePacer::render_frame`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and queued for presentation.
    Presented {
        slot: usize,
        image_index: u32,
        /// The swapchain still works but no longer matches the surface exactly.
        suboptimal: bool,
    },
    /// No image became available in time; nothing was recorded or submitted.
    Skipped,
}

/// GPU side of the protocol, one call per step.
///
/// `slot` is always below the pacer's frame count and `image_index` is always
/// an index returned by the preceding `acquire_image`.
pub trait FrameBackend {
    /// Blocks until the last submission made from `slot` has completed.
    fn wait_for_slot(&mut self, slot: usize) -> FrameResult<()>;

    /// Acquires the next image, signaling `slot`'s image-available semaphore.
    fn acquire_image(&mut self, slot: usize, timeout_ns: u64) -> FrameResult<AcquireResult>;

    /// Returns `slot`'s fence and command buffer to their initial state.
    fn reset_slot(&mut self, slot: usize) -> FrameResult<()>;

    /// Records the frame's commands into `slot`'s command buffer.
    fn record(&mut self, slot: usize, image_index: u32) -> FrameResult<()>;

    /// Submits `slot`'s command buffer, signaling its fence on completion.
    fn submit(&mut self, slot: usize) -> FrameResult<()>;

    /// Queues `image_index` for presentation after `slot`'s rendering.
    fn present(&mut self, slot: usize, image_index: u32) -> FrameResult<PresentResult>;
}

/// Round-robin frame slot index plus the image ownership table.
#[derive(Debug)]
pub struct FramePacer {
    frames_in_flight: usize,
    current: usize,
    /// Slot whose submission last targeted each swapchain image.
    image_owners: Vec<Option<usize>>,
    acquire_timeout_ns: u64,
}

impl FramePacer {
    /// Creates a pacer for `frames_in_flight` slots (at least one) and
    /// `image_count` swapchain images.
    pub fn new(frames_in_flight: usize, image_count: usize, acquire_timeout: Duration) -> Self {
        let acquire_timeout_ns = u64::try_from(acquire_timeout.as_nanos()).unwrap_or(u64::MAX);
        Self {
            frames_in_flight: frames_in_flight.max(1),
            current: 0,
            image_owners: vec![None; image_count],
            acquire_timeout_ns,
        }
    }

    /// Slot the next frame will use.
    #[inline]
    pub fn current_slot(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    #[inline]
    pub fn image_count(&self) -> usize {
        self.image_owners.len()
    }

    /// Slot that last submitted work against `image_index`, if any.
    pub fn image_owner(&self, image_index: u32) -> Option<usize> {
        self.image_owners
            .get(image_index as usize)
            .copied()
            .flatten()
    }

    /// Forgets all image ownership after the swapchain was rebuilt.
    ///
    /// The caller must have idled the device, so no slot is pending.
    pub fn reset_images(&mut self, image_count: usize) {
        self.image_owners.clear();
        self.image_owners.resize(image_count, None);
    }

    /// Drives one frame through `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::SurfaceOutOfDate`] when acquire or present
    /// reports a stale swapchain, and [`FrameError::Device`] for any other
    /// failure, including an image index outside the ownership table. After
    /// an error the slot index has not advanced.
    pub fn render_frame<B: FrameBackend>(&mut self, backend: &mut B) -> FrameResult<FrameOutcome> {
        let slot = self.current;

        backend.wait_for_slot(slot)?;

        let (image_index, acquire_suboptimal) = match backend.acquire_image(slot, self.acquire_timeout_ns)? {
            AcquireResult::Image { index, suboptimal } => (index, suboptimal),
            AcquireResult::OutOfDate => {
                return Err(FrameError::SurfaceOutOfDate {
                    stage: FrameStage::Acquire,
                });
            }
            AcquireResult::Timeout => {
                warn!("No swapchain image available in time, skipping frame");
                return Ok(FrameOutcome::Skipped);
            }
        };

        let image_count = self.image_owners.len();
        let owner = self
            .image_owners
            .get_mut(image_index as usize)
            .ok_or_else(|| {
                RhiError::InvalidHandle(format!(
                    "acquired image index {} but the swapchain has {} images",
                    image_index, image_count
                ))
            })?;

        if let Some(previous) = *owner
            && previous != slot
        {
            trace!(
                "Image {} still owned by slot {}, waiting before reuse",
                image_index, previous
            );
            backend.wait_for_slot(previous)?;
        }
        *owner = Some(slot);

        backend.reset_slot(slot)?;
        backend.record(slot, image_index)?;
        backend.submit(slot)?;

        let present_suboptimal = match backend.present(slot, image_index)? {
            PresentResult::Presented { suboptimal } => suboptimal,
            PresentResult::OutOfDate => {
                return Err(FrameError::SurfaceOutOfDate {
                    stage: FrameStage::Present,
                });
            }
        };

        self.current = (self.current + 1) % self.frames_in_flight;

        trace!("Frame done: slot {}, image {}", slot, image_index);

        Ok(FrameOutcome::Presented {
            slot,
            image_index,
            suboptimal: acquire_suboptimal || present_suboptimal,
        })
    }
}
