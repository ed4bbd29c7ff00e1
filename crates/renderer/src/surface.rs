//! Surface policy decisions around a frame.
//!
//! [`plan_frame`] runs before the pacer and [`resolve_outcome`] after it.
//! Both are pure so every combination of window state, frame result and
//! [`SurfacePolicy`] can be checked without a GPU.

use crate::config::SurfacePolicy;
use crate::pacer::{FrameError, FrameOutcome, FrameResult, FrameStage};

/// What to do before handing the frame to the pacer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePlan {
    /// The window has no area; nothing can be presented.
    Skip,
    /// Rebuild the swapchain, then render.
    Rebuild,
    Render,
}

/// What to do with the pacer's result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceAction {
    /// Return the outcome as is.
    Done(FrameOutcome),
    /// Return the outcome and rebuild before the next frame.
    RebuildBeforeNext(FrameOutcome),
    /// Rebuild now; the frame was not presented.
    RebuildNow { stage: FrameStage },
}

/// Decides whether the next frame renders, and whether a pending rebuild
/// runs first.
pub fn plan_frame(policy: SurfacePolicy, width: u32, height: u32, rebuild_pending: bool) -> FramePlan {
    if width == 0 || height == 0 {
        FramePlan::Skip
    } else if rebuild_pending && policy == SurfacePolicy::Recreate {
        FramePlan::Rebuild
    } else {
        FramePlan::Render
    }
}

/// Maps the pacer's result onto `policy`.
///
/// # Errors
///
/// Device errors always pass through. [`FrameError::SurfaceOutOfDate`] passes
/// through under [`SurfacePolicy::Fatal`].
pub fn resolve_outcome(policy: SurfacePolicy, result: FrameResult<FrameOutcome>) -> FrameResult<SurfaceAction> {
    match (result, policy) {
        (Ok(outcome @ FrameOutcome::Presented { suboptimal: true, .. }), SurfacePolicy::Recreate) => {
            Ok(SurfaceAction::RebuildBeforeNext(outcome))
        }
        (Err(FrameError::SurfaceOutOfDate { stage }), SurfacePolicy::Recreate) => {
            Ok(SurfaceAction::RebuildNow { stage })
        }
        (result, _) => result.map(SurfaceAction::Done),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_rhi::RhiError;
    use prism_rhi::vk;

    fn presented(suboptimal: bool) -> FrameOutcome {
        FrameOutcome::Presented {
            slot: 1,
            image_index: 2,
            suboptimal,
        }
    }

    fn out_of_date(stage: FrameStage) -> FrameResult<FrameOutcome> {
        Err(FrameError::SurfaceOutOfDate { stage })
    }

    #[test]
    fn test_zero_extent_skips_under_both_policies() {
        for policy in [SurfacePolicy::Fatal, SurfacePolicy::Recreate] {
            assert_eq!(plan_frame(policy, 0, 720, true), FramePlan::Skip);
            assert_eq!(plan_frame(policy, 1280, 0, false), FramePlan::Skip);
        }
    }

    #[test]
    fn test_pending_rebuild_runs_only_under_recreate() {
        assert_eq!(plan_frame(SurfacePolicy::Recreate, 800, 600, true), FramePlan::Rebuild);
        assert_eq!(plan_frame(SurfacePolicy::Fatal, 800, 600, true), FramePlan::Render);
        assert_eq!(plan_frame(SurfacePolicy::Recreate, 800, 600, false), FramePlan::Render);
    }

    #[test]
    fn test_fatal_passes_out_of_date_through() {
        for stage in [FrameStage::Acquire, FrameStage::Present] {
            let result = resolve_outcome(SurfacePolicy::Fatal, out_of_date(stage));
            assert!(matches!(
                result,
                Err(FrameError::SurfaceOutOfDate { stage: s }) if s == stage
            ));
        }
    }

    #[test]
    fn test_recreate_rebuilds_now_on_out_of_date() {
        let action = resolve_outcome(SurfacePolicy::Recreate, out_of_date(FrameStage::Present)).unwrap();
        assert_eq!(
            action,
            SurfaceAction::RebuildNow {
                stage: FrameStage::Present
            }
        );
    }

    #[test]
    fn test_suboptimal_schedules_rebuild_only_under_recreate() {
        let action = resolve_outcome(SurfacePolicy::Recreate, Ok(presented(true))).unwrap();
        assert_eq!(action, SurfaceAction::RebuildBeforeNext(presented(true)));

        let action = resolve_outcome(SurfacePolicy::Fatal, Ok(presented(true))).unwrap();
        assert_eq!(action, SurfaceAction::Done(presented(true)));
    }

    #[test]
    fn test_clean_frames_are_done() {
        for policy in [SurfacePolicy::Fatal, SurfacePolicy::Recreate] {
            let action = resolve_outcome(policy, Ok(presented(false))).unwrap();
            assert_eq!(action, SurfaceAction::Done(presented(false)));

            let action = resolve_outcome(policy, Ok(FrameOutcome::Skipped)).unwrap();
            assert_eq!(action, SurfaceAction::Done(FrameOutcome::Skipped));
        }
    }

    #[test]
    fn test_device_errors_pass_through_under_both_policies() {
        for policy in [SurfacePolicy::Fatal, SurfacePolicy::Recreate] {
            let result = Err(FrameError::Device(RhiError::VulkanError(
                vk::Result::ERROR_DEVICE_LOST,
            )));
            assert!(matches!(
                resolve_outcome(policy, result),
                Err(FrameError::Device(_))
            ));
        }
    }

    #[test]
    fn test_only_recreate_follows_window_size() {
        assert!(SurfacePolicy::Recreate.follows_window());
        assert!(!SurfacePolicy::Fatal.follows_window());
    }
}
