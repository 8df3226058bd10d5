//! Merging the crop track and cues into one render instruction stream.

use std::cmp::Ordering;

use clipsync_models::{Cue, FramedWindow, RenderInstruction, Timeline};
use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Interleaves crop windows and cue show/hide events in time order.
///
/// Inputs are re-validated here: a crop track that does not move strictly
/// forward in time is [`EngineError::MalformedInput`], and cues that overlap
/// are [`EngineError::OverlappingCue`]. Either means an upstream stage broke
/// its contract, so nothing is merged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimelineMux;

impl TimelineMux {
    pub fn new() -> Self {
        Self
    }

    /// Build the final timeline, taking ownership of both tracks.
    pub fn mux(&self, crop_track: Vec<FramedWindow>, cues: Vec<Cue>) -> EngineResult<Timeline> {
        validate_crop_track(&crop_track)?;
        validate_cues(&cues)?;

        let mut instructions = Vec::with_capacity(crop_track.len() + cues.len() * 2);

        instructions.extend(crop_track.iter().map(|fw| RenderInstruction::SetCrop {
            time: fw.time(),
            frame_index: fw.frame.index,
            window: fw.window,
        }));

        for cue in &cues {
            instructions.push(RenderInstruction::ShowCue {
                time: cue.start,
                cue_index: cue.index,
            });
            instructions.push(RenderInstruction::HideCue {
                time: cue.end,
                cue_index: cue.index,
            });
        }

        // Stable: crops keep frame order, cues keep cue order
        instructions.sort_by(compare_instructions);

        debug!(
            crop_instructions = crop_track.len(),
            cue_instructions = cues.len() * 2,
            "Merged render instructions"
        );

        Ok(Timeline {
            crop_track,
            cues,
            instructions,
        })
    }
}

/// Time, then crops before cues, then cue order, then show before hide.
///
/// Cues never overlap, so at a shared timestamp an earlier cue's hide still
/// lands before a later cue's show.
fn compare_instructions(a: &RenderInstruction, b: &RenderInstruction) -> Ordering {
    a.time()
        .total_cmp(&b.time())
        .then_with(|| a.cue_index().cmp(&b.cue_index()))
        .then_with(|| a.rank().cmp(&b.rank()))
}

fn validate_crop_track(crop_track: &[FramedWindow]) -> EngineResult<()> {
    if let Some(fw) = crop_track.iter().find(|fw| !fw.time().is_finite()) {
        return Err(EngineError::malformed_input(format!(
            "crop frame {} has non-finite time",
            fw.frame.index
        )));
    }
    for pair in crop_track.windows(2) {
        if pair[1].time() <= pair[0].time() {
            return Err(EngineError::malformed_input(format!(
                "crop frame {} at {}s does not follow frame {} at {}s",
                pair[1].frame.index,
                pair[1].time(),
                pair[0].frame.index,
                pair[0].time()
            )));
        }
    }
    Ok(())
}

fn validate_cues(cues: &[Cue]) -> EngineResult<()> {
    for (index, cue) in cues.iter().enumerate() {
        if !(cue.start.is_finite() && cue.end.is_finite()) || cue.end < cue.start {
            return Err(EngineError::OverlappingCue {
                index,
                end: cue.end,
                next_start: cue.start,
            });
        }
    }
    for (index, pair) in cues.windows(2).enumerate() {
        if pair[0].end > pair[1].start {
            return Err(EngineError::OverlappingCue {
                index,
                end: pair[0].end,
                next_start: pair[1].start,
            });
        }
    }
    Ok(())
}
