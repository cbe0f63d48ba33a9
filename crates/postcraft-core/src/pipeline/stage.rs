//! The post-creation stage machine.
//!
//! ```text
//! Upload ──media accepted──▶ Crop ◀──▶ Edit ◀──▶ Final ──share──▶ Submitting
//!                             │                                     │
//!                             └─back: discard prompt (Back)         └─failure: Final
//! ```
//!
//! Any close request while media is selected raises the discard prompt with
//! [`DiscardIntent::Close`] instead of closing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PipelineError, PipelineResult};

/// One step of the post-creation flow. Ordered for forward navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    Upload,
    Crop,
    Edit,
    Final,
    Submitting,
}

impl Stage {
    /// Header title shown for the stage.
    pub fn title(&self) -> &'static str {
        match self {
            Stage::Upload => "Create new post",
            Stage::Crop => "Crop",
            Stage::Edit => "Edit",
            Stage::Final => "Create new post",
            Stage::Submitting => "Sharing",
        }
    }

    /// Which header controls the stage shows.
    pub fn header(&self) -> HeaderControls {
        HeaderControls {
            title: self.title(),
            back: matches!(self, Stage::Crop | Stage::Edit | Stage::Final),
            next: matches!(self, Stage::Crop | Stage::Edit),
            share: *self == Stage::Final,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Upload => "upload",
            Stage::Crop => "crop",
            Stage::Edit => "edit",
            Stage::Final => "final",
            Stage::Submitting => "submitting",
        };
        f.write_str(name)
    }
}

/// Header layout for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderControls {
    pub title: &'static str,
    pub back: bool,
    pub next: bool,
    pub share: bool,
}

/// Why the discard prompt is showing; decides what confirming it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscardIntent {
    Close,
    Back,
}

/// Result of a "Back" action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// Moved one stage back
    Moved(Stage),
    /// Back from Crop: the discard prompt is now showing
    DiscardPrompt,
    /// Nothing to go back to, or navigation is blocked
    Ignored,
}

/// Result of a close request (close control, outside click, Escape).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// No media: close immediately
    Close,
    /// Media selected: the discard prompt is now showing
    DiscardPrompt,
    /// A submission is in flight
    Ignored,
}

/// What confirming the discard prompt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardEffect {
    /// Invoke the external close callback
    Close,
    /// Clear the selection and go back to Upload
    ResetToUpload,
}

/// Stage plus the pending discard prompt.
#[derive(Debug, Default)]
pub struct StageMachine {
    stage: Stage,
    pending_discard: Option<DiscardIntent>,
}

impl StageMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The intent of the discard prompt, if it is showing.
    pub fn pending_discard(&self) -> Option<DiscardIntent> {
        self.pending_discard
    }

    pub fn is_submitting(&self) -> bool {
        self.stage == Stage::Submitting
    }

    /// A valid file was accepted: jump to Crop.
    pub fn media_accepted(&mut self) -> PipelineResult<()> {
        self.ensure_interactive("select media")?;
        self.transition(Stage::Crop);
        Ok(())
    }

    /// Explicit "Next": Crop → Edit → Final.
    pub fn next(&mut self) -> PipelineResult<Stage> {
        self.ensure_interactive("go to the next stage")?;
        let target = match self.stage {
            Stage::Crop => Stage::Edit,
            Stage::Edit => Stage::Final,
            other => {
                return Err(PipelineError::InvalidStage {
                    action: "go to the next stage".to_string(),
                    stage: other.to_string(),
                })
            }
        };
        self.transition(target);
        Ok(target)
    }

    /// Explicit "Back". Leaving Crop asks for confirmation first.
    pub fn back(&mut self) -> BackOutcome {
        if self.pending_discard.is_some() {
            return BackOutcome::Ignored;
        }
        match self.stage {
            Stage::Crop => {
                self.raise_discard(DiscardIntent::Back);
                BackOutcome::DiscardPrompt
            }
            Stage::Edit => {
                self.transition(Stage::Crop);
                BackOutcome::Moved(Stage::Crop)
            }
            Stage::Final => {
                self.transition(Stage::Edit);
                BackOutcome::Moved(Stage::Edit)
            }
            Stage::Upload | Stage::Submitting => BackOutcome::Ignored,
        }
    }

    /// A close request from any source.
    pub fn request_close(&mut self, has_media: bool) -> CloseOutcome {
        if self.is_submitting() {
            return CloseOutcome::Ignored;
        }
        if has_media {
            self.raise_discard(DiscardIntent::Close);
            CloseOutcome::DiscardPrompt
        } else {
            CloseOutcome::Close
        }
    }

    /// "Discard" on the prompt. Consumes the intent; `None` if no prompt was showing.
    pub fn confirm_discard(&mut self) -> Option<DiscardEffect> {
        let intent = self.pending_discard.take()?;
        tracing::debug!("Discard confirmed ({intent:?})");
        Some(match intent {
            DiscardIntent::Close => DiscardEffect::Close,
            DiscardIntent::Back => {
                self.transition(Stage::Upload);
                DiscardEffect::ResetToUpload
            }
        })
    }

    /// "Cancel" on the prompt: nothing else changes.
    pub fn cancel_discard(&mut self) -> bool {
        self.pending_discard.take().is_some()
    }

    /// "Share": Final → Submitting.
    pub fn begin_submit(&mut self) -> PipelineResult<()> {
        self.ensure_interactive("share")?;
        if self.stage != Stage::Final {
            return Err(PipelineError::InvalidStage {
                action: "share".to_string(),
                stage: self.stage.to_string(),
            });
        }
        self.transition(Stage::Submitting);
        Ok(())
    }

    /// A submission failed: back to the caption stage so the user can retry.
    pub fn submit_failed(&mut self) {
        if self.is_submitting() {
            self.transition(Stage::Final);
        }
    }

    fn raise_discard(&mut self, intent: DiscardIntent) {
        tracing::debug!("Discard prompt raised ({intent:?}) at {}", self.stage);
        self.pending_discard = Some(intent);
    }

    fn ensure_interactive(&self, action: &str) -> PipelineResult<()> {
        if self.is_submitting() {
            return Err(PipelineError::InvalidStage {
                action: action.to_string(),
                stage: self.stage.to_string(),
            });
        }
        if self.pending_discard.is_some() {
            return Err(PipelineError::InvalidStage {
                action: action.to_string(),
                stage: format!("{} (discard prompt open)", self.stage),
            });
        }
        Ok(())
    }

    fn transition(&mut self, to: Stage) {
        if self.stage != to {
            tracing::debug!("Stage {} -> {}", self.stage, to);
        }
        self.stage = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(stage: Stage) -> StageMachine {
        StageMachine {
            stage,
            pending_discard: None,
        }
    }

    #[test]
    fn test_media_accepted_jumps_to_crop() {
        let mut machine = StageMachine::new();
        machine.media_accepted().unwrap();
        assert_eq!(machine.stage(), Stage::Crop);
    }

    #[test]
    fn test_forward_and_backward() {
        let mut machine = at(Stage::Crop);
        assert_eq!(machine.next().unwrap(), Stage::Edit);
        assert_eq!(machine.next().unwrap(), Stage::Final);
        assert!(machine.next().is_err());
        assert_eq!(machine.back(), BackOutcome::Moved(Stage::Edit));
        assert_eq!(machine.back(), BackOutcome::Moved(Stage::Crop));
    }

    #[test]
    fn test_next_from_upload_rejected() {
        let mut machine = StageMachine::new();
        let err = machine.next().unwrap_err();
        assert!(err.to_string().contains("upload"));
    }

    #[test]
    fn test_back_from_crop_raises_prompt() {
        let mut machine = at(Stage::Crop);
        assert_eq!(machine.back(), BackOutcome::DiscardPrompt);
        assert_eq!(machine.pending_discard(), Some(DiscardIntent::Back));
        assert_eq!(machine.stage(), Stage::Crop);

        assert!(machine.cancel_discard());
        assert_eq!(machine.stage(), Stage::Crop);
        assert_eq!(machine.pending_discard(), None);
    }

    #[test]
    fn test_confirm_back_resets_to_upload_once() {
        let mut machine = at(Stage::Crop);
        machine.back();
        assert_eq!(machine.confirm_discard(), Some(DiscardEffect::ResetToUpload));
        assert_eq!(machine.stage(), Stage::Upload);
        assert_eq!(machine.confirm_discard(), None);
    }

    #[test]
    fn test_close_without_media_is_immediate() {
        let mut machine = StageMachine::new();
        assert_eq!(machine.request_close(false), CloseOutcome::Close);
        assert_eq!(machine.pending_discard(), None);
    }

    #[test]
    fn test_close_with_media_prompts() {
        let mut machine = at(Stage::Edit);
        assert_eq!(machine.request_close(true), CloseOutcome::DiscardPrompt);
        assert_eq!(machine.confirm_discard(), Some(DiscardEffect::Close));
        assert_eq!(machine.stage(), Stage::Edit);
    }

    #[test]
    fn test_close_overrides_back_intent() {
        let mut machine = at(Stage::Crop);
        machine.back();
        machine.request_close(true);
        assert_eq!(machine.pending_discard(), Some(DiscardIntent::Close));
    }

    #[test]
    fn test_prompt_blocks_navigation() {
        let mut machine = at(Stage::Edit);
        machine.request_close(true);
        assert!(machine.next().is_err());
        assert_eq!(machine.back(), BackOutcome::Ignored);
        assert_eq!(machine.stage(), Stage::Edit);
    }

    #[test]
    fn test_submitting_is_terminal_until_failure() {
        let mut machine = at(Stage::Final);
        machine.begin_submit().unwrap();
        assert_eq!(machine.stage(), Stage::Submitting);
        assert_eq!(machine.back(), BackOutcome::Ignored);
        assert!(machine.next().is_err());
        assert!(machine.media_accepted().is_err());
        assert_eq!(machine.request_close(true), CloseOutcome::Ignored);

        machine.submit_failed();
        assert_eq!(machine.stage(), Stage::Final);
    }

    #[test]
    fn test_share_only_from_final() {
        let mut machine = at(Stage::Edit);
        assert!(machine.begin_submit().is_err());
        assert_eq!(machine.stage(), Stage::Edit);
    }

    #[test]
    fn test_header_controls() {
        assert_eq!(
            Stage::Upload.header(),
            HeaderControls {
                title: "Create new post",
                back: false,
                next: false,
                share: false
            }
        );
        assert!(Stage::Crop.header().next);
        assert!(Stage::Final.header().share);
        assert!(!Stage::Final.header().next);
        assert!(!Stage::Submitting.header().back);
    }
}
