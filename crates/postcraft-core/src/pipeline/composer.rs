//! The post composer: one value a host feeds events into.
//!
//! [`PostComposer`] owns the stage machine, the current selection, the pan
//! state, the filter, the caption and the modal session (outside-click and
//! Escape listeners plus the scroll lock). Hosts call the event methods and
//! read state back through the accessors.
//!
//! Sharing is split so the host can render the loading state while the
//! collaborators run:
//!
//! ```rust,ignore
//! let job = composer.begin_share()?;      // stage is now Submitting
//! let result = job.run(&stores).await;    // decode, rasterize, upload, write
//! composer.finish_share(&result);         // close, or back to Final with the error
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::{Config, ExportConfig, LimitsConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::storage::Collaborators;
use crate::types::{allocate_post_id, PostRecord};

use super::caption::Caption;
use super::decode::ImageDecoder;
use super::drag::{DragController, PointerDevice};
use super::filter::Filter;
use super::geometry::{
    alignment_grid, compute_crop_region, cover_layout, CropRegion, DragAxis, PanOffset, Point,
    Size, ViewportGeometry,
};
use super::ingest::{IncomingFile, Ingestor, MediaKind, MediaSelection, MediaSource};
use super::raster::Rasterizer;
use super::stage::{
    BackOutcome, CloseOutcome, DiscardEffect, DiscardIntent, HeaderControls, Stage, StageMachine,
};
use super::surface::{HostSurface, ModalSession};

type CloseCallback = Box<dyn FnMut() + Send>;

/// The post-creation modal.
pub struct PostComposer {
    author_id: String,
    key_prefix: String,
    limits: LimitsConfig,
    export: ExportConfig,
    ingestor: Ingestor,
    surface: Arc<dyn HostSurface>,
    /// Present while the modal is open
    session: Option<ModalSession>,
    machine: StageMachine,
    selection: Option<MediaSelection>,
    drag: DragController,
    filter: Filter,
    caption: Caption,
    error: Option<String>,
    file_drag_hover: bool,
    on_close: Option<CloseCallback>,
}

impl PostComposer {
    /// Open the modal: attaches the outside-click and Escape listeners and
    /// locks page scrolling until it closes.
    pub fn open(config: &Config, surface: Arc<dyn HostSurface>) -> Self {
        tracing::debug!("Composer opened for {}", config.profile.author_id);
        Self {
            author_id: config.profile.author_id.clone(),
            key_prefix: config.storage.key_prefix.clone(),
            limits: config.limits.clone(),
            export: config.export.clone(),
            ingestor: Ingestor::new(config.limits.clone()),
            session: Some(ModalSession::open(&surface)),
            surface,
            machine: StageMachine::new(),
            selection: None,
            drag: DragController::new(),
            filter: Filter::Original,
            caption: Caption::new(),
            error: None,
            file_drag_hover: false,
            on_close: None,
        }
    }

    /// Called once when the modal closes (no media, confirmed discard, or a
    /// successful share). Not called when the composer is just dropped.
    pub fn with_close_callback(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(callback));
        self
    }

    // --- Observable state ---

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn stage(&self) -> Stage {
        self.machine.stage()
    }

    pub fn header(&self) -> HeaderControls {
        self.machine.stage().header()
    }

    /// True while a submission is in flight.
    pub fn is_loading(&self) -> bool {
        self.machine.is_submitting()
    }

    pub fn pending_discard(&self) -> Option<DiscardIntent> {
        self.machine.pending_discard()
    }

    /// The error currently shown inline, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selection(&self) -> Option<&MediaSelection> {
        self.selection.as_ref()
    }

    pub fn is_file_drag_hover(&self) -> bool {
        self.file_drag_hover
    }

    pub fn drag_axis(&self) -> DragAxis {
        self.drag.axis()
    }

    pub fn pan_offset(&self) -> PanOffset {
        self.drag.offset()
    }

    /// CSS transform of the preview image.
    pub fn preview_transform(&self) -> String {
        self.drag.offset().css_transform()
    }

    pub fn grid_visible(&self) -> bool {
        self.drag.grid_visible()
    }

    /// Line positions of the alignment grid while it is visible.
    pub fn alignment_grid(&self) -> Option<([f64; 2], [f64; 2])> {
        let geometry = self.drag.geometry()?;
        self.drag
            .grid_visible()
            .then(|| alignment_grid(geometry.container))
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// CSS filter of the live preview.
    pub fn preview_filter_css(&self) -> String {
        self.filter.css()
    }

    pub fn caption(&self) -> &Caption {
        &self.caption
    }

    /// Source-pixel rectangle the current pan would export, once the preview
    /// has been measured.
    pub fn crop_region(&self) -> Option<CropRegion> {
        let natural = self.selection.as_ref()?.natural_size()?;
        let geometry = self.drag.geometry()?;
        Some(compute_crop_region(
            self.drag.offset(),
            geometry.container,
            natural,
            geometry.image,
        ))
    }

    // --- Ingestion ---

    /// A file arrived from the picker or a drop.
    ///
    /// Both sources follow the same rule: a valid file replaces the selection,
    /// resets pan and filter, and moves to Crop; an invalid file leaves any
    /// existing selection alone and surfaces the error.
    pub fn select_file(&mut self, file: IncomingFile, source: MediaSource) -> PipelineResult<()> {
        if source == MediaSource::Drop {
            self.file_drag_hover = false;
        }
        self.ensure_interactive("select media")?;

        let selection = match self.ingestor.accept_file(file) {
            Ok(selection) => selection,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        self.machine.media_accepted()?;
        self.drag.reset(selection.drag_axis());
        self.filter = Filter::Original;
        self.error = None;
        tracing::debug!(
            "Selected {} via {:?} (axis {})",
            selection.file_name,
            source,
            selection.drag_axis()
        );
        self.selection = Some(selection);
        Ok(())
    }

    /// A file is being dragged over the modal.
    pub fn file_drag_over(&mut self) {
        if self.is_open() && !self.is_loading() {
            self.file_drag_hover = true;
        }
    }

    pub fn file_drag_leave(&mut self) {
        self.file_drag_hover = false;
    }

    // --- Crop ---

    /// The preview finished layout with the given measured geometry.
    ///
    /// Re-measuring the same selection keeps its pan offset. Ignored while a
    /// submission is in flight, since its crop is already frozen.
    pub fn image_rendered(&mut self, geometry: ViewportGeometry) {
        if self.is_loading() {
            return;
        }
        if self.selection.as_ref().is_some_and(MediaSelection::is_image) {
            tracing::trace!(
                "Preview measured: image {}x{}, container {}x{}",
                geometry.image.width,
                geometry.image.height,
                geometry.container.width,
                geometry.container.height
            );
            self.drag.set_geometry(geometry);
        }
    }

    /// Lay the preview out in `container` without a layout engine.
    pub fn layout_in(&mut self, container: Size) -> Option<ViewportGeometry> {
        let natural = self.selection.as_ref()?.natural_size()?;
        let geometry = cover_layout(natural, container);
        self.image_rendered(geometry);
        Some(geometry)
    }

    /// Pointer or single touch pressed over the crop viewport.
    pub fn pointer_down(&mut self, position: Point, device: PointerDevice) -> bool {
        if self.ensure_stage(Stage::Crop, "pan").is_err() {
            return false;
        }
        self.drag.begin(position, device, &self.surface)
    }

    pub fn pointer_move(&mut self, position: Point) -> Option<PanOffset> {
        self.drag.move_to(position)
    }

    /// Pointer released or touch ended.
    pub fn pointer_up(&mut self) -> bool {
        self.drag.end()
    }

    // --- Navigation ---

    pub fn next(&mut self) -> PipelineResult<Stage> {
        self.ensure_open("go to the next stage")?;
        self.drag.end();
        let stage = self.machine.next()?;
        self.error = None;
        Ok(stage)
    }

    pub fn back(&mut self) -> BackOutcome {
        if !self.is_open() {
            return BackOutcome::Ignored;
        }
        self.drag.end();
        let outcome = self.machine.back();
        if let BackOutcome::Moved(_) = outcome {
            self.error = None;
        }
        outcome
    }

    /// The close control was pressed.
    pub fn request_close(&mut self) -> CloseOutcome {
        if !self.is_open() {
            return CloseOutcome::Ignored;
        }
        self.drag.end();
        let outcome = self.machine.request_close(self.selection.is_some());
        if outcome == CloseOutcome::Close {
            self.close();
        }
        outcome
    }

    /// A click landed outside the modal.
    pub fn click_outside(&mut self) -> CloseOutcome {
        self.request_close()
    }

    /// Escape was pressed.
    pub fn escape(&mut self) -> CloseOutcome {
        self.request_close()
    }

    /// "Discard" on the confirmation prompt.
    pub fn confirm_discard(&mut self) -> Option<DiscardEffect> {
        let effect = self.machine.confirm_discard()?;
        match effect {
            DiscardEffect::Close => self.close(),
            DiscardEffect::ResetToUpload => self.clear_media(),
        }
        Some(effect)
    }

    /// "Cancel" on the confirmation prompt.
    pub fn cancel_discard(&mut self) -> bool {
        self.machine.cancel_discard()
    }

    // --- Edit ---

    pub fn select_filter(&mut self, filter: Filter) -> PipelineResult<()> {
        self.ensure_stage(Stage::Edit, "choose a filter")?;
        tracing::debug!("Filter {} -> {}", self.filter, filter);
        self.filter = filter;
        Ok(())
    }

    // --- Caption ---

    /// Type at the caption cursor. Returns how many chars fit.
    pub fn type_caption(&mut self, text: &str) -> PipelineResult<usize> {
        self.ensure_stage(Stage::Final, "edit the caption")?;
        Ok(self.caption.type_text(text))
    }

    /// Insert an emoji from the picker. `Ok(false)` if it did not fit.
    pub fn insert_emoji(&mut self, emoji: &str) -> PipelineResult<bool> {
        self.ensure_stage(Stage::Final, "edit the caption")?;
        Ok(self.caption.insert_emoji(emoji))
    }

    pub fn select_caption(&mut self, start: usize, end: usize) -> PipelineResult<()> {
        self.ensure_stage(Stage::Final, "edit the caption")?;
        self.caption.select(start, end);
        Ok(())
    }

    pub fn delete_caption_backward(&mut self) -> PipelineResult<()> {
        self.ensure_stage(Stage::Final, "edit the caption")?;
        self.caption.delete_backward();
        Ok(())
    }

    pub fn toggle_emoji_picker(&mut self) -> PipelineResult<()> {
        self.ensure_stage(Stage::Final, "open the emoji picker")?;
        self.caption.toggle_picker();
        Ok(())
    }

    /// A click landed outside the emoji picker (but inside the modal).
    pub fn click_outside_emoji_picker(&mut self) {
        self.caption.close_picker();
    }

    // --- Share ---

    /// "Share": freeze the current state into a job and enter Submitting.
    pub fn begin_share(&mut self) -> PipelineResult<SubmitJob> {
        self.ensure_open("share")?;
        let selection = self.selection.as_ref().ok_or(PipelineError::NoMedia)?;
        self.machine.begin_submit()?;
        self.drag.end();
        self.caption.close_picker();
        self.error = None;

        let crop = if selection.is_image() {
            let crop = self.crop_region();
            if crop.is_none() {
                tracing::warn!("Preview was never measured; exporting the full image");
            }
            crop
        } else {
            None
        };

        let job = SubmitJob {
            post_id: allocate_post_id(),
            author_id: self.author_id.clone(),
            key_prefix: self.key_prefix.clone(),
            file_name: selection.file_name.clone(),
            mime: selection.mime.clone(),
            kind: selection.kind,
            bytes: Arc::clone(&selection.bytes),
            crop,
            filter: self.filter,
            caption: self.caption.text().to_string(),
            limits: self.limits.clone(),
            export: self.export.clone(),
        };
        tracing::info!(
            "Sharing post {} ({}, filter {})",
            job.post_id,
            job.file_name,
            job.filter
        );
        Ok(job)
    }

    /// Apply the outcome of a [`SubmitJob`].
    ///
    /// Success closes the modal. Failure logs the error, returns to Final and
    /// shows the message; the modal stays open so the user can retry.
    pub fn finish_share(&mut self, result: &PipelineResult<PostRecord>) {
        if !self.machine.is_submitting() {
            return;
        }
        match result {
            Ok(record) => {
                tracing::info!("Post {} shared at {}", record.id, record.image_url);
                self.close();
            }
            Err(e) => {
                if e.is_user_recoverable() {
                    tracing::warn!("Sharing failed: {e}");
                } else {
                    tracing::error!("Sharing failed: {e}");
                }
                self.machine.submit_failed();
                self.error = Some(e.to_string());
            }
        }
    }

    /// Begin, run and finish a share in one call.
    pub async fn share(&mut self, stores: &Collaborators) -> PipelineResult<PostRecord> {
        let job = self.begin_share()?;
        let result = job.run(stores).await;
        self.finish_share(&result);
        result
    }

    // --- Internals ---

    fn ensure_open(&self, action: &str) -> PipelineResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(PipelineError::InvalidStage {
                action: action.to_string(),
                stage: "closed".to_string(),
            })
        }
    }

    /// Open, not submitting, no discard prompt.
    fn ensure_interactive(&self, action: &str) -> PipelineResult<()> {
        self.ensure_open(action)?;
        let stage = self.machine.stage();
        if stage == Stage::Submitting || self.machine.pending_discard().is_some() {
            return Err(PipelineError::InvalidStage {
                action: action.to_string(),
                stage: stage.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_stage(&self, required: Stage, action: &str) -> PipelineResult<()> {
        self.ensure_interactive(action)?;
        let stage = self.machine.stage();
        if stage != required {
            return Err(PipelineError::InvalidStage {
                action: action.to_string(),
                stage: stage.to_string(),
            });
        }
        Ok(())
    }

    fn clear_media(&mut self) {
        self.selection = None;
        self.drag.reset(DragAxis::None);
        self.filter = Filter::Original;
        self.caption.clear();
        self.error = None;
        self.file_drag_hover = false;
    }

    fn close(&mut self) {
        self.clear_media();
        // Releases the modal listeners and restores scrolling
        self.session = None;
        tracing::debug!("Composer closed");
        if let Some(callback) = self.on_close.as_mut() {
            callback();
        }
    }
}

/// Everything a submission needs, detached from the composer.
#[derive(Debug, Clone)]
pub struct SubmitJob {
    pub post_id: String,
    pub author_id: String,
    pub key_prefix: String,
    pub file_name: String,
    pub mime: String,
    pub kind: MediaKind,
    pub bytes: Arc<[u8]>,
    /// `None` exports the full image
    pub crop: Option<CropRegion>,
    pub filter: Filter,
    pub caption: String,
    limits: LimitsConfig,
    export: ExportConfig,
}

impl SubmitJob {
    /// `{key_prefix}/{author_id}/{post_id}.{ext}`
    pub fn destination_key(&self, extension: &str) -> String {
        format!(
            "{}/{}/{}.{}",
            self.key_prefix.trim_end_matches('/'),
            self.author_id,
            self.post_id,
            extension
        )
    }

    /// Produce the buffer, upload it, then write the record. Strictly in
    /// that order; nothing runs concurrently.
    pub async fn run(&self, stores: &Collaborators) -> PipelineResult<PostRecord> {
        let (bytes, content_type, extension) = match self.kind {
            MediaKind::Image => {
                let image = ImageDecoder::new(self.limits.clone())
                    .decode(Arc::clone(&self.bytes), &self.file_name)
                    .await?;
                let crop = self.crop.unwrap_or(CropRegion {
                    x: 0.0,
                    y: 0.0,
                    width: f64::from(image.width()),
                    height: f64::from(image.height()),
                });
                let encoded = Rasterizer::new(&self.export, &self.limits)
                    .rasterize(Arc::new(image), crop, self.filter)
                    .await?;
                let content_type = encoded.mime().to_string();
                let extension = encoded.extension().to_string();
                (encoded.bytes, content_type, extension)
            }
            MediaKind::Video => (
                self.bytes.to_vec(),
                self.mime.clone(),
                video_extension(&self.file_name, &self.mime),
            ),
        };

        let key = self.destination_key(&extension);
        let budget = Duration::from_millis(self.limits.upload_timeout_ms);

        tracing::debug!(
            "Uploading {} bytes to {} store as {key}",
            bytes.len(),
            stores.media.name()
        );
        let image_url = match timeout(budget, stores.media.upload(bytes, &key, &content_type)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(PipelineError::Upload {
                    key,
                    message: format!("timed out after {}ms", self.limits.upload_timeout_ms),
                })
            }
        };

        let record = PostRecord::new(
            self.post_id.clone(),
            self.author_id.clone(),
            image_url,
            self.caption.clone(),
        );
        match timeout(budget, stores.posts.create(&record)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(PipelineError::MetadataWrite {
                    id: record.id,
                    message: format!("timed out after {}ms", self.limits.upload_timeout_ms),
                })
            }
        }

        Ok(record)
    }
}

/// Extension for an uploaded video: from the file name, else the MIME subtype.
fn video_extension(file_name: &str, mime: &str) -> String {
    let from_name = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    from_name
        .or_else(|| {
            mime.strip_prefix("video/")
                .filter(|s| s.chars().all(|c| c.is_ascii_alphanumeric()))
                .map(String::from)
        })
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::surface::{ListenerKind, RecordingSurface};
    use crate::storage::{InMemoryMediaStore, InMemoryPostRepository};
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png(width: u32, height: u32) -> IncomingFile {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        IncomingFile::new("photo.png", "image/png", buffer.into_inner())
    }

    fn open_composer() -> (PostComposer, Arc<RecordingSurface>) {
        let recording = RecordingSurface::new();
        let surface: Arc<dyn HostSurface> = recording.clone();
        (PostComposer::open(&Config::default(), surface), recording)
    }

    fn memory_stores() -> (Collaborators, Arc<InMemoryMediaStore>, Arc<InMemoryPostRepository>) {
        let media = Arc::new(InMemoryMediaStore::new());
        let posts = Arc::new(InMemoryPostRepository::new());
        (
            Collaborators::new(media.clone(), posts.clone()),
            media,
            posts,
        )
    }

    fn at_final(composer: &mut PostComposer) {
        composer.select_file(png(40, 20), MediaSource::Picker).unwrap();
        composer.layout_in(Size::new(20.0, 20.0));
        composer.next().unwrap();
        composer.next().unwrap();
    }

    #[test]
    fn test_remeasure_after_next_keeps_pan() {
        let (mut composer, _) = open_composer();
        composer.select_file(png(400, 200), MediaSource::Picker).unwrap();
        let geometry = composer.layout_in(Size::new(100.0, 100.0)).unwrap();

        composer.pointer_down(Point::new(50.0, 50.0), PointerDevice::Mouse);
        composer.pointer_move(Point::new(10.0, 50.0));
        composer.pointer_up();
        assert_eq!(composer.pan_offset(), PanOffset::new(-40.0, 0.0));

        composer.next().unwrap();
        composer.image_rendered(geometry);
        assert_eq!(composer.pan_offset(), PanOffset::new(-40.0, 0.0));
        composer.next().unwrap();
        composer.image_rendered(geometry);
        assert_eq!(composer.pan_offset(), PanOffset::new(-40.0, 0.0));
    }

    #[test]
    fn test_remeasure_ignored_while_submitting() {
        let (mut composer, _) = open_composer();
        composer.select_file(png(400, 200), MediaSource::Picker).unwrap();
        composer.layout_in(Size::new(100.0, 100.0));
        composer.pointer_down(Point::new(50.0, 50.0), PointerDevice::Mouse);
        composer.pointer_move(Point::new(10.0, 50.0));
        composer.pointer_up();
        composer.next().unwrap();
        composer.next().unwrap();

        let _job = composer.begin_share().unwrap();
        composer.image_rendered(ViewportGeometry {
            image: Size::new(120.0, 100.0),
            container: Size::new(100.0, 100.0),
        });
        assert_eq!(composer.pan_offset(), PanOffset::new(-40.0, 0.0));
    }

    #[test]
    fn test_second_selection_recenters_on_first_measure() {
        let (mut composer, _) = open_composer();
        composer.select_file(png(400, 200), MediaSource::Picker).unwrap();
        composer.layout_in(Size::new(100.0, 100.0));
        composer.pointer_down(Point::new(50.0, 50.0), PointerDevice::Mouse);
        composer.pointer_move(Point::new(10.0, 50.0));
        composer.pointer_up();

        composer.select_file(png(400, 200), MediaSource::Picker).unwrap();
        composer.layout_in(Size::new(100.0, 100.0));
        assert_eq!(composer.pan_offset(), PanOffset::ZERO);
    }

    #[test]
    fn test_open_holds_modal_session() {
        let (composer, recording) = open_composer();
        assert!(composer.is_open());
        assert!(recording.scroll_locked());
        assert_eq!(recording.live_of(ListenerKind::EscapeKey), 1);
        drop(composer);
        assert!(!recording.scroll_locked());
        assert_eq!(recording.live_listeners(), 0);
    }

    #[test]
    fn test_invalid_file_keeps_selection_for_both_sources() {
        for source in [MediaSource::Picker, MediaSource::Drop] {
            let (mut composer, _) = open_composer();
            composer.select_file(png(40, 20), MediaSource::Picker).unwrap();
            let preview = composer.selection().unwrap().preview().id();

            let bad = IncomingFile::new("doc.pdf", "application/pdf", vec![1, 2]);
            assert!(composer.select_file(bad, source).is_err());
            assert_eq!(composer.selection().unwrap().preview().id(), preview);
            assert_eq!(composer.stage(), Stage::Crop);
            assert_eq!(
                composer.error_message(),
                Some("doc.pdf could not be uploaded. This file is not supported.")
            );
        }
    }

    #[test]
    fn test_drop_forces_crop_and_clears_hover() {
        let (mut composer, _) = open_composer();
        at_final(&mut composer);
        composer.file_drag_over();
        assert!(composer.is_file_drag_hover());

        composer.select_file(png(10, 30), MediaSource::Drop).unwrap();
        assert!(!composer.is_file_drag_hover());
        assert_eq!(composer.stage(), Stage::Crop);
        assert_eq!(composer.drag_axis(), DragAxis::Vertical);
    }

    #[test]
    fn test_new_selection_keeps_caption_resets_filter() {
        let (mut composer, _) = open_composer();
        composer.select_file(png(40, 20), MediaSource::Picker).unwrap();
        composer.next().unwrap();
        composer.select_filter(Filter::Lark).unwrap();
        composer.next().unwrap();
        composer.type_caption("keep me").unwrap();

        composer.select_file(png(20, 20), MediaSource::Picker).unwrap();
        assert_eq!(composer.filter(), Filter::Original);
        assert_eq!(composer.caption().text(), "keep me");
        assert_eq!(composer.pan_offset(), PanOffset::ZERO);
    }

    #[test]
    fn test_stage_gates() {
        let (mut composer, _) = open_composer();
        composer.select_file(png(40, 20), MediaSource::Picker).unwrap();
        assert!(composer.select_filter(Filter::Moon).is_err());
        assert!(composer.type_caption("x").is_err());

        composer.next().unwrap();
        assert!(!composer.pointer_down(Point::new(0.0, 0.0), PointerDevice::Mouse));
        composer.select_filter(Filter::Moon).unwrap();
        assert_eq!(composer.preview_filter_css(), "grayscale(100%)");
    }

    #[test]
    fn test_grid_only_while_dragging() {
        let (mut composer, recording) = open_composer();
        composer.select_file(png(40, 20), MediaSource::Picker).unwrap();
        composer.layout_in(Size::new(20.0, 20.0));
        assert_eq!(composer.alignment_grid(), None);

        assert!(composer.pointer_down(Point::new(10.0, 10.0), PointerDevice::Mouse));
        let (vertical, _) = composer.alignment_grid().unwrap();
        assert!((vertical[0] - 20.0 / 3.0).abs() < 1e-9);
        assert_eq!(recording.live_listeners(), 2 + 4);

        composer.pointer_up();
        assert!(!composer.grid_visible());
        assert_eq!(recording.live_listeners(), 2);
    }

    #[test]
    fn test_next_ends_active_drag() {
        let (mut composer, recording) = open_composer();
        composer.select_file(png(40, 20), MediaSource::Picker).unwrap();
        composer.layout_in(Size::new(20.0, 20.0));
        composer.pointer_down(Point::new(10.0, 10.0), PointerDevice::Mouse);
        composer.next().unwrap();
        assert!(!composer.grid_visible());
        assert_eq!(recording.live_of(ListenerKind::PointerMove), 0);
    }

    #[test]
    fn test_close_without_media_invokes_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let (composer, recording) = open_composer();
        let mut composer = composer.with_close_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(composer.escape(), CloseOutcome::Close);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!composer.is_open());
        assert!(!recording.scroll_locked());
        assert_eq!(composer.request_close(), CloseOutcome::Ignored);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_back_discard_resets_everything() {
        let (mut composer, recording) = open_composer();
        composer.select_file(png(40, 20), MediaSource::Picker).unwrap();
        assert_eq!(composer.back(), BackOutcome::DiscardPrompt);
        assert_eq!(composer.confirm_discard(), Some(DiscardEffect::ResetToUpload));

        assert_eq!(composer.stage(), Stage::Upload);
        assert!(composer.selection().is_none());
        assert!(composer.is_open());
        assert!(recording.scroll_locked());
    }

    #[tokio::test]
    async fn test_share_success_closes() {
        let (mut composer, recording) = open_composer();
        at_final(&mut composer);
        composer.type_caption("hi").unwrap();
        let (stores, media, posts) = memory_stores();

        let record = composer.share(&stores).await.unwrap();
        assert_eq!(record.id.len(), 20);
        assert_eq!(record.caption, "hi");
        assert_eq!(record.author_id, "anonymous");

        let uploads = media.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].key, format!("posts/anonymous/{}.jpg", record.id));
        assert_eq!(uploads[0].content_type, "image/jpeg");
        assert_eq!(record.image_url, format!("memory://{}", uploads[0].key));
        assert_eq!(posts.records(), vec![record]);

        assert!(!composer.is_open());
        assert_eq!(recording.live_listeners(), 0);
        assert!(!recording.scroll_locked());
    }

    #[tokio::test]
    async fn test_share_failure_returns_to_final() {
        let (mut composer, recording) = open_composer();
        at_final(&mut composer);
        composer.type_caption("retry me").unwrap();
        let (stores, media, posts) = memory_stores();
        media.set_failure(Some("bucket offline"));

        let err = composer.share(&stores).await.unwrap_err();
        assert!(matches!(err, PipelineError::Upload { .. }));
        assert_eq!(composer.stage(), Stage::Final);
        assert!(composer.is_open());
        assert!(composer.error_message().unwrap().contains("bucket offline"));
        assert_eq!(composer.caption().text(), "retry me");
        assert!(posts.records().is_empty());
        assert!(recording.scroll_locked());

        media.set_failure(None);
        composer.share(&stores).await.unwrap();
        assert!(!composer.is_open());
    }

    #[tokio::test]
    async fn test_metadata_failure_surfaces() {
        let (mut composer, _) = open_composer();
        at_final(&mut composer);
        let (stores, _, posts) = memory_stores();
        posts.set_failure(Some("quota exceeded"));

        let err = composer.share(&stores).await.unwrap_err();
        assert!(matches!(err, PipelineError::MetadataWrite { .. }));
        assert_eq!(composer.stage(), Stage::Final);
    }

    #[test]
    fn test_submitting_blocks_everything() {
        let (mut composer, _) = open_composer();
        at_final(&mut composer);
        let _job = composer.begin_share().unwrap();

        assert!(composer.is_loading());
        assert_eq!(composer.header().title, "Sharing");
        assert!(composer.select_file(png(5, 5), MediaSource::Drop).is_err());
        assert_eq!(composer.back(), BackOutcome::Ignored);
        assert_eq!(composer.escape(), CloseOutcome::Ignored);
        assert!(composer.next().is_err());
        assert!(composer.begin_share().is_err());
    }

    #[tokio::test]
    async fn test_video_uploaded_unchanged() {
        let (mut composer, _) = open_composer();
        let clip = IncomingFile::new("clip.MP4", "video/mp4", vec![0, 0, 0, 24, 102]);
        composer.select_file(clip, MediaSource::Picker).unwrap();
        composer.next().unwrap();
        composer.next().unwrap();
        let (stores, media, _) = memory_stores();

        let record = composer.share(&stores).await.unwrap();
        let upload = &media.uploads()[0];
        assert_eq!(upload.bytes, vec![0, 0, 0, 24, 102]);
        assert_eq!(upload.content_type, "video/mp4");
        assert!(upload.key.ends_with(&format!("{}.mp4", record.id)));
    }

    #[test]
    fn test_video_extension_fallbacks() {
        assert_eq!(video_extension("a.MOV", "video/quicktime"), "mov");
        assert_eq!(video_extension("noext", "video/webm"), "webm");
        assert_eq!(video_extension("noext", "video/x-matroska"), "bin");
    }
}
