//! Pointer-driven panning of the preview during the Crop stage.
//!
//! The controller keeps the committed offset and the gesture anchor in one
//! place, so a move always computes from the latest offset. When a move is
//! clamped, the anchor is re-based on the clamped axis: reversing direction
//! then takes effect immediately instead of first "paying back" the distance
//! dragged past the edge.

use std::sync::Arc;

use super::geometry::{clamp_pan, DragAxis, PanOffset, Point, ViewportGeometry};
use super::surface::{HostSurface, ListenerKind, Subscription};

/// Input device that started a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerDevice {
    Mouse,
    /// A touch start, with the number of simultaneous touch points
    Touch { touches: usize },
}

/// A gesture in progress. Its subscriptions detach when it ends.
struct ActiveDrag {
    anchor: Point,
    _listeners: Vec<Subscription>,
}

/// Pan state of the current preview.
#[derive(Default)]
pub struct DragController {
    axis: DragAxis,
    geometry: Option<ViewportGeometry>,
    offset: PanOffset,
    active: Option<ActiveDrag>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new selection: forget everything and lock to its axis.
    pub fn reset(&mut self, axis: DragAxis) {
        self.end();
        self.axis = axis;
        self.geometry = None;
        self.offset = PanOffset::ZERO;
    }

    /// The preview finished layout: store its measured size.
    ///
    /// The first measurement of a selection recenters. Later ones keep the
    /// user's offset, pulled back into range for the new size.
    pub fn set_geometry(&mut self, geometry: ViewportGeometry) {
        self.end();
        self.offset = match self.geometry {
            None => PanOffset::ZERO,
            Some(_) => {
                clamp_pan(self.offset, self.axis, geometry.image, geometry.container).offset
            }
        };
        self.geometry = Some(geometry);
    }

    pub fn axis(&self) -> DragAxis {
        self.axis
    }

    pub fn geometry(&self) -> Option<ViewportGeometry> {
        self.geometry
    }

    pub fn offset(&self) -> PanOffset {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// The alignment grid shows only while a gesture is in progress.
    pub fn grid_visible(&self) -> bool {
        self.is_dragging()
    }

    /// Start a gesture. Returns false when it was ignored.
    ///
    /// Multi-touch starts are ignored, as is anything before the preview has
    /// been measured. Move/end listeners are attached for the gesture only.
    pub fn begin(
        &mut self,
        pointer: Point,
        device: PointerDevice,
        surface: &Arc<dyn HostSurface>,
    ) -> bool {
        if let PointerDevice::Touch { touches } = device {
            if touches != 1 {
                return false;
            }
        }
        if self.geometry.is_none() || self.active.is_some() {
            return false;
        }

        let listeners = [
            ListenerKind::PointerMove,
            ListenerKind::PointerUp,
            ListenerKind::TouchMove,
            ListenerKind::TouchEnd,
        ]
        .into_iter()
        .map(|kind| Subscription::attach(surface, kind))
        .collect();

        self.active = Some(ActiveDrag {
            anchor: Point::new(pointer.x - self.offset.x, pointer.y - self.offset.y),
            _listeners: listeners,
        });
        tracing::trace!("Drag started at ({}, {}) on {} axis", pointer.x, pointer.y, self.axis);
        true
    }

    /// Pointer moved during a gesture. Returns the new offset, or `None` if
    /// no gesture is active.
    pub fn move_to(&mut self, pointer: Point) -> Option<PanOffset> {
        let geometry = self.geometry?;
        let drag = self.active.as_mut()?;

        let requested = PanOffset::new(pointer.x - drag.anchor.x, pointer.y - drag.anchor.y);
        let clamped = clamp_pan(requested, self.axis, geometry.image, geometry.container);

        if clamped.clamped_x {
            drag.anchor.x = pointer.x - clamped.offset.x;
        }
        if clamped.clamped_y {
            drag.anchor.y = pointer.y - clamped.offset.y;
        }
        self.offset = clamped.offset;
        Some(self.offset)
    }

    /// End the gesture (pointer up, touch end, or any teardown).
    pub fn end(&mut self) -> bool {
        let ended = self.active.take().is_some();
        if ended {
            tracing::trace!("Drag ended at {}", self.offset.css_transform());
        }
        ended
    }
}
