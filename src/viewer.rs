//! Pan and zoom state for displaying a result image.
//!
//! The viewer holds no pixels. A front end feeds it pointer and wheel input
//! and reads back a [`ViewerTransform`] to apply when drawing.

/// Smallest allowed scale.
pub const MIN_SCALE: f32 = 0.5;
/// Largest allowed scale.
pub const MAX_SCALE: f32 = 5.0;
/// Scale change per wheel notch.
pub const WHEEL_STEP: f32 = 0.2;
/// Scale change per zoom button press.
pub const BUTTON_STEP: f32 = 0.5;

/// Scale and translation applied to the displayed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerTransform {
    /// Zoom factor, always within [`MIN_SCALE`, `MAX_SCALE`].
    pub scale: f32,
    /// Horizontal translation in screen units.
    pub offset_x: f32,
    /// Vertical translation in screen units.
    pub offset_y: f32,
}

impl ViewerTransform {
    /// Scale 1, no translation.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    /// True when this is the identity transform.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for ViewerTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Pointer position and offset captured when a drag began.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragAnchor {
    pointer_x: f32,
    pointer_y: f32,
    offset_x: f32,
    offset_y: f32,
}

/// Interactive viewer for one image source at a time.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    source: Option<String>,
    transform: ViewerTransform,
    drag: Option<DragAnchor>,
}

impl Viewer {
    /// Creates a viewer with nothing to show.
    pub fn new() -> Self {
        Self::default()
    }

    /// The source currently displayed.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Current transform.
    pub fn transform(&self) -> ViewerTransform {
        self.transform
    }

    /// Current scale.
    pub fn scale(&self) -> f32 {
        self.transform.scale
    }

    /// Scale as a rounded percentage, e.g. `150` for 1.5x.
    pub fn zoom_percent(&self) -> u32 {
        (self.transform.scale * 100.0).round() as u32
    }

    /// True while a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Switches the displayed source.
    ///
    /// Any change of source resets the transform and ends a drag. Setting the
    /// same source again keeps the current view.
    pub fn set_source(&mut self, source: Option<&str>) {
        if self.source.as_deref() == source {
            return;
        }
        self.source = source.map(str::to_string);
        self.reset();
    }

    /// Applies a wheel event. Scrolling up (negative `delta_y`) zooms in.
    pub fn wheel(&mut self, delta_y: f32) {
        // Only the direction counts; a zero delta is a no-op.
        let direction = if delta_y > 0.0 {
            -1.0
        } else if delta_y < 0.0 {
            1.0
        } else {
            0.0
        };
        self.set_scale(self.transform.scale + direction * WHEEL_STEP);
    }

    /// Zoom-in button.
    pub fn zoom_in(&mut self) {
        self.set_scale(self.transform.scale + BUTTON_STEP);
    }

    /// Zoom-out button.
    pub fn zoom_out(&mut self) {
        self.set_scale(self.transform.scale - BUTTON_STEP);
    }

    /// Reset button: scale 1, no translation.
    pub fn reset(&mut self) {
        self.transform = ViewerTransform::IDENTITY;
        self.drag = None;
    }

    /// Pointer pressed: starts a drag at `(x, y)`.
    pub fn press(&mut self, x: f32, y: f32) {
        self.drag = Some(DragAnchor {
            pointer_x: x,
            pointer_y: y,
            offset_x: self.transform.offset_x,
            offset_y: self.transform.offset_y,
        });
    }

    /// Pointer moved to `(x, y)`. Pans only while dragging.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let Some(anchor) = self.drag else {
            return;
        };
        self.transform.offset_x = anchor.offset_x + (x - anchor.pointer_x);
        self.transform.offset_y = anchor.offset_y + (y - anchor.pointer_y);
    }

    /// Pointer released or left the view: ends the drag.
    pub fn release(&mut self) {
        self.drag = None;
    }

    fn set_scale(&mut self, scale: f32) {
        self.transform.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }
}
