//! Follow-the-tail scrolling for the transcript view.

use crate::config::DEFAULT_SCROLL_THRESHOLD_PX;

/// Geometry of the transcript viewport, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Distance scrolled from the top
    pub offset: f32,
    pub viewport_height: f32,
    pub content_height: f32,
}

impl Viewport {
    pub fn new(offset: f32, viewport_height: f32, content_height: f32) -> Self {
        Self {
            offset,
            viewport_height,
            content_height,
        }
    }

    pub fn distance_from_bottom(&self) -> f32 {
        (self.content_height - self.offset - self.viewport_height).max(0.0)
    }
}

/// Why the transcript changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentChange {
    /// The local user sent something; always follow it.
    LocalSend,
    /// Content arrived from the service.
    Incoming,
}

#[derive(Debug, Clone)]
pub struct ScrollTracker {
    threshold: f32,
    near_bottom: bool,
    pending: bool,
}

impl ScrollTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            near_bottom: true,
            pending: false,
        }
    }

    /// Record the latest viewport position reported by the view.
    pub fn observe(&mut self, viewport: Viewport) {
        self.near_bottom = viewport.distance_from_bottom() <= self.threshold;
    }

    pub fn is_near_bottom(&self) -> bool {
        self.near_bottom
    }

    /// Returns whether a scroll to bottom was requested.
    pub fn on_content_change(&mut self, change: ContentChange) -> bool {
        let follow = match change {
            ContentChange::LocalSend => true,
            ContentChange::Incoming => self.near_bottom,
        };
        if follow {
            self.pending = true;
        }
        follow
    }

    /// Consume a pending scroll request.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Fresh transcript: start at the tail again.
    pub fn reset(&mut self) {
        self.near_bottom = true;
        self.pending = true;
    }
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLL_THRESHOLD_PX)
    }
}
