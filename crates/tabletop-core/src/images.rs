//! Load state of the images referenced by items.
//!
//! Loading itself happens in the front-end; this registry only remembers
//! which urls were requested and the natural size of those that finished.

use kurbo::Size;
use std::collections::HashMap;

/// Load state of one image url.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageState {
    /// Requested, not yet delivered.
    Pending,
    /// Loaded with the given natural size in pixels.
    Loaded(Size),
}

#[derive(Debug, Clone, Default)]
pub struct ImageRegistry {
    images: HashMap<String, ImageState>,
    /// Urls registered but not yet handed to the front-end.
    requests: Vec<String>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `url` if unknown. Returns true when a new request was queued.
    pub fn ensure(&mut self, url: &str) -> bool {
        if self.images.contains_key(url) {
            return false;
        }
        self.images.insert(url.to_string(), ImageState::Pending);
        self.requests.push(url.to_string());
        true
    }

    /// Record a finished load.
    pub fn mark_loaded(&mut self, url: &str, natural: Size) {
        self.images.insert(url.to_string(), ImageState::Loaded(natural));
    }

    pub fn state(&self, url: &str) -> Option<ImageState> {
        self.images.get(url).copied()
    }

    /// Natural size of a loaded image.
    pub fn natural_size(&self, url: &str) -> Option<Size> {
        match self.images.get(url) {
            Some(ImageState::Loaded(size)) => Some(*size),
            _ => None,
        }
    }

    /// Drain the queue of urls the front-end still has to fetch.
    pub fn take_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.requests)
    }
}
