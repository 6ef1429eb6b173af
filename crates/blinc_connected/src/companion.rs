//! Companion registry
//!
//! Companions are elements that follow an anchor's position and size during
//! a connected animation without being tracked under a key of their own.

use rustc_hash::FxHashMap;
use slotmap::Key;
use smallvec::SmallVec;

use crate::element::ElementId;

/// Companions of one anchor, in attach order
pub type Companions = SmallVec<[ElementId; 4]>;

/// Anchor element → companion elements
#[derive(Clone, Debug, Default)]
pub struct CompanionRegistry {
    anchors: FxHashMap<ElementId, Companions>,
}

impl CompanionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `element` to the companions of `anchor`
    ///
    /// Duplicates are kept. A null anchor is ignored.
    pub fn attach(&mut self, element: ElementId, anchor: ElementId) {
        if anchor.is_null() || element.is_null() {
            tracing::trace!("ignoring companion attach to {:?}", anchor);
            return;
        }
        self.anchors.entry(anchor).or_default().push(element);
    }

    /// Remove the first occurrence of `element` from the companions of
    /// `anchor`
    pub fn detach(&mut self, element: ElementId, anchor: ElementId) {
        if anchor.is_null() {
            return;
        }
        let Some(companions) = self.anchors.get_mut(&anchor) else {
            return;
        };
        if let Some(index) = companions.iter().position(|c| *c == element) {
            companions.remove(index);
        }
        if companions.is_empty() {
            self.anchors.remove(&anchor);
        }
    }

    /// Companions of `anchor`, empty if it has none
    pub fn companions_of(&self, anchor: ElementId) -> &[ElementId] {
        self.anchors
            .get(&anchor)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }

    /// Number of anchors with companions
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Check if no anchor has companions
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Drop every anchor, releasing the backing storage
    pub fn clear(&mut self) {
        self.anchors = FxHashMap::default();
    }
}
