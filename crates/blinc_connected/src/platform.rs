//! Platform collaborator traits
//!
//! The coordinator only decides which elements take part in a transition and
//! when to start or cancel it. Snapshotting, interpolation and list
//! virtualization are provided by the platform through these traits.

use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::element::{ElementId, ListId, NavParam};
use crate::error::Result;

/// A prepared connected animation waiting for its destination
pub trait ConnectedAnimation {
    /// Start the animation towards `target`
    ///
    /// Returns `false` if the platform refused to start it.
    fn start(&self, target: ElementId) -> bool;

    /// Start the animation towards `target`, moving `companions` with it as
    /// one coordinated group
    fn start_with_companions(&self, target: ElementId, companions: &[ElementId]) -> bool;

    /// Abandon the animation
    fn cancel(&self);
}

/// Shared handle to an in-flight animation
pub type AnimationHandle = Rc<dyn ConnectedAnimation>;

/// The platform animation engine
pub trait AnimationEngine {
    /// Snapshot the appearance and position of `element` under `key`
    fn prepare_snapshot(&self, key: &str, element: ElementId);

    /// The in-flight animation prepared under `key`, if any
    fn in_flight(&self, key: &str) -> Option<AnimationHandle>;
}

/// A virtualized list control
///
/// Items inside a list may not exist in the visual tree until they are
/// realized, so the list does its own snapshotting and starting.
pub trait ListControl {
    /// Stable identity of this list
    fn id(&self) -> ListId;

    /// Whether the bound collection contains an item equal to `param`
    fn contains(&self, param: &NavParam) -> bool;

    /// Snapshot the element named `element_name` inside the item for `param`
    fn prepare_snapshot(&self, key: &str, param: &NavParam, element_name: &str);

    /// Scroll the item for `param` into view, realizing it
    fn scroll_into_view(&self, param: &NavParam);

    /// Start `animation` on the element named `element_name` inside the item
    /// for `param`
    ///
    /// Resolves to whether the animation started.
    fn start_from_animation(
        &self,
        animation: AnimationHandle,
        param: &NavParam,
        element_name: &str,
    ) -> LocalBoxFuture<'static, Result<bool>>;
}
