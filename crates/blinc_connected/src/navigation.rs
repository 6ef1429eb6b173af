//! Navigation host abstraction
//!
//! A navigation host (a frame or router) raises two lifecycle events the
//! coordinator listens to: one while the current page is being left and one
//! once the new page is in place. The new page then reports when its visual
//! tree has loaded.

use std::rc::Rc;

use slotmap::new_key_type;

use crate::element::NavParam;

new_key_type! {
    /// Handle for an event subscription on a navigation host
    pub struct SubscriptionId;
}

/// Direction of a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationMode {
    /// Navigation to a new page
    #[default]
    New,
    /// Return to the previous page in the back stack
    Back,
    /// Move to the next page in the forward stack
    Forward,
    /// Reload of the current page
    Refresh,
}

/// Raised while the current page is being left
#[derive(Debug, Clone, Default)]
pub struct NavigatingAway {
    /// Parameter the navigation departs with
    pub parameter: Option<NavParam>,
    /// Direction of the navigation
    pub mode: NavigationMode,
    /// Set by other listeners to veto the navigation
    pub cancel: bool,
}

/// Raised once the navigation has replaced the page content
#[derive(Clone)]
pub struct Navigated {
    /// The page that was navigated to
    pub content: Rc<dyn PageContent>,
    /// Direction of the navigation
    pub mode: NavigationMode,
    /// Parameter carried by the navigation
    pub parameter: Option<NavParam>,
}

impl std::fmt::Debug for Navigated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigated")
            .field("mode", &self.mode)
            .field("parameter", &self.parameter)
            .finish()
    }
}

/// Handler for [`NavigatingAway`] events
pub type NavigatingAwayHandler = Box<dyn Fn(&mut NavigatingAway)>;

/// Handler for [`Navigated`] events
pub type NavigatedHandler = Box<dyn Fn(&Navigated)>;

/// Callback run once a page's visual tree has loaded
pub type LoadedCallback = Box<dyn FnOnce()>;

/// A page-based navigation host
pub trait NavigationHost {
    /// Subscribe to "navigating away" events
    fn on_navigating_away(&self, handler: NavigatingAwayHandler) -> SubscriptionId;

    /// Subscribe to "navigated" events
    fn on_navigated(&self, handler: NavigatedHandler) -> SubscriptionId;

    /// Remove a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);

    /// Parameter of the most recent forward-stack entry
    ///
    /// During a back navigation this is the page being returned from.
    fn forward_stack_parameter(&self) -> Option<NavParam>;
}

/// Page content shown by a navigation host
pub trait PageContent {
    /// Run `callback` once, when the page's visual tree has finished loading
    fn on_loaded(&self, callback: LoadedCallback);
}
