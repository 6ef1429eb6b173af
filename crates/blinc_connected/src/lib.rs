//! Blinc Connected Animations
//!
//! Shared-element transitions across page navigation. An element present on
//! both the outgoing and the incoming page, such as a thumbnail that becomes
//! a header image, moves between its two positions instead of the UI
//! cutting over.
//!
//! # Architecture
//!
//! - [`TransitionCoordinator`] - Capture/completion state machine, one per
//!   navigation host
//! - [`TargetRegistry`] - Animation keys → element or list item targets
//! - [`CompanionRegistry`] - Anchors → elements that move along with them
//! - [`FrameExecutor`] - UI-thread continuations for list items that must be
//!   scrolled into view before they can animate
//!
//! The platform supplies snapshotting and interpolation through
//! [`AnimationEngine`], virtualized lists through [`ListControl`] and the
//! page lifecycle through [`NavigationHost`].
//!
//! # Example
//!
//! ```ignore
//! use blinc_connected::prelude::*;
//!
//! let executor = FrameExecutor::new();
//! let coordinator = TransitionCoordinator::new(
//!     CoordinatorConfig::default().with_probe(&platform),
//!     engine,
//!     Rc::new(executor.clone()),
//! );
//! coordinator.attach(&frame);
//!
//! // Gallery page: animate the thumbnail of the clicked photo
//! coordinator.register_list_item(&gallery, "photo", "Thumbnail");
//!
//! // Detail page, while loading
//! coordinator.register_element("photo", header_image);
//!
//! // Once per frame
//! executor.tick();
//! ```

pub mod companion;
pub mod config;
pub mod coordinator;
pub mod element;
pub mod error;
pub mod executor;
pub mod navigation;
pub mod platform;
pub mod registry;

#[cfg(test)]
mod testing;

pub use companion::{CompanionRegistry, Companions};
pub use config::{Capabilities, CapabilityProbe, CoordinatorConfig};
pub use coordinator::{CoordinatorStats, TransitionCoordinator, TransitionPhase};
pub use element::{ElementId, ListId, NavParam};
pub use error::{ConnectedError, Result};
pub use executor::{with_frame_budget, yield_frame, FrameExecutor, UiDispatcher, YieldFrame};
pub use navigation::{
    LoadedCallback, Navigated, NavigatedHandler, NavigatingAway, NavigatingAwayHandler,
    NavigationHost, NavigationMode, PageContent, SubscriptionId,
};
pub use platform::{AnimationEngine, AnimationHandle, ConnectedAnimation, ListControl};
pub use registry::{AnimationTarget, ListBinding, ListBindings, TargetRegistry};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Capabilities, CapabilityProbe, CoordinatorConfig};
    pub use crate::coordinator::{TransitionCoordinator, TransitionPhase};
    pub use crate::element::{ElementId, ListId, NavParam};
    pub use crate::error::{ConnectedError, Result};
    pub use crate::executor::{FrameExecutor, UiDispatcher};
    pub use crate::navigation::{NavigationHost, NavigationMode, PageContent};
    pub use crate::platform::{AnimationEngine, ConnectedAnimation, ListControl};
}
