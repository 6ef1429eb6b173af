//! Transition coordinator
//!
//! Drives connected animations across one navigation in two phases:
//!
//! 1. **Capture**, while the current page is being left. Every registered
//!    key is snapshotted, by the animation engine for single elements or by
//!    the owning list for list items, and copied into the pending ledger.
//!    The key and companion registries are then cleared; registrations only
//!    apply to one transition.
//! 2. **Completion**, once the new page's visual tree has loaded. Keys the
//!    new page registered while loading are matched against in-flight
//!    animations and started on their destination. List items are scrolled
//!    into view first and started from a continuation on the UI dispatcher.
//!    Whatever is left in the pending ledger is cancelled.
//!
//! # Example
//!
//! ```ignore
//! use blinc_connected::prelude::*;
//!
//! let coordinator = TransitionCoordinator::new(config, engine, dispatcher);
//! coordinator.attach(&frame);
//!
//! // Page A, before navigating
//! coordinator.register_element("hero", thumbnail);
//!
//! // Page B, while loading
//! coordinator.register_element("hero", header_image);
//! coordinator.attach_companion(title, header_image);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use futures::FutureExt;
use rustc_hash::FxHashSet;

use crate::companion::CompanionRegistry;
use crate::config::{Capabilities, CoordinatorConfig};
use crate::element::{ElementId, ListId, NavParam};
use crate::error::ConnectedError;
use crate::executor::{with_frame_budget, yield_frame, UiDispatcher};
use crate::navigation::{
    Navigated, NavigatingAway, NavigationHost, NavigationMode, SubscriptionId,
};
use crate::platform::{AnimationEngine, AnimationHandle, ListControl};
use crate::registry::{AnimationTarget, TargetRegistry};

/// Where the coordinator is in the navigation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    /// No navigation in progress
    #[default]
    Idle,
    /// Source elements were snapshotted, the new page is not in place yet
    Captured,
    /// The new page is in place, waiting for its visual tree to load
    AwaitingLoad,
}

/// Statistics about a coordinator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub registered: usize,
    pub companion_anchors: usize,
    pub pending: usize,
    pub snapshots: u64,
    pub started: u64,
    pub cancelled: u64,
}

#[derive(Default)]
struct State {
    keys: TargetRegistry,
    companions: CompanionRegistry,
    pending: TargetRegistry,
    phase: TransitionPhase,
}

#[derive(Default)]
struct Counters {
    snapshots: Cell<u64>,
    started: Cell<u64>,
    cancelled: Cell<u64>,
}

impl Counters {
    fn bump(cell: &Cell<u64>) {
        cell.set(cell.get() + 1);
    }
}

struct HostBinding {
    host: Weak<dyn NavigationHost>,
    navigating_away: SubscriptionId,
    navigated: SubscriptionId,
}

/// Coordinates connected animations for one navigation host
///
/// All methods run on the UI thread. No `RefCell` borrow is held while a
/// collaborator is called, so collaborators may call back into the
/// coordinator.
pub struct TransitionCoordinator {
    this: Weak<TransitionCoordinator>,
    config: CoordinatorConfig,
    engine: Rc<dyn AnimationEngine>,
    dispatcher: Rc<dyn UiDispatcher>,
    state: RefCell<State>,
    counters: Counters,
    host: RefCell<Option<HostBinding>>,
}

impl std::fmt::Debug for TransitionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionCoordinator")
            .field("config", &self.config)
            .field("phase", &self.phase())
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl TransitionCoordinator {
    /// Create a coordinator with empty registries
    pub fn new(
        config: CoordinatorConfig,
        engine: Rc<dyn AnimationEngine>,
        dispatcher: Rc<dyn UiDispatcher>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            config,
            engine,
            dispatcher,
            state: RefCell::new(State::default()),
            counters: Counters::default(),
            host: RefCell::new(None),
        })
    }

    /// The resolved platform capabilities
    pub fn capabilities(&self) -> Capabilities {
        self.config.capabilities
    }

    /// The configuration this coordinator was built with
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    // =========================================================================
    // Host subscription
    // =========================================================================

    /// Subscribe to the lifecycle events of `host`
    ///
    /// Without the extended feature set the coordinator stays in no-op mode
    /// and nothing is subscribed. Returns whether it subscribed. Attaching
    /// again first detaches from the previous host.
    pub fn attach<H: NavigationHost + 'static>(&self, host: &Rc<H>) -> bool {
        if !self.config.capabilities.extended {
            tracing::debug!("extended connected animations unavailable, not subscribing");
            return false;
        }
        self.detach();

        let this = self.this.clone();
        let navigating_away =
            host.on_navigating_away(Box::new(move |event: &mut NavigatingAway| {
                if let Some(coordinator) = this.upgrade() {
                    coordinator.on_navigating_away(event);
                }
            }));

        let this = self.this.clone();
        let weak_host = Rc::downgrade(host) as Weak<dyn NavigationHost>;
        let forward_host = weak_host.clone();
        let navigated = host.on_navigated(Box::new(move |event: &Navigated| {
            let Some(coordinator) = this.upgrade() else {
                return;
            };
            let forward = forward_host
                .upgrade()
                .and_then(|host| host.forward_stack_parameter());
            coordinator.on_navigated(event, forward);
        }));

        *self.host.borrow_mut() = Some(HostBinding {
            host: weak_host,
            navigating_away,
            navigated,
        });
        tracing::debug!("connected animation coordinator attached");
        true
    }

    /// Remove the host subscriptions, if any
    pub fn detach(&self) {
        let Some(binding) = self.host.borrow_mut().take() else {
            return;
        };
        if let Some(host) = binding.host.upgrade() {
            host.unsubscribe(binding.navigating_away);
            host.unsubscribe(binding.navigated);
        }
        tracing::debug!("connected animation coordinator detached");
    }

    /// Check if the coordinator is subscribed to a host
    pub fn is_attached(&self) -> bool {
        self.host.borrow().is_some()
    }

    /// Handle a "navigating away" event
    ///
    /// The event's cancel flag is left alone.
    pub fn on_navigating_away(&self, event: &mut NavigatingAway) {
        self.capture(event.parameter.as_ref());
    }

    /// Handle a "navigated" event
    ///
    /// Completion is deferred until the new content reports its visual tree
    /// as loaded. `forward_parameter` is the parameter of the most recent
    /// forward-stack entry; it replaces the event's parameter when
    /// navigating back.
    pub fn on_navigated(&self, event: &Navigated, forward_parameter: Option<NavParam>) {
        let parameter = match event.mode {
            NavigationMode::Back => forward_parameter,
            _ => event.parameter.clone(),
        };

        self.state.borrow_mut().phase = TransitionPhase::AwaitingLoad;
        tracing::debug!(
            "navigated ({:?}), completing connected animations once loaded",
            event.mode
        );

        let this = self.this.clone();
        event.content.on_loaded(Box::new(move || {
            if let Some(coordinator) = this.upgrade() {
                coordinator.complete(parameter.as_ref());
            }
        }));
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Without the extended feature set nothing ever captures, so
    /// registrations are dropped instead of piling up.
    fn accepts_registrations(&self) -> bool {
        if !self.config.capabilities.extended {
            tracing::trace!("no-op mode, ignoring connected animation registration");
            return false;
        }
        true
    }

    /// Animate `element` under `key` in the next transition
    ///
    /// Replaces any earlier target for the key. Empty keys and null elements
    /// are ignored, as is everything in no-op mode.
    pub fn register_element(&self, key: &str, element: ElementId) {
        if !self.accepts_registrations() {
            return;
        }
        self.state.borrow_mut().keys.register_element(key, element);
    }

    /// Forget `key`
    pub fn unregister(&self, key: &str) {
        self.state.borrow_mut().keys.unregister(key);
    }

    /// Animate the element named `element_name` inside the items of `list`
    /// under `key`
    ///
    /// A key can collect bindings from several lists. Registering the same
    /// triple twice has no further effect.
    pub fn register_list_item(&self, list: &Rc<dyn ListControl>, key: &str, element_name: &str) {
        if !self.accepts_registrations() {
            return;
        }
        self.state
            .borrow_mut()
            .keys
            .register_list_item(list, key, element_name);
    }

    /// Remove the bindings of `list` under `key`
    ///
    /// The key itself goes away once it has no bindings left, or right away
    /// if it is not a list key.
    pub fn unregister_list_item(&self, list: ListId, key: &str) {
        self.state.borrow_mut().keys.unregister_list_item(list, key);
    }

    /// Move `element` along with `anchor` during the next transition
    pub fn attach_companion(&self, element: ElementId, anchor: ElementId) {
        if !self.accepts_registrations() {
            return;
        }
        self.state.borrow_mut().companions.attach(element, anchor);
    }

    /// Stop moving `element` along with `anchor`
    pub fn detach_companion(&self, element: ElementId, anchor: ElementId) {
        self.state.borrow_mut().companions.detach(element, anchor);
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Check if a key is registered for the next transition
    pub fn is_registered(&self, key: &str) -> bool {
        self.state.borrow().keys.contains(key)
    }

    /// Registered keys in registration order
    pub fn registered_keys(&self) -> Vec<String> {
        self.state.borrow().keys.keys()
    }

    /// Keys captured from the previous page and not resolved yet
    pub fn pending_keys(&self) -> Vec<String> {
        self.state.borrow().pending.keys()
    }

    /// Companions attached to `anchor`
    pub fn companions_of(&self, anchor: ElementId) -> Vec<ElementId> {
        self.state.borrow().companions.companions_of(anchor).to_vec()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> TransitionPhase {
        self.state.borrow().phase
    }

    /// Get statistics about the coordinator
    pub fn stats(&self) -> CoordinatorStats {
        let state = self.state.borrow();
        CoordinatorStats {
            registered: state.keys.len(),
            companion_anchors: state.companions.len(),
            pending: state.pending.len(),
            snapshots: self.counters.snapshots.get(),
            started: self.counters.started.get(),
            cancelled: self.counters.cancelled.get(),
        }
    }

    // =========================================================================
    // Capture phase
    // =========================================================================

    /// Snapshot every registered key before leaving the current page
    ///
    /// List keys are only captured with a parameter and the extended feature
    /// set; a list snapshots the item equal to the parameter. Captured keys
    /// move to the pending ledger. The key and companion registries are
    /// empty afterwards.
    pub fn capture(&self, parameter: Option<&NavParam>) {
        let parameter = NavParam::effective(parameter);
        let keys = {
            let mut state = self.state.borrow_mut();
            state.keys.take()
        };
        let capabilities = self.config.capabilities;
        let mut captured = Vec::with_capacity(keys.len());

        for (key, target) in keys.iter() {
            let snapshotted = match target {
                AnimationTarget::List(bindings) => match parameter {
                    Some(param) if capabilities.supports_list_animations() => {
                        for binding in bindings {
                            let Some(list) = binding.list() else {
                                tracing::trace!("list for '{}' was dropped before capture", key);
                                continue;
                            };
                            if list.contains(param) {
                                list.prepare_snapshot(key, param, binding.element_name());
                                Counters::bump(&self.counters.snapshots);
                            }
                        }
                        true
                    }
                    _ => {
                        tracing::trace!("skipping list key '{}' without parameter", key);
                        false
                    }
                },
                AnimationTarget::Element(element) => {
                    self.engine.prepare_snapshot(key, *element);
                    Counters::bump(&self.counters.snapshots);
                    true
                }
            };

            if snapshotted {
                captured.push((key.to_string(), target.clone()));
            }
        }

        let mut state = self.state.borrow_mut();
        for (key, target) in captured {
            state.pending.insert(key, target);
        }
        state.keys.clear();
        state.companions.clear();
        state.phase = TransitionPhase::Captured;
        tracing::debug!(
            "captured connected animations, {} pending",
            state.pending.len()
        );
    }

    // =========================================================================
    // Completion phase
    // =========================================================================

    /// Start in-flight animations on the destination page
    ///
    /// `parameter` is the effective navigation parameter, already resolved
    /// for back navigation. Pending keys without a destination are
    /// cancelled, and the pending ledger is empty afterwards.
    pub fn complete(&self, parameter: Option<&NavParam>) {
        let parameter = NavParam::effective(parameter).cloned();
        let (destinations, companions, mut pending) = {
            let mut state = self.state.borrow_mut();
            (
                state.keys.clone(),
                state.companions.clone(),
                state.pending.take(),
            )
        };
        let capabilities = self.config.capabilities;
        let mut handed_off = FxHashSet::default();

        for (key, target) in destinations.iter() {
            let Some(animation) = self.engine.in_flight(key) else {
                tracing::trace!("no in-flight animation for '{}'", key);
                continue;
            };

            match target {
                AnimationTarget::List(bindings) => {
                    let Some(param) = parameter
                        .as_ref()
                        .filter(|_| capabilities.supports_list_animations())
                    else {
                        continue;
                    };

                    // One in-flight animation has one destination: the first
                    // live list holding the item wins.
                    let matched = bindings.iter().find_map(|binding| {
                        let list = binding.list()?;
                        list.contains(param).then_some((binding, list))
                    });
                    let Some((binding, list)) = matched else {
                        continue;
                    };

                    list.scroll_into_view(param);
                    self.schedule_list_start(
                        key,
                        animation,
                        &list,
                        param.clone(),
                        binding.element_name(),
                    );
                    pending.unregister_list_item(binding.list_id(), key);
                    handed_off.insert(key.to_string());
                }
                AnimationTarget::Element(element) => {
                    let group = companions.companions_of(*element);
                    let started = if capabilities.supports_companions() && !group.is_empty() {
                        animation.start_with_companions(*element, group)
                    } else {
                        animation.start(*element)
                    };

                    if started {
                        tracing::debug!("started connected animation '{}'", key);
                        Counters::bump(&self.counters.started);
                    } else {
                        tracing::warn!("connected animation '{}' refused to start", key);
                        animation.cancel();
                        Counters::bump(&self.counters.cancelled);
                    }
                    pending.unregister(key);
                }
            }
        }

        for (key, _) in pending.iter() {
            if handed_off.contains(key) {
                continue;
            }
            if let Some(animation) = self.engine.in_flight(key) {
                tracing::debug!("cancelling unmatched connected animation '{}'", key);
                animation.cancel();
                Counters::bump(&self.counters.cancelled);
            }
        }

        let mut state = self.state.borrow_mut();
        state.pending.clear();
        state.phase = TransitionPhase::Idle;
    }

    /// Start `animation` on a list item once its scroll has settled
    ///
    /// Failures cancel the animation and stay inside the continuation.
    fn schedule_list_start(
        &self,
        key: &str,
        animation: AnimationHandle,
        list: &Rc<dyn ListControl>,
        param: NavParam,
        element_name: &str,
    ) {
        let key = key.to_string();
        let element_name = element_name.to_string();
        let list = Rc::downgrade(list);
        let settle_frames = self.config.settle_frames;
        let budget = self.config.start_budget_frames;
        let this = self.this.clone();

        self.dispatcher.spawn_local(
            async move {
                for _ in 0..settle_frames {
                    yield_frame().await;
                }

                let attempt = list.upgrade().map(|list| {
                    list.start_from_animation(animation.clone(), &param, &element_name)
                });
                let outcome = match (attempt, budget) {
                    (None, _) => Err(ConnectedError::ListDropped),
                    (Some(attempt), Some(frames)) => with_frame_budget(attempt, frames).await,
                    (Some(attempt), None) => attempt.await,
                }
                .and_then(|started| {
                    if started {
                        Ok(())
                    } else {
                        Err(ConnectedError::ItemNotRealized { key: key.clone() })
                    }
                });

                let started = match outcome {
                    Ok(()) => {
                        tracing::debug!("started connected animation '{}' on list item", key);
                        true
                    }
                    Err(err) => {
                        tracing::warn!("cancelling connected animation '{}': {}", key, err);
                        animation.cancel();
                        false
                    }
                };

                if let Some(coordinator) = this.upgrade() {
                    if started {
                        Counters::bump(&coordinator.counters.started);
                    } else {
                        Counters::bump(&coordinator.counters.cancelled);
                    }
                }
            }
            .boxed_local(),
        );
    }
}

impl Drop for TransitionCoordinator {
    fn drop(&mut self) {
        self.detach();
    }
}
