//! Recording mocks of the platform collaborators, shared by unit tests

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::config::CoordinatorConfig;
use crate::coordinator::TransitionCoordinator;
use crate::element::{ElementId, ListId, NavParam};
use crate::error::ConnectedError;
use crate::executor::{yield_frame, FrameExecutor, UiDispatcher};
use crate::navigation::{
    LoadedCallback, NavigatedHandler, NavigatingAway, NavigatingAwayHandler, Navigated,
    NavigationHost, NavigationMode, PageContent, SubscriptionId,
};
use crate::platform::{AnimationEngine, AnimationHandle, ConnectedAnimation, ListControl};

/// A collaborator call observed by the mocks
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Snapshot {
        key: String,
        element: ElementId,
    },
    ListSnapshot {
        list: ListId,
        key: String,
        param: NavParam,
        element_name: String,
    },
    Start {
        key: String,
        target: ElementId,
        companions: Vec<ElementId>,
    },
    Cancel {
        key: String,
    },
    Scroll {
        list: ListId,
        param: NavParam,
    },
    ListStart {
        list: ListId,
        param: NavParam,
        element_name: String,
    },
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

type InFlight = Rc<RefCell<FxHashMap<String, Rc<MockAnimation>>>>;

pub fn el(raw: u64) -> ElementId {
    ElementId::from_raw(raw)
}

/// Install a test subscriber once; repeated calls are ignored
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Animation engine
// =============================================================================

pub struct MockAnimation {
    key: String,
    log: CallLog,
    in_flight: Weak<RefCell<FxHashMap<String, Rc<MockAnimation>>>>,
    done: Cell<bool>,
    refuse: bool,
}

impl MockAnimation {
    fn finish(&self) {
        self.done.set(true);
        if let Some(in_flight) = self.in_flight.upgrade() {
            in_flight.borrow_mut().remove(&self.key);
        }
    }
}

impl ConnectedAnimation for MockAnimation {
    fn start(&self, target: ElementId) -> bool {
        self.start_with_companions(target, &[])
    }

    fn start_with_companions(&self, target: ElementId, companions: &[ElementId]) -> bool {
        if self.done.get() || self.refuse {
            return false;
        }
        self.log.borrow_mut().push(Call::Start {
            key: self.key.clone(),
            target,
            companions: companions.to_vec(),
        });
        self.finish();
        true
    }

    fn cancel(&self) {
        self.log.borrow_mut().push(Call::Cancel {
            key: self.key.clone(),
        });
        self.finish();
    }
}

/// Engine that keeps one in-flight animation per snapshotted key
#[derive(Default)]
pub struct MockEngine {
    log: CallLog,
    in_flight: InFlight,
    refuse_starts: Cell<bool>,
}

impl MockEngine {
    /// Prepare an in-flight animation for `key`, as a snapshot would
    pub fn prepare(&self, key: &str) {
        let animation = Rc::new(MockAnimation {
            key: key.to_string(),
            log: self.log.clone(),
            in_flight: Rc::downgrade(&self.in_flight),
            done: Cell::new(false),
            refuse: self.refuse_starts.get(),
        });
        self.in_flight
            .borrow_mut()
            .insert(key.to_string(), animation);
    }

    /// Make animations prepared from now on refuse to start
    pub fn refuse_starts(&self) {
        self.refuse_starts.set(true);
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.borrow().contains_key(key)
    }
}

impl AnimationEngine for MockEngine {
    fn prepare_snapshot(&self, key: &str, element: ElementId) {
        self.log.borrow_mut().push(Call::Snapshot {
            key: key.to_string(),
            element,
        });
        self.prepare(key);
    }

    fn in_flight(&self, key: &str) -> Option<AnimationHandle> {
        let animation = self.in_flight.borrow().get(key).cloned()?;
        Some(animation as AnimationHandle)
    }
}

// =============================================================================
// List control
// =============================================================================

/// How a mock list reacts to a start request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartBehavior {
    /// Realize the item after the given frames and start
    Succeed { frames: u32 },
    /// Fail with an error after the given frames
    Fail { frames: u32 },
    /// Never finish
    Hang,
}

pub struct MockList {
    id: ListId,
    items: RefCell<Vec<NavParam>>,
    engine: Option<Rc<MockEngine>>,
    log: CallLog,
    behavior: Cell<StartBehavior>,
}

impl MockList {
    /// Standalone list with its own call log
    pub fn new(raw_id: u64, items: &[NavParam]) -> Rc<Self> {
        Rc::new(Self {
            id: ListId::from_raw(raw_id),
            items: RefCell::new(items.to_vec()),
            engine: None,
            log: CallLog::default(),
            behavior: Cell::new(StartBehavior::Succeed { frames: 0 }),
        })
    }

    /// List with a null identity
    pub fn new_null() -> Rc<Self> {
        Rc::new(Self {
            id: ListId::default(),
            items: RefCell::new(Vec::new()),
            engine: None,
            log: CallLog::default(),
            behavior: Cell::new(StartBehavior::Succeed { frames: 0 }),
        })
    }

    pub fn as_dyn(self: &Rc<Self>) -> Rc<dyn ListControl> {
        self.clone()
    }

    pub fn set_behavior(&self, behavior: StartBehavior) {
        self.behavior.set(behavior);
    }

    /// Element the list realizes for an item
    pub fn realized_element(&self) -> ElementId {
        ElementId::from_raw(1000 + (self.id.to_raw() & 0xffff_ffff))
    }
}

impl ListControl for MockList {
    fn id(&self) -> ListId {
        self.id
    }

    fn contains(&self, param: &NavParam) -> bool {
        self.items.borrow().contains(param)
    }

    fn prepare_snapshot(&self, key: &str, param: &NavParam, element_name: &str) {
        self.log.borrow_mut().push(Call::ListSnapshot {
            list: self.id,
            key: key.to_string(),
            param: param.clone(),
            element_name: element_name.to_string(),
        });
        if let Some(engine) = &self.engine {
            engine.prepare(key);
        }
    }

    fn scroll_into_view(&self, param: &NavParam) {
        self.log.borrow_mut().push(Call::Scroll {
            list: self.id,
            param: param.clone(),
        });
    }

    fn start_from_animation(
        &self,
        animation: AnimationHandle,
        param: &NavParam,
        element_name: &str,
    ) -> LocalBoxFuture<'static, crate::Result<bool>> {
        self.log.borrow_mut().push(Call::ListStart {
            list: self.id,
            param: param.clone(),
            element_name: element_name.to_string(),
        });
        let behavior = self.behavior.get();
        let target = self.realized_element();

        async move {
            match behavior {
                StartBehavior::Succeed { frames } => {
                    for _ in 0..frames {
                        yield_frame().await;
                    }
                    Ok(animation.start(target))
                }
                StartBehavior::Fail { frames } => {
                    for _ in 0..frames {
                        yield_frame().await;
                    }
                    Err(ConnectedError::StartFailed("item not realized".to_string()))
                }
                StartBehavior::Hang => futures::future::pending().await,
            }
        }
        .boxed_local()
    }
}

// =============================================================================
// Navigation host and pages
// =============================================================================

#[derive(Default)]
pub struct MockPage {
    loaded: RefCell<Vec<LoadedCallback>>,
}

impl MockPage {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Report the visual tree as loaded, running each callback once
    pub fn fire_loaded(&self) {
        let callbacks = std::mem::take(&mut *self.loaded.borrow_mut());
        for callback in callbacks {
            callback();
        }
    }
}

impl PageContent for MockPage {
    fn on_loaded(&self, callback: LoadedCallback) {
        self.loaded.borrow_mut().push(callback);
    }
}

#[derive(Clone)]
enum Handler {
    Away(Rc<dyn Fn(&mut NavigatingAway)>),
    Navigated(Rc<dyn Fn(&Navigated)>),
}

/// Frame-like host with back and forward stacks of parameters
#[derive(Default)]
pub struct MockHost {
    handlers: RefCell<SlotMap<SubscriptionId, Handler>>,
    current: RefCell<Option<NavParam>>,
    back: RefCell<Vec<Option<NavParam>>>,
    forward: RefCell<Vec<Option<NavParam>>>,
    veto: Cell<bool>,
}

impl MockHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Make another listener veto the next navigation
    pub fn veto_next(&self) {
        self.veto.set(true);
    }

    fn raise_away(&self, parameter: Option<NavParam>, mode: NavigationMode) -> bool {
        let mut event = NavigatingAway {
            parameter,
            mode,
            cancel: false,
        };
        let handlers: Vec<_> = self.handlers.borrow().values().cloned().collect();
        for handler in handlers {
            if let Handler::Away(handler) = handler {
                handler(&mut event);
            }
        }
        if self.veto.replace(false) {
            event.cancel = true;
        }
        !event.cancel
    }

    fn raise_navigated(
        &self,
        page: &Rc<MockPage>,
        parameter: Option<NavParam>,
        mode: NavigationMode,
    ) {
        let event = Navigated {
            content: page.clone(),
            mode,
            parameter,
        };
        let handlers: Vec<_> = self.handlers.borrow().values().cloned().collect();
        for handler in handlers {
            if let Handler::Navigated(handler) = handler {
                handler(&event);
            }
        }
    }

    /// Navigate to a new page
    pub fn navigate(&self, page: &Rc<MockPage>, parameter: Option<NavParam>) -> bool {
        if !self.raise_away(parameter.clone(), NavigationMode::New) {
            return false;
        }
        let previous = self.current.replace(parameter.clone());
        self.back.borrow_mut().push(previous);
        self.forward.borrow_mut().clear();
        self.raise_navigated(page, parameter, NavigationMode::New);
        true
    }

    /// Return to the previous page
    pub fn go_back(&self, page: &Rc<MockPage>) -> bool {
        let Some(target) = self.back.borrow().last().cloned() else {
            return false;
        };
        if !self.raise_away(target.clone(), NavigationMode::Back) {
            return false;
        }
        self.back.borrow_mut().pop();
        let left = self.current.replace(target.clone());
        self.forward.borrow_mut().push(left);
        self.raise_navigated(page, target, NavigationMode::Back);
        true
    }
}

impl NavigationHost for MockHost {
    fn on_navigating_away(&self, handler: NavigatingAwayHandler) -> SubscriptionId {
        self.handlers
            .borrow_mut()
            .insert(Handler::Away(Rc::from(handler)))
    }

    fn on_navigated(&self, handler: NavigatedHandler) -> SubscriptionId {
        self.handlers
            .borrow_mut()
            .insert(Handler::Navigated(Rc::from(handler)))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.handlers.borrow_mut().remove(id);
    }

    fn forward_stack_parameter(&self) -> Option<NavParam> {
        self.forward.borrow().last().cloned().flatten()
    }
}

// =============================================================================
// Harness
// =============================================================================

/// A coordinator wired to mock collaborators
pub struct Harness {
    pub log: CallLog,
    pub engine: Rc<MockEngine>,
    pub executor: FrameExecutor,
    pub host: Rc<MockHost>,
    pub coordinator: Rc<TransitionCoordinator>,
}

impl Harness {
    /// Coordinator attached to a mock host
    pub fn new(config: CoordinatorConfig) -> Self {
        let harness = Self::detached(config);
        harness.coordinator.attach(&harness.host);
        harness
    }

    /// Coordinator not subscribed to any host
    pub fn detached(config: CoordinatorConfig) -> Self {
        init_tracing();
        let log = CallLog::default();
        let engine = Rc::new(MockEngine {
            log: log.clone(),
            ..Default::default()
        });
        let executor = FrameExecutor::new();
        let dispatcher: Rc<dyn UiDispatcher> = Rc::new(executor.clone());
        let coordinator = TransitionCoordinator::new(config, engine.clone(), dispatcher);
        Self {
            log,
            engine,
            executor,
            host: MockHost::new(),
            coordinator,
        }
    }

    /// A list sharing this harness' call log and engine
    pub fn list(&self, raw_id: u64, items: &[NavParam]) -> Rc<MockList> {
        Rc::new(MockList {
            id: ListId::from_raw(raw_id),
            items: RefCell::new(items.to_vec()),
            engine: Some(self.engine.clone()),
            log: self.log.clone(),
            behavior: Cell::new(StartBehavior::Succeed { frames: 0 }),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    /// Calls that started or cancelled something
    pub fn outcomes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Start { .. } | Call::Cancel { .. }))
            .collect()
    }
}
