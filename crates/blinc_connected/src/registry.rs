//! Key registry for connected animation targets
//!
//! Maps animation keys to the element, or the list item bindings, that take
//! part in a transition. The same registry type backs both the live key
//! registry and the pending-from-previous ledger kept between the capture
//! and completion phases.

use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use slotmap::Key;
use smallvec::SmallVec;

use crate::element::{ElementId, ListId};
use crate::platform::ListControl;

/// A `(list control, element name)` pair registered under a key
#[derive(Clone)]
pub struct ListBinding {
    list_id: ListId,
    list: Weak<dyn ListControl>,
    element_name: String,
}

impl ListBinding {
    fn new(list: &Rc<dyn ListControl>, element_name: &str) -> Self {
        Self {
            list_id: list.id(),
            list: Rc::downgrade(list),
            element_name: element_name.to_string(),
        }
    }

    /// Identity of the bound list
    pub fn list_id(&self) -> ListId {
        self.list_id
    }

    /// The bound list, if it is still alive
    pub fn list(&self) -> Option<Rc<dyn ListControl>> {
        self.list.upgrade()
    }

    /// Name of the element inside each item template
    pub fn element_name(&self) -> &str {
        &self.element_name
    }
}

impl std::fmt::Debug for ListBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListBinding")
            .field("list_id", &self.list_id)
            .field("alive", &(self.list.strong_count() > 0))
            .field("element_name", &self.element_name)
            .finish()
    }
}

/// Bindings of a list target, usually one or two lists
pub type ListBindings = SmallVec<[ListBinding; 2]>;

/// What a key animates
#[derive(Clone, Debug)]
pub enum AnimationTarget {
    /// A single element
    Element(ElementId),
    /// Named elements inside items of one or more virtualized lists
    List(ListBindings),
}

impl AnimationTarget {
    /// Whether this is a list target
    pub fn is_list(&self) -> bool {
        matches!(self, AnimationTarget::List(_))
    }
}

/// Ordered map of animation keys to targets
#[derive(Clone, Debug, Default)]
pub struct TargetRegistry {
    targets: IndexMap<String, AnimationTarget>,
}

impl TargetRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `element` under `key`, replacing any previous target
    ///
    /// Empty keys and null elements are ignored.
    pub fn register_element(&mut self, key: &str, element: ElementId) {
        if key.is_empty() || element.is_null() {
            tracing::trace!("ignoring element registration for key {:?}", key);
            return;
        }
        self.targets
            .insert(key.to_string(), AnimationTarget::Element(element));
    }

    /// Register a named element inside the items of `list` under `key`
    ///
    /// Registering the same triple twice has no further effect. A single
    /// element target under the same key is replaced by a list target.
    pub fn register_list_item(
        &mut self,
        list: &Rc<dyn ListControl>,
        key: &str,
        element_name: &str,
    ) {
        if key.is_empty() || element_name.is_empty() || list.id().is_null() {
            tracing::trace!("ignoring list registration for key {:?}", key);
            return;
        }

        let list_id = list.id();
        let target = self
            .targets
            .entry(key.to_string())
            .or_insert_with(|| AnimationTarget::List(ListBindings::new()));

        match target {
            AnimationTarget::List(bindings) => {
                let exists = bindings
                    .iter()
                    .any(|b| b.list_id == list_id && b.element_name == element_name);
                if !exists {
                    bindings.push(ListBinding::new(list, element_name));
                }
            }
            AnimationTarget::Element(_) => {
                let mut bindings = ListBindings::new();
                bindings.push(ListBinding::new(list, element_name));
                *target = AnimationTarget::List(bindings);
            }
        }
    }

    /// Remove the bindings of `list_id` under `key`
    ///
    /// A key that is not a list target is removed outright, as is a list
    /// target left without bindings. Returns whether the key was removed.
    pub fn unregister_list_item(&mut self, list_id: ListId, key: &str) -> bool {
        if key.is_empty() || list_id.is_null() {
            return false;
        }

        let emptied = match self.targets.get_mut(key) {
            None => return false,
            Some(AnimationTarget::Element(_)) => true,
            Some(AnimationTarget::List(bindings)) => {
                bindings.retain(|b| b.list_id != list_id);
                bindings.is_empty()
            }
        };

        if emptied {
            self.targets.shift_remove(key);
        }
        emptied
    }

    /// Remove `key`. Returns the removed target.
    pub fn unregister(&mut self, key: &str) -> Option<AnimationTarget> {
        self.targets.shift_remove(key)
    }

    /// Insert a target as-is, replacing any previous one
    pub fn insert(&mut self, key: impl Into<String>, target: AnimationTarget) {
        self.targets.insert(key.into(), target);
    }

    /// Look up the target of `key`
    pub fn get(&self, key: &str) -> Option<&AnimationTarget> {
        self.targets.get(key)
    }

    /// Check if a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.targets.contains_key(key)
    }

    /// Iterate over keys and targets in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnimationTarget)> {
        self.targets.iter().map(|(k, t)| (k.as_str(), t))
    }

    /// All registered keys in registration order
    pub fn keys(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }

    /// Get the number of registered keys
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Drop every registration, releasing the backing storage
    pub fn clear(&mut self) {
        self.targets = IndexMap::new();
    }

    /// Move all registrations out, leaving the registry empty
    pub fn take(&mut self) -> TargetRegistry {
        std::mem::take(self)
    }
}
