//! Class-like table of named callables with scoped, reversible substitution.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::args::{CallArgs, CallKind};
use crate::callable::Callable;

/// One active swap: the entry that was current when it was installed
struct SwapLayer {
    id: u64,
    saved: Arc<dyn Callable>,
}

/// Current entry plus the stack of swaps layered over it
struct Slot {
    current: Arc<dyn Callable>,
    layers: Vec<SwapLayer>,
}

/// Named callables plus a shared attribute object (the "class")
pub struct Namespace {
    name: String,
    attrs: Value,
    entries: DashMap<String, Slot>,
    next_swap_id: AtomicU64,
}

impl Namespace {
    pub fn new(name: impl Into<String>, attrs: Value) -> Self {
        Self {
            name: name.into(),
            attrs,
            entries: DashMap::new(),
            next_swap_id: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute object passed to class methods
    pub fn attrs(&self) -> &Value {
        &self.attrs
    }

    /// Define or replace an entry. Active swaps on the name stay in place.
    pub fn define(&self, name: impl Into<String>, callable: Arc<dyn Callable>) {
        self.entries
            .entry(name.into())
            .and_modify(|slot| slot.current = callable.clone())
            .or_insert_with(|| Slot {
                current: callable,
                layers: Vec::new(),
            });
    }

    /// Current entry under `name`
    pub fn get(&self, name: &str) -> Option<Arc<dyn Callable>> {
        self.entries.get(name).map(|slot| slot.current.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of swaps currently active on `name`
    pub fn active_swaps(&self, name: &str) -> usize {
        self.entries.get(name).map_or(0, |slot| slot.layers.len())
    }

    fn missing(&self, name: &str) -> anyhow::Error {
        anyhow!("'{}' has no attribute '{}'", self.name, name)
    }

    fn lookup(&self, name: &str) -> Result<Arc<dyn Callable>> {
        self.get(name).ok_or_else(|| self.missing(name))
    }

    /// Invoke through the namespace itself. Class methods receive the
    /// attribute object; an unbound method expects its receiver as the
    /// first positional argument.
    pub fn call(&self, name: &str, args: CallArgs) -> Result<Value> {
        let callable = self.lookup(name)?;
        let args = match callable.signature().kind {
            CallKind::ClassMethod => args.prepend(self.attrs.clone()),
            CallKind::Function | CallKind::Method | CallKind::Static => args,
        };
        trace!(namespace = %self.name, entry = name, "Calling entry");
        callable.call(args)
    }

    /// Invoke on an instance
    pub fn call_method(&self, receiver: Value, name: &str, args: CallArgs) -> Result<Value> {
        let callable = self.lookup(name)?;
        let args = match callable.signature().kind {
            CallKind::Method => args.prepend(receiver),
            CallKind::ClassMethod => args.prepend(self.attrs.clone()),
            CallKind::Function | CallKind::Static => args,
        };
        trace!(namespace = %self.name, entry = name, "Calling method");
        callable.call(args)
    }

    /// Install `replacement` under `name` until the returned guard drops.
    ///
    /// Guards may drop in any order. Each one removes only its own layer,
    /// and the entry defined before the first swap is back once every
    /// guard on the name is gone.
    pub fn swap(&self, name: &str, replacement: Arc<dyn Callable>) -> Result<SwapGuard<'_>> {
        let mut slot = self.entries.get_mut(name).ok_or_else(|| self.missing(name))?;
        let id = self.next_swap_id.fetch_add(1, Ordering::Relaxed);
        let saved = std::mem::replace(&mut slot.current, replacement);
        slot.layers.push(SwapLayer { id, saved });
        let depth = slot.layers.len();
        drop(slot);

        debug!(namespace = %self.name, entry = name, depth, "Swapped in replacement");

        Ok(SwapGuard {
            namespace: self,
            name: name.to_string(),
            id,
        })
    }

    fn restore(&self, name: &str, id: u64) {
        let Some(mut slot) = self.entries.get_mut(name) else {
            return;
        };
        let Some(pos) = slot.layers.iter().position(|layer| layer.id == id) else {
            return;
        };
        let layer = slot.layers.remove(pos);
        if pos == slot.layers.len() {
            slot.current = layer.saved;
            debug!(namespace = %self.name, entry = name, "Restored original");
        } else {
            // The layer above was saving our replacement; hand it our saved entry instead
            slot.layers[pos].saved = layer.saved;
            debug!(namespace = %self.name, entry = name, "Removed inner swap out of order");
        }
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        entries.sort();
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("attrs", &self.attrs)
            .field("entries", &entries)
            .finish()
    }
}

/// Restores the swapped-out entry on drop
#[must_use = "the original is restored as soon as the guard is dropped"]
pub struct SwapGuard<'a> {
    namespace: &'a Namespace,
    name: String,
    id: u64,
}

impl SwapGuard<'_> {
    /// Entry this guard will put back if it is the last one on its name
    pub fn original(&self) -> Option<Arc<dyn Callable>> {
        let slot = self.namespace.entries.get(&self.name)?;
        slot.layers
            .iter()
            .find(|layer| layer.id == self.id)
            .map(|layer| layer.saved.clone())
    }
}

impl fmt::Debug for SwapGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapGuard")
            .field("namespace", &self.namespace.name)
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for SwapGuard<'_> {
    fn drop(&mut self) {
        self.namespace.restore(&self.name, self.id);
    }
}
