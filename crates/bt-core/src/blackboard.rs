//! Scoped key/value store shared between nodes.
//!
//! A [`Blackboard`] is a cheap handle; clones see the same entries. A scoped
//! blackboard holds a *weak* link to its parent which is consulted only when a
//! key is missing locally. Dropping every handle to the parent makes the link
//! dangle, it never keeps the parent alive.

use std::any::Any;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

type Value = Arc<dyn Any + Send + Sync>;

/// Typed name of a blackboard entry.
pub struct BbKey<T: 'static> {
    name: Cow<'static, str>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> BbKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _phantom: PhantomData,
        }
    }

    /// Key built from a runtime string, e.g. one read from an authored file.
    pub fn owned(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _phantom: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: 'static> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T: 'static> fmt::Debug for BbKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BbKey").field(&self.name).finish()
    }
}

impl<T: 'static> PartialEq for BbKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T: 'static> Eq for BbKey<T> {}

impl<T: 'static> Hash for BbKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T: 'static> AsRef<str> for BbKey<T> {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

struct Inner {
    // `None` marks a key that is present but explicitly null.
    values: RwLock<BTreeMap<String, Option<Value>>>,
    parent: Option<Weak<Inner>>,
}

impl Inner {
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Option<Value>>> {
        self.values.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Option<Value>>> {
        self.values.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct Blackboard {
    inner: Arc<Inner>,
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Blackboard {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                values: RwLock::new(BTreeMap::new()),
                parent: None,
            }),
        }
    }

    /// Creates an empty blackboard that falls back to `parent` for reads.
    pub fn with_parent(parent: &Blackboard) -> Self {
        Self {
            inner: Arc::new(Inner {
                values: RwLock::new(BTreeMap::new()),
                parent: Some(Arc::downgrade(&parent.inner)),
            }),
        }
    }

    /// The parent, if one was linked and is still alive.
    pub fn parent(&self) -> Option<Blackboard> {
        let inner = self.inner.parent.as_ref()?.upgrade()?;
        Some(Self { inner })
    }

    /// Whether both handles point at the same store.
    pub fn ptr_eq(&self, other: &Blackboard) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn set<T: Any + Send + Sync>(&self, key: &BbKey<T>, value: T) {
        self.inner
            .write()
            .insert(key.name().to_owned(), Some(Arc::new(value)));
    }

    /// Stores an explicit null: the key is present but carries no value.
    pub fn set_null(&self, key: impl AsRef<str>) {
        self.inner.write().insert(key.as_ref().to_owned(), None);
    }

    /// Reads a value, walking up the parent chain when the key is missing
    /// locally. Returns `None` for missing and null entries.
    ///
    /// # Panics
    ///
    /// Panics if the stored value has a different type than `T`.
    pub fn get<T: Clone + 'static>(&self, key: &BbKey<T>) -> Option<T> {
        self.with(key, T::clone)
    }

    /// Borrows a value without cloning it. Same lookup and panics as [`get`].
    ///
    /// [`get`]: Blackboard::get
    pub fn with<T: 'static, R>(&self, key: &BbKey<T>, f: impl FnOnce(&T) -> R) -> Option<R> {
        let value = self.resolve(key.name())??;
        let typed = value.downcast_ref::<T>().unwrap_or_else(|| {
            panic!(
                "blackboard type mismatch for key {:?} (stored type differs from requested)",
                key.name()
            )
        });
        Some(f(typed))
    }

    /// Present anywhere in the chain, null entries included.
    pub fn contains(&self, key: impl AsRef<str>) -> bool {
        self.resolve(key.as_ref()).is_some()
    }

    /// Present anywhere in the chain and not null.
    pub fn has_value(&self, key: impl AsRef<str>) -> bool {
        matches!(self.resolve(key.as_ref()), Some(Some(_)))
    }

    pub fn contains_local(&self, key: impl AsRef<str>) -> bool {
        self.inner.read().contains_key(key.as_ref())
    }

    /// Removes a local entry. Parent entries are never touched.
    pub fn remove(&self, key: impl AsRef<str>) -> bool {
        self.inner.write().remove(key.as_ref()).is_some()
    }

    /// Drops every local entry. Parent entries are never touched.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Local keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    // Outer `None`: missing everywhere. `Some(None)`: nearest entry is null.
    // A local entry, null or not, shadows the parent's.
    fn resolve(&self, name: &str) -> Option<Option<Value>> {
        let mut current = Arc::clone(&self.inner);
        loop {
            let found = current.read().get(name).cloned();
            if found.is_some() {
                return found;
            }
            let parent = current.parent.as_ref()?.upgrade()?;
            current = parent;
        }
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blackboard")
            .field("keys", &self.keys())
            .field("has_parent", &self.parent().is_some())
            .finish()
    }
}
