//! Handle types for stable references
//!
//! Everything the scene hands out to callers is a generational `slotmap`
//! key, so a stale id never aliases an object created later. Node ids also
//! carry the [`StoreId`] of the store that issued them, so an id from one
//! scene is never valid in another.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use slotmap::Key;
pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Slot of a node inside one [`NodeStore`](crate::scene::NodeStore)
    pub struct NodeKey;

    /// Identifier of a camera registered with a scene
    pub struct CameraId;

    /// Handle of a body inside a physics world
    pub struct BodyHandle;
}

/// Process-unique stamp of a node store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(u32);

impl StoreId {
    /// Allocate a stamp no other store has
    pub fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identifier of a scene node
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    store: StoreId,
    key: NodeKey,
}

impl NodeId {
    pub(crate) fn new(store: StoreId, key: NodeKey) -> Self {
        Self { store, key }
    }

    /// Store that issued this id
    pub fn store(self) -> StoreId {
        self.store
    }

    pub(crate) fn key(self) -> NodeKey {
        self.key
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}:{:?})", self.store.0, self.key.data())
    }
}
