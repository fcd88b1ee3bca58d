//! Node storage
//!
//! The store owns every node a scene knows about, attached or not, plus the
//! physics aspect of physics-enabled nodes. It outlives its scene:
//! [`Scene::teardown`](super::Scene::teardown) hands it back so nodes can be
//! reused by the next scene. Ids issued by another store are never found.

use crate::foundation::collections::{NodeId, NodeKey, SecondaryMap, SlotMap, StoreId};
use crate::physics::PhysicsAspect;

use super::node::{NodeRole, SceneNode};

/// Arena of scene nodes
#[derive(Debug)]
pub struct NodeStore {
    stamp: StoreId,
    nodes: SlotMap<NodeKey, SceneNode>,
    physics: SecondaryMap<NodeKey, PhysicsAspect>,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self {
            stamp: StoreId::next(),
            nodes: SlotMap::with_key(),
            physics: SecondaryMap::new(),
        }
    }
}

impl NodeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp carried by every id this store issues
    pub fn id(&self) -> StoreId {
        self.stamp
    }

    /// Number of stored nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check if a node exists
    pub fn contains(&self, id: NodeId) -> bool {
        self.key(id).is_some_and(|key| self.nodes.contains_key(key))
    }

    /// Look up a node
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(self.key(id)?)
    }

    /// Physics aspect of a node, if it is physics-enabled
    pub fn physics(&self, id: NodeId) -> Option<&PhysicsAspect> {
        self.physics.get(self.key(id)?)
    }

    /// Iterate over all nodes
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        let stamp = self.stamp;
        self.nodes.iter().map(move |(key, node)| (NodeId::new(stamp, key), node))
    }

    /// Nodes not attached to any context
    pub fn detached(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.role() == NodeRole::Detached)
            .map(|(key, _)| NodeId::new(self.stamp, key))
    }

    /// Key of an id issued by this store
    fn key(&self, id: NodeId) -> Option<NodeKey> {
        (id.store() == self.stamp).then_some(id.key())
    }

    pub(crate) fn insert(&mut self, node: SceneNode) -> NodeId {
        NodeId::new(self.stamp, self.nodes.insert(node))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        let key = self.key(id)?;
        self.nodes.get_mut(key)
    }

    /// Remove a node and its physics aspect
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<(SceneNode, Option<PhysicsAspect>)> {
        let key = self.key(id)?;
        let node = self.nodes.remove(key)?;
        Some((node, self.physics.remove(key)))
    }

    pub(crate) fn physics_mut(&mut self, id: NodeId) -> Option<&mut PhysicsAspect> {
        let key = self.key(id)?;
        self.physics.get_mut(key)
    }

    /// Node and physics aspect together, for code that reads one while
    /// updating the other
    pub(crate) fn node_and_physics_mut(&mut self, id: NodeId) -> Option<(&mut SceneNode, &mut PhysicsAspect)> {
        let key = self.key(id)?;
        let node = self.nodes.get_mut(key)?;
        let aspect = self.physics.get_mut(key)?;
        Some((node, aspect))
    }

    /// Attach an aspect, returning the one it replaces
    ///
    /// Does nothing for nodes that are not in the store.
    pub(crate) fn set_physics(&mut self, id: NodeId, aspect: PhysicsAspect) -> Option<PhysicsAspect> {
        let key = self.key(id).filter(|&key| self.nodes.contains_key(key))?;
        self.physics.insert(key, aspect)
    }

    pub(crate) fn take_physics(&mut self, id: NodeId) -> Option<PhysicsAspect> {
        let key = self.key(id)?;
        self.physics.remove(key)
    }

    /// Ids of all physics-enabled nodes
    pub(crate) fn physics_ids(&self) -> Vec<NodeId> {
        self.physics.keys().map(|key| NodeId::new(self.stamp, key)).collect()
    }

    /// The node and all of its descendants, parents before children
    pub(crate) fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(id) {
                out.push(id);
                stack.extend(node.children().iter().rev());
            }
        }
        out
    }

    /// Check if `ancestor` is `id` or one of its parents
    pub(crate) fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.get(node_id).and_then(SceneNode::parent);
        }
        false
    }
}
