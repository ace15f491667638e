use dash_core::NodeId;
use smallvec::SmallVec;

/// Ordered set of selected node ids, in the order they were selected.
///
/// The selection itself does not know about locks; the editor only ever
/// adds unlocked, non-root nodes and prunes entries that become invalid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: SmallVec<[NodeId; 4]>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// The first node selected; the property panel shows this one.
    pub fn primary(&self) -> Option<NodeId> {
        self.ids.first().copied()
    }

    /// Replace the selection. Returns whether it changed.
    pub fn set(&mut self, ids: impl IntoIterator<Item = NodeId>) -> bool {
        let mut next: SmallVec<[NodeId; 4]> = SmallVec::new();
        for id in ids {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        if next == self.ids {
            return false;
        }
        self.ids = next;
        true
    }

    pub fn add(&mut self, id: NodeId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: NodeId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|s| *s != id);
        self.ids.len() != before
    }

    pub fn toggle(&mut self, id: NodeId) {
        if !self.remove(id) {
            self.ids.push(id);
        }
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        changed
    }

    /// Keep only ids matching `keep`. Returns whether anything was dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| keep(*id));
        self.ids.len() != before
    }
}
