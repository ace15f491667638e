//! The scene graph: a tree of widgets rooted at the Root Frame.
//!
//! Nodes live in a `StableDiGraph` arena with parent → child edges and an
//! id → index table on the side, so reparenting is an edge rewrite and ids
//! survive detaching and re-attaching. Every geometry write is clamped
//! against the parent (or the virtual screen for the Root Frame) before it
//! is committed, and resizing a container re-clamps its descendants.

use crate::error::EditError;
use crate::geometry::{Rect, ScreenBounds, clamp_rect};
use crate::id::NodeId;
use crate::model::{Node, NodeKind};
use crate::template;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// A node detached from the graph together with its descendants.
///
/// Detaching hands ownership of the whole subtree to the caller (usually an
/// undo command); attaching it again restores every id, rect and z-index.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtree {
    pub node: Node,
    /// Attachment order among equal-z siblings.
    pub order: u64,
    /// Children in paint order.
    pub children: Vec<Subtree>,
}

impl Subtree {
    /// Number of nodes in the subtree, including its top.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Subtree::node_count).sum::<usize>()
    }

    /// All ids in pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = vec![self.node.id];
        for child in &self.children {
            out.extend(child.ids());
        }
        out
    }
}

/// One committed geometry write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectChange {
    pub id: NodeId,
    pub before: Rect,
    pub after: Rect,
}

/// One committed parent change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relink {
    pub id: NodeId,
    pub from_parent: NodeId,
    pub from_rect: Rect,
    pub from_order: u64,
    pub to_parent: NodeId,
    pub to_rect: Rect,
    pub to_order: u64,
}

/// Result of wrapping a selection in a new group.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped {
    pub group: NodeId,
    pub parent: NodeId,
    /// Members moved into the group, in paint order.
    pub relinks: Vec<Relink>,
}

/// Result of dissolving a container.
#[derive(Debug, Clone, PartialEq)]
pub struct Ungrouped {
    pub parent: NodeId,
    /// Former children moved to `parent`, in paint order.
    pub relinks: Vec<Relink>,
    /// The emptied container, already detached.
    pub container: Subtree,
}

/// The document tree.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    graph: StableDiGraph<Node, ()>,
    root: NodeIndex,
    id_index: HashMap<NodeId, NodeIndex>,
    /// Attachment order, the tie-break between equal z-indices.
    order: HashMap<NodeId, u64>,
    next_order: u64,
    screen: ScreenBounds,
}

impl SceneGraph {
    /// Create an empty document holding only a default Root Frame.
    #[must_use]
    pub fn new() -> Self {
        Self::with_screen(ScreenBounds::default())
    }

    #[must_use]
    pub fn with_screen(screen: ScreenBounds) -> Self {
        let mut graph = StableDiGraph::new();
        let root_node = template::root_frame();
        let root_id = root_node.id;
        let root = graph.add_node(root_node);

        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);

        let mut scene = Self {
            graph,
            root,
            id_index,
            order: HashMap::new(),
            next_order: 0,
            screen,
        };
        let rect = scene.graph[root].rect;
        scene.write_rect(root_id, rect);
        scene
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn screen(&self) -> ScreenBounds {
        self.screen
    }

    pub fn root_id(&self) -> NodeId {
        self.graph[self.root].id
    }

    pub fn root(&self) -> &Node {
        &self.graph[self.root]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Number of widgets, not counting the Root Frame.
    pub fn widget_count(&self) -> usize {
        self.graph.node_count() - 1
    }

    fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    fn require(&self, id: NodeId) -> Result<&Node, EditError> {
        self.get(id).ok_or(EditError::NotFound(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.index_of(id)?;
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
            .map(|p| self.graph[p].id)
    }

    /// Children in paint order: ascending z-index, ties by attachment order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut kids: Vec<(i32, u64, NodeId)> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|c| {
                let node = &self.graph[c];
                (node.z_index, self.order_of(node.id), node.id)
            })
            .collect();
        kids.sort_by_key(|&(z, order, _)| (z, order));
        kids.into_iter().map(|(_, _, id)| id).collect()
    }

    fn order_of(&self, id: NodeId) -> u64 {
        self.order.get(&id).copied().unwrap_or(0)
    }

    /// Highest z-index among the children of `parent` (0 when empty).
    pub fn top_z(&self, parent: NodeId) -> i32 {
        self.children(parent)
            .last()
            .and_then(|id| self.get(*id))
            .map_or(0, |n| n.z_index)
    }

    fn bottom_z(&self, parent: NodeId) -> i32 {
        self.children(parent)
            .first()
            .and_then(|id| self.get(*id))
            .map_or(0, |n| n.z_index)
    }

    /// The rectangle a node must stay inside, in its own coordinate space.
    pub fn bound_of(&self, id: NodeId) -> Option<Rect> {
        let node = self.get(id)?;
        if node.is_root() {
            return Some(self.screen.rect);
        }
        let parent = self.get(self.parent(id)?)?;
        Some(Rect::new(0, 0, parent.rect.width, parent.rect.height))
    }

    /// Rectangle in Root Frame coordinates (the Root Frame itself reports
    /// its screen rectangle).
    pub fn absolute_rect(&self, id: NodeId) -> Option<Rect> {
        let node = self.get(id)?;
        if node.is_root() {
            return Some(node.rect);
        }
        let mut rect = node.rect;
        let mut current = self.parent(id)?;
        while current != self.root_id() {
            let ancestor = self.get(current)?;
            rect = rect.translate(ancestor.rect.x, ancestor.rect.y);
            current = self.parent(current)?;
        }
        Some(rect)
    }

    /// Check whether `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = descendant;
        while let Some(parent) = self.parent(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// Depth-first walk from `from` (inclusive), children in paint order.
    pub fn traverse(&self, from: NodeId) -> Walk<'_> {
        let stack = if self.contains(from) {
            vec![from]
        } else {
            Vec::new()
        };
        Walk { scene: self, stack }
    }

    // ─── Attaching & detaching ───────────────────────────────────────────

    fn claim_order(&mut self) -> u64 {
        self.next_order += 1;
        self.next_order
    }

    fn check_container(&self, parent: NodeId) -> Result<(), EditError> {
        if self.require(parent)?.is_container() {
            Ok(())
        } else {
            Err(EditError::NotContainer(parent))
        }
    }

    /// Link `node` under `parent` without clamping or permission checks.
    fn link(&mut self, parent: NodeIndex, node: Node, order: Option<u64>) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        let order = order.unwrap_or_else(|| self.claim_order());
        self.next_order = self.next_order.max(order);
        self.order.insert(id, order);
        idx
    }

    /// Instantiate a widget from its template and place it as the topmost
    /// child of `parent` at local `(x, y)`.
    pub fn create(
        &mut self,
        kind: NodeKind,
        x: i32,
        y: i32,
        parent: NodeId,
    ) -> Result<NodeId, EditError> {
        if kind == NodeKind::RootFrame {
            return Err(EditError::RootFrame);
        }
        let node = template::instantiate(kind, NodeId::generate(), x, y);
        self.create_from(node, parent)
    }

    /// Insert a pre-built node as the topmost child of `parent`.
    ///
    /// Refused when `parent` is locked, missing or not a container, or when
    /// the node's id is already taken.
    pub fn create_from(&mut self, mut node: Node, parent: NodeId) -> Result<NodeId, EditError> {
        if node.is_root() {
            return Err(EditError::RootFrame);
        }
        let parent_node = self.require(parent)?;
        if parent_node.is_locked {
            return Err(EditError::Locked(parent));
        }
        self.check_container(parent)?;
        if self.contains(node.id) {
            return Err(EditError::DuplicateId(node.id));
        }

        node.z_index = node.z_index.max(self.top_z(parent));
        let id = node.id;
        let rect = node.rect;
        let parent_idx = self.id_index[&parent];
        self.link(parent_idx, node, None);
        self.write_rect(id, rect);
        log::debug!("created {id} under {parent}");
        Ok(id)
    }

    /// Re-attach a detached subtree under `parent`, restoring recorded ids,
    /// z-indices and attachment order. Rectangles are re-clamped.
    ///
    /// Used by undo/redo replay and paste; lock flags are not consulted.
    pub fn attach(&mut self, subtree: Subtree, parent: NodeId) -> Result<NodeId, EditError> {
        self.check_container(parent)?;
        if subtree.node.is_root() {
            return Err(EditError::RootFrame);
        }
        if let Some(taken) = subtree.ids().into_iter().find(|id| self.contains(*id)) {
            return Err(EditError::DuplicateId(taken));
        }
        let parent_idx = self.id_index[&parent];
        let id = subtree.node.id;
        self.attach_rec(parent_idx, subtree);
        let rect = self.graph[self.id_index[&id]].rect;
        self.write_rect(id, rect);
        Ok(id)
    }

    fn attach_rec(&mut self, parent: NodeIndex, subtree: Subtree) {
        let Subtree {
            node,
            order,
            children,
        } = subtree;
        let idx = self.link(parent, node, Some(order));
        for child in children {
            self.attach_rec(idx, child);
        }
    }

    /// Remove a node and its descendants, returning them as a `Subtree`.
    ///
    /// Used by undo/redo replay; lock flags are not consulted.
    pub fn detach(&mut self, id: NodeId) -> Result<Subtree, EditError> {
        let node = self.require(id)?;
        if node.is_root() {
            return Err(EditError::RootFrame);
        }
        self.detach_rec(id).ok_or(EditError::NotFound(id))
    }

    fn detach_rec(&mut self, id: NodeId) -> Option<Subtree> {
        let children = self
            .children(id)
            .into_iter()
            .filter_map(|c| self.detach_rec(c))
            .collect();
        let idx = self.id_index.remove(&id)?;
        let node = self.graph.remove_node(idx)?;
        let order = self.order.remove(&id).unwrap_or(0);
        Some(Subtree {
            node,
            order,
            children,
        })
    }

    /// Delete a node and its entire subtree.
    pub fn delete(&mut self, id: NodeId) -> Result<Subtree, EditError> {
        let node = self.require(id)?;
        if node.is_root() {
            return Err(EditError::RootFrame);
        }
        if node.is_locked {
            return Err(EditError::Locked(id));
        }
        let removed = self.detach(id)?;
        log::debug!("deleted {id} ({} nodes)", removed.node_count());
        Ok(removed)
    }

    /// Remove every widget, leaving only the Root Frame.
    pub fn clear(&mut self) {
        for child in self.children(self.root_id()) {
            self.detach_rec(child);
        }
    }

    /// Restore the Root Frame's geometry and style to their defaults.
    pub fn reset_root(&mut self) -> Vec<RectChange> {
        let defaults = template::root_frame();
        let root_id = self.root_id();
        if let Some(root) = self.get_mut(root_id) {
            root.name = defaults.name;
            root.style = defaults.style;
            root.z_index = defaults.z_index;
        }
        self.write_rect(root_id, defaults.rect)
    }

    /// Replace the Root Frame record wholesale (document load).
    pub(crate) fn replace_root(&mut self, mut node: Node) {
        node.id = self.root_id();
        node.kind = NodeKind::RootFrame;
        node.is_locked = false;
        let rect = node.rect;
        let root = self.root;
        self.graph[root] = node;
        self.write_rect(self.root_id(), rect);
    }

    /// Link a loaded node without clamping; the loader clamps afterwards.
    pub(crate) fn link_loaded(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = node.id;
        let parent_idx = self.id_index[&parent];
        self.link(parent_idx, node, None);
        id
    }

    // ─── Geometry ────────────────────────────────────────────────────────

    /// Clamp and commit a rectangle, then re-clamp descendants if the size
    /// changed. Lock flags are not consulted.
    ///
    /// Returns every rectangle that actually changed, parents before
    /// children.
    pub fn write_rect(&mut self, id: NodeId, requested: Rect) -> Vec<RectChange> {
        let mut changes = Vec::new();
        self.write_rect_into(id, requested, &mut changes);
        changes
    }

    fn write_rect_into(&mut self, id: NodeId, requested: Rect, changes: &mut Vec<RectChange>) {
        let (Some(bound), Some(node)) = (self.bound_of(id), self.get(id)) else {
            return;
        };
        let before = node.rect;
        let after = clamp_rect(requested, before, bound, node.kind.min_size());
        if after == before {
            return;
        }
        if let Some(node) = self.get_mut(id) {
            node.rect = after;
        }
        changes.push(RectChange { id, before, after });

        if after.width != before.width || after.height != before.height {
            for child in self.children(id) {
                if let Some(rect) = self.get(child).map(|c| c.rect) {
                    self.write_rect_into(child, rect, changes);
                }
            }
        }
    }

    /// Move and/or resize a node. Out-of-bound requests are clamped;
    /// locked nodes are refused.
    pub fn set_geometry(
        &mut self,
        id: NodeId,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<Vec<RectChange>, EditError> {
        if self.require(id)?.is_locked {
            return Err(EditError::Locked(id));
        }
        Ok(self.write_rect(id, Rect::new(x, y, width, height)))
    }

    pub fn move_to(&mut self, id: NodeId, x: i32, y: i32) -> Result<Vec<RectChange>, EditError> {
        let rect = self.require(id)?.rect;
        self.set_geometry(id, x, y, rect.width, rect.height)
    }

    pub fn resize(
        &mut self,
        id: NodeId,
        width: i32,
        height: i32,
    ) -> Result<Vec<RectChange>, EditError> {
        let rect = self.require(id)?.rect;
        self.set_geometry(id, rect.x, rect.y, width, height)
    }

    // ─── Hierarchy ───────────────────────────────────────────────────────

    /// Move a node under `new_parent` at local `(x, y)`, keeping its id,
    /// size and z-index.
    pub fn reparent(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        x: i32,
        y: i32,
    ) -> Result<Relink, EditError> {
        let node = self.require(id)?;
        if node.is_root() {
            return Err(EditError::RootFrame);
        }
        if node.is_locked {
            return Err(EditError::Locked(id));
        }
        let rect = Rect::new(x, y, node.rect.width, node.rect.height);
        let target = self.require(new_parent)?;
        if target.is_locked {
            return Err(EditError::Locked(new_parent));
        }
        self.check_container(new_parent)?;
        if new_parent == id || self.is_ancestor_of(id, new_parent) {
            return Err(EditError::Cycle(id));
        }
        self.relink(id, new_parent, rect, None)
            .ok_or(EditError::NotFound(id))
    }

    /// Rewrite the parent edge of `id` without permission checks.
    ///
    /// `order` restores a recorded attachment order; `None` appends.
    pub fn relink(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        rect: Rect,
        order: Option<u64>,
    ) -> Option<Relink> {
        let idx = self.index_of(id)?;
        let new_parent_idx = self.index_of(new_parent)?;
        let from_parent = self.parent(id)?;
        let from_parent_idx = self.index_of(from_parent)?;
        let from_rect = self.graph[idx].rect;
        let from_order = self.order_of(id);

        if let Some(edge) = self.graph.find_edge(from_parent_idx, idx) {
            self.graph.remove_edge(edge);
        }
        self.graph.add_edge(new_parent_idx, idx, ());
        let to_order = order.unwrap_or_else(|| self.claim_order());
        self.next_order = self.next_order.max(to_order);
        self.order.insert(id, to_order);

        self.write_rect(id, rect);
        let to_rect = self.graph[idx].rect;
        Some(Relink {
            id,
            from_parent,
            from_rect,
            from_order,
            to_parent: new_parent,
            to_rect,
            to_order,
        })
    }

    /// Set the paint order key. Duplicates are allowed.
    pub fn set_z_index(&mut self, id: NodeId, z: i32) -> Result<i32, EditError> {
        let node = self.get_mut(id).ok_or(EditError::NotFound(id))?;
        Ok(std::mem::replace(&mut node.z_index, z))
    }

    /// Raise a node above all of its siblings. Returns the old z-index.
    pub fn bring_to_front(&mut self, id: NodeId) -> Result<i32, EditError> {
        let parent = self.parent(id).ok_or(EditError::RootFrame)?;
        let top = self.top_z(parent);
        let current = self.require(id)?.z_index;
        let z = top.saturating_add(1);
        if z == current || self.children(parent).last() == Some(&id) {
            return Ok(current);
        }
        self.set_z_index(id, z)
    }

    /// Lower a node beneath all of its siblings. Returns the old z-index.
    pub fn send_to_back(&mut self, id: NodeId) -> Result<i32, EditError> {
        let parent = self.parent(id).ok_or(EditError::RootFrame)?;
        let bottom = self.bottom_z(parent);
        let current = self.require(id)?.z_index;
        let z = bottom.saturating_sub(1);
        if z == current || self.children(parent).first() == Some(&id) {
            return Ok(current);
        }
        self.set_z_index(id, z)
    }

    /// Returns the previous flag. The Root Frame cannot be locked.
    pub fn set_locked(&mut self, id: NodeId, locked: bool) -> Result<bool, EditError> {
        if self.require(id)?.is_root() {
            return Err(EditError::RootFrame);
        }
        let node = self.get_mut(id).ok_or(EditError::NotFound(id))?;
        Ok(std::mem::replace(&mut node.is_locked, locked))
    }

    /// Returns the previous flag.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<bool, EditError> {
        let node = self.get_mut(id).ok_or(EditError::NotFound(id))?;
        Ok(std::mem::replace(&mut node.is_visible, visible))
    }

    /// Returns the previous name.
    pub fn rename(&mut self, id: NodeId, name: &str) -> Result<String, EditError> {
        let node = self.get_mut(id).ok_or(EditError::NotFound(id))?;
        Ok(std::mem::replace(&mut node.name, name.to_string()))
    }

    // ─── Grouping ────────────────────────────────────────────────────────

    /// Wrap sibling nodes in a new `group` sized to their bounding box.
    ///
    /// All checks run before anything is mutated, so either every member
    /// moves or nothing changes.
    pub fn group(&mut self, selection: &[NodeId]) -> Result<Grouped, EditError> {
        let mut seen = HashSet::new();
        let members: SmallVec<[NodeId; 8]> = selection
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        if members.is_empty() {
            return Err(EditError::EmptySelection);
        }

        let mut parent = None;
        let mut rects = Vec::with_capacity(members.len());
        for &id in &members {
            let node = self.require(id)?;
            if node.is_root() {
                return Err(EditError::RootFrame);
            }
            if node.is_locked {
                return Err(EditError::Locked(id));
            }
            rects.push(node.rect);
            let p = self.parent(id).ok_or(EditError::NotFound(id))?;
            match parent {
                None => parent = Some(p),
                Some(existing) if existing != p => return Err(EditError::MixedParents),
                Some(_) => {}
            }
        }
        let parent = parent.ok_or(EditError::EmptySelection)?;
        if self.require(parent)?.is_locked {
            return Err(EditError::Locked(parent));
        }
        let bound = Rect::bounding(&rects).ok_or(EditError::EmptySelection)?;

        let mut group =
            template::instantiate(NodeKind::Group, NodeId::generate(), bound.x, bound.y);
        group.rect = bound;
        group.z_index = members
            .iter()
            .filter_map(|id| self.get(*id))
            .map(|n| n.z_index)
            .max()
            .unwrap_or(0);
        let group_id = group.id;
        let parent_idx = self.id_index[&parent];
        self.link(parent_idx, group, None);
        self.write_rect(group_id, bound);

        let ordered: Vec<NodeId> = self
            .children(parent)
            .into_iter()
            .filter(|id| members.contains(id))
            .collect();
        let mut relinks = Vec::with_capacity(ordered.len());
        for id in ordered {
            let rect = self.graph[self.id_index[&id]].rect.translate(-bound.x, -bound.y);
            if let Some(relink) = self.relink(id, group_id, rect, None) {
                relinks.push(relink);
            }
        }
        log::debug!("grouped {} nodes into {group_id}", relinks.len());
        Ok(Grouped {
            group: group_id,
            parent,
            relinks,
        })
    }

    /// Move every child of `container` to the container's parent, keeping
    /// absolute positions, then delete the emptied container.
    pub fn ungroup(&mut self, container: NodeId) -> Result<Ungrouped, EditError> {
        let node = self.require(container)?;
        if node.is_root() {
            return Err(EditError::RootFrame);
        }
        if !node.is_container() {
            return Err(EditError::NotContainer(container));
        }
        if node.is_locked {
            return Err(EditError::Locked(container));
        }
        let offset = node.rect;
        let parent = self.parent(container).ok_or(EditError::NotFound(container))?;
        if self.require(parent)?.is_locked {
            return Err(EditError::Locked(parent));
        }

        let mut relinks = Vec::new();
        for child in self.children(container) {
            let rect = self.graph[self.id_index[&child]]
                .rect
                .translate(offset.x, offset.y);
            if let Some(relink) = self.relink(child, parent, rect, None) {
                relinks.push(relink);
            }
        }
        let container = self.detach(container)?;
        log::debug!(
            "ungrouped {} into {parent} ({} children)",
            container.node.id,
            relinks.len()
        );
        Ok(Ungrouped {
            parent,
            relinks,
            container,
        })
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first pre-order walk; see [`SceneGraph::traverse`].
pub struct Walk<'a> {
    scene: &'a SceneGraph,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.scene.children(id).into_iter().rev());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with_container() -> (SceneGraph, NodeId) {
        let mut sg = SceneGraph::new();
        let root = sg.root_id();
        let rect = sg.create(NodeKind::Rect, 0, 0, root).unwrap();
        (sg, rect)
    }

    #[test]
    fn create_appends_topmost_child() {
        let (mut sg, container) = scene_with_container();
        let a = sg.create(NodeKind::Text, 0, 0, container).unwrap();
        sg.set_z_index(a, 5).unwrap();
        let b = sg.create(NodeKind::Clock, 0, 0, container).unwrap();
        assert_eq!(sg.children(container), vec![a, b]);
        assert_eq!(sg.get(b).unwrap().z_index, 5);
    }

    #[test]
    fn create_rejects_leaf_and_locked_parents() {
        let (mut sg, container) = scene_with_container();
        let text = sg.create(NodeKind::Text, 0, 0, container).unwrap();
        assert_eq!(
            sg.create(NodeKind::Rect, 0, 0, text),
            Err(EditError::NotContainer(text))
        );

        sg.set_locked(container, true).unwrap();
        assert_eq!(
            sg.create(NodeKind::Rect, 0, 0, container),
            Err(EditError::Locked(container))
        );
        assert_eq!(sg.children(container).len(), 1);
    }

    #[test]
    fn placement_is_clamped_into_parent() {
        let (mut sg, container) = scene_with_container();
        let bar = sg.create(NodeKind::Progress, 150, 190, container).unwrap();
        let rect = sg.get(bar).unwrap().rect;
        assert!(Rect::new(0, 0, 200, 200).contains_rect(&rect), "{rect:?}");
    }

    #[test]
    fn resize_clamps_against_parent() {
        let (mut sg, container) = scene_with_container();
        let inner = sg.create(NodeKind::Rect, 10, 10, container).unwrap();
        sg.set_geometry(inner, 10, 10, 100, 100).unwrap();
        sg.set_geometry(inner, 10, 10, 250, 250).unwrap();
        assert_eq!(sg.get(inner).unwrap().rect, Rect::new(10, 10, 190, 190));
    }

    #[test]
    fn shrinking_container_reclamps_children() {
        let (mut sg, container) = scene_with_container();
        let inner = sg.create(NodeKind::Group, 0, 0, container).unwrap();
        sg.set_geometry(inner, 100, 100, 100, 100).unwrap();

        let changes = sg.set_geometry(container, 0, 0, 120, 120).unwrap();
        assert_eq!(changes[0].id, container);
        assert_eq!(sg.get(inner).unwrap().rect, Rect::new(20, 20, 100, 100));
    }

    #[test]
    fn locked_nodes_refuse_geometry_and_delete() {
        let (mut sg, container) = scene_with_container();
        sg.set_locked(container, true).unwrap();
        assert_eq!(
            sg.move_to(container, 30, 30),
            Err(EditError::Locked(container))
        );
        assert_eq!(
            sg.delete(container).unwrap_err(),
            EditError::Locked(container)
        );
    }

    #[test]
    fn root_frame_is_protected() {
        let mut sg = SceneGraph::new();
        let root = sg.root_id();
        assert_eq!(sg.delete(root).unwrap_err(), EditError::RootFrame);
        assert_eq!(sg.set_locked(root, true), Err(EditError::RootFrame));
        sg.resize(root, 1, 1).unwrap();
        assert_eq!(
            (sg.root().rect.width, sg.root().rect.height),
            (50, 50)
        );
    }

    #[test]
    fn delete_removes_subtree() {
        let (mut sg, container) = scene_with_container();
        let child = sg.create(NodeKind::Text, 0, 0, container).unwrap();
        let removed = sg.delete(container).unwrap();
        assert_eq!(removed.node_count(), 2);
        assert!(!sg.contains(child));
        assert_eq!(sg.widget_count(), 0);
    }

    #[test]
    fn detach_attach_restores_identity() {
        let (mut sg, container) = scene_with_container();
        let child = sg.create(NodeKind::Text, 5, 5, container).unwrap();
        let root = sg.root_id();
        let sub = sg.detach(container).unwrap();
        sg.attach(sub, root).unwrap();
        assert_eq!(sg.parent(child), Some(container));
        assert_eq!(sg.get(child).unwrap().rect.x, 5);
    }

    #[test]
    fn reparent_refuses_cycles_and_leaves() {
        let (mut sg, outer) = scene_with_container();
        let inner = sg.create(NodeKind::Group, 0, 0, outer).unwrap();
        let text = sg.create(NodeKind::Text, 0, 0, outer).unwrap();

        assert_eq!(sg.reparent(outer, inner, 0, 0), Err(EditError::Cycle(outer)));
        assert_eq!(
            sg.reparent(inner, text, 0, 0),
            Err(EditError::NotContainer(text))
        );

        let relink = sg.reparent(text, inner, 5, 5).unwrap();
        assert_eq!(relink.from_parent, outer);
        assert_eq!(sg.parent(text), Some(inner));
    }

    #[test]
    fn equal_z_ties_break_by_attachment_order() {
        let mut sg = SceneGraph::new();
        let root = sg.root_id();
        let a = sg.create(NodeKind::Text, 0, 0, root).unwrap();
        let b = sg.create(NodeKind::Text, 0, 0, root).unwrap();
        assert_eq!(sg.children(root), vec![a, b]);
        sg.send_to_back(b).unwrap();
        assert_eq!(sg.children(root), vec![b, a]);
        sg.bring_to_front(b).unwrap();
        assert_eq!(sg.children(root), vec![a, b]);
    }

    #[test]
    fn traverse_is_depth_first_in_paint_order() {
        let mut sg = SceneGraph::new();
        let root = sg.root_id();
        let group = sg.create(NodeKind::Group, 0, 0, root).unwrap();
        let top = sg.create(NodeKind::Text, 0, 0, root).unwrap();
        let inner = sg.create(NodeKind::Text, 0, 0, group).unwrap();
        sg.set_z_index(top, 10).unwrap();

        let order: Vec<_> = sg.traverse(root).collect();
        assert_eq!(order, vec![root, group, inner, top]);
        // restartable
        assert_eq!(sg.traverse(root).count(), 4);
    }

    #[test]
    fn group_wraps_bounding_box_and_rebases() {
        let mut sg = SceneGraph::new();
        let root = sg.root_id();
        let a = sg.create(NodeKind::Text, 10, 20, root).unwrap();
        let b = sg.create(NodeKind::Text, 100, 60, root).unwrap();

        let grouped = sg.group(&[a, b]).unwrap();
        let group = sg.get(grouped.group).unwrap();
        assert_eq!(group.rect, Rect::new(10, 20, 240, 90));
        assert_eq!(sg.get(a).unwrap().rect.x, 0);
        assert_eq!(sg.get(b).unwrap().rect.y, 40);
        assert_eq!(sg.absolute_rect(b).unwrap(), Rect::new(100, 60, 150, 50));
    }

    #[test]
    fn group_is_atomic_on_locked_member() {
        let mut sg = SceneGraph::new();
        let root = sg.root_id();
        let a = sg.create(NodeKind::Text, 0, 0, root).unwrap();
        let b = sg.create(NodeKind::Text, 0, 0, root).unwrap();
        sg.set_locked(b, true).unwrap();
        assert_eq!(sg.group(&[a, b]), Err(EditError::Locked(b)));
        assert_eq!(sg.widget_count(), 2);
        assert_eq!(sg.parent(a), Some(root));
        assert_eq!(sg.group(&[]), Err(EditError::EmptySelection));
    }

    #[test]
    fn ungroup_restores_absolute_positions() {
        let mut sg = SceneGraph::new();
        let root = sg.root_id();
        let a = sg.create(NodeKind::Text, 30, 40, root).unwrap();
        let grouped = sg.group(&[a]).unwrap();
        let out = sg.ungroup(grouped.group).unwrap();
        assert_eq!(out.parent, root);
        assert!(!sg.contains(grouped.group));
        assert_eq!(sg.get(a).unwrap().rect, Rect::new(30, 40, 150, 50));
    }

    #[test]
    fn ungroup_refuses_leaves() {
        let mut sg = SceneGraph::new();
        let root = sg.root_id();
        let text = sg.create(NodeKind::Text, 0, 0, root).unwrap();
        assert_eq!(
            sg.ungroup(text).unwrap_err(),
            EditError::NotContainer(text)
        );
        assert!(sg.contains(text));
    }

    #[test]
    fn ungroup_refuses_locked_parent() {
        let (mut sg, outer) = scene_with_container();
        let text = sg.create(NodeKind::Text, 0, 0, outer).unwrap();
        let grouped = sg.group(&[text]).unwrap();
        sg.set_locked(outer, true).unwrap();
        assert_eq!(
            sg.ungroup(grouped.group).unwrap_err(),
            EditError::Locked(outer)
        );
        assert!(sg.contains(grouped.group));
        assert_eq!(sg.parent(text), Some(grouped.group));
    }

    #[test]
    fn z_order_saturates_at_integer_bounds() {
        let mut sg = SceneGraph::new();
        let root = sg.root_id();
        let a = sg.create(NodeKind::Text, 0, 0, root).unwrap();
        let b = sg.create(NodeKind::Text, 0, 100, root).unwrap();

        sg.set_z_index(b, i32::MAX).unwrap();
        sg.bring_to_front(a).unwrap();
        assert_eq!(sg.get(a).unwrap().z_index, i32::MAX);
        assert_eq!(sg.bring_to_front(a), Ok(i32::MAX));

        sg.set_z_index(a, i32::MIN).unwrap();
        sg.send_to_back(b).unwrap();
        assert_eq!(sg.get(b).unwrap().z_index, i32::MIN);
    }

    #[test]
    fn taken_ids_are_refused() {
        let (mut sg, container) = scene_with_container();
        let text = sg.create(NodeKind::Text, 0, 0, container).unwrap();
        let clone = template::instantiate(NodeKind::Text, text, 0, 0);
        assert_eq!(
            sg.create_from(clone, container),
            Err(EditError::DuplicateId(text))
        );
        assert_eq!(sg.widget_count(), 2);
    }
}
