//! The editor façade: single owner of the open document.
//!
//! Every user intent is one method. Each validates against the scene,
//! applies the mutation, records an undo command and emits change events.
//! A rejected intent returns an error and leaves the document, history and
//! selection untouched.

use crate::clipboard::{Clipboard, ClipboardError};
use crate::commands::{Command, CommandStack};
use crate::events::{ChangeEvent, EventBus, SubscriptionId};
use crate::selection::Selection;
use crate::ticker::ContentTicker;
use chrono::NaiveDateTime;
use dash_core::property::{self, PropertyPath, Written};
use dash_core::scene::{RectChange, SceneGraph};
use dash_core::{CodecError, EditError, EditorSettings, NodeId, NodeKind, codec, content, package};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Keyboard nudge step, and the fine step used with the modifier held.
pub const NUDGE_STEP: i32 = 10;
pub const NUDGE_FINE_STEP: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nudge {
    Left,
    Right,
    Up,
    Down,
}

impl Nudge {
    fn delta(self, step: i32) -> (i32, i32) {
        match self {
            Nudge::Left => (-step, 0),
            Nudge::Right => (step, 0),
            Nudge::Up => (0, -step),
            Nudge::Down => (0, step),
        }
    }
}

/// A drag/resize gesture in progress.
#[derive(Debug)]
struct Interaction {
    id: NodeId,
    changes: Vec<RectChange>,
}

/// Fold `new` into `into`, keeping each node's first `before` and last
/// `after`. First-touch order keeps parents ahead of their children.
fn merge_changes(into: &mut Vec<RectChange>, new: Vec<RectChange>) {
    for change in new {
        match into.iter_mut().find(|c| c.id == change.id) {
            Some(existing) => existing.after = change.after,
            None => into.push(change),
        }
    }
}

pub struct Editor {
    scene: SceneGraph,
    commands: CommandStack,
    selection: Selection,
    events: EventBus,
    clipboard: Clipboard,
    /// Last evaluated display text per node.
    content: HashMap<NodeId, String>,
    ticker: ContentTicker,
    settings: EditorSettings,
    interaction: Option<Interaction>,
    path: Option<PathBuf>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl Editor {
    pub fn new(settings: EditorSettings) -> Self {
        Self::with_scene(SceneGraph::new(), settings)
    }

    pub fn with_scene(scene: SceneGraph, settings: EditorSettings) -> Self {
        let mut editor = Self {
            scene,
            commands: CommandStack::default(),
            selection: Selection::new(),
            events: EventBus::new(),
            clipboard: Clipboard::new(),
            content: HashMap::new(),
            ticker: ContentTicker::default(),
            settings,
            interaction: None,
            path: None,
        };
        editor.refresh_content(content::local_now());
        editor.events.poll();
        editor
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selection.contains(id)
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EditorSettings) {
        self.settings = settings;
    }

    /// Path the document was last opened from or saved to.
    pub fn document_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Cached display text of a text, clock or date widget.
    pub fn display_text(&self, id: NodeId) -> Option<&str> {
        self.content.get(&id).map(String::as_str)
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.events.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Drain events emitted since the last poll.
    pub fn poll_events(&mut self) -> Vec<ChangeEvent> {
        self.events.poll()
    }

    fn require(&self, id: NodeId) -> Result<&dash_core::Node, EditError> {
        self.scene.get(id).ok_or(EditError::NotFound(id))
    }

    fn record(&mut self, cmd: Command, events: impl IntoIterator<Item = ChangeEvent>) {
        self.commands.push(cmd);
        self.events.emit_all(events);
    }

    // ─── Selection ───────────────────────────────────────────────────────

    fn check_selectable(&self, id: NodeId) -> Result<(), EditError> {
        let node = self.require(id)?;
        if node.is_root() {
            return Err(EditError::RootFrame);
        }
        if node.is_locked {
            return Err(EditError::Locked(id));
        }
        Ok(())
    }

    /// Make `id` the only selected node.
    pub fn select(&mut self, id: NodeId) -> Result<(), EditError> {
        self.check_selectable(id)?;
        if self.selection.set([id]) {
            self.events.emit(ChangeEvent::SelectionChanged);
        }
        Ok(())
    }

    pub fn add_to_selection(&mut self, id: NodeId) -> Result<(), EditError> {
        self.check_selectable(id)?;
        if self.selection.add(id) {
            self.events.emit(ChangeEvent::SelectionChanged);
        }
        Ok(())
    }

    /// Replace the selection, silently dropping unselectable ids.
    pub fn set_selection(&mut self, ids: &[NodeId]) {
        let valid: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| self.check_selectable(*id).is_ok())
            .collect();
        if self.selection.set(valid) {
            self.events.emit(ChangeEvent::SelectionChanged);
        }
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.events.emit(ChangeEvent::SelectionChanged);
        }
    }

    /// Drop selected ids that were deleted or locked.
    fn prune_selection(&mut self) {
        let scene = &self.scene;
        let dropped = self
            .selection
            .retain(|id| scene.get(id).is_some_and(|n| !n.is_locked && !n.is_root()));
        if dropped {
            self.events.emit(ChangeEvent::SelectionChanged);
        }
    }

    // ─── Placement & geometry ────────────────────────────────────────────

    /// Place a template at local `(x, y)` inside `parent` (the Root Frame
    /// when `None`).
    pub fn place(
        &mut self,
        kind: NodeKind,
        x: i32,
        y: i32,
        parent: Option<NodeId>,
    ) -> Result<NodeId, EditError> {
        let parent = parent.unwrap_or_else(|| self.scene.root_id());
        let id = self.scene.create(kind, x, y, parent)?;
        self.record(
            Command::Create {
                id,
                parent,
                held: None,
            },
            [ChangeEvent::HierarchyChanged],
        );
        self.refresh_node(id, &content::local_now());
        Ok(id)
    }

    /// Move and resize a node. Inside an interaction the change joins the
    /// gesture; otherwise it is recorded as its own undo step.
    pub fn set_geometry(
        &mut self,
        id: NodeId,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<(), EditError> {
        let changes = self.scene.set_geometry(id, x, y, width, height)?;
        self.commit_geometry(id, changes);
        Ok(())
    }

    fn commit_geometry(&mut self, id: NodeId, changes: Vec<RectChange>) {
        if changes.is_empty() {
            return;
        }
        let events: Vec<_> = changes
            .iter()
            .map(|c| ChangeEvent::GeometryChanged(c.id))
            .collect();
        if let Some(gesture) = self.interaction.as_mut().filter(|g| g.id == id) {
            merge_changes(&mut gesture.changes, changes);
            self.events.emit_all(events);
        } else {
            self.record(Command::MoveResize { id, changes }, events);
        }
    }

    /// Start a drag/resize gesture on `id`.
    pub fn begin_interaction(&mut self, id: NodeId) -> Result<(), EditError> {
        if self.require(id)?.is_locked {
            return Err(EditError::Locked(id));
        }
        self.end_interaction();
        self.interaction = Some(Interaction {
            id,
            changes: Vec::new(),
        });
        Ok(())
    }

    /// Finish the gesture. Records one MoveResize command if the geometry
    /// actually changed; returns whether it did.
    pub fn end_interaction(&mut self) -> bool {
        let Some(Interaction { id, mut changes }) = self.interaction.take() else {
            return false;
        };
        changes.retain(|c| c.before != c.after);
        if changes.is_empty() {
            return false;
        }
        self.commands.push(Command::MoveResize { id, changes });
        true
    }

    /// Move every selected node by one keyboard step. Does nothing unless
    /// keyboard control is enabled in the settings.
    pub fn nudge(&mut self, direction: Nudge, fine: bool) -> usize {
        if !self.settings.kbd_control || self.selection.is_empty() {
            return 0;
        }
        let step = if fine { NUDGE_FINE_STEP } else { NUDGE_STEP };
        let (dx, dy) = direction.delta(step);
        let targets: Vec<NodeId> = self.selection.ids().to_vec();

        self.commands.begin_macro("Nudge");
        let mut moved = 0;
        for id in targets {
            let Some(rect) = self.scene.get(id).map(|n| n.rect) else {
                continue;
            };
            if let Ok(changes) = self.scene.move_to(id, rect.x + dx, rect.y + dy) {
                if !changes.is_empty() {
                    moved += 1;
                }
                self.commit_geometry(id, changes);
            }
        }
        self.commands.end_macro();
        moved
    }

    // ─── Properties ──────────────────────────────────────────────────────

    /// Write one property through a dotted path.
    ///
    /// Returns `Ok(false)` without recording anything when the path does
    /// not resolve, the value has the wrong type, or nothing changed.
    pub fn set_property(
        &mut self,
        id: NodeId,
        path: &str,
        value: Value,
    ) -> Result<bool, EditError> {
        let Some(path) = PropertyPath::parse(path) else {
            return Ok(false);
        };
        let node = self.require(id)?;

        if let Some(rect) = property::requested_rect(node, &path, &value) {
            let before = node.rect;
            self.set_geometry(id, rect.x, rect.y, rect.width, rect.height)?;
            return Ok(self.require(id)?.rect != before);
        }

        let Some(old) = property::read(node, &path) else {
            return Ok(false);
        };
        if old == value {
            return Ok(false);
        }
        match property::write(&mut self.scene, id, &path, &value) {
            Some(Written::Field) => {}
            Some(Written::Geometry(_)) | None => return Ok(false),
        }

        let key = path.to_string();
        let mut events = vec![ChangeEvent::PropertyChanged(id, key.clone())];
        if key == "z_index" {
            events.push(ChangeEvent::HierarchyChanged);
        }
        self.record(
            Command::PropertyChange {
                id,
                path,
                old,
                new: value,
            },
            events,
        );
        if key == "is_locked" {
            self.prune_selection();
        }
        self.refresh_node(id, &content::local_now());
        Ok(true)
    }

    pub fn set_locked(&mut self, id: NodeId, locked: bool) -> Result<bool, EditError> {
        if self.require(id)?.is_root() {
            return Err(EditError::RootFrame);
        }
        self.set_property(id, "is_locked", Value::Bool(locked))
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<bool, EditError> {
        self.set_property(id, "is_visible", Value::Bool(visible))
    }

    pub fn set_z_index(&mut self, id: NodeId, z: i32) -> Result<bool, EditError> {
        self.set_property(id, "z_index", Value::from(z))
    }

    pub fn rename(&mut self, id: NodeId, name: &str) -> Result<bool, EditError> {
        self.set_property(id, "name", Value::from(name))
    }

    pub fn bring_to_front(&mut self, id: NodeId) -> Result<bool, EditError> {
        let parent = self.scene.parent(id).ok_or(EditError::RootFrame)?;
        if self.scene.children(parent).last() == Some(&id) {
            return Ok(false);
        }
        let z = self.scene.top_z(parent).saturating_add(1);
        self.set_z_index(id, z)
    }

    pub fn send_to_back(&mut self, id: NodeId) -> Result<bool, EditError> {
        let parent = self.scene.parent(id).ok_or(EditError::RootFrame)?;
        let siblings = self.scene.children(parent);
        if siblings.first() == Some(&id) {
            return Ok(false);
        }
        let bottom = siblings
            .first()
            .and_then(|s| self.scene.get(*s))
            .map_or(0, |n| n.z_index);
        self.set_z_index(id, bottom.saturating_sub(1))
    }

    // ─── Hierarchy ───────────────────────────────────────────────────────

    pub fn reparent(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        x: i32,
        y: i32,
    ) -> Result<(), EditError> {
        let relink = self.scene.reparent(id, new_parent, x, y)?;
        self.record(
            Command::Reparent(relink),
            [ChangeEvent::HierarchyChanged, ChangeEvent::GeometryChanged(id)],
        );
        Ok(())
    }

    /// Delete every selected node (and its subtree) as one undo step.
    /// Returns the number of top-level nodes removed.
    pub fn delete_selected(&mut self) -> Result<usize, EditError> {
        // A selected node inside another selected node goes with its ancestor.
        let ids: Vec<NodeId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|id| {
                !self
                    .selection
                    .ids()
                    .iter()
                    .any(|other| self.scene.is_ancestor_of(*other, *id))
            })
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }
        for id in &ids {
            let node = self.require(*id)?;
            if node.is_root() {
                return Err(EditError::RootFrame);
            }
            if node.is_locked {
                return Err(EditError::Locked(*id));
            }
        }

        self.commands.begin_macro("Delete");
        let mut removed = 0;
        for id in ids {
            let Some(parent) = self.scene.parent(id) else {
                continue;
            };
            match self.scene.delete(id) {
                Ok(held) => {
                    for gone in held.ids() {
                        self.content.remove(&gone);
                    }
                    self.commands.push(Command::Delete {
                        id,
                        parent,
                        held: Some(held),
                    });
                    removed += 1;
                }
                Err(e) => log::warn!("delete {id}: {e}"),
            }
        }
        self.commands.end_macro();

        self.events.emit(ChangeEvent::HierarchyChanged);
        self.clear_selection();
        Ok(removed)
    }

    /// Wrap the selection in a new group, as one undo step.
    pub fn group_selected(&mut self) -> Result<NodeId, EditError> {
        let grouped = self.scene.group(self.selection.ids())?;

        self.commands.begin_macro("Group");
        self.commands.push(Command::Create {
            id: grouped.group,
            parent: grouped.parent,
            held: None,
        });
        for relink in grouped.relinks {
            self.commands.push(Command::Reparent(relink));
        }
        self.commands.end_macro();

        self.events.emit(ChangeEvent::HierarchyChanged);
        if self.selection.set([grouped.group]) {
            self.events.emit(ChangeEvent::SelectionChanged);
        }
        Ok(grouped.group)
    }

    /// Dissolve a container into its parent, as one undo step. Returns the
    /// former children.
    pub fn ungroup(&mut self, id: NodeId) -> Result<Vec<NodeId>, EditError> {
        let ungrouped = self.scene.ungroup(id)?;
        let children: Vec<NodeId> = ungrouped.relinks.iter().map(|r| r.id).collect();

        self.commands.begin_macro("Ungroup");
        for relink in ungrouped.relinks {
            self.commands.push(Command::Reparent(relink));
        }
        self.commands.push(Command::Delete {
            id,
            parent: ungrouped.parent,
            held: Some(ungrouped.container),
        });
        self.commands.end_macro();

        self.events.emit(ChangeEvent::HierarchyChanged);
        self.set_selection(&children);
        Ok(children)
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Copy the primary selection with its subtree.
    pub fn copy(&mut self) -> Result<usize, ClipboardError> {
        let id = self.selection.primary().ok_or(EditError::EmptySelection)?;
        self.clipboard.copy(&self.scene, id)
    }

    /// Paste the clipboard next to the copied node's position, under its
    /// original parent when that is still an unlocked container.
    pub fn paste(&mut self) -> Result<NodeId, ClipboardError> {
        let subtree = self.clipboard.materialize()?;
        let root = self.scene.root_id();
        let parent = self
            .clipboard
            .source_parent()
            .filter(|p| {
                self.scene
                    .get(*p)
                    .is_some_and(|n| n.is_container() && !n.is_locked)
            })
            .unwrap_or(root);

        let id = self.scene.create_from(subtree.node, parent)?;
        for child in subtree.children {
            self.scene.attach(child, id)?;
        }
        self.record(
            Command::Create {
                id,
                parent,
                held: None,
            },
            [ChangeEvent::HierarchyChanged],
        );
        self.select(id)?;
        self.refresh_content(content::local_now());
        Ok(id)
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Option<String> {
        self.end_interaction();
        let replayed = self.commands.undo(&mut self.scene)?;
        self.after_replay(replayed.events);
        Some(replayed.description)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.end_interaction();
        let replayed = self.commands.redo(&mut self.scene)?;
        self.after_replay(replayed.events);
        Some(replayed.description)
    }

    fn after_replay(&mut self, events: Vec<ChangeEvent>) {
        self.events.emit_all(events);
        self.prune_selection();
        self.refresh_content(content::local_now());
    }

    // ─── Documents ───────────────────────────────────────────────────────

    fn replace_document(&mut self, scene: SceneGraph, path: Option<PathBuf>) {
        self.scene = scene;
        self.path = path;
        self.interaction = None;
        self.commands.clear();
        self.selection.clear();
        self.content.clear();
        self.events.emit(ChangeEvent::DocumentReplaced);
        self.refresh_content(content::local_now());
    }

    /// Start over with an empty document.
    pub fn new_document(&mut self) {
        let scene = SceneGraph::with_screen(self.scene.screen());
        self.replace_document(scene, None);
    }

    /// Load a project file. On error the current document is untouched.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let scene = codec::load_with_screen(&bytes, self.scene.screen())?;
        self.replace_document(scene, Some(path.to_path_buf()));
        Ok(())
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        self.end_interaction();
        let path = path.as_ref();
        codec::save_file(&self.scene, path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Import a widget package. On error the current document is untouched.
    pub fn import_package(&mut self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        let scene = package::import_package_file(path)?;
        self.replace_document(scene, None);
        Ok(())
    }

    pub fn export_package(&mut self, path: impl AsRef<Path>) -> Result<(), CodecError> {
        self.end_interaction();
        package::export_package_file(&self.scene, path)
    }

    // ─── Content ─────────────────────────────────────────────────────────

    fn refresh_node(&mut self, id: NodeId, now: &NaiveDateTime) -> bool {
        let text = self.scene.get(id).and_then(|n| content::display_text(n, now));
        let changed = match text {
            Some(text) if self.content.get(&id) == Some(&text) => false,
            Some(text) => {
                self.content.insert(id, text);
                true
            }
            None => self.content.remove(&id).is_some(),
        };
        if changed {
            self.events.emit(ChangeEvent::ContentRefreshed(id));
        }
        changed
    }

    /// Re-evaluate derived text for every node. Never touches geometry or
    /// hierarchy. Returns how many texts changed.
    pub fn refresh_content(&mut self, now: NaiveDateTime) -> usize {
        let root = self.scene.root_id();
        let ids: Vec<NodeId> = self.scene.traverse(root).collect();
        let live: HashSet<NodeId> = ids.iter().copied().collect();
        self.content.retain(|id, _| live.contains(id));
        ids.into_iter()
            .filter(|id| self.refresh_node(*id, &now))
            .count()
    }

    /// Call from the host loop; refreshes content once per ticker interval.
    pub fn tick(&mut self, at: Instant) -> bool {
        if !self.ticker.poll(at) {
            return false;
        }
        self.refresh_content(content::local_now());
        true
    }
}
