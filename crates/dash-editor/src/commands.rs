//! Undo/Redo command stack.
//!
//! Every mutation the editor performs is recorded as a reversible `Command`
//! holding explicit before/after snapshots. Commands are recorded *after*
//! the mutation has been applied; undo replays the inverse, redo replays
//! the forward state.
//!
//! Composite operations (group, ungroup, multi-delete) are wrapped in a
//! macro: every command recorded between `begin_macro` and `end_macro`
//! becomes one stack entry.

use crate::events::ChangeEvent;
use dash_core::property::{self, PropertyPath, Written};
use dash_core::scene::{RectChange, Relink, SceneGraph, Subtree};
use dash_core::NodeId;
use serde_json::Value;

/// Default undo depth.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// A recorded, reversible mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A node (and its subtree) was added under `parent`.
    /// `held` owns the subtree while the creation is undone.
    Create {
        id: NodeId,
        parent: NodeId,
        held: Option<Subtree>,
    },
    /// A node (and its subtree) was removed from `parent`.
    /// `held` owns the subtree while the deletion is in effect.
    Delete {
        id: NodeId,
        parent: NodeId,
        held: Option<Subtree>,
    },
    /// Every rectangle a move/resize touched, parents before children.
    MoveResize {
        id: NodeId,
        changes: Vec<RectChange>,
    },
    PropertyChange {
        id: NodeId,
        path: PropertyPath,
        old: Value,
        new: Value,
    },
    Reparent(Relink),
    /// Named bundle, undone in reverse and redone in order.
    Macro {
        name: String,
        commands: Vec<Command>,
    },
}

impl Command {
    pub fn description(&self) -> String {
        match self {
            Command::Create { id, .. } => format!("Create {id}"),
            Command::Delete { id, .. } => format!("Delete {id}"),
            Command::MoveResize { id, .. } => format!("Move {id}"),
            Command::PropertyChange { path, .. } => format!("Change {path}"),
            Command::Reparent(relink) => format!("Reparent {}", relink.id),
            Command::Macro { name, .. } => name.clone(),
        }
    }

    /// Re-apply the recorded change.
    pub fn redo(&mut self, scene: &mut SceneGraph) -> Vec<ChangeEvent> {
        self.replay(scene, true)
    }

    /// Revert the recorded change.
    pub fn undo(&mut self, scene: &mut SceneGraph) -> Vec<ChangeEvent> {
        self.replay(scene, false)
    }

    fn replay(&mut self, scene: &mut SceneGraph, forward: bool) -> Vec<ChangeEvent> {
        match self {
            Command::Create { id, parent, held } => {
                if forward {
                    restore(scene, held, *parent)
                } else {
                    withdraw(scene, held, *id)
                }
            }
            Command::Delete { id, parent, held } => {
                if forward {
                    withdraw(scene, held, *id)
                } else {
                    restore(scene, held, *parent)
                }
            }
            Command::MoveResize { changes, .. } => {
                // Top-down in both directions: a parent must have its final
                // size before its children are clamped against it.
                let mut events = Vec::with_capacity(changes.len());
                for change in changes.iter() {
                    let rect = if forward { change.after } else { change.before };
                    scene.write_rect(change.id, rect);
                    events.push(ChangeEvent::GeometryChanged(change.id));
                }
                events
            }
            Command::PropertyChange { id, path, old, new } => {
                let value = if forward { &*new } else { &*old };
                match property::write(scene, *id, path, value) {
                    Some(Written::Geometry(_)) => vec![ChangeEvent::GeometryChanged(*id)],
                    Some(Written::Field) if path.to_string() == "z_index" => vec![
                        ChangeEvent::PropertyChanged(*id, path.to_string()),
                        ChangeEvent::HierarchyChanged,
                    ],
                    Some(Written::Field) => {
                        vec![ChangeEvent::PropertyChanged(*id, path.to_string())]
                    }
                    None => {
                        log::debug!("skipped {path} on {id}: path no longer resolves");
                        Vec::new()
                    }
                }
            }
            Command::Reparent(relink) => {
                let (parent, rect, order) = if forward {
                    (relink.to_parent, relink.to_rect, relink.to_order)
                } else {
                    (relink.from_parent, relink.from_rect, relink.from_order)
                };
                scene.relink(relink.id, parent, rect, Some(order));
                vec![
                    ChangeEvent::HierarchyChanged,
                    ChangeEvent::GeometryChanged(relink.id),
                ]
            }
            Command::Macro { commands, .. } => {
                let mut events = Vec::new();
                if forward {
                    for cmd in commands.iter_mut() {
                        events.extend(cmd.replay(scene, true));
                    }
                } else {
                    for cmd in commands.iter_mut().rev() {
                        events.extend(cmd.replay(scene, false));
                    }
                }
                events
            }
        }
    }
}

/// Detach `id` into `held`. No-op if it is already detached.
fn withdraw(scene: &mut SceneGraph, held: &mut Option<Subtree>, id: NodeId) -> Vec<ChangeEvent> {
    if held.is_some() {
        return Vec::new();
    }
    match scene.detach(id) {
        Ok(subtree) => {
            *held = Some(subtree);
            vec![ChangeEvent::HierarchyChanged]
        }
        Err(e) => {
            log::warn!("cannot detach {id}: {e}");
            Vec::new()
        }
    }
}

/// Attach `held` back under `parent`. No-op if nothing is held.
fn restore(scene: &mut SceneGraph, held: &mut Option<Subtree>, parent: NodeId) -> Vec<ChangeEvent> {
    let Some(subtree) = held.take() else {
        return Vec::new();
    };
    match scene.attach(subtree.clone(), parent) {
        Ok(_) => vec![ChangeEvent::HierarchyChanged],
        Err(e) => {
            log::warn!("cannot re-attach {} under {parent}: {e}", subtree.node.id);
            *held = Some(subtree);
            Vec::new()
        }
    }
}

/// Outcome of an undo or redo step.
#[derive(Debug, Clone, PartialEq)]
pub struct Replayed {
    pub description: String,
    pub events: Vec<ChangeEvent>,
}

/// Linear undo/redo history with macro grouping.
#[derive(Debug)]
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    /// Maximum undo depth.
    max_depth: usize,
    /// Macros currently collecting commands, innermost last.
    open_macros: Vec<(String, Vec<Command>)>,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(DEFAULT_MAX_DEPTH)),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            open_macros: Vec::new(),
        }
    }

    /// Record a command whose effect is already applied to the scene.
    ///
    /// Inside a macro the command joins the macro; otherwise it becomes a
    /// new undo entry and the redo history is discarded.
    pub fn push(&mut self, cmd: Command) {
        if let Some((_, commands)) = self.open_macros.last_mut() {
            commands.push(cmd);
            return;
        }
        log::debug!("recorded {}", cmd.description());
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }

    /// Start collecting commands into a macro named `name`.
    pub fn begin_macro(&mut self, name: &str) {
        self.open_macros.push((name.to_string(), Vec::new()));
    }

    /// Close the innermost macro. Empty macros are discarded.
    pub fn end_macro(&mut self) {
        let Some((name, commands)) = self.open_macros.pop() else {
            return;
        };
        if commands.is_empty() {
            return;
        }
        self.push(Command::Macro { name, commands });
    }

    pub fn in_macro(&self) -> bool {
        !self.open_macros.is_empty()
    }

    /// Undo the last entry.
    pub fn undo(&mut self, scene: &mut SceneGraph) -> Option<Replayed> {
        if self.in_macro() {
            return None;
        }
        let mut cmd = self.undo_stack.pop()?;
        let events = cmd.undo(scene);
        let description = cmd.description();
        self.redo_stack.push(cmd);
        Some(Replayed {
            description,
            events,
        })
    }

    /// Redo the last undone entry.
    pub fn redo(&mut self, scene: &mut SceneGraph) -> Option<Replayed> {
        if self.in_macro() {
            return None;
        }
        let mut cmd = self.redo_stack.pop()?;
        let events = cmd.redo(scene);
        let description = cmd.description();
        self.undo_stack.push(cmd);
        Some(Replayed {
            description,
            events,
        })
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Forget all history (document replaced).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open_macros.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::NodeKind;
    use dash_core::codec::save;

    fn scene_with_text() -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        let root = scene.root_id();
        let id = scene.create(NodeKind::Text, 10, 10, root).unwrap();
        (scene, id)
    }

    fn moved(scene: &mut SceneGraph, id: NodeId, x: i32) -> Command {
        let changes = scene.move_to(id, x, 0).unwrap();
        Command::MoveResize { id, changes }
    }

    #[test]
    fn undo_redo_move() {
        let (mut scene, id) = scene_with_text();
        let mut stack = CommandStack::new(100);

        let cmd = moved(&mut scene, id, 60);
        stack.push(cmd);
        assert_eq!(scene.get(id).unwrap().rect.x, 60);

        let replayed = stack.undo(&mut scene).unwrap();
        assert_eq!(replayed.description, format!("Move {id}"));
        assert_eq!(scene.get(id).unwrap().rect.x, 10);

        stack.redo(&mut scene).unwrap();
        assert_eq!(scene.get(id).unwrap().rect.x, 60);
    }

    #[test]
    fn redo_clears_on_new_action() {
        let (mut scene, id) = scene_with_text();
        let mut stack = CommandStack::new(100);

        let cmd = moved(&mut scene, id, 20);
        stack.push(cmd);
        stack.undo(&mut scene);
        assert!(stack.can_redo());

        // New action clears redo
        let cmd = moved(&mut scene, id, 30);
        stack.push(cmd);
        assert!(!stack.can_redo());
    }

    #[test]
    fn max_depth_trims_oldest() {
        let (mut scene, id) = scene_with_text();
        let mut stack = CommandStack::new(3);

        for i in 0..5 {
            let cmd = moved(&mut scene, id, 20 + i * 10);
            stack.push(cmd);
        }
        // Only 3 entries remain
        let mut undo_count = 0;
        while stack.undo(&mut scene).is_some() {
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);
        assert_eq!(scene.get(id).unwrap().rect.x, 30);
    }

    #[test]
    fn delete_undo_restores_subtree() {
        let mut scene = SceneGraph::new();
        let root = scene.root_id();
        let block = scene.create(NodeKind::Rect, 0, 0, root).unwrap();
        scene.create(NodeKind::Clock, 0, 0, block).unwrap();
        let before = save(&scene).unwrap();

        let held = scene.delete(block).unwrap();
        let mut stack = CommandStack::default();
        stack.push(Command::Delete {
            id: block,
            parent: root,
            held: Some(held),
        });
        let after = save(&scene).unwrap();

        stack.undo(&mut scene);
        assert_eq!(save(&scene).unwrap(), before);
        stack.redo(&mut scene);
        assert_eq!(save(&scene).unwrap(), after);
    }

    #[test]
    fn property_change_roundtrip() {
        let (mut scene, id) = scene_with_text();
        let path = PropertyPath::parse("style.bg_color").unwrap();
        let old = property::read(scene.get(id).unwrap(), &path).unwrap();
        let new = Value::from("#00ff00");
        property::write(&mut scene, id, &path, &new).unwrap();

        let mut stack = CommandStack::default();
        stack.push(Command::PropertyChange {
            id,
            path,
            old,
            new,
        });
        let replayed = stack.undo(&mut scene).unwrap();
        assert_eq!(
            replayed.events,
            vec![ChangeEvent::PropertyChanged(id, "style.bg_color".into())]
        );
        assert_eq!(
            scene.get(id).unwrap().style.bg_color.as_deref(),
            Some("#ffffff")
        );
    }

    #[test]
    fn stale_property_path_is_skipped() {
        let (mut scene, id) = scene_with_text();
        let before = save(&scene).unwrap();

        let mut stack = CommandStack::default();
        stack.push(Command::PropertyChange {
            id,
            path: PropertyPath::parse("content.gone").unwrap(),
            old: Value::from(1),
            new: Value::from(2),
        });
        let replayed = stack.undo(&mut scene).unwrap();
        assert!(replayed.events.is_empty());
        assert_eq!(save(&scene).unwrap(), before);

        let replayed = stack.redo(&mut scene).unwrap();
        assert!(replayed.events.is_empty());
        assert_eq!(save(&scene).unwrap(), before);
    }

    #[test]
    fn macro_is_single_step() {
        let (mut scene, id) = scene_with_text();
        let mut stack = CommandStack::default();

        stack.begin_macro("Drag");
        for x in [20, 40, 80] {
            let cmd = moved(&mut scene, id, x);
            stack.push(cmd);
        }
        stack.end_macro();
        assert_eq!(stack.undo_len(), 1);

        let replayed = stack.undo(&mut scene).unwrap();
        assert_eq!(replayed.description, "Drag");
        assert_eq!(scene.get(id).unwrap().rect.x, 10);
        assert!(!stack.can_undo());

        stack.redo(&mut scene).unwrap();
        assert_eq!(scene.get(id).unwrap().rect.x, 80);
    }

    #[test]
    fn nested_and_empty_macros() {
        let (mut scene, id) = scene_with_text();
        let mut stack = CommandStack::default();

        stack.begin_macro("Empty");
        stack.end_macro();
        assert!(!stack.can_undo());

        stack.begin_macro("Outer");
        stack.begin_macro("Inner");
        let cmd = moved(&mut scene, id, 50);
        stack.push(cmd);
        stack.end_macro();
        assert!(stack.undo(&mut scene).is_none(), "undo while a macro is open");
        stack.end_macro();

        assert_eq!(stack.undo_len(), 1);
        stack.undo(&mut scene).unwrap();
        assert_eq!(scene.get(id).unwrap().rect.x, 10);
    }
}
