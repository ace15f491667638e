//! Integration tests: editor intents against the undo/redo history.
//!
//! Every recorded intent must satisfy `undo(apply(doc)) == doc` and
//! `redo(undo(apply(doc))) == apply(doc)`, compared on the saved JSON.

use dash_core::codec;
use dash_core::geometry::Rect;
use dash_core::id::NodeId;
use dash_core::{EditError, EditorSettings, NodeKind};
use dash_editor::{ChangeEvent, Editor};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

fn dashboard() -> Editor {
    let scene = codec::load(include_bytes!("fixtures/dashboard.json")).unwrap();
    Editor::with_scene(scene, EditorSettings::default())
}

fn snapshot(editor: &Editor) -> String {
    String::from_utf8(codec::save(editor.scene()).unwrap()).unwrap()
}

/// Undo must restore `before`; redo must restore `after`.
fn assert_inverse(editor: &mut Editor, before: &str) {
    let after = snapshot(editor);
    assert!(editor.undo().is_some(), "nothing to undo");
    assert_eq!(snapshot(editor), before, "undo did not restore");
    assert!(editor.redo().is_some(), "nothing to redo");
    assert_eq!(snapshot(editor), after, "redo did not re-apply");
}

// ─── Inverse laws ────────────────────────────────────────────────────────

#[test]
fn place_is_reversible() {
    let mut editor = dashboard();
    let before = snapshot(&editor);
    let clock = editor.place(NodeKind::Clock, 20, 200, None).unwrap();
    assert_eq!(editor.scene().parent(clock), Some(editor.scene().root_id()));
    assert_inverse(&mut editor, &before);
    assert!(editor.scene().contains(clock));
}

#[test]
fn container_shrink_is_reversible() {
    let mut editor = dashboard();
    let before = snapshot(&editor);

    editor.set_geometry(id("meters"), 10, 80, 100, 20).unwrap();
    let bar = editor.scene().get(id("cpu_bar")).unwrap().rect;
    assert_eq!(bar.width, 100);
    assert_eq!(bar.height, 20);

    assert_inverse(&mut editor, &before);
    editor.undo().unwrap();
    assert_eq!(
        editor.scene().get(id("cpu_bar")).unwrap().rect,
        Rect::new(0, 0, 300, 30)
    );
}

#[test]
fn property_change_is_reversible() {
    let mut editor = dashboard();
    let before = snapshot(&editor);
    assert!(
        editor
            .set_property(id("cpu_bar"), "content.value", json!(90.0))
            .unwrap()
    );
    assert_inverse(&mut editor, &before);

    let before = snapshot(&editor);
    assert!(
        editor
            .set_property(id("cpu_bar"), "style.bg_color", json!("#101010"))
            .unwrap()
    );
    assert_inverse(&mut editor, &before);
}

#[test]
fn geometry_paths_clamp_and_record() {
    let mut editor = dashboard();
    let before = snapshot(&editor);
    assert!(
        editor
            .set_property(id("cpu_bar"), "width", json!(5000))
            .unwrap()
    );
    assert_eq!(editor.scene().get(id("cpu_bar")).unwrap().rect.width, 320);
    assert_inverse(&mut editor, &before);
}

#[test]
fn unresolved_property_writes_record_nothing() {
    let mut editor = dashboard();
    let before = snapshot(&editor);
    let bar = id("cpu_bar");
    assert!(!editor.set_property(bar, "content.missing", json!(1)).unwrap());
    assert!(!editor.set_property(bar, "content.value", json!("high")).unwrap());
    assert!(!editor.set_property(bar, "content.value", json!(15.0)).unwrap());
    assert!(!editor.set_property(bar, "style..x", json!(1)).unwrap());
    assert_eq!(snapshot(&editor), before);
    assert!(!editor.can_undo());
}

#[test]
fn reparent_is_reversible() {
    let mut editor = dashboard();
    let before = snapshot(&editor);
    let root = editor.scene().root_id();
    editor.reparent(id("cpu_bar"), root, 20, 200).unwrap();
    assert_eq!(editor.scene().parent(id("cpu_bar")), Some(root));
    assert_inverse(&mut editor, &before);
}

#[test]
fn delete_selection_is_one_step() {
    let mut editor = dashboard();
    let before = snapshot(&editor);
    editor.select(id("cpu_bar")).unwrap();
    editor.add_to_selection(id("meters")).unwrap();

    // cpu_bar goes with its selected parent.
    assert_eq!(editor.delete_selected().unwrap(), 1);
    assert_eq!(editor.scene().widget_count(), 1);
    assert!(editor.selection().is_empty());

    assert_inverse(&mut editor, &before);
}

#[test]
fn interaction_gesture_is_one_step() {
    let mut editor = dashboard();
    let before = snapshot(&editor);
    editor.begin_interaction(id("meters")).unwrap();
    for w in [300, 200, 120] {
        editor.set_geometry(id("meters"), 10, 80, w, 100).unwrap();
    }
    assert!(editor.end_interaction());
    assert_inverse(&mut editor, &before);
    editor.undo().unwrap();
    assert!(!editor.can_undo());
}

// ─── Locks ───────────────────────────────────────────────────────────────

#[test]
fn locked_nodes_refuse_edits() {
    let mut editor = dashboard();
    let before = snapshot(&editor);
    let title = id("title");

    assert_eq!(
        editor.set_geometry(title, 0, 0, 100, 40),
        Err(EditError::Locked(title))
    );
    assert_eq!(editor.select(title), Err(EditError::Locked(title)));
    assert_eq!(editor.begin_interaction(title), Err(EditError::Locked(title)));
    let root = editor.scene().root_id();
    assert_eq!(
        editor.reparent(title, id("meters"), 0, 0),
        Err(EditError::Locked(title))
    );
    assert_eq!(editor.set_locked(root, true), Err(EditError::RootFrame));
    assert_eq!(editor.select(root), Err(EditError::RootFrame));

    assert_eq!(editor.delete_selected().unwrap(), 0);
    assert_eq!(snapshot(&editor), before);
    assert!(!editor.can_undo());
}

#[test]
fn locking_drops_selection_and_unlock_is_undoable() {
    let mut editor = dashboard();
    let bar = id("cpu_bar");
    editor.select(bar).unwrap();
    assert!(editor.set_locked(bar, true).unwrap());
    assert!(!editor.is_selected(bar));
    assert_eq!(editor.delete_selected().unwrap(), 0);

    editor.undo().unwrap();
    assert!(!editor.scene().get(bar).unwrap().is_locked);
    editor.select(bar).unwrap();
}

#[test]
fn undo_prunes_removed_nodes_from_selection() {
    let mut editor = dashboard();
    let text = editor.place(NodeKind::Text, 20, 200, None).unwrap();
    editor.select(text).unwrap();
    editor.undo().unwrap();
    assert!(editor.selection().is_empty());
}

// ─── Clipboard ───────────────────────────────────────────────────────────

#[test]
fn paste_gets_fresh_id_and_offset() {
    let mut editor = dashboard();
    let before = snapshot(&editor);
    editor.select(id("cpu_bar")).unwrap();
    assert_eq!(editor.copy().unwrap(), 1);

    let pasted = editor.paste().unwrap();
    assert_ne!(pasted, id("cpu_bar"));
    assert_eq!(editor.scene().parent(pasted), Some(id("meters")));
    assert_eq!(
        editor.scene().get(pasted).unwrap().rect,
        Rect::new(20, 20, 300, 30)
    );
    assert!(editor.is_selected(pasted));

    assert_inverse(&mut editor, &before);
}

#[test]
fn paste_of_container_copies_subtree() {
    let mut editor = dashboard();
    editor.select(id("meters")).unwrap();
    assert_eq!(editor.copy().unwrap(), 3);
    let pasted = editor.paste().unwrap();
    let kids = editor.scene().children(pasted);
    assert_eq!(kids.len(), 2);
    assert!(!kids.contains(&id("cpu_bar")));
    assert_eq!(editor.scene().widget_count(), 7);

    editor.undo().unwrap();
    assert_eq!(editor.scene().widget_count(), 4);
}

// ─── Events ──────────────────────────────────────────────────────────────

#[test]
fn subscribers_see_changes() {
    let mut editor = dashboard();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    editor.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    editor.set_geometry(id("meters"), 20, 80, 320, 100).unwrap();
    assert!(
        seen.borrow()
            .contains(&ChangeEvent::GeometryChanged(id("meters")))
    );

    editor.place(NodeKind::Progress, 0, 200, None).unwrap();
    assert!(seen.borrow().contains(&ChangeEvent::HierarchyChanged));

    editor.set_visible(id("ram_bar"), true).unwrap();
    assert!(seen.borrow().contains(&ChangeEvent::PropertyChanged(
        id("ram_bar"),
        "is_visible".to_string()
    )));
    assert_eq!(editor.poll_events().len(), seen.borrow().len());
}
