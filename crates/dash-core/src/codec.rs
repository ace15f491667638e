//! Project document codec: `SceneGraph` ↔ pretty-printed JSON.
//!
//! ```text
//! { "version": "0.1.0",
//!   "root":    { "id": "root", "type": "root_frame", ... },
//!   "widgets": [ { "id": ..., "parent_id": "root", ... }, ... ] }
//! ```
//!
//! Widgets are written depth-first from the Root Frame, siblings in paint
//! order, so a parent always precedes its children. Loading does not rely
//! on that order: every record is instantiated first, then linked by
//! `parent_id`.

use crate::error::CodecError;
use crate::geometry::{Rect, ScreenBounds};
use crate::id::NodeId;
use crate::lenient;
use crate::model::{Content, Extra, Node, NodeKind, Style};
use crate::scene::SceneGraph;
use crate::template;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::Path;

/// Written into every saved document.
pub const FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

// ─── Records ─────────────────────────────────────────────────────────────

/// One node as it appears on disk.
///
/// Numbers are accepted as floats (older files stored `z_index: 3.0`) and
/// every field but `id` and `type` may be absent; absent fields fall back
/// to the kind's template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetRecord {
    pub id: NodeId,
    /// Kept as a string so unknown types can be reported and recovered.
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, with = "lenient::int")]
    pub x: i32,
    #[serde(default, with = "lenient::int")]
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient::opt_int")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient::opt_int")]
    pub height: Option<i32>,
    #[serde(default, with = "lenient::int")]
    pub z_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_container: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Extra>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Extra>,
}

fn default_type() -> String {
    NodeKind::Rect.as_str().to_string()
}

fn to_map<T: Serialize>(value: &T) -> Extra {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Extra::new(),
    }
}

/// Overlay stored content keys onto the template's so documents written
/// before a key existed still decode. Falls back to the template when the
/// stored values have the wrong types.
pub fn backfill_content(kind: NodeKind, id: NodeId, stored: Extra) -> Content {
    let defaults = template::default_content(kind);
    let mut merged = to_map(&defaults);
    merged.extend(stored);
    Content::from_value(kind, Value::Object(merged)).unwrap_or_else(|e| {
        log::warn!("{id}: content does not fit `{kind}` ({e}); using template defaults");
        defaults
    })
}

fn decode_style(id: NodeId, stored: Extra, fallback: Style) -> Style {
    serde_json::from_value(Value::Object(stored)).unwrap_or_else(|e| {
        log::warn!("{id}: unreadable style ({e}); using template defaults");
        fallback
    })
}

impl WidgetRecord {
    /// Record for a widget under `parent`.
    pub fn from_node(node: &Node, parent: NodeId) -> Self {
        Self {
            id: node.id,
            kind: node.kind.as_str().to_string(),
            name: Some(node.name.clone()),
            x: node.rect.x,
            y: node.rect.y,
            width: Some(node.rect.width),
            height: Some(node.rect.height),
            z_index: node.z_index,
            parent_id: Some(parent),
            is_container: Some(node.is_container()),
            is_locked: Some(node.is_locked),
            is_visible: Some(node.is_visible),
            style: Some(to_map(&node.style)),
            content: Some(to_map(&node.content)),
        }
    }

    /// Record for the Root Frame: geometry, name and style only.
    pub fn from_root(node: &Node) -> Self {
        Self {
            parent_id: None,
            is_container: None,
            is_locked: None,
            is_visible: None,
            content: None,
            ..Self::from_node(node, node.id)
        }
    }

    /// Resolve the stored type, falling back to `rect` for unknown types.
    pub fn node_kind(&self) -> NodeKind {
        match self.kind.parse::<NodeKind>() {
            Ok(NodeKind::RootFrame) => {
                log::warn!("{}: a second root frame is loaded as a rect", self.id);
                NodeKind::Rect
            }
            Ok(kind) => kind,
            Err(e) => {
                log::warn!("{}: {e}; loaded as a rect", self.id);
                NodeKind::Rect
            }
        }
    }

    /// Instantiate the widget this record describes, template-backfilled.
    pub fn into_node(self) -> Node {
        let kind = self.node_kind();
        let mut node = template::instantiate(kind, self.id, self.x, self.y);
        self.overlay(&mut node);
        node
    }

    /// Instantiate a Root Frame from this record.
    pub fn into_root(self) -> Node {
        let mut node = template::root_frame();
        node.rect.x = self.x;
        node.rect.y = self.y;
        node.content = Content::default();
        self.overlay(&mut node);
        node
    }

    fn overlay(self, node: &mut Node) {
        if let Some(name) = self.name {
            node.name = name;
        }
        node.rect = Rect::new(
            node.rect.x,
            node.rect.y,
            self.width.unwrap_or(node.rect.width),
            self.height.unwrap_or(node.rect.height),
        );
        node.z_index = self.z_index;
        node.is_locked = self.is_locked.unwrap_or(false) && !node.is_root();
        node.is_visible = self.is_visible.unwrap_or(true);
        if let Some(style) = self.style {
            node.style = decode_style(node.id, style, node.style.clone());
        }
        if let Some(content) = self.content {
            if !node.is_root() {
                node.content = backfill_content(node.kind, node.id, content);
            }
        }
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// The on-disk document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDocument {
    pub version: String,
    pub root: WidgetRecord,
    pub widgets: Vec<WidgetRecord>,
}

/// Lenient view used while loading: every section is optional so the
/// missing-root case gets its own error.
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    root: Option<Value>,
    #[serde(default)]
    widgets: Vec<Value>,
}

impl ProjectDocument {
    /// Snapshot a scene graph.
    pub fn from_scene(scene: &SceneGraph) -> Self {
        let root_id = scene.root_id();
        let widgets = scene
            .traverse(root_id)
            .skip(1)
            .filter_map(|id| {
                let node = scene.get(id)?;
                let parent = scene.parent(id)?;
                Some(WidgetRecord::from_node(node, parent))
            })
            .collect();
        Self {
            version: FORMAT_VERSION.to_string(),
            root: WidgetRecord::from_root(scene.root()),
            widgets,
        }
    }
}

/// Serialize with 4-space indentation.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Encode the whole document.
pub fn save(scene: &SceneGraph) -> Result<Vec<u8>, CodecError> {
    to_pretty_json(&ProjectDocument::from_scene(scene))
}

pub fn save_file(scene: &SceneGraph, path: impl AsRef<Path>) -> Result<(), CodecError> {
    let bytes = save(scene)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Decode a document onto the default 1920×1080 screen.
pub fn load(bytes: &[u8]) -> Result<SceneGraph, CodecError> {
    load_with_screen(bytes, ScreenBounds::default())
}

pub fn load_file(path: impl AsRef<Path>) -> Result<SceneGraph, CodecError> {
    let bytes = std::fs::read(path)?;
    load(&bytes)
}

/// Decode a document.
///
/// Recovery rules: unreadable widget records and duplicate ids are skipped;
/// unknown parents, non-container parents and parent cycles fall back to
/// the Root Frame; finally every node is clamped top-down.
pub fn load_with_screen(bytes: &[u8], screen: ScreenBounds) -> Result<SceneGraph, CodecError> {
    let raw: RawDocument = serde_json::from_slice(bytes)?;
    let root: WidgetRecord = serde_json::from_value(raw.root.ok_or(CodecError::MissingRoot)?)?;
    if let Some(version) = &raw.version {
        log::debug!("loading document version {version}");
    }

    let mut scene = SceneGraph::with_screen(screen);
    scene.replace_root(root.into_root());
    let root_id = scene.root_id();

    // Pass 1: instantiate every record.
    let mut order = Vec::with_capacity(raw.widgets.len());
    let mut nodes: HashMap<NodeId, Node> = HashMap::with_capacity(raw.widgets.len());
    let mut parents: HashMap<NodeId, NodeId> = HashMap::with_capacity(raw.widgets.len());
    for (i, value) in raw.widgets.into_iter().enumerate() {
        let record: WidgetRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("widget #{i}: skipped unreadable record ({e})");
                continue;
            }
        };
        if record.id == root_id || nodes.contains_key(&record.id) {
            log::warn!("{}: duplicate id skipped", record.id);
            continue;
        }
        let id = record.id;
        parents.insert(id, record.parent_id.unwrap_or(root_id));
        nodes.insert(id, record.into_node());
        order.push(id);
    }

    // Pass 2: resolve parents.
    let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for id in &order {
        let wanted = parents[id];
        let parent = if wanted == root_id {
            root_id
        } else {
            match nodes.get(&wanted) {
                Some(p) if p.is_container() => wanted,
                Some(_) => {
                    log::warn!("{id}: parent {wanted} cannot hold children; moved to root");
                    root_id
                }
                None => {
                    log::warn!("{id}: unknown parent {wanted}; moved to root");
                    root_id
                }
            }
        };
        children.entry(parent).or_default().push(*id);
    }

    link_descendants(&mut scene, root_id, &children, &mut nodes);
    // Whatever is left only reaches itself through a parent cycle.
    for id in &order {
        if let Some(node) = nodes.remove(id) {
            log::warn!("{id}: parent cycle; moved to root");
            scene.link_loaded(root_id, node);
            link_descendants(&mut scene, *id, &children, &mut nodes);
        }
    }

    let walk: Vec<NodeId> = scene.traverse(root_id).collect();
    for id in walk {
        if let Some(rect) = scene.get(id).map(|n| n.rect) {
            scene.write_rect(id, rect);
        }
    }
    log::debug!("loaded {} widgets", scene.widget_count());
    Ok(scene)
}

fn link_descendants(
    scene: &mut SceneGraph,
    top: NodeId,
    children: &HashMap<NodeId, Vec<NodeId>>,
    nodes: &mut HashMap<NodeId, Node>,
) {
    let mut queue = VecDeque::from([top]);
    while let Some(parent) = queue.pop_front() {
        for child in children.get(&parent).into_iter().flatten() {
            if let Some(node) = nodes.remove(child) {
                scene.link_loaded(parent, node);
                queue.push_back(*child);
            }
        }
    }
}
