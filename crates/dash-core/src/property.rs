//! Dotted property paths: `x`, `name`, `style.bg_color`, `content.font_size`.
//!
//! Paths address one scalar on a node. Reads and writes go through
//! `serde_json::Value` so the editor can record old/new values without
//! knowing the field's Rust type. A path that does not resolve against the
//! node's current fields reads as `None` and writes as a no-op.

use crate::geometry::Rect;
use crate::id::NodeId;
use crate::model::{Content, Node, Style};
use crate::scene::{RectChange, SceneGraph};
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use winnow::combinator::separated;
use winnow::prelude::*;
use winnow::token::take_while;

/// A parsed dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: SmallVec<[String; 3]>,
}

fn parse_segment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)
}

fn parse_path<'a>(input: &mut &'a str) -> ModalResult<Vec<&'a str>> {
    separated(1.., parse_segment, '.').parse_next(input)
}

impl PropertyPath {
    /// Parse `a.b.c`. Returns `None` for empty segments or stray characters.
    pub fn parse(input: &str) -> Option<Self> {
        let segments = parse_path.parse(input).ok()?;
        Some(Self {
            segments: segments.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Whether writing this path moves or resizes the node.
    pub fn is_geometry(&self) -> bool {
        self.segments.len() == 1
            && matches!(self.segments[0].as_str(), "x" | "y" | "width" | "height")
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl std::str::FromStr for PropertyPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid property path `{s}`"))
    }
}

// ─── Reading ─────────────────────────────────────────────────────────────

fn lookup<'v>(mut value: &'v Value, rest: &[String]) -> Option<&'v Value> {
    for key in rest {
        value = value.as_object()?.get(key)?;
    }
    Some(value)
}

/// Current value at `path`, or `None` if the path does not resolve.
pub fn read(node: &Node, path: &PropertyPath) -> Option<Value> {
    let (head, rest) = path.segments.split_first()?;
    let scalar = |v: Value| rest.is_empty().then_some(v);
    match head.as_str() {
        "id" => scalar(Value::from(node.id.as_str())),
        "type" => scalar(Value::from(node.kind.as_str())),
        "name" => scalar(Value::from(node.name.clone())),
        "x" => scalar(Value::from(node.rect.x)),
        "y" => scalar(Value::from(node.rect.y)),
        "width" => scalar(Value::from(node.rect.width)),
        "height" => scalar(Value::from(node.rect.height)),
        "z_index" => scalar(Value::from(node.z_index)),
        "is_locked" => scalar(Value::from(node.is_locked)),
        "is_visible" => scalar(Value::from(node.is_visible)),
        "is_container" => scalar(Value::from(node.is_container())),
        "style" => {
            let style = serde_json::to_value(&node.style).ok()?;
            lookup(&style, rest).cloned()
        }
        "content" => lookup(&node.content.to_value(), rest).cloned(),
        _ => None,
    }
}

// ─── Writing ─────────────────────────────────────────────────────────────

fn as_int(value: &Value) -> Option<i32> {
    value
        .as_i64()
        .map(|v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
        .or_else(|| value.as_f64().map(|v| v.round() as i32))
}

/// Replace the leaf at `rest` inside `target`. The leaf must already exist.
fn replace_leaf(target: &mut Value, rest: &[String], value: &Value) -> bool {
    let Some((last, parents)) = rest.split_last() else {
        return false;
    };
    let mut cursor = target;
    for key in parents {
        match cursor.as_object_mut().and_then(|m| m.get_mut(key)) {
            Some(next) => cursor = next,
            None => return false,
        }
    }
    match cursor.as_object_mut().and_then(|m| m.get_mut(last)) {
        Some(slot) => {
            *slot = value.clone();
            true
        }
        None => false,
    }
}

/// The rectangle a geometry path write would request.
pub fn requested_rect(node: &Node, path: &PropertyPath, value: &Value) -> Option<Rect> {
    if !path.is_geometry() {
        return None;
    }
    let v = as_int(value)?;
    let mut rect = node.rect;
    match path.segments[0].as_str() {
        "x" => rect.x = v,
        "y" => rect.y = v,
        "width" => rect.width = v,
        "height" => rect.height = v,
        _ => return None,
    }
    Some(rect)
}

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq)]
pub enum Written {
    /// A plain field changed.
    Field,
    /// A geometry write; carries every clamped rectangle it produced.
    Geometry(Vec<RectChange>),
}

/// Write `value` at `path` on node `id`.
///
/// Returns `None` (and changes nothing) when the node is missing, the path
/// does not resolve, or the value has the wrong type. Lock flags are not
/// consulted; geometry is clamped like any other move/resize.
pub fn write(
    scene: &mut SceneGraph,
    id: NodeId,
    path: &PropertyPath,
    value: &Value,
) -> Option<Written> {
    let node = scene.get(id)?;
    if let Some(rect) = requested_rect(node, path, value) {
        return Some(Written::Geometry(scene.write_rect(id, rect)));
    }

    let (head, rest) = path.segments.split_first()?;
    if !rest.is_empty() && !matches!(head.as_str(), "style" | "content") {
        return None;
    }
    match head.as_str() {
        "name" => {
            scene.rename(id, value.as_str()?).ok()?;
        }
        "z_index" => {
            scene.set_z_index(id, as_int(value)?).ok()?;
        }
        "is_locked" => {
            scene.set_locked(id, value.as_bool()?).ok()?;
        }
        "is_visible" => {
            scene.set_visible(id, value.as_bool()?).ok()?;
        }
        "style" => {
            let mut style = serde_json::to_value(&node.style).ok()?;
            if !replace_leaf(&mut style, rest, value) {
                return None;
            }
            let style: Style = serde_json::from_value(style).ok()?;
            scene.get_mut(id)?.style = style;
        }
        "content" => {
            let kind = node.kind;
            let mut content = node.content.to_value();
            if !replace_leaf(&mut content, rest, value) {
                return None;
            }
            let content = Content::from_value(kind, content).ok()?;
            scene.get_mut(id)?.content = content;
        }
        _ => return None,
    }
    log::debug!("{id}.{path} = {value}");
    Some(Written::Field)
}
