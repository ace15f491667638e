//! Widget data model.
//!
//! A [`Node`] is one placed widget or container. Style is a typed struct of
//! optional presentation attributes; content is a closed variant per
//! [`NodeKind`] with an explicit field schema. Both carry an overflow map so
//! keys written by newer versions survive a load/save cycle untouched.

use crate::geometry::{MIN_NODE_SIZE, MIN_ROOT_SIZE, Rect};
use crate::id::NodeId;
use crate::lenient;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Unrecognised keys kept verbatim for round-tripping.
pub type Extra = Map<String, Value>;

// ─── Kinds ───────────────────────────────────────────────────────────────

/// The closed set of widget types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Group,
    Rect,
    Circle,
    Image,
    Progress,
    Text,
    Clock,
    Date,
    RootFrame,
}

impl NodeKind {
    /// Every kind a user can place from the template palette.
    pub const PLACEABLE: [NodeKind; 8] = [
        NodeKind::Group,
        NodeKind::Rect,
        NodeKind::Circle,
        NodeKind::Image,
        NodeKind::Progress,
        NodeKind::Text,
        NodeKind::Clock,
        NodeKind::Date,
    ];

    /// Whether nodes of this kind may own children.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeKind::Group | NodeKind::Rect | NodeKind::Circle | NodeKind::RootFrame
        )
    }

    pub fn min_size(self) -> i32 {
        if self == NodeKind::RootFrame {
            MIN_ROOT_SIZE
        } else {
            MIN_NODE_SIZE
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Rect => "rect",
            NodeKind::Circle => "circle",
            NodeKind::Image => "image",
            NodeKind::Progress => "progress",
            NodeKind::Text => "text",
            NodeKind::Clock => "clock",
            NodeKind::Date => "date",
            NodeKind::RootFrame => "root_frame",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "group" => Ok(NodeKind::Group),
            "rect" => Ok(NodeKind::Rect),
            "circle" => Ok(NodeKind::Circle),
            "image" => Ok(NodeKind::Image),
            "progress" => Ok(NodeKind::Progress),
            "text" => Ok(NodeKind::Text),
            "clock" => Ok(NodeKind::Clock),
            "date" => Ok(NodeKind::Date),
            "root_frame" => Ok(NodeKind::RootFrame),
            other => Err(format!("unknown widget type `{other}`")),
        }
    }
}

// ─── Style ───────────────────────────────────────────────────────────────

/// Presentation attributes. Interpreted only by renderers.
///
/// Fields are optional because each template carries a different key set;
/// absent keys stay absent on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Hex color or `"transparent"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,

    /// Background image path; empty string means none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient::opt_int")]
    pub bg_x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient::opt_int")]
    pub bg_y: Option<i32>,
    /// 0 together with `bg_h == 0` means "cover the widget".
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient::opt_int")]
    pub bg_w: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient::opt_int")]
    pub bg_h: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_gradient: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grad_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grad_end: Option<String>,
    /// Degrees.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient::opt_int")]
    pub grad_angle: Option<i32>,

    /// 0.0 ..= 1.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient::opt_int")]
    pub radius: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "lenient::opt_int")]
    pub border_width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl Style {
    /// Background sub-rectangle, if one was set explicitly.
    pub fn bg_rect(&self) -> Option<Rect> {
        let w = self.bg_w.unwrap_or(0);
        let h = self.bg_h.unwrap_or(0);
        (w > 0 && h > 0).then(|| Rect::new(self.bg_x.unwrap_or(0), self.bg_y.unwrap_or(0), w, h))
    }

    pub fn is_transparent(&self) -> bool {
        self.bg_color.as_deref() == Some("transparent")
    }
}

// ─── Content ─────────────────────────────────────────────────────────────

/// Font and text color shared by every text-bearing widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFace {
    pub font_family: String,
    #[serde(with = "lenient::int")]
    pub font_size: i32,
    pub color: String,
    pub use_text_gradient: bool,
    pub text_grad_start: String,
    pub text_grad_end: String,
    #[serde(with = "lenient::int")]
    pub text_grad_angle: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressContent {
    pub value: f64,
    pub max_value: f64,
    pub bar_color: String,
    pub use_gradient: bool,
    pub grad_start: String,
    pub grad_end: String,
    #[serde(with = "lenient::int")]
    pub grad_angle: i32,
    #[serde(flatten)]
    pub extra: Extra,
}

impl ProgressContent {
    /// Filled fraction in `0.0..=1.0`; a zero maximum counts as 1.
    pub fn ratio(&self) -> f64 {
        let max = if self.max_value == 0.0 {
            1.0
        } else {
            self.max_value
        };
        (self.value / max).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
    #[serde(flatten)]
    pub face: TextFace,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockContent {
    /// `HH`, `mm`, `ss` tokens plus literal text, e.g. `HH:mm`.
    pub format: String,
    #[serde(flatten)]
    pub face: TextFace,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateContent {
    /// strftime pattern, e.g. `%A, %d %B`.
    pub format: String,
    pub locale: String,
    #[serde(flatten)]
    pub face: TextFace,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Type-specific payload. Serialized as a plain map; the node's kind
/// decides which variant a map decodes into.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Empty(Extra),
    Progress(ProgressContent),
    Text(TextContent),
    Clock(ClockContent),
    Date(DateContent),
}

impl Content {
    pub fn face(&self) -> Option<&TextFace> {
        match self {
            Content::Text(c) => Some(&c.face),
            Content::Clock(c) => Some(&c.face),
            Content::Date(c) => Some(&c.face),
            Content::Empty(_) | Content::Progress(_) => None,
        }
    }

    /// Decode a map into the variant `kind` expects. No backfill: every
    /// schema key must be present.
    pub fn from_value(kind: NodeKind, value: Value) -> Result<Content, serde_json::Error> {
        Ok(match kind {
            NodeKind::Progress => Content::Progress(serde_json::from_value(value)?),
            NodeKind::Text => Content::Text(serde_json::from_value(value)?),
            NodeKind::Clock => Content::Clock(serde_json::from_value(value)?),
            NodeKind::Date => Content::Date(serde_json::from_value(value)?),
            NodeKind::Group
            | NodeKind::Rect
            | NodeKind::Circle
            | NodeKind::Image
            | NodeKind::RootFrame => Content::Empty(serde_json::from_value(value)?),
        })
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

impl Default for Content {
    fn default() -> Self {
        Content::Empty(Extra::new())
    }
}

impl Serialize for Content {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Content::Empty(extra) => extra.serialize(serializer),
            Content::Progress(c) => c.serialize(serializer),
            Content::Text(c) => c.serialize(serializer),
            Content::Clock(c) => c.serialize(serializer),
            Content::Date(c) => c.serialize(serializer),
        }
    }
}

// ─── Node ────────────────────────────────────────────────────────────────

/// One placed widget or container.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    /// Position relative to the parent's origin, plus size.
    pub rect: Rect,
    pub z_index: i32,
    pub is_locked: bool,
    pub is_visible: bool,
    pub style: Style,
    pub content: Content,
}

impl Node {
    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::RootFrame
    }
}
