//! Default field sets for every widget kind.
//!
//! Placing a widget copies its template; loading a document overlays the
//! stored fields onto the template so keys added in later versions are
//! backfilled.

use crate::geometry::Rect;
use crate::id::NodeId;
use crate::model::*;

/// Initial Root Frame rectangle in screen coordinates.
pub const ROOT_FRAME_RECT: Rect = Rect::new(50, 50, 400, 300);

fn s(v: &str) -> Option<String> {
    Some(v.to_string())
}

fn face(size: i32, color: &str, grad_start: &str, grad_end: &str) -> TextFace {
    TextFace {
        font_family: "Arial".into(),
        font_size: size,
        color: color.into(),
        use_text_gradient: false,
        text_grad_start: grad_start.into(),
        text_grad_end: grad_end.into(),
        text_grad_angle: 90,
    }
}

/// Display label given to freshly placed widgets.
pub fn default_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Group => "Group",
        NodeKind::Rect => "Block",
        NodeKind::Circle => "Circle",
        NodeKind::Image => "Image",
        NodeKind::Progress => "Progress Bar",
        NodeKind::Text => "Text",
        NodeKind::Clock => "Clock",
        NodeKind::Date => "Date",
        NodeKind::RootFrame => "Root Frame",
    }
}

/// Template width and height.
pub fn default_size(kind: NodeKind) -> (i32, i32) {
    match kind {
        NodeKind::Group => (100, 100),
        NodeKind::Rect => (200, 200),
        NodeKind::Circle => (150, 150),
        NodeKind::Image => (200, 200),
        NodeKind::Progress => (300, 30),
        NodeKind::Text => (150, 50),
        NodeKind::Clock => (200, 80),
        NodeKind::Date => (200, 50),
        NodeKind::RootFrame => (ROOT_FRAME_RECT.width, ROOT_FRAME_RECT.height),
    }
}

/// Shape style shared by rect and circle, which differ only in colors,
/// gradient angle, radius and border.
fn shape_style(bg: &str, grad_end: &str, angle: i32, radius: i32, border: i32) -> Style {
    Style {
        bg_color: s(bg),
        bg_image: s(""),
        bg_x: Some(0),
        bg_y: Some(0),
        bg_w: Some(0),
        bg_h: Some(0),
        use_gradient: Some(false),
        grad_start: s(bg),
        grad_end: s(grad_end),
        grad_angle: Some(angle),
        opacity: Some(1.0),
        radius: Some(radius),
        border_width: Some(border),
        border_color: s("#000000"),
        extra: Extra::new(),
    }
}

fn plain_style(bg: &str, opacity: f64, radius: i32, border_color: &str) -> Style {
    Style {
        bg_color: s(bg),
        opacity: Some(opacity),
        radius: Some(radius),
        border_width: Some(0),
        border_color: s(border_color),
        ..Style::default()
    }
}

pub fn default_style(kind: NodeKind) -> Style {
    match kind {
        NodeKind::Group => Style {
            bg_color: s("transparent"),
            opacity: Some(1.0),
            border_width: Some(0),
            radius: Some(0),
            ..Style::default()
        },
        NodeKind::Rect => shape_style("#ffffff", "#cccccc", 90, 0, 1),
        NodeKind::Circle => shape_style("#3498db", "#2980b9", 45, 9999, 0),
        NodeKind::Image => Style {
            bg_color: s("transparent"),
            bg_image: s(""),
            bg_x: Some(0),
            bg_y: Some(0),
            bg_w: Some(0),
            bg_h: Some(0),
            opacity: Some(1.0),
            radius: Some(0),
            border_width: Some(0),
            border_color: s("#000000"),
            ..Style::default()
        },
        NodeKind::Progress => plain_style("#333333", 1.0, 15, "#000000"),
        NodeKind::Text | NodeKind::Date => plain_style("#ffffff", 0.0, 0, "#000000"),
        NodeKind::Clock => plain_style("#000000", 0.8, 10, "#ffffff"),
        NodeKind::RootFrame => Style {
            bg_color: s("#ffffff"),
            opacity: Some(1.0),
            radius: Some(0),
            border_width: Some(1),
            ..Style::default()
        },
    }
}

pub fn default_content(kind: NodeKind) -> Content {
    match kind {
        NodeKind::Progress => Content::Progress(ProgressContent {
            value: 50.0,
            max_value: 100.0,
            bar_color: "#00ff88".into(),
            use_gradient: false,
            grad_start: "#00ff88".into(),
            grad_end: "#00aa55".into(),
            grad_angle: 90,
            extra: Extra::new(),
        }),
        NodeKind::Text => Content::Text(TextContent {
            text: "Label".into(),
            face: face(14, "#000000", "#000000", "#555555"),
            extra: Extra::new(),
        }),
        NodeKind::Clock => Content::Clock(ClockContent {
            format: "HH:mm".into(),
            face: face(32, "#ffffff", "#ffffff", "#aaaaaa"),
            extra: Extra::new(),
        }),
        NodeKind::Date => Content::Date(DateContent {
            format: "%A, %d %B".into(),
            locale: "en_US".into(),
            face: face(18, "#000000", "#000000", "#555555"),
            extra: Extra::new(),
        }),
        NodeKind::Group
        | NodeKind::Rect
        | NodeKind::Circle
        | NodeKind::Image
        | NodeKind::RootFrame => Content::Empty(Extra::new()),
    }
}

/// Build a node of `kind` at local position `(x, y)` with template defaults.
pub fn instantiate(kind: NodeKind, id: NodeId, x: i32, y: i32) -> Node {
    let (width, height) = default_size(kind);
    Node {
        id,
        kind,
        name: default_name(kind).to_string(),
        rect: Rect::new(x, y, width, height),
        z_index: 0,
        is_locked: false,
        is_visible: true,
        style: default_style(kind),
        content: default_content(kind),
    }
}

/// A Root Frame in its reset state.
pub fn root_frame() -> Node {
    instantiate(
        NodeKind::RootFrame,
        NodeId::root(),
        ROOT_FRAME_RECT.x,
        ROOT_FRAME_RECT.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_kinds_match_templates() {
        let containers: Vec<_> = NodeKind::PLACEABLE
            .iter()
            .filter(|k| k.is_container())
            .collect();
        assert_eq!(
            containers,
            vec![&NodeKind::Group, &NodeKind::Rect, &NodeKind::Circle]
        );
    }

    #[test]
    fn content_variant_follows_kind() {
        for kind in NodeKind::PLACEABLE {
            let node = instantiate(kind, NodeId::generate(), 0, 0);
            let has_face = node.content.face().is_some();
            assert_eq!(
                has_face,
                matches!(kind, NodeKind::Text | NodeKind::Clock | NodeKind::Date),
                "{kind} content mismatch"
            );
        }
    }

    #[test]
    fn root_frame_defaults() {
        let root = root_frame();
        assert!(root.is_root());
        assert_eq!(root.rect, Rect::new(50, 50, 400, 300));
        assert_eq!(root.style.bg_color.as_deref(), Some("#ffffff"));
    }
}
