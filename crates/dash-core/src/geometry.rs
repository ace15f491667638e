//! Integer rectangles and the containment clamp.
//!
//! Every position/size update in the scene graph funnels through
//! [`clamp_rect`], which keeps a rectangle inside its bound and above the
//! minimum size. Position and size are clamped jointly per axis so a
//! simultaneous move + resize can never leave the rectangle half outside.

use serde::{Deserialize, Serialize};

/// Minimum width/height of an ordinary widget.
pub const MIN_NODE_SIZE: i32 = 20;

/// Minimum width/height of the Root Frame.
pub const MIN_ROOT_SIZE: i32 = 50;

/// Axis-aligned rectangle in integer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Bounding box of a set of rectangles. `None` when empty.
    pub fn bounding<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
        rects.into_iter().fold(None, |acc, r| match acc {
            None => Some(*r),
            Some(b) => Some(b.union(r)),
        })
    }

    /// True when `inner` lies completely within this rectangle.
    pub fn contains_rect(&self, inner: &Rect) -> bool {
        inner.x >= self.x
            && inner.y >= self.y
            && inner.right() <= self.right()
            && inner.bottom() <= self.bottom()
    }
}

/// The fixed virtual screen the Root Frame lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub rect: Rect,
}

impl Default for ScreenBounds {
    fn default() -> Self {
        Self {
            rect: Rect::new(0, 0, 1920, 1080),
        }
    }
}

/// Clamp `requested` into `bound`, flooring the size at `min`.
///
/// `current` is the rectangle before the update. On each axis: when the
/// extent changes, the origin is kept and the extent shrinks to fit; when
/// only the origin changes, the extent is kept and the origin shifts to fit.
pub fn clamp_rect(requested: Rect, current: Rect, bound: Rect, min: i32) -> Rect {
    let (x, width) = clamp_axis(
        requested.x,
        requested.width,
        current.width,
        bound.x,
        bound.width,
        min,
    );
    let (y, height) = clamp_axis(
        requested.y,
        requested.height,
        current.height,
        bound.y,
        bound.height,
        min,
    );
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn clamp_axis(pos: i32, len: i32, current_len: i32, lo: i32, extent: i32, min: i32) -> (i32, i32) {
    let len = len.max(min);
    if len != current_len {
        let pos = pos.clamp(lo, lo + (extent - min).max(0));
        let len = len.min((lo + extent - pos).max(min));
        (pos, len)
    } else {
        let len = len.min(extent.max(min));
        let pos = pos.clamp(lo, lo + (extent - len).max(0));
        (pos, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARENT: Rect = Rect::new(0, 0, 200, 200);

    #[test]
    fn resize_keeps_origin_and_shrinks() {
        let current = Rect::new(10, 10, 100, 100);
        let out = clamp_rect(Rect::new(10, 10, 250, 250), current, PARENT, MIN_NODE_SIZE);
        assert_eq!(out, Rect::new(10, 10, 190, 190));
    }

    #[test]
    fn move_keeps_size_and_shifts() {
        let current = Rect::new(10, 10, 100, 100);
        let out = clamp_rect(Rect::new(150, 180, 100, 100), current, PARENT, MIN_NODE_SIZE);
        assert_eq!(out, Rect::new(100, 100, 100, 100));
    }

    #[test]
    fn dragged_outside_snaps_to_corner() {
        let current = Rect::new(10, 10, 50, 50);
        let out = clamp_rect(Rect::new(-500, 900, 50, 50), current, PARENT, MIN_NODE_SIZE);
        assert_eq!(out, Rect::new(0, 150, 50, 50));
    }

    #[test]
    fn size_floors_at_minimum() {
        let current = Rect::new(0, 0, 100, 100);
        let out = clamp_rect(Rect::new(0, 0, 1, 1), current, PARENT, MIN_NODE_SIZE);
        assert_eq!((out.width, out.height), (20, 20));

        let screen = ScreenBounds::default().rect;
        let root = Rect::new(50, 50, 400, 300);
        let out = clamp_rect(Rect::new(50, 50, 1, 1), root, screen, MIN_ROOT_SIZE);
        assert_eq!((out.width, out.height), (50, 50));
    }

    #[test]
    fn resize_at_far_edge_keeps_minimum() {
        let current = Rect::new(190, 0, 20, 20);
        let out = clamp_rect(Rect::new(195, 0, 60, 20), current, PARENT, MIN_NODE_SIZE);
        assert!(PARENT.contains_rect(&out), "{out:?} escaped parent");
        assert_eq!(out.width, 20);
    }

    #[test]
    fn joint_move_and_resize_stays_inside() {
        let current = Rect::new(0, 0, 50, 50);
        let out = clamp_rect(Rect::new(180, 180, 120, 120), current, PARENT, MIN_NODE_SIZE);
        assert!(PARENT.contains_rect(&out), "{out:?} escaped parent");
    }

    #[test]
    fn bound_with_origin_offset() {
        let screen = Rect::new(100, 100, 1920, 1080);
        let current = Rect::new(150, 150, 400, 300);
        let out = clamp_rect(Rect::new(0, 0, 400, 300), current, screen, MIN_ROOT_SIZE);
        assert_eq!(out, Rect::new(100, 100, 400, 300));
    }

    #[test]
    fn bounding_box_of_many() {
        let rects = [Rect::new(10, 20, 30, 30), Rect::new(50, 5, 10, 10)];
        assert_eq!(Rect::bounding(&rects), Some(Rect::new(10, 5, 50, 45)));
        assert_eq!(Rect::bounding(std::iter::empty::<&Rect>()), None);
    }
}
