//! Pure geometry helpers used by the drawing pipeline and resize handling.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Axis-aligned box with non-negative extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectGeometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Normalize a drag from `(x1, y1)` to `(x2, y2)` into a box whose width and
/// height are non-negative whatever the drag direction.
pub fn normalize_rectangle(x1: f64, y1: f64, x2: f64, y2: f64) -> RectGeometry {
    RectGeometry {
        left: x1.min(x2),
        top: y1.min(y2),
        width: (x2 - x1).abs(),
        height: (y2 - y1).abs(),
    }
}

/// Circle drawn by dragging from `start` to `current`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleGeometry {
    pub left: f64,
    pub top: f64,
    pub radius: f64,
}

/// Radius is half the drag distance; left/top are the per-axis minimum.
pub fn circle_from_drag(start: Point, current: Point) -> CircleGeometry {
    CircleGeometry {
        left: start.x.min(current.x),
        top: start.y.min(current.y),
        radius: start.distance(current) / 2.0,
    }
}

/// Per-axis ratio between two container sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeScale {
    pub scale_x: f64,
    pub scale_y: f64,
}

impl ResizeScale {
    pub const IDENTITY: ResizeScale = ResizeScale {
        scale_x: 1.0,
        scale_y: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        (self.scale_x - 1.0).abs() < f64::EPSILON && (self.scale_y - 1.0).abs() < f64::EPSILON
    }
}

/// Ratio `new / old` per axis. A degenerate old extent yields 1.0 on that axis.
pub fn calculate_resize_scale(old: Size, new: Size) -> ResizeScale {
    let ratio = |o: f64, n: f64| {
        if o > 0.0 && o.is_finite() && n > 0.0 && n.is_finite() {
            n / o
        } else {
            1.0
        }
    };
    ResizeScale {
        scale_x: ratio(old.width, new.width),
        scale_y: ratio(old.height, new.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_inverted_drag() {
        assert_eq!(
            normalize_rectangle(50.0, 60.0, 10.0, 20.0),
            RectGeometry {
                left: 10.0,
                top: 20.0,
                width: 40.0,
                height: 40.0
            }
        );
    }

    #[test]
    fn normalize_forward_drag_matches_inverted() {
        assert_eq!(
            normalize_rectangle(10.0, 20.0, 50.0, 60.0),
            normalize_rectangle(50.0, 60.0, 10.0, 20.0)
        );
    }

    #[test]
    fn circle_radius_is_half_distance() {
        let c = circle_from_drag(Point::new(30.0, 40.0), Point::new(0.0, 0.0));
        assert_eq!(c.radius, 25.0);
        assert_eq!((c.left, c.top), (0.0, 0.0));
    }

    #[test]
    fn resize_scale_ratio() {
        assert_eq!(
            calculate_resize_scale(Size::new(400.0, 300.0), Size::new(800.0, 450.0)),
            ResizeScale {
                scale_x: 2.0,
                scale_y: 1.5
            }
        );
    }

    #[test]
    fn resize_scale_from_empty_container_is_identity() {
        let s = calculate_resize_scale(Size::ZERO, Size::new(800.0, 450.0));
        assert!(s.is_identity());
    }
}
