use serde::{Deserialize, Serialize};

/// Horizontal control-point offset as a share of the anchor distance.
pub const CONTROL_RATIO: f32 = 0.4;
/// Smallest control-point offset, keeps curves readable when boxes nearly touch.
pub const MIN_CONTROL_OFFSET: f32 = 30.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either dimension collapsed, e.g. a hidden container.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Axis-aligned rectangle in layout units, origin at the container's top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn union(&self, other: &Rect) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// Rectangles for one relationship endpoint: the column row and its owning box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointRects {
    pub column: Rect,
    pub entity: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConnectorConfig {
    pub control_ratio: f32,
    pub min_control_offset: f32,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            control_ratio: CONTROL_RATIO,
            min_control_offset: MIN_CONTROL_OFFSET,
        }
    }
}

/// Cubic connector between two column rows.
///
/// `start` is always on the left box and `end` on the right box. When the
/// relationship's source sits on the right, `reversed` is set so the source and
/// target anchors can still be recovered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorPath {
    pub relationship: usize,
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
    pub reversed: bool,
}

impl ConnectorPath {
    pub fn from_anchor(&self) -> Point {
        if self.reversed { self.end } else { self.start }
    }

    pub fn to_anchor(&self) -> Point {
        if self.reversed { self.start } else { self.end }
    }

    /// Evaluate the curve at `t` in `[0, 1]`.
    pub fn point_at(&self, t: f32) -> Point {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let a = u * u * u;
        let b = 3.0 * u * u * t;
        let c = 3.0 * u * t * t;
        let d = t * t * t;
        Point::new(
            a * self.start.x + b * self.control1.x + c * self.control2.x + d * self.end.x,
            a * self.start.y + b * self.control1.y + c * self.control2.y + d * self.end.y,
        )
    }

    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    pub fn to_svg_path_data(&self) -> String {
        format!(
            "M {:.2} {:.2} C {:.2} {:.2}, {:.2} {:.2}, {:.2} {:.2}",
            self.start.x,
            self.start.y,
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y
        )
    }
}

/// Build the connector for relationship `index` from its measured endpoints.
///
/// Anchors sit on the facing exterior edges of the two boxes, at the vertical
/// center of each column row. Degenerate rectangles produce a short or empty
/// curve, never a panic.
pub fn connector_between(
    index: usize,
    from: &EndpointRects,
    to: &EndpointRects,
    config: &ConnectorConfig,
) -> ConnectorPath {
    let reversed = to.entity.center_x() < from.entity.center_x();
    let (left, right) = if reversed { (to, from) } else { (from, to) };

    let start = Point::new(left.entity.right(), left.column.center_y());
    let end = Point::new(right.entity.x, right.column.center_y());

    let offset = ((end.x - start.x).abs() * config.control_ratio).max(config.min_control_offset);

    ConnectorPath {
        relationship: index,
        start,
        control1: Point::new(start.x + offset, start.y),
        control2: Point::new(end.x - offset, end.y),
        end,
        reversed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(x: f32, row_y: f32) -> EndpointRects {
        EndpointRects {
            column: Rect::new(x, row_y, 160.0, 20.0),
            entity: Rect::new(x, 0.0, 160.0, 120.0),
        }
    }

    #[test]
    fn anchors_sit_on_facing_box_edges() {
        let from = endpoint(0.0, 40.0);
        let to = endpoint(400.0, 80.0);
        let path = connector_between(0, &from, &to, &ConnectorConfig::default());

        assert_eq!(path.start, Point::new(160.0, 50.0));
        assert_eq!(path.end, Point::new(400.0, 90.0));
        assert!(!path.reversed);
    }

    #[test]
    fn control_offset_is_forty_percent_of_distance() {
        let from = endpoint(0.0, 40.0);
        let to = endpoint(400.0, 40.0);
        let path = connector_between(0, &from, &to, &ConnectorConfig::default());

        // distance 240 → offset 96
        assert!((path.control1.x - 256.0).abs() < 1e-4);
        assert!((path.control2.x - 304.0).abs() < 1e-4);
        assert_eq!(path.control1.y, path.start.y);
        assert_eq!(path.control2.y, path.end.y);
    }

    #[test]
    fn close_boxes_use_minimum_offset() {
        let from = endpoint(0.0, 40.0);
        let to = endpoint(170.0, 40.0);
        let path = connector_between(0, &from, &to, &ConnectorConfig::default());

        assert!((path.control1.x - (160.0 + MIN_CONTROL_OFFSET)).abs() < 1e-4);
        assert!((path.control2.x - (170.0 - MIN_CONTROL_OFFSET)).abs() < 1e-4);
    }

    #[test]
    fn source_on_the_right_flips_anchor_side_only() {
        let from = endpoint(400.0, 80.0);
        let to = endpoint(0.0, 40.0);
        let path = connector_between(3, &from, &to, &ConnectorConfig::default());

        assert!(path.reversed);
        assert_eq!(path.relationship, 3);
        assert_eq!(path.start, Point::new(160.0, 50.0));
        assert_eq!(path.from_anchor(), Point::new(400.0, 90.0));
        assert_eq!(path.to_anchor(), Point::new(160.0, 50.0));
    }

    #[test]
    fn zero_width_boxes_degrade_without_panicking() {
        let collapsed = EndpointRects {
            column: Rect::default(),
            entity: Rect::default(),
        };
        let path = connector_between(0, &collapsed, &collapsed, &ConnectorConfig::default());

        assert_eq!(path.start, path.end);
        assert_eq!(path.point_at(0.5), Point::new(0.0, 0.0));
    }

    #[test]
    fn curve_endpoints_match_anchors() {
        let path = connector_between(
            0,
            &endpoint(0.0, 10.0),
            &endpoint(300.0, 90.0),
            &ConnectorConfig::default(),
        );
        assert_eq!(path.point_at(0.0), path.start);
        assert_eq!(path.point_at(1.0), path.end);
        assert!(path.to_svg_path_data().starts_with("M 160.00 20.00 C"));
    }

    #[test]
    fn rect_union_and_empty_size() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 30.0, 15.0));
        assert!(Size::new(0.0, 100.0).is_empty());
        assert!(!Size::new(1.0, 1.0).is_empty());
    }
}
