use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::diagram::{Diagram, EntityBox, Unresolved};
use crate::fonts::TextMeasure;
use crate::geometry::{ConnectorConfig, ConnectorPath, EndpointRects, Rect, Size, connector_between};

/// Source of on-screen rectangles for boxes and their column rows.
pub trait LayoutProvider {
    fn container(&self) -> Size;
    fn box_rect(&self, entity: &str) -> Option<Rect>;
    fn column_rect(&self, entity: &str, column: &str) -> Option<Rect>;
}

/// What to do with a relationship whose endpoints cannot be located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedPolicy {
    /// Leave the connector out, say nothing.
    #[default]
    SkipUnresolved,
    /// Leave the connector out and log a warning naming the broken reference.
    WarnAndSkip,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    UnknownBox(String),
    UnknownColumn { entity: String, column: String },
    NotVisible,
    ZeroSizeContainer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Resolved {
        from: EndpointRects,
        to: EndpointRects,
    },
    Unavailable(Reason),
}

impl Measurement {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Measurement::Resolved { .. })
    }
}

fn endpoint<P: LayoutProvider + ?Sized>(
    provider: &P,
    entity: &str,
    column: &str,
) -> Option<EndpointRects> {
    Some(EndpointRects {
        entity: provider.box_rect(entity)?,
        column: provider.column_rect(entity, column)?,
    })
}

/// Locate both endpoints of every declared relationship, in declaration order.
pub fn measure<P: LayoutProvider + ?Sized>(
    provider: &P,
    diagram: &Diagram,
    policy: UnresolvedPolicy,
) -> Vec<Measurement> {
    let container_empty = provider.container().is_empty();

    diagram
        .relationships
        .iter()
        .enumerate()
        .map(|(idx, rel)| {
            if let Err(why) = diagram.resolve(rel) {
                if policy == UnresolvedPolicy::WarnAndSkip {
                    tracing::warn!(
                        relationship = idx,
                        from = %rel.from,
                        from_column = %rel.from_column,
                        to = %rel.to,
                        to_column = %rel.to_column,
                        "skipping connector: {}",
                        why
                    );
                }
                return Measurement::Unavailable(match why {
                    Unresolved::MissingBox(name) => Reason::UnknownBox(name),
                    Unresolved::MissingColumn { entity, column } => {
                        Reason::UnknownColumn { entity, column }
                    }
                });
            }

            if container_empty {
                return Measurement::Unavailable(Reason::ZeroSizeContainer);
            }

            match (
                endpoint(provider, &rel.from, &rel.from_column),
                endpoint(provider, &rel.to, &rel.to_column),
            ) {
                (Some(from), Some(to)) => Measurement::Resolved { from, to },
                _ => Measurement::Unavailable(Reason::NotVisible),
            }
        })
        .collect()
}

/// Measure and build a connector for every relationship that resolved.
pub fn compute_connectors<P: LayoutProvider + ?Sized>(
    provider: &P,
    diagram: &Diagram,
    policy: UnresolvedPolicy,
    config: &ConnectorConfig,
) -> Vec<ConnectorPath> {
    let paths: Vec<ConnectorPath> = measure(provider, diagram, policy)
        .iter()
        .enumerate()
        .filter_map(|(idx, m)| match m {
            Measurement::Resolved { from, to } => Some(connector_between(idx, from, to, config)),
            Measurement::Unavailable(_) => None,
        })
        .collect();

    tracing::debug!(
        declared = diagram.relationships.len(),
        drawn = paths.len(),
        "computed connectors"
    );
    paths
}

// ============================================
// FIXED LAYOUT
// ============================================

/// Provider backed by explicit rectangles, for hosts that measured already.
#[derive(Debug, Clone, Default)]
pub struct FixedLayout {
    container: Size,
    boxes: HashMap<String, Rect>,
    columns: HashMap<(String, String), Rect>,
}

impl FixedLayout {
    pub fn new(container: Size) -> Self {
        Self {
            container,
            ..Default::default()
        }
    }

    pub fn with_box(mut self, entity: impl Into<String>, rect: Rect) -> Self {
        self.boxes.insert(entity.into(), rect);
        self
    }

    pub fn with_column(
        mut self,
        entity: impl Into<String>,
        column: impl Into<String>,
        rect: Rect,
    ) -> Self {
        self.columns.insert((entity.into(), column.into()), rect);
        self
    }

    /// Place a whole entity: a header of `header_height` then equal column rows.
    pub fn with_entity(mut self, entity: &EntityBox, rect: Rect, header_height: f32) -> Self {
        let rows = entity.columns.len().max(1) as f32;
        let row_height = ((rect.height - header_height) / rows).max(0.0);
        for (idx, column) in entity.columns.iter().enumerate() {
            let y = rect.y + header_height + idx as f32 * row_height;
            self.columns.insert(
                (entity.name.clone(), column.clone()),
                Rect::new(rect.x, y, rect.width, row_height),
            );
        }
        self.boxes.insert(entity.name.clone(), rect);
        self
    }

    pub fn set_container(&mut self, container: Size) {
        self.container = container;
    }

    pub fn move_box(&mut self, entity: &str, dx: f32, dy: f32) {
        if let Some(rect) = self.boxes.get_mut(entity) {
            *rect = rect.translate(dx, dy);
        }
        for ((owner, _), rect) in self.columns.iter_mut() {
            if owner == entity {
                *rect = rect.translate(dx, dy);
            }
        }
    }
}

impl LayoutProvider for FixedLayout {
    fn container(&self) -> Size {
        self.container
    }

    fn box_rect(&self, entity: &str) -> Option<Rect> {
        self.boxes.get(entity).copied()
    }

    fn column_rect(&self, entity: &str, column: &str) -> Option<Rect> {
        self.columns
            .get(&(entity.to_string(), column.to_string()))
            .copied()
    }
}

// ============================================
// FLOW LAYOUT
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LayoutConfig {
    pub font_size: f32,
    pub margin: f32,
    pub gap_x: f32,
    pub gap_y: f32,
    pub header_height: f32,
    pub row_height: f32,
    pub padding_x: f32,
    pub min_box_width: f32,
    /// Containers narrower than this hide the graphical view.
    pub stack_breakpoint: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            margin: 16.0,
            // Wide gaps leave room for connector curves and labels.
            gap_x: 120.0,
            gap_y: 48.0,
            header_height: 32.0,
            row_height: 24.0,
            padding_x: 14.0,
            min_box_width: 140.0,
            stack_breakpoint: 480.0,
        }
    }
}

#[derive(Debug, Clone)]
struct PlacedBox {
    rect: Rect,
    rows: Vec<(String, Rect)>,
}

/// Native provider: sizes boxes from their text and flows them into rows.
///
/// Boxes go left to right and wrap to a new row when the container width runs
/// out. Below `stack_breakpoint` nothing is placed and every query misses,
/// which leaves the legend as the only presentation.
#[derive(Debug, Clone)]
pub struct FlowLayout {
    container: Size,
    boxes: HashMap<String, PlacedBox>,
    order: Vec<String>,
    visible: bool,
}

impl FlowLayout {
    pub fn new<T: TextMeasure>(
        diagram: &Diagram,
        container_width: f32,
        config: &LayoutConfig,
        measure: &mut T,
    ) -> Self {
        let width = if container_width.is_finite() {
            container_width.max(0.0)
        } else {
            0.0
        };
        let visible = width >= config.stack_breakpoint && width > 0.0;

        let mut boxes = HashMap::new();
        let mut order = Vec::new();
        let mut bottom: f32 = 0.0;

        if visible {
            let mut x = config.margin;
            let mut y = config.margin;
            let mut row_h: f32 = 0.0;

            for entity in &diagram.entities {
                if boxes.contains_key(&entity.name) {
                    continue;
                }
                let (w, h) = Self::box_size(entity, config, measure);
                if x > config.margin && x + w > width - config.margin {
                    x = config.margin;
                    y += row_h + config.gap_y;
                    row_h = 0.0;
                }

                let rect = Rect::new(x, y, w, h);
                let rows = entity
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| {
                        let row_y = y + config.header_height + idx as f32 * config.row_height;
                        (column.clone(), Rect::new(x, row_y, w, config.row_height))
                    })
                    .collect();

                boxes.insert(entity.name.clone(), PlacedBox { rect, rows });
                order.push(entity.name.clone());

                x += w + config.gap_x;
                row_h = row_h.max(h);
                bottom = bottom.max(rect.bottom());
            }
        }

        let height = if boxes.is_empty() {
            0.0
        } else {
            bottom + config.margin
        };

        Self {
            container: Size::new(width, height),
            boxes,
            order,
            visible,
        }
    }

    fn box_size<T: TextMeasure>(
        entity: &EntityBox,
        config: &LayoutConfig,
        measure: &mut T,
    ) -> (f32, f32) {
        let title_font = config.font_size;
        let column_font = config.font_size * 0.9;

        let mut max_w = measure
            .measure_text(&entity.name, title_font, true, false)
            .0;
        for column in &entity.columns {
            let bold = entity.is_primary(column);
            // Leave room for the key marker in front of the primary column.
            let text = if bold {
                format!("PK {}", column)
            } else {
                column.clone()
            };
            max_w = max_w.max(measure.measure_text(&text, column_font, bold, true).0);
        }

        let width = (max_w + config.padding_x * 2.0).max(config.min_box_width);
        let height = config.header_height + entity.columns.len() as f32 * config.row_height;
        (width, height)
    }

    /// False when the container is under the breakpoint and boxes are hidden.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Placed boxes in declaration order.
    pub fn placed(&self) -> impl Iterator<Item = (&str, Rect)> + '_ {
        self.order
            .iter()
            .filter_map(|name| self.boxes.get(name).map(|b| (name.as_str(), b.rect)))
    }
}

impl LayoutProvider for FlowLayout {
    fn container(&self) -> Size {
        self.container
    }

    fn box_rect(&self, entity: &str) -> Option<Rect> {
        self.boxes.get(entity).map(|b| b.rect)
    }

    fn column_rect(&self, entity: &str, column: &str) -> Option<Rect> {
        self.boxes
            .get(entity)?
            .rows
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, rect)| *rect)
    }
}
