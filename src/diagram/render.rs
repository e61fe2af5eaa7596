use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::types::*;
use crate::config::Config;
use crate::fonts::TextMeasure;
use crate::geometry::{ConnectorPath, Point, Rect, Size};
use crate::legend::{LegendEntry, legend};
use crate::measure::{FlowLayout, LayoutProvider, compute_connectors};
use crate::svg::escape_xml;
use crate::theme::Theme;

const LEGEND_GAP: f32 = 16.0;
const LEGEND_LINE_HEIGHT: f32 = 1.6;
const MARKER_BAR: f32 = 6.0;

/// Style configuration for diagram rendering
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramStyle {
    pub background: String,
    pub box_fill: String,
    pub box_stroke: String,
    pub header_fill: String,
    pub header_text: String,
    pub column_text: String,
    pub key_text: String,
    pub connector_stroke: String,
    pub label_text: String,
    pub legend_text: String,
    pub muted_text: String,
    pub font_family: String,
    pub font_size: f32,
}

impl Default for DiagramStyle {
    fn default() -> Self {
        Self::from_theme(&Theme::github_light())
    }
}

impl DiagramStyle {
    pub fn from_theme(theme: &Theme) -> Self {
        let column_text = pick_higher_contrast(
            &theme.box_fill_color,
            &theme.text_color,
            &theme.background_color,
        );
        let header_text = pick_higher_contrast(
            &theme.header_color,
            &theme.background_color,
            &theme.text_color,
        );
        let connector_stroke = pick_higher_contrast(
            &theme.background_color,
            &theme.connector_color,
            &theme.text_color,
        );
        let legend_text = pick_higher_contrast(
            &theme.background_color,
            &theme.text_color,
            &theme.box_fill_color,
        );

        Self {
            background: theme.background_color.clone(),
            box_fill: theme.box_fill_color.clone(),
            box_stroke: theme.muted_color.clone(),
            header_fill: theme.header_color.clone(),
            header_text,
            column_text: column_text.clone(),
            key_text: pick_higher_contrast(&theme.box_fill_color, &theme.key_color, &column_text),
            connector_stroke,
            label_text: legend_text.clone(),
            legend_text,
            muted_text: theme.muted_color.clone(),
            font_family: "sans-serif".to_string(),
            font_size: 14.0,
        }
    }
}

fn parse_hex_rgb(value: &str) -> Option<(f32, f32, f32)> {
    let hex = value.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
    Some((r, g, b))
}

fn relative_luminance(color: (f32, f32, f32)) -> f32 {
    let linear = |v: f32| {
        if v <= 0.03928 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    };

    let (r, g, b) = color;
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

fn contrast_ratio(a: &str, b: &str) -> Option<f32> {
    let l1 = relative_luminance(parse_hex_rgb(a)?);
    let l2 = relative_luminance(parse_hex_rgb(b)?);
    let (hi, lo) = if l1 >= l2 { (l1, l2) } else { (l2, l1) };
    Some((hi + 0.05) / (lo + 0.05))
}

/// Prefer `primary` unless `secondary` reads better against `base`.
fn pick_higher_contrast(base: &str, primary: &str, secondary: &str) -> String {
    let p = contrast_ratio(base, primary).unwrap_or(0.0);
    let s = contrast_ratio(base, secondary).unwrap_or(0.0);

    if s > p {
        secondary.to_string()
    } else {
        primary.to_string()
    }
}

/// Whether connectors are painted under or over the boxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayPlacement {
    #[default]
    Behind,
    Above,
}

/// A fully rendered diagram block, ready to wrap in a document.
#[derive(Debug, Clone)]
pub struct RenderedDiagram {
    pub svg: String,
    pub width: f32,
    pub height: f32,
    pub connectors: usize,
    pub legend_entries: usize,
}

/// Lay out at `container_width` with [`FlowLayout`] and render.
pub fn render_at_width<T: TextMeasure>(
    diagram: &Diagram,
    container_width: f32,
    style: &DiagramStyle,
    config: &Config,
    measure: &mut T,
) -> RenderedDiagram {
    let layout = FlowLayout::new(diagram, container_width, &config.layout, measure);
    render_diagram(diagram, &layout, style, config, measure)
}

/// Render boxes, connectors and legend using rectangles from `provider`.
///
/// When no box is visible, or the container collapsed, the block degrades to
/// the legend alone.
pub fn render_diagram<P, T>(
    diagram: &Diagram,
    provider: &P,
    style: &DiagramStyle,
    config: &Config,
    measure: &mut T,
) -> RenderedDiagram
where
    P: LayoutProvider + ?Sized,
    T: TextMeasure,
{
    let container = provider.container();
    let paths = compute_connectors(provider, diagram, config.policy, &config.connector);
    let entries = legend(diagram);

    let mut boxes_svg = String::new();
    let mut graphic = false;
    if !container.is_empty() {
        for entity in &diagram.entities {
            if let Some(rect) = provider.box_rect(&entity.name) {
                boxes_svg.push_str(&render_entity(entity, &rect, provider, style));
                graphic = true;
            }
        }
    }

    let mut svg = String::new();
    let mut height = 0.0;
    let mut width = 0.0;

    if graphic {
        let overlay = render_overlay(&paths, diagram, container, style);
        match config.overlay {
            OverlayPlacement::Behind => {
                svg.push_str(&overlay);
                svg.push_str(&boxes_svg);
            }
            OverlayPlacement::Above => {
                svg.push_str(&boxes_svg);
                svg.push_str(&overlay);
            }
        }
        height = container.height + LEGEND_GAP;
        width = container.width;
    }

    let drawn: HashSet<usize> = paths.iter().map(|p| p.relationship).collect();
    let (legend_svg, legend_w, legend_h) = render_legend(&entries, &drawn, height, style, measure);
    svg.push_str(&legend_svg);

    RenderedDiagram {
        svg,
        width: f32::max(width, legend_w),
        height: height + legend_h,
        connectors: paths.len(),
        legend_entries: entries.len(),
    }
}

/// Connector layer sized to the container; one `<path>` per connector.
pub fn render_overlay(
    paths: &[ConnectorPath],
    diagram: &Diagram,
    container: Size,
    style: &DiagramStyle,
) -> String {
    let mut svg = format!(
        r#"<g class="connectors" data-width="{:.2}" data-height="{:.2}">"#,
        container.width, container.height
    );

    for path in paths {
        let Some(rel) = diagram.relationships.get(path.relationship) else {
            continue;
        };
        svg.push_str(&format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="1.5" data-from="{}.{}" data-to="{}.{}" />"#,
            path.to_svg_path_data(),
            style.connector_stroke,
            escape_xml(&rel.from),
            escape_xml(&rel.from_column),
            escape_xml(&rel.to),
            escape_xml(&rel.to_column),
        ));

        if let Some(kind) = rel.kind {
            // Direction pointing from each anchor out into the gap between boxes.
            let from_dir = if path.reversed { -1.0 } else { 1.0 };
            svg.push_str(&render_cardinality_marker(
                path.from_anchor(),
                from_dir,
                kind.from_many(),
                style,
            ));
            svg.push_str(&render_cardinality_marker(
                path.to_anchor(),
                -from_dir,
                kind.to_many(),
                style,
            ));
        }

        if let Some(label) = &rel.label {
            svg.push_str(&render_label(label, path.midpoint(), style));
        }
    }

    svg.push_str("</g>");
    svg
}

fn render_cardinality_marker(anchor: Point, dir: f32, many: bool, style: &DiagramStyle) -> String {
    let Point { x, y } = anchor;
    if many {
        // Crow's foot: three prongs meeting 12 units out, fanned at the box edge.
        let tip = x + dir * 12.0;
        format!(
            r#"<path d="M {tip:.2} {y:.2} L {x:.2} {top:.2} M {tip:.2} {y:.2} L {x:.2} {y:.2} M {tip:.2} {y:.2} L {x:.2} {bottom:.2}" fill="none" stroke="{stroke}" stroke-width="1.5" />"#,
            top = y - MARKER_BAR,
            bottom = y + MARKER_BAR,
            stroke = style.connector_stroke,
        )
    } else {
        let bar = |dist: f32| {
            format!(
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="1.5" />"#,
                x + dir * dist,
                y - MARKER_BAR,
                x + dir * dist,
                y + MARKER_BAR,
                style.connector_stroke
            )
        };
        format!("{}{}", bar(8.0), bar(13.0))
    }
}

fn render_label(label: &str, at: Point, style: &DiagramStyle) -> String {
    let font_size = style.font_size * 0.8;
    let label_w = label.chars().count() as f32 * font_size * 0.6 + 10.0;
    let label_h = font_size + 4.0;
    format!(
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="2" fill="{}" /><text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}" fill="{}" text-anchor="middle">{}</text>"#,
        at.x - label_w / 2.0,
        at.y - label_h / 2.0,
        label_w,
        label_h,
        style.background,
        at.x,
        at.y + font_size * 0.35,
        style.font_family,
        font_size,
        style.label_text,
        escape_xml(label)
    )
}

fn render_entity<P: LayoutProvider + ?Sized>(
    entity: &EntityBox,
    rect: &Rect,
    provider: &P,
    style: &DiagramStyle,
) -> String {
    let mut svg = format!(
        r#"<g class="entity" data-entity="{}">"#,
        escape_xml(&entity.name)
    );

    svg.push_str(&format!(
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="4" fill="{}" stroke="{}" stroke-width="1.5" />"#,
        rect.x, rect.y, rect.width, rect.height, style.box_fill, style.box_stroke
    ));

    let header_bottom = entity
        .columns
        .first()
        .and_then(|c| provider.column_rect(&entity.name, c))
        .map(|r| r.y)
        .unwrap_or(rect.bottom());
    let header_h = (header_bottom - rect.y).max(0.0);

    svg.push_str(&format!(
        r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="4" fill="{}" />"#,
        rect.x, rect.y, rect.width, header_h, style.header_fill
    ));
    svg.push_str(&format!(
        r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}" fill="{}" text-anchor="middle" font-weight="bold">{}</text>"#,
        rect.center_x(),
        rect.y + header_h / 2.0 + style.font_size * 0.35,
        style.font_family,
        style.font_size,
        style.header_text,
        escape_xml(&entity.name)
    ));

    let column_font = style.font_size * 0.9;
    for (idx, column) in entity.columns.iter().enumerate() {
        let Some(row) = provider.column_rect(&entity.name, column) else {
            continue;
        };
        if idx > 0 {
            svg.push_str(&format!(
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="0.5" />"#,
                row.x,
                row.y,
                row.right(),
                row.y,
                style.box_stroke
            ));
        }

        let baseline = row.center_y() + column_font * 0.35;
        if entity.is_primary(column) {
            svg.push_str(&format!(
                r#"<text x="{:.2}" y="{:.2}" font-family="monospace" font-size="{:.1}" fill="{}" font-weight="bold"><tspan fill="{}">PK</tspan> {}</text>"#,
                row.x + 10.0,
                baseline,
                column_font,
                style.column_text,
                style.key_text,
                escape_xml(column)
            ));
        } else {
            svg.push_str(&format!(
                r#"<text x="{:.2}" y="{:.2}" font-family="monospace" font-size="{:.1}" fill="{}">{}</text>"#,
                row.x + 10.0,
                baseline,
                column_font,
                style.column_text,
                escape_xml(column)
            ));
        }
    }

    svg.push_str("</g>");
    svg
}

/// Returns the legend markup with its width and height.
fn render_legend<T: TextMeasure>(
    entries: &[LegendEntry],
    drawn: &HashSet<usize>,
    top: f32,
    style: &DiagramStyle,
    measure: &mut T,
) -> (String, f32, f32) {
    let font_size = style.font_size * 0.9;
    let line_h = font_size * LEGEND_LINE_HEIGHT;
    let left = 8.0;

    let mut svg = String::from(r#"<g class="legend">"#);
    let mut width: f32 = 0.0;
    let mut y = top + line_h;

    for entry in entries {
        let line = entry.line();
        let fill = if drawn.contains(&entry.relationship) {
            &style.legend_text
        } else {
            &style.muted_text
        };
        svg.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.1}" fill="{}">{}</text>"#,
            left,
            y,
            style.font_family,
            font_size,
            fill,
            escape_xml(&line)
        ));
        width = width.max(left * 2.0 + measure.measure_text(&line, font_size, false, false).0);
        y += line_h;
    }
    svg.push_str("</g>");

    let height = entries.len() as f32 * line_h + line_h / 2.0;
    (svg, width, height)
}
