use erlines::diagram::{Diagram, EntityBox, Relationship};
use erlines::geometry::{ConnectorConfig, EndpointRects, Rect, Size, connector_between};
use erlines::legend::legend;
use erlines::measure::{FixedLayout, UnresolvedPolicy, compute_connectors, measure};
use proptest::prelude::*;

const HEADER: f32 = 32.0;

fn endpoint_strategy() -> impl Strategy<Value = EndpointRects> {
    (
        -500.0f32..1500.0,
        -500.0f32..1500.0,
        0.0f32..300.0,
        1usize..8,
        0usize..8,
    )
        .prop_map(|(x, y, width, rows, pick)| {
            let row_h = 24.0;
            let entity = Rect::new(x, y, width, HEADER + rows as f32 * row_h);
            let row = pick % rows;
            EndpointRects {
                column: Rect::new(x, y + HEADER + row as f32 * row_h, width, row_h),
                entity,
            }
        })
}

/// Two boxes with a handful of columns and relationships, some pointing at
/// boxes or columns that do not exist.
fn diagram_strategy() -> impl Strategy<Value = Diagram> {
    let refs = prop::collection::vec((0usize..3, 0usize..4, 0usize..3, 0usize..4), 0..10);
    refs.prop_map(|refs| {
        let entities = vec![
            EntityBox::new("a", ["c0", "c1", "c2"]),
            EntityBox::new("b", ["c0", "c1", "c2"]),
        ];
        let name = |i: usize| ["a", "b", "ghost"][i].to_string();
        let relationships = refs
            .into_iter()
            .map(|(fb, fc, tb, tc)| {
                Relationship::new(name(fb), format!("c{}", fc), name(tb), format!("c{}", tc))
            })
            .collect();
        Diagram::new(entities, relationships)
    })
}

fn two_box_layout(diagram: &Diagram, a_x: f32, b_x: f32) -> FixedLayout {
    FixedLayout::new(Size::new(1200.0, 400.0))
        .with_entity(&diagram.entities[0], Rect::new(a_x, 20.0, 150.0, 104.0), HEADER)
        .with_entity(&diagram.entities[1], Rect::new(b_x, 60.0, 150.0, 104.0), HEADER)
}

proptest! {
    #[test]
    fn curve_starts_and_ends_on_anchors(from in endpoint_strategy(), to in endpoint_strategy()) {
        let path = connector_between(0, &from, &to, &ConnectorConfig::default());

        prop_assert_eq!(path.point_at(0.0), path.start);
        prop_assert_eq!(path.point_at(1.0), path.end);
        prop_assert_eq!(path.from_anchor().y, from.column.center_y());
        prop_assert_eq!(path.to_anchor().y, to.column.center_y());
    }

    #[test]
    fn curve_stays_between_anchor_levels(from in endpoint_strategy(), to in endpoint_strategy()) {
        let path = connector_between(0, &from, &to, &ConnectorConfig::default());
        let lo = path.start.y.min(path.end.y) - 1e-2;
        let hi = path.start.y.max(path.end.y) + 1e-2;

        for step in 0..=20 {
            let p = path.point_at(step as f32 / 20.0);
            prop_assert!(p.y >= lo && p.y <= hi, "y {} outside [{}, {}]", p.y, lo, hi);
            prop_assert!(p.x.is_finite());
        }
    }

    #[test]
    fn swapping_sides_keeps_column_identity(from in endpoint_strategy(), to in endpoint_strategy()) {
        let config = ConnectorConfig::default();
        let forward = connector_between(7, &from, &to, &config);
        let backward = connector_between(7, &to, &from, &config);

        prop_assert_eq!(forward.relationship, backward.relationship);
        prop_assert_eq!(forward.from_anchor().y, from.column.center_y());
        prop_assert_eq!(backward.from_anchor().y, to.column.center_y());
    }

    #[test]
    fn legend_is_lossless(diagram in diagram_strategy()) {
        let entries = legend(&diagram);
        prop_assert_eq!(entries.len(), diagram.relationships.len());
        for (idx, entry) in entries.iter().enumerate() {
            prop_assert_eq!(entry.relationship, idx);
        }
    }

    #[test]
    fn curve_count_matches_resolved_relationships(diagram in diagram_strategy()) {
        let layout = two_box_layout(&diagram, 20.0, 600.0);
        let resolved = measure(&layout, &diagram, UnresolvedPolicy::SkipUnresolved)
            .iter()
            .filter(|m| m.is_resolved())
            .count();
        let paths = compute_connectors(
            &layout,
            &diagram,
            UnresolvedPolicy::SkipUnresolved,
            &ConnectorConfig::default(),
        );

        prop_assert_eq!(paths.len(), resolved);
        prop_assert_eq!(resolved, diagram.relationships.len() - diagram.unresolved().len());
    }

    #[test]
    fn recompute_is_idempotent(diagram in diagram_strategy()) {
        let layout = two_box_layout(&diagram, 20.0, 600.0);
        let config = ConnectorConfig::default();
        let first = compute_connectors(&layout, &diagram, UnresolvedPolicy::SkipUnresolved, &config);
        let second = compute_connectors(&layout, &diagram, UnresolvedPolicy::SkipUnresolved, &config);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn moving_boxes_changes_sides_not_columns(diagram in diagram_strategy()) {
        let config = ConnectorConfig::default();
        let mut layout = two_box_layout(&diagram, 20.0, 600.0);
        let before = compute_connectors(&layout, &diagram, UnresolvedPolicy::SkipUnresolved, &config);

        layout.move_box("a", 900.0, 0.0);
        layout.move_box("b", -580.0, 0.0);
        let after = compute_connectors(&layout, &diagram, UnresolvedPolicy::SkipUnresolved, &config);

        prop_assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            prop_assert_eq!(b.relationship, a.relationship);
            prop_assert_eq!(b.from_anchor().y, a.from_anchor().y);
            prop_assert_eq!(b.to_anchor().y, a.to_anchor().y);
        }
    }
}
