//! Integration tests for the glyphflow layout pipeline.
//!
//! These tests drive the full path from a content tree (built in Rust or
//! parsed from JSON) to positioned characters. They verify:
//! - JSON deserialization and error hints
//! - Explicit positioning, textLength and anchoring
//! - Wrapping against inline-size and inside shapes
//! - Text paths, decorations and cursor positions

use glyphflow::error::LayoutError;
use glyphflow::font::{FixedMetrics, FontRegistry};
use glyphflow::layout::{DecorationKind, TextLayout};
use glyphflow::model::*;
use glyphflow::style::*;

// ─── Helpers ────────────────────────────────────────────────────

fn sized(font_size: f64) -> Style {
    Style {
        font_size: Some(font_size),
        ..Default::default()
    }
}

fn make_text(content: &str, font_size: f64) -> TextContent {
    TextContent::text(content, sized(font_size))
}

fn make_doc(root: TextContent) -> TextDocument {
    TextDocument {
        root,
        ..Default::default()
    }
}

fn layout_doc(doc: &TextDocument) -> TextLayout {
    glyphflow::layout(doc, &FixedMetrics::new())
}

fn xs(layout: &TextLayout) -> Vec<f64> {
    layout.chars.iter().map(|c| c.final_position.x).collect()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// ─── Basic Pipeline Tests ───────────────────────────────────────

#[test]
fn test_empty_document() {
    let layout = layout_doc(&make_doc(TextContent::default()));
    assert!(layout.chars.is_empty());
    assert!(layout.cursor_positions.is_empty());
}

#[test]
fn test_single_line_advances() {
    let layout = layout_doc(&make_doc(make_text("Hello", 12.0)));
    assert_eq!(layout.chars.len(), 5);
    assert_eq!(layout.lines.len(), 1);
    assert_eq!(layout.plain_text, "Hello");
    for (i, x) in xs(&layout).into_iter().enumerate() {
        assert!(close(x, 12.0 * i as f64), "char {i} at {x}");
    }
}

#[test]
fn test_collapsed_space_is_not_addressable() {
    let layout = layout_doc(&make_doc(make_text("a  b", 10.0)));
    assert!(!layout.chars[2].addressable);
    assert!(close(layout.chars[3].final_position.x, 20.0));
}

#[test]
fn test_vertical_text_runs_down() {
    let style = Style {
        writing_mode: Some(WritingMode::VerticalRl),
        ..sized(10.0)
    };
    let layout = layout_doc(&make_doc(TextContent::text("ab", style)));
    let (a, b) = (&layout.chars[0], &layout.chars[1]);
    assert!(close(a.final_position.x, b.final_position.x));
    assert!(b.final_position.y > a.final_position.y);
}

#[test]
fn test_letter_spacing_widens_advance() {
    let style = Style {
        letter_spacing: Some(5.0),
        ..sized(10.0)
    };
    let layout = layout_doc(&make_doc(TextContent::text("ab", style)));
    assert!(close(layout.chars[1].final_position.x, 15.0));
}

// ─── SVG 1.1 Positioning Tests ──────────────────────────────────

#[test]
fn test_absolute_and_relative_positions() {
    let content = TextContent {
        x: vec![10.0],
        y: vec![20.0],
        dx: vec![0.0, 3.0],
        ..make_text("abc", 10.0)
    };
    let layout = layout_doc(&make_doc(content));
    assert_eq!(xs(&layout), vec![10.0, 23.0, 33.0]);
    assert!(layout.chars.iter().all(|c| close(c.final_position.y, 20.0)));
    assert_eq!(
        layout.start_position,
        glyphflow::geometry::Point::new(10.0, 20.0)
    );
}

#[test]
fn test_nested_x_lists_override_parent() {
    let child = TextContent {
        x: vec![100.0],
        ..TextContent::text("cd", Style::default())
    };
    let root = TextContent {
        x: vec![0.0],
        ..TextContent::span(
            sized(10.0),
            vec![TextContent::text("ab", Style::default()), child],
        )
    };
    let layout = layout_doc(&make_doc(root));
    assert_eq!(xs(&layout), vec![0.0, 10.0, 100.0, 110.0]);
    assert!(layout.chars[2].anchored_chunk);
}

#[test]
fn test_text_length_squeezes() {
    let style = Style {
        text_length: Some(20.0),
        ..sized(10.0)
    };
    let layout = layout_doc(&make_doc(TextContent::text("abc", style)));
    let last = &layout.chars[2];
    assert!(close(last.final_position.x + last.advance.x, 20.0));
}

#[test]
fn test_anchor_middle_per_chunk() {
    let content = TextContent {
        x: vec![50.0, 50.0],
        style: Style {
            text_anchor: Some(TextAnchor::Middle),
            ..sized(10.0)
        },
        text: Some("ab".into()),
        ..Default::default()
    };
    let layout = layout_doc(&make_doc(content));
    // Each character is its own chunk centered on x = 50.
    assert!(close(layout.chars[0].final_position.x, 45.0));
    assert!(close(layout.chars[1].final_position.x, 45.0));
}

// ─── Wrapping Tests ─────────────────────────────────────────────

#[test]
fn test_inline_size_wraps() {
    let style = Style {
        inline_size: Some(45.0),
        ..sized(10.0)
    };
    let layout = layout_doc(&make_doc(TextContent::text("aaa bbb ccc", style)));
    assert_eq!(layout.lines.len(), 3);
    for c in layout.visible_chars() {
        assert!(c.final_position.x + c.advance.x <= 45.0 + 1e-6);
    }
}

#[test]
fn test_text_in_shape_stays_inside() {
    let mut doc = make_doc(make_text("aa bb cc dd", 10.0));
    doc.shapes_inside = vec!["M 0 0 H 50 V 100 H 0 Z".into()];
    let layout = layout_doc(&doc);
    assert!(layout.lines.len() >= 2);
    for c in layout.visible_chars() {
        let p = c.final_position;
        assert!(p.x >= -1e-6 && p.x + c.advance.x <= 50.0 + 1e-6, "{p:?}");
        assert!(p.y > 0.0 && p.y <= 100.0, "{p:?}");
    }
}

#[test]
fn test_shape_subtract_splits_lines() {
    let mut doc = make_doc(make_text("aa bb cc dd ee ff", 10.0));
    doc.shapes_inside = vec!["M 0 0 H 100 V 100 H 0 Z".into()];
    doc.shapes_subtract = vec!["M 40 0 H 60 V 100 H 40 Z".into()];
    let layout = layout_doc(&doc);
    for c in layout.visible_chars() {
        let (x0, x1) = (c.final_position.x, c.final_position.x + c.advance.x);
        assert!(x1 <= 40.0 + 1e-6 || x0 >= 60.0 - 1e-6, "{x0}..{x1}");
    }
}

// ─── Text Path Tests ────────────────────────────────────────────

#[test]
fn test_text_path_from_json() {
    let json = r##"{
        "root": {
            "style": { "fontSize": 10 },
            "children": [
                { "text": "ab", "textPath": { "href": "curve", "startOffset": { "Length": 20 } } }
            ]
        },
        "paths": { "curve": "M 0 100 L 200 100" }
    }"##;
    let layout = glyphflow::layout_json(json).unwrap();
    assert!(close(layout.chars[0].final_position.x, 20.0));
    assert!(close(layout.chars[0].final_position.y, 100.0));
    assert!(close(layout.chars[1].final_position.x, 30.0));
}

#[test]
fn test_missing_path_reference_leaves_text_in_place() {
    let child = TextContent {
        text_path: Some(TextPathRef {
            href: Some("nowhere".into()),
            ..Default::default()
        }),
        ..TextContent::text("ab", Style::default())
    };
    let layout = layout_doc(&make_doc(TextContent::span(sized(10.0), vec![child])));
    assert_eq!(xs(&layout), vec![0.0, 10.0]);
    assert!(layout.chars.iter().all(|c| !c.hidden));
}

// ─── Decoration & Cursor Tests ──────────────────────────────────

#[test]
fn test_underline_on_named_node() {
    let child = TextContent {
        id: Some("u".into()),
        style: Style {
            text_decoration_line: Some(TextDecorationLine {
                underline: true,
                ..Default::default()
            }),
            ..Default::default()
        },
        text: Some("abc".into()),
        ..Default::default()
    };
    let layout = layout_doc(&make_doc(TextContent::span(sized(10.0), vec![child])));
    let node = layout.node_by_id("u").unwrap();
    let underline = node.decorations.get(&DecorationKind::Underline).unwrap();
    let bounds = kurbo::Shape::bounding_box(underline);
    assert!(close(bounds.x0, 0.0));
    assert!(close(bounds.x1, 30.0));
    assert!(bounds.y0 > 0.0, "underline sits below the baseline");
    assert!(!node.decorations.contains_key(&DecorationKind::Overline));
}

#[test]
fn test_cursor_positions_cover_plain_text() {
    let layout = layout_doc(&make_doc(make_text("abc de", 10.0)));
    let last = layout.cursor_positions.last().unwrap();
    assert_eq!(last.index, layout.plain_text.chars().count());
    assert_eq!(
        layout.logical_to_visual_cursor.len(),
        layout.cursor_positions.len()
    );
}

#[test]
fn test_rtl_cursor_starts_on_the_right() {
    let style = Style {
        direction: Some(Direction::Rtl),
        ..sized(10.0)
    };
    let layout = layout_doc(&make_doc(TextContent::text("\u{5D0}\u{5D1}", style)));
    let first = layout.cursor_positions[0];
    let last = *layout.cursor_positions.last().unwrap();
    assert!(first.synthetic);
    // Visual order follows the paragraph direction, starting on the right.
    assert_eq!(layout.logical_to_visual_cursor[&0], 0);
    let start = first.position(&layout.chars).unwrap();
    let end = last.position(&layout.chars).unwrap();
    assert!(start.x > end.x, "{start:?} {end:?}");
}

// ─── JSON Deserialization Tests ─────────────────────────────────

#[test]
fn test_minimal_json() {
    let layout = glyphflow::layout_json(r#"{ "root": { "text": "Hi" } }"#).unwrap();
    assert_eq!(layout.chars.len(), 2);
}

#[test]
fn test_camel_case_deserialization() {
    let json = r#"{
        "root": {
            "text": "abc",
            "style": {
                "fontSize": 20,
                "textAnchor": "End",
                "whiteSpace": "Preserve",
                "textDecorationLine": { "lineThrough": true }
            }
        },
        "config": { "pathTolerance": 0.5 }
    }"#;
    let doc: TextDocument = serde_json::from_str(json).unwrap();
    assert_eq!(doc.root.style.font_size, Some(20.0));
    assert_eq!(doc.root.style.text_anchor, Some(TextAnchor::End));
    assert_eq!(doc.config.path_tolerance, 0.5);
    assert_eq!(doc.config.resolution, 72.0);
    let layout = glyphflow::layout(&doc, &FixedMetrics::new());
    assert!(close(layout.chars[0].final_position.x, -60.0));
}

#[test]
fn test_bad_json_has_hint() {
    let err = glyphflow::layout_json("{ \"root\": ").unwrap_err();
    assert!(matches!(err, LayoutError::Parse { .. }));
    assert!(err.to_string().contains("Hint"));
}

#[test]
fn test_undecodable_font_is_an_error() {
    let sources = vec![FontSource {
        family: "Broken".into(),
        src: "data:font/ttf;base64,AAAA".into(),
        weight: 400,
        italic: false,
    }];
    let err = FontRegistry::from_sources(&sources).err().unwrap();
    assert!(matches!(err, LayoutError::Font(_)));
}
