//! End-to-end tests driving the canvas through its public command API.

use svgcanvas::{
    Align, Bounds, Canvas2D, CanvasError, CanvasOptions, Document, GradientDirection,
    LineCap, LineJoin, MeasureError, MeasureRequest, NodeId, Overflow, Probe, Size, SvgCanvas, TextLayout,
    TextMeasurer, UrlConverter, VAlign,
};

/// Measurer that reports the same size for every label.
struct FixedMeasurer(Size);

impl TextMeasurer for FixedMeasurer {
    fn measure(&self, _probe: &Probe<'_>, _request: &MeasureRequest) -> Result<Size, MeasureError> {
        Ok(self.0)
    }

    fn bounding_box(&self, _doc: &Document, _node: NodeId) -> Result<Bounds, MeasureError> {
        Ok(Bounds::new(0.0, 0.0, self.0.width, self.0.height))
    }
}

/// Serialized children of the `<svg>` element, without `<defs>`.
fn output(canvas: &SvgCanvas) -> Vec<String> {
    let doc = canvas.document();
    doc.children(doc.root())
        .iter()
        .filter(|&&node| doc.tag(node) != Some("defs"))
        .map(|&node| doc.serialize_node(node).unwrap())
        .collect()
}

fn export() -> SvgCanvas {
    SvgCanvas::export(CanvasOptions::default())
}

// =============================================================================
// State
// =============================================================================

#[test]
fn restore_returns_to_saved_state() {
    let mut canvas = export();
    canvas.set_fill_color(Some("#123456"));
    canvas.translate(3.0, 4.0);
    let saved = canvas.state().clone();

    canvas.save();
    canvas.set_fill_color(Some("red"));
    canvas.set_stroke_width(5.0);
    canvas.scale(3.0);
    canvas.rotate(45.0, false, false, 0.0, 0.0);
    canvas.restore().unwrap();

    assert_eq!(canvas.state(), &saved);
}

#[test]
fn unbalanced_restore_is_an_error() {
    let mut canvas = export();
    assert!(matches!(canvas.restore(), Err(CanvasError::UnbalancedRestore)));
}

// =============================================================================
// Shapes and paths
// =============================================================================

#[test]
fn rect_maps_through_offset_and_scale() {
    let mut canvas = export();
    canvas.set_fill_color(Some("blue"));
    canvas.translate(5.0, 5.0);
    canvas.scale(2.0);
    let rect = canvas.rect(10.0, 10.0, 50.0, 20.0);
    canvas.fill(rect);
    insta::assert_snapshot!(
        output(&canvas).join(""),
        @r#"<rect x="30" y="30" width="100" height="40" fill="blue" stroke="none" pointer-events="none"/>"#
    );
}

#[test]
fn painting_an_empty_path_does_nothing() {
    let mut canvas = export();
    canvas.set_fill_color(Some("red"));
    canvas.set_stroke_color(Some("black"));
    let before = canvas.document().children(canvas.document().root()).len();
    let path = canvas.begin();
    canvas.fill_and_stroke(path);
    assert_eq!(canvas.document().children(canvas.document().root()).len(), before);
}

#[test]
fn path_commands_are_scaled_and_rounded() {
    let mut canvas = export();
    canvas.set_stroke_color(Some("#000000"));
    canvas.scale(1.5);
    let mut path = canvas.begin();
    canvas.move_to(&mut path, 1.0, 1.0);
    canvas.line_to(&mut path, 10.0, 1.0);
    canvas.quad_to(&mut path, 12.0, 1.0, 12.0, 3.0);
    canvas.curve_to(&mut path, 12.0, 6.0, 8.0, 8.0, 1.0, 8.0);
    canvas.close(&mut path);
    canvas.stroke(path);
    insta::assert_snapshot!(
        output(&canvas).join(""),
        @r##"<path d="M 1.5 1.5 L 15 1.5 Q 18 1.5 18 4.5 C 18 9 12 12 1.5 12 Z" fill="none" stroke="#000000" stroke-width="1.5" stroke-miterlimit="10" pointer-events="none"/>"##
    );
}

#[test]
fn arcs_become_cubic_segments() {
    let mut canvas = export();
    canvas.set_stroke_color(Some("black"));
    let mut path = canvas.begin();
    canvas.move_to(&mut path, 0.0, 0.0);
    canvas.arc_to(&mut path, 10.0, 10.0, 0.0, false, true, 20.0, 0.0);
    canvas.stroke(path);

    let doc = canvas.document();
    let node = doc.find_descendant(doc.root(), "path").unwrap();
    let d = doc.attr(node, "d").unwrap();
    assert!(d.starts_with("M 0 0 C "), "{d}");
    assert!(d.ends_with(" 20 0"), "{d}");
    assert_eq!(d.matches('C').count(), 2);
}

#[test]
fn shadow_is_inserted_before_the_node() {
    let mut plain = export();
    plain.set_fill_color(Some("#FF0000"));
    let rect = plain.rect(0.0, 0.0, 10.0, 10.0);
    plain.fill(rect);

    let mut shadowed = export();
    shadowed.set_fill_color(Some("#FF0000"));
    shadowed.set_shadow(true);
    let rect = shadowed.rect(0.0, 0.0, 10.0, 10.0);
    shadowed.fill(rect);

    let nodes = output(&shadowed);
    assert_eq!(nodes.len(), 2);
    assert_eq!(
        nodes[0],
        r#"<rect x="0" y="0" width="10" height="10" fill="gray" stroke="none" transform="translate(2,3)" opacity="1"/>"#
    );
    assert_eq!(nodes[1..], output(&plain)[..]);
}

#[test]
fn stroke_tolerance_adds_hit_area() {
    let mut canvas = SvgCanvas::export(CanvasOptions {
        stroke_tolerance: 4.0,
        ..CanvasOptions::default()
    });
    canvas.set_stroke_color(Some("black"));
    canvas.set_dashed(true, false);
    let mut path = canvas.begin();
    canvas.move_to(&mut path, 0.0, 0.0);
    canvas.line_to(&mut path, 10.0, 0.0);
    canvas.stroke(path);

    let nodes = output(&canvas);
    assert_eq!(
        nodes,
        [
            r#"<path d="M 0 0 L 10 0" fill="none" stroke="white" stroke-miterlimit="10" pointer-events="stroke" visibility="hidden" stroke-width="5"/>"#,
            r#"<path d="M 0 0 L 10 0" fill="none" stroke="black" stroke-miterlimit="10" stroke-dasharray="3 3" pointer-events="none"/>"#,
        ]
    );
}

#[test]
fn line_style_applies_to_paths_only() {
    let mut canvas = export();
    canvas.set_stroke_color(Some("black"));
    canvas.set_line_join(LineJoin::Round);
    canvas.set_line_cap(LineCap::Square);
    let rect = canvas.rect(0.0, 0.0, 10.0, 10.0);
    canvas.stroke(rect);
    let mut path = canvas.begin();
    canvas.move_to(&mut path, 0.0, 0.0);
    canvas.line_to(&mut path, 10.0, 0.0);
    canvas.stroke(path);

    assert_eq!(
        output(&canvas),
        [
            r#"<rect x="0" y="0" width="10" height="10" fill="none" stroke="black" pointer-events="none"/>"#,
            r#"<path d="M 0 0 L 10 0" fill="none" stroke="black" stroke-linejoin="round" stroke-linecap="square" stroke-miterlimit="10" pointer-events="none"/>"#,
        ]
    );
}

// =============================================================================
// Gradients and clips
// =============================================================================

#[test]
fn opposite_gradients_share_a_definition() {
    let mut canvas = SvgCanvas::live(CanvasOptions::default());
    canvas.set_gradient("#FFFFFF", "#000000", GradientDirection::South, 1.0, 1.0);
    let a = canvas.rect(0.0, 0.0, 10.0, 10.0);
    canvas.fill(a);
    canvas.set_gradient("#000000", "#FFFFFF", GradientDirection::North, 1.0, 1.0);
    let b = canvas.rect(20.0, 0.0, 10.0, 10.0);
    canvas.fill(b);

    let doc = canvas.document();
    let defs = doc.find_descendant(doc.root(), "defs").unwrap();
    assert_eq!(doc.children(defs).len(), 1);
    assert!(doc.get_element_by_id("mx-gradient-ffffff-1-000000-1-s").is_some());
    for node in output(&canvas) {
        assert!(node.contains(r#"fill="url(#mx-gradient-ffffff-1-000000-1-s)""#), "{node}");
    }
}

#[test]
fn opposite_horizontal_gradients_share_a_definition() {
    let mut canvas = export();
    canvas.set_gradient("#00FF00", "#0000FF", GradientDirection::East, 1.0, 0.5);
    let a = canvas.rect(0.0, 0.0, 10.0, 10.0);
    canvas.fill(a);
    canvas.set_gradient("#0000FF", "#00FF00", GradientDirection::West, 0.5, 1.0);
    let b = canvas.ellipse(20.0, 0.0, 10.0, 10.0);
    canvas.fill(b);

    let doc = canvas.document();
    let defs = doc.find_descendant(doc.root(), "defs").unwrap();
    assert_eq!(doc.children(defs).len(), 1);
    assert_eq!(canvas.session().gradient_count(), 1);
    let nodes = output(&canvas);
    assert_eq!(nodes.len(), 2);
    for node in nodes {
        assert!(node.contains(r#"fill="url(#id1)""#), "{node}");
    }
}

#[test]
fn clip_ids_get_collision_suffixes() {
    let mut canvas = export();
    let layout = TextLayout::new(10.0, 10.0, 20.0, 10.0).clip();
    canvas.text(&layout, "one");
    canvas.text(&layout, "two");
    let doc = canvas.document();
    assert!(doc.get_element_by_id("mx-clip-8-8-24-14").is_some());
    assert!(doc.get_element_by_id("mx-clip-8-8-24-14-1").is_some());
}

// =============================================================================
// Links and images
// =============================================================================

#[test]
fn links_restore_the_insertion_point() {
    let mut canvas = export();
    let root = canvas.current_root();
    canvas.set_link(Some("https://example.com/")).unwrap();
    assert_ne!(canvas.current_root(), root);
    canvas.set_link(None).unwrap();
    assert_eq!(canvas.current_root(), root);
    assert!(matches!(canvas.set_link(None), Err(CanvasError::UnbalancedLink)));
}

#[test]
fn image_sources_go_through_the_converter() {
    let mut canvas = export().with_converter(UrlConverter::new("http://example.com/app/index.html?x=1").unwrap());
    canvas.set_alpha(0.5);
    canvas.image(0.0, 0.0, 16.0, 16.0, "img/icon.png", true, false, false);
    canvas.image(0.0, 0.0, 16.0, 16.0, "/static/a.png", true, false, false);
    insta::assert_snapshot!(
        output(&canvas).join("\n"),
        @r#"
    <image x="0" y="0" width="16" height="16" xlink:href="http://example.com/app/img/icon.png" opacity="0.5" pointer-events="none"/>
    <image x="0" y="0" width="16" height="16" xlink:href="http://example.com/static/a.png" opacity="0.5" pointer-events="none"/>
    "#
    );
}

// =============================================================================
// Text
// =============================================================================

#[test]
fn rich_text_is_aligned_by_measured_size() {
    let mut canvas =
        SvgCanvas::live(CanvasOptions::default()).with_measurer(FixedMeasurer(Size::new(50.0, 22.0)));
    let layout = TextLayout::new(100.0, 100.0, 80.0, 40.0)
        .html()
        .align(Align::Center, VAlign::Bottom);
    canvas.text(&layout, "Hello");

    let nodes = output(&canvas);
    assert_eq!(nodes.len(), 1);
    assert_eq!(
        nodes[0],
        concat!(
            r#"<g transform="translate(75,80)">"#,
            r#"<foreignObject style="overflow:visible;" pointer-events="all" width="50" height="20">"#,
            r#"<div xmlns="http://www.w3.org/1999/xhtml" style="display:inline-block;font-size:11px;"#,
            r#"font-family:Arial,Helvetica;color:#000000;line-height:1.2;vertical-align:top;"#,
            r#"white-space:nowrap;text-align:center;">"#,
            r#"<div xmlns="http://www.w3.org/1999/xhtml" style="display:inline-block;text-align:inherit;"#,
            r#"text-decoration:inherit;">Hello</div></div></foreignObject></g>"#
        )
    );
}

#[test]
fn rich_text_alignments_apply_independently() {
    let cases = [
        (Align::Left, VAlign::Top, "translate(100,100)"),
        (Align::Center, VAlign::Top, "translate(75,100)"),
        (Align::Left, VAlign::Bottom, "translate(100,80)"),
        (Align::Right, VAlign::Middle, "translate(50,90)"),
    ];
    for (align, valign, expected) in cases {
        let mut canvas = SvgCanvas::live(CanvasOptions::default())
            .with_measurer(FixedMeasurer(Size::new(50.0, 22.0)));
        let layout = TextLayout::new(100.0, 100.0, 80.0, 40.0)
            .html()
            .align(align, valign);
        canvas.text(&layout, "Hello");
        let doc = canvas.document();
        let group = doc.find_descendant(doc.root(), "g").unwrap();
        assert_eq!(doc.attr(group, "transform"), Some(expected), "{align:?} {valign:?}");
    }
}

#[test]
fn rich_text_honours_scale_and_fill_overflow() {
    let mut canvas =
        SvgCanvas::live(CanvasOptions::default()).with_measurer(FixedMeasurer(Size::new(500.0, 500.0)));
    canvas.scale(2.0);
    let layout = TextLayout::new(10.0, 10.0, 40.0, 20.0)
        .html()
        .overflow(Overflow::Fill)
        .align(Align::Right, VAlign::Middle);
    canvas.text(&layout, "x");

    let doc = canvas.document();
    let group = doc.find_descendant(doc.root(), "g").unwrap();
    let fo = doc.first_child(group).unwrap();
    // The given box wins over the measured size
    assert_eq!(doc.attr(group, "transform"), Some("translate(-60,0)scale(2)"));
    assert_eq!(doc.attr(fo, "width"), Some("40"));
    assert_eq!(doc.attr(fo, "height"), Some("20"));
}

#[test]
fn plain_text_falls_back_without_foreign_content() {
    let mut canvas = SvgCanvas::export(CanvasOptions {
        fo_enabled: false,
        ..CanvasOptions::default()
    });
    canvas.text(&TextLayout::new(0.0, 0.0, 0.0, 0.0).html(), "label");
    let doc = canvas.document();
    assert!(doc.find_descendant(doc.root(), "foreignObject").is_none());
    let text = doc.find_descendant(doc.root(), "text").unwrap();
    assert_eq!(doc.text_content(text), "label");
}

#[test]
fn disabled_text_emits_nothing() {
    let mut canvas = SvgCanvas::export(CanvasOptions {
        text_enabled: false,
        ..CanvasOptions::default()
    });
    canvas.text(&TextLayout::new(0.0, 0.0, 10.0, 10.0), "hidden");
    assert!(output(&canvas).is_empty());
}

#[test]
fn whole_document_serializes() {
    let mut canvas = export();
    canvas.set_fill_color(Some("#dae8fc"));
    let shape = canvas.ellipse(0.0, 0.0, 20.0, 10.0);
    canvas.fill(shape);
    insta::assert_snapshot!(
        canvas.to_svg_string().unwrap(),
        @r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" version="1.1"><defs/><ellipse cx="10" cy="5" rx="10" ry="5" fill="#dae8fc" stroke="none" pointer-events="none"/></svg>"##
    );
}
