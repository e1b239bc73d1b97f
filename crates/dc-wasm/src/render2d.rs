//! Canvas2D renderer.
//!
//! Draws the diagram (edges, temp line, nodes) under the canvas transform,
//! then the annotation overlay in container-local coordinates on top.

use dc_core::{Container, DrawingObject, GraphState, Node, ObjectId, Point, Rect, Shape, Size, is_visible};
use dc_render::hit::{HANDLE_RADIUS, handle_center, node_bounds};
use dc_render::svg::{ARROW_HEAD_LENGTH, arrow_head};
use web_sys::CanvasRenderingContext2d;

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub node_fill: &'static str,
    pub node_stroke: &'static str,
    pub node_text: &'static str,
    pub node_muted: &'static str,
    pub edge: &'static str,
    pub accent: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            grid: "rgba(0, 0, 0, 0.05)",
            node_fill: "#FFFFFF",
            node_stroke: "#D1D1D6",
            node_text: "#1D1D1F",
            node_muted: "#86868B",
            edge: "#6B7080",
            accent: "#4FC3F7",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#1C1C1E",
            grid: "rgba(255, 255, 255, 0.04)",
            node_fill: "#2C2C2E",
            node_stroke: "#48484A",
            node_text: "#F5F5F7",
            node_muted: "#98989D",
            edge: "#8E8E93",
            accent: "#4FC3F7",
        }
    }
}

/// Render the whole canvas: diagram layer, then the overlay.
pub fn render_scene(
    ctx: &CanvasRenderingContext2d,
    state: &GraphState,
    objects: &[DrawingObject],
    overlay_selection: Option<ObjectId>,
    width: f64,
    height: f64,
    theme: &CanvasTheme,
) {
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, width, height);
    draw_grid(ctx, width, height, theme);

    let t = state.canvas_transform;
    ctx.save();
    let _ = ctx.set_transform(t.scale, 0.0, 0.0, t.scale, t.translate_x, t.translate_y);
    draw_edges(ctx, state, theme);
    if let Some(line) = state.temp_line {
        draw_temp_line(ctx, Point::new(line.x1, line.y1), Point::new(line.x2, line.y2), theme);
    }
    for node in visible_nodes(state, Size::new(width, height)) {
        let selected = state.selected_node == Some(node.id);
        let dragging = state.dragging_node == Some(node.id);
        draw_node(ctx, node, selected || dragging, theme);
    }
    ctx.restore();

    for obj in objects {
        draw_object(ctx, obj);
    }
    if let Some(obj) = overlay_selection.and_then(|id| objects.iter().find(|o| o.id == id)) {
        draw_selection_box(ctx, obj.bounds(), theme);
    }
}

/// Nodes that overlap a `size` viewport under the current transform.
pub fn visible_nodes(state: &GraphState, size: Size) -> impl Iterator<Item = &Node> {
    let t = state.canvas_transform;
    let container = Container::new(Point::ORIGIN, size);
    state.nodes.iter().filter(move |node| {
        let b = node_bounds(node);
        // Half the diagonal plus the handle reaches every painted pixel.
        let reach = (b.width().hypot(b.height()) / 2.0 + HANDLE_RADIUS) * t.scale;
        is_visible(b.center(), &t, &container, reach)
    })
}

fn draw_grid(ctx: &CanvasRenderingContext2d, width: f64, height: f64, theme: &CanvasTheme) {
    ctx.set_fill_style_str(theme.grid);
    let spacing = 20.0;
    let mut x = 0.0;
    while x < width {
        let mut y = 0.0;
        while y < height {
            ctx.fill_rect(x, y, 1.0, 1.0);
            y += spacing;
        }
        x += spacing;
    }
}

// ─── Diagram layer ───────────────────────────────────────────────────────

fn draw_node(ctx: &CanvasRenderingContext2d, node: &Node, highlighted: bool, theme: &CanvasTheme) {
    let b = node_bounds(node);
    ctx.save();
    rounded_rect_path(ctx, b, 10.0);
    ctx.set_fill_style_str(theme.node_fill);
    ctx.fill();
    ctx.set_stroke_style_str(if highlighted { theme.accent } else { theme.node_stroke });
    ctx.set_line_width(if highlighted { 2.0 } else { 1.0 });
    ctx.stroke();

    ctx.set_text_baseline("middle");
    ctx.set_text_align("left");
    ctx.set_font("11px Inter, system-ui, sans-serif");
    ctx.set_fill_style_str(theme.node_muted);
    let _ = ctx.fill_text(&node.icon, b.x0 + 12.0, b.y0 + 18.0);
    ctx.set_font("600 13px Inter, system-ui, sans-serif");
    ctx.set_fill_style_str(theme.node_text);
    let _ = ctx.fill_text_with_max_width(&node.label, b.x0 + 12.0, b.y0 + 37.0, b.width() - 24.0);

    let h = handle_center(node);
    ctx.begin_path();
    let _ = ctx.arc(h.x, h.y, HANDLE_RADIUS, 0.0, std::f64::consts::TAU);
    ctx.set_fill_style_str(theme.node_fill);
    ctx.fill();
    ctx.set_stroke_style_str(theme.accent);
    ctx.set_line_width(1.5);
    ctx.stroke();
    ctx.restore();
}

fn draw_edges(ctx: &CanvasRenderingContext2d, state: &GraphState, theme: &CanvasTheme) {
    for edge in &state.edges {
        let (Some(from), Some(to)) = (state.node(edge.source), state.node(edge.target)) else {
            continue;
        };
        let (a, z) = (handle_center(from), node_bounds(to).center());
        let selected = state.selected_edge == Some(edge.id);
        let color = if selected { theme.accent } else { theme.edge };

        ctx.save();
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(if selected { 2.5 } else { 1.5 });
        ctx.begin_path();
        ctx.move_to(a.x, a.y);
        ctx.line_to(z.x, z.y);
        ctx.stroke();
        draw_arrowhead(ctx, a, z, color);
        ctx.restore();
    }
}

fn draw_temp_line(ctx: &CanvasRenderingContext2d, a: Point, z: Point, theme: &CanvasTheme) {
    ctx.save();
    ctx.set_stroke_style_str(theme.accent);
    ctx.set_line_width(1.5);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &wasm_bindgen::JsValue::from_f64(6.0),
        &wasm_bindgen::JsValue::from_f64(4.0),
    ));
    ctx.begin_path();
    ctx.move_to(a.x, a.y);
    ctx.line_to(z.x, z.y);
    ctx.stroke();
    ctx.restore();
}

fn draw_arrowhead(ctx: &CanvasRenderingContext2d, tail: Point, tip: Point, color: &str) {
    let Some((l, r)) = arrow_head(tail, tip, 10.0) else {
        return;
    };
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    ctx.move_to(tip.x, tip.y);
    ctx.line_to(l.x, l.y);
    ctx.line_to(r.x, r.y);
    ctx.close_path();
    ctx.fill();
}

// ─── Overlay ─────────────────────────────────────────────────────────────

fn draw_object(ctx: &CanvasRenderingContext2d, obj: &DrawingObject) {
    let stroke = obj.style.stroke.to_css();
    ctx.save();
    ctx.set_stroke_style_str(&stroke);
    ctx.set_line_width(obj.style.stroke_width);
    ctx.set_line_cap("round");
    ctx.set_line_join("round");
    match &obj.shape {
        Shape::Rectangle { .. } => {
            let b = obj.bounds();
            if let Some(fill) = obj.style.fill {
                ctx.set_fill_style_str(&fill.to_css());
                ctx.fill_rect(b.x0, b.y0, b.width(), b.height());
            }
            ctx.stroke_rect(b.x0, b.y0, b.width(), b.height());
        }
        Shape::Circle { .. } => {
            let b = obj.bounds();
            let c = b.center();
            ctx.begin_path();
            let _ = ctx.ellipse(
                c.x,
                c.y,
                b.width() / 2.0,
                b.height() / 2.0,
                0.0,
                0.0,
                std::f64::consts::TAU,
            );
            if let Some(fill) = obj.style.fill {
                ctx.set_fill_style_str(&fill.to_css());
                ctx.fill();
            }
            ctx.stroke();
        }
        Shape::Line { end } => {
            stroke_polyline(ctx, &[obj.origin(), obj.to_world(*end)]);
        }
        Shape::Arrow { end } => {
            let (a, z) = (obj.origin(), obj.to_world(*end));
            stroke_polyline(ctx, &[a, z]);
            if let Some((l, r)) = arrow_head(a, z, ARROW_HEAD_LENGTH) {
                stroke_polyline(ctx, &[l, z, r]);
            }
        }
        Shape::Freehand { points } => {
            let world: Vec<Point> = points.iter().map(|p| obj.to_world(*p)).collect();
            stroke_polyline(ctx, &world);
        }
        Shape::Text { content, font_size } => {
            let size = font_size * obj.scale_y;
            let fill = obj.style.fill.unwrap_or(obj.style.stroke);
            ctx.set_fill_style_str(&fill.to_css());
            ctx.set_font(&format!("{size}px Inter, system-ui, sans-serif"));
            ctx.set_text_baseline("top");
            ctx.set_text_align("left");
            for (i, line) in content.lines().enumerate() {
                let _ = ctx.fill_text(line, obj.left, obj.top + i as f64 * size * 1.2);
            }
        }
    }
    ctx.restore();
}

fn stroke_polyline(ctx: &CanvasRenderingContext2d, points: &[Point]) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in rest {
        ctx.line_to(p.x, p.y);
    }
    ctx.stroke();
}

fn draw_selection_box(ctx: &CanvasRenderingContext2d, b: Rect, theme: &CanvasTheme) {
    let b = b.inflate(4.0, 4.0);
    ctx.save();
    ctx.set_stroke_style_str(theme.accent);
    ctx.set_line_width(1.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &wasm_bindgen::JsValue::from_f64(4.0),
        &wasm_bindgen::JsValue::from_f64(4.0),
    ));
    ctx.stroke_rect(b.x0, b.y0, b.width(), b.height());
    ctx.restore();
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, b: Rect, r: f64) {
    let (x, y, w, h) = (b.x0, b.y0, b.width(), b.height());
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}
