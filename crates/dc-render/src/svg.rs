//! Drawing objects → standalone SVG document.

use dc_core::{Color, DrawingObject, Shape};
use kurbo::{Point, Size, Vec2};
use std::fmt::Write;

/// Length of each arrow-head wing, in local units.
pub const ARROW_HEAD_LENGTH: f64 = 14.0;
/// Half-angle between the shaft and each wing.
pub const ARROW_HEAD_ANGLE: f64 = std::f64::consts::PI / 7.0;

fn paint(c: Option<Color>) -> String {
    match c {
        Some(c) if c.a > 0.0 => c.to_hex(),
        _ => "none".to_string(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// The two wing end points of an arrow head drawn at `tip`, pointing away from `tail`.
pub fn arrow_head(tail: Point, tip: Point, length: f64) -> Option<(Point, Point)> {
    let shaft: Vec2 = tip - tail;
    if shaft.hypot() <= f64::EPSILON {
        return None;
    }
    let back = -shaft.normalize() * length;
    let (sin, cos) = ARROW_HEAD_ANGLE.sin_cos();
    let rotate = |v: Vec2, s: f64| Vec2::new(v.x * cos - v.y * s, v.x * s + v.y * cos);
    Some((tip + rotate(back, sin), tip + rotate(back, -sin)))
}

/// Render every object into an SVG document sized to the canvas.
pub fn render_svg(objects: &[DrawingObject], size: Size, background: Option<Color>) -> String {
    let mut out = String::with_capacity(256 + objects.len() * 128);
    let (w, h) = (size.width, size.height);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    if let Some(bg) = background {
        let _ = writeln!(out, r#"  <rect width="100%" height="100%" fill="{}"/>"#, bg.to_hex());
    }
    for obj in objects {
        write_object(&mut out, obj);
    }
    out.push_str("</svg>\n");
    out
}

fn write_object(out: &mut String, obj: &DrawingObject) {
    let stroke = paint(Some(obj.style.stroke));
    let fill = paint(obj.style.fill);
    let sw = obj.style.stroke_width;
    let b = obj.bounds();
    match &obj.shape {
        Shape::Rectangle { .. } => {
            let _ = writeln!(
                out,
                r#"  <rect x="{}" y="{}" width="{}" height="{}" stroke="{stroke}" stroke-width="{sw}" fill="{fill}"/>"#,
                b.x0,
                b.y0,
                b.width(),
                b.height()
            );
        }
        Shape::Circle { .. } => {
            let c = b.center();
            let _ = writeln!(
                out,
                r#"  <ellipse cx="{}" cy="{}" rx="{}" ry="{}" stroke="{stroke}" stroke-width="{sw}" fill="{fill}"/>"#,
                c.x,
                c.y,
                b.width() / 2.0,
                b.height() / 2.0
            );
        }
        Shape::Line { end } => {
            let (a, z) = (obj.origin(), obj.to_world(*end));
            let _ = writeln!(
                out,
                r#"  <line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{stroke}" stroke-width="{sw}" stroke-linecap="round"/>"#,
                a.x, a.y, z.x, z.y
            );
        }
        Shape::Arrow { end } => {
            let (a, z) = (obj.origin(), obj.to_world(*end));
            let mut d = format!("M {} {} L {} {}", a.x, a.y, z.x, z.y);
            if let Some((l, r)) = arrow_head(a, z, ARROW_HEAD_LENGTH) {
                let _ = write!(d, " M {} {} L {} {} L {} {}", l.x, l.y, z.x, z.y, r.x, r.y);
            }
            let _ = writeln!(
                out,
                r#"  <path d="{d}" stroke="{stroke}" stroke-width="{sw}" fill="none" stroke-linecap="round" stroke-linejoin="round"/>"#
            );
        }
        Shape::Text { content, font_size } => {
            let size = font_size * obj.scale_y;
            let _ = writeln!(
                out,
                r#"  <text x="{}" y="{}" font-size="{size}" font-family="sans-serif" fill="{}">{}</text>"#,
                b.x0,
                b.y0 + size,
                paint(obj.style.fill.or(Some(obj.style.stroke))),
                escape(content)
            );
        }
        Shape::Freehand { points } => {
            if points.is_empty() {
                return;
            }
            let mut d = String::new();
            for (i, p) in points.iter().enumerate() {
                let w = obj.to_world(*p);
                let _ = write!(d, "{}{} {} ", if i == 0 { "M " } else { "L " }, w.x, w.y);
            }
            let _ = writeln!(
                out,
                r#"  <path d="{}" stroke="{stroke}" stroke-width="{sw}" fill="none" stroke-linecap="round" stroke-linejoin="round"/>"#,
                d.trim_end()
            );
        }
    }
}
