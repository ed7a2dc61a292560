// =============================================================================
// SVG adapter — the only place a Scene becomes markup
// =============================================================================

use std::fmt::Write;

use super::scene::{Scene, Shape, TextAnchor};

/// Escape text for HTML/SVG element content and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Compact number formatting: at most 2 decimals, no trailing zeros.
pub fn num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

pub fn render_svg(scene: &Scene) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(scene.width),
        h = num(scene.height),
    );
    if !scene.clips.is_empty() {
        out.push_str("<defs>");
        for clip in &scene.clips {
            let _ = write!(
                out,
                r#"<clipPath id="{}"><rect width="{}" height="{}"/></clipPath>"#,
                escape(&clip.id),
                num(clip.width),
                num(clip.height),
            );
        }
        out.push_str("</defs>");
    }
    for shape in &scene.shapes {
        write_shape(&mut out, shape);
    }
    out.push_str("</svg>");
    out
}

fn class_attr(class: &Option<String>) -> String {
    match class {
        Some(c) => format!(r#" class="{}""#, escape(c)),
        None => String::new(),
    }
}

fn write_shape(out: &mut String, shape: &Shape) {
    match shape {
        Shape::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
            stroke_width,
            dash,
            class,
        } => {
            let dash = dash
                .as_ref()
                .map(|d| format!(r#" stroke-dasharray="{}""#, escape(d)))
                .unwrap_or_default();
            let _ = write!(
                out,
                r#"<line{} x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"{}/>"#,
                class_attr(class),
                num(*x1),
                num(*y1),
                num(*x2),
                num(*y2),
                escape(stroke),
                num(*stroke_width),
                dash,
            );
        }
        Shape::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
            opacity,
            class,
        } => {
            let stroke = stroke
                .as_ref()
                .map(|s| format!(r#" stroke="{}" stroke-width="0.5""#, escape(s)))
                .unwrap_or_default();
            let opacity = opacity
                .map(|o| format!(r#" opacity="{}""#, num(o)))
                .unwrap_or_default();
            let _ = write!(
                out,
                r#"<rect{} x="{}" y="{}" width="{}" height="{}" fill="{}"{}{}/>"#,
                class_attr(class),
                num(*x),
                num(*y),
                num(width.max(0.0)),
                num(height.max(0.0)),
                escape(fill),
                stroke,
                opacity,
            );
        }
        Shape::Circle { cx, cy, r, fill } => {
            let _ = write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#,
                num(*cx),
                num(*cy),
                num(*r),
                escape(fill),
            );
        }
        Shape::Path {
            d,
            stroke,
            stroke_width,
            class,
        } => {
            let _ = write!(
                out,
                r#"<path{} d="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                class_attr(class),
                escape(d),
                escape(stroke),
                num(*stroke_width),
            );
        }
        Shape::Text {
            x,
            y,
            content,
            anchor,
            font_size,
            rotate,
            class,
        } => {
            let anchor = match anchor {
                TextAnchor::Start => "start",
                TextAnchor::Middle => "middle",
                TextAnchor::End => "end",
            };
            let transform = rotate
                .map(|deg| format!(r#" transform="rotate({})""#, num(deg)))
                .unwrap_or_default();
            let _ = write!(
                out,
                r#"<text{} x="{}" y="{}" text-anchor="{}" font-size="{}px"{}>{}</text>"#,
                class_attr(class),
                num(*x),
                num(*y),
                anchor,
                num(*font_size),
                transform,
                escape(content),
            );
        }
        Shape::Group {
            id,
            class,
            translate,
            clip_path,
            children,
        } => {
            out.push_str("<g");
            if let Some(id) = id {
                let _ = write!(out, r#" id="{}""#, escape(id));
            }
            out.push_str(&class_attr(class));
            if let Some((tx, ty)) = translate {
                let _ = write!(out, r#" transform="translate({},{})""#, num(*tx), num(*ty));
            }
            if let Some(clip) = clip_path {
                let _ = write!(out, r#" clip-path="url(#{})""#, escape(clip));
            }
            out.push('>');
            for child in children {
                write_shape(out, child);
            }
            out.push_str("</g>");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::scene::ClipRect;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<a & 'b'>"), "&lt;a &amp; &#39;b&#39;&gt;");
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(num(10.0), "10");
        assert_eq!(num(2.5), "2.5");
        assert_eq!(num(1.23456), "1.23");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num(f64::NAN), "0");
    }

    #[test]
    fn renders_one_root_with_defs_and_groups() {
        let mut scene = Scene::new(200.0, 100.0);
        scene.clips.push(ClipRect {
            id: "clip-kline".into(),
            width: 100.0,
            height: 50.0,
        });
        scene.push(Shape::Group {
            id: None,
            class: Some("body".into()),
            translate: Some((50.0, 20.0)),
            clip_path: Some("clip-kline".into()),
            children: vec![
                Shape::rect(0.0, 0.0, 10.0, -5.0, "green"),
                Shape::text(1.0, 2.0, "a<b", TextAnchor::Middle),
            ],
        });
        let svg = render_svg(&scene);
        assert_eq!(svg.matches("<svg").count(), 1);
        assert!(svg.contains(r#"<clipPath id="clip-kline">"#));
        assert!(svg.contains(r#"transform="translate(50,20)" clip-path="url(#clip-kline)""#));
        assert!(svg.contains(r#"height="0""#));
        assert!(svg.contains("a&lt;b"));
        assert!(svg.ends_with("</svg>"));
    }
}
