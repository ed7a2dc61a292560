//! Declarative scene description produced by the chart builders.
//!
//! Builders are pure: (series, viewport, zoom) in, `Scene` out. Only
//! [`crate::chart::svg`] turns a scene into markup.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: String,
        stroke_width: f64,
        dash: Option<String>,
        class: Option<String>,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: String,
        stroke: Option<String>,
        opacity: Option<f64>,
        class: Option<String>,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        fill: String,
    },
    Path {
        d: String,
        stroke: String,
        stroke_width: f64,
        class: Option<String>,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        anchor: TextAnchor,
        font_size: f64,
        rotate: Option<f64>,
        class: Option<String>,
    },
    Group {
        id: Option<String>,
        class: Option<String>,
        translate: Option<(f64, f64)>,
        clip_path: Option<String>,
        children: Vec<Shape>,
    },
}

impl Shape {
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str) -> Self {
        Self::Line {
            x1,
            y1,
            x2,
            y2,
            stroke: stroke.to_string(),
            stroke_width: 1.0,
            dash: None,
            class: None,
        }
    }

    pub fn rect(x: f64, y: f64, width: f64, height: f64, fill: &str) -> Self {
        Self::Rect {
            x,
            y,
            width,
            height,
            fill: fill.to_string(),
            stroke: None,
            opacity: None,
            class: None,
        }
    }

    pub fn text(x: f64, y: f64, content: impl Into<String>, anchor: TextAnchor) -> Self {
        Self::Text {
            x,
            y,
            content: content.into(),
            anchor,
            font_size: 12.0,
            rotate: None,
            class: None,
        }
    }

    pub fn group(class: &str, children: Vec<Shape>) -> Self {
        Self::Group {
            id: None,
            class: Some(class.to_string()),
            translate: None,
            clip_path: None,
            children,
        }
    }

    /// Set the `class` of a shape that has one; no-op otherwise.
    pub fn with_class(mut self, name: &str) -> Self {
        match &mut self {
            Self::Line { class, .. }
            | Self::Rect { class, .. }
            | Self::Path { class, .. }
            | Self::Text { class, .. }
            | Self::Group { class, .. } => *class = Some(name.to_string()),
            Self::Circle { .. } => {}
        }
        self
    }

    pub fn class(&self) -> Option<&str> {
        match self {
            Self::Line { class, .. }
            | Self::Rect { class, .. }
            | Self::Path { class, .. }
            | Self::Text { class, .. }
            | Self::Group { class, .. } => class.as_deref(),
            Self::Circle { .. } => None,
        }
    }

    pub fn children(&self) -> &[Shape] {
        match self {
            Self::Group { children, .. } => children,
            _ => &[],
        }
    }
}

/// A clip rectangle declared in the scene's `<defs>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipRect {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub clips: Vec<ClipRect>,
    pub shapes: Vec<Shape>,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            clips: Vec::new(),
            shapes: Vec::new(),
        }
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Depth-first search for every shape carrying `class`.
    pub fn find_by_class(&self, class: &str) -> Vec<&Shape> {
        fn walk<'a>(shapes: &'a [Shape], class: &str, out: &mut Vec<&'a Shape>) {
            for s in shapes {
                if s.class() == Some(class) {
                    out.push(s);
                }
                walk(s.children(), class, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.shapes, class, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_by_class_walks_nested_groups() {
        let mut scene = Scene::new(100.0, 100.0);
        scene.push(Shape::group(
            "outer",
            vec![
                Shape::group("candle-group", vec![Shape::line(0.0, 0.0, 1.0, 1.0, "red").with_class("wick")]),
                Shape::group("candle-group", vec![]),
            ],
        ));
        assert_eq!(scene.find_by_class("candle-group").len(), 2);
        assert_eq!(scene.find_by_class("wick").len(), 1);
        assert!(scene.find_by_class("missing").is_empty());
    }
}
