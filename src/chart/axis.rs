use super::scale::{format_time_tick, format_value_tick, LinearScale, TimeScale};
use super::scene::{Shape, TextAnchor};

const TICK_SIZE: f64 = 6.0;
const AXIS_COLOR: &str = "currentColor";

/// Tick count that keeps labels from overlapping on narrow charts.
pub fn tick_count(length_px: f64) -> usize {
    ((length_px / 80.0).floor() as usize).clamp(2, 10)
}

/// Time axis along the bottom edge of the plot area (at `y`).
pub fn bottom_axis(scale: &TimeScale, y: f64) -> Shape {
    let (r0, r1) = scale.range();
    let mut children = vec![Shape::line(r0, 0.0, r1, 0.0, AXIS_COLOR).with_class("domain")];

    for t in scale.ticks(tick_count((r1 - r0).abs())) {
        let x = scale.map(t as f64);
        children.push(Shape::group(
            "tick",
            vec![
                Shape::line(x, 0.0, x, TICK_SIZE, AXIS_COLOR),
                Shape::text(x, TICK_SIZE + 12.0, format_time_tick(t), TextAnchor::Middle),
            ],
        ));
    }

    Shape::Group {
        id: None,
        class: Some("x-axis".into()),
        translate: Some((0.0, y)),
        clip_path: None,
        children,
    }
}

/// Value axis along the left edge of the plot area.
pub fn left_axis(scale: &LinearScale) -> Shape {
    let (r0, r1) = scale.range;
    let mut children = vec![Shape::line(0.0, r0, 0.0, r1, AXIS_COLOR).with_class("domain")];

    for v in scale.ticks(tick_count((r1 - r0).abs())) {
        let y = scale.map(v);
        children.push(Shape::group(
            "tick",
            vec![
                Shape::line(-TICK_SIZE, y, 0.0, y, AXIS_COLOR),
                Shape::text(-TICK_SIZE - 3.0, y + 4.0, format_value_tick(v), TextAnchor::End),
            ],
        ));
    }

    Shape::group("y-axis", children)
}
