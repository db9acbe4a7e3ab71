//! Transition matrix heatmap.

use super::svg::SvgDocument;
use crate::models::TransitionMatrix;

/// Yellow-green-blue ramp, light to dark.
const RAMP: [(u8, u8, u8); 9] = [
    (0xff, 0xff, 0xd9),
    (0xed, 0xf8, 0xb1),
    (0xc7, 0xe9, 0xb4),
    (0x7f, 0xcd, 0xbb),
    (0x41, 0xb6, 0xc4),
    (0x1d, 0x91, 0xc0),
    (0x22, 0x5e, 0xa8),
    (0x25, 0x34, 0x94),
    (0x08, 0x1d, 0x58),
];

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 800.0;
const MARGIN_LEFT: f64 = 160.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_RIGHT: f64 = 140.0;
const MARGIN_BOTTOM: f64 = 110.0;

/// Colour for `t` in `[0, 1]` along the ramp.
pub fn ramp_color(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (RAMP.len() - 1) as f64;
    let lower = scaled.floor() as usize;
    let upper = (lower + 1).min(RAMP.len() - 1);
    let frac = scaled - lower as f64;

    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (r1, g1, b1) = RAMP[lower];
    let (r2, g2, b2) = RAMP[upper];
    format!("#{:02x}{:02x}{:02x}", mix(r1, r2), mix(g1, g2), mix(b1, b2))
}

/// Render the heatmap. `None` when the matrix has no defined row.
pub fn render_transition_heatmap(matrix: &TransitionMatrix) -> Option<String> {
    if matrix.is_empty() || matrix.columns.is_empty() {
        return None;
    }

    let values: Vec<f64> = matrix
        .rows
        .values()
        .flat_map(|row| row.probabilities.values().copied())
        .collect();
    let v_min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let v_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = v_max - v_min;
    let normalize = |v: f64| if span > 0.0 { (v - v_min) / span } else { 0.5 };

    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let cell_w = plot_w / matrix.columns.len() as f64;
    let cell_h = plot_h / matrix.rows.len() as f64;

    let mut doc = SvgDocument::new(WIDTH, HEIGHT);

    for (r, current) in matrix.rows.keys().enumerate() {
        let y = MARGIN_TOP + r as f64 * cell_h;
        doc.text(
            MARGIN_LEFT - 10.0,
            y + cell_h / 2.0 + 5.0,
            13.0,
            "end",
            "#111111",
            current,
        );

        for (c, next) in matrix.columns.iter().enumerate() {
            let x = MARGIN_LEFT + c as f64 * cell_w;
            let value = matrix.probability(current, next).unwrap_or(0.0);
            let t = normalize(value);
            doc.rect(x, y, cell_w, cell_h, &ramp_color(t), Some("#ffffff"));
            let ink = if t > 0.6 { "#ffffff" } else { "#111111" };
            doc.text(
                x + cell_w / 2.0,
                y + cell_h / 2.0 + 5.0,
                14.0,
                "middle",
                ink,
                &format!("{:.2}", value),
            );
        }
    }

    for (c, next) in matrix.columns.iter().enumerate() {
        doc.text(
            MARGIN_LEFT + (c as f64 + 0.5) * cell_w,
            MARGIN_TOP + plot_h + 22.0,
            13.0,
            "middle",
            "#111111",
            next,
        );
    }

    // Colour bar
    let bar_x = WIDTH - MARGIN_RIGHT + 40.0;
    let steps = 50;
    let step_h = plot_h / steps as f64;
    for i in 0..steps {
        let t = 1.0 - i as f64 / (steps - 1) as f64;
        doc.rect(bar_x, MARGIN_TOP + i as f64 * step_h, 20.0, step_h + 0.5, &ramp_color(t), None);
    }
    doc.text(bar_x + 26.0, MARGIN_TOP + 10.0, 12.0, "start", "#111111", &format!("{:.2}", v_max));
    doc.text(
        bar_x + 26.0,
        MARGIN_TOP + plot_h,
        12.0,
        "start",
        "#111111",
        &format!("{:.2}", v_min),
    );

    doc.text(
        WIDTH / 2.0,
        MARGIN_TOP / 2.0 + 6.0,
        16.0,
        "middle",
        "#111111",
        "Shipment Type Transition Probabilities",
    );
    doc.text(
        MARGIN_LEFT + plot_w / 2.0,
        HEIGHT - 30.0,
        14.0,
        "middle",
        "#111111",
        "Next Shipment Type",
    );
    doc.vertical_text(30.0, MARGIN_TOP + plot_h / 2.0, 14.0, "Current Shipment Type");

    Some(doc.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransitionRow;

    #[test]
    fn test_ramp_endpoints() {
        assert_eq!(ramp_color(0.0), "#ffffd9");
        assert_eq!(ramp_color(1.0), "#081d58");
        assert_eq!(ramp_color(5.0), "#081d58");
        assert_eq!(ramp_color(f64::NAN), "#ffffd9");
    }

    #[test]
    fn test_empty_matrix_renders_nothing() {
        assert!(render_transition_heatmap(&TransitionMatrix::default()).is_none());
    }

    #[test]
    fn test_heatmap_annotations() {
        let mut matrix = TransitionMatrix {
            columns: vec!["Air".to_string(), "Sea".to_string()],
            ..Default::default()
        };
        matrix.rows.insert(
            "Air".to_string(),
            TransitionRow {
                observations: 4,
                probabilities: [("Air".to_string(), 0.25), ("Sea".to_string(), 0.75)]
                    .into_iter()
                    .collect(),
            },
        );

        let svg = render_transition_heatmap(&matrix).unwrap();
        assert!(svg.contains(">0.25<"));
        assert!(svg.contains(">0.75<"));
        assert!(svg.contains("Next Shipment Type"));
        assert!(svg.contains("#081d58"));
    }
}
