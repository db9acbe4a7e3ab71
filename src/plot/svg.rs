//! Minimal SVG document builder.

use std::fmt::Write;

/// An SVG document assembled element by element.
pub struct SvgDocument {
    width: f64,
    height: f64,
    body: String,
}

impl SvgDocument {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    /// Append raw markup.
    pub fn push(&mut self, element: &str) {
        self.body.push_str(element);
        self.body.push('\n');
    }

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &str, stroke: Option<&str>) {
        let stroke = stroke
            .map(|s| format!(r#" stroke="{}" stroke-width="1""#, s))
            .unwrap_or_default();
        self.push(&format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"{}/>"#,
            x, y, w, h, fill, stroke
        ));
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &str, width: f64) {
        self.push(&format!(
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{}"/>"#,
            x1, y1, x2, y2, stroke, width
        ));
    }

    /// Text anchored at `(x, y)`; `anchor` is start, middle or end.
    pub fn text(&mut self, x: f64, y: f64, size: f64, anchor: &str, fill: &str, content: &str) {
        self.push(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-size="{}" text-anchor="{}" fill="{}">{}</text>"#,
            x,
            y,
            size,
            anchor,
            fill,
            escape_xml(content)
        ));
    }

    /// Text rotated a quarter turn counter-clockwise around `(x, y)`.
    pub fn vertical_text(&mut self, x: f64, y: f64, size: f64, content: &str) {
        self.push(&format!(
            r#"<text x="{:.2}" y="{:.2}" font-size="{}" text-anchor="middle" transform="rotate(-90 {:.2} {:.2})">{}</text>"#,
            x,
            y,
            size,
            x,
            y,
            escape_xml(content)
        ));
    }

    /// A polyline through `points`, clipped to the clip path `clip_id` when given.
    pub fn polyline(&mut self, points: &[(f64, f64)], stroke: &str, clip_id: Option<&str>) {
        let mut coords = String::new();
        for (x, y) in points {
            let _ = write!(coords, "{:.2},{:.2} ", x, y);
        }
        let clip = clip_id
            .map(|id| format!(r#" clip-path="url(#{})""#, id))
            .unwrap_or_default();
        self.push(&format!(
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"{}/>"#,
            coords.trim_end(),
            stroke,
            clip
        ));
    }

    /// Define a rectangular clip path.
    pub fn clip_rect(&mut self, id: &str, x: f64, y: f64, w: f64, h: f64) {
        self.push(&format!(
            r#"<defs><clipPath id="{}"><rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}"/></clipPath></defs>"#,
            id, x, y, w, h
        ));
    }

    /// Finish the document.
    pub fn render(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\">\n<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

/// Escape text for use in XML content and attributes.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("A & B <Co>"), "A &amp; B &lt;Co&gt;");
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_render_document() {
        let mut doc = SvgDocument::new(100.0, 50.0);
        doc.text(10.0, 20.0, 12.0, "start", "black", "R&D");
        let svg = doc.render();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("R&amp;D"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
