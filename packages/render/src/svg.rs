//! Minimal SVG document builder and PNG rasterizer.
//!
//! Documents are assembled as strings. Writing into a `String` cannot fail,
//! so `write!` results are discarded. Projected coordinates are mapped to
//! screen space by a [`Viewport`] that fits a bounding box into the canvas
//! and flips the y axis. Finished documents are rendered to PNG by
//! [`write_png`].

use std::fmt::Write as _;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use geo::{LineString, MultiPolygon, Rect};
use resvg::{tiny_skia, usvg};

use crate::{RenderError, write_atomic};

/// System fonts, loaded once for every rasterized image.
static FONTS: LazyLock<Arc<usvg::fontdb::Database>> = LazyLock::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    log::debug!("Loaded {} font faces", db.len());
    Arc::new(db)
});

/// Font stack used for all text.
const FONT_FAMILY: &str = "Roboto, Helvetica, Arial, sans-serif";

/// Maps projected coordinates into a pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    min_x: f64,
    max_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    /// Fits `bounds` into the `width` × `height` rectangle whose top-left
    /// corner is at (`left`, `top`), preserving aspect ratio and centering.
    #[must_use]
    pub fn fit(bounds: Rect<f64>, left: f64, top: f64, width: f64, height: f64) -> Self {
        let dx = bounds.width().max(f64::EPSILON);
        let dy = bounds.height().max(f64::EPSILON);
        let scale = (width / dx).min(height / dy);

        Self {
            min_x: bounds.min().x,
            max_y: bounds.max().y,
            scale,
            offset_x: (dx * scale).mul_add(-0.5, width.mul_add(0.5, left)),
            offset_y: (dy * scale).mul_add(-0.5, height.mul_add(0.5, top)),
        }
    }

    /// Converts a projected point to screen coordinates.
    #[must_use]
    pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.min_x).mul_add(self.scale, self.offset_x),
            (self.max_y - y).mul_add(self.scale, self.offset_y),
        )
    }

    /// Builds SVG path data for a multipolygon, one subpath per ring.
    #[must_use]
    pub fn path_data(&self, geometry: &MultiPolygon<f64>) -> String {
        let mut d = String::new();
        for polygon in geometry {
            self.push_ring(&mut d, polygon.exterior());
            for interior in polygon.interiors() {
                self.push_ring(&mut d, interior);
            }
        }
        d
    }

    fn push_ring(&self, d: &mut String, ring: &LineString<f64>) {
        for (i, coord) in ring.coords().enumerate() {
            let (sx, sy) = self.to_screen(coord.x, coord.y);
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{sx:.1},{sy:.1}");
        }
        if !ring.0.is_empty() {
            d.push('Z');
        }
    }
}

/// An SVG document under construction.
#[derive(Debug, Clone)]
pub struct SvgDocument {
    width: u32,
    height: u32,
    body: String,
}

impl SvgDocument {
    /// Starts a document with a white background.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let mut body = String::new();
        let _ = writeln!(
            body,
            r##"<rect x="0" y="0" width="{width}" height="{height}" fill="#ffffff"/>"##
        );
        Self {
            width,
            height,
            body,
        }
    }

    /// Appends a path.
    pub fn path(&mut self, d: &str, fill: &str, stroke: &str, stroke_width: f64) {
        if d.is_empty() {
            return;
        }
        let _ = writeln!(
            self.body,
            r#"<path d="{d}" fill="{fill}" fill-rule="evenodd" stroke="{stroke}" stroke-width="{stroke_width}"/>"#
        );
    }

    /// Appends a circle.
    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, fill: &str, opacity: f64) {
        let _ = writeln!(
            self.body,
            r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.2}" fill="{fill}" fill-opacity="{opacity}"/>"#
        );
    }

    /// Appends an unfilled circle outline.
    pub fn ring(&mut self, cx: f64, cy: f64, r: f64, stroke: &str) {
        let _ = writeln!(
            self.body,
            r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{r:.2}" fill="none" stroke="{stroke}" stroke-width="1"/>"#
        );
    }

    /// Appends an axis-aligned rectangle.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, fill: &str) {
        let _ = writeln!(
            self.body,
            r#"<rect x="{x:.1}" y="{y:.1}" width="{width:.1}" height="{height:.1}" fill="{fill}"/>"#
        );
    }

    /// Appends a straight line.
    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: &str, stroke_width: f64) {
        let _ = writeln!(
            self.body,
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{stroke}" stroke-width="{stroke_width}"/>"#,
            from.0, from.1, to.0, to.1
        );
    }

    /// Appends a line ending in a filled arrowhead.
    pub fn arrow(&mut self, from: (f64, f64), to: (f64, f64), color: &str, stroke_width: f64) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len = dx.hypot(dy);
        if len < f64::EPSILON {
            return;
        }
        let (ux, uy) = (dx / len, dy / len);
        let head = (stroke_width * 3.0).min(len * 0.5);
        let base = (to.0 - ux * head, to.1 - uy * head);
        let half = head * 0.5;
        let left = (uy.mul_add(half, base.0), (-ux).mul_add(half, base.1));
        let right = ((-uy).mul_add(half, base.0), ux.mul_add(half, base.1));

        self.line(from, base, color, stroke_width);
        let _ = writeln!(
            self.body,
            r#"<path d="M{:.1},{:.1}L{:.1},{:.1}L{:.1},{:.1}Z" fill="{color}"/>"#,
            to.0, to.1, left.0, left.1, right.0, right.1
        );
    }

    /// Appends text. `anchor` is `start`, `middle` or `end`.
    pub fn text(&mut self, x: f64, y: f64, size: f64, anchor: &str, weight: &str, content: &str) {
        let _ = writeln!(
            self.body,
            r##"<text x="{x:.1}" y="{y:.1}" font-family="{FONT_FAMILY}" font-size="{size}" font-weight="{weight}" text-anchor="{anchor}" fill="#333333">{}</text>"##,
            escape(content)
        );
    }

    /// Appends a centered title, one line per `\n`.
    pub fn title(&mut self, title: &str) {
        let cx = f64::from(self.width) / 2.0;
        for (i, line) in title.lines().enumerate() {
            let (size, weight) = if i == 0 { (18.0, "bold") } else { (13.0, "normal") };
            #[allow(clippy::cast_precision_loss)]
            let y = (i as f64).mul_add(20.0, 28.0);
            self.text(cx, y, size, "middle", weight, line);
        }
    }

    /// Returns the finished document.
    #[must_use]
    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

/// Fits a map into a canvas, leaving room for the title above and the
/// legend below.
#[must_use]
pub fn map_viewport(bounds: Rect<f64>, width: u32, height: u32) -> Viewport {
    Viewport::fit(
        bounds,
        20.0,
        70.0,
        f64::from(width) - 40.0,
        f64::from(height) - 160.0,
    )
}

/// Appends one path per geometry.
pub fn draw_polygons<'a>(
    doc: &mut SvgDocument,
    viewport: &Viewport,
    geometries: impl IntoIterator<Item = &'a MultiPolygon<f64>>,
    fill: &str,
    stroke: &str,
    stroke_width: f64,
) {
    for geometry in geometries {
        doc.path(&viewport.path_data(geometry), fill, stroke, stroke_width);
    }
}

/// Escapes text content for XML.
#[must_use]
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Marker radius for a matplotlib-style marker area in square pixels.
#[must_use]
pub fn marker_radius(area: f64) -> f64 {
    area.max(0.0).sqrt() / 2.0
}

/// Renders a finished document to PNG bytes at its own pixel size.
///
/// # Errors
///
/// Returns [`RenderError::Svg`] if the document does not parse,
/// [`RenderError::Conversion`] if it has no drawable area, and
/// [`RenderError::Png`] if encoding fails.
pub fn rasterize(svg: &str) -> Result<Vec<u8>, RenderError> {
    let options = usvg::Options {
        fontdb: Arc::clone(&FONTS),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &options)?;
    let size = tree.size().to_int_size();

    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        RenderError::Conversion {
            message: format!("cannot allocate a {}x{} pixmap", size.width(), size.height()),
        }
    })?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // Documents start with an opaque background, so premultiplied pixels
    // equal straight RGBA.
    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, size.width(), size.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(pixmap.data())?;
    writer.finish()?;

    Ok(out)
}

/// Rasterizes a finished document and writes it as PNG, creating the
/// parent directory.
///
/// # Errors
///
/// Returns [`RenderError`] if rasterizing or writing fails.
pub fn write_png(path: &Path, svg: &str) -> Result<(), RenderError> {
    write_atomic(path, &rasterize(svg)?)
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn unit_viewport() -> Viewport {
        Viewport::fit(Rect::new((0.0, 0.0), (10.0, 10.0)), 0.0, 0.0, 100.0, 100.0)
    }

    #[test]
    fn viewport_flips_y() {
        let vp = unit_viewport();
        let (x0, y0) = vp.to_screen(0.0, 0.0);
        let (x1, y1) = vp.to_screen(10.0, 10.0);
        assert!(x0.abs() < 1e-9 && (y0 - 100.0).abs() < 1e-9);
        assert!((x1 - 100.0).abs() < 1e-9 && y1.abs() < 1e-9);
    }

    #[test]
    fn viewport_centers_narrow_bounds() {
        let vp = Viewport::fit(Rect::new((0.0, 0.0), (10.0, 5.0)), 0.0, 0.0, 100.0, 100.0);
        let (_, top) = vp.to_screen(0.0, 5.0);
        let (_, bottom) = vp.to_screen(0.0, 0.0);
        assert!((top - 25.0).abs() < 1e-9);
        assert!((bottom - 75.0).abs() < 1e-9);
    }

    #[test]
    fn path_data_closes_rings() {
        let square = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ]]);
        let d = unit_viewport().path_data(&square);
        assert!(d.starts_with("M0.0,100.0L100.0,100.0"));
        assert!(d.ends_with('Z'));
    }

    #[test]
    fn document_wraps_elements() {
        let mut doc = SvgDocument::new(200, 100);
        doc.circle(10.0, 10.0, 2.0, "#c52622", 0.7);
        doc.text(5.0, 5.0, 12.0, "start", "normal", "A & B");
        doc.path("", "#000", "#000", 1.0);
        let svg = doc.finish();
        assert!(svg.starts_with("<svg xmlns"));
        assert!(svg.contains(r#"viewBox="0 0 200 100""#));
        assert!(svg.contains("<circle"));
        assert!(svg.contains("A &amp; B"));
        assert!(!svg.contains("<path"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn arrow_draws_shaft_and_head() {
        let mut doc = SvgDocument::new(50, 50);
        doc.arrow((10.0, 10.0), (20.0, 0.0), "#5194c3", 1.0);
        doc.arrow((10.0, 10.0), (10.0, 10.0), "#5194c3", 1.0);
        let svg = doc.finish();
        assert_eq!(svg.matches("<line").count(), 1);
        assert_eq!(svg.matches("<path").count(), 1);
    }

    #[test]
    fn rasterizes_at_document_size() {
        let mut doc = SvgDocument::new(40, 30);
        doc.rect(5.0, 5.0, 10.0, 10.0, "#c52622");
        let png = rasterize(&doc.finish()).unwrap();
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
        // IHDR width and height, big-endian, after the signature and chunk header.
        assert_eq!(&png[16..20], &40_u32.to_be_bytes());
        assert_eq!(&png[20..24], &30_u32.to_be_bytes());
    }

    #[test]
    fn write_png_replaces_file() {
        let (root, dirs) = crate::test_fixtures::temp_dirs("write_png");
        let path = dirs.visuals.join("map.png");
        write_png(&path, &SvgDocument::new(10, 10).finish()).unwrap();
        write_png(&path, &SvgDocument::new(20, 10).finish()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
        assert_eq!(&bytes[16..20], &20_u32.to_be_bytes());
        assert!(!path.with_extension("tmp").exists());
        std::fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn malformed_document_is_svg_error() {
        assert!(matches!(rasterize("<svg"), Err(RenderError::Svg(_))));
    }

    #[test]
    fn marker_radius_from_area() {
        assert!((marker_radius(400.0) - 10.0).abs() < f64::EPSILON);
        assert!(marker_radius(-1.0).abs() < f64::EPSILON);
    }
}
