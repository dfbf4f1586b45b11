use std::fmt::{self, Display, Write};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

/// A color as written in settings files: a name, `[r, g, b]` or
/// `[r, g, b, opacity]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Named(String),
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, f64),
}

impl Color {
    pub fn none() -> Self {
        Color::Named("none".to_string())
    }

    pub fn named(name: &str) -> Self {
        Color::Named(name.to_string())
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Named(name) => f.write_str(name),
            Color::Rgb(r, g, b) => write!(f, "rgb({r},{g},{b})"),
            Color::Rgba(r, g, b, a) => write!(f, "rgba({r},{g},{b},{a})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

impl Display for LineCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineJoin {
    Arcs,
    Bevel,
    Miter,
    MiterClip,
    Round,
}

impl Display for LineJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineJoin::Arcs => "arcs",
            LineJoin::Bevel => "bevel",
            LineJoin::Miter => "miter",
            LineJoin::MiterClip => "miter-clip",
            LineJoin::Round => "round",
        })
    }
}

/// Presentation attributes shared by all shapes. Unset attributes are not
/// written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f64>,
    pub line_cap: Option<LineCap>,
    pub line_join: Option<LineJoin>,
}

impl Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(fill) = &self.fill {
            write!(f, " fill=\"{fill}\"")?;
        }
        if let Some(stroke) = &self.stroke {
            write!(f, " stroke=\"{stroke}\"")?;
        }
        if let Some(width) = self.stroke_width {
            write!(f, " stroke-width=\"{width}\"")?;
        }
        if let Some(cap) = self.line_cap {
            write!(f, " stroke-linecap=\"{cap}\"")?;
        }
        if let Some(join) = self.line_join {
            write!(f, " stroke-linejoin=\"{join}\"")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
    pub style: Style,
}

impl Display for Circle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"{}/>",
            self.center.x, self.center.y, self.radius, self.style
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub style: Style,
}

impl Display for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<polyline points=\"")?;
        for (i, point) in self.points.iter().enumerate() {
            if i != 0 {
                f.write_char(' ')?;
            }
            write!(f, "{},{}", point.x, point.y)?;
        }
        write!(f, "\"{}/>", self.style)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text {
    pub position: Point,
    pub offset: Point,
    pub font_size: u32,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub data: String,
    pub style: Style,
}

impl Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<text{} x=\"{}\" y=\"{}\" dx=\"{}\" dy=\"{}\" font-size=\"{}\"",
            self.style,
            self.position.x,
            self.position.y,
            self.offset.x,
            self.offset.y,
            self.font_size
        )?;
        if let Some(family) = &self.font_family {
            write!(f, " font-family=\"{family}\"")?;
        }
        if let Some(weight) = &self.font_weight {
            write!(f, " font-weight=\"{weight}\"")?;
        }
        f.write_char('>')?;
        write_escaped(f, &self.data)?;
        f.write_str("</text>")
    }
}

fn write_escaped(f: &mut impl Write, data: &str) -> fmt::Result {
    for c in data.chars() {
        match c {
            '"' => f.write_str("&quot;")?,
            '\'' => f.write_str("&apos;")?,
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '&' => f.write_str("&amp;")?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Circle(Circle),
    Polyline(Polyline),
    Text(Text),
}

impl Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Circle(it) => it.fmt(f),
            Object::Polyline(it) => it.fmt(f),
            Object::Text(it) => it.fmt(f),
        }
    }
}

impl From<Circle> for Object {
    fn from(value: Circle) -> Self {
        Object::Circle(value)
    }
}

impl From<Polyline> for Object {
    fn from(value: Polyline) -> Self {
        Object::Polyline(value)
    }
}

impl From<Text> for Object {
    fn from(value: Text) -> Self {
        Object::Text(value)
    }
}

/// Objects are drawn in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Document {
    objects: Vec<Object>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: impl Into<Object>) {
        self.objects.push(object.into());
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>")?;
        writeln!(f, "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\">")?;
        for object in &self.objects {
            writeln!(f, "  {object}")?;
        }
        f.write_str("</svg>")
    }
}

#[cfg(test)]
mod tests {
    use super::{Circle, Color, Document, LineCap, LineJoin, Point, Polyline, Style, Text};

    #[test]
    fn colors_from_settings() {
        let colors: Vec<Color> =
            serde_json::from_str(r#"["green", [255, 160, 0], [255, 255, 255, 0.85]]"#).unwrap();
        assert_eq!(
            colors,
            vec![
                Color::named("green"),
                Color::Rgb(255, 160, 0),
                Color::Rgba(255, 255, 255, 0.85)
            ]
        );
        let rendered: Vec<String> = colors.iter().map(|it| it.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["green", "rgb(255,160,0)", "rgba(255,255,255,0.85)"]
        );
    }

    #[test]
    fn point_from_pair() {
        let point: Point = serde_json::from_str("[7, -3.5]").unwrap();
        assert_eq!(point, Point::new(7.0, -3.5));
    }

    #[test]
    fn renders_document() {
        let mut document = Document::new();
        document.add(Polyline {
            points: vec![Point::new(1.0, 2.0), Point::new(3.5, 4.0)],
            style: Style {
                fill: Some(Color::none()),
                stroke: Some(Color::Rgb(1, 2, 3)),
                stroke_width: Some(14.0),
                line_cap: Some(LineCap::Round),
                line_join: Some(LineJoin::Round),
            },
        });
        document.add(Circle {
            center: Point::new(20.0, 20.0),
            radius: 5.0,
            style: Style {
                fill: Some(Color::named("white")),
                ..Default::default()
            },
        });
        document.add(Text {
            position: Point::new(10.0, 11.0),
            offset: Point::new(7.0, -3.0),
            font_size: 20,
            font_family: Some("Verdana".to_string()),
            font_weight: None,
            data: "Tom & \"Jerry\"".to_string(),
            style: Style {
                fill: Some(Color::named("black")),
                ..Default::default()
            },
        });
        assert_eq!(document.len(), 3);
        assert_eq!(
            document.to_string(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n\
             <svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\">\n  \
             <polyline points=\"1,2 3.5,4\" fill=\"none\" stroke=\"rgb(1,2,3)\" stroke-width=\"14\" stroke-linecap=\"round\" stroke-linejoin=\"round\"/>\n  \
             <circle cx=\"20\" cy=\"20\" r=\"5\" fill=\"white\"/>\n  \
             <text fill=\"black\" x=\"10\" y=\"11\" dx=\"7\" dy=\"-3\" font-size=\"20\" font-family=\"Verdana\">Tom &amp; &quot;Jerry&quot;</text>\n\
             </svg>"
        );
    }

    #[test]
    fn empty_document() {
        assert_eq!(
            Document::new().to_string(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n\
             <svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\">\n\
             </svg>"
        );
    }
}
