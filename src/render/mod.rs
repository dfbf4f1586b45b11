use std::fmt::Display;

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    catalogue::Catalogue,
    domain::{Bus, StopIdx},
};

pub mod projector;
pub mod svg;

use projector::SphereProjector;
use svg::{Circle, Color, Document, LineCap, LineJoin, Point, Polyline, Style, Text};

const LABEL_FONT: &str = "Verdana";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub line_width: f64,
    pub stop_radius: f64,
    pub bus_label_font_size: u32,
    pub bus_label_offset: Point,
    pub stop_label_font_size: u32,
    pub stop_label_offset: Point,
    pub underlayer_color: Color,
    pub underlayer_width: f64,
    pub color_palette: Vec<Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderSettingsError {
    NegativeSize,
    PaddingTooLarge { padding: f64 },
    EmptyPalette,
}

impl Display for RenderSettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderSettingsError::NegativeSize => write!(f, "width and height must not be negative"),
            RenderSettingsError::PaddingTooLarge { padding } => {
                write!(f, "padding {padding} does not fit into the canvas")
            }
            RenderSettingsError::EmptyPalette => write!(f, "color_palette is empty"),
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), RenderSettingsError> {
        if self.width < 0.0 || self.height < 0.0 {
            return Err(RenderSettingsError::NegativeSize);
        }
        if self.padding < 0.0 || 2.0 * self.padding > self.width.min(self.height) {
            return Err(RenderSettingsError::PaddingTooLarge {
                padding: self.padding,
            });
        }
        if self.color_palette.is_empty() {
            return Err(RenderSettingsError::EmptyPalette);
        }
        Ok(())
    }

    fn palette_color(&self, idx: usize) -> Option<Color> {
        if self.color_palette.is_empty() {
            return None;
        }
        Some(self.color_palette[idx % self.color_palette.len()].clone())
    }

    fn underlayer_style(&self) -> Style {
        Style {
            fill: Some(self.underlayer_color.clone()),
            stroke: Some(self.underlayer_color.clone()),
            stroke_width: Some(self.underlayer_width),
            line_cap: Some(LineCap::Round),
            line_join: Some(LineJoin::Round),
        }
    }
}

/// Draws the network as an SVG document.
///
/// Layers from bottom to top: one line per bus, bus names at the terminals,
/// stop circles, stop names. Buses and stops are drawn in name order and only
/// stops served by some bus are shown. The n-th bus with stops gets the n-th
/// palette color, wrapping around.
pub fn render_map(catalogue: &Catalogue, settings: &RenderSettings) -> Document {
    let buses = catalogue
        .buses_sorted()
        .into_iter()
        .map(|(_, bus)| bus)
        .filter(|bus| !bus.stops.is_empty())
        .collect_vec();
    let stops = catalogue
        .stops()
        .filter(|(stop_idx, _)| !catalogue.buses_through_stop(*stop_idx).is_empty())
        .map(|(_, stop)| stop)
        .sorted_by(|a, b| a.name.cmp(&b.name))
        .collect_vec();

    let coords = stops.iter().map(|stop| stop.coords).collect_vec();
    let projector = SphereProjector::new(&coords, settings.width, settings.height, settings.padding);

    let mut document = Document::new();
    for (idx, bus) in buses.iter().enumerate() {
        document.add(Polyline {
            points: bus
                .stops
                .iter()
                .map(|&stop_idx| projector.project(catalogue.stop(stop_idx).coords))
                .collect(),
            style: Style {
                fill: Some(Color::none()),
                stroke: settings.palette_color(idx),
                stroke_width: Some(settings.line_width),
                line_cap: Some(LineCap::Round),
                line_join: Some(LineJoin::Round),
            },
        });
    }

    for (idx, bus) in buses.iter().enumerate() {
        for position in bus_label_positions(bus) {
            let label = Text {
                position: projector.project(catalogue.stop(position).coords),
                offset: settings.bus_label_offset,
                font_size: settings.bus_label_font_size,
                font_family: Some(LABEL_FONT.to_string()),
                font_weight: Some("bold".to_string()),
                data: bus.name.to_string(),
                style: settings.underlayer_style(),
            };
            document.add(label.clone());
            document.add(Text {
                style: Style {
                    fill: settings.palette_color(idx),
                    ..Default::default()
                },
                ..label
            });
        }
    }

    for stop in &stops {
        document.add(Circle {
            center: projector.project(stop.coords),
            radius: settings.stop_radius,
            style: Style {
                fill: Some(Color::named("white")),
                ..Default::default()
            },
        });
    }

    for stop in &stops {
        let label = Text {
            position: projector.project(stop.coords),
            offset: settings.stop_label_offset,
            font_size: settings.stop_label_font_size,
            font_family: Some(LABEL_FONT.to_string()),
            font_weight: None,
            data: stop.name.to_string(),
            style: settings.underlayer_style(),
        };
        document.add(label.clone());
        document.add(Text {
            style: Style {
                fill: Some(Color::named("black")),
                ..Default::default()
            },
            ..label
        });
    }

    debug!(
        "Rendered {} buses and {} stops into {} objects",
        buses.len(),
        stops.len(),
        document.len()
    );
    document
}

/// Where a bus gets its name drawn: its terminal and, for a back-and-forth
/// line, also its turnaround stop if that differs.
fn bus_label_positions(bus: &Bus) -> impl Iterator<Item = StopIdx> {
    let terminal = bus.stops.last().copied();
    let turnaround = bus
        .turnaround()
        .filter(|&it| Some(it) != bus.stops.first().copied());
    terminal.into_iter().chain(turnaround)
}
