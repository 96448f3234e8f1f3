//! Basemap drawing: projection, extent, background and shapefile layers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use colortables::Rgba as Color;
use projection::{MapProjection, ProjectedBounds, Projection};
use shapefile::{PolygonRing, Shape};
use tracing::{debug, info, warn};
use wx_common::{GeoBBox, WxError, WxResult};

use crate::canvas::{with_alpha, Canvas};

/// Linear mapping between projected coordinates and canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub bounds: ProjectedBounds,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(bounds: ProjectedBounds, width: u32, height: u32) -> WxResult<Self> {
        if !(bounds.width() > 0.0 && bounds.height() > 0.0) || width == 0 || height == 0 {
            return Err(WxError::Render(format!(
                "Degenerate viewport {:?} at {}x{}",
                bounds, width, height
            )));
        }
        Ok(Self { bounds, width, height })
    }

    /// Viewport `width` pixels wide whose height keeps the bounds' aspect.
    pub fn with_width(bounds: ProjectedBounds, width: u32) -> WxResult<Self> {
        let aspect = bounds.height() / bounds.width();
        let height = (width as f64 * aspect).round().max(1.0);
        if !height.is_finite() {
            return Err(WxError::Render(format!("Degenerate viewport {:?}", bounds)));
        }
        Self::new(bounds, width, height as u32)
    }

    /// Projected `(x, y)` to fractional pixel coordinates, y down.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let px = (x - self.bounds.xmin) / self.bounds.width() * self.width as f64;
        let py = (self.bounds.ymax - y) / self.bounds.height() * self.height as f64;
        (px, py)
    }

    /// Projected coordinates at the centre of pixel `(col, row)`.
    pub fn to_projected(&self, col: u32, row: u32) -> (f64, f64) {
        let x = self.bounds.xmin + (col as f64 + 0.5) / self.width as f64 * self.bounds.width();
        let y = self.bounds.ymax - (row as f64 + 0.5) / self.height as f64 * self.bounds.height();
        (x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapLayer {
    Coastlines,
    Borders,
    States,
    Counties,
    Highways,
}

impl MapLayer {
    pub const ALL: [MapLayer; 5] = [
        MapLayer::Coastlines,
        MapLayer::Borders,
        MapLayer::States,
        MapLayer::Counties,
        MapLayer::Highways,
    ];

    /// Shapefile path relative to the shapefile directory.
    pub fn shapefile(&self) -> PathBuf {
        let stem = match self {
            MapLayer::Coastlines => return Path::new("gshhs").join("GSHHS_i_L1.shp"),
            MapLayer::Borders => "cb_2015_us_nation_5m",
            MapLayer::States => "cb_2015_us_state_5m",
            MapLayer::Counties => "cb_2015_us_county_5m",
            MapLayer::Highways => "tl_2016_us_primaryroads",
        };
        Path::new(stem).join(format!("{}.shp", stem))
    }

    pub fn default_properties(&self) -> LayerProperties {
        let gray = Color::rgb(128, 128, 128);
        match self {
            MapLayer::Coastlines => LayerProperties::stroke(0.5, Color::rgb(0, 0, 0), 1.0),
            MapLayer::Borders | MapLayer::States => LayerProperties::stroke(1.0, gray, 1.0),
            MapLayer::Counties => LayerProperties::stroke(0.5, gray, 1.0),
            MapLayer::Highways => LayerProperties::stroke(0.65, Color::rgb(165, 42, 42), 0.8),
        }
    }
}

/// Styling of one basemap layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerProperties {
    pub stroke_width: f64,
    pub stroke_color: Color,
    pub alpha: f64,
    pub fill: Option<Color>,
    pub visible: bool,
}

impl LayerProperties {
    pub fn stroke(stroke_width: f64, stroke_color: Color, alpha: f64) -> Self {
        Self {
            stroke_width,
            stroke_color,
            alpha,
            fill: None,
            visible: true,
        }
    }
}

/// A projected map with optional geographic extent and basemap layers.
#[derive(Debug, Clone)]
pub struct Mapper {
    pub projection: Projection,
    pub extent: Option<GeoBBox>,
    pub bg_color: Color,
    pub shapefile_dir: PathBuf,
    layers: BTreeMap<MapLayer, LayerProperties>,
}

impl Mapper {
    /// A map with every layer at its default style.
    pub fn new(projection: impl Into<Projection>, shapefile_dir: impl Into<PathBuf>) -> Self {
        Self {
            projection: projection.into(),
            extent: None,
            bg_color: Color::rgb(255, 255, 255),
            shapefile_dir: shapefile_dir.into(),
            layers: MapLayer::ALL.iter().map(|l| (*l, l.default_properties())).collect(),
        }
    }

    /// Borders, states, counties and highways over a US-scale map; no coastlines.
    pub fn detailed_us(projection: impl Into<Projection>, shapefile_dir: impl Into<PathBuf>) -> Self {
        let mut mapper = Self::new(projection, shapefile_dir);
        mapper.layer_mut(MapLayer::Coastlines).visible = false;
        mapper
    }

    pub fn with_extent(mut self, extent: GeoBBox) -> Self {
        self.set_extent(extent);
        self
    }

    pub fn set_extent(&mut self, extent: GeoBBox) {
        info!(extent = ?extent, "Setting map extent");
        self.extent = Some(extent);
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.bg_color = color;
        self
    }

    pub fn layer(&self, layer: MapLayer) -> LayerProperties {
        self.layers
            .get(&layer)
            .copied()
            .unwrap_or_else(|| layer.default_properties())
    }

    pub fn layer_mut(&mut self, layer: MapLayer) -> &mut LayerProperties {
        self.layers.entry(layer).or_insert_with(|| layer.default_properties())
    }

    /// Viewport over the map extent, or over `fallback` (usually the data's
    /// own bounds) when no extent is set.
    pub fn viewport(&self, width: u32, fallback: Option<ProjectedBounds>) -> WxResult<Viewport> {
        let bounds = match self.extent {
            Some(extent) => self.projection.projected_bounds(&extent).ok_or_else(|| {
                WxError::Render(format!("Extent {:?} has no image in {}", extent, self.projection.name()))
            })?,
            None => fallback.ok_or_else(|| WxError::Render("Map has no extent to draw".into()))?,
        };
        Viewport::with_width(bounds, width)
    }

    pub fn new_canvas(&self, viewport: &Viewport) -> Canvas {
        Canvas::new(viewport.width, viewport.height, self.bg_color)
    }

    /// Project `(lon, lat)` points to pixels, splitting wherever a point has
    /// no image.
    pub fn project_path(&self, viewport: &Viewport, points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
        let mut parts = Vec::new();
        let mut current = Vec::new();
        for &(lon, lat) in points {
            match self.projection.project(lon, lat) {
                Some((x, y)) => current.push(viewport.to_pixel(x, y)),
                None if !current.is_empty() => parts.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            parts.push(current);
        }
        parts
    }

    /// Draw every visible layer whose shapefile exists.
    pub fn draw_layers(&self, canvas: &mut Canvas, viewport: &Viewport) -> WxResult<()> {
        for (layer, props) in self.layers.iter().filter(|(_, p)| p.visible) {
            let path = self.shapefile_dir.join(layer.shapefile());
            if !path.exists() {
                warn!(layer = ?layer, path = ?path, "Shapefile not found, skipping layer");
                continue;
            }
            info!(layer = ?layer, "Drawing map layer");
            let shapes = shapefile::read_shapes(&path)
                .map_err(|e| WxError::Render(format!("Failed to read {:?}: {}", path, e)))?;
            let drawn = self.draw_shapes(canvas, viewport, &shapes, props);
            debug!(layer = ?layer, shapes = shapes.len(), drawn = drawn, "Finished map layer");
        }
        Ok(())
    }

    /// Draw shapes in `(lon, lat)` with the given style; returns how many
    /// had any visible geometry.
    pub fn draw_shapes(
        &self,
        canvas: &mut Canvas,
        viewport: &Viewport,
        shapes: &[Shape],
        props: &LayerProperties,
    ) -> usize {
        let stroke = with_alpha(props.stroke_color, props.alpha);
        let mut drawn = 0;
        for shape in shapes {
            let (lines, closed) = shape_parts(shape);
            if lines.is_empty() {
                continue;
            }
            let projected: Vec<Vec<(f64, f64)>> = lines
                .iter()
                .flat_map(|part| self.project_path(viewport, part))
                .collect();
            if projected.is_empty() {
                continue;
            }
            drawn += 1;
            if let (true, Some(fill)) = (closed, props.fill) {
                canvas.fill_polygon(&projected, with_alpha(fill, props.alpha));
            }
            for part in &projected {
                if closed {
                    canvas.draw_polygon(part, props.stroke_width, stroke);
                } else {
                    canvas.draw_polyline(part, props.stroke_width, stroke);
                }
            }
        }
        drawn
    }
}

/// `(lon, lat)` parts of a shape and whether they are polygon rings.
fn shape_parts(shape: &Shape) -> (Vec<Vec<(f64, f64)>>, bool) {
    match shape {
        Shape::Polygon(poly) => (
            poly.rings()
                .iter()
                .map(|ring| match ring {
                    PolygonRing::Outer(points) | PolygonRing::Inner(points) => {
                        points.iter().map(|p| (p.x, p.y)).collect()
                    }
                })
                .collect(),
            true,
        ),
        Shape::Polyline(line) => (
            line.parts()
                .iter()
                .map(|part| part.iter().map(|p| (p.x, p.y)).collect())
                .collect(),
            false,
        ),
        _ => (Vec::new(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::PlateCarree;
    use shapefile::{Point, Polygon, Polyline};

    fn plate_carree_map() -> Mapper {
        Mapper::new(PlateCarree::default(), "/nonexistent").with_extent(GeoBBox::new(-10.0, 10.0, -5.0, 5.0))
    }

    #[test]
    fn test_viewport_keeps_aspect() {
        let viewport = plate_carree_map().viewport(200, None).unwrap();
        assert_eq!((viewport.width, viewport.height), (200, 100));
        let (px, py) = viewport.to_pixel(-10.0, 5.0);
        assert!(px.abs() < 1e-9 && py.abs() < 1e-9);
        let (x, y) = viewport.to_projected(199, 99);
        assert!((x - 9.95).abs() < 1e-9 && (y + 4.95).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_needs_extent_or_fallback() {
        let mapper = Mapper::new(PlateCarree::default(), "/nonexistent");
        assert!(mapper.viewport(100, None).is_err());
        let bounds = ProjectedBounds { xmin: 0.0, xmax: 10.0, ymin: 0.0, ymax: 10.0 };
        assert_eq!(mapper.viewport(100, Some(bounds)).unwrap().height, 100);
    }

    #[test]
    fn test_layer_defaults_and_overrides() {
        let mut mapper = Mapper::detailed_us(PlateCarree::default(), "/nonexistent");
        assert!(!mapper.layer(MapLayer::Coastlines).visible);
        assert_eq!(mapper.layer(MapLayer::Highways).alpha, 0.8);
        mapper.layer_mut(MapLayer::Counties).stroke_color = Color::rgb(0, 0, 0);
        assert_eq!(mapper.layer(MapLayer::Counties).stroke_color, Color::rgb(0, 0, 0));
        assert_eq!(
            MapLayer::States.shapefile(),
            Path::new("cb_2015_us_state_5m").join("cb_2015_us_state_5m.shp")
        );
    }

    #[test]
    fn test_missing_shapefiles_are_skipped() {
        let mapper = plate_carree_map();
        let viewport = mapper.viewport(40, None).unwrap();
        let mut canvas = mapper.new_canvas(&viewport);
        mapper.draw_layers(&mut canvas, &viewport).unwrap();
        assert!(canvas.pixels().chunks(4).all(|p| p == [255, 255, 255, 255]));
    }

    #[test]
    fn test_draw_shapes_strokes_and_fills() {
        let mapper = plate_carree_map().with_background(Color::rgb(0, 0, 0));
        let viewport = mapper.viewport(40, None).unwrap();
        let mut canvas = mapper.new_canvas(&viewport);

        let square = Polygon::new(PolygonRing::Outer(vec![
            Point::new(-5.0, -2.5),
            Point::new(-5.0, 2.5),
            Point::new(5.0, 2.5),
            Point::new(5.0, -2.5),
            Point::new(-5.0, -2.5),
        ]));
        let line = Polyline::new(vec![Point::new(-10.0, 0.0), Point::new(10.0, 0.0)]);
        let mut props = LayerProperties::stroke(1.0, Color::rgb(255, 0, 0), 1.0);
        props.fill = Some(Color::rgb(0, 0, 255));

        let shapes = vec![Shape::Polygon(square), Shape::Polyline(line), Shape::NullShape];
        assert_eq!(mapper.draw_shapes(&mut canvas, &viewport, &shapes, &props), 2);
        // inside the square, off the line
        assert_eq!(canvas.pixel(20, 6), Some([0, 0, 255, 255]));
        // on the horizontal line through the centre
        assert_eq!(canvas.pixel(2, 10), Some([255, 0, 0, 255]));
        // outside everything
        assert_eq!(canvas.pixel(1, 1), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_project_path_splits_on_gaps() {
        let mapper = Mapper::new(projection::Mercator::new(0.0, 0.0, 6_371_000.0), "/nonexistent")
            .with_extent(GeoBBox::new(-10.0, 10.0, -10.0, 10.0));
        let viewport = mapper.viewport(10, None).unwrap();
        let parts = mapper.project_path(&viewport, &[(0.0, 0.0), (0.0, 1.0), (0.0, 90.0), (1.0, 1.0)]);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 2);
    }
}
