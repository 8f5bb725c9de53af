use geo_types::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::Serialize;

use crate::error::GeometryError;

const MOVE_TO: u32 = 1;
const LINE_TO: u32 = 2;
const CLOSE_PATH: u32 = 7;

const MIN_LINE_POINTS: usize = 2;
// Includes the closing point appended by ClosePath
const MIN_RING_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    /// Maps the wire `GeomType` enum; `UNKNOWN` (0) and anything else is `None`.
    pub fn from_wire(value: u64) -> Option<Self> {
        match value {
            1 => Some(GeometryKind::Point),
            2 => Some(GeometryKind::Line),
            3 => Some(GeometryKind::Polygon),
            _ => None,
        }
    }
}

/// Ring orientation policy for the layer being decoded.
///
/// Version 2 layers are always `Standard` (positive area is an exterior ring).
/// Version 1 layers start `Unknown` and adopt the orientation of their first
/// polygon ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Winding {
    #[default]
    Unknown,
    Standard,
    Reversed,
}

/// Decoded geometry in tile-local integer coordinates.
///
/// `sizes` holds the length of every part (point, line or ring) in order, so
/// `coordinates.len() == sizes.iter().sum()`. Polygon rings always follow the
/// standard orientation: positive signed area is an exterior ring, negative a
/// hole belonging to the preceding exterior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub coordinates: Vec<Coord<i32>>,
    pub sizes: Vec<usize>,
}

impl Geometry {
    pub fn parts(&self) -> impl Iterator<Item = &[Coord<i32>]> + '_ {
        self.sizes.iter().scan(0usize, move |start, &len| {
            let part = &self.coordinates[*start..*start + len];
            *start += len;
            Some(part)
        })
    }

    /// Signed area of the ring at `index`, or `None` for non-polygons.
    pub fn ring_area(&self, index: usize) -> Option<f64> {
        if self.kind != GeometryKind::Polygon {
            return None;
        }
        self.parts()
            .nth(index)
            .map(|ring| signed_area_x2(ring) as f64 / 2.0)
    }

    /// Converts to `geo_types`, scaling coordinates by `1 / extent` so the
    /// tile covers the unit square (y pointing down).
    pub fn to_geo(&self, extent: u32) -> geo_types::Geometry<f64> {
        let scale = 1.0 / extent.max(1) as f64;
        let to_coord = |c: &Coord<i32>| Coord {
            x: c.x as f64 * scale,
            y: c.y as f64 * scale,
        };

        match self.kind {
            GeometryKind::Point => {
                let mut points: Vec<Point<f64>> =
                    self.coordinates.iter().map(|c| Point::from(to_coord(c))).collect();
                if points.len() == 1 {
                    geo_types::Geometry::Point(points.remove(0))
                } else {
                    geo_types::Geometry::MultiPoint(MultiPoint::new(points))
                }
            }
            GeometryKind::Line => {
                let mut lines: Vec<LineString<f64>> = self
                    .parts()
                    .map(|part| LineString::new(part.iter().map(to_coord).collect()))
                    .collect();
                if lines.len() == 1 {
                    geo_types::Geometry::LineString(lines.remove(0))
                } else {
                    geo_types::Geometry::MultiLineString(MultiLineString::new(lines))
                }
            }
            GeometryKind::Polygon => {
                let mut rings: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
                for part in self.parts() {
                    let ring = LineString::new(part.iter().map(to_coord).collect());
                    if signed_area_x2(part) < 0 {
                        if let Some((_, holes)) = rings.last_mut() {
                            holes.push(ring);
                            continue;
                        }
                    }
                    rings.push((ring, Vec::new()));
                }
                let mut polygons: Vec<Polygon<f64>> = rings
                    .into_iter()
                    .map(|(exterior, holes)| Polygon::new(exterior, holes))
                    .collect();
                if polygons.len() == 1 {
                    geo_types::Geometry::Polygon(polygons.remove(0))
                } else {
                    geo_types::Geometry::MultiPolygon(MultiPolygon::new(polygons))
                }
            }
        }
    }
}

/// Twice the signed area of a closed ring (surveyor's formula, tile space).
pub fn signed_area_x2(ring: &[Coord<i32>]) -> i64 {
    ring.windows(2)
        .map(|w| w[0].x as i64 * w[1].y as i64 - w[1].x as i64 * w[0].y as i64)
        .sum()
}

#[inline]
fn zigzag(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

fn next_point(
    stream: &mut impl Iterator<Item = u32>,
    cursor: Coord<i32>,
) -> Result<Coord<i32>, GeometryError> {
    let (Some(dx), Some(dy)) = (stream.next(), stream.next()) else {
        return Err(GeometryError::TruncatedParameters);
    };
    Ok(Coord {
        x: cursor
            .x
            .checked_add(zigzag(dx))
            .ok_or(GeometryError::CoordinateOverflow)?,
        y: cursor
            .y
            .checked_add(zigzag(dy))
            .ok_or(GeometryError::CoordinateOverflow)?,
    })
}

/// Decodes a feature's command stream.
///
/// Degenerate parts are dropped silently; a stream that breaks the command
/// grammar is an error, as is one that leaves no part at all.
pub fn decode_geometry(
    commands: &[u32],
    kind: GeometryKind,
    winding: &mut Winding,
) -> Result<Geometry, GeometryError> {
    let mut builder = GeometryBuilder::new(kind, winding);
    let mut cursor = Coord { x: 0, y: 0 };
    let mut stream = commands.iter().copied();

    while let Some(command) = stream.next() {
        let id = command & 0x7;
        let count = command >> 3;

        match id {
            MOVE_TO => {
                if count == 0 {
                    return Err(GeometryError::ZeroCount(id));
                }
                if kind != GeometryKind::Point && count != 1 {
                    return Err(GeometryError::InvalidMoveTo(count));
                }
                for _ in 0..count {
                    cursor = next_point(&mut stream, cursor)?;
                    builder.move_to(cursor);
                }
            }
            LINE_TO => {
                if kind == GeometryKind::Point {
                    return Err(GeometryError::UnexpectedCommand { command: id, kind });
                }
                if count == 0 {
                    return Err(GeometryError::ZeroCount(id));
                }
                if !builder.has_open_part() {
                    return Err(GeometryError::MissingMoveTo(id));
                }
                for _ in 0..count {
                    cursor = next_point(&mut stream, cursor)?;
                    builder.line_to(cursor);
                }
            }
            CLOSE_PATH => {
                if kind != GeometryKind::Polygon {
                    return Err(GeometryError::UnexpectedCommand { command: id, kind });
                }
                if count != 1 {
                    return Err(GeometryError::InvalidClosePath(count));
                }
                if !builder.has_open_part() {
                    return Err(GeometryError::MissingMoveTo(id));
                }
                builder.close_path();
            }
            other => return Err(GeometryError::UnknownCommand(other)),
        }
    }

    builder.finish()
}

struct GeometryBuilder<'w> {
    kind: GeometryKind,
    winding: &'w mut Winding,
    coordinates: Vec<Coord<i32>>,
    sizes: Vec<usize>,
    part: Vec<Coord<i32>>,
    closed: bool,
    has_exterior: bool,
}

impl<'w> GeometryBuilder<'w> {
    fn new(kind: GeometryKind, winding: &'w mut Winding) -> Self {
        Self {
            kind,
            winding,
            coordinates: Vec::new(),
            sizes: Vec::new(),
            part: Vec::new(),
            closed: false,
            has_exterior: false,
        }
    }

    fn has_open_part(&self) -> bool {
        !self.part.is_empty() && !self.closed
    }

    fn move_to(&mut self, point: Coord<i32>) {
        if self.kind == GeometryKind::Point {
            self.coordinates.push(point);
            self.sizes.push(1);
            return;
        }
        self.finish_part();
        self.part.push(point);
    }

    fn line_to(&mut self, point: Coord<i32>) {
        self.part.push(point);
    }

    fn close_path(&mut self) {
        let start = self.part[0];
        self.part.push(start);
        self.closed = true;
    }

    fn finish_part(&mut self) {
        let keep = match self.kind {
            GeometryKind::Point => false,
            GeometryKind::Line => self.part.len() >= MIN_LINE_POINTS,
            GeometryKind::Polygon => self.accept_ring(),
        };
        if keep {
            self.coordinates.extend_from_slice(&self.part);
            self.sizes.push(self.part.len());
        }
        self.part.clear();
        self.closed = false;
    }

    fn accept_ring(&mut self) -> bool {
        if !self.closed || self.part.len() < MIN_RING_POINTS {
            return false;
        }
        let mut area = signed_area_x2(&self.part);
        if area == 0 {
            return false;
        }
        if *self.winding == Winding::Unknown {
            *self.winding = if area > 0 {
                Winding::Standard
            } else {
                Winding::Reversed
            };
        }
        if *self.winding == Winding::Reversed {
            self.part.reverse();
            area = -area;
        }
        if area > 0 {
            self.has_exterior = true;
            true
        } else {
            // a hole needs an exterior ring to belong to
            self.has_exterior
        }
    }

    fn finish(mut self) -> Result<Geometry, GeometryError> {
        self.finish_part();
        if self.sizes.is_empty() {
            return Err(GeometryError::Empty);
        }
        Ok(Geometry {
            kind: self.kind,
            coordinates: self.coordinates,
            sizes: self.sizes,
        })
    }
}
