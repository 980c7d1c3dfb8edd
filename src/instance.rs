//! Module for parsing and representing Euclidean TSP instances.
//!
//! This module handles the TSP-LIB format files (`NODE_COORD_SECTION`, `EUC_2D`).
//! Points are stored in an arena indexed by their 0-based id, which is the identity
//! every tour, segment and branch refers to.

use crate::error::{Error, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// A point of the instance. Immutable once loaded and shared by every branch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Point identifier (1-indexed in files, 0-indexed internally)
    pub id: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Point { id, x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Represents a complete Euclidean TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TSPInstance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Number of points
    pub dimension: usize,
    /// All points, `points[i].id == i`
    pub points: Vec<Point>,
}

impl TSPInstance {
    /// Build an instance from raw coordinates; ids follow slice order.
    pub fn from_coords(name: &str, coords: &[(f64, f64)]) -> Self {
        let points: Vec<Point> = coords
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| Point::new(id, x, y))
            .collect();

        TSPInstance {
            name: name.to_string(),
            comment: String::new(),
            dimension: points.len(),
            points,
        }
    }

    /// Uniformly random points in `[0, side) x [0, side)`. Deterministic via seed.
    pub fn random_uniform(n: usize, side: f64, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let coords: Vec<(f64, f64)> = (0..n)
            .map(|_| (rng.gen_range(0.0..side), rng.gen_range(0.0..side)))
            .collect();

        let mut instance = Self::from_coords(&format!("random-{}-{}", n, seed), &coords);
        instance.comment = format!("{} uniform points, side {}, seed {}", n, side, seed);
        instance
    }

    /// Parse an instance from a TSP-LIB format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let mut instance = Self::from_reader(BufReader::new(file))?;

        if instance.name.is_empty() {
            instance.name = path
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
        }

        Ok(instance)
    }

    /// Parse TSP-LIB content from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension: Option<usize> = None;
        let mut coords: Vec<(usize, f64, f64)> = Vec::new();
        let mut in_coords = false;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line == "EOF" {
                continue;
            }

            if let Some((key, value)) = header_field(line) {
                match key {
                    "NAME" => name = value.to_string(),
                    "COMMENT" => comment = value.to_string(),
                    "DIMENSION" => {
                        dimension = Some(value.parse().map_err(|_| Error::parse(line_no, "Invalid dimension"))?);
                    }
                    "EDGE_WEIGHT_TYPE" => {
                        if value != "EUC_2D" {
                            log::warn!("EDGE_WEIGHT_TYPE {} treated as EUC_2D", value);
                        }
                    }
                    _ => {}
                }
                continue;
            }

            if line.starts_with("NODE_COORD_SECTION") {
                in_coords = true;
                continue;
            }
            if line.ends_with("_SECTION") {
                in_coords = false;
                continue;
            }

            if in_coords {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < 3 {
                    return Err(Error::parse(line_no, "Expected `id x y`"));
                }
                let id: usize = parts[0].parse().map_err(|_| Error::parse(line_no, "Invalid node id"))?;
                let x: f64 = parts[1].parse().map_err(|_| Error::parse(line_no, "Invalid x coordinate"))?;
                let y: f64 = parts[2].parse().map_err(|_| Error::parse(line_no, "Invalid y coordinate"))?;
                coords.push((id, x, y));
            }
        }

        if let Some(declared) = dimension {
            if declared != coords.len() {
                return Err(Error::invalid_instance(format!(
                    "DIMENSION is {} but {} coordinates were read",
                    declared,
                    coords.len()
                )));
            }
        }

        // File ids are 1-based labels; the arena is indexed by file order.
        let points: Vec<Point> = coords
            .iter()
            .enumerate()
            .map(|(id, &(_, x, y))| Point::new(id, x, y))
            .collect();

        Ok(TSPInstance {
            name,
            comment,
            dimension: points.len(),
            points,
        })
    }

    /// Render the instance in TSP-LIB format
    pub fn to_tsplib(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("NAME : {}\n", self.name));
        if !self.comment.is_empty() {
            out.push_str(&format!("COMMENT : {}\n", self.comment));
        }
        out.push_str("TYPE : TSP\n");
        out.push_str(&format!("DIMENSION : {}\n", self.dimension));
        out.push_str("EDGE_WEIGHT_TYPE : EUC_2D\n");
        out.push_str("NODE_COORD_SECTION\n");
        for p in &self.points {
            out.push_str(&format!("{} {} {}\n", p.id + 1, p.x, p.y));
        }
        out.push_str("EOF\n");
        out
    }

    /// Write the instance to a TSP-LIB file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(self.to_tsplib().as_bytes())?;
        Ok(())
    }

    /// Get the distance between two points
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.points[i].distance_to(&self.points[j])
    }

    /// Calculate total closed tour length
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }

        let mut length = 0.0;
        for i in 0..tour.len() - 1 {
            length += self.distance(tour[i], tour[i + 1]);
        }

        length += self.distance(tour[tour.len() - 1], tour[0]);

        length
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in &self.points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        let mut distances: Vec<f64> = Vec::new();
        for i in 0..self.dimension {
            for j in i + 1..self.dimension {
                distances.push(self.distance(i, j));
            }
        }
        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);

        InstanceStatistics {
            name: self.name.clone(),
            dimension: self.dimension,
            width: if self.points.is_empty() { 0.0 } else { max_x - min_x },
            height: if self.points.is_empty() { 0.0 } else { max_y - min_y },
            avg_distance,
            max_distance,
        }
    }
}

/// Splits `KEY: value` and `KEY : value` header lines
fn header_field(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
        return None;
    }
    Some((key, value.trim()))
}

/// Statistics about a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub width: f64,
    pub height: f64,
    pub avg_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Points: {}", self.dimension)?;
        writeln!(f, "  Bounding box: {:.2} x {:.2}", self.width, self.height)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}
