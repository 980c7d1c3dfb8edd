//! Visualization utilities for tours.
//!
//! Generates SVG drawings of a tour, with the convex perimeter points styled apart
//! from the interior points the search inserted, and plain-text exports for plotting.

use crate::error::{Error, Result};
use crate::heuristics::perimeter::Perimeter;
use crate::instance::TSPInstance;
use crate::solution::Solution;
use std::fs::File;
use std::io::Write;
use std::path::Path;
#[cfg(not(feature = "png"))]
use std::process::Command;
#[cfg(feature = "png")]
use resvg::tiny_skia::{Pixmap, Transform};
#[cfg(feature = "png")]
use resvg::usvg::{self, TreeParsing};
#[cfg(feature = "png")]
use resvg::{render, FitTo};

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Point radius
    pub point_radius: f64,
    /// Draw point ids next to the points
    pub labels: bool,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            point_radius: 5.0,
            labels: true,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate SVG visualization of a solution
    pub fn generate_svg(&self, instance: &TSPInstance, solution: &Solution, perimeter: &Perimeter) -> String {
        let mut svg = String::new();

        let (min_x, max_x, min_y, max_y) = self.get_bounds(instance);
        let scale_x = (self.width - 2.0 * self.margin) / (max_x - min_x).max(1e-9);
        let scale_y = (self.height - 2.0 * self.margin) / (max_y - min_y).max(1e-9);
        let scale = scale_x.min(scale_y);

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .pinned {{ fill: #e74c3c; stroke: #c0392b; stroke-width: 2; }}
    .interior {{ fill: #3498db; stroke: #2c3e50; stroke-width: 1; }}
    .hull {{ stroke: #e74c3c; stroke-width: 1; stroke-dasharray: 4,4; fill: none; }}
    .edge {{ stroke: #34495e; stroke-width: 2; fill: none; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">Instance: {} | Length: {:.2} | Clones: {} | Complete: {}</text>
"##,
            self.margin, instance.name, solution.cost, solution.clone_count, solution.complete
        ));

        let transform = |x: f64, y: f64| -> (f64, f64) {
            let tx = self.margin + (x - min_x) * scale;
            let ty = self.height - self.margin - (y - min_y) * scale;
            (tx, ty)
        };

        let polyline = |ids: &[usize]| -> String {
            ids.iter()
                .chain(ids.first())
                .map(|&id| {
                    let (x, y) = transform(instance.points[id].x, instance.points[id].y);
                    format!("{:.2},{:.2}", x, y)
                })
                .collect::<Vec<_>>()
                .join(" ")
        };

        if perimeter.order.len() > 2 {
            svg.push_str(&format!(
                "<polyline points=\"{}\" class=\"hull\"/>\n",
                polyline(&perimeter.order)
            ));
        }
        if solution.tour.len() > 1 {
            svg.push_str(&format!(
                "<polyline points=\"{}\" class=\"edge\"/>\n",
                polyline(&solution.tour)
            ));
        }

        for point in &instance.points {
            let (x, y) = transform(point.x, point.y);
            let class = if perimeter.is_pinned(point.id) { "pinned" } else { "interior" };

            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
"##,
                x, y, self.point_radius, class
            ));

            if self.labels {
                svg.push_str(&format!(
                    r##"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                    x,
                    y - self.point_radius - 3.0,
                    point.id + 1
                ));
            }
        }

        let legend_y = self.height - 30.0;
        svg.push_str(&format!(
            r##"<circle cx="{}" cy="{}" r="6" class="pinned"/>
<text x="{}" y="{}" class="label">Perimeter</text>
<circle cx="{}" cy="{}" r="6" class="interior"/>
<text x="{}" y="{}" class="label">Interior</text>
"##,
            self.margin + 6.0,
            legend_y + 6.0,
            self.margin + 20.0,
            legend_y + 10.0,
            self.margin + 106.0,
            legend_y + 6.0,
            self.margin + 120.0,
            legend_y + 10.0
        ));

        svg.push_str("</svg>");
        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Save SVG as PNG. Uses resvg with the `png` feature, external converters otherwise.
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> Result<()> {
        #[cfg(feature = "png")]
        {
            self.render_native(svg, path.as_ref())
        }
        #[cfg(not(feature = "png"))]
        {
            convert_external(svg, path.as_ref())
        }
    }

    #[cfg(feature = "png")]
    fn render_native(&self, svg: &str, path: &Path) -> Result<()> {
        let opt = usvg::Options::default();
        let rtree = usvg::Tree::from_str(svg, &opt).map_err(|e| render_error(format!("usvg parse error: {}", e)))?;
        let mut pixmap = Pixmap::new((self.width as u32).max(1), (self.height as u32).max(1))
            .ok_or_else(|| render_error("failed to create pixmap".to_string()))?;
        render(&rtree, FitTo::Original, Transform::default(), pixmap.as_mut())
            .ok_or_else(|| render_error("resvg render failed".to_string()))?;
        pixmap
            .save_png(path)
            .map_err(|e| render_error(format!("save_png failed: {}", e)))
    }

    /// Get coordinate bounds
    fn get_bounds(&self, instance: &TSPInstance) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for point in &instance.points {
            min_x = min_x.min(point.x);
            max_x = max_x.max(point.x);
            min_y = min_y.min(point.y);
            max_y = max_y.max(point.y);
        }

        if instance.points.is_empty() {
            return (0.0, 1.0, 0.0, 1.0);
        }
        (min_x, max_x, min_y, max_y)
    }

    /// Export data for external plotting (e.g., matplotlib)
    pub fn export_plot_data(&self, instance: &TSPInstance, solution: &Solution, perimeter: &Perimeter) -> String {
        let mut data = String::new();

        data.push_str("# Tour Data\n");
        data.push_str(&format!("# Instance: {}\n", instance.name));
        data.push_str(&format!("# Length: {:.4}\n", solution.cost));
        data.push_str(&format!("# Clones: {}\n\n", solution.clone_count));

        data.push_str("# Points: id, x, y, pinned\n");
        for point in &instance.points {
            data.push_str(&format!(
                "{},{},{},{}\n",
                point.id,
                point.x,
                point.y,
                perimeter.is_pinned(point.id)
            ));
        }

        data.push_str("\n# Tour: sequence of point ids\n");
        let tour_str: Vec<String> = solution.tour.iter().map(|n| n.to_string()).collect();
        data.push_str(&tour_str.join(","));
        data.push('\n');

        data
    }
}

#[cfg(feature = "png")]
fn render_error(message: String) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::Other, message))
}

/// Writes a temporary SVG and tries `rsvg-convert`, then `magick convert`, then `inkscape`.
#[cfg(not(feature = "png"))]
fn convert_external(svg: &str, path: &Path) -> Result<()> {
    let tmp_svg = path.with_extension("svg.tmp");
    std::fs::write(&tmp_svg, svg)?;
    let out = path.to_string_lossy().to_string();
    let tmp = tmp_svg.to_string_lossy().to_string();
    let (out, tmp) = (out.as_str(), tmp.as_str());

    let attempts: [(&str, Vec<&str>); 3] = [
        ("rsvg-convert", vec!["-o", out, tmp]),
        ("magick", vec!["convert", tmp, out]),
        ("inkscape", vec![tmp, "--export-type=png", "--export-filename", out]),
    ];
    for (program, args) in attempts.iter() {
        if let Ok(status) = Command::new(program).args(args).status() {
            if status.success() {
                let _ = std::fs::remove_file(&tmp_svg);
                return Ok(());
            }
        }
        log::debug!("{} unavailable or failed", program);
    }

    let _ = std::fs::remove_file(&tmp_svg);
    Err(Error::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "No SVG->PNG converter succeeded (tried rsvg-convert, magick, inkscape)",
    )))
}

/// Generate comparison plot data for multiple solutions
pub fn generate_comparison_data(solutions: &[Solution]) -> String {
    let mut data = String::new();

    data.push_str("# Algorithm Comparison\n");
    data.push_str("algorithm,length,time,clones,complete\n");

    for sol in solutions {
        data.push_str(&format!(
            "{},{:.4},{:.4},{},{}\n",
            sol.algorithm, sol.cost, sol.computation_time, sol.clone_count, sol.complete
        ));
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::perimeter::build_perimeter;

    fn create_test_instance() -> TSPInstance {
        TSPInstance::from_coords("test", &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (1.0, 2.0)])
    }

    #[test]
    fn test_visualizer() {
        let instance = create_test_instance();
        let perimeter = build_perimeter(&instance.points);
        let solution = Solution::from_tour(&instance, vec![0, 1, 2, 3, 4], "test");

        let viz = Visualizer::new();
        let svg = viz.generate_svg(&instance, &solution, &perimeter);

        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("Instance: test"));
        // four perimeter points plus the legend marker
        assert_eq!(svg.matches("class=\"pinned\"").count(), 5);
        assert_eq!(svg.matches("class=\"interior\"").count(), 2);
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_plot_data() {
        let instance = create_test_instance();
        let perimeter = build_perimeter(&instance.points);
        let solution = Solution::from_tour(&instance, vec![0, 1, 2, 3, 4], "test");

        let data = Visualizer::new().export_plot_data(&instance, &solution, &perimeter);
        assert!(data.contains("4,1,2,false"));
        assert!(data.contains("0,0,0,true"));
        assert!(data.contains("0,1,2,3,4"));

        let comparison = generate_comparison_data(&[solution]);
        assert_eq!(comparison.lines().count(), 3);
    }
}
