//! Sampled data for external 3-D rendering of the integrand and the integration region.
//!
//! Nothing here affects an integral's value: non-finite points are dropped, not zeroed,
//! and the sampler can run even when both integrators failed. Surface slices and scatter
//! samples are produced lazily by iterators; [`Sampler::payload`] collects everything.
use crate::errors::IntegraError;
use crate::symbolic::coordinate_transform::{CoordinateSystem, to_cartesian};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::Lambda;
use crate::symbolic::symbolic_triple::IntegrationLimits;
use crate::symbolic::utils::linspace;
use chrono::Local;
use csv::Writer;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};

pub const MAX_SURFACE_SLICES: usize = 8;
pub const MAX_SCATTER_POINTS: usize = 500;

/// Edges of the bound box as vertex index pairs: bottom face, top face, verticals.
pub const BOX_EDGES: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// A finite function value at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    /// slot coordinates (native variables of the system)
    pub native: [f64; 3],
    /// the same point in the Cartesian display frame
    pub position: [f64; 3],
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSlice {
    /// value of the z-slot variable on this slice
    pub level: f64,
    pub points: Vec<SamplePoint>,
}

fn sample_at(function: &Lambda, system: CoordinateSystem, native: [f64; 3]) -> Option<SamplePoint> {
    let value = function.eval(&native);
    value.is_finite().then(|| SamplePoint {
        native,
        position: to_cartesian(system, native),
        value,
    })
}

/// Evenly spaced levels of the z-slot, each a `resolution × resolution` grid over the x/y slots.
pub struct SurfaceSlices<'a> {
    function: &'a Lambda,
    system: CoordinateSystem,
    x_grid: Vec<f64>,
    y_grid: Vec<f64>,
    levels: std::vec::IntoIter<f64>,
}

impl Iterator for SurfaceSlices<'_> {
    type Item = SurfaceSlice;

    fn next(&mut self) -> Option<SurfaceSlice> {
        let level = self.levels.next()?;
        let mut points = Vec::with_capacity(self.x_grid.len() * self.y_grid.len());
        for &v in &self.y_grid {
            for &u in &self.x_grid {
                if let Some(point) = sample_at(self.function, self.system, [u, v, level]) {
                    points.push(point);
                }
            }
        }
        Some(SurfaceSlice { level, points })
    }
}

/// Uniform random points of the box; draws whose value is not finite are skipped.
pub struct ScatterSamples<'a> {
    function: &'a Lambda,
    system: CoordinateSystem,
    bounds: [(f64, f64); 3],
    rng: StdRng,
    remaining: usize,
}

impl Iterator for ScatterSamples<'_> {
    type Item = SamplePoint;

    fn next(&mut self) -> Option<SamplePoint> {
        while self.remaining > 0 {
            self.remaining -= 1;
            let native = self
                .bounds
                .map(|(lo, hi)| lo + (hi - lo) * self.rng.random::<f64>());
            if let Some(point) = sample_at(self.function, self.system, native) {
                return Some(point);
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionWireframe {
    /// box corners in slot coordinates
    pub native_vertices: [[f64; 3]; 8],
    /// box corners in the Cartesian display frame
    pub vertices: [[f64; 3]; 8],
    pub edges: [[usize; 2]; 12],
}

impl RegionWireframe {
    pub fn new(bounds: [(f64, f64); 3], system: CoordinateSystem) -> Self {
        let [(x0, x1), (y0, y1), (z0, z1)] = bounds;
        let native_vertices = [
            [x0, y0, z0],
            [x1, y0, z0],
            [x1, y1, z0],
            [x0, y1, z0],
            [x0, y0, z1],
            [x1, y0, z1],
            [x1, y1, z1],
            [x0, y1, z1],
        ];
        RegionWireframe {
            native_vertices,
            vertices: native_vertices.map(|vertex| to_cartesian(system, vertex)),
            edges: BOX_EDGES,
        }
    }

    /// (start, end) of every edge in the display frame
    pub fn lines(&self) -> impl Iterator<Item = ([f64; 3], [f64; 3])> + '_ {
        self.edges
            .iter()
            .map(|&[a, b]| (self.vertices[a], self.vertices[b]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStatistics {
    pub num_surface_slices: usize,
    pub num_sample_points: usize,
    /// range of the scatter sample values; 0 when there are none
    pub function_min: f64,
    pub function_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationPayload {
    pub coordinate_system: CoordinateSystem,
    pub resolution: usize,
    pub bounds: [(f64, f64); 3],
    pub surface_slices: Vec<SurfaceSlice>,
    pub scatter_points: Vec<SamplePoint>,
    pub wireframe: RegionWireframe,
    pub statistics: SampleStatistics,
}

impl VisualizationPayload {
    /// Writes the scatter points to `<dir>/samples_<system>_<timestamp>.csv` and returns the path.
    pub fn save_samples_csv(&self, dir: &Path) -> Result<PathBuf, IntegraError> {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = dir.join(format!(
            "samples_{}_{}.csv",
            self.coordinate_system, date_and_time
        ));
        let labels = self.coordinate_system.spec().slot_variables;
        let mut wtr = Writer::from_path(&path)?;
        wtr.write_record([labels[0], labels[1], labels[2], "x", "y", "z", "value"])?;
        for point in &self.scatter_points {
            let [u, v, w] = point.native;
            let [x, y, z] = point.position;
            wtr.write_record(
                [u, v, w, x, y, z, point.value].map(|number| number.to_string()),
            )?;
        }
        wtr.flush()?;
        info!(
            "{} samples saved to {}",
            self.scatter_points.len(),
            path.display()
        );
        Ok(path)
    }
}

/// Compiled integrand plus the box; hands out the lazy sample sequences.
pub struct Sampler {
    function: Lambda,
    system: CoordinateSystem,
    bounds: [(f64, f64); 3],
    resolution: usize,
    seed: u64,
}

impl Sampler {
    /// `expr` is written in the native variables of `system`. A zero resolution is raised to 1.
    pub fn new(
        expr: &Expr,
        limits: &IntegrationLimits,
        system: CoordinateSystem,
        resolution: usize,
        seed: u64,
    ) -> Result<Self, IntegraError> {
        Ok(Sampler {
            function: expr.compile(&system.spec().slot_variables)?,
            system,
            bounds: limits.numeric()?,
            resolution: resolution.max(1),
            seed,
        })
    }

    pub fn surface_slices(&self) -> SurfaceSlices<'_> {
        let [(x0, x1), (y0, y1), (z0, z1)] = self.bounds;
        let count = (self.resolution / 4).clamp(1, MAX_SURFACE_SLICES);
        SurfaceSlices {
            function: &self.function,
            system: self.system,
            x_grid: linspace(x0, x1, self.resolution),
            y_grid: linspace(y0, y1, self.resolution),
            levels: linspace(z0, z1, count).into_iter(),
        }
    }

    pub fn scatter_samples(&self) -> ScatterSamples<'_> {
        ScatterSamples {
            function: &self.function,
            system: self.system,
            bounds: self.bounds,
            rng: StdRng::seed_from_u64(self.seed),
            remaining: (self.resolution * 5).min(MAX_SCATTER_POINTS),
        }
    }

    pub fn wireframe(&self) -> RegionWireframe {
        RegionWireframe::new(self.bounds, self.system)
    }

    pub fn payload(&self) -> VisualizationPayload {
        let surface_slices: Vec<SurfaceSlice> = self.surface_slices().collect();
        let scatter_points: Vec<SamplePoint> = self.scatter_samples().collect();
        let (function_min, function_max) = if scatter_points.is_empty() {
            (0.0, 0.0)
        } else {
            scatter_points
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                    (lo.min(p.value), hi.max(p.value))
                })
        };
        let statistics = SampleStatistics {
            num_surface_slices: surface_slices.len(),
            num_sample_points: scatter_points.len(),
            function_min,
            function_max,
        };
        VisualizationPayload {
            coordinate_system: self.system,
            resolution: self.resolution,
            bounds: self.bounds,
            surface_slices,
            scatter_points,
            wireframe: self.wireframe(),
            statistics,
        }
    }
}
