// Sample geometry: a box of material with per-axis boundary conditions.

use crate::error::{Error, Result};
use crate::material::Material;
use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Attempts allowed per cluster when placing clusters at random.
const PLACEMENT_ATTEMPTS_PER_CLUSTER: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryCondition {
    /// Ions leaving one face re-enter through the opposite face.
    Periodic,
    /// Ions leaving the box escape.
    Cut,
}

impl Default for BoundaryCondition {
    fn default() -> Self {
        BoundaryCondition::Periodic
    }
}

impl BoundaryCondition {
    /// Parse a boundary condition from a string, returning None for invalid strings
    pub fn from_str_option(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "periodic" | "pbc" => Some(BoundaryCondition::Periodic),
            "cut" => Some(BoundaryCondition::Cut),
            _ => None,
        }
    }

    /// Parse an `axis=condition` pair such as `x=cut` or `2=periodic`.
    pub fn parse_axis(s: &str) -> Result<(usize, Self)> {
        let invalid = || Error::InvalidParam(format!("boundary '{}' is not of the form x=cut", s));
        let (axis, bc) = s.split_once('=').ok_or_else(invalid)?;
        let axis = match axis.trim().to_lowercase().as_str() {
            "x" | "0" => 0,
            "y" | "1" => 1,
            "z" | "2" => 2,
            _ => return Err(invalid()),
        };
        let bc = BoundaryCondition::from_str_option(bc.trim()).ok_or_else(invalid)?;
        Ok((axis, bc))
    }
}

/// Material found at a point.
#[derive(Debug, Clone, Copy)]
pub struct MaterialHit<'a> {
    pub material: &'a Material,
    /// Stable index of the material within its sample.
    pub index: usize,
    /// Cluster the point lies in, if any.
    pub tag: Option<usize>,
}

/// Spatial layout of materials the transport engine moves ions through.
pub trait Sample {
    /// Box edge lengths (Å). The box spans `[0, width)` on every axis.
    fn width(&self) -> [f64; 3];

    fn boundary(&self, axis: usize) -> BoundaryCondition;

    /// Material at a point inside the box, `None` for vacuum.
    fn lookup_material(&self, pos: &[f64; 3]) -> Option<MaterialHit<'_>>;

    /// Map a position into the box across periodic axes.
    ///
    /// Returns `None` if the position lies outside a cut axis.
    fn fold(&self, pos: [f64; 3]) -> Option<[f64; 3]> {
        let w = self.width();
        let mut folded = pos;
        for axis in 0..3 {
            let p = pos[axis];
            match self.boundary(axis) {
                BoundaryCondition::Periodic => {
                    let mut q = p - (p / w[axis]).floor() * w[axis];
                    if q >= w[axis] {
                        q = 0.0;
                    }
                    folded[axis] = q;
                }
                BoundaryCondition::Cut => {
                    if !(p >= 0.0 && p < w[axis]) {
                        return None;
                    }
                }
            }
        }
        Some(folded)
    }

    /// Shortest image of a displacement across periodic axes.
    fn min_image(&self, delta: [f64; 3]) -> [f64; 3] {
        let w = self.width();
        let mut d = delta;
        for axis in 0..3 {
            if self.boundary(axis) == BoundaryCondition::Periodic {
                d[axis] -= (d[axis] / w[axis]).round() * w[axis];
            }
        }
        d
    }
}

fn validate_width(width: [f64; 3]) -> Result<()> {
    if width.iter().any(|w| !w.is_finite() || *w <= 0.0) {
        return Err(Error::InvalidParam(format!(
            "sample widths must be finite and > 0, got {:?}",
            width
        )));
    }
    Ok(())
}

fn prepared(mut material: Material) -> Result<Material> {
    if !material.is_prepared() {
        material.prepare()?;
    }
    Ok(material)
}

fn inside_box(pos: &[f64; 3], width: &[f64; 3]) -> bool {
    (0..3).all(|i| pos[i] >= 0.0 && pos[i] < width[i])
}

/// A box filled with a single material.
#[derive(Debug, Clone)]
pub struct HomogeneousSample {
    width: [f64; 3],
    bc: [BoundaryCondition; 3],
    material: Material,
}

impl HomogeneousSample {
    /// Create a periodic box; the material is prepared if necessary.
    pub fn new(width: [f64; 3], material: Material) -> Result<Self> {
        validate_width(width)?;
        Ok(HomogeneousSample {
            width,
            bc: [BoundaryCondition::Periodic; 3],
            material: prepared(material)?,
        })
    }

    pub fn with_boundary(mut self, axis: usize, bc: BoundaryCondition) -> Self {
        self.bc[axis] = bc;
        self
    }

    pub fn material(&self) -> &Material {
        &self.material
    }
}

impl Sample for HomogeneousSample {
    fn width(&self) -> [f64; 3] {
        self.width
    }

    fn boundary(&self, axis: usize) -> BoundaryCondition {
        self.bc[axis]
    }

    fn lookup_material(&self, pos: &[f64; 3]) -> Option<MaterialHit<'_>> {
        if !inside_box(pos, &self.width) {
            return None;
        }
        Some(MaterialHit {
            material: &self.material,
            index: 0,
            tag: None,
        })
    }
}

/// Spherical inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub center: [f64; 3],
    pub radius: f64,
}

/// A matrix material with embedded spherical clusters of a second material.
///
/// Material index 0 is the matrix and index 1 the cluster material. A point
/// inside cluster `i` reports tag `Some(i)`.
#[derive(Debug, Clone)]
pub struct ClusterSample {
    width: [f64; 3],
    bc: [BoundaryCondition; 3],
    matrix: Material,
    cluster_material: Material,
    clusters: Vec<Cluster>,
}

impl ClusterSample {
    pub fn new(width: [f64; 3], matrix: Material, cluster_material: Material) -> Result<Self> {
        validate_width(width)?;
        Ok(ClusterSample {
            width,
            bc: [BoundaryCondition::Periodic; 3],
            matrix: prepared(matrix)?,
            cluster_material: prepared(cluster_material)?,
            clusters: Vec::new(),
        })
    }

    pub fn with_boundary(mut self, axis: usize, bc: BoundaryCondition) -> Self {
        self.bc[axis] = bc;
        self
    }

    pub fn matrix(&self) -> &Material {
        &self.matrix
    }

    pub fn cluster_material(&self) -> &Material {
        &self.cluster_material
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Add a cluster and return its tag.
    pub fn add_cluster(&mut self, center: [f64; 3], radius: f64) -> Result<usize> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "cluster radius must be finite and > 0, got {}",
                radius
            )));
        }
        if !inside_box(&center, &self.width) {
            return Err(Error::InvalidParam(format!(
                "cluster center {:?} lies outside the sample",
                center
            )));
        }
        self.clusters.push(Cluster { center, radius });
        Ok(self.clusters.len() - 1)
    }

    fn distance(&self, a: &[f64; 3], b: &[f64; 3]) -> f64 {
        let d = self.min_image([a[0] - b[0], a[1] - b[1], a[2] - b[2]]);
        (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
    }

    /// Place up to `n` clusters of `radius` at random positions such that
    /// cluster surfaces stay at least `min_gap` apart.
    ///
    /// Returns the number actually placed; gives up after a bounded number
    /// of rejected positions.
    pub fn add_random_clusters<R: Rng>(
        &mut self,
        n: usize,
        radius: f64,
        min_gap: f64,
        rng: &mut R,
    ) -> Result<usize> {
        if !min_gap.is_finite() || min_gap < 0.0 {
            return Err(Error::InvalidParam(format!(
                "cluster gap must be finite and >= 0, got {}",
                min_gap
            )));
        }
        let max_attempts = n.saturating_mul(PLACEMENT_ATTEMPTS_PER_CLUSTER);
        let mut placed = 0;
        let mut attempts = 0;
        while placed < n && attempts < max_attempts {
            attempts += 1;
            let center = [
                rng.gen::<f64>() * self.width[0],
                rng.gen::<f64>() * self.width[1],
                rng.gen::<f64>() * self.width[2],
            ];
            let overlaps = self.clusters.iter().any(|c| {
                self.distance(&c.center, &center) < c.radius + radius + min_gap
            });
            if overlaps {
                continue;
            }
            self.add_cluster(center, radius)?;
            placed += 1;
        }
        if placed < n {
            warn!(
                "placed only {} of {} clusters after {} attempts",
                placed, n, attempts
            );
        }
        Ok(placed)
    }

    /// Fraction of the box volume occupied by clusters.
    pub fn cluster_volume_fraction(&self) -> f64 {
        let v_box = self.width[0] * self.width[1] * self.width[2];
        let v_cl: f64 = self
            .clusters
            .iter()
            .map(|c| 4.0 / 3.0 * std::f64::consts::PI * c.radius.powi(3))
            .sum();
        v_cl / v_box
    }
}

impl Sample for ClusterSample {
    fn width(&self) -> [f64; 3] {
        self.width
    }

    fn boundary(&self, axis: usize) -> BoundaryCondition {
        self.bc[axis]
    }

    fn lookup_material(&self, pos: &[f64; 3]) -> Option<MaterialHit<'_>> {
        if !inside_box(pos, &self.width) {
            return None;
        }
        for (i, cluster) in self.clusters.iter().enumerate() {
            if self.distance(&cluster.center, pos) < cluster.radius {
                return Some(MaterialHit {
                    material: &self.cluster_material,
                    index: 1,
                    tag: Some(i),
                });
            }
        }
        Some(MaterialHit {
            material: &self.matrix,
            index: 0,
            tag: None,
        })
    }
}
