//! Triangulated surface geometry.
//!
//! A [`Geometry`] is an indexed triangle list with optional per-vertex and
//! per-face normals. Loaders that do not supply normals leave them empty and
//! [`Geometry::ensure_normals`] fills them in before the mesh is uploaded.

use anyhow::bail;
use cgmath::{InnerSpace, Vector3, Zero};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    positions: Vec<[f32; 3]>,
    indices: Vec<u32>,
    normals: Option<Vec<[f32; 3]>>,
    face_normals: Option<Vec<[f32; 3]>>,
}

impl Geometry {
    /// Build a geometry from vertex positions and a triangle index list.
    ///
    /// Fails if the index count is not a multiple of three or if an index
    /// points past the end of `positions`.
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> anyhow::Result<Self> {
        if indices.len() % 3 != 0 {
            bail!(
                "index count {} is not a multiple of 3, geometry must be triangulated",
                indices.len()
            );
        }
        if let Some(idx) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            bail!(
                "index {} is out of bounds for {} vertices",
                idx,
                positions.len()
            );
        }
        Ok(Self {
            positions,
            indices,
            normals: None,
            face_normals: None,
        })
    }

    /// Attach per-vertex normals supplied by the loader.
    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> anyhow::Result<Self> {
        if normals.len() != self.positions.len() {
            bail!(
                "{} normals supplied for {} vertices",
                normals.len(),
                self.positions.len()
            );
        }
        self.normals = Some(normals);
        Ok(self)
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    pub fn face_normals(&self) -> Option<&[[f32; 3]]> {
        self.face_normals.as_deref()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    pub fn triangle_positions(&self, tri: [u32; 3]) -> [Vector3<f32>; 3] {
        tri.map(|i| Vector3::from(self.positions[i as usize]))
    }

    /// Recompute one unit normal per triangle.
    pub fn compute_face_normals(&mut self) {
        let normals = self
            .triangles()
            .map(|tri| {
                let n = unnormalized_normal(self.triangle_positions(tri));
                normalize_or_zero(n).into()
            })
            .collect();
        self.face_normals = Some(normals);
    }

    /// Recompute per-vertex normals as the area-weighted average of the
    /// normals of all triangles sharing the vertex.
    pub fn compute_vertex_normals(&mut self) {
        let mut accumulated = vec![Vector3::<f32>::zero(); self.positions.len()];
        for tri in self.triangles() {
            // the cross product's length is twice the triangle area
            let n = unnormalized_normal(self.triangle_positions(tri));
            for i in tri {
                accumulated[i as usize] += n;
            }
        }
        self.normals = Some(
            accumulated
                .into_iter()
                .map(|n| normalize_or_zero(n).into())
                .collect(),
        );
    }

    /// Compute whichever normals are missing. Existing normals are left alone.
    pub fn ensure_normals(&mut self) {
        if self.face_normals.is_none() {
            self.compute_face_normals();
        }
        if self.normals.is_none() {
            log::debug!(
                "geometry has no vertex normals, computing them for {} vertices",
                self.positions.len()
            );
            self.compute_vertex_normals();
        }
    }

    /// Append another geometry, rebasing its indices.
    ///
    /// Normals survive only if both sides carry them.
    pub fn merge(&mut self, other: Geometry) {
        let base = self.positions.len() as u32;
        let was_empty = self.positions.is_empty();
        self.normals = match (self.normals.take(), other.normals) {
            (Some(mut ours), Some(theirs)) => {
                ours.extend(theirs);
                Some(ours)
            }
            (None, Some(theirs)) if was_empty => Some(theirs),
            _ => None,
        };
        self.face_normals = None;
        self.positions.extend(other.positions);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }
}

fn unnormalized_normal([a, b, c]: [Vector3<f32>; 3]) -> Vector3<f32> {
    (c - b).cross(a - b)
}

fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    if v.magnitude2() > 0.0 {
        v.normalize()
    } else {
        Vector3::zero()
    }
}
