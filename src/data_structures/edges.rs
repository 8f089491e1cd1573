//! Edge-outline geometry.
//!
//! Derives the line segments drawn on top of a mesh: every boundary edge and
//! every edge whose two adjacent faces meet at more than a threshold angle.
//! Edges shared by coplanar triangles (the diagonal of a quad, for example)
//! are dropped.

use std::collections::HashMap;

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::geometry::Geometry;

/// Vertices closer than this are treated as the same point when pairing edges.
const MERGE_PRECISION: f32 = 1e4;

type PointKey = (i64, i64, i64);

struct HalfEdge {
    a: [f32; 3],
    b: [f32; 3],
    normal: Vector3<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgesGeometry {
    segments: Vec<[[f32; 3]; 2]>,
}

impl EdgesGeometry {
    pub fn new(geometry: &Geometry, threshold_angle_deg: f32) -> Self {
        let threshold_dot = threshold_angle_deg.to_radians().cos();
        let mut open: HashMap<(PointKey, PointKey), HalfEdge> = HashMap::new();
        let mut segments = Vec::new();

        for tri in geometry.triangles() {
            let [p0, p1, p2] = geometry.triangle_positions(tri);
            let normal = (p2 - p1).cross(p0 - p1);
            if normal.magnitude2() == 0.0 {
                continue;
            }
            let normal = normal.normalize();
            let corners = tri.map(|i| geometry.positions()[i as usize]);
            let keys = corners.map(quantize);
            if keys[0] == keys[1] || keys[1] == keys[2] || keys[2] == keys[0] {
                continue;
            }

            for j in 0..3 {
                let next = (j + 1) % 3;
                let (ka, kb) = (keys[j], keys[next]);
                match open.remove(&(kb, ka)) {
                    Some(twin) => {
                        if normal.dot(twin.normal) <= threshold_dot {
                            segments.push([twin.a, twin.b]);
                        }
                    }
                    None => {
                        open.insert(
                            (ka, kb),
                            HalfEdge {
                                a: corners[j],
                                b: corners[next],
                                normal,
                            },
                        );
                    }
                }
            }
        }

        // whatever never found a twin lies on a boundary
        let mut boundary: Vec<_> = open.into_iter().collect();
        boundary.sort_by(|(k1, _), (k2, _)| k1.cmp(k2));
        segments.extend(boundary.into_iter().map(|(_, edge)| [edge.a, edge.b]));

        Self { segments }
    }

    pub fn segments(&self) -> &[[[f32; 3]; 2]] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment endpoints flattened into a line-list vertex stream.
    pub fn vertices(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.segments.iter().flat_map(|[a, b]| [*a, *b])
    }
}

fn quantize(p: [f32; 3]) -> PointKey {
    let q = |v: f32| (v * MERGE_PRECISION).round() as i64;
    (q(p[0]), q(p[1]), q(p[2]))
}
