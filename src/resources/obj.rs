//! Wavefront OBJ input.
//!
//! [`ObjSource`] holds the text of an OBJ file. As a [`GeometryProvider`] it
//! yields one triangulated [`Geometry`] with every group and object merged;
//! [`ObjSource::summary`] reports the faces as written, grouped, without
//! triangulation.

use std::{
    fmt,
    io::{BufReader, Cursor},
};

use anyhow::Context;

use crate::data_structures::geometry::Geometry;

/// Anything the scene can take its mesh geometry from.
pub trait GeometryProvider {
    fn load_geometry(&self) -> anyhow::Result<Geometry>;
}

impl GeometryProvider for Geometry {
    fn load_geometry(&self) -> anyhow::Result<Geometry> {
        Ok(self.clone())
    }
}

#[derive(Clone, Debug)]
pub struct ObjSource {
    pub name: String,
    pub text: String,
}

impl ObjSource {
    pub fn new(name: &str, text: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            text: text.into(),
        }
    }

    fn parse(&self, triangulate: bool) -> anyhow::Result<Vec<tobj::Model>> {
        let mut reader = BufReader::new(Cursor::new(self.text.as_bytes()));
        let (models, _materials) = tobj::load_obj_buf(
            &mut reader,
            &tobj::LoadOptions {
                triangulate,
                single_index: triangulate,
                ..Default::default()
            },
            // materials are not used, an unresolvable mtllib is not an error
            |_p| Ok((Vec::new(), Default::default())),
        )
        .with_context(|| format!("Failed to parse {}", self.name))?;
        Ok(models)
    }

    /// Groups and faces as written in the file.
    pub fn summary(&self) -> anyhow::Result<ObjSummary> {
        let models = self.parse(false)?;
        let grouped = declares_groups(&self.text);

        let groups = models
            .iter()
            .map(|model| -> anyhow::Result<ObjGroupSummary> {
                let mesh = &model.mesh;
                let vertex = |idx: u32| -> anyhow::Result<[f32; 3]> {
                    let i = idx as usize * 3;
                    mesh.positions
                        .get(i..i + 3)
                        .map(|p| [p[0], p[1], p[2]])
                        .with_context(|| format!("vertex index {} out of range", idx))
                };

                // An empty arity list means every face is a triangle.
                let arities: Vec<usize> = if mesh.face_arities.is_empty() {
                    vec![3; mesh.indices.len() / 3]
                } else {
                    mesh.face_arities.iter().map(|&a| a as usize).collect()
                };

                let mut faces = Vec::with_capacity(arities.len());
                let mut start = 0;
                for arity in arities {
                    let indices = mesh
                        .indices
                        .get(start..start + arity)
                        .context("face arities exceed the index list")?;
                    faces.push(ObjFace {
                        kind: FaceKind::from_arity(arity),
                        vertices: indices
                            .iter()
                            .map(|&i| vertex(i))
                            .collect::<anyhow::Result<Vec<_>>>()?,
                    });
                    start += arity;
                }
                Ok(ObjGroupSummary {
                    name: model.name.clone(),
                    faces,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(ObjSummary { grouped, groups })
    }
}

/// Whether any line opens a group (`g`), smoothing group (`s`) or merging
/// group (`mg`). Object names (`o`) do not count.
fn declares_groups(text: &str) -> bool {
    text.lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|keyword| matches!(keyword, "g" | "s" | "mg"))
}

impl GeometryProvider for ObjSource {
    /// Triangulate and merge every group. Normals survive only if every group has them.
    fn load_geometry(&self) -> anyhow::Result<Geometry> {
        let models = self.parse(true)?;
        let mut merged: Option<Geometry> = None;

        for model in models {
            let mesh = model.mesh;
            let positions = mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();
            let mut geometry = Geometry::new(positions, mesh.indices)
                .with_context(|| format!("group {} of {}", model.name, self.name))?;
            if !mesh.normals.is_empty() {
                let normals = mesh
                    .normals
                    .chunks_exact(3)
                    .map(|n| [n[0], n[1], n[2]])
                    .collect();
                geometry = geometry.with_normals(normals)?;
            }
            log::debug!(
                "{}: group {} with {} triangles",
                self.name,
                model.name,
                geometry.triangle_count()
            );
            match &mut merged {
                Some(all) => all.merge(geometry),
                None => merged = Some(geometry),
            }
        }

        match merged {
            Some(geometry) => Ok(geometry),
            None => Geometry::new(Vec::new(), Vec::new()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceKind {
    Triangle,
    Quad,
    Polygon(usize),
}

impl FaceKind {
    pub fn from_arity(arity: usize) -> Self {
        match arity {
            3 => FaceKind::Triangle,
            4 => FaceKind::Quad,
            n => FaceKind::Polygon(n),
        }
    }
}

impl fmt::Display for FaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceKind::Triangle => f.write_str("TRIANGLE"),
            FaceKind::Quad => f.write_str("QUAD"),
            FaceKind::Polygon(n) => write!(f, "POLYGON({})", n),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjFace {
    pub kind: FaceKind,
    pub vertices: Vec<[f32; 3]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjGroupSummary {
    pub name: String,
    pub faces: Vec<ObjFace>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjSummary {
    /// Whether the file declared any `g`, `s` or `mg` groups. Object names
    /// (`o`) still split `groups` but do not make the file grouped.
    pub grouped: bool,
    pub groups: Vec<ObjGroupSummary>,
}

impl ObjSummary {
    pub fn face_count(&self) -> usize {
        self.groups.iter().map(|g| g.faces.len()).sum()
    }
}

impl fmt::Display for ObjSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            if self.grouped {
                writeln!(f, ">>> Group:")?;
            }
            for face in &group.faces {
                writeln!(f, ">>> f [{}]", face.kind)?;
                for [x, y, z] in &face.vertices {
                    writeln!(f, "{:.6} {:.6} {:.6}", x, y, z)?;
                }
            }
        }
        Ok(())
    }
}
