//! Parser for the semicolon-delimited vertex files.
//!
//! Each non-empty line is one vertex. The uploaded layout is always
//! [`FLOATS_PER_VERTEX`] floats wide:
//!
//! | floats | attribute                     |
//! |--------|-------------------------------|
//! | 0..3   | position                      |
//! | 3..6   | normal                        |
//! | 6..8   | texture coordinates           |
//! | 8..11  | extra data defined by shaders |
//!
//! With [`NormalMode::Generate`] the file only carries the first eight fields
//! and the last three slots receive a face normal computed per triangle.

use std::path::Path;

use cgmath::Vector3;

use crate::error::ModelError;

pub const FLOATS_PER_VERTEX: usize = 11;
pub const DELIMITER: char = ';';

/// How the per-vertex fields are obtained from a vertex file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NormalMode {
    /// Every line carries all eleven floats.
    #[default]
    FromFile,
    /// Lines carry eight floats; slots 8..11 get `(p0 - p1) x (p1 - p2)`.
    Generate,
}

impl NormalMode {
    pub fn fields_per_line(self) -> usize {
        match self {
            NormalMode::FromFile => FLOATS_PER_VERTEX,
            NormalMode::Generate => 8,
        }
    }
}

/// Flat vertex buffer ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    floats: Vec<f32>,
    vertex_count: usize,
}

impl VertexData {
    pub fn floats(&self) -> &[f32] {
        &self.floats
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn vertex(&self, index: usize) -> &[f32] {
        let start = index * FLOATS_PER_VERTEX;
        &self.floats[start..start + FLOATS_PER_VERTEX]
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }
}

pub async fn load_vertices(path: &Path, mode: NormalMode) -> Result<VertexData, ModelError> {
    let text = super::load_string(path).await.map_err(|source| {
        log::error!("could not load csv model from {:?}", path);
        ModelError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let data = parse_vertices(&text, mode).inspect_err(|e| log::error!("{:?}: {}", path, e))?;
    log::info!("{:?}: {} vertices", path, data.vertex_count);
    Ok(data)
}

pub fn parse_vertices(source: &str, mode: NormalMode) -> Result<VertexData, ModelError> {
    let vertex_count = source.lines().filter(|line| !line.trim().is_empty()).count();
    let mut floats = vec![0.0f32; vertex_count * FLOATS_PER_VERTEX];

    let expected = mode.fields_per_line();
    let lines = source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    for (vertex, (index, line)) in lines.enumerate() {
        let line_number = index + 1;
        let slots = &mut floats[vertex * FLOATS_PER_VERTEX..][..expected];
        read_fields(line, line_number, slots)?;
    }

    if mode == NormalMode::Generate {
        if vertex_count % 3 != 0 {
            return Err(ModelError::IncompleteTriangle { vertex_count });
        }
        fill_face_normals(&mut floats);
    }

    Ok(VertexData {
        floats,
        vertex_count,
    })
}

/// Parse one line into exactly `slots.len()` floats.
fn read_fields(line: &str, line_number: usize, slots: &mut [f32]) -> Result<(), ModelError> {
    let line = line.trim();
    // a single trailing delimiter is part of the format
    let line = line.strip_suffix(DELIMITER).unwrap_or(line);

    let fields: Vec<&str> = line.split(DELIMITER).map(str::trim).collect();
    if fields.len() != slots.len() {
        return Err(ModelError::FieldCount {
            line: line_number,
            expected: slots.len(),
            found: fields.len(),
        });
    }

    for (column, (slot, field)) in slots.iter_mut().zip(fields).enumerate() {
        *slot = field.parse().map_err(|_| ModelError::Field {
            line: line_number,
            column: column + 1,
            value: field.to_string(),
        })?;
    }
    Ok(())
}

fn position(vertex: &[f32]) -> Vector3<f32> {
    Vector3::new(vertex[0], vertex[1], vertex[2])
}

/// Write the (unnormalized) face normal of every triangle into slots 8..11
/// of its three vertices.
fn fill_face_normals(floats: &mut [f32]) {
    let normal_offset = NormalMode::Generate.fields_per_line();

    for triangle in floats.chunks_exact_mut(3 * FLOATS_PER_VERTEX) {
        let (v0, rest) = triangle.split_at(FLOATS_PER_VERTEX);
        let (v1, v2) = rest.split_at(FLOATS_PER_VERTEX);
        let (p0, p1, p2) = (position(v0), position(v1), position(v2));

        let normal = (p0 - p1).cross(p1 - p2);
        log::debug!(
            "triangle {:?} {:?} {:?} -> normal {:?}",
            p0,
            p1,
            p2,
            normal
        );

        for vertex in triangle.chunks_exact_mut(FLOATS_PER_VERTEX) {
            vertex[normal_offset..normal_offset + 3].copy_from_slice(&[
                normal.x, normal.y, normal.z,
            ]);
        }
    }
}
