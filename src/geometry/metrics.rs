//! Geometry metrics for polygonal faces and polyhedral cells.
//!
//! Faces are ordered point loops. Centres and area vectors are computed by
//! decomposing the face into triangles around the vertex average, which is
//! exact for planar faces and well behaved for mildly warped ones.

const EPS: f64 = 1e-300;

pub(crate) fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub(crate) fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Distance between two points.
pub fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    norm(sub(a, b))
}

/// Arithmetic mean of a set of vertices (origin for an empty set).
pub fn vertex_average(vertices: &[[f64; 3]]) -> [f64; 3] {
    if vertices.is_empty() {
        return [0.0; 3];
    }
    let sum = vertices.iter().fold([0.0; 3], |acc, v| add(acc, *v));
    scale(sum, 1.0 / vertices.len() as f64)
}

/// Area-weighted centre of a polygon.
///
/// Degenerate (zero-area) polygons fall back to the vertex average.
pub fn face_centre(vertices: &[[f64; 3]]) -> [f64; 3] {
    let mid = vertex_average(vertices);
    if vertices.len() < 3 {
        return mid;
    }
    let n = face_area_vector(vertices);
    let n_mag = norm(n);
    if n_mag < EPS {
        return mid;
    }
    let unit = scale(n, 1.0 / n_mag);

    let mut weighted = [0.0; 3];
    let mut total = 0.0;
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        let tri_centre = scale(add(add(*a, b), mid), 1.0 / 3.0);
        let tri_area = dot(cross(sub(b, *a), sub(mid, *a)), unit).abs();
        weighted = add(weighted, scale(tri_centre, tri_area));
        total += tri_area;
    }
    if total < EPS {
        mid
    } else {
        scale(weighted, 1.0 / total)
    }
}

/// Area vector of a polygon: normal by the right-hand rule over the vertex
/// order, magnitude equal to the area.
pub fn face_area_vector(vertices: &[[f64; 3]]) -> [f64; 3] {
    if vertices.len() < 3 {
        return [0.0; 3];
    }
    let mid = vertex_average(vertices);
    let mut sum = [0.0; 3];
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        sum = add(sum, cross(sub(*a, mid), sub(b, mid)));
    }
    scale(sum, 0.5)
}
