//! Full-screen triangle vertex generation
//!
//! Host-side mirror of the `vert_main` WGSL entry point. The triangle is synthesized from the
//! vertex index alone, so the draw binds neither a vertex nor an index buffer.

/// Number of vertices issued by the full-screen draw
pub const VERTEX_COUNT: u32 = 3;
/// Number of instances issued by the full-screen draw
pub const INSTANCE_COUNT: u32 = 1;

/// Computes the clip-space position for a synthetic vertex index
///
/// Index 0, 1 and 2 produce (-1, -1), (3, -1) and (-1, 3) with z = 0 and w = 1.
/// Only the two low bits are meaningful; any index outside `0..3` is outside the
/// draw contract.
pub fn vert_main(vertex_index: u32) -> [f32; 4] {
    let x = -1.0 + ((vertex_index & 1) << 2) as f32;
    let y = -1.0 + ((vertex_index & 2) << 1) as f32;
    [x, y, 0.0, 1.0]
}

/// Returns the three clip-space corners produced by a full-screen draw
pub fn fullscreen_triangle() -> [[f32; 4]; 3] {
    [vert_main(0), vert_main(1), vert_main(2)]
}

/// Signed doubled area of the triangle (a, b, p)
fn edge_function(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

/// Inclusive point-in-triangle test that accepts either winding order
pub fn triangle_contains(triangle: &[[f32; 2]; 3], point: [f32; 2]) -> bool {
    let [a, b, c] = *triangle;
    let w0 = edge_function(a, b, point);
    let w1 = edge_function(b, c, point);
    let w2 = edge_function(c, a, point);

    (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0) || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0)
}

/// Whether a normalized device coordinate lies inside or on the full-screen triangle
pub fn contains_ndc(point: [f32; 2]) -> bool {
    let [a, b, c] = fullscreen_triangle();
    triangle_contains(&[[a[0], a[1]], [b[0], b[1]], [c[0], c[1]]], point)
}

/// Whether the triangle winds counter-clockwise in NDC (front-facing under `FrontFace::Ccw`)
pub fn is_counter_clockwise() -> bool {
    let [a, b, c] = fullscreen_triangle();
    edge_function([a[0], a[1]], [b[0], b[1]], [c[0], c[1]]) > 0.0
}
