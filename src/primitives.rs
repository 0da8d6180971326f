//! Canned test geometry
//!
//! Ready-made meshes for demos and tests: an axis-aligned cube with
//! per-side normals and UVs, and a ground plane. Sides are wound
//! counter-clockwise seen from outside, so back-face culling of
//! positive-area screen triangles shows the outside of the solid.

use crate::fixed::Fixed;
use crate::scene::{Face, Material, Mesh, Vertex};
use crate::vector::Vec4;

/// Axis-aligned cube centered on the origin. Each side owns four
/// vertices so normals and UVs stay flat per face.
pub fn cube(size: Fixed, material: Material) -> Mesh {
    let h = Fixed(size.raw() >> 1);
    let sides: [(Vec4, [[Fixed; 3]; 4]); 6] = [
        (Vec4::BACK, [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
        (Vec4::FORWARD, [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]]),
        (Vec4::RIGHT, [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]]),
        (Vec4::LEFT, [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]),
        (Vec4::UP, [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]]),
        (Vec4::DOWN, [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
    ];
    let uv = [
        Vec4::from_f32(0.0, 0.0, 0.0),
        Vec4::from_f32(1.0, 0.0, 0.0),
        Vec4::from_f32(1.0, 1.0, 0.0),
        Vec4::from_f32(0.0, 1.0, 0.0),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut faces = Vec::with_capacity(12);
    for (normal, corners) in sides {
        let base = vertices.len();
        for [x, y, z] in corners {
            vertices.push(Vertex::new(Vec4::xyz(x, y, z), normal, 0));
        }
        faces.push(Face::new([base, base + 1, base + 2], [uv[0], uv[1], uv[2]], 0));
        faces.push(Face::new([base, base + 2, base + 3], [uv[0], uv[2], uv[3]], 0));
    }
    Mesh::new(vertices, faces, vec![material])
}

/// Square plane at y = 0 facing up, `size` wide along both axes.
pub fn plane(size: Fixed, material: Material) -> Mesh {
    let h = Fixed(size.raw() >> 1);
    let vertices = vec![
        Vertex::new(Vec4::xyz(-h, Fixed::ZERO, -h), Vec4::UP, 0),
        Vertex::new(Vec4::xyz(h, Fixed::ZERO, -h), Vec4::UP, 0),
        Vertex::new(Vec4::xyz(h, Fixed::ZERO, h), Vec4::UP, 0),
        Vertex::new(Vec4::xyz(-h, Fixed::ZERO, h), Vec4::UP, 0),
    ];
    let uv = [
        Vec4::from_f32(0.0, 0.0, 0.0),
        Vec4::from_f32(1.0, 0.0, 0.0),
        Vec4::from_f32(1.0, 1.0, 0.0),
        Vec4::from_f32(0.0, 1.0, 0.0),
    ];
    let faces = vec![
        Face::new([0, 2, 1], [uv[0], uv[2], uv[1]], 0),
        Face::new([0, 3, 2], [uv[0], uv[3], uv[2]], 0),
    ];
    Mesh::new(vertices, faces, vec![material])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_shape() {
        let mesh = cube(Fixed::from_int(2), Material::default());
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.faces.len(), 12);
        // every corner sits one unit from the center on each axis
        for vertex in &mesh.vertices {
            assert_eq!(vertex.local_location.x.abs(), Fixed::ONE);
            assert_eq!(vertex.local_location.y.abs(), Fixed::ONE);
            assert_eq!(vertex.local_location.z.abs(), Fixed::ONE);
        }
    }

    #[test]
    fn test_cube_face_normals_point_outward() {
        let mesh = cube(Fixed::from_int(2), Material::default());
        for face in &mesh.faces {
            let vertex_normal = mesh.vertices[face.vertices[0]].local_normal;
            let winding_normal = face.local_normal;
            assert!(
                vertex_normal.dot(winding_normal) > Fixed::from_f32(0.9),
                "winding disagrees with side normal: {winding_normal:?} vs {vertex_normal:?}"
            );
        }
    }

    #[test]
    fn test_plane_faces_up() {
        let mesh = plane(Fixed::from_int(10), Material::default());
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.faces.len(), 2);
        for face in &mesh.faces {
            assert!(face.local_normal.y > Fixed::from_f32(0.9));
        }
    }
}
