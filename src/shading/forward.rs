//! Forward color pass
//!
//! One vertex function and one geometry worker cover the three shading
//! models; they differ only in where lighting runs and which attribute
//! slots ride through the rasterizer:
//!
//! - Flat: one lighting evaluation per face, slots = UV + two light-space
//!   locations.
//! - Gouraud: lighting per vertex, slots = UV + color + two light-space
//!   locations.
//! - Phong: slots = UV + world position + world normal, lit per pixel
//!   (including point-light cube shadows, which need the world position).
//!
//! Every fragment program ends the same way: a closer-wins depth write
//! followed by the color store.

use crate::color::{BlendMode, Color};
use crate::fixed::{self, Fixed};
use crate::frustum::Frustum;
use crate::matrix::Mat4;
use crate::rasterizer::{CullFace, TriangleRasterizer, INTERPOLATE_BIT};
use crate::scene::{Face, Material, Mesh, ShadingModel, Vertex};
use crate::texture::{RenderTarget, Texture};
use crate::vector::Vec4;

use super::buffer::ShaderBuffer;
use super::lighting;

const ONE_THIRD: Fixed = Fixed(crate::fixed::FP_ONE / 3);

/// Vertex stage: world to clip to screen, plus per-vertex lighting for
/// Gouraud materials.
pub(crate) fn vertex(buffer: &ShaderBuffer, vertex: &mut Vertex, material: &Material) {
    if material.shading == ShadingModel::Gouraud {
        vertex.shaded_color = lighting::shade(
            vertex.world_location,
            vertex.world_normal.normalized(),
            material,
            buffer.lights(),
            buffer.camera_location(),
        );
    }
    let clip = vertex.world_location.transformed(buffer.view_projection());
    vertex.location = buffer.camera_frustum().screenport_vector(clip);
}

/// Per-worker geometry state: private rasterizers for each slot count.
pub(crate) struct ForwardWorker {
    flat: TriangleRasterizer<3>,
    gouraud: TriangleRasterizer<4>,
    phong: TriangleRasterizer<3>,
}

impl ForwardWorker {
    pub fn new(buffer: &ShaderBuffer, frustum_cull: bool, cull_face: CullFace) -> Self {
        let mut worker = ForwardWorker {
            flat: TriangleRasterizer::new(),
            gouraud: TriangleRasterizer::new(),
            phong: TriangleRasterizer::new(),
        };
        worker.flat.set_viewport(buffer.camera_frustum());
        worker.flat.set_frustum_cull(frustum_cull);
        worker.flat.set_cull_face(cull_face);
        worker.gouraud.set_viewport(buffer.camera_frustum());
        worker.gouraud.set_frustum_cull(frustum_cull);
        worker.gouraud.set_cull_face(cull_face);
        worker.phong.set_viewport(buffer.camera_frustum());
        worker.phong.set_frustum_cull(frustum_cull);
        worker.phong.set_cull_face(cull_face);
        worker
    }

    /// Geometry stage: pack attributes for the face's shading model and
    /// rasterize with the matching fragment program.
    pub fn geometry(&mut self, buffer: &ShaderBuffer, mesh: &Mesh, face: &Face, target: &RenderTarget) {
        let material = &mesh.materials[face.material];
        let corners = [
            &mesh.vertices[face.vertices[0]],
            &mesh.vertices[face.vertices[1]],
            &mesh.vertices[face.vertices[2]],
        ];
        let locations = [corners[0].location, corners[1].location, corners[2].location];
        let uvs = pack_uvs(face, material);
        match material.shading {
            ShadingModel::Flat => {
                let centroid = (corners[0].world_location
                    + corners[1].world_location
                    + corners[2].world_location)
                    * ONE_THIRD;
                let face_color = lighting::shade(
                    centroid,
                    face.world_normal.normalized(),
                    material,
                    buffer.lights(),
                    buffer.camera_location(),
                );
                let attributes = [
                    uvs,
                    pack_light_space(&corners, buffer.directional_light().is_some(), buffer.directional_matrix(), buffer.directional_frustum()),
                    pack_light_space(&corners, buffer.spot_light().is_some(), buffer.spot_matrix(), buffer.spot_frustum()),
                ];
                self.flat.draw(&locations, &attributes, material.interpolation, &mut |fragment| {
                    let mut color = face_color.modulate(sample(material, fragment.attributes[0]));
                    if directional_shadowed(buffer, fragment.attributes[1])
                        || spot_shadowed(buffer, fragment.attributes[2])
                    {
                        color = color.scale(Fixed::HALF);
                    }
                    write(target, fragment.x, fragment.y, fragment.z, color, material.blend_mode);
                });
            }
            ShadingModel::Gouraud => {
                let colors: [[i32; 3]; 3] = std::array::from_fn(|corner| {
                    let color = corners[corner].shaded_color;
                    [
                        color.red() << INTERPOLATE_BIT,
                        color.green() << INTERPOLATE_BIT,
                        color.blue() << INTERPOLATE_BIT,
                    ]
                });
                let attributes = [
                    uvs,
                    colors,
                    pack_light_space(&corners, buffer.directional_light().is_some(), buffer.directional_matrix(), buffer.directional_frustum()),
                    pack_light_space(&corners, buffer.spot_light().is_some(), buffer.spot_matrix(), buffer.spot_frustum()),
                ];
                self.gouraud.draw(&locations, &attributes, material.interpolation, &mut |fragment| {
                    let [red, green, blue] = fragment.attributes[1];
                    let light_color = Color::rgb(
                        red >> INTERPOLATE_BIT,
                        green >> INTERPOLATE_BIT,
                        blue >> INTERPOLATE_BIT,
                    );
                    let mut color = light_color.modulate(sample(material, fragment.attributes[0]));
                    if directional_shadowed(buffer, fragment.attributes[2])
                        || spot_shadowed(buffer, fragment.attributes[3])
                    {
                        color = color.scale(Fixed::HALF);
                    }
                    write(target, fragment.x, fragment.y, fragment.z, color, material.blend_mode);
                });
            }
            ShadingModel::Phong => {
                let positions: [[i32; 3]; 3] = std::array::from_fn(|corner| {
                    let world = corners[corner].world_location;
                    [world.x.raw(), world.y.raw(), world.z.raw()]
                });
                let normals: [[i32; 3]; 3] = std::array::from_fn(|corner| {
                    let normal = corners[corner].world_normal;
                    [normal.x.raw(), normal.y.raw(), normal.z.raw()]
                });
                let attributes = [uvs, positions, normals];
                self.phong.draw(&locations, &attributes, material.interpolation, &mut |fragment| {
                    let [x, y, z] = fragment.attributes[1];
                    let world = Vec4::xyz(Fixed(x), Fixed(y), Fixed(z));
                    let [nx, ny, nz] = fragment.attributes[2];
                    let normal = Vec4::xyz(Fixed(nx), Fixed(ny), Fixed(nz)).normalized();
                    let lit = lighting::shade(
                        world,
                        normal,
                        material,
                        buffer.lights(),
                        buffer.camera_location(),
                    );
                    let mut color = lit.modulate(sample(material, fragment.attributes[0]));
                    if phong_shadowed(buffer, world) {
                        color = color.scale(Fixed::HALF);
                    }
                    write(target, fragment.x, fragment.y, fragment.z, color, material.blend_mode);
                });
            }
        }
    }
}

/// UVs scaled into texel space with `INTERPOLATE_BIT` extra precision.
fn pack_uvs(face: &Face, material: &Material) -> [[i32; 3]; 3] {
    match &material.texture {
        Some(texture) => std::array::from_fn(|corner| {
            [
                fixed::mul(face.uvs[corner].x.raw(), (texture.width() as i32) << INTERPOLATE_BIT),
                fixed::mul(face.uvs[corner].y.raw(), (texture.height() as i32) << INTERPOLATE_BIT),
                0,
            ]
        }),
        None => [[0; 3]; 3],
    }
}

/// Corner world locations reprojected into a shadow light's clip space.
fn pack_light_space(
    corners: &[&Vertex; 3],
    selected: bool,
    matrix: &Mat4,
    frustum: &Frustum,
) -> [[i32; 3]; 3] {
    if !selected {
        return [[0; 3]; 3];
    }
    std::array::from_fn(|corner| light_space(corners[corner].world_location, matrix, frustum))
}

fn light_space(world: Vec4, matrix: &Mat4, frustum: &Frustum) -> [i32; 3] {
    let ported = frustum.screenport_vector(world.transformed(matrix));
    [ported.x.raw(), ported.y.raw(), ported.z.raw()]
}

/// Texel fetch, clamped to the image so interpolation overshoot cannot
/// index out of bounds. White when the material has no texture.
fn sample(material: &Material, uv: [i32; 3]) -> Color {
    match &material.texture {
        Some(texture) => {
            let u = (uv[0] >> INTERPOLATE_BIT).clamp(0, texture.width() as i32 - 1);
            let v = (uv[1] >> INTERPOLATE_BIT).clamp(0, texture.height() as i32 - 1);
            Color(texture.get(u as usize, v as usize) as u32)
        }
        None => Color::WHITE,
    }
}

fn shadow_lookup(map: &Texture, light_space: [i32; 3]) -> bool {
    let [x, y, z] = light_space;
    map.contains(x, y) && map.get(x as usize, y as usize) < z
}

fn directional_shadowed(buffer: &ShaderBuffer, light_space: [i32; 3]) -> bool {
    buffer.directional_light().is_some() && shadow_lookup(buffer.directional_map(), light_space)
}

fn spot_shadowed(buffer: &ShaderBuffer, light_space: [i32; 3]) -> bool {
    buffer.spot_light().is_some() && shadow_lookup(buffer.spot_map(), light_space)
}

/// Phong reprojects its per-fragment world position into every shadow
/// space; the point cube test picks the first face whose port contains
/// the projection in front of that face's view.
fn phong_shadowed(buffer: &ShaderBuffer, world: Vec4) -> bool {
    if buffer.directional_light().is_some() {
        let ls = light_space(world, buffer.directional_matrix(), buffer.directional_frustum());
        if shadow_lookup(buffer.directional_map(), ls) {
            return true;
        }
    }
    if buffer.spot_light().is_some() {
        let ls = light_space(world, buffer.spot_matrix(), buffer.spot_frustum());
        if shadow_lookup(buffer.spot_map(), ls) {
            return true;
        }
    }
    if buffer.point_light().is_some() {
        for (face, matrix) in buffer.point_matrices().iter().enumerate() {
            let ls = light_space(world, matrix, buffer.point_frustum());
            if ls[2] > 0 && buffer.point_maps()[face].contains(ls[0], ls[1]) {
                return buffer.point_maps()[face].get(ls[0] as usize, ls[1] as usize) < ls[2];
            }
        }
    }
    false
}

/// Depth-tested pixel write. Partially visible triangles can rasterize
/// outside the target, so the bounds check stays in the fragment path.
///
/// Non-opaque blend modes read the stored pixel before combining; a
/// concurrent store between that read and the write is part of the
/// pipeline's accepted same-pixel nondeterminism.
fn write(target: &RenderTarget, x: i32, y: i32, z: i32, color: Color, mode: BlendMode) {
    if !target.color().contains(x, y) {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if target.depth().depth_min(x, y, z) {
        let blended = match mode {
            BlendMode::Opaque => color,
            mode => color.blend(Color(target.color().get(x, y) as u32), mode),
        };
        target.color().set(x, y, blended.0 as i32);
    }
}
