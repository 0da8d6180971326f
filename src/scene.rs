//! Scene data model
//!
//! The collaborator-facing types: meshes with their per-frame scratch
//! lanes, materials, models, cameras and lights. Scene construction and
//! model file loading live outside the crate; everything here is plain
//! data the pipeline transforms in place each frame.

use serde::{Deserialize, Serialize};

use crate::color::{BlendMode, Color};
use crate::fixed::Fixed;
use crate::frustum::Frustum;
use crate::matrix::Mat4;
use crate::rasterizer::Interpolation;
use crate::texture::Texture;
use crate::transform::Transform;
use crate::vector::Vec4;

/// Which lighting model a material shades with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadingModel {
    /// One lighting evaluation per face.
    Flat,
    /// Lighting per vertex, interpolated across the face.
    Gouraud,
    /// World position and normal interpolated, lit per pixel.
    Phong,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub diffuse_color: Color,
    pub specular_color: Color,
    /// Specular exponent; zero disables the specular term.
    pub shininess: Fixed,
    pub shading: ShadingModel,
    pub interpolation: Interpolation,
    pub blend_mode: BlendMode,
    #[serde(skip)]
    pub texture: Option<Texture>,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            diffuse_color: Color::rgb(160, 160, 160),
            specular_color: Color::WHITE,
            shininess: Fixed::ZERO,
            shading: ShadingModel::Gouraud,
            interpolation: Interpolation::Affine,
            blend_mode: BlendMode::Opaque,
            texture: None,
        }
    }
}

/// One mesh vertex plus its per-frame scratch lanes.
///
/// `world_location`, `world_normal`, `location` and `shaded_color` are
/// rewritten by the pipeline every frame; only the local lanes and the
/// material index are authored data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub local_location: Vec4,
    pub local_normal: Vec4,
    pub world_location: Vec4,
    pub world_normal: Vec4,
    /// Screen-space location after the vertex stage of the current pass.
    pub location: Vec4,
    pub shaded_color: Color,
    pub material: usize,
}

impl Vertex {
    pub fn new(local_location: Vec4, local_normal: Vec4, material: usize) -> Self {
        Vertex {
            local_location,
            local_normal,
            world_location: Vec4::ZERO,
            world_normal: Vec4::ZERO,
            location: Vec4::ZERO,
            shaded_color: Color::BLACK,
            material,
        }
    }
}

/// Triangle face: three vertex indices with per-corner UVs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Face {
    pub vertices: [usize; 3],
    pub uvs: [Vec4; 3],
    pub local_normal: Vec4,
    /// Rewritten from `local_normal` every frame.
    pub world_normal: Vec4,
    pub material: usize,
}

impl Face {
    pub fn new(vertices: [usize; 3], uvs: [Vec4; 3], material: usize) -> Self {
        Face {
            vertices,
            uvs,
            local_normal: Vec4::ZERO,
            world_normal: Vec4::ZERO,
            material,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    pub materials: Vec<Material>,
}

impl Mesh {
    /// Assemble a mesh, deriving each face's local normal from its winding.
    pub fn new(vertices: Vec<Vertex>, mut faces: Vec<Face>, materials: Vec<Material>) -> Self {
        for face in &mut faces {
            let a = vertices[face.vertices[0]].local_location;
            let b = vertices[face.vertices[1]].local_location;
            let c = vertices[face.vertices[2]].local_location;
            face.local_normal = (b - a).cross(c - a).normalized();
        }
        Mesh { vertices, faces, materials }
    }
}

/// Vertices influenced by one bone, with a weight per vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexGroup {
    pub bone: usize,
    pub vertices: Vec<usize>,
    pub weights: Vec<Fixed>,
}

impl VertexGroup {
    /// Weight of this bone on a vertex, `None` when the bone does not
    /// influence it.
    pub fn weight_of(&self, vertex: usize) -> Option<Fixed> {
        self.vertices
            .iter()
            .position(|&index| index == vertex)
            .map(|position| self.weights[position])
    }
}

/// One pose: a world-of-the-model matrix per bone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationFrame {
    pub bone_matrices: Vec<Mat4>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    pub frames: Vec<AnimationFrame>,
}

/// Skinning data: bone weights plus keyframed bone matrices. The engine
/// loop advances frames; the pipeline only reads the current pose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Armature {
    pub vertex_groups: Vec<VertexGroup>,
    pub animations: Vec<Animation>,
    current_animation: usize,
    current_frame: usize,
}

impl Armature {
    pub fn new(vertex_groups: Vec<VertexGroup>, animations: Vec<Animation>) -> Self {
        Armature {
            vertex_groups,
            animations,
            current_animation: 0,
            current_frame: 0,
        }
    }

    /// Select an animation by name; unknown names leave the current one.
    pub fn play(&mut self, name: &str) {
        if let Some(index) = self.animations.iter().position(|animation| animation.name == name) {
            self.current_animation = index;
            self.current_frame = 0;
        }
    }

    /// Advance to the next frame, wrapping at the end of the animation.
    pub fn next_frame(&mut self) {
        if let Some(animation) = self.animations.get(self.current_animation) {
            if !animation.frames.is_empty() {
                self.current_frame = (self.current_frame + 1) % animation.frames.len();
            }
        }
    }

    pub fn current_frame(&self) -> Option<&AnimationFrame> {
        self.animations
            .get(self.current_animation)
            .and_then(|animation| animation.frames.get(self.current_frame))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub mesh: Mesh,
    pub transform: Transform,
    pub armature: Option<Armature>,
    pub active: bool,
}

impl Model {
    pub fn new(mesh: Mesh, transform: Transform) -> Self {
        Model { mesh, transform, armature: None, active: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub transform: Transform,
    pub frustum: Frustum,
    /// Shadow maps are generated for the main camera's frame only.
    pub main: bool,
}

impl Camera {
    pub fn new(transform: Transform, frustum: Frustum) -> Self {
        Camera { transform, frustum, main: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightType {
    Directional,
    Point,
    Spot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightType,
    pub transform: Transform,
    /// Direction for directional and spot lights.
    pub direction: Vec4,
    pub color: Color,
    pub ambient_color: Color,
    pub strength: Fixed,
    pub constant_attenuation: Fixed,
    pub linear_attenuation: Fixed,
    pub quadratic_attenuation: Fixed,
    /// Full cone angle of a spot light, fixed-point degrees.
    pub spot_size: Fixed,
    pub spot_softness: Fixed,
    /// Whether this light is considered for shadow-map generation.
    pub shadow: bool,
    /// Depth offset baked into the shadow map to avoid self-shadowing acne.
    pub shadow_bias: Fixed,
    pub active: bool,
    /// Preferred over distance when picking the shadow light of a type.
    pub main: bool,
    /// Resolved per frame from the camera distance; not authored.
    #[serde(skip)]
    pub culled: bool,
}

impl Light {
    pub fn new(kind: LightType, transform: Transform) -> Self {
        Light {
            kind,
            transform,
            direction: Vec4::DOWN,
            color: Color::WHITE,
            ambient_color: Color::rgb(24, 24, 24),
            strength: Fixed::ONE,
            constant_attenuation: Fixed::ONE,
            linear_attenuation: Fixed::from_f32(0.09),
            quadratic_attenuation: Fixed::from_f32(0.032),
            spot_size: Fixed::from_int(60),
            spot_softness: Fixed::from_f32(0.025),
            shadow: true,
            // roughly half a world unit at the shadow frustums' depth scale
            shadow_bias: Fixed::from_f32(0.0005),
            active: true,
            main: false,
            culled: false,
        }
    }

    /// Cosine of the half cone angle, the form the spot falloff needs.
    pub fn spot_size_cos(&self) -> Fixed {
        Fixed(self.spot_size.raw() >> 1).cos()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub models: Vec<Model>,
    pub cameras: Vec<Camera>,
    pub lights: Vec<Light>,
}

impl Scene {
    pub fn new() -> Self {
        Scene::default()
    }
}
