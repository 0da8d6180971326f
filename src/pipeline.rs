//! Frame orchestration
//!
//! One frame runs: clear, local-to-world transform, then per camera a
//! shader-buffer setup (single-threaded), the shadow passes and the
//! forward pass. Each pass is a vertex stage followed by a geometry
//! stage; stages are separate parallel loops over the worker pool, so the
//! geometry stage never starts before every vertex of the pass is done.
//!
//! Workers never share scratch: the vertex stage partitions vertices,
//! the geometry stage partitions faces and gives every worker its own
//! rasterizer. The only cross-worker writes are the atomic depth/color
//! stores inside the fragment programs.

use std::time::{Duration, Instant};

use log::debug;
use rayon::prelude::*;

use crate::color::Color;
use crate::frustum::Frustum;
use crate::matrix::Mat4;
use crate::rasterizer::CullFace;
use crate::scene::{AnimationFrame, Armature, Mesh, Scene, Vertex, VertexGroup};
use crate::shading::{forward_vertex, shadow_vertex, ForwardWorker, ShaderBuffer, ShadowWorker};
use crate::texture::{RenderTarget, Texture};
use crate::vector::Vec4;

/// Wall-clock cost of the last rendered frame, per stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTimings {
    pub world: Duration,
    pub shadow: Duration,
    pub forward: Duration,
    pub total: Duration,
}

/// The software rendering pipeline.
pub struct Pipeline {
    /// Frame clear color.
    pub background: Color,
    /// Whole-triangle view-volume culling in the forward pass.
    pub frustum_cull: bool,
    /// Face culling direction of the forward pass.
    pub cull_face: CullFace,
    buffer: ShaderBuffer,
    timings: FrameTimings,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline {
            background: Color::BLACK,
            frustum_cull: true,
            cull_face: CullFace::Back,
            buffer: ShaderBuffer::new(),
            timings: FrameTimings::default(),
        }
    }

    /// The current frame snapshot (shadow maps included).
    pub fn shader_buffer(&self) -> &ShaderBuffer {
        &self.buffer
    }

    /// Stage timings of the most recent [`Self::render_frame`] call.
    pub fn last_frame_timings(&self) -> FrameTimings {
        self.timings
    }

    /// Render one frame of `scene` into `target`.
    pub fn render_frame(&mut self, scene: &mut Scene, target: &RenderTarget) {
        let frame_start = Instant::now();
        target.clear(self.background);
        local_to_world(scene);
        let world_done = Instant::now();
        let mut shadow_time = Duration::ZERO;
        let mut forward_time = Duration::ZERO;
        let cameras = scene.cameras.clone();
        for camera in &cameras {
            self.buffer
                .setup(camera, &mut scene.lights, target.width(), target.height());
            let shadow_start = Instant::now();
            self.shadow_passes(scene);
            let forward_start = Instant::now();
            self.forward_pass(scene, target);
            shadow_time += forward_start - shadow_start;
            forward_time += forward_start.elapsed();
        }
        self.timings = FrameTimings {
            world: world_done - frame_start,
            shadow: shadow_time,
            forward: forward_time,
            total: frame_start.elapsed(),
        };
        debug!(
            "frame: {} models in {:?} (world {:?}, shadow {:?}, forward {:?})",
            scene.models.len(),
            self.timings.total,
            self.timings.world,
            self.timings.shadow,
            self.timings.forward
        );
    }

    fn shadow_passes(&self, scene: &mut Scene) {
        let buffer = &self.buffer;
        if let Some(light) = buffer.directional_light() {
            let bias = light.shadow_bias.raw();
            shadow_pass(
                buffer,
                scene,
                buffer.directional_matrix(),
                buffer.directional_frustum(),
                buffer.directional_map(),
                bias,
            );
        }
        if let Some(light) = buffer.spot_light() {
            let bias = light.shadow_bias.raw();
            shadow_pass(
                buffer,
                scene,
                buffer.spot_matrix(),
                buffer.spot_frustum(),
                buffer.spot_map(),
                bias,
            );
        }
        if let Some(light) = buffer.point_light() {
            let bias = light.shadow_bias.raw();
            for face in 0..6 {
                shadow_pass(
                    buffer,
                    scene,
                    &buffer.point_matrices()[face],
                    buffer.point_frustum(),
                    &buffer.point_maps()[face],
                    bias,
                );
            }
        }
    }

    fn forward_pass(&self, scene: &mut Scene, target: &RenderTarget) {
        let buffer = &self.buffer;
        for model in scene.models.iter_mut().filter(|model| model.active) {
            let Mesh { vertices, materials, .. } = &mut model.mesh;
            let materials = &*materials;
            vertices
                .par_iter_mut()
                .for_each(|vertex| forward_vertex(buffer, vertex, &materials[vertex.material]));
        }
        for model in scene.models.iter().filter(|model| model.active) {
            let mesh = &model.mesh;
            mesh.faces.par_iter().for_each_init(
                || ForwardWorker::new(buffer, self.frustum_cull, self.cull_face),
                |worker, face| worker.geometry(buffer, mesh, face, target),
            );
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuild world-space vertex and face data from each model's transform,
/// applying the armature pose first when the model is skinned.
fn local_to_world(scene: &mut Scene) {
    for model in scene.models.iter_mut().filter(|model| model.active) {
        let model_matrix = model.transform.model_matrix();
        let normal_matrix = model.transform.normal_matrix();
        let pose = model.armature.as_ref().and_then(Armature::current_frame);
        let groups = model.armature.as_ref().map(|armature| &armature.vertex_groups[..]);
        let Mesh { vertices, faces, .. } = &mut model.mesh;
        vertices.par_iter_mut().enumerate().for_each(|(index, vertex)| {
            let (location, normal) = match (pose, groups) {
                (Some(frame), Some(groups)) => skinned_vertex(vertex, index, frame, groups),
                _ => (vertex.local_location, vertex.local_normal),
            };
            vertex.world_location = location.transformed(&model_matrix);
            vertex.world_normal = normal.transformed(&normal_matrix);
        });
        faces.par_iter_mut().for_each(|face| {
            face.world_normal = face.local_normal.transformed(&normal_matrix);
        });
    }
}

/// Weighted sum of the bone transforms influencing one vertex. Vertices
/// outside every group pass through unposed.
fn skinned_vertex(
    vertex: &Vertex,
    index: usize,
    frame: &AnimationFrame,
    groups: &[VertexGroup],
) -> (Vec4, Vec4) {
    let mut location = Vec4::ZERO;
    let mut normal = Vec4::ZERO;
    let mut influenced = false;
    for group in groups {
        let Some(weight) = group.weight_of(index) else {
            continue;
        };
        let Some(bone_matrix) = frame.bone_matrices.get(group.bone) else {
            continue;
        };
        location = location + vertex.local_location.transformed(bone_matrix) * weight;
        normal = normal + vertex.local_normal.transformed(bone_matrix) * weight;
        influenced = true;
    }
    if influenced {
        (location, normal)
    } else {
        (vertex.local_location, vertex.local_normal)
    }
}

/// One depth-only pass: vertex sweep into the light's clip space, then a
/// geometry sweep into its map.
fn shadow_pass(
    buffer: &ShaderBuffer,
    scene: &mut Scene,
    light_matrix: &Mat4,
    light_frustum: &Frustum,
    map: &Texture,
    shadow_bias: i32,
) {
    for model in scene.models.iter_mut().filter(|model| model.active) {
        model
            .mesh
            .vertices
            .par_iter_mut()
            .for_each(|vertex| shadow_vertex(vertex, light_matrix, light_frustum));
    }
    for model in scene.models.iter().filter(|model| model.active) {
        let mesh = &model.mesh;
        mesh.faces.par_iter().for_each_init(
            || ShadowWorker::new(light_frustum),
            |worker, face| worker.geometry(buffer, mesh, face, map, shadow_bias),
        );
    }
}
