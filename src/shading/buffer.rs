//! Per-frame shader snapshot
//!
//! `ShaderBuffer::setup` runs once per camera on the render thread: it
//! composes the camera matrices, resolves which lights are in range, picks
//! at most one shadow-casting light per type and prepares that light's
//! frustum, matrices and depth map. After setup the buffer is only read,
//! so the parallel vertex and geometry stages share it freely; the shadow
//! maps inside are interior-mutable textures the depth passes write
//! through atomics.

use log::debug;

use crate::fixed::{Fixed, FP_ONE};
use crate::frustum::{Frustum, FrustumKind};
use crate::matrix::Mat4;
use crate::scene::{Camera, Light, LightType};
use crate::texture::Texture;
use crate::transform::Transform;
use crate::vector::Vec4;

/// Cutoff compared against squared distances in raw fixed units, so the
/// effective light radius is sqrt(50000) world units.
const LIGHT_RANGE: i64 = 50_000 * FP_ONE as i64;

const DIRECTIONAL_MAP_SIZE: usize = 512;
const SPOT_MAP_SIZE: usize = 256;
const POINT_MAP_SIZE: usize = 256;

/// Frame-scoped state shared by every shading stage.
pub struct ShaderBuffer {
    camera_location: Vec4,
    camera_frustum: Frustum,
    view_projection: Mat4,
    lights: Vec<Light>,

    directional_light: Option<usize>,
    directional_frustum: Frustum,
    directional_matrix: Mat4,
    directional_map: Texture,

    spot_light: Option<usize>,
    spot_frustum: Frustum,
    spot_matrix: Mat4,
    spot_map: Texture,

    point_light: Option<usize>,
    point_frustum: Frustum,
    point_matrices: [Mat4; 6],
    point_maps: [Texture; 6],
}

impl ShaderBuffer {
    pub fn new() -> Self {
        let mut directional_frustum = Frustum::new(
            Fixed::ZERO,
            Fixed::ONE,
            Fixed::ZERO,
            Fixed::ONE,
            Fixed::ONE,
            Fixed::from_int(1000),
        );
        directional_frustum.set_kind(FrustumKind::Orthographic);
        directional_frustum.set_focal_length(Fixed(FP_ONE >> 3));

        let mut spot_frustum = Frustum::new(
            Fixed::ZERO,
            Fixed::ONE,
            Fixed::ZERO,
            Fixed::ONE,
            Fixed::HALF,
            Fixed::from_int(1000),
        );
        spot_frustum.set_focal_length(Fixed::HALF);

        let mut point_frustum = Frustum::new(
            Fixed::ZERO,
            Fixed::ONE,
            Fixed::ZERO,
            Fixed::ONE,
            Fixed::ZERO,
            Fixed::from_int(1000),
        );
        point_frustum.set_focal_length(Fixed(FP_ONE >> 5));

        ShaderBuffer {
            camera_location: Vec4::ZERO,
            camera_frustum: Frustum::default(),
            view_projection: Mat4::IDENTITY,
            lights: Vec::new(),
            directional_light: None,
            directional_frustum,
            directional_matrix: Mat4::IDENTITY,
            directional_map: Texture::new(DIRECTIONAL_MAP_SIZE, DIRECTIONAL_MAP_SIZE),
            spot_light: None,
            spot_frustum,
            spot_matrix: Mat4::IDENTITY,
            spot_map: Texture::new(SPOT_MAP_SIZE, SPOT_MAP_SIZE),
            point_light: None,
            point_frustum,
            point_matrices: [Mat4::IDENTITY; 6],
            point_maps: std::array::from_fn(|_| Texture::new(POINT_MAP_SIZE, POINT_MAP_SIZE)),
        }
    }

    /// Build this camera's frame snapshot: matrices, light culling flags,
    /// shadow-light selection and cleared shadow maps.
    pub fn setup(&mut self, camera: &Camera, lights: &mut [Light], width: usize, height: usize) {
        self.camera_location = camera.transform.location;
        self.camera_frustum = camera.frustum.clone();
        self.camera_frustum.set_render_target_size(width, height);
        self.view_projection = self
            .camera_frustum
            .projection()
            .multiply(&camera.transform.view_matrix());

        for light in lights.iter_mut() {
            let distance = camera
                .transform
                .location
                .squared_distance(light.transform.location);
            light.culled = distance > LIGHT_RANGE;
        }

        // shadow resources exist for the main camera's frame only
        if camera.main {
            self.select_shadow_lights(camera, lights);
        } else {
            self.directional_light = None;
            self.spot_light = None;
            self.point_light = None;
        }
        self.lights = lights.to_vec();

        if let Some(index) = self.directional_light {
            let transform = self.lights[index].transform;
            self.directional_setup(&transform);
        }
        if let Some(index) = self.spot_light {
            let transform = self.lights[index].transform;
            self.spot_setup(&transform);
        }
        if let Some(index) = self.point_light {
            let transform = self.lights[index].transform;
            self.point_setup(&transform);
        }
        debug!(
            "shader buffer setup: {} lights, shadows dir={:?} spot={:?} point={:?}",
            self.lights.len(),
            self.directional_light,
            self.spot_light,
            self.point_light
        );
    }

    /// Pick at most one shadow light per type: the first directional
    /// (preferring the one flagged main), and the nearest spot and point
    /// lights, with a main flag short-circuiting the distance contest.
    fn select_shadow_lights(&mut self, camera: &Camera, lights: &[Light]) {
        self.directional_light = None;
        self.spot_light = None;
        self.point_light = None;
        let mut found_main_directional = false;
        let mut spot_distance = i64::MAX;
        let mut point_distance = i64::MAX;
        let camera_location = camera.transform.location;
        for (index, light) in lights.iter().enumerate() {
            if !light.active || !light.shadow {
                continue;
            }
            let distance = camera_location.squared_distance(light.transform.location);
            if distance > LIGHT_RANGE {
                continue;
            }
            match light.kind {
                LightType::Directional => {
                    if !found_main_directional {
                        self.directional_light = Some(index);
                        found_main_directional = light.main;
                    }
                }
                LightType::Spot => {
                    if spot_distance != i64::MIN && distance < spot_distance {
                        spot_distance = if light.main { i64::MIN } else { distance };
                        self.spot_light = Some(index);
                    }
                }
                LightType::Point => {
                    if point_distance != i64::MIN && distance < point_distance {
                        point_distance = if light.main { i64::MIN } else { distance };
                        self.point_light = Some(index);
                    }
                }
            }
        }
    }

    fn directional_setup(&mut self, light_transform: &Transform) {
        self.directional_frustum
            .set_render_target_size(DIRECTIONAL_MAP_SIZE, DIRECTIONAL_MAP_SIZE);
        self.directional_map.fill(i32::MAX);
        self.directional_matrix = self
            .directional_frustum
            .projection()
            .multiply(&light_transform.view_matrix());
    }

    fn spot_setup(&mut self, light_transform: &Transform) {
        self.spot_frustum
            .set_render_target_size(SPOT_MAP_SIZE, SPOT_MAP_SIZE);
        self.spot_map.fill(i32::MAX);
        self.spot_matrix = self
            .spot_frustum
            .projection()
            .multiply(&light_transform.view_matrix());
    }

    /// Six axis-aligned 90-degree views around the light location; the
    /// light's own rotation is ignored so the faces tile the sphere.
    fn point_setup(&mut self, light_transform: &Transform) {
        self.point_frustum
            .set_render_target_size(POINT_MAP_SIZE, POINT_MAP_SIZE);
        for map in &self.point_maps {
            map.fill(i32::MAX);
        }
        let rotations = [
            (0, 0),
            (90, 0),
            (180, 0),
            (270, 0),
            (0, 90),
            (0, -90),
        ];
        for (face, (x_degrees, y_degrees)) in rotations.into_iter().enumerate() {
            let mut view = *light_transform;
            view.rotation = Vec4::xyz(
                Fixed::from_int(x_degrees),
                Fixed::from_int(y_degrees),
                Fixed::ZERO,
            );
            self.point_matrices[face] = self
                .point_frustum
                .projection()
                .multiply(&view.view_matrix());
        }
    }

    pub fn camera_location(&self) -> Vec4 {
        self.camera_location
    }

    pub fn camera_frustum(&self) -> &Frustum {
        &self.camera_frustum
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn directional_light(&self) -> Option<&Light> {
        self.directional_light.map(|index| &self.lights[index])
    }

    pub fn directional_frustum(&self) -> &Frustum {
        &self.directional_frustum
    }

    pub fn directional_matrix(&self) -> &Mat4 {
        &self.directional_matrix
    }

    pub fn directional_map(&self) -> &Texture {
        &self.directional_map
    }

    pub fn spot_light(&self) -> Option<&Light> {
        self.spot_light.map(|index| &self.lights[index])
    }

    pub fn spot_frustum(&self) -> &Frustum {
        &self.spot_frustum
    }

    pub fn spot_matrix(&self) -> &Mat4 {
        &self.spot_matrix
    }

    pub fn spot_map(&self) -> &Texture {
        &self.spot_map
    }

    pub fn point_light(&self) -> Option<&Light> {
        self.point_light.map(|index| &self.lights[index])
    }

    pub fn point_frustum(&self) -> &Frustum {
        &self.point_frustum
    }

    pub fn point_matrices(&self) -> &[Mat4; 6] {
        &self.point_matrices
    }

    pub fn point_maps(&self) -> &[Texture; 6] {
        &self.point_maps
    }
}

impl Default for ShaderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Camera;

    fn camera() -> Camera {
        Camera::new(Transform::identity(), Frustum::default())
    }

    fn light_at(kind: LightType, x: f32) -> Light {
        Light::new(
            kind,
            Transform::new(Vec4::from_f32(x, 0.0, 0.0), Vec4::ZERO, Vec4::ONE),
        )
    }

    #[test]
    fn test_selects_nearest_spot_light() {
        let mut buffer = ShaderBuffer::new();
        let mut lights = vec![
            light_at(LightType::Spot, 50.0),
            light_at(LightType::Spot, 5.0),
            light_at(LightType::Spot, 100.0),
        ];
        buffer.setup(&camera(), &mut lights, 64, 64);
        let selected = buffer.spot_light().expect("no spot light selected");
        assert_eq!(selected.transform.location.x, Fixed::from_int(5));
    }

    #[test]
    fn test_main_light_wins_distance_contest() {
        let mut buffer = ShaderBuffer::new();
        let mut lights = vec![light_at(LightType::Spot, 5.0), {
            let mut light = light_at(LightType::Spot, 80.0);
            light.main = true;
            light
        }];
        buffer.setup(&camera(), &mut lights, 64, 64);
        let selected = buffer.spot_light().expect("no spot light selected");
        assert_eq!(selected.transform.location.x, Fixed::from_int(80));
    }

    #[test]
    fn test_no_shadow_light_when_none_qualify() {
        let mut buffer = ShaderBuffer::new();
        let mut lights = vec![{
            let mut light = light_at(LightType::Directional, 0.0);
            light.shadow = false;
            light
        }];
        buffer.setup(&camera(), &mut lights, 64, 64);
        assert!(buffer.directional_light().is_none());
        assert!(buffer.spot_light().is_none());
        assert!(buffer.point_light().is_none());
    }

    #[test]
    fn test_out_of_range_lights_are_culled() {
        let mut buffer = ShaderBuffer::new();
        let mut lights = vec![light_at(LightType::Point, 1000.0), light_at(LightType::Point, 1.0)];
        buffer.setup(&camera(), &mut lights, 64, 64);
        assert!(lights[0].culled);
        assert!(!lights[1].culled);
        // the distant light is also skipped for shadows
        let selected = buffer.point_light().expect("no point light selected");
        assert_eq!(selected.transform.location.x, Fixed::from_int(1));
    }

    #[test]
    fn test_secondary_camera_gets_no_shadow_selection() {
        let mut buffer = ShaderBuffer::new();
        let mut secondary = camera();
        secondary.main = false;
        let mut lights = vec![light_at(LightType::Directional, 0.0)];
        buffer.setup(&secondary, &mut lights, 64, 64);
        assert!(buffer.directional_light().is_none());
    }

    #[test]
    fn test_shadow_map_cleared_on_setup() {
        let mut buffer = ShaderBuffer::new();
        buffer.directional_map.set(0, 0, 123);
        let mut lights = vec![light_at(LightType::Directional, 0.0)];
        buffer.setup(&camera(), &mut lights, 64, 64);
        assert_eq!(buffer.directional_map().get(0, 0), i32::MAX);
    }
}
