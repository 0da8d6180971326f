//! Light accumulation
//!
//! The same evaluation backs all three shading models; they only differ in
//! where they call it (per face, per vertex, per pixel). `location` and
//! `normal` are world-space, `normal` must arrive normalized.

use crate::color::Color;
use crate::fixed::{self, Fixed, FP_ONE};
use crate::scene::{Light, LightType, Material};
use crate::vector::Vec4;

/// Accumulate every active light at a world-space point.
pub(crate) fn shade(
    location: Vec4,
    normal: Vec4,
    material: &Material,
    lights: &[Light],
    camera_location: Vec4,
) -> Color {
    let view_direction = (camera_location - location).normalized();
    let mut color = Color::BLACK;
    for light in lights {
        if !light.active || light.culled {
            continue;
        }
        let lit = match light.kind {
            LightType::Directional => directional_light(normal, material, light, view_direction),
            LightType::Point => point_light(location, normal, material, light, view_direction),
            LightType::Spot => spot_light(location, normal, material, light, view_direction),
        };
        color = color.add(lit);
        color = color.add(light.ambient_color);
        color = color.scale(light.strength);
    }
    color
}

fn directional_light(
    normal: Vec4,
    material: &Material,
    light: &Light,
    view_direction: Vec4,
) -> Color {
    let light_direction = -light.direction;
    let mut color = diffuse(normal, light_direction, material, light);
    if material.shininess > Fixed::ZERO {
        color = color.add(specular(normal, light_direction, material, light, view_direction));
    }
    color
}

fn point_light(
    location: Vec4,
    normal: Vec4,
    material: &Material,
    light: &Light,
    view_direction: Vec4,
) -> Color {
    let light_direction = (light.transform.location - location).normalized();
    let attenuation = attenuation(location, light);
    let mut color = diffuse(normal, light_direction, material, light).scale(attenuation);
    if material.shininess > Fixed::ZERO {
        let highlight = specular(normal, light_direction, material, light, view_direction);
        color = color.add(highlight.scale(attenuation));
    }
    color
}

fn spot_light(
    location: Vec4,
    normal: Vec4,
    material: &Material,
    light: &Light,
    view_direction: Vec4,
) -> Color {
    let light_direction = (light.transform.location - location).normalized();
    let intensity = attenuation(location, light) * spot_intensity(light_direction, light);
    let mut color = diffuse(normal, light_direction, material, light).scale(intensity);
    if material.shininess > Fixed::ZERO {
        let highlight = specular(normal, light_direction, material, light, view_direction);
        color = color.add(highlight.scale(intensity));
    }
    color
}

fn diffuse(normal: Vec4, light_direction: Vec4, material: &Material, light: &Light) -> Color {
    let intensity = normal.dot(light_direction).max(Fixed::ZERO);
    material.diffuse_color.scale(intensity).modulate(light.color)
}

fn specular(
    normal: Vec4,
    light_direction: Vec4,
    material: &Material,
    light: &Light,
    view_direction: Vec4,
) -> Color {
    let reflected = (-light_direction).reflected(normal);
    let intensity = view_direction
        .dot(reflected)
        .max(Fixed::ZERO)
        .pow(material.shininess);
    material.specular_color.scale(intensity).modulate(light.color)
}

fn attenuation(location: Vec4, light: &Light) -> Fixed {
    let distance = light.transform.location.distance(location);
    let distance_squared = Fixed(fixed::mul(distance.raw(), distance.raw()));
    let falloff = light.constant_attenuation
        + light.linear_attenuation * distance
        + light.quadratic_attenuation * distance_squared;
    // a zero falloff would divide by zero; degrade to full brightness
    Fixed(fixed::div(FP_ONE, falloff.raw().max(1)))
}

fn spot_intensity(light_direction: Vec4, light: &Light) -> Fixed {
    let cone_axis = -light.direction;
    let theta = light_direction.dot(cone_axis);
    let softness = Fixed(light.spot_softness.raw().max(1));
    ((theta - light.spot_size_cos()) / softness).clamp(Fixed::ZERO, Fixed::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::LightType;
    use crate::transform::Transform;

    fn white_directional(direction: Vec4) -> Light {
        let mut light = Light::new(LightType::Directional, Transform::identity());
        light.direction = direction;
        light.ambient_color = Color::BLACK;
        light
    }

    fn matte() -> Material {
        Material {
            diffuse_color: Color::rgb(200, 200, 200),
            ..Material::default()
        }
    }

    #[test]
    fn test_facing_surface_brighter_than_grazing() {
        let material = matte();
        let lights = vec![white_directional(Vec4::DOWN)];
        let facing = shade(Vec4::ZERO, Vec4::UP, &material, &lights, Vec4::from_f32(0.0, 5.0, 0.0));
        let grazing = shade(Vec4::ZERO, Vec4::RIGHT, &material, &lights, Vec4::from_f32(0.0, 5.0, 0.0));
        assert!(facing.red() > grazing.red());
        // a surface facing away gets no diffuse at all
        assert_eq!(grazing.red(), 0);
    }

    #[test]
    fn test_ambient_reaches_unlit_surfaces() {
        let material = matte();
        let mut light = white_directional(Vec4::DOWN);
        light.ambient_color = Color::rgb(30, 30, 30);
        let lit = shade(Vec4::ZERO, Vec4::DOWN, &material, &[light], Vec4::from_f32(0.0, 5.0, 0.0));
        assert_eq!(lit.red(), 30);
    }

    #[test]
    fn test_point_light_attenuates_with_distance() {
        let material = matte();
        let mut light = Light::new(
            LightType::Point,
            Transform::new(Vec4::from_f32(0.0, 1.0, 0.0), Vec4::ZERO, Vec4::ONE),
        );
        light.ambient_color = Color::BLACK;
        let lights = vec![light];
        let camera = Vec4::from_f32(0.0, 5.0, 0.0);
        let near = shade(Vec4::ZERO, Vec4::UP, &material, &lights, camera);
        let far = shade(Vec4::from_f32(0.0, -8.0, 0.0), Vec4::UP, &material, &lights, camera);
        assert!(near.red() > far.red(), "near {} far {}", near.red(), far.red());
    }

    #[test]
    fn test_spot_cone_cuts_off() {
        let material = matte();
        let mut light = Light::new(
            LightType::Spot,
            Transform::new(Vec4::from_f32(0.0, 2.0, 0.0), Vec4::ZERO, Vec4::ONE),
        );
        light.direction = Vec4::DOWN;
        light.ambient_color = Color::BLACK;
        let lights = vec![light];
        let camera = Vec4::from_f32(0.0, 5.0, 0.0);
        // directly under the cone axis
        let inside = shade(Vec4::ZERO, Vec4::UP, &material, &lights, camera);
        // far to the side, outside the 60 degree cone
        let outside = shade(Vec4::from_f32(20.0, 0.0, 0.0), Vec4::UP, &material, &lights, camera);
        assert!(inside.red() > 0);
        assert_eq!(outside.red(), 0);
    }

    #[test]
    fn test_specular_needs_shininess() {
        let mut material = matte();
        let lights = vec![white_directional(Vec4::DOWN)];
        let camera = Vec4::from_f32(0.0, 5.0, 0.0);
        let without = shade(Vec4::ZERO, Vec4::UP, &material, &lights, camera);
        material.shininess = Fixed::from_int(4);
        material.specular_color = Color::WHITE;
        let with = shade(Vec4::ZERO, Vec4::UP, &material, &lights, camera);
        assert!(with.red() >= without.red());
        assert!(with.red() > without.red(), "specular highlight missing");
    }

    #[test]
    fn test_inactive_and_culled_lights_skipped() {
        let material = matte();
        let mut inactive = white_directional(Vec4::DOWN);
        inactive.active = false;
        let mut culled = white_directional(Vec4::DOWN);
        culled.culled = true;
        let lit = shade(
            Vec4::ZERO,
            Vec4::UP,
            &material,
            &[inactive, culled],
            Vec4::from_f32(0.0, 5.0, 0.0),
        );
        assert_eq!(lit, Color::BLACK);
    }
}
