use glam::Vec3;

/// Upper bound on lights a scene uploads per draw.
pub const MAX_LIGHTS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

impl LightKind {
    /// Value of the `type` field in the shader light struct.
    pub fn shader_index(self) -> i32 {
        match self {
            LightKind::Directional => 0,
            LightKind::Point => 1,
            LightKind::Spot => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Light {
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            position: Vec3::ZERO,
            direction: direction.normalize_or_zero(),
            color,
            intensity,
        }
    }

    pub fn point(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            direction: Vec3::ZERO,
            color,
            intensity,
        }
    }

    pub fn spot(position: Vec3, direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            position,
            direction: direction.normalize_or_zero(),
            color,
            intensity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_are_normalised() {
        let light = Light::directional(Vec3::new(0.0, -4.0, 0.0), Vec3::ONE, 1.0);
        assert!(light.direction.abs_diff_eq(Vec3::NEG_Y, 1e-6));
    }
}
