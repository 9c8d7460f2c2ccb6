use glam::Vec3;

const MAX_PITCH: f32 = 85.0 * std::f32::consts::PI / 180.0;

/// Viewer position plus Euler rotation in radians (x = pitch, y = yaw,
/// z = roll).
///
/// The entity pass always looks at the world origin from `translation`; only
/// the skybox follows `rotation.y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub translation: Vec3,
    pub rotation: Vec3,
}

impl Camera {
    pub fn new(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Vec3::ZERO,
        }
    }

    pub fn distance(&self) -> f32 {
        self.translation.length()
    }

    /// Moves the camera around the origin on its current sphere. Pitch is
    /// clamped short of the poles where the look-at basis degenerates.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let radius = self.distance();
        if radius <= f32::EPSILON {
            return;
        }

        let current_yaw = self.translation.x.atan2(self.translation.z);
        let current_pitch = (self.translation.y / radius).clamp(-1.0, 1.0).asin();

        let new_yaw = current_yaw + yaw;
        let new_pitch = (current_pitch + pitch).clamp(-MAX_PITCH, MAX_PITCH);

        self.translation = Vec3::new(
            radius * new_pitch.cos() * new_yaw.sin(),
            radius * new_pitch.sin(),
            radius * new_pitch.cos() * new_yaw.cos(),
        );
        self.rotation.x = new_pitch;
        self.rotation.y += yaw;
    }

    /// Moves along the line to the origin, never closer than `min_distance`.
    pub fn zoom(&mut self, amount: f32, min_distance: f32) {
        let radius = self.distance();
        if radius <= f32::EPSILON {
            return;
        }
        let target = (radius - amount).max(min_distance);
        self.translation *= target / radius;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 5.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_keeps_the_distance() {
        let mut camera = Camera::default();
        camera.orbit(0.7, 0.3);
        assert!((camera.distance() - 5.0).abs() < 1e-4);
        assert!((camera.rotation.y - 0.7).abs() < 1e-6);
    }

    #[test]
    fn orbit_quarter_turn_moves_to_positive_x() {
        let mut camera = Camera::default();
        camera.orbit(std::f32::consts::FRAC_PI_2, 0.0);
        assert!(camera
            .translation
            .abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn pitch_is_clamped_before_the_pole() {
        let mut camera = Camera::default();
        camera.orbit(0.0, 10.0);
        assert!(camera.translation.y < camera.distance());
        assert!((camera.rotation.x - MAX_PITCH).abs() < 1e-6);
    }

    #[test]
    fn zoom_stops_at_the_minimum() {
        let mut camera = Camera::default();
        camera.zoom(10.0, 1.0);
        assert!((camera.distance() - 1.0).abs() < 1e-5);
    }
}
