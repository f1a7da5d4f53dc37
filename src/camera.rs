//! Free-look camera, projection and keyboard controller.
//!
//! The camera keeps yaw/pitch in degrees and derives its front vector from
//! them. Movement is a fixed step per call, so how far a held key travels
//! depends on the frame rate.

use std::collections::HashSet;

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3, perspective};
use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// cgmath produces OpenGL clip space (z in -1..1); wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub const PITCH_LIMIT: f32 = 89.0;

#[derive(Debug, Clone)]
pub struct Camera {
    position: Point3<f32>,
    front: Vector3<f32>,
    up: Vector3<f32>,
    sensitivity: f32,
    yaw: f32,
    pitch: f32,
    speed: f32,
}

impl Camera {
    pub const DEFAULT_SENSITIVITY: f32 = 1.0;
    pub const DEFAULT_YAW: f32 = -90.0;
    pub const DEFAULT_PITCH: f32 = 0.0;
    pub const DEFAULT_SPEED: f32 = 0.05;

    /// Camera with the default sensitivity, yaw, pitch and speed.
    pub fn new<P: Into<Point3<f32>>, V: Into<Vector3<f32>>>(position: P, front: V, up: V) -> Self {
        Self::with_params(
            position,
            front,
            up,
            Self::DEFAULT_SENSITIVITY,
            Self::DEFAULT_YAW,
            Self::DEFAULT_PITCH,
            Self::DEFAULT_SPEED,
        )
    }

    /// `front` is only a placeholder: it is recomputed from `yaw` and `pitch`
    /// before this returns.
    pub fn with_params<P: Into<Point3<f32>>, V: Into<Vector3<f32>>>(
        position: P,
        front: V,
        up: V,
        sensitivity: f32,
        yaw: f32,
        pitch: f32,
        speed: f32,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            front: front.into(),
            up: up.into(),
            sensitivity,
            yaw,
            pitch,
            speed,
        };
        camera.turn(0.0, 0.0);
        camera
    }

    pub fn turn(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let (yaw_sin, yaw_cos) = self.yaw.to_radians().sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.to_radians().sin_cos();
        self.front = Vector3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize();
    }

    pub fn move_front(&mut self) {
        self.position += self.front * self.speed;
    }

    pub fn move_back(&mut self) {
        self.position -= self.front * self.speed;
    }

    pub fn move_left(&mut self) {
        self.position -= self.right() * self.speed;
    }

    pub fn move_right(&mut self) {
        self.position += self.right() * self.speed;
    }

    pub fn look_at(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    fn right(&self) -> Vector3<f32> {
        self.front.cross(self.up).normalize()
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}

impl Default for Camera {
    /// At z = 3 looking down -z towards the origin.
    fn default() -> Self {
        Self::new((0.0, 0.0, 3.0), (0.0, 0.0, -1.0), (0.0, 1.0, 0.0))
    }
}

#[derive(Debug, Clone)]
pub struct Projection {
    aspect: f32,
    fovy: Deg<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Deg<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// A camera operation bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraAction {
    Quit,
    MoveFront,
    MoveBack,
    MoveLeft,
    MoveRight,
    LookUp,
    LookDown,
    LookLeft,
    LookRight,
}

impl CameraAction {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        let action = match key {
            KeyCode::KeyQ => Self::Quit,
            KeyCode::KeyW => Self::MoveFront,
            KeyCode::KeyS => Self::MoveBack,
            KeyCode::KeyA => Self::MoveLeft,
            KeyCode::KeyD => Self::MoveRight,
            KeyCode::KeyJ => Self::LookUp,
            KeyCode::KeyK => Self::LookDown,
            KeyCode::KeyH => Self::LookLeft,
            KeyCode::KeyL => Self::LookRight,
            _ => return None,
        };
        Some(action)
    }

    fn apply(self, camera: &mut Camera) {
        match self {
            Self::Quit => (),
            Self::MoveFront => camera.move_front(),
            Self::MoveBack => camera.move_back(),
            Self::MoveLeft => camera.move_left(),
            Self::MoveRight => camera.move_right(),
            Self::LookUp => camera.turn(0.0, 1.0),
            Self::LookDown => camera.turn(0.0, -1.0),
            Self::LookLeft => camera.turn(-1.0, 0.0),
            Self::LookRight => camera.turn(1.0, 0.0),
        }
    }
}

/// Tracks which bound keys are held and applies them once per frame.
#[derive(Debug, Default)]
pub struct CameraController {
    held: HashSet<KeyCode>,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the event was a bound key.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => self.handle_key(*key, *state),
            WindowEvent::Focused(false) => {
                self.held.clear();
                false
            }
            _ => false,
        }
    }

    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        if CameraAction::from_key(key).is_none() {
            return false;
        }
        match state {
            ElementState::Pressed => self.held.insert(key),
            ElementState::Released => self.held.remove(&key),
        };
        true
    }

    pub fn quit_requested(&self) -> bool {
        self.held.contains(&KeyCode::KeyQ)
    }

    /// Apply every held key in a fixed order: moves first, then turns.
    pub fn update_camera(&self, camera: &mut Camera) {
        const ORDER: [KeyCode; 8] = [
            KeyCode::KeyW,
            KeyCode::KeyS,
            KeyCode::KeyA,
            KeyCode::KeyD,
            KeyCode::KeyJ,
            KeyCode::KeyK,
            KeyCode::KeyH,
            KeyCode::KeyL,
        ];
        ORDER
            .into_iter()
            .filter(|key| self.held.contains(key))
            .filter_map(CameraAction::from_key)
            .for_each(|action| action.apply(camera));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{EuclideanSpace, SquareMatrix};

    fn assert_close(a: Vector3<f32>, b: Vector3<f32>) {
        assert!((a - b).magnitude() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn construction_materializes_front_from_angles() {
        let camera = Camera::new((0.0, 0.0, 0.0), (1.0, 1.0, 1.0), (0.0, 1.0, 0.0));
        assert_close(camera.front(), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(camera.yaw(), -90.0);
        assert_eq!(camera.pitch(), 0.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::default();
        for _ in 0..10_000 {
            camera.turn(0.0, 10.0);
        }
        assert_eq!(camera.pitch(), 89.0);
        assert!(camera.front().y < 1.0);

        for _ in 0..10_000 {
            camera.turn(0.0, -10.0);
        }
        assert_eq!(camera.pitch(), -89.0);
    }

    #[test]
    fn yaw_is_unbounded_and_scaled_by_sensitivity() {
        let mut camera = Camera::with_params(
            (0.0, 0.0, 0.0),
            (0.0, 0.0, -1.0),
            (0.0, 1.0, 0.0),
            2.0,
            0.0,
            0.0,
            1.0,
        );
        camera.turn(200.0, 0.0);
        assert_eq!(camera.yaw(), 400.0);
        // 400 degrees is 40 degrees around
        let expected = Vector3::new(40f32.to_radians().cos(), 0.0, 40f32.to_radians().sin());
        assert_close(camera.front(), expected);
    }

    #[test]
    fn default_look_at_is_a_translation() {
        let view = Camera::default().look_at();
        let expected = Matrix4::from_translation(Vector3::new(0.0, 0.0, -3.0));
        for (actual, expected) in Into::<[[f32; 4]; 4]>::into(view)
            .iter()
            .flatten()
            .zip(Into::<[[f32; 4]; 4]>::into(expected).iter().flatten())
        {
            assert!((actual - expected).abs() < 1e-5, "{:?}", view);
        }
        // the origin ends up three units in front of the camera
        let origin = view * Point3::origin().to_homogeneous();
        assert!((origin.z + 3.0).abs() < 1e-5);
        assert!(view.is_invertible());
    }

    #[test]
    fn moves_follow_front_and_strafe_axes() {
        let mut camera = Camera::default();
        camera.move_front();
        assert_close(camera.position().to_vec(), Vector3::new(0.0, 0.0, 2.95));
        camera.move_back();
        camera.move_back();
        assert_close(camera.position().to_vec(), Vector3::new(0.0, 0.0, 3.05));

        let mut camera = Camera::default();
        camera.move_right();
        assert_close(camera.position().to_vec(), Vector3::new(0.05, 0.0, 3.0));
        camera.move_left();
        camera.move_left();
        assert_close(camera.position().to_vec(), Vector3::new(-0.05, 0.0, 3.0));
    }

    #[test]
    fn projection_tracks_the_surface_aspect() {
        let mut projection = Projection::new(800, 600, Deg(45.0), 0.1, 100.0);
        assert!((projection.aspect() - 800.0 / 600.0).abs() < 1e-6);
        projection.resize(100, 0);
        assert_eq!(projection.aspect(), 100.0);

        // a point on the near plane maps to depth 0 in wgpu clip space
        projection.resize(1, 1);
        let clip = projection.calc_matrix() * cgmath::Vector4::new(0.0, 0.0, -0.1, 1.0);
        assert!((clip.z / clip.w).abs() < 1e-5);
    }

    #[test]
    fn controller_maps_keys_to_operations() {
        let mut controller = CameraController::new();
        assert!(!controller.handle_key(KeyCode::KeyZ, ElementState::Pressed));
        assert!(controller.handle_key(KeyCode::KeyW, ElementState::Pressed));
        assert!(controller.handle_key(KeyCode::KeyL, ElementState::Pressed));

        let mut camera = Camera::default();
        controller.update_camera(&mut camera);
        assert_eq!(camera.yaw(), -89.0);
        assert!(camera.position().z < 3.0);
        assert!(!controller.quit_requested());

        controller.handle_key(KeyCode::KeyW, ElementState::Released);
        controller.handle_key(KeyCode::KeyL, ElementState::Released);
        controller.handle_key(KeyCode::KeyJ, ElementState::Pressed);
        let before = camera.position();
        controller.update_camera(&mut camera);
        assert_eq!(camera.position(), before);
        assert_eq!(camera.pitch(), 1.0);

        controller.handle_key(KeyCode::KeyQ, ElementState::Pressed);
        assert!(controller.quit_requested());
    }

    #[test]
    fn every_binding_is_distinct() {
        let keys = [
            KeyCode::KeyQ,
            KeyCode::KeyW,
            KeyCode::KeyS,
            KeyCode::KeyA,
            KeyCode::KeyD,
            KeyCode::KeyJ,
            KeyCode::KeyK,
            KeyCode::KeyH,
            KeyCode::KeyL,
        ];
        let actions: HashSet<_> = keys
            .iter()
            .map(|k| format!("{:?}", CameraAction::from_key(*k).unwrap()))
            .collect();
        assert_eq!(actions.len(), keys.len());
    }
}
