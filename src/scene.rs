//! The viewer's scene: every configured object, the sun and the light.
//!
//! All assets are loaded up front by [`Scene::new`]. Each frame
//! [`Scene::render`] updates the light and draws the objects followed by the
//! sun into an already open render pass.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use cgmath::{InnerSpace, Matrix4, Rad, SquareMatrix, Vector3};

use crate::{
    camera::{Camera, Projection},
    data_structures::{model::RenderObject, texture::Texture},
    error::RenderError,
    pipelines::{
        light::{LightResources, LightUniform},
        program::{ProgramKind, ProgramLayouts, ShaderProgram},
    },
    resources::{self, csv::NormalMode},
    settings::Settings,
};

pub const LIGHT_POSITION: Vector3<f32> = Vector3::new(0.0, -0.5, 3.0);
pub const LIGHT_COLOR: [f32; 3] = [1.0, 1.0, 0.58];
pub const SUN_SCALE: f32 = 0.2;
/// The light completes one partial orbit every this many seconds.
pub const LIGHT_PERIOD: f32 = 3.5;

pub const CLEAR_COLOUR: wgpu::Color = wgpu::Color::BLACK;

/// Rotation of the light around the x axis at `seconds` since startup.
pub fn light_rotation(seconds: f32) -> Matrix4<f32> {
    let axis = Vector3::new(-0.5, 0.0, 0.0).normalize();
    Matrix4::from_axis_angle(axis, Rad(seconds % LIGHT_PERIOD))
}

pub fn sun_model(light_rotation: Matrix4<f32>) -> Matrix4<f32> {
    light_rotation * Matrix4::from_translation(LIGHT_POSITION) * Matrix4::from_scale(SUN_SCALE)
}

/// Turntable model matrix used instead of the free camera in spin mode.
pub fn spin_model(seconds: f32) -> Matrix4<f32> {
    let axis = Vector3::new(0.0, -0.5, 0.0).normalize();
    Matrix4::from_axis_angle(axis, Rad(seconds))
}

pub fn spin_view() -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(0.0, -0.7, -3.0))
}

pub struct Scene {
    objects: Vec<RenderObject>,
    sun: RenderObject,
    light: LightResources,
    textures: HashMap<PathBuf, Rc<Texture>>,
    spin: bool,
}

impl Scene {
    /// Build both programs, then load every object and the sun.
    ///
    /// Fails on the first asset that cannot be read, compiled or decoded.
    pub async fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        settings: &Settings,
        mode: NormalMode,
        spin: bool,
    ) -> anyhow::Result<Self> {
        let layouts = ProgramLayouts::new(device);

        let default_program = ShaderProgram::build(
            device,
            &layouts,
            color_format,
            &settings.shader_path(&settings.vertex_shader),
            &settings.shader_path(&settings.fragment_shader),
            ProgramKind::Textured,
        )
        .await
        .context("building the default shader program")?;
        let default_program = Rc::new(default_program);

        let sun_program = ShaderProgram::build(
            device,
            &layouts,
            color_format,
            &settings.shader_path(&settings.sun.vertex_shader),
            &settings.shader_path(&settings.sun.fragment_shader),
            ProgramKind::Untextured,
        )
        .await
        .context("building the sun shader program")?;
        let sun_program = Rc::new(sun_program);

        let mut textures: HashMap<PathBuf, Rc<Texture>> = HashMap::new();
        let mut objects = Vec::with_capacity(settings.objects.len());
        for object in &settings.objects {
            let texture_path = settings.resource_path(&object.texture);
            let texture = cached_texture(&mut textures, &texture_path, device, queue)
                .await
                .with_context(|| format!("loading texture for {}", object.model))?;

            let model_path = settings.resource_path(&object.model);
            let model = resources::load_model_csv(
                &model_path,
                mode,
                device,
                default_program.clone(),
                Some(texture),
            )
            .await
            .with_context(|| format!("loading model {:?}", model_path))?;
            objects.push(model);
        }

        let sun_path = settings.resource_path(&settings.sun.model);
        let sun = resources::load_model_csv(&sun_path, mode, device, sun_program, None)
            .await
            .with_context(|| format!("loading sun model {:?}", sun_path))?;

        let light = LightResources::new(
            LightUniform::new(LIGHT_POSITION, LIGHT_COLOR),
            device,
            &layouts.light,
        );

        log::info!(
            "scene ready: {} objects, {} textures",
            objects.len(),
            textures.len()
        );
        Ok(Self {
            objects,
            sun,
            light,
            textures,
            spin,
        })
    }

    pub fn objects(&self) -> &[RenderObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [RenderObject] {
        &mut self.objects
    }

    pub fn sun(&self) -> &RenderObject {
        &self.sun
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn light(&self) -> &LightUniform {
        &self.light.uniform
    }

    /// Update the light for this frame and draw every object, then the sun.
    pub fn render(
        &mut self,
        queue: &wgpu::Queue,
        render_pass: &mut wgpu::RenderPass<'_>,
        camera: &Camera,
        projection: &Projection,
        seconds: f32,
    ) -> Result<(), RenderError> {
        let rotation = light_rotation(seconds);
        self.light.uniform.update(rotation, camera.position());
        self.light.write_to_buffer(queue);

        let projection = projection.calc_matrix();
        let (model, view) = if self.spin {
            (spin_model(seconds), spin_view())
        } else {
            (Matrix4::identity(), camera.look_at())
        };

        for object in &self.objects {
            object.render(
                queue,
                render_pass,
                &self.light.bind_group,
                model,
                view,
                projection,
            )?;
        }
        self.sun.render(
            queue,
            render_pass,
            &self.light.bind_group,
            sun_model(rotation),
            view,
            projection,
        )
    }
}

/// Return the texture at `path`, decoding it only the first time it is seen.
async fn cached_texture(
    cache: &mut HashMap<PathBuf, Rc<Texture>>,
    path: &Path,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Rc<Texture>> {
    if let Some(texture) = cache.get(path) {
        return Ok(texture.clone());
    }
    let texture = Rc::new(resources::load_texture(path, device, queue).await?);
    cache.insert(path.to_path_buf(), texture.clone());
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Point3, Transform, Vector4};

    fn assert_close(a: Point3<f32>, b: Point3<f32>) {
        assert!((a - b).magnitude() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn light_starts_unrotated_and_wraps_its_period() {
        assert_eq!(light_rotation(0.0), Matrix4::identity());
        let early = light_rotation(1.0);
        let wrapped = light_rotation(1.0 + LIGHT_PERIOD);
        for (a, b) in [early.x, early.y, early.z, early.w]
            .iter()
            .zip([wrapped.x, wrapped.y, wrapped.z, wrapped.w].iter())
        {
            assert!((a - b).magnitude() < 1e-5);
        }
    }

    #[test]
    fn light_rotates_about_negative_x() {
        // a quarter turn about -x takes +y to -z
        let rotated = light_rotation(std::f32::consts::FRAC_PI_2)
            .transform_point(Point3::new(0.0, 1.0, 0.0));
        assert_close(rotated, Point3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn sun_sits_at_the_light_position() {
        let model = sun_model(Matrix4::identity());
        assert_close(
            model.transform_point(Point3::new(0.0, 0.0, 0.0)),
            Point3::new(0.0, -0.5, 3.0),
        );
        // scaled down around its own origin
        assert_close(
            model.transform_point(Point3::new(1.0, 0.0, 0.0)),
            Point3::new(0.2, -0.5, 3.0),
        );
    }

    #[test]
    fn sun_follows_the_light_rotation() {
        let rotation = light_rotation(2.0);
        let expected = rotation * Vector4::new(0.0, -0.5, 3.0, 1.0);
        let centre = sun_model(rotation).transform_point(Point3::new(0.0, 0.0, 0.0));
        assert_close(centre, Point3::new(expected.x, expected.y, expected.z));
    }

    #[test]
    fn spin_mode_views_from_a_fixed_distance() {
        assert_eq!(spin_model(0.0), Matrix4::identity());
        let eye = spin_view().transform_point(Point3::new(0.0, 0.0, 0.0));
        assert_close(eye, Point3::new(0.0, -0.7, -3.0));
        // the turntable axis is vertical, so heights are preserved
        let p = spin_model(1.3).transform_point(Point3::new(1.0, 0.25, 0.0));
        assert!((p.y - 0.25).abs() < 1e-5);
    }
}
