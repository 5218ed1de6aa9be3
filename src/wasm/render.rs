use glam::{Quat, Vec3};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram,
    WebGlShader, WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::driver::{GlyphSource, Renderer, SceneState};
use crate::error::VizError;
use crate::scene::Category;
use crate::variant::{parse_hex_color, GridConfig, Palette};

/// Font the icon glyphs are drawn with; polled until the page has it.
const ICON_FONT: &str = "600 16px Inter";
const RING_SEGMENTS: usize = 96;
/// position (3) + size (1) + rgba (4)
const STRIDE: usize = 8;

const VERTEX_SHADER: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 1) in float a_size;
layout(location = 2) in vec4 a_color;
uniform mat4 u_view_proj;
uniform float u_point_scale;
out vec4 v_color;
void main() {
    gl_Position = u_view_proj * vec4(a_position, 1.0);
    gl_PointSize = a_size * u_point_scale / gl_Position.w;
    v_color = a_color;
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;
in vec4 v_color;
uniform float u_time;
uniform bool u_points;
out vec4 out_color;
void main() {
    float alpha = v_color.a;
    if (u_points) {
        float r = length(gl_PointCoord - 0.5);
        if (r > 0.5) discard;
        alpha *= smoothstep(0.5, 0.3, r) * (0.92 + 0.08 * sin(u_time * 6.2831 + r * 12.0));
    }
    out_color = vec4(v_color.rgb, alpha);
}
"#;

struct Colors {
    background: [f32; 3],
    grid: [f32; 3],
    nebula: [f32; 3],
    highlight: [f32; 3],
    particles: [f32; 3],
    rings: [f32; 3],
    sphere: [f32; 3],
    well: [f32; 3],
    icon: [f32; 3],
}

impl Colors {
    fn from_palette(palette: &Palette) -> Self {
        let rgb = |hex: &str| parse_hex_color(hex).unwrap_or([0.5; 3]);
        Self {
            background: rgb(&palette.background),
            grid: rgb(&palette.grid),
            nebula: rgb(&palette.nebula_core),
            highlight: rgb(&palette.nebula_highlight),
            particles: rgb(&palette.particles),
            rings: rgb(&palette.rings),
            sphere: rgb(&palette.sphere),
            well: rgb(&palette.well),
            icon: rgb(&palette.icon),
        }
    }
}

fn push_vertex(out: &mut Vec<f32>, position: Vec3, size: f32, rgb: [f32; 3], alpha: f32) {
    out.extend_from_slice(&position.to_array());
    out.extend_from_slice(&[size, rgb[0], rgb[1], rgb[2], alpha]);
}

fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t, a[2] + (b[2] - a[2]) * t]
}

/// Draws every visible object as a soft point sprite and rings as line loops.
pub struct GlRenderer {
    gl: GL,
    document: Document,
    program: WebGlProgram,
    vao: WebGlVertexArrayObject,
    buffer: WebGlBuffer,
    u_view_proj: Option<WebGlUniformLocation>,
    u_point_scale: Option<WebGlUniformLocation>,
    u_time: Option<WebGlUniformLocation>,
    u_points: Option<WebGlUniformLocation>,
    colors: Colors,
    grid: Option<GridConfig>,
    glyphs: GlyphSource,
    points: Vec<f32>,
    lines: Vec<f32>,
    height: f32,
}

fn compile(gl: &GL, kind: u32, source: &str) -> Result<WebGlShader, VizError> {
    let shader = gl
        .create_shader(kind)
        .ok_or(VizError::Unsupported("cannot create shader"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    if gl.get_shader_parameter(&shader, GL::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        Err(VizError::Js(gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}

fn link(gl: &GL, vertex: &WebGlShader, fragment: &WebGlShader) -> Result<WebGlProgram, VizError> {
    let program = gl
        .create_program()
        .ok_or(VizError::Unsupported("cannot create program"))?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);
    if gl.get_program_parameter(&program, GL::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        Err(VizError::Js(gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

impl GlRenderer {
    pub fn new(
        canvas: &HtmlCanvasElement,
        document: Document,
        palette: &Palette,
        grid: Option<GridConfig>,
    ) -> Result<Self, VizError> {
        let gl: GL = canvas
            .get_context("webgl2")?
            .ok_or(VizError::Unsupported("WebGL2 not supported"))?
            .dyn_into()
            .map_err(|_| VizError::Unsupported("context is not WebGL2"))?;

        let vertex = compile(&gl, GL::VERTEX_SHADER, VERTEX_SHADER)?;
        let fragment = compile(&gl, GL::FRAGMENT_SHADER, FRAGMENT_SHADER)?;
        let program = link(&gl, &vertex, &fragment)?;
        gl.delete_shader(Some(&vertex));
        gl.delete_shader(Some(&fragment));

        let vao = gl
            .create_vertex_array()
            .ok_or(VizError::Unsupported("cannot create vertex array"))?;
        let buffer = gl.create_buffer().ok_or(VizError::Unsupported("cannot create buffer"))?;
        gl.bind_vertex_array(Some(&vao));
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
        let stride = (STRIDE * 4) as i32;
        gl.vertex_attrib_pointer_with_i32(0, 3, GL::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_with_i32(1, 1, GL::FLOAT, false, stride, 12);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_with_i32(2, 4, GL::FLOAT, false, stride, 16);
        gl.enable_vertex_attrib_array(2);
        gl.bind_vertex_array(None);

        gl.enable(GL::BLEND);
        gl.blend_func(GL::SRC_ALPHA, GL::ONE_MINUS_SRC_ALPHA);

        Ok(Self {
            u_view_proj: gl.get_uniform_location(&program, "u_view_proj"),
            u_point_scale: gl.get_uniform_location(&program, "u_point_scale"),
            u_time: gl.get_uniform_location(&program, "u_time"),
            u_points: gl.get_uniform_location(&program, "u_points"),
            gl,
            document,
            program,
            vao,
            buffer,
            colors: Colors::from_palette(palette),
            grid,
            glyphs: GlyphSource::Placeholder,
            points: Vec::new(),
            lines: Vec::new(),
            height: canvas.height() as f32,
        })
    }

    /// Match the drawing buffer size in device pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gl.viewport(0, 0, width as i32, height as i32);
        self.height = height as f32;
    }

    fn push_grid(&mut self) {
        let Some(grid) = self.grid else {
            return;
        };
        let half = grid.size / 2.0;
        let step = grid.size / grid.divisions.max(1) as f32;
        for i in 0..=grid.divisions {
            let offset = -half + i as f32 * step;
            for (a, b) in [
                (Vec3::new(offset, -half, grid.depth), Vec3::new(offset, half, grid.depth)),
                (Vec3::new(-half, offset, grid.depth), Vec3::new(half, offset, grid.depth)),
            ] {
                push_vertex(&mut self.lines, a, 0.0, self.colors.grid, grid.opacity);
                push_vertex(&mut self.lines, b, 0.0, self.colors.grid, grid.opacity);
            }
        }
    }

    fn push_ring(&mut self, center: Vec3, radius: f32, rotation: Vec3, alpha: f32) {
        let orient = Quat::from_rotation_x(rotation.x) * Quat::from_rotation_z(rotation.z);
        let point = |i: usize| {
            let angle = i as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
            center + orient * Vec3::new(angle.cos() * radius * 1.4, angle.sin() * radius, 0.0)
        };
        for i in 0..RING_SEGMENTS {
            push_vertex(&mut self.lines, point(i), 0.0, self.colors.rings, alpha);
            push_vertex(&mut self.lines, point(i + 1), 0.0, self.colors.rings, alpha);
        }
    }

    fn collect(&mut self, scene: &SceneState) {
        self.points.clear();
        self.lines.clear();
        self.push_grid();

        for object in scene.registry().objects() {
            if !object.visible() {
                continue;
            }
            let alpha = object.opacity();
            let size = object.scale * 2.0;
            let rgb = match object.category() {
                Category::Ring if object.id().ends_with(".arrow") => self.colors.rings,
                Category::Ring => {
                    self.push_ring(object.position, object.scale, object.rotation, alpha);
                    continue;
                }
                Category::Background => self.colors.nebula,
                Category::PrimaryBody => self.colors.sphere,
                Category::Well => self.colors.well,
                Category::OrbitParticle => self.colors.particles,
                Category::Icon => {
                    let base = match self.glyphs {
                        GlyphSource::Font => self.colors.icon,
                        GlyphSource::Placeholder => self.colors.rings,
                    };
                    let emissive = object.animation.map(|a| a.emissive).unwrap_or_default();
                    mix(base, self.colors.highlight, emissive.clamp(0.0, 1.0))
                }
            };
            push_vertex(&mut self.points, object.position, size, rgb, alpha);
        }

        if let Some(field) = scene.particles() {
            let alpha = scene
                .registry()
                .get(field.follows())
                .map(|o| o.opacity())
                .unwrap_or_default()
                * 0.7;
            if alpha > 0.0 {
                let rgb = self.colors.particles;
                for particle in field.particles() {
                    push_vertex(&mut self.points, particle.position, particle.size, rgb, alpha);
                }
            }
        }
    }

    fn draw(&self, data: &[f32], mode: u32, points: bool) {
        if data.is_empty() {
            return;
        }
        let array = js_sys::Float32Array::from(data);
        self.gl.bind_buffer(GL::ARRAY_BUFFER, Some(&self.buffer));
        self.gl
            .buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &array, GL::DYNAMIC_DRAW);
        self.gl.uniform1i(self.u_points.as_ref(), i32::from(points));
        self.gl.draw_arrays(mode, 0, (data.len() / STRIDE) as i32);
    }
}

impl Renderer for GlRenderer {
    fn render(&mut self, scene: &SceneState) {
        self.collect(scene);

        let gl = &self.gl;
        let bg = self.colors.background;
        gl.clear_color(bg[0], bg[1], bg[2], 1.0);
        gl.clear(GL::COLOR_BUFFER_BIT);

        gl.use_program(Some(&self.program));
        gl.bind_vertex_array(Some(&self.vao));
        gl.uniform_matrix4fv_with_f32_array(
            self.u_view_proj.as_ref(),
            false,
            &scene.camera().view_projection().to_cols_array(),
        );
        gl.uniform1f(self.u_point_scale.as_ref(), self.height * 0.5);
        gl.uniform1f(self.u_time.as_ref(), scene.effect_time());

        self.draw(&self.lines, GL::LINES, false);
        self.draw(&self.points, GL::POINTS, true);
        self.gl.bind_vertex_array(None);
    }

    fn assets_ready(&self) -> bool {
        self.document.fonts().check(ICON_FONT).unwrap_or(false)
    }

    fn regenerate_icon_textures(&mut self, source: GlyphSource) {
        log::info!("icon glyphs drawn from {source:?}");
        self.glyphs = source;
    }

    fn release(&mut self) {
        self.gl.delete_buffer(Some(&self.buffer));
        self.gl.delete_vertex_array(Some(&self.vao));
        self.gl.delete_program(Some(&self.program));
    }
}
