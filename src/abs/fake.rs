//! In-memory [`GlDriver`] for tests.
//!
//! Models just enough of GL to check the wrappers: compile fails on a missing `main` or an
//! `#error` line, link fails when a fragment `in` has no matching vertex `out`, uniforms are
//! discovered from `uniform` declarations, draws are validated against the bound state and
//! violations raise the error flag.

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use super::driver::{CreateError, GlDriver};

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    I32(i32),
    IVec3([i32; 3]),
    F32(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeLocation {
    pub program: u32,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct FakeShader {
    pub stage: u32,
    pub source: String,
    pub compiled: bool,
    pub log: String,
    pub deleted: bool,
    pub pending_delete: bool,
}

#[derive(Debug, Default)]
pub struct FakeProgram {
    pub attached: Vec<u32>,
    pub linked: bool,
    pub log: String,
    pub uniforms: BTreeSet<String>,
    pub deleted: bool,
    pub delete_calls: usize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FakeAttribute {
    pub size: i32,
    pub stride: i32,
    pub offset: i32,
    pub enabled: bool,
}

#[derive(Debug, Default)]
pub struct FakeVertexArray {
    pub element_buffer: Option<u32>,
    pub attributes: BTreeMap<u32, FakeAttribute>,
    pub deleted: bool,
}

#[derive(Debug, Default)]
pub struct FakeTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: usize,
    pub parameters: BTreeMap<u32, i32>,
    pub mipmapped: bool,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub mode: u32,
    pub count: i32,
    pub indexed: bool,
    pub program: u32,
    pub vertex_array: u32,
    pub textures: BTreeMap<u32, u32>,
}

#[derive(Debug, Default)]
pub struct State {
    next_id: u32,
    pub shaders: BTreeMap<u32, FakeShader>,
    pub programs: BTreeMap<u32, FakeProgram>,
    pub buffers: BTreeMap<u32, Option<Vec<u8>>>,
    pub vertex_arrays: BTreeMap<u32, FakeVertexArray>,
    pub textures: BTreeMap<u32, FakeTexture>,
    pub current_program: Option<u32>,
    pub bound_vertex_array: Option<u32>,
    pub bound_array_buffer: Option<u32>,
    pub active_unit: u32,
    pub bound_textures: BTreeMap<u32, u32>,
    pub uniform_writes: Vec<(u32, String, UniformValue)>,
    pub draws: Vec<DrawCall>,
    pub clears: usize,
    pub clear_color: [f32; 4],
    pub viewport: [i32; 4],
    pub polygon_mode: Option<u32>,
    pub error: u32,
}

impl State {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn raise(&mut self, error: u32) {
        if self.error == glow::NO_ERROR {
            self.error = error;
        }
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.values().filter(|s| !s.deleted).count()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.values().filter(|p| !p.deleted).count()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.values().filter(|b| b.is_some()).count()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.values().filter(|t| !t.deleted).count()
    }
}

#[derive(Debug, Default)]
pub struct FakeGl {
    state: RefCell<State>,
}

impl FakeGl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Ref<'_, State> {
        self.state.borrow()
    }
}

/// `(type, name)` pairs declared with `qualifier` (`in`, `out`, `uniform`).
fn declarations(source: &str, qualifier: &str) -> Vec<(String, String)> {
    let mut found = Vec::new();
    for line in source.lines() {
        let mut line = line.split("//").next().unwrap_or("").trim();
        if line.starts_with("layout") {
            match line.find(')') {
                Some(end) => line = line[end + 1..].trim(),
                None => continue,
            }
        }
        let mut tokens = line.trim_end_matches(';').split_whitespace();
        let mut first = tokens.next();
        if first == Some("flat") {
            first = tokens.next();
        }
        if first == Some(qualifier) {
            if let (Some(ty), Some(name)) = (tokens.next(), tokens.next()) {
                found.push((ty.to_string(), name.trim_end_matches(';').to_string()));
            }
        }
    }
    found
}

fn compile_log(source: &str) -> String {
    let mut log = String::new();
    for (number, line) in source.lines().enumerate() {
        if let Some(message) = line.trim().strip_prefix("#error") {
            log.push_str(&format!("0:{}(1): error: {}\n", number + 1, message.trim()));
        }
    }
    if !source.contains("void main") {
        log.push_str("0:1(1): error: no function with name 'main'\n");
    }
    log
}

impl GlDriver for FakeGl {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = FakeLocation;
    type Buffer = u32;
    type VertexArray = u32;
    type Texture = u32;

    fn create_shader(&self, stage: u32) -> Result<u32, CreateError> {
        if stage != glow::VERTEX_SHADER && stage != glow::FRAGMENT_SHADER {
            return Err(CreateError::new("shader", "invalid enum"));
        }
        let mut state = self.state.borrow_mut();
        let id = state.next();
        state.shaders.insert(
            id,
            FakeShader {
                stage,
                ..Default::default()
            },
        );
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(s) = self.state.borrow_mut().shaders.get_mut(&shader) {
            s.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: u32) {
        if let Some(s) = self.state.borrow_mut().shaders.get_mut(&shader) {
            s.log = compile_log(&s.source);
            s.compiled = s.log.is_empty();
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        let mut state = self.state.borrow_mut();
        let attached = state
            .programs
            .values()
            .any(|p| !p.deleted && p.attached.contains(&shader));
        if let Some(s) = state.shaders.get_mut(&shader) {
            // An attached shader is only flagged; it goes away with the detach.
            s.deleted = !attached;
            s.pending_delete = attached;
        }
    }

    fn create_program(&self) -> Result<u32, CreateError> {
        let mut state = self.state.borrow_mut();
        let id = state.next();
        state.programs.insert(id, FakeProgram::default());
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        match state.programs.get_mut(&program) {
            Some(p) if !p.attached.contains(&shader) => p.attached.push(shader),
            _ => state.raise(glow::INVALID_OPERATION),
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(p) = state.programs.get_mut(&program) {
            p.attached.retain(|s| *s != shader);
        }
        if let Some(s) = state.shaders.get_mut(&shader) {
            if s.pending_delete {
                s.deleted = true;
                s.pending_delete = false;
            }
        }
    }

    fn link_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        let Some(p) = state.programs.get(&program) else {
            state.raise(glow::INVALID_VALUE);
            return;
        };

        let stage = |kind: u32| {
            p.attached
                .iter()
                .filter_map(|id| state.shaders.get(id))
                .find(|s| s.stage == kind)
        };
        let vertex = stage(glow::VERTEX_SHADER);
        let fragment = stage(glow::FRAGMENT_SHADER);

        let mut log = String::new();
        let mut uniforms = BTreeSet::new();
        match (vertex, fragment) {
            (Some(vs), Some(fs)) if vs.compiled && fs.compiled => {
                let outputs = declarations(&vs.source, "out");
                for input in declarations(&fs.source, "in") {
                    if !outputs.contains(&input) {
                        log.push_str(&format!(
                            "error: fragment shader input `{}` has no matching vertex output\n",
                            input.1
                        ));
                    }
                }
                for source in [&vs.source, &fs.source] {
                    uniforms.extend(declarations(source, "uniform").into_iter().map(|(_, n)| n));
                }
            }
            (Some(_), Some(_)) => log.push_str("error: linking with uncompiled shader\n"),
            _ => log.push_str("error: program lacks a vertex or fragment stage\n"),
        }

        if let Some(p) = state.programs.get_mut(&program) {
            p.linked = log.is_empty();
            p.log = log;
            p.uniforms = if p.linked { uniforms } else { BTreeSet::new() };
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: u32) {
        let mut state = self.state.borrow_mut();
        match state.programs.get_mut(&program) {
            Some(p) if p.deleted => {
                p.delete_calls += 1;
                state.raise(glow::INVALID_VALUE);
            }
            Some(p) => {
                p.delete_calls += 1;
                p.deleted = true;
                let attached = std::mem::take(&mut p.attached);
                for id in attached {
                    if let Some(s) = state.shaders.get_mut(&id).filter(|s| s.pending_delete) {
                        s.deleted = true;
                        s.pending_delete = false;
                    }
                }
            }
            None => state.raise(glow::INVALID_VALUE),
        }
    }

    fn use_program(&self, program: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match program {
            None => state.current_program = None,
            Some(id) => match state.programs.get(&id) {
                Some(p) if !p.deleted && p.linked => state.current_program = Some(id),
                Some(p) if p.deleted => state.raise(glow::INVALID_VALUE),
                _ => state.raise(glow::INVALID_OPERATION),
            },
        }
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<FakeLocation> {
        let state = self.state.borrow();
        let p = state.programs.get(&program)?;
        p.uniforms.contains(name).then(|| FakeLocation {
            program,
            name: name.to_string(),
        })
    }

    fn uniform_1_i32(&self, location: &FakeLocation, x: i32) {
        write_uniform(self, location, UniformValue::I32(x));
    }

    fn uniform_3_i32(&self, location: &FakeLocation, x: i32, y: i32, z: i32) {
        write_uniform(self, location, UniformValue::IVec3([x, y, z]));
    }

    fn uniform_1_f32(&self, location: &FakeLocation, x: f32) {
        write_uniform(self, location, UniformValue::F32(x));
    }

    fn uniform_2_f32(&self, location: &FakeLocation, x: f32, y: f32) {
        write_uniform(self, location, UniformValue::Vec2([x, y]));
    }

    fn uniform_3_f32(&self, location: &FakeLocation, x: f32, y: f32, z: f32) {
        write_uniform(self, location, UniformValue::Vec3([x, y, z]));
    }

    fn uniform_4_f32(&self, location: &FakeLocation, x: f32, y: f32, z: f32, w: f32) {
        write_uniform(self, location, UniformValue::Vec4([x, y, z, w]));
    }

    fn uniform_matrix_4_f32(&self, location: &FakeLocation, values: &[f32; 16]) {
        write_uniform(self, location, UniformValue::Mat4(*values));
    }

    fn create_buffer(&self) -> Result<u32, CreateError> {
        let mut state = self.state.borrow_mut();
        let id = state.next();
        state.buffers.insert(id, Some(Vec::new()));
        Ok(id)
    }

    fn bind_buffer(&self, target: u32, buffer: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match target {
            glow::ARRAY_BUFFER => state.bound_array_buffer = buffer,
            glow::ELEMENT_ARRAY_BUFFER => match state.bound_vertex_array {
                Some(vao) => {
                    if let Some(va) = state.vertex_arrays.get_mut(&vao) {
                        va.element_buffer = buffer;
                    }
                }
                None => state.raise(glow::INVALID_OPERATION),
            },
            _ => state.raise(glow::INVALID_ENUM),
        }
    }

    fn buffer_data(&self, target: u32, data: &[u8], _usage: u32) {
        let mut state = self.state.borrow_mut();
        let bound = match target {
            glow::ARRAY_BUFFER => state.bound_array_buffer,
            glow::ELEMENT_ARRAY_BUFFER => state
                .bound_vertex_array
                .and_then(|vao| state.vertex_arrays.get(&vao))
                .and_then(|va| va.element_buffer),
            _ => None,
        };
        match bound.and_then(|id| state.buffers.get_mut(&id)) {
            Some(Some(storage)) => *storage = data.to_vec(),
            _ => state.raise(glow::INVALID_OPERATION),
        }
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(storage) = state.buffers.get_mut(&buffer) {
            *storage = None;
        }
        if state.bound_array_buffer == Some(buffer) {
            state.bound_array_buffer = None;
        }
    }

    fn create_vertex_array(&self) -> Result<u32, CreateError> {
        let mut state = self.state.borrow_mut();
        let id = state.next();
        state.vertex_arrays.insert(id, FakeVertexArray::default());
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        let mut state = self.state.borrow_mut();
        match vertex_array {
            Some(id) if state.vertex_arrays.get(&id).is_none_or(|va| va.deleted) => {
                state.raise(glow::INVALID_OPERATION)
            }
            _ => state.bound_vertex_array = vertex_array,
        }
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(va) = state.vertex_arrays.get_mut(&vertex_array) {
            va.deleted = true;
        }
        if state.bound_vertex_array == Some(vertex_array) {
            state.bound_vertex_array = None;
        }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        let mut state = self.state.borrow_mut();
        let (Some(vao), Some(_)) = (state.bound_vertex_array, state.bound_array_buffer) else {
            state.raise(glow::INVALID_OPERATION);
            return;
        };
        if let Some(va) = state.vertex_arrays.get_mut(&vao) {
            let attribute = va.attributes.entry(index).or_default();
            attribute.size = size;
            attribute.stride = stride;
            attribute.offset = offset;
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        let Some(vao) = state.bound_vertex_array else {
            state.raise(glow::INVALID_OPERATION);
            return;
        };
        if let Some(va) = state.vertex_arrays.get_mut(&vao) {
            va.attributes.entry(index).or_default().enabled = true;
        }
    }

    fn create_texture(&self) -> Result<u32, CreateError> {
        let mut state = self.state.borrow_mut();
        let id = state.next();
        state.textures.insert(id, FakeTexture::default());
        Ok(id)
    }

    fn active_texture(&self, unit: u32) {
        self.state.borrow_mut().active_unit = unit;
    }

    fn bind_texture_2d(&self, texture: Option<u32>) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        match texture {
            Some(id) => {
                state.bound_textures.insert(unit, id);
            }
            None => {
                state.bound_textures.remove(&unit);
            }
        }
    }

    fn tex_parameter_2d(&self, parameter: u32, value: i32) {
        with_bound_texture(self, |t| {
            t.parameters.insert(parameter, value);
        });
    }

    fn tex_image_2d_rgba(&self, width: u32, height: u32, pixels: &[u8]) {
        with_bound_texture(self, |t| {
            t.width = width;
            t.height = height;
            t.pixels = pixels.len();
        });
    }

    fn generate_mipmap_2d(&self) {
        with_bound_texture(self, |t| t.mipmapped = true);
    }

    fn delete_texture(&self, texture: u32) {
        let mut state = self.state.borrow_mut();
        if let Some(t) = state.textures.get_mut(&texture) {
            t.deleted = true;
        }
        state.bound_textures.retain(|_, id| *id != texture);
    }

    fn draw_arrays(&self, mode: u32, _first: i32, count: i32) {
        record_draw(self, mode, count, false);
    }

    fn draw_elements_u32(&self, mode: u32, count: i32, _offset: i32) {
        record_draw(self, mode, count, true);
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.state.borrow_mut().clear_color = [r, g, b, a];
    }

    fn clear(&self, _mask: u32) {
        self.state.borrow_mut().clears += 1;
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().viewport = [x, y, width, height];
    }

    fn polygon_mode(&self, mode: u32) {
        self.state.borrow_mut().polygon_mode = Some(mode);
    }

    fn get_error(&self) -> u32 {
        std::mem::replace(&mut self.state.borrow_mut().error, glow::NO_ERROR)
    }
}

fn write_uniform(gl: &FakeGl, location: &FakeLocation, value: UniformValue) {
    let mut state = gl.state.borrow_mut();
    if state.current_program != Some(location.program) {
        state.raise(glow::INVALID_OPERATION);
        return;
    }
    state
        .uniform_writes
        .push((location.program, location.name.clone(), value));
}

fn with_bound_texture(gl: &FakeGl, f: impl FnOnce(&mut FakeTexture)) {
    let mut state = gl.state.borrow_mut();
    let unit = state.active_unit;
    match state.bound_textures.get(&unit).copied() {
        Some(id) => {
            if let Some(t) = state.textures.get_mut(&id) {
                f(t);
            }
        }
        None => state.raise(glow::INVALID_OPERATION),
    }
}

fn record_draw(gl: &FakeGl, mode: u32, count: i32, indexed: bool) {
    let mut state = gl.state.borrow_mut();
    let program = state
        .current_program
        .filter(|id| state.programs.get(id).is_some_and(|p| p.linked));
    let live = |id: &u32| state.vertex_arrays.get(id).is_some_and(|va| !va.deleted);
    let vertex_array = state.bound_vertex_array.filter(live);
    let (Some(program), Some(vertex_array)) = (program, vertex_array) else {
        state.raise(glow::INVALID_OPERATION);
        return;
    };
    if indexed
        && state
            .vertex_arrays
            .get(&vertex_array)
            .is_none_or(|va| va.element_buffer.is_none())
    {
        state.raise(glow::INVALID_OPERATION);
        return;
    }
    let textures = state.bound_textures.clone();
    state.draws.push(DrawCall {
        mode,
        count,
        indexed,
        program,
        vertex_array,
        textures,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_skip_layout_and_comments() {
        let source = "layout (location = 0) in vec3 aPos; // position
out vec3 ourColor;
uniform vec4 uniformColor;";
        assert_eq!(
            declarations(source, "in"),
            vec![("vec3".to_string(), "aPos".to_string())]
        );
        assert_eq!(
            declarations(source, "uniform"),
            vec![("vec4".to_string(), "uniformColor".to_string())]
        );
    }
}
