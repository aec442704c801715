use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, HashSet};

use super::GraphicsContext;
use crate::engine::error::ShaderStage;

/// Opaque object name handed out by [`RecordingContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u32);

/// Uniform location: the program it was queried from plus the uniform name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSlot {
    pub program: Handle,
    pub name: String,
}

/// A state-changing call observed by [`RecordingContext`]. Location and
/// status queries are not recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateBuffer(Handle),
    BindBuffer { target: u32, buffer: Option<Handle> },
    BufferData { target: u32, buffer: Option<Handle>, len: usize },
    DeleteBuffer(Handle),
    CreateVertexArray(Handle),
    BindVertexArray(Option<Handle>),
    DeleteVertexArray(Handle),
    CompileShader { stage: ShaderStage, shader: Handle },
    LinkProgram(Handle),
    DeleteShader(Handle),
    DeleteProgram(Handle),
    UseProgram(Option<Handle>),
    UniformMatrix4 { name: String, value: [f32; 16] },
    EnableVertexAttribArray(u32),
    DisableVertexAttribArray(u32),
    VertexAttribPointer { location: u32, components: i32, buffer: Option<Handle> },
    DrawArrays { mode: u32, first: i32, count: i32 },
    DrawElements { mode: u32, count: i32, index_type: u32, offset: i32 },
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    ClearColor([f32; 4]),
    Clear(u32),
    Enable(u32),
    Disable(u32),
}

impl GlCall {
    pub fn is_draw(&self) -> bool {
        matches!(self, GlCall::DrawArrays { .. } | GlCall::DrawElements { .. })
    }
}

/// The context's global binding points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingState {
    pub program: Option<Handle>,
    pub array_buffer: Option<Handle>,
    pub element_buffer: Option<Handle>,
    pub vertex_array: Option<Handle>,
    pub enabled_attributes: BTreeSet<u32>,
}

impl BindingState {
    /// Nothing bound and no attribute array enabled.
    pub fn is_clear(&self) -> bool {
        self.program.is_none()
            && self.array_buffer.is_none()
            && self.element_buffer.is_none()
            && self.vertex_array.is_none()
            && self.enabled_attributes.is_empty()
    }
}

struct LinkedProgram {
    /// Vertex-stage inputs in declaration order; the index is the location.
    attributes: Vec<String>,
    uniforms: HashSet<String>,
}

#[derive(Default)]
struct Inner {
    next_handle: u32,
    calls: Vec<GlCall>,
    lost_calls: Vec<GlCall>,
    binding: BindingState,
    buffers: HashMap<Handle, Vec<u8>>,
    vertex_arrays: HashSet<Handle>,
    shaders: HashMap<Handle, String>,
    programs: HashMap<Handle, LinkedProgram>,
}

impl Inner {
    fn allocate(&mut self) -> Handle {
        self.next_handle += 1;
        Handle(self.next_handle)
    }
}

/// Headless [`GraphicsContext`] that records every state change and tracks
/// binding state and live objects.
///
/// Shaders always compile unless a failure is injected. A linked program
/// exposes the `in`/`attribute` declarations of its vertex stage as
/// attributes, numbered in declaration order, and the `uniform` declarations
/// of both stages as uniforms. Comments and preprocessor lines are ignored.
#[derive(Default)]
pub struct RecordingContext {
    inner: RefCell<Inner>,
    lost: Cell<bool>,
    fail_compile: Cell<Option<ShaderStage>>,
    fail_link: Cell<bool>,
    buffer_budget: Cell<Option<usize>>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every compile of `stage` fail with a synthetic info log.
    pub fn fail_compile(&self, stage: ShaderStage) {
        self.fail_compile.set(Some(stage));
    }

    pub fn fail_link(&self) {
        self.fail_link.set(true);
    }

    pub fn fail_buffer_creation(&self) {
        self.buffer_budget.set(Some(0));
    }

    /// Lets `count` more buffers be created, then fails every later one.
    pub fn fail_buffers_after(&self, count: usize) {
        self.buffer_budget.set(Some(count));
    }

    /// Simulates context loss. While lost, calls have no effect on the tracked
    /// state and creation fails; attempted calls land in
    /// [`RecordingContext::calls_while_lost`] instead of [`RecordingContext::calls`].
    pub fn set_lost(&self, lost: bool) {
        self.lost.set(lost);
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.inner.borrow().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<GlCall> {
        std::mem::take(&mut self.inner.borrow_mut().calls)
    }

    /// Calls issued while the context was lost.
    pub fn calls_while_lost(&self) -> Vec<GlCall> {
        self.inner.borrow().lost_calls.clone()
    }

    pub fn draw_calls(&self) -> Vec<GlCall> {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|c| c.is_draw())
            .cloned()
            .collect()
    }

    pub fn binding(&self) -> BindingState {
        self.inner.borrow().binding.clone()
    }

    pub fn buffer_contents(&self, buffer: Handle) -> Option<Vec<u8>> {
        self.inner.borrow().buffers.get(&buffer).cloned()
    }

    pub fn live_buffers(&self) -> usize {
        self.inner.borrow().buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.inner.borrow().vertex_arrays.len()
    }

    pub fn live_programs(&self) -> usize {
        self.inner.borrow().programs.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.inner.borrow().shaders.len()
    }

    fn record(&self, call: GlCall) {
        let mut inner = self.inner.borrow_mut();
        if self.lost.get() {
            inner.lost_calls.push(call);
        } else {
            inner.calls.push(call);
        }
    }

    fn with_state(&self, f: impl FnOnce(&mut Inner)) {
        if !self.lost.get() {
            f(&mut self.inner.borrow_mut());
        }
    }

    fn ensure_alive(&self) -> Result<(), String> {
        if self.lost.get() {
            Err("context lost".to_string())
        } else {
            Ok(())
        }
    }
}

fn identifiers(source: &str) -> impl Iterator<Item = &str> {
    source
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(ch) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("//") {
            rest = after.find('\n').map_or("", |end| &after[end..]);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.find("*/").map_or("", |end| &after[end + 2..]);
            out.push(' ');
        } else {
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    out
}

/// Names declared by statements carrying one of `qualifiers`, in source order.
fn declared_names(source: &str, qualifiers: &[&str]) -> Vec<String> {
    let code: String = strip_comments(source)
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    code.split([';', '{', '}'])
        .filter_map(|statement| {
            let tokens: Vec<&str> = identifiers(statement).collect();
            let declares = tokens.iter().any(|t| qualifiers.contains(t));
            let name = tokens.last()?;
            declares.then(|| name.to_string())
        })
        .collect()
}

impl GraphicsContext for RecordingContext {
    type Buffer = Handle;
    type VertexArray = Handle;
    type Shader = Handle;
    type Program = Handle;
    type UniformLocation = UniformSlot;

    fn is_lost(&self) -> bool {
        self.lost.get()
    }

    fn create_buffer(&self) -> Result<Handle, String> {
        self.ensure_alive()?;
        match self.buffer_budget.get() {
            Some(0) => return Err("out of memory".to_string()),
            Some(left) => self.buffer_budget.set(Some(left - 1)),
            None => {}
        }
        let handle = {
            let mut inner = self.inner.borrow_mut();
            let handle = inner.allocate();
            inner.buffers.insert(handle, Vec::new());
            handle
        };
        self.record(GlCall::CreateBuffer(handle));
        Ok(handle)
    }

    fn bind_buffer(&self, target: u32, buffer: Option<Handle>) {
        self.with_state(|inner| match target {
            glow::ARRAY_BUFFER => inner.binding.array_buffer = buffer,
            glow::ELEMENT_ARRAY_BUFFER => inner.binding.element_buffer = buffer,
            _ => {}
        });
        self.record(GlCall::BindBuffer { target, buffer });
    }

    fn buffer_data(&self, target: u32, data: &[u8]) {
        let mut bound = None;
        self.with_state(|inner| {
            bound = match target {
                glow::ARRAY_BUFFER => inner.binding.array_buffer,
                glow::ELEMENT_ARRAY_BUFFER => inner.binding.element_buffer,
                _ => None,
            };
            if let Some(contents) = bound.and_then(|b| inner.buffers.get_mut(&b)) {
                *contents = data.to_vec();
            }
        });
        self.record(GlCall::BufferData {
            target,
            buffer: bound,
            len: data.len(),
        });
    }

    fn delete_buffer(&self, buffer: Handle) {
        self.with_state(|inner| {
            inner.buffers.remove(&buffer);
            if inner.binding.array_buffer == Some(buffer) {
                inner.binding.array_buffer = None;
            }
            if inner.binding.element_buffer == Some(buffer) {
                inner.binding.element_buffer = None;
            }
        });
        self.record(GlCall::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> Result<Handle, String> {
        self.ensure_alive()?;
        let handle = {
            let mut inner = self.inner.borrow_mut();
            let handle = inner.allocate();
            inner.vertex_arrays.insert(handle);
            handle
        };
        self.record(GlCall::CreateVertexArray(handle));
        Ok(handle)
    }

    fn bind_vertex_array(&self, vertex_array: Option<Handle>) {
        self.with_state(|inner| inner.binding.vertex_array = vertex_array);
        self.record(GlCall::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: Handle) {
        self.with_state(|inner| {
            inner.vertex_arrays.remove(&vertex_array);
            if inner.binding.vertex_array == Some(vertex_array) {
                inner.binding.vertex_array = None;
            }
        });
        self.record(GlCall::DeleteVertexArray(vertex_array));
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<Handle, String> {
        self.ensure_alive()?;
        if self.fail_compile.get() == Some(stage) {
            return Err(format!("ERROR: 0:1: {stage} stage rejected"));
        }
        let handle = {
            let mut inner = self.inner.borrow_mut();
            let handle = inner.allocate();
            inner.shaders.insert(handle, source.to_string());
            handle
        };
        self.record(GlCall::CompileShader { stage, shader: handle });
        Ok(handle)
    }

    fn link_program(&self, vertex: Handle, fragment: Handle) -> Result<Handle, String> {
        self.ensure_alive()?;
        let mut inner = self.inner.borrow_mut();
        let vertex_src = inner.shaders.remove(&vertex).unwrap_or_default();
        let fragment_src = inner.shaders.remove(&fragment).unwrap_or_default();
        if self.fail_link.get() {
            return Err("ERROR: varying vColor not written by vertex shader".to_string());
        }

        let attributes = declared_names(&vertex_src, &["in", "attribute"]);
        let uniforms = declared_names(&vertex_src, &["uniform"])
            .into_iter()
            .chain(declared_names(&fragment_src, &["uniform"]))
            .collect();
        let handle = inner.allocate();
        inner.programs.insert(handle, LinkedProgram { attributes, uniforms });
        inner.calls.push(GlCall::LinkProgram(handle));
        Ok(handle)
    }

    fn delete_shader(&self, shader: Handle) {
        self.with_state(|inner| {
            inner.shaders.remove(&shader);
        });
        self.record(GlCall::DeleteShader(shader));
    }

    fn delete_program(&self, program: Handle) {
        self.with_state(|inner| {
            inner.programs.remove(&program);
        });
        self.record(GlCall::DeleteProgram(program));
    }

    fn attrib_location(&self, program: Handle, name: &str) -> Option<u32> {
        let inner = self.inner.borrow();
        let linked = inner.programs.get(&program)?;
        let index = linked.attributes.iter().position(|a| a == name)?;
        Some(index as u32)
    }

    fn uniform_location(&self, program: Handle, name: &str) -> Option<UniformSlot> {
        let inner = self.inner.borrow();
        let linked = inner.programs.get(&program)?;
        linked.uniforms.contains(name).then(|| UniformSlot {
            program,
            name: name.to_string(),
        })
    }

    fn use_program(&self, program: Option<Handle>) {
        self.with_state(|inner| inner.binding.program = program);
        self.record(GlCall::UseProgram(program));
    }

    fn uniform_matrix_4(&self, location: &UniformSlot, column_major: &[f32; 16]) {
        self.record(GlCall::UniformMatrix4 {
            name: location.name.clone(),
            value: *column_major,
        });
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        self.with_state(|inner| {
            inner.binding.enabled_attributes.insert(location);
        });
        self.record(GlCall::EnableVertexAttribArray(location));
    }

    fn disable_vertex_attrib_array(&self, location: u32) {
        self.with_state(|inner| {
            inner.binding.enabled_attributes.remove(&location);
        });
        self.record(GlCall::DisableVertexAttribArray(location));
    }

    fn vertex_attrib_pointer_f32(&self, location: u32, components: i32) {
        let buffer = self.inner.borrow().binding.array_buffer;
        self.record(GlCall::VertexAttribPointer {
            location,
            components,
            buffer,
        });
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        self.record(GlCall::DrawArrays { mode, first, count });
    }

    fn draw_elements(&self, mode: u32, count: i32, index_type: u32, offset: i32) {
        self.record(GlCall::DrawElements {
            mode,
            count,
            index_type,
            offset,
        });
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport { x, y, width, height });
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.record(GlCall::ClearColor([r, g, b, a]));
    }

    fn clear(&self, mask: u32) {
        self.record(GlCall::Clear(mask));
    }

    fn enable(&self, cap: u32) {
        self.record(GlCall::Enable(cap));
    }

    fn disable(&self, cap: u32) {
        self.record(GlCall::Disable(cap));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_binding_points() {
        let gl = RecordingContext::new();
        let buffer = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
        gl.enable_vertex_attrib_array(3);
        assert!(!gl.binding().is_clear());

        gl.disable_vertex_attrib_array(3);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        assert!(gl.binding().is_clear());
    }

    #[test]
    fn buffer_data_targets_bound_buffer() {
        let gl = RecordingContext::new();
        let buffer = gl.create_buffer().unwrap();
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
        gl.buffer_data(glow::ELEMENT_ARRAY_BUFFER, &[1, 2, 3, 4]);
        assert_eq!(gl.buffer_contents(buffer), Some(vec![1, 2, 3, 4]));
    }

    fn link(gl: &RecordingContext, vertex: &str, fragment: &str) -> Handle {
        let vs = gl.compile_shader(ShaderStage::Vertex, vertex).unwrap();
        let fs = gl.compile_shader(ShaderStage::Fragment, fragment).unwrap();
        gl.link_program(vs, fs).unwrap()
    }

    #[test]
    fn locations_follow_declarations() {
        let gl = RecordingContext::new();
        let program = link(
            &gl,
            "#version 300 es\nin vec4 aPosition;\nin vec4 aColor;\nuniform mat4 P;",
            "precision mediump float;\nuniform mat4 MV;\nout vec4 fragColor;",
        );

        assert_eq!(gl.attrib_location(program, "aPosition"), Some(0));
        assert_eq!(gl.attrib_location(program, "aColor"), Some(1));
        assert!(gl.uniform_location(program, "P").is_some());
        assert!(gl.uniform_location(program, "MV").is_some());
        assert_eq!(gl.live_shaders(), 0);
    }

    #[test]
    fn uniforms_and_outputs_are_not_attributes() {
        let gl = RecordingContext::new();
        let program = link(
            &gl,
            "in vec4 aPosition; uniform mat4 P; out vec4 vColor; void main() { vColor = aPosition; }",
            "in vec4 vColor; out vec4 fragColor; void main() { fragColor = vColor; }",
        );

        assert_eq!(gl.attrib_location(program, "P"), None);
        assert_eq!(gl.attrib_location(program, "vColor"), None);
        assert!(gl.uniform_location(program, "aPosition").is_none());
    }

    #[test]
    fn commented_out_declarations_are_ignored() {
        let gl = RecordingContext::new();
        let program = link(
            &gl,
            "in vec4 aPosition;\n// in vec4 aColor;\n/* uniform mat4 MV; */\nuniform mat4 P;",
            "out vec4 fragColor;",
        );

        assert_eq!(gl.attrib_location(program, "aColor"), None);
        assert!(gl.uniform_location(program, "MV").is_none());
        assert!(gl.uniform_location(program, "P").is_some());
    }

    #[test]
    fn lost_context_diverts_calls() {
        let gl = RecordingContext::new();
        gl.set_lost(true);
        assert!(gl.create_buffer().is_err());
        gl.draw_arrays(glow::TRIANGLES, 0, 3);
        assert!(gl.calls().is_empty());
        assert_eq!(
            gl.calls_while_lost(),
            vec![GlCall::DrawArrays { mode: glow::TRIANGLES, first: 0, count: 3 }]
        );
    }

    #[test]
    fn buffer_budget_runs_out() {
        let gl = RecordingContext::new();
        gl.fail_buffers_after(2);
        assert!(gl.create_buffer().is_ok());
        assert!(gl.create_buffer().is_ok());
        assert!(gl.create_buffer().is_err());
        assert_eq!(gl.live_buffers(), 2);
    }
}
