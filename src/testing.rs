//! Test doubles for the host, renderer and loader seams.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use glam::Vec3;

use crate::error::{LoadError, VitrineError};
use crate::loader::{Decode, Fetch, Locator};
use crate::scene::{Mesh, Node};
use crate::viewport::{
    FrameScheduler, FrameToken, FrameView, RenderError, ResizeSubscription, SceneRenderer,
    Viewport,
};

/// Host-side effects observed by the fakes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ViewportCall {
    RequestFrame(FrameToken),
    CancelFrame(FrameToken),
    Attach(u32, u32),
    Detach,
    Subscribe,
    Unsubscribe,
    Render(u64),
    RendererResize(u32, u32),
    RendererRelease,
}

type Journal = Rc<RefCell<Vec<ViewportCall>>>;

/// Minimal [`FrameScheduler`] for render-loop tests.
#[derive(Debug, Default)]
pub(crate) struct FakeScheduler {
    pub requested: Vec<FrameToken>,
    pub cancelled: Vec<FrameToken>,
}

impl FrameScheduler for FakeScheduler {
    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken::new(self.requested.len() as u64 + 1);
        self.requested.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.cancelled.push(token);
    }
}

/// In-memory viewport that journals every host call.
pub(crate) struct FakeViewport {
    pub size: Option<(u32, u32)>,
    pub scale: f64,
    attached: bool,
    next_id: u64,
    pending: Vec<FrameToken>,
    journal: Journal,
    render_failures: Rc<RefCell<VecDeque<RenderError>>>,
}

impl FakeViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Some((width, height)),
            scale: 1.0,
            attached: false,
            next_id: 0,
            pending: Vec::new(),
            journal: Rc::default(),
            render_failures: Rc::default(),
        }
    }

    pub fn journal(&self) -> Vec<ViewportCall> {
        self.journal.borrow().clone()
    }

    pub fn clear_journal(&self) {
        self.journal.borrow_mut().clear();
    }

    /// Frame callbacks scheduled and not yet cancelled or delivered.
    pub fn pending(&self) -> Vec<FrameToken> {
        self.pending.clone()
    }

    /// Hand every pending callback to the caller for delivery.
    pub fn take_pending(&mut self) -> Vec<FrameToken> {
        std::mem::take(&mut self.pending)
    }

    pub fn renders(&self) -> usize {
        self.journal
            .borrow()
            .iter()
            .filter(|c| matches!(c, ViewportCall::Render(_)))
            .count()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Make the next render of the attached renderer fail with `error`.
    pub fn fail_next_render(&self, error: RenderError) {
        self.render_failures.borrow_mut().push_back(error);
    }

    fn record(&self, call: ViewportCall) {
        self.journal.borrow_mut().push(call);
    }
}

impl FrameScheduler for FakeViewport {
    fn request_frame(&mut self) -> FrameToken {
        self.next_id += 1;
        let token = FrameToken::new(self.next_id);
        self.pending.push(token);
        self.record(ViewportCall::RequestFrame(token));
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.pending.retain(|t| *t != token);
        self.record(ViewportCall::CancelFrame(token));
    }
}

impl Viewport for FakeViewport {
    type Renderer = RecordingRenderer;

    fn client_size(&self) -> Option<(u32, u32)> {
        self.size
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }

    fn attach(&mut self, width: u32, height: u32) -> Result<RecordingRenderer, VitrineError> {
        if self.attached {
            return Err(VitrineError::Attach("already attached".into()));
        }
        if self.size.is_none() {
            return Err(VitrineError::Attach("no size".into()));
        }
        self.attached = true;
        self.record(ViewportCall::Attach(width, height));
        Ok(RecordingRenderer {
            size: (width, height),
            released: false,
            journal: Rc::clone(&self.journal),
            failures: Rc::clone(&self.render_failures),
        })
    }

    fn detach(&mut self) {
        self.attached = false;
        self.record(ViewportCall::Detach);
    }

    fn subscribe_resize(&mut self) -> ResizeSubscription {
        self.next_id += 1;
        self.record(ViewportCall::Subscribe);
        ResizeSubscription::new(self.next_id)
    }

    fn unsubscribe_resize(&mut self, _subscription: ResizeSubscription) {
        self.record(ViewportCall::Unsubscribe);
    }
}

/// Renderer that journals instead of drawing.
pub(crate) struct RecordingRenderer {
    size: (u32, u32),
    released: bool,
    journal: Journal,
    failures: Rc<RefCell<VecDeque<RenderError>>>,
}

impl SceneRenderer for RecordingRenderer {
    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.journal
            .borrow_mut()
            .push(ViewportCall::RendererResize(width, height));
    }

    fn render(&mut self, frame: &FrameView<'_>) -> Result<(), RenderError> {
        assert!(!self.released, "render after release");
        self.journal
            .borrow_mut()
            .push(ViewportCall::Render(frame.asset_revision));
        match self.failures.borrow_mut().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.journal.borrow_mut().push(ViewportCall::RendererRelease);
    }
}

#[derive(Default)]
struct Gate {
    gated: bool,
    released: HashSet<String>,
    failures: HashMap<String, LoadError>,
}

/// [`Fetch`] whose requests block until the test releases them.
pub(crate) struct GatedFetcher {
    gate: Mutex<Gate>,
    changed: Condvar,
}

impl GatedFetcher {
    /// Every request completes immediately.
    pub fn open() -> Self {
        Self {
            gate: Mutex::default(),
            changed: Condvar::new(),
        }
    }

    /// Requests wait for [`release`](Self::release).
    pub fn gated() -> Self {
        let fetcher = Self::open();
        fetcher.gate.lock().unwrap().gated = true;
        fetcher
    }

    pub fn release(&self, key: &str) {
        let _ = self.gate.lock().unwrap().released.insert(key.to_owned());
        self.changed.notify_all();
    }

    pub fn fail(&self, key: &str, error: LoadError) {
        let _ = self
            .gate
            .lock()
            .unwrap()
            .failures
            .insert(key.to_owned(), error);
    }
}

impl Fetch for GatedFetcher {
    fn fetch(
        &self,
        locator: &Locator,
        progress: &mut dyn FnMut(f32),
    ) -> Result<Vec<u8>, LoadError> {
        let key = locator.to_string();
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut gate = self.gate.lock().unwrap();
        while gate.gated && !gate.released.contains(&key) {
            let now = Instant::now();
            if now >= deadline {
                return Err(LoadError::Timeout);
            }
            gate = self.changed.wait_timeout(gate, deadline - now).unwrap().0;
        }
        if let Some(error) = gate.failures.get(&key) {
            return Err(error.clone());
        }
        drop(gate);
        progress(0.5);
        progress(1.0);
        Ok(key.into_bytes())
    }
}

/// [`Decode`] returning canned scene graphs keyed by locator.
pub(crate) struct FakeDecoder {
    default: Node,
    by_key: HashMap<String, Node>,
    failing: HashSet<String>,
}

impl FakeDecoder {
    pub fn new(default: Node) -> Self {
        Self {
            default,
            by_key: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    pub fn with(mut self, key: &str, node: Node) -> Self {
        let _ = self.by_key.insert(key.to_owned(), node);
        self
    }

    pub fn with_failure(mut self, key: &str) -> Self {
        let _ = self.failing.insert(key.to_owned());
        self
    }
}

impl Decode for FakeDecoder {
    fn decode(&self, _bytes: &[u8], locator: &Locator) -> Result<Node, LoadError> {
        let key = locator.to_string();
        if self.failing.contains(&key) {
            return Err(LoadError::Decode(format!("cannot decode {key}")));
        }
        Ok(self.by_key.get(&key).unwrap_or(&self.default).clone())
    }
}

/// Spin on `condition` until it holds, panicking after a few seconds.
pub(crate) fn poll_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Closed box mesh spanning `min..max` as a single leaf.
pub(crate) fn box_node(min: Vec3, max: Vec3) -> Node {
    let mut positions = Vec::with_capacity(8);
    for i in 0..8u32 {
        positions.push([
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        ]);
    }
    let indices = vec![
        0, 2, 1, 1, 2, 3, // -z
        4, 5, 6, 5, 7, 6, // +z
        0, 1, 4, 1, 5, 4, // -y
        2, 6, 3, 3, 6, 7, // +y
        0, 4, 2, 2, 4, 6, // -x
        1, 3, 5, 3, 7, 5, // +x
    ];
    Node::leaf(Mesh {
        positions,
        indices,
        ..Mesh::default()
    })
}

/// Binary glTF holding one triangle `(0,0,0) (1,0,0) (0,1,0)` on a node
/// translated by `(1,2,3)`, optionally with red/green/blue `COLOR_0`.
pub(crate) fn triangle_glb(with_colors: bool) -> Vec<u8> {
    let mut bin: Vec<u8> = Vec::new();
    for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for c in v {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    for i in [0u16, 1, 2] {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    bin.extend_from_slice(&[0, 0]);
    let colors_offset = bin.len();
    if with_colors {
        for rgba in [[1.0f32, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0]] {
            for c in rgba {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
    }

    let mut attributes = serde_json::json!({ "POSITION": 0 });
    let mut buffer_views = vec![
        serde_json::json!({ "buffer": 0, "byteOffset": 0, "byteLength": 36 }),
        serde_json::json!({ "buffer": 0, "byteOffset": 36, "byteLength": 6 }),
    ];
    let mut accessors = vec![
        serde_json::json!({
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
        }),
        serde_json::json!({
            "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"
        }),
    ];
    if with_colors {
        attributes["COLOR_0"] = serde_json::json!(2);
        buffer_views.push(serde_json::json!({
            "buffer": 0, "byteOffset": colors_offset, "byteLength": 48
        }));
        accessors.push(serde_json::json!({
            "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC4"
        }));
    }
    let document = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "tri", "mesh": 0, "translation": [1.0, 2.0, 3.0] }],
        "meshes": [{ "primitives": [{ "attributes": attributes, "indices": 1, "material": 0 }] }],
        "materials": [{
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                "metallicFactor": 0.5,
                "roughnessFactor": 0.25
            },
            "doubleSided": true
        }],
        "buffers": [{ "byteLength": bin.len() }],
        "bufferViews": buffer_views,
        "accessors": accessors,
    });

    let mut json = serde_json::to_vec(&document).unwrap_or_default();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let total = 12 + 8 + json.len() + 8 + bin.len();

    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total as u32).to_le_bytes());
    glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"JSON");
    glb.extend_from_slice(&json);
    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(b"BIN\0");
    glb.extend_from_slice(&bin);
    glb
}
