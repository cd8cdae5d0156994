//! Headless stand-ins for the GPU side of the loader: a context and fence
//! that record every call, a resource that records its release, and a
//! writer for small `.shp` files.

#![allow(dead_code)]

use std::cell::Cell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use meridian_engine::loader::{BuilderRegistry, LoadContext, ShapefileRequest};
use meridian_engine::sync::{ClientWaitResult, Fence, FenceError, FencePolicy, Poster};
use meridian_shapefile::ShapeType;

// ── call log ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    MakeCurrent { thread: Option<String> },
    Build(String),
    CreateFence,
    /// `pending` is the result-queue backlog observed during the poll.
    Poll { pending: Option<usize>, signaled: bool },
    LayerReleased(String),
    Disposed,
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, call: &Call) -> bool {
        self.0.lock().unwrap().contains(call)
    }

    pub fn builds(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Build(path) => Some(path),
                _ => None,
            })
            .collect()
    }

    /// Polls until `pred` holds or `timeout` expires.
    pub fn wait_for(&self, timeout: Duration, pred: impl Fn(&[Call]) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if pred(&self.0.lock().unwrap()) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

// ── fake resource ─────────────────────────────────────────────────────────

/// Finished resource standing in for a GPU layer.
#[derive(Debug)]
pub struct FakeLayer {
    pub path: String,
    pub shape_type: ShapeType,
    pub shapes: usize,
    log: CallLog,
}

impl FakeLayer {
    /// A layer for `request` without reading its file.
    pub fn new(request: &ShapefileRequest, ctx: &FakeContext) -> Self {
        Self {
            path: request.path().to_string(),
            shape_type: request.shape_type(),
            shapes: 0,
            log: ctx.log.clone(),
        }
    }
}

impl Drop for FakeLayer {
    fn drop(&mut self) {
        self.log.push(Call::LayerReleased(self.path.clone()));
    }
}

// ── fake context / fence ──────────────────────────────────────────────────

type Backlog = Arc<dyn Fn() -> usize + Send + Sync>;

pub struct FakeContext {
    pub log: CallLog,
    /// Number of polls before a fence reports signaled.
    pub polls_to_signal: u32,
    backlog: Option<Backlog>,
}

impl FakeContext {
    pub fn new(log: CallLog) -> Self {
        Self { log, polls_to_signal: 3, backlog: None }
    }

    /// Fences record the backlog of `results` at every poll.
    pub fn observing(mut self, results: Poster<FakeLayer>) -> Self {
        self.backlog = Some(Arc::new(move || results.len()));
        self
    }
}

impl LoadContext for FakeContext {
    type Fence = FakeFence;

    fn make_current(&mut self) -> anyhow::Result<()> {
        let thread = std::thread::current().name().map(str::to_string);
        self.log.push(Call::MakeCurrent { thread });
        Ok(())
    }

    fn create_fence(&mut self) -> anyhow::Result<FakeFence> {
        self.log.push(Call::CreateFence);
        Ok(FakeFence {
            log: self.log.clone(),
            remaining: Cell::new(self.polls_to_signal),
            backlog: self.backlog.clone(),
        })
    }
}

impl Drop for FakeContext {
    fn drop(&mut self) {
        self.log.push(Call::Disposed);
    }
}

pub struct FakeFence {
    log: CallLog,
    remaining: Cell<u32>,
    backlog: Option<Backlog>,
}

impl Fence for FakeFence {
    fn client_wait(&self, _timeout: Duration) -> Result<ClientWaitResult, FenceError> {
        let remaining = self.remaining.get().saturating_sub(1);
        self.remaining.set(remaining);
        let signaled = remaining == 0;
        let pending = self.backlog.as_ref().map(|p| p());
        self.log.push(Call::Poll { pending, signaled });

        Ok(if signaled {
            ClientWaitResult::Signaled
        } else {
            ClientWaitResult::TimeoutExpired
        })
    }
}

pub fn fast_fence() -> FencePolicy {
    FencePolicy {
        poll_interval: Duration::from_millis(1),
        ..FencePolicy::default()
    }
}

// ── builders ──────────────────────────────────────────────────────────────

fn build_fake(request: &ShapefileRequest, ctx: &mut FakeContext) -> anyhow::Result<FakeLayer> {
    ctx.log.push(Call::Build(request.path().to_string()));
    let file = meridian_shapefile::read_file(request.path())?;
    let mut layer = FakeLayer::new(request, ctx);
    layer.shapes = file.shapes().count();
    Ok(layer)
}

/// Builders for Polygon, PolyLine and Point that parse the file for real.
pub fn fake_builders() -> BuilderRegistry<FakeContext, FakeLayer> {
    BuilderRegistry::new()
        .with(ShapeType::Polygon, build_fake)
        .with(ShapeType::PolyLine, build_fake)
        .with(ShapeType::Point, build_fake)
}

// ── shapefile fixtures ────────────────────────────────────────────────────

/// A scratch directory removed on drop.
pub struct DataDir {
    path: PathBuf,
}

impl DataDir {
    pub fn new(tag: &str) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "meridian-{tag}-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self, name: &str) -> String {
        self.path.join(name).to_string_lossy().into_owned()
    }

    pub fn write(&self, name: &str, bytes: &[u8]) -> String {
        let path = self.path(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// The five startup layers: countries, state lines and three point sets.
    pub fn startup_requests(&self) -> Vec<ShapefileRequest> {
        let square = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)];
        let countries = self.write(
            "countries.shp",
            &shp_multipart(ShapeType::Polygon, &[vec![square.clone()], vec![square]]),
        );
        let lines = self.write(
            "state_lines.shp",
            &shp_multipart(ShapeType::PolyLine, &[vec![vec![(-100.0, 40.0), (-90.0, 41.0)]]]),
        );
        let airports = self.write("airports.shp", &shp_points(&[(-122.4, 37.6), (-73.8, 40.6)]));
        let amtrak = self.write("amtrak.shp", &shp_points(&[(-87.6, 41.9)]));
        let places = self.write("places.shp", &shp_points(&[(2.35, 48.85), (139.7, 35.7), (-0.1, 51.5)]));

        vec![
            ShapefileRequest::polygon(countries),
            ShapefileRequest::polyline(lines),
            ShapefileRequest::point(airports, "plane.png"),
            ShapefileRequest::point(amtrak, "car.png"),
            ShapefileRequest::point(places, "dot.png"),
        ]
    }
}

impl Drop for DataDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn header(shape_type: ShapeType, total_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(100);
    out.extend_from_slice(&9994i32.to_be_bytes());
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&((total_len / 2) as i32).to_be_bytes());
    out.extend_from_slice(&1000i32.to_le_bytes());
    out.extend_from_slice(&shape_type.code().to_le_bytes());
    out.extend_from_slice(&[0u8; 64]);
    out
}

fn with_records(shape_type: ShapeType, contents: Vec<Vec<u8>>) -> Vec<u8> {
    let mut body = Vec::new();
    for (i, content) in contents.iter().enumerate() {
        body.extend_from_slice(&(i as i32 + 1).to_be_bytes());
        body.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
        body.extend_from_slice(content);
    }
    let mut out = header(shape_type, 100 + body.len());
    out.extend_from_slice(&body);
    out
}

pub fn shp_points(points: &[(f64, f64)]) -> Vec<u8> {
    let contents = points
        .iter()
        .map(|&(x, y)| {
            let mut c = ShapeType::Point.code().to_le_bytes().to_vec();
            c.extend_from_slice(&x.to_le_bytes());
            c.extend_from_slice(&y.to_le_bytes());
            c
        })
        .collect();
    with_records(ShapeType::Point, contents)
}

/// One record per entry; each record is a list of parts.
pub fn shp_multipart(shape_type: ShapeType, records: &[Vec<Vec<(f64, f64)>>]) -> Vec<u8> {
    let contents = records
        .iter()
        .map(|parts| {
            let mut c = shape_type.code().to_le_bytes().to_vec();
            c.extend_from_slice(&[0u8; 32]);
            let total: usize = parts.iter().map(Vec::len).sum();
            c.extend_from_slice(&(parts.len() as i32).to_le_bytes());
            c.extend_from_slice(&(total as i32).to_le_bytes());
            let mut start = 0i32;
            for part in parts {
                c.extend_from_slice(&start.to_le_bytes());
                start += part.len() as i32;
            }
            for &(x, y) in parts.iter().flatten() {
                c.extend_from_slice(&x.to_le_bytes());
                c.extend_from_slice(&y.to_le_bytes());
            }
            c
        })
        .collect();
    with_records(shape_type, contents)
}
