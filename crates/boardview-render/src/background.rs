//! Renderer that owns its surface on a dedicated thread.
//!
//! The foreground keeps no render state. Every change is forwarded as a
//! [`RenderMessage`] and the render thread paces its own frames. Vector
//! bitmaps are decoded by the foreground loader: the render thread asks for
//! them with [`WorkerMessage::GetImageBitmap`] and the reply comes back as
//! [`RenderMessage::ImageBitmap`].

use std::sync::mpsc::{Receiver, RecvTimeoutError, SendError, Sender, TryRecvError, channel};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use boardview_core::{ImageKind, ShapeData, ViewTransform};
use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use kurbo::Size;

use crate::bitmap::{BitmapError, BitmapFuture, BitmapLoader, PendingBitmaps, guess_kind};
use crate::frame::RenderLoop;
use crate::protocol::{RenderMessage, WorkerMessage};
use crate::renderer::{CanvasRenderer, RenderResult, RendererConfig, RendererError, RendererKind};
use crate::surface::Surface;

/// How long [`CanvasRenderer::destroy`] waits for the render thread to exit.
const DESTROY_TIMEOUT: Duration = Duration::from_millis(250);

/// What [`BackgroundRenderer::init`] hands back when the thread is gone.
pub type InitFailure = (RendererError, Box<dyn Surface>, Vec<ShapeData>);

/// Loader used on the render thread.
///
/// Raster sources are loaded in place; vector sources are proxied to the
/// foreground.
struct WorkerBitmapLoader {
    direct: Arc<dyn BitmapLoader>,
    pending: Arc<Mutex<PendingBitmaps>>,
    requests: Sender<WorkerMessage>,
}

impl BitmapLoader for WorkerBitmapLoader {
    fn get_bitmap(&self, id: &str, src: &str, kind: Option<ImageKind>) -> BitmapFuture {
        let vector = kind.or_else(|| guess_kind(src)).is_some_and(ImageKind::is_vector);
        if !vector {
            return self.direct.get_bitmap(id, src, kind);
        }

        let future = match self.pending.lock() {
            Ok(mut pending) => pending.register(id, src),
            Err(_) => return Box::pin(futures::future::ready(Err(BitmapError::Cancelled))),
        };
        let request = WorkerMessage::GetImageBitmap {
            id: id.to_string(),
            src: src.to_string(),
            kind,
        };
        if self.requests.send(request).is_err() {
            log::warn!("Foreground is gone; cannot request bitmap {}", id);
        }
        future
    }
}

/// Apply one command on the render thread. Returns false on terminate.
fn apply_message(
    render_loop: &mut RenderLoop,
    pending: &Mutex<PendingBitmaps>,
    msg: RenderMessage,
) -> bool {
    match msg {
        RenderMessage::Dimensions { width, height } => {
            render_loop.set_dimensions(Size::new(width, height));
        }
        RenderMessage::Viewport { tx, ty, scale } => {
            render_loop.set_viewport(ViewTransform { scale, tx, ty });
        }
        RenderMessage::Shapes { shapes } => render_loop.set_shapes(shapes),
        RenderMessage::ImageBitmap { id, src, result } => {
            if let Ok(mut pending) = pending.lock() {
                pending.resolve(&id, &src, result);
            }
        }
        RenderMessage::Init { .. } => {
            log::warn!("Render thread already initialized; ignoring init");
        }
        RenderMessage::Terminate => {
            log::info!("Render thread terminate requested");
            return false;
        }
    }
    true
}

/// Drive the render loop until terminated.
fn run_render_thread(
    cmd_rx: Receiver<RenderMessage>,
    request_tx: Sender<WorkerMessage>,
    loader: Arc<dyn BitmapLoader>,
    config: RendererConfig,
) {
    let (surface, screen_size, viewport, shapes) = match cmd_rx.recv() {
        Ok(RenderMessage::Init {
            surface,
            screen_size,
            viewport,
            shapes,
        }) => (surface, screen_size, viewport, shapes),
        Ok(other) => {
            log::error!("Render thread expected init, got {}", other.name());
            return;
        }
        Err(_) => {
            log::info!("Render thread closed before init");
            return;
        }
    };
    log::info!("Render thread started with {} shapes", shapes.len());

    let pending = Arc::new(Mutex::new(PendingBitmaps::new()));
    let worker_loader = Arc::new(WorkerBitmapLoader {
        direct: loader,
        pending: pending.clone(),
        requests: request_tx,
    });
    let mut render_loop = RenderLoop::new(surface, worker_loader, screen_size, viewport, shapes)
        .with_show_fps(config.show_fps);

    let mut next_frame = Instant::now();
    'run: loop {
        // Everything queued is applied before the next frame, however long
        // the previous one took.
        loop {
            match cmd_rx.try_recv() {
                Ok(msg) => {
                    if !apply_message(&mut render_loop, &pending, msg) {
                        break 'run;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::info!("Render command channel disconnected");
                    break 'run;
                }
            }
        }

        let now = Instant::now();
        if now < next_frame {
            match cmd_rx.recv_timeout(next_frame - now) {
                Ok(msg) => {
                    if !apply_message(&mut render_loop, &pending, msg) {
                        break;
                    }
                    continue;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("Render command channel disconnected");
                    break;
                }
            }
        }

        render_loop.frame();
        next_frame = Instant::now() + config.frame_interval;
    }

    // In-flight fetches are abandoned
    if let Ok(mut pending) = pending.lock() {
        pending.clear();
    }
    log::info!("Render thread exiting");
}

/// Forwards renderer calls to a render thread.
pub struct BackgroundRenderer {
    /// Channel to send commands to the render thread.
    cmd_tx: Option<Sender<RenderMessage>>,
    /// Channel to receive bitmap requests from the render thread.
    request_rx: Receiver<WorkerMessage>,
    /// Foreground loader that serves proxied requests.
    loader: Arc<dyn BitmapLoader>,
    /// Runs proxied bitmap futures on the foreground.
    pool: LocalPool,
    /// Handle to the render thread.
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for BackgroundRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundRenderer")
            .field("connected", &self.cmd_tx.is_some())
            .field("running", &self.thread.is_some())
            .finish()
    }
}

impl BackgroundRenderer {
    /// Start the render thread. It idles until [`BackgroundRenderer::init`].
    pub fn spawn(loader: Arc<dyn BitmapLoader>, config: RendererConfig) -> RenderResult<Self> {
        let (cmd_tx, cmd_rx) = channel::<RenderMessage>();
        let (request_tx, request_rx) = channel::<WorkerMessage>();

        let thread_loader = loader.clone();
        let handle = thread::Builder::new()
            .name("boardview-render".into())
            .spawn(move || run_render_thread(cmd_rx, request_tx, thread_loader, config))
            .map_err(|e| RendererError::InitFailed(e.to_string()))?;

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            request_rx,
            loader,
            pool: LocalPool::new(),
            thread: Some(handle),
        })
    }

    /// Transfer the surface and initial state to the render thread.
    ///
    /// On failure the surface and shapes are handed back so the caller can
    /// render some other way.
    pub fn init(
        &mut self,
        surface: Box<dyn Surface>,
        screen_size: Size,
        viewport: ViewTransform,
        shapes: Vec<ShapeData>,
    ) -> Result<(), InitFailure> {
        let Some(tx) = self.cmd_tx.as_ref() else {
            return Err((RendererError::Disconnected, surface, shapes));
        };
        let msg = RenderMessage::Init {
            surface,
            screen_size,
            viewport,
            shapes,
        };
        match tx.send(msg) {
            Ok(()) => Ok(()),
            Err(SendError(RenderMessage::Init { surface, shapes, .. })) => {
                Err((RendererError::Disconnected, surface, shapes))
            }
            Err(SendError(other)) => {
                log::error!("Unexpected {} message returned from init", other.name());
                Ok(())
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn send(&self, msg: RenderMessage) {
        let Some(tx) = self.cmd_tx.as_ref() else {
            return;
        };
        if let Err(e) = tx.send(msg) {
            log::warn!("Render thread is gone; dropped {} message", e.0.name());
        }
    }

    /// Start a foreground fetch for every request the render thread made.
    fn service_requests(&mut self) {
        let Some(reply_tx) = self.cmd_tx.clone() else {
            return;
        };
        loop {
            match self.request_rx.try_recv() {
                Ok(WorkerMessage::GetImageBitmap { id, src, kind }) => {
                    log::debug!("Serving proxied bitmap request for {}", id);
                    let future = self.loader.get_bitmap(&id, &src, kind);
                    let reply_tx = reply_tx.clone();
                    let task = async move {
                        let result = future.await;
                        if let Err(e) = &result {
                            log::warn!("Proxied bitmap {} failed: {}", id, e);
                        }
                        // Render thread may have terminated meanwhile
                        let _ = reply_tx.send(RenderMessage::ImageBitmap { id, src, result });
                    };
                    if let Err(e) = self.pool.spawner().spawn_local(task) {
                        log::error!("Failed to schedule bitmap request: {}", e);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        self.pool.run_until_stalled();
    }
}

impl CanvasRenderer for BackgroundRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Background
    }

    fn set_dimensions(&mut self, size: Size) {
        self.send(RenderMessage::Dimensions {
            width: size.width,
            height: size.height,
        });
    }

    fn set_viewport(&mut self, viewport: ViewTransform) {
        self.send(RenderMessage::Viewport {
            tx: viewport.tx,
            ty: viewport.ty,
            scale: viewport.scale,
        });
    }

    fn set_shapes(&mut self, shapes: Vec<ShapeData>) {
        self.send(RenderMessage::Shapes { shapes });
    }

    fn on_frame(&mut self) {
        self.service_requests();
    }

    fn destroy(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(RenderMessage::Terminate);
        }
        let Some(handle) = self.thread.take() else {
            return;
        };
        // Wait out the frame in progress, but never block on a stuck surface.
        let deadline = Instant::now() + DESTROY_TIMEOUT;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        if handle.is_finished() {
            if handle.join().is_err() {
                log::error!("Render thread panicked");
            }
        } else {
            log::warn!("Render thread still busy after terminate; detaching");
        }
        log::info!("Background renderer destroyed");
    }
}

impl Drop for BackgroundRenderer {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::{DrawCommand, DrawLog, RecordingSurface, drain};
    use boardview_core::Bounds;
    use kurbo::Affine;
    use peniko::{Blob, ImageAlphaType, ImageData, ImageFormat};
    use std::sync::mpsc::Receiver;
    use std::thread::ThreadId;

    /// Loader that answers immediately and remembers which thread asked.
    #[derive(Default)]
    struct ThreadLoader {
        calls: Mutex<Vec<(String, ThreadId)>>,
    }

    impl BitmapLoader for ThreadLoader {
        fn get_bitmap(&self, id: &str, _src: &str, _kind: Option<ImageKind>) -> BitmapFuture {
            self.calls
                .lock()
                .unwrap()
                .push((id.to_string(), thread::current().id()));
            let bitmap = ImageData {
                data: Blob::new(Arc::new(vec![0u8; 16])),
                format: ImageFormat::Rgba8,
                width: 2,
                height: 2,
                alpha_type: ImageAlphaType::Alpha,
            };
            Box::pin(futures::future::ready(Ok(bitmap)))
        }
    }

    /// Recording surface whose `present` takes a while, optionally until a
    /// gate is opened.
    struct SlowSurface {
        inner: RecordingSurface,
        delay: Duration,
        gate: Option<Mutex<Receiver<()>>>,
    }

    impl Surface for SlowSurface {
        fn size(&self) -> Size {
            self.inner.size()
        }

        fn resize(&mut self, size: Size) {
            self.inner.resize(size);
        }

        fn clear(&mut self) {
            self.inner.clear();
        }

        fn save(&mut self) {
            self.inner.save();
        }

        fn restore(&mut self) {
            self.inner.restore();
        }

        fn set_transform(&mut self, transform: Affine) {
            self.inner.set_transform(transform);
        }

        fn concat_transform(&mut self, transform: Affine) {
            self.inner.concat_transform(transform);
        }

        fn fill_rect(&mut self, rect: kurbo::Rect, color: peniko::Color) {
            self.inner.fill_rect(rect, color);
        }

        fn draw_bitmap(&mut self, bitmap: &ImageData, origin: kurbo::Point) {
            self.inner.draw_bitmap(bitmap, origin);
        }

        fn fill_text(&mut self, text: &str, origin: kurbo::Point, size: f64, color: peniko::Color) {
            self.inner.fill_text(text, origin, size, color);
        }

        fn present(&mut self) {
            thread::sleep(self.delay);
            if let Some(gate) = &self.gate {
                let _ = gate.lock().unwrap().recv();
            }
            self.inner.present();
        }
    }

    fn rectangle() -> ShapeData {
        ShapeData::Rectangle {
            id: "r".to_string(),
            matrix: Affine::IDENTITY,
            bounds: Bounds::from_edges(0.0, 0.0, 10.0, 10.0),
            width: 10.0,
            height: 10.0,
            color: boardview_core::objects::SerializableColor::black(),
        }
    }

    fn image(id: &str, src: &str, left: f64) -> ShapeData {
        ShapeData::Image {
            id: id.to_string(),
            matrix: Affine::translate((left, 0.0)),
            bounds: Bounds::from_edges(left, 0.0, left + 2.0, 2.0),
            src: src.to_string(),
            width: 2.0,
            height: 2.0,
            kind: None,
        }
    }

    fn start(loader: Arc<dyn BitmapLoader>, shapes: Vec<ShapeData>) -> (BackgroundRenderer, DrawLog) {
        let config = RendererConfig::default()
            .with_show_fps(false)
            .with_frame_interval(Duration::from_millis(1));
        let mut renderer = BackgroundRenderer::spawn(loader, config).unwrap();
        let (surface, log) = RecordingSurface::new(100.0, 100.0);
        assert!(
            renderer
                .init(Box::new(surface), Size::new(100.0, 100.0), ViewTransform::default(), shapes)
                .is_ok()
        );
        (renderer, log)
    }

    /// Keep servicing the renderer until `done` holds for the recorded commands.
    fn wait_for(
        renderer: &mut BackgroundRenderer,
        log: &DrawLog,
        mut done: impl FnMut(&[DrawCommand]) -> bool,
    ) -> bool {
        let mut seen = Vec::new();
        for _ in 0..400 {
            renderer.on_frame();
            seen.extend(drain(log));
            if done(&seen) {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_viewport_forwarded_to_thread() {
        let (mut renderer, log) = start(Arc::new(ThreadLoader::default()), Vec::new());
        assert!(wait_for(&mut renderer, &log, |c| c.contains(&DrawCommand::Present)));

        renderer.set_shapes(vec![ShapeData::Rectangle {
            id: "r".to_string(),
            matrix: Affine::IDENTITY,
            bounds: Bounds::from_edges(0.0, 0.0, 10.0, 10.0),
            width: 10.0,
            height: 10.0,
            color: boardview_core::objects::SerializableColor::black(),
        }]);
        renderer.set_viewport(ViewTransform {
            scale: 2.0,
            tx: 5.0,
            ty: 0.0,
        });
        let expected = Affine::translate((5.0, 0.0)) * Affine::scale(2.0);
        assert!(wait_for(&mut renderer, &log, |commands| {
            commands.iter().any(|c| {
                matches!(c, DrawCommand::FillRect { transform, .. } if *transform == expected)
            })
        }));
        renderer.destroy();
        assert!(!renderer.is_running());
    }

    #[test]
    fn test_vector_bitmaps_are_proxied() {
        let loader = Arc::new(ThreadLoader::default());
        let shapes = vec![image("raster", "a.jpg", 0.0), image("vector", "b.svg", 10.0)];
        let (mut renderer, log) = start(loader.clone(), shapes);

        let drawn = wait_for(&mut renderer, &log, |commands| {
            commands
                .iter()
                .filter(|c| matches!(c, DrawCommand::DrawBitmap { .. }))
                .count()
                >= 2
        });
        assert!(drawn);
        renderer.destroy();

        let foreground = thread::current().id();
        let calls = loader.calls.lock().unwrap();
        let thread_of = |id: &str| calls.iter().find(|(call, _)| call == id).map(|(_, t)| *t);
        assert_eq!(thread_of("vector"), Some(foreground));
        assert!(thread_of("raster").is_some_and(|t| t != foreground));
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let (mut renderer, log) = start(Arc::new(ThreadLoader::default()), Vec::new());
        renderer.destroy();
        renderer.destroy();
        drain(&log);

        renderer.set_dimensions(Size::new(10.0, 10.0));
        renderer.on_frame();
        thread::sleep(Duration::from_millis(20));
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn test_init_after_destroy_returns_surface() {
        let config = RendererConfig::default().with_show_fps(false);
        let mut renderer = BackgroundRenderer::spawn(Arc::new(ThreadLoader::default()), config).unwrap();
        renderer.destroy();

        let (surface, _log) = RecordingSurface::new(4.0, 4.0);
        let result = renderer.init(Box::new(surface), Size::new(4.0, 4.0), ViewTransform::default(), Vec::new());
        let Err((error, surface, shapes)) = result else {
            panic!("init should fail once destroyed");
        };
        assert!(matches!(error, RendererError::Disconnected));
        assert_eq!(surface.size(), Size::new(4.0, 4.0));
        assert!(shapes.is_empty());
    }

    #[test]
    fn test_slow_frames_still_apply_messages() {
        let mut renderer =
            BackgroundRenderer::spawn(Arc::new(ThreadLoader::default()), RendererConfig::default()).unwrap();
        let (inner, log) = RecordingSurface::new(100.0, 100.0);
        let surface = SlowSurface {
            inner,
            delay: Duration::from_millis(20),
            gate: None,
        };
        assert!(
            renderer
                .init(Box::new(surface), Size::new(100.0, 100.0), ViewTransform::default(), vec![rectangle()])
                .is_ok()
        );
        assert!(wait_for(&mut renderer, &log, |c| c.contains(&DrawCommand::Present)));

        renderer.set_viewport(ViewTransform {
            scale: 2.0,
            tx: 5.0,
            ty: 0.0,
        });
        let expected = Affine::translate((5.0, 0.0)) * Affine::scale(2.0);
        assert!(wait_for(&mut renderer, &log, |commands| {
            commands.iter().any(|c| {
                matches!(c, DrawCommand::FillRect { transform, .. } if *transform == expected)
            })
        }));

        renderer.destroy();
        assert!(!renderer.is_running());
    }

    #[test]
    fn test_destroy_does_not_wait_for_stuck_frame() {
        let config = RendererConfig::default().with_show_fps(false);
        let mut renderer = BackgroundRenderer::spawn(Arc::new(ThreadLoader::default()), config).unwrap();
        let (inner, _log) = RecordingSurface::new(10.0, 10.0);
        let (open_tx, open_rx) = channel();
        let surface = SlowSurface {
            inner,
            delay: Duration::ZERO,
            gate: Some(Mutex::new(open_rx)),
        };
        assert!(
            renderer
                .init(Box::new(surface), Size::new(10.0, 10.0), ViewTransform::default(), Vec::new())
                .is_ok()
        );
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        renderer.destroy();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!renderer.is_running());

        // Let the detached thread finish its frame and see the terminate.
        drop(open_tx);
    }
}
