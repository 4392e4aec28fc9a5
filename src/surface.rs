use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::engine::EngineBinding;

/// Cross-thread render shutdown flag.
///
/// The only state shared between the UI thread and the render thread. Set
/// once with release ordering, observed with acquire ordering, never reset.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request render shutdown. Callable from any thread, idempotent,
    /// never blocks.
    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Render surface lifecycle. Forward-only; no state re-enters `Active`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceState {
    Uninitialized,
    Active,
    ShutdownRequested,
    ShutdownComplete,
}

/// Render-thread owner of the surface lifecycle.
///
/// Split off the bridge exactly once and driven from the host's GL renderer
/// callbacks, all on the render thread. The UI thread reaches in only
/// through the shutdown signal, which `render_frame` checks at every frame
/// checkpoint. Graphics teardown therefore runs on the render thread, at
/// most once, and only if graphics came up.
pub struct SurfaceController {
    engine: Arc<dyn EngineBinding>,
    shutdown: ShutdownSignal,
    state: SurfaceState,
}

impl SurfaceController {
    pub(crate) fn new(engine: Arc<dyn EngineBinding>, shutdown: ShutdownSignal) -> Self {
        SurfaceController {
            engine,
            shutdown,
            state: SurfaceState::Uninitialized,
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// Bring the surface up.
    /// Called from GLSurfaceView.Renderer.onSurfaceCreated().
    pub fn create(&mut self) {
        match self.state {
            SurfaceState::Uninitialized => {
                log::info!("surface: create");
                self.engine.graphics_init();
                self.state = SurfaceState::Active;
            }
            SurfaceState::Active => {
                log::warn!("surface: create while active, ignoring");
            }
            SurfaceState::ShutdownRequested | SurfaceState::ShutdownComplete => {
                log::warn!("surface: create after shutdown, ignoring");
            }
        }
    }

    /// Forward new surface dimensions.
    /// Called from GLSurfaceView.Renderer.onSurfaceChanged(). Repeats of
    /// the same size are forwarded as-is.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.state != SurfaceState::Active {
            log::warn!(
                "surface: resize {}x{} while {:?}, ignoring",
                width,
                height,
                self.state
            );
            return;
        }
        log::debug!("surface: resize {}x{}", width, height);
        self.engine.surface_resized(width, height);
    }

    /// Drive one frame, honoring a pending shutdown request first.
    /// Called from GLSurfaceView.Renderer.onDrawFrame(). Returns false once
    /// the surface reached `ShutdownComplete`; the render loop exits then.
    pub fn render_frame(&mut self) -> bool {
        if self.state == SurfaceState::ShutdownComplete {
            return false;
        }
        if self.shutdown.is_requested() {
            let had_graphics = self.state == SurfaceState::Active;
            self.state = SurfaceState::ShutdownRequested;
            if had_graphics {
                log::info!("surface: shutdown, tearing down graphics");
                self.engine.graphics_shutdown();
            } else {
                log::info!("surface: shutdown before graphics init");
            }
            self.state = SurfaceState::ShutdownComplete;
            return false;
        }
        if self.state == SurfaceState::Active {
            self.engine.draw_frame();
        }
        true
    }

    /// Request shutdown from any thread; the render thread completes it at
    /// its next frame checkpoint.
    pub fn request_shutdown(&self) {
        self.shutdown.request();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{EngineCall, RecordingEngine};

    fn controller() -> (SurfaceController, Arc<RecordingEngine>, ShutdownSignal) {
        let engine = Arc::new(RecordingEngine::new());
        let signal = ShutdownSignal::new();
        let controller = SurfaceController::new(engine.clone(), signal.clone());
        (controller, engine, signal)
    }

    fn count(engine: &RecordingEngine, call: &EngineCall) -> usize {
        engine.calls().iter().filter(|c| *c == call).count()
    }

    #[test]
    fn create_initializes_graphics_once() {
        let (mut controller, engine, _signal) = controller();

        controller.create();
        controller.create();

        assert_eq!(controller.state(), SurfaceState::Active);
        assert_eq!(count(&engine, &EngineCall::GraphicsInit), 1);
    }

    #[test]
    fn frames_draw_only_while_active() {
        let (mut controller, engine, _signal) = controller();

        assert!(controller.render_frame());
        assert_eq!(count(&engine, &EngineCall::DrawFrame), 0);

        controller.create();
        assert!(controller.render_frame());
        assert!(controller.render_frame());
        assert_eq!(count(&engine, &EngineCall::DrawFrame), 2);
    }

    #[test]
    fn repeated_requests_tear_down_exactly_once() {
        let (mut controller, engine, signal) = controller();

        controller.create();
        assert!(controller.render_frame());
        signal.request();
        signal.request();
        controller.request_shutdown();

        assert!(!controller.render_frame());
        assert!(!controller.render_frame());

        assert_eq!(controller.state(), SurfaceState::ShutdownComplete);
        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::GraphicsInit,
                EngineCall::DrawFrame,
                EngineCall::GraphicsShutdown,
            ]
        );
    }

    #[test]
    fn shutdown_before_ready_skips_graphics_entirely() {
        let (mut controller, engine, signal) = controller();

        signal.request();
        assert!(!controller.render_frame());

        assert_eq!(controller.state(), SurfaceState::ShutdownComplete);
        assert!(engine.calls().is_empty());

        // A late create must not resurrect the surface.
        controller.create();
        assert_eq!(controller.state(), SurfaceState::ShutdownComplete);
        assert_eq!(count(&engine, &EngineCall::GraphicsInit), 0);
    }

    #[test]
    fn resize_forwards_only_while_active() {
        let (mut controller, engine, signal) = controller();

        controller.resize(100, 200);
        assert!(engine.calls().is_empty());

        controller.create();
        controller.resize(800, 600);
        controller.resize(800, 600);
        assert_eq!(
            count(
                &engine,
                &EngineCall::SurfaceResized {
                    width: 800,
                    height: 600
                }
            ),
            2
        );

        signal.request();
        controller.render_frame();
        controller.resize(640, 480);
        assert_eq!(
            count(
                &engine,
                &EngineCall::SurfaceResized {
                    width: 640,
                    height: 480
                }
            ),
            0
        );
    }
}
