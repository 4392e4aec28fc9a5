use std::sync::Arc;

use crate::config::{AudioSessionHandle, BootstrapConfig};
use crate::engine::EngineBinding;
use crate::error::BridgeError;
use crate::lifecycle::{LifecycleEvent, LifecycleRouter};
use crate::safe_area::{SafeAreaInsets, SafeAreaTracker};
use crate::surface::{ShutdownSignal, SurfaceController};
use crate::time;
use crate::touch::{self, DownedPointers, InputBatch, TouchAction};

/// UI-thread coordinator wiring host callbacks into the engine.
///
/// Owns one engine session end to end: bootstrap and engine init at
/// construction, input and lifecycle fan-out while alive, release of every
/// per-session object on Destroy. The render half is split off once through
/// `take_renderer`; from then on the two halves share nothing but the
/// shutdown signal, so neither thread ever waits on the other.
pub struct Bridge {
    engine: Arc<dyn EngineBinding>,
    shutdown: ShutdownSignal,
    router: LifecycleRouter,
    safe_area: SafeAreaTracker,
    pointers: DownedPointers,
    renderer: Option<SurfaceController>,
    audio_session: Option<AudioSessionHandle>,
}

impl Bridge {
    /// Bootstrap the engine and build the session coordinator.
    ///
    /// The storage layout reaches the engine before `init`; display metrics
    /// are density-normalized first; `init` runs exactly once per bridge.
    pub fn new(engine: Arc<dyn EngineBinding>, boot: BootstrapConfig) -> Result<Self, BridgeError> {
        boot.validate()?;
        engine.configure_storage(&boot.storage);

        let display = boot.display.normalized();
        log::info!(
            "bridge init: {}x{} dpi ({:.1}, {:.1}) tablet={} locale={}",
            display.width,
            display.height,
            display.dpi_x,
            display.dpi_y,
            boot.is_tablet,
            boot.locale
        );
        engine.init(
            boot.is_tablet,
            display.width,
            display.height,
            display.dpi_x,
            display.dpi_y,
            &boot.locale,
        );

        let shutdown = ShutdownSignal::new();
        let router = LifecycleRouter::new(Arc::clone(&engine), shutdown.clone());
        let safe_area = SafeAreaTracker::new(Arc::clone(&engine));
        let renderer = SurfaceController::new(Arc::clone(&engine), shutdown.clone());
        Ok(Bridge {
            engine,
            shutdown,
            router,
            safe_area,
            pointers: DownedPointers::new(),
            renderer: Some(renderer),
            audio_session: Some(boot.audio_session),
        })
    }

    /// Hand the render half to the render thread.
    ///
    /// One shot: the first caller gets the controller, everyone after gets
    /// `None`.
    pub fn take_renderer(&mut self) -> Option<SurfaceController> {
        let renderer = self.renderer.take();
        if renderer.is_none() {
            log::warn!("take_renderer: no renderer available");
        }
        renderer
    }

    /// Normalize one host motion batch and feed the engine.
    ///
    /// Samples pass through the downed-pointer session: Down registers its
    /// pointer and always forwards, Move and Up forward only for registered
    /// pointers, Up releases its pointer.
    pub fn handle_touch_batch(&mut self, batch: &InputBatch) {
        if self.router.is_destroyed() {
            log::warn!("handle_touch_batch: after destroy, ignoring");
            return;
        }
        for sample in touch::normalize(batch) {
            match sample.kind {
                TouchAction::Down => {
                    self.pointers.press(sample.pointer_id);
                    self.engine.touch_down(
                        sample.pointer_id,
                        sample.x,
                        sample.y,
                        sample.event_time_ms,
                        sample.delivery_time_ms,
                    );
                }
                TouchAction::Move => {
                    if self.pointers.is_down(sample.pointer_id) {
                        self.engine.touch_move(
                            sample.pointer_id,
                            sample.x,
                            sample.y,
                            sample.event_time_ms,
                            sample.delivery_time_ms,
                        );
                    }
                }
                TouchAction::Up => {
                    if self.pointers.release(sample.pointer_id) {
                        self.engine.touch_up(
                            sample.pointer_id,
                            sample.x,
                            sample.y,
                            sample.event_time_ms,
                            sample.delivery_time_ms,
                        );
                    }
                }
            }
        }
    }

    /// Route one lifecycle transition.
    ///
    /// Pause cancels every downed pointer before the engine pauses. Destroy
    /// routes (signal first, `lifecycle_destroy` second) and then releases
    /// the per-session objects: the un-taken renderer, the pointer session,
    /// the audio session handle.
    pub fn handle_lifecycle(&mut self, event: LifecycleEvent) {
        if self.router.is_destroyed() {
            log::warn!("handle_lifecycle: {:?} after destroy, ignoring", event);
            return;
        }
        if event == LifecycleEvent::Pause {
            self.cancel_downed_pointers();
        }
        self.router.route(event);
        if event == LifecycleEvent::Destroy {
            self.release_session();
        }
    }

    /// Forward a window insets change. `None` means no cutout record.
    pub fn handle_insets(&mut self, insets: Option<SafeAreaInsets>) {
        if self.router.is_destroyed() {
            log::warn!("handle_insets: after destroy, ignoring");
            return;
        }
        self.safe_area.apply(insets);
    }

    /// Ask the engine whether it consumed a back-navigation press. When
    /// false the host applies its default back handling.
    pub fn back_pressed(&self) -> bool {
        if self.router.is_destroyed() {
            return false;
        }
        self.engine.back_button_handled()
    }

    /// Request render shutdown without destroying the session.
    pub fn request_shutdown(&self) {
        self.shutdown.request();
    }

    pub fn is_destroyed(&self) -> bool {
        self.router.is_destroyed()
    }

    fn cancel_downed_pointers(&mut self) {
        let now = time::uptime_millis();
        for pointer_id in self.pointers.drain() {
            log::debug!("canceling pointer {}", pointer_id);
            self.engine.touch_cancel(pointer_id, now);
        }
    }

    fn release_session(&mut self) {
        self.renderer = None;
        self.pointers.clear();
        if let Some(session) = self.audio_session.take() {
            log::debug!("released audio session {}", session.0);
        }
        log::info!("bridge session released");
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::{DisplayMetrics, StorageLayout};
    use crate::engine::testing::{EngineCall, RecordingEngine};
    use crate::surface::SurfaceState;
    use crate::touch::{Snapshot, ACTION_DOWN, ACTION_MOVE, ACTION_UP};

    fn test_layout() -> StorageLayout {
        StorageLayout {
            internal_data: PathBuf::from("/data/files/data"),
            internal_raw: PathBuf::from("/data/files/raw"),
            internal_cache: PathBuf::from("/data/cache/cache"),
            internal_tmp: PathBuf::from("/data/cache/tmp"),
            external_data: PathBuf::from("/sdcard/files/data"),
            external_raw: PathBuf::from("/sdcard/files/raw"),
            external_cache: PathBuf::from("/sdcard/cache/cache"),
            external_available: true,
        }
    }

    fn test_boot(display: DisplayMetrics) -> BootstrapConfig {
        BootstrapConfig {
            storage: test_layout(),
            display,
            is_tablet: false,
            locale: "en_US".to_string(),
            audio_session: AudioSessionHandle(9),
        }
    }

    fn square_display() -> DisplayMetrics {
        DisplayMetrics {
            width: 1080,
            height: 1920,
            dpi_x: 420.0,
            dpi_y: 420.0,
        }
    }

    fn bridge() -> (Bridge, Arc<RecordingEngine>) {
        let engine = Arc::new(RecordingEngine::new());
        let bridge = Bridge::new(engine.clone(), test_boot(square_display())).unwrap();
        (bridge, engine)
    }

    fn single_pointer(action: i32, pointer_id: i32, x: f32, y: f32, t: i64) -> InputBatch {
        InputBatch {
            action,
            pointer_ids: vec![pointer_id],
            history: Vec::new(),
            current: Snapshot {
                event_time_ms: t,
                xs: vec![x],
                ys: vec![y],
            },
        }
    }

    #[test]
    fn bootstrap_configures_storage_before_init() {
        let (_bridge, engine) = bridge();

        let calls = engine.calls();
        assert_eq!(calls[0], EngineCall::ConfigureStorage);
        assert!(matches!(
            calls[1],
            EngineCall::Init {
                is_tablet: false,
                width: 1080,
                height: 1920,
                ..
            }
        ));
        assert_eq!(calls.len(), 2);
    }

    #[test]
    fn bootstrap_normalizes_density_before_init() {
        let engine = Arc::new(RecordingEngine::new());
        let display = DisplayMetrics {
            width: 1080,
            height: 1920,
            dpi_x: 960.0,
            dpi_y: 320.0,
        };
        Bridge::new(engine.clone(), test_boot(display)).unwrap();

        assert!(matches!(
            engine.calls()[1],
            EngineCall::Init { dpi_x, dpi_y, .. } if dpi_x == 320.0 && dpi_y == 320.0
        ));
    }

    #[test]
    fn invalid_bootstrap_never_reaches_the_engine() {
        let engine = Arc::new(RecordingEngine::new());
        let display = DisplayMetrics {
            width: 0,
            height: 1920,
            dpi_x: 420.0,
            dpi_y: 420.0,
        };

        let result = Bridge::new(engine.clone(), test_boot(display));
        assert!(matches!(result, Err(BridgeError::InvalidConfig(_))));
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn renderer_is_handed_over_exactly_once() {
        let (mut bridge, _engine) = bridge();

        let renderer = bridge.take_renderer();
        assert!(renderer.is_some());
        assert!(bridge.take_renderer().is_none());
    }

    #[test]
    fn moves_and_ups_pass_only_for_downed_pointers() {
        let (mut bridge, engine) = bridge();

        bridge.handle_touch_batch(&single_pointer(ACTION_MOVE, 9, 1.0, 1.0, 10));
        bridge.handle_touch_batch(&single_pointer(ACTION_UP, 9, 1.0, 1.0, 11));
        bridge.handle_touch_batch(&single_pointer(ACTION_DOWN, 7, 2.0, 2.0, 12));
        bridge.handle_touch_batch(&single_pointer(ACTION_MOVE, 7, 3.0, 3.0, 13));
        bridge.handle_touch_batch(&single_pointer(ACTION_UP, 7, 4.0, 4.0, 14));
        bridge.handle_touch_batch(&single_pointer(ACTION_UP, 7, 4.0, 4.0, 15));

        let touch_calls: Vec<EngineCall> = engine
            .calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    EngineCall::TouchDown { .. }
                        | EngineCall::TouchMove { .. }
                        | EngineCall::TouchUp { .. }
                )
            })
            .collect();
        assert_eq!(
            touch_calls,
            vec![
                EngineCall::TouchDown {
                    pointer_id: 7,
                    x: 2.0,
                    y: 2.0,
                    event_time_ms: 12,
                },
                EngineCall::TouchMove {
                    pointer_id: 7,
                    x: 3.0,
                    y: 3.0,
                    event_time_ms: 13,
                },
                EngineCall::TouchUp {
                    pointer_id: 7,
                    x: 4.0,
                    y: 4.0,
                    event_time_ms: 14,
                },
            ]
        );
    }

    #[test]
    fn pause_cancels_downed_pointers_first() {
        let (mut bridge, engine) = bridge();

        bridge.handle_touch_batch(&single_pointer(ACTION_DOWN, 3, 1.0, 1.0, 20));
        bridge.handle_touch_batch(&single_pointer(ACTION_DOWN, 5, 2.0, 2.0, 21));
        bridge.handle_lifecycle(LifecycleEvent::Pause);

        let calls = engine.calls();
        let mut canceled: Vec<i32> = calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::TouchCancel { pointer_id } => Some(*pointer_id),
                _ => None,
            })
            .collect();
        canceled.sort_unstable();
        assert_eq!(canceled, vec![3, 5]);
        assert_eq!(calls.last(), Some(&EngineCall::LifecyclePause));

        // The session forgot the pointers, so a late move is dropped.
        bridge.handle_touch_batch(&single_pointer(ACTION_MOVE, 3, 5.0, 5.0, 22));
        assert!(!engine
            .calls()
            .iter()
            .any(|c| matches!(c, EngineCall::TouchMove { .. })));
    }

    #[test]
    fn destroy_signals_renderer_and_blocks_later_events() {
        let (mut bridge, engine) = bridge();
        let mut renderer = bridge.take_renderer().unwrap();
        renderer.create();

        bridge.handle_lifecycle(LifecycleEvent::Destroy);
        assert!(bridge.is_destroyed());

        // The renderer observes the signal at its next checkpoint and tears
        // down after the destroy notification.
        assert!(!renderer.render_frame());
        assert_eq!(renderer.state(), SurfaceState::ShutdownComplete);
        let calls = engine.calls();
        let destroy_at = calls
            .iter()
            .position(|c| *c == EngineCall::LifecycleDestroy)
            .unwrap();
        let teardown_at = calls
            .iter()
            .position(|c| *c == EngineCall::GraphicsShutdown)
            .unwrap();
        assert!(destroy_at < teardown_at);

        bridge.handle_lifecycle(LifecycleEvent::Start);
        bridge.handle_touch_batch(&single_pointer(ACTION_DOWN, 1, 0.0, 0.0, 30));
        bridge.handle_insets(Some(SafeAreaInsets::new(0, 44, 0, 0)));
        assert!(!bridge.back_pressed());
        assert_eq!(engine.calls().len(), calls.len());
    }

    #[test]
    fn destroy_releases_the_untaken_renderer() {
        let (mut bridge, _engine) = bridge();

        bridge.handle_lifecycle(LifecycleEvent::Destroy);
        assert!(bridge.take_renderer().is_none());
    }

    #[test]
    fn back_press_is_a_synchronous_engine_query() {
        let (bridge, engine) = bridge();

        assert!(!bridge.back_pressed());
        engine.set_back_handled(true);
        assert!(bridge.back_pressed());
    }

    #[test]
    fn insets_flow_through_the_tracker() {
        let (mut bridge, engine) = bridge();

        let notch = SafeAreaInsets::new(0, 88, 0, 0);
        bridge.handle_insets(Some(notch));
        bridge.handle_insets(Some(notch));

        let pushes = engine
            .calls()
            .iter()
            .filter(|c| matches!(c, EngineCall::SafeArea(_)))
            .count();
        assert_eq!(pushes, 1);
    }
}
