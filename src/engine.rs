use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::config::StorageLayout;
use crate::safe_area::SafeAreaInsets;

/// Call surface of the native engine.
///
/// One implementation per process, installed by the embedding engine crate
/// before the host creates its first session. The bridge guarantees thread
/// affinity: `graphics_init`, `graphics_shutdown`, `draw_frame` and
/// `surface_resized` arrive on the render thread, everything else on the UI
/// thread. Implementations keep their own interior state behind `&self`.
pub trait EngineBinding: Send + Sync {
    /// Receive the prepared storage layout. Called once, before `init`.
    fn configure_storage(&self, layout: &StorageLayout);

    /// Start the engine. Called exactly once per session, after
    /// `configure_storage` and before everything else.
    fn init(
        &self,
        is_tablet: bool,
        width: u32,
        height: u32,
        dpi_x: f32,
        dpi_y: f32,
        locale: &str,
    );

    /// A pointer went down.
    fn touch_down(
        &self,
        pointer_id: i32,
        x: f32,
        y: f32,
        event_time_ms: i64,
        delivery_time_ms: i64,
    );

    /// A downed pointer moved.
    fn touch_move(
        &self,
        pointer_id: i32,
        x: f32,
        y: f32,
        event_time_ms: i64,
        delivery_time_ms: i64,
    );

    /// A downed pointer was lifted.
    fn touch_up(
        &self,
        pointer_id: i32,
        x: f32,
        y: f32,
        event_time_ms: i64,
        delivery_time_ms: i64,
    );

    /// A downed pointer was canceled without a proper lift, e.g. when the
    /// application pauses mid-gesture.
    fn touch_cancel(&self, pointer_id: i32, event_time_ms: i64);

    /// The host session became visible.
    fn lifecycle_start(&self);

    /// The host session went to the background.
    fn lifecycle_stop(&self);

    /// The host session is returning from the background.
    fn lifecycle_restart(&self);

    /// The host session gained input focus.
    fn lifecycle_resume(&self);

    /// The host session lost input focus. Downed pointers are canceled
    /// before this call.
    fn lifecycle_pause(&self);

    /// The host session is going away for good. Render shutdown has already
    /// been signaled when this arrives.
    fn lifecycle_destroy(&self);

    /// The OS asked the process to shed memory.
    fn low_memory(&self);

    /// The render surface is up; GL resources may be created.
    fn graphics_init(&self);

    /// The render surface is going away; GL resources must be released.
    /// Called at most once, only after `graphics_init`.
    fn graphics_shutdown(&self);

    /// Draw one frame.
    fn draw_frame(&self);

    /// The render surface changed dimensions.
    fn surface_resized(&self, width: u32, height: u32);

    /// The usable display region changed.
    fn notify_safe_area(&self, insets: SafeAreaInsets);

    /// Whether the engine consumed a back-navigation press. When false the
    /// host applies its default back handling.
    fn back_button_handled(&self) -> bool;
}

static ENGINE: OnceCell<Arc<dyn EngineBinding>> = OnceCell::new();

/// Install the process-wide engine the JNI entry points hand sessions to.
///
/// The first installation wins; returns false (and logs) on any further
/// attempt.
pub fn install_engine(engine: Arc<dyn EngineBinding>) -> bool {
    let installed = ENGINE.set(engine).is_ok();
    if !installed {
        log::warn!("install_engine: an engine is already installed");
    }
    installed
}

/// The engine installed for this process, if any.
pub fn installed_engine() -> Option<Arc<dyn EngineBinding>> {
    ENGINE.get().cloned()
}
