use std::sync::Arc;

use crate::engine::EngineBinding;
use crate::surface::ShutdownSignal;

/// Host lifecycle transitions, delivered as one tagged stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    Start,
    Resume,
    Pause,
    Stop,
    Restart,
    Destroy,
    LowMemory,
}

/// Forwards lifecycle transitions to the engine in arrival order.
///
/// No buffering, no reordering. Destroy is terminal: it sets the render
/// shutdown signal strictly before `lifecycle_destroy`, and every event
/// arriving afterwards is dropped with a warning.
pub struct LifecycleRouter {
    engine: Arc<dyn EngineBinding>,
    shutdown: ShutdownSignal,
    destroyed: bool,
}

impl LifecycleRouter {
    pub(crate) fn new(engine: Arc<dyn EngineBinding>, shutdown: ShutdownSignal) -> Self {
        LifecycleRouter {
            engine,
            shutdown,
            destroyed: false,
        }
    }

    /// Route one transition.
    pub fn route(&mut self, event: LifecycleEvent) {
        if self.destroyed {
            log::warn!("route: {:?} after destroy, ignoring", event);
            return;
        }
        log::debug!("route: {:?}", event);
        match event {
            LifecycleEvent::Start => self.engine.lifecycle_start(),
            LifecycleEvent::Resume => self.engine.lifecycle_resume(),
            LifecycleEvent::Pause => self.engine.lifecycle_pause(),
            LifecycleEvent::Stop => self.engine.lifecycle_stop(),
            LifecycleEvent::Restart => self.engine.lifecycle_restart(),
            LifecycleEvent::LowMemory => self.engine.low_memory(),
            LifecycleEvent::Destroy => {
                self.shutdown.request();
                self.engine.lifecycle_destroy();
                self.destroyed = true;
            }
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
