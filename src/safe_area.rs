use std::sync::Arc;

use crate::engine::EngineBinding;

/// Display intrusions (cutouts, notches) in device pixels, measured from
/// each screen edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SafeAreaInsets {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl SafeAreaInsets {
    pub const ZERO: SafeAreaInsets = SafeAreaInsets {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        SafeAreaInsets {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Forwards safe-area changes to the engine, deduplicating repeats.
///
/// UI-thread only. Starts from the all-zero record, so the first real
/// cutout always reaches the engine while cutout-free devices never
/// produce a call.
pub struct SafeAreaTracker {
    engine: Arc<dyn EngineBinding>,
    last: SafeAreaInsets,
}

impl SafeAreaTracker {
    pub(crate) fn new(engine: Arc<dyn EngineBinding>) -> Self {
        SafeAreaTracker {
            engine,
            last: SafeAreaInsets::ZERO,
        }
    }

    /// Resolve one host insets callback and push it on change.
    ///
    /// A missing cutout record means the whole surface is usable, so `None`
    /// resolves to zero insets. Returns the resolved record.
    pub fn apply(&mut self, insets: Option<SafeAreaInsets>) -> SafeAreaInsets {
        let resolved = insets.unwrap_or(SafeAreaInsets::ZERO);
        if resolved != self.last {
            log::debug!("safe area changed: {:?}", resolved);
            self.engine.notify_safe_area(resolved);
            self.last = resolved;
        }
        resolved
    }

    /// Last record pushed to the engine (zero until the first push).
    pub fn last(&self) -> SafeAreaInsets {
        self.last
    }
}
