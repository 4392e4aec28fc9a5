//! Android platform bridge for the Tarn engine.
//!
//! The Java host owns the activity, the GL surface view and its render
//! thread; the engine proper lives behind [`EngineBinding`]. This crate sits
//! between them:
//!
//! - [`Bridge`] runs on the UI thread: bootstrap and engine init, lifecycle
//!   routing, touch batch normalization, safe-area tracking.
//! - [`SurfaceController`] runs on the render thread: surface state,
//!   per-frame draw, checkpoint-based shutdown.
//! - The two halves share exactly one atomic flag ([`ShutdownSignal`]);
//!   neither thread ever blocks on the other.
//!
//! On Android the `android` module exports the JNI entry points. The
//! embedding engine crate installs its [`EngineBinding`] with
//! [`install_engine`] before the host creates the first session.

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod safe_area;
pub mod surface;
pub mod time;
pub mod touch;

#[cfg(target_os = "android")]
pub mod android;

pub use bridge::Bridge;
pub use config::{AudioSessionHandle, BootstrapConfig, DisplayMetrics, StorageLayout};
pub use engine::{install_engine, installed_engine, EngineBinding};
pub use error::BridgeError;
pub use lifecycle::{LifecycleEvent, LifecycleRouter};
pub use safe_area::{SafeAreaInsets, SafeAreaTracker};
pub use surface::{ShutdownSignal, SurfaceController, SurfaceState};
pub use touch::{normalize, normalize_with, InputBatch, PointerSample, Snapshot, TouchAction};
