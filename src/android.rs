#![allow(non_snake_case)]
#![allow(clippy::too_many_arguments)]

//! JNI entry points for the Java host.
//!
//! Thin wrappers only: marshal arguments, thread the opaque handles, keep
//! every failure on this side of the boundary. The bridge handle lives on
//! the activity, the renderer handle on the GL renderer; each is used only
//! from its own thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use jni::objects::{JClass, JFloatArray, JIntArray, JLongArray, JString};
use jni::sys::{jboolean, jfloat, jint, jlong, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;

use crate::bridge::Bridge;
use crate::config::{AudioSessionHandle, BootstrapConfig, DisplayMetrics, StorageLayout};
use crate::engine;
use crate::lifecycle::LifecycleEvent;
use crate::safe_area::SafeAreaInsets;
use crate::surface::SurfaceController;
use crate::touch::{InputBatch, Snapshot};

/// Opaque bridge handle held by the activity.
pub type BridgeHandle = *mut Bridge;

/// Opaque renderer handle held by the GL renderer.
pub type RendererHandle = *mut SurfaceController;

// One live bridge per process. Cleared on destroy so activity re-creation
// can build a fresh session.
static BRIDGE_LIVE: AtomicBool = AtomicBool::new(false);

fn init_logging() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("TarnBridge"),
    );
}

fn read_string(env: &mut JNIEnv, value: &JString, what: &str) -> Option<String> {
    match env.get_string(value) {
        Ok(s) => Some(s.into()),
        Err(err) => {
            log::error!("nativeCreate: unreadable {}: {}", what, err);
            None
        }
    }
}

fn read_ints(env: &mut JNIEnv, array: &JIntArray) -> jni::errors::Result<Vec<i32>> {
    let len = env.get_array_length(array)? as usize;
    let mut buf = vec![0; len];
    env.get_int_array_region(array, 0, &mut buf)?;
    Ok(buf)
}

fn read_longs(env: &mut JNIEnv, array: &JLongArray) -> jni::errors::Result<Vec<i64>> {
    let len = env.get_array_length(array)? as usize;
    let mut buf = vec![0; len];
    env.get_long_array_region(array, 0, &mut buf)?;
    Ok(buf)
}

fn read_floats(env: &mut JNIEnv, array: &JFloatArray) -> jni::errors::Result<Vec<f32>> {
    let len = env.get_array_length(array)? as usize;
    let mut buf = vec![0.0; len];
    env.get_float_array_region(array, 0, &mut buf)?;
    Ok(buf)
}

fn build_bootstrap(
    env: &mut JNIEnv,
    files_dir: &JString,
    cache_dir: &JString,
    external_files_dir: &JString,
    external_cache_dir: &JString,
    is_tablet: jboolean,
    width: jint,
    height: jint,
    dpi_x: jfloat,
    dpi_y: jfloat,
    locale: &JString,
    audio_session_id: jint,
) -> Option<BootstrapConfig> {
    let files = PathBuf::from(read_string(env, files_dir, "files dir")?);
    let cache = PathBuf::from(read_string(env, cache_dir, "cache dir")?);
    // Both external roots are null when no shared storage is usable.
    let external = if external_files_dir.as_raw().is_null() || external_cache_dir.as_raw().is_null()
    {
        None
    } else {
        Some((
            PathBuf::from(read_string(env, external_files_dir, "external files dir")?),
            PathBuf::from(read_string(env, external_cache_dir, "external cache dir")?),
        ))
    };
    let locale = read_string(env, locale, "locale")?;

    let storage = match StorageLayout::prepare(
        &files,
        &cache,
        external.as_ref().map(|(f, c)| (f.as_path(), c.as_path())),
    ) {
        Ok(storage) => storage,
        Err(err) => {
            log::error!("nativeCreate: {}", err);
            return None;
        }
    };

    Some(BootstrapConfig {
        storage,
        display: DisplayMetrics::from_host(width, height, dpi_x, dpi_y),
        is_tablet: is_tablet != JNI_FALSE,
        locale,
        audio_session: AudioSessionHandle(audio_session_id),
    })
}

/// Boot the bridge for a new host session.
/// Called from TarnActivity.onCreate() on the UI thread. Returns 0 when
/// creation is refused: no engine installed, a session already live, or
/// unusable bootstrap data.
#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeCreate(
    mut env: JNIEnv,
    _class: JClass,
    files_dir: JString,
    cache_dir: JString,
    external_files_dir: JString,
    external_cache_dir: JString,
    is_tablet: jboolean,
    width: jint,
    height: jint,
    dpi_x: jfloat,
    dpi_y: jfloat,
    locale: JString,
    audio_session_id: jint,
) -> jlong {
    init_logging();

    let engine = match engine::installed_engine() {
        Some(engine) => engine,
        None => {
            log::error!("nativeCreate: no engine installed");
            return 0;
        }
    };
    if BRIDGE_LIVE.swap(true, Ordering::SeqCst) {
        log::warn!("nativeCreate: a bridge is already live, ignoring duplicate create");
        return 0;
    }

    let boot = match build_bootstrap(
        &mut env,
        &files_dir,
        &cache_dir,
        &external_files_dir,
        &external_cache_dir,
        is_tablet,
        width,
        height,
        dpi_x,
        dpi_y,
        &locale,
        audio_session_id,
    ) {
        Some(boot) => boot,
        None => {
            BRIDGE_LIVE.store(false, Ordering::SeqCst);
            return 0;
        }
    };

    match Bridge::new(engine, boot) {
        Ok(bridge) => Box::into_raw(Box::new(bridge)) as jlong,
        Err(err) => {
            log::error!("nativeCreate: {}", err);
            BRIDGE_LIVE.store(false, Ordering::SeqCst);
            0
        }
    }
}

fn route(handle: jlong, event: LifecycleEvent) {
    let bridge = handle as BridgeHandle;
    if bridge.is_null() {
        return;
    }
    let bridge = unsafe { &mut *bridge };
    bridge.handle_lifecycle(event);
}

#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnStart(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    route(handle, LifecycleEvent::Start);
}

#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnResume(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    route(handle, LifecycleEvent::Resume);
}

#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnPause(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    route(handle, LifecycleEvent::Pause);
}

#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnStop(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    route(handle, LifecycleEvent::Stop);
}

#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnRestart(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    route(handle, LifecycleEvent::Restart);
}

#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnLowMemory(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    route(handle, LifecycleEvent::LowMemory);
}

/// Route the terminal destroy and free the bridge.
/// The Java side must null its handle right after; the renderer handle
/// stays valid until the render loop exits and releases it.
#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnDestroy(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    let bridge = handle as BridgeHandle;
    if bridge.is_null() {
        return;
    }
    {
        let bridge = unsafe { &mut *bridge };
        bridge.handle_lifecycle(LifecycleEvent::Destroy);
    }
    drop(unsafe { Box::from_raw(bridge) });
    BRIDGE_LIVE.store(false, Ordering::SeqCst);
    log::info!("nativeOnDestroy: bridge freed");
}

fn read_batch(
    env: &mut JNIEnv,
    action: jint,
    pointer_ids: &JIntArray,
    xs: &JFloatArray,
    ys: &JFloatArray,
    event_time: jlong,
    history_times: &JLongArray,
    history_xs: &JFloatArray,
    history_ys: &JFloatArray,
) -> jni::errors::Result<InputBatch> {
    let ids = read_ints(env, pointer_ids)?;
    let pointer_count = ids.len();
    let current = Snapshot {
        event_time_ms: event_time,
        xs: read_floats(env, xs)?,
        ys: read_floats(env, ys)?,
    };

    let times = read_longs(env, history_times)?;
    let hist_xs = read_floats(env, history_xs)?;
    let hist_ys = read_floats(env, history_ys)?;
    let mut history = Vec::with_capacity(times.len());
    for (h, &time) in times.iter().enumerate() {
        let start = h * pointer_count;
        let end = start + pointer_count;
        if end > hist_xs.len() || end > hist_ys.len() {
            log::warn!(
                "nativeOnTouchBatch: truncated history, keeping {} of {} snapshots",
                h,
                times.len()
            );
            break;
        }
        history.push(Snapshot {
            event_time_ms: time,
            xs: hist_xs[start..end].to_vec(),
            ys: hist_ys[start..end].to_vec(),
        });
    }

    Ok(InputBatch {
        action,
        pointer_ids: ids,
        history,
        current,
    })
}

/// Deliver one MotionEvent batch.
/// Called from TarnSurfaceView.onTouchEvent() on the UI thread. History
/// coordinates are snapshot-major: historyXs[h * pointerCount + i] belongs
/// to snapshot h, pointer index i.
#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnTouchBatch(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    action: jint,
    pointer_ids: JIntArray,
    xs: JFloatArray,
    ys: JFloatArray,
    event_time: jlong,
    history_times: JLongArray,
    history_xs: JFloatArray,
    history_ys: JFloatArray,
) {
    let bridge = handle as BridgeHandle;
    if bridge.is_null() {
        return;
    }
    let batch = match read_batch(
        &mut env,
        action,
        &pointer_ids,
        &xs,
        &ys,
        event_time,
        &history_times,
        &history_xs,
        &history_ys,
    ) {
        Ok(batch) => batch,
        Err(err) => {
            log::error!("nativeOnTouchBatch: {}", err);
            return;
        }
    };
    let bridge = unsafe { &mut *bridge };
    bridge.handle_touch_batch(&batch);
}

#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnBackPressed(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jboolean {
    let bridge = handle as BridgeHandle;
    if bridge.is_null() {
        return JNI_FALSE;
    }
    let bridge = unsafe { &*bridge };
    if bridge.back_pressed() {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

/// Forward a window insets change. has_cutout is false when the host got a
/// null cutout record.
#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnInsetsChanged(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    has_cutout: jboolean,
    left: jint,
    top: jint,
    right: jint,
    bottom: jint,
) {
    let bridge = handle as BridgeHandle;
    if bridge.is_null() {
        return;
    }
    let bridge = unsafe { &mut *bridge };
    let insets = if has_cutout != JNI_FALSE {
        Some(SafeAreaInsets::new(
            left.max(0) as u32,
            top.max(0) as u32,
            right.max(0) as u32,
            bottom.max(0) as u32,
        ))
    } else {
        None
    };
    bridge.handle_insets(insets);
}

/// Split the render half off the bridge.
/// Called once from TarnRenderer construction on the UI thread, before the
/// GL thread starts. Returns 0 when the renderer is already taken.
#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeTakeRenderer(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jlong {
    let bridge = handle as BridgeHandle;
    if bridge.is_null() {
        return 0;
    }
    let bridge = unsafe { &mut *bridge };
    match bridge.take_renderer() {
        Some(renderer) => Box::into_raw(Box::new(renderer)) as jlong,
        None => 0,
    }
}

#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnSurfaceCreated(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    let renderer = handle as RendererHandle;
    if renderer.is_null() {
        return;
    }
    let renderer = unsafe { &mut *renderer };
    renderer.create();
}

#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnSurfaceChanged(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    width: jint,
    height: jint,
) {
    let renderer = handle as RendererHandle;
    if renderer.is_null() {
        return;
    }
    let renderer = unsafe { &mut *renderer };
    renderer.resize(width.max(0) as u32, height.max(0) as u32);
}

/// Drive one frame. Returns false once shutdown completed; the renderer
/// should stop its loop and call nativeReleaseRenderer.
#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeOnDrawFrame(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) -> jboolean {
    let renderer = handle as RendererHandle;
    if renderer.is_null() {
        return JNI_FALSE;
    }
    let renderer = unsafe { &mut *renderer };
    if renderer.render_frame() {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

/// Free the renderer after its loop exited.
/// The Java side must null its handle right after.
#[no_mangle]
pub extern "system" fn Java_com_tarn_engine_TarnNative_nativeReleaseRenderer(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
) {
    let renderer = handle as RendererHandle;
    if renderer.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(renderer) });
    log::info!("nativeReleaseRenderer: renderer freed");
}
