use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BridgeError;

/// Storage directories prepared for the engine before it starts.
///
/// `data` holds durable state, `raw` bundled-asset extractions, `cache`
/// regenerable files and `tmp` scratch space. The external set lives on
/// shared storage when the device offers a usable one; otherwise it falls
/// back to dedicated subdirectories under the internal roots, so every path
/// here is always usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageLayout {
    pub internal_data: PathBuf,
    pub internal_raw: PathBuf,
    pub internal_cache: PathBuf,
    pub internal_tmp: PathBuf,
    pub external_data: PathBuf,
    pub external_raw: PathBuf,
    pub external_cache: PathBuf,
    /// False when the external set is the internal fallback.
    pub external_available: bool,
}

impl StorageLayout {
    /// Derive the directory set from the host-provided roots and create
    /// every directory.
    pub fn prepare(
        files_dir: &Path,
        cache_dir: &Path,
        external: Option<(&Path, &Path)>,
    ) -> Result<Self, BridgeError> {
        let external_available = external.is_some();
        let (external_files, external_cache_root) = match external {
            Some((files, cache)) => (files.to_path_buf(), cache.to_path_buf()),
            None => (files_dir.join("external"), cache_dir.join("external")),
        };

        let layout = StorageLayout {
            internal_data: files_dir.join("data"),
            internal_raw: files_dir.join("raw"),
            internal_cache: cache_dir.join("cache"),
            internal_tmp: cache_dir.join("tmp"),
            external_data: external_files.join("data"),
            external_raw: external_files.join("raw"),
            external_cache: external_cache_root.join("cache"),
            external_available,
        };

        for dir in [
            &layout.internal_data,
            &layout.internal_raw,
            &layout.internal_cache,
            &layout.internal_tmp,
            &layout.external_data,
            &layout.external_raw,
            &layout.external_cache,
        ] {
            ensure_dir(dir)?;
        }

        if !external_available {
            log::info!("storage: no external volume, using internal fallback");
        }
        Ok(layout)
    }
}

fn ensure_dir(path: &Path) -> Result<(), BridgeError> {
    fs::create_dir_all(path).map_err(|source| BridgeError::StorageSetup {
        path: path.to_path_buf(),
        source,
    })
}

/// Physical display properties reported by the host at startup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayMetrics {
    pub width: u32,
    pub height: u32,
    pub dpi_x: f32,
    pub dpi_y: f32,
}

impl DisplayMetrics {
    /// Build metrics from raw host values, clamping negative dimensions to
    /// zero.
    pub fn from_host(width: i32, height: i32, dpi_x: f32, dpi_y: f32) -> Self {
        DisplayMetrics {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
            dpi_x,
            dpi_y,
        }
    }

    /// Correct anomalous per-axis density reporting.
    ///
    /// Some panels report one axis at roughly three times its real density
    /// because subpixel rows are counted as pixel rows. When the two axes
    /// disagree by a ratio inside the (2.9, 3.1) window, the inflated axis
    /// is divided by 3.
    pub fn normalized(mut self) -> Self {
        if self.dpi_x > self.dpi_y && is_anomalous_density_ratio(self.dpi_x / self.dpi_y) {
            log::info!("display: dpi_x {:.1} looks subpixel-inflated", self.dpi_x);
            self.dpi_x /= 3.0;
        } else if self.dpi_y > self.dpi_x && is_anomalous_density_ratio(self.dpi_y / self.dpi_x) {
            log::info!("display: dpi_y {:.1} looks subpixel-inflated", self.dpi_y);
            self.dpi_y /= 3.0;
        }
        self
    }
}

// TODO: confirm the 2.9..3.1 thresholds against the current device
// compatibility sheet before widening the window.
fn is_anomalous_density_ratio(ratio: f32) -> bool {
    ratio > 2.9 && ratio < 3.1
}

/// Opaque audio session id assigned by the host audio stack.
///
/// Held for the lifetime of a session and released on destroy; the bridge
/// never interprets it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioSessionHandle(pub i32);

/// Everything the host hands over when a session is created.
#[derive(Clone, Debug)]
pub struct BootstrapConfig {
    pub storage: StorageLayout,
    pub display: DisplayMetrics,
    pub is_tablet: bool,
    /// Pre-composed by the host, `lang` or `lang_COUNTRY`.
    pub locale: String,
    pub audio_session: AudioSessionHandle,
}

impl BootstrapConfig {
    /// Reject values the engine cannot start with.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.display.width == 0 || self.display.height == 0 {
            return Err(BridgeError::InvalidConfig(format!(
                "display size {}x{}",
                self.display.width, self.display.height
            )));
        }
        if !(self.display.dpi_x > 0.0 && self.display.dpi_y > 0.0) {
            return Err(BridgeError::InvalidConfig(format!(
                "display density {}x{}",
                self.display.dpi_x, self.display.dpi_y
            )));
        }
        Ok(())
    }
}
