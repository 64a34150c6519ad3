//! Decoded frame sequences loaded from a directory of still images.
//!
//! Playback order is the lexicographic order of the source file names. A
//! directory that is missing, empty, or full of undecodable files yields an
//! empty store; loading never fails outright.

use image::{ImageReader, RgbaImage};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::compositor;
use crate::error::FrameLoadError;
use crate::host::TextSink;
use crate::report;

/// Name of the placeholder written into a freshly created source directory
pub const PLACEHOLDER_NAME: &str = "README.txt";

const PLACEHOLDER_TEXT: &str =
    "Place your PNG sequence frames here:\nframe_0001.png\nframe_0002.png\n...etc";

/// Report loading progress every this many decoded frames
const PROGRESS_EVERY: usize = 10;

/// Image formats accepted as frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Png,
    Jpeg,
}

impl FrameFormat {
    pub const ALL: [FrameFormat; 2] = [FrameFormat::Png, FrameFormat::Jpeg];

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Png => &["png"],
            Self::Jpeg => &["jpg", "jpeg"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// A single decoded frame
#[derive(Debug, Clone)]
pub struct Frame {
    name: String,
    pixels: RgbaImage,
}

impl Frame {
    pub fn new(name: impl Into<String>, pixels: RgbaImage) -> Self {
        Self {
            name: name.into(),
            pixels,
        }
    }

    /// File name the frame was decoded from
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// How the frame source looked when the store was built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// Directory was missing and has been created with a placeholder
    Created,
    /// Directory exists but produced no frames
    Empty,
    /// At least one frame decoded
    Loaded,
    /// Directory could not be created or read
    Unavailable,
}

/// Outcome of a [`FrameStore::load`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub source: PathBuf,
    pub state: SourceState,
    /// Candidate image files found
    pub found: usize,
    pub loaded: usize,
    /// File names that failed to open or decode
    pub skipped: Vec<String>,
}

impl LoadReport {
    fn new(source: &Path, state: SourceState) -> Self {
        Self {
            source: source.to_path_buf(),
            state,
            found: 0,
            loaded: 0,
            skipped: Vec::new(),
        }
    }
}

/// Immutable, ordered collection of decoded frames
#[derive(Debug)]
pub struct FrameStore {
    frames: Vec<Frame>,
    report: LoadReport,
    released: bool,
}

impl FrameStore {
    /// Load every supported image in `path`, in file name order.
    ///
    /// A missing directory is created (with a README placeholder) and
    /// produces an empty store. Files that fail to decode are skipped.
    pub fn load(path: impl AsRef<Path>, sink: &dyn TextSink) -> Self {
        let path = path.as_ref();

        match prepare_source(path, sink) {
            Ok(true) => {}
            Ok(false) => return Self::empty(LoadReport::new(path, SourceState::Created)),
            Err(e) => {
                report!(sink, error, "ERROR checking directory: {}", e);
                return Self::empty(LoadReport::new(path, SourceState::Unavailable));
            }
        }

        let files = match collect_frame_files(path) {
            Ok(files) => files,
            Err(e) => {
                report!(sink, error, "ERROR listing frames: {}", e);
                return Self::empty(LoadReport::new(path, SourceState::Unavailable));
            }
        };

        let mut report = LoadReport::new(path, SourceState::Empty);
        if files.is_empty() {
            report!(sink, warn, "No image files found in source directory");
            report!(sink, info, "Please add PNG sequence frames to: {}", path.display());
            return Self::empty(report);
        }

        report.found = files.len();
        report!(sink, info, "Loading {} frames...", files.len());

        let mut frames = Vec::with_capacity(files.len());
        for file in &files {
            match decode_frame(file) {
                Ok(frame) => {
                    log::trace!(
                        "Decoded {} ({}x{})",
                        frame.name(),
                        frame.width(),
                        frame.height()
                    );
                    frames.push(frame);
                    if frames.len() % PROGRESS_EVERY == 0 {
                        report!(sink, info, "Loaded {}/{} frames...", frames.len(), files.len());
                    }
                }
                Err(e) => {
                    report!(sink, warn, "ERROR loading frame: {}", e);
                    report.skipped.push(file_name(file));
                }
            }
        }

        report.loaded = frames.len();
        if !frames.is_empty() {
            report.state = SourceState::Loaded;
        }
        report!(sink, info, "Successfully loaded {} video frames", frames.len());

        Self {
            frames,
            report,
            released: false,
        }
    }

    /// Build a store from frames decoded elsewhere, keeping their order
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        let state = if frames.is_empty() {
            SourceState::Empty
        } else {
            SourceState::Loaded
        };
        let mut report = LoadReport::new(Path::new(""), state);
        report.found = frames.len();
        report.loaded = frames.len();

        Self {
            frames,
            report,
            released: false,
        }
    }

    fn empty(report: LoadReport) -> Self {
        Self {
            frames: Vec::new(),
            report,
            released: false,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`.
    ///
    /// # Panics
    /// If `index >= frame_count()`. Callers wrap indices themselves.
    pub fn frame_at(&self, index: usize) -> &Frame {
        &self.frames[index]
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Drop every decoded frame. Returns how many were released; calling it
    /// again is a no-op that returns 0.
    pub fn release(&mut self) -> usize {
        if self.released {
            return 0;
        }

        let count = self.frames.len();
        self.frames = Vec::new();
        self.released = true;
        log::debug!("Released {} frames", count);
        count
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Scale every frame to `width`x`height` so drawing never resamples.
    ///
    /// A frame that fails to scale is kept at its decoded size. Returns how
    /// many frames were resized.
    pub fn fit_to(&mut self, width: u32, height: u32, sink: &dyn TextSink) -> usize {
        let mut resized = 0;
        for frame in &mut self.frames {
            if (frame.width(), frame.height()) == (width, height) {
                continue;
            }
            match compositor::scale_frame(frame, width, height) {
                Ok(scaled) => {
                    *frame = scaled;
                    resized += 1;
                }
                Err(e) => report!(sink, warn, "Keeping {} unscaled: {:#}", frame.name(), e),
            }
        }

        if resized > 0 {
            log::debug!("Scaled {} frames to {}x{}", resized, width, height);
        }
        resized
    }
}

/// Check the source directory, creating it when missing.
///
/// Returns `Ok(true)` if the directory already existed.
fn prepare_source(path: &Path, sink: &dyn TextSink) -> Result<bool, FrameLoadError> {
    if let Ok(cwd) = std::env::current_dir() {
        report!(sink, info, "Current directory: {}", cwd.display());
    }
    report!(sink, info, "Full source path: {}", path.display());

    if path.is_dir() {
        report!(sink, info, "Source directory exists");
        list_source(path, sink);
        return Ok(true);
    }

    report!(sink, info, "Source directory does not exist, creating it...");
    fs::create_dir_all(path).map_err(|source| FrameLoadError::CreateSource {
        path: path.to_path_buf(),
        source,
    })?;
    report!(sink, info, "Created directory: {}", path.display());

    let placeholder = path.join(PLACEHOLDER_NAME);
    fs::write(&placeholder, PLACEHOLDER_TEXT).map_err(|source| FrameLoadError::Placeholder {
        path: placeholder.clone(),
        source,
    })?;
    report!(sink, info, "Created {}", PLACEHOLDER_NAME);

    Ok(false)
}

/// Log the files in `path` with their sizes. Failures are reported and
/// otherwise ignored.
fn list_source(path: &Path, sink: &dyn TextSink) {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            report!(sink, warn, "ERROR listing directory {}: {}", path.display(), e);
            return;
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        match entry.and_then(|entry| Ok((entry.file_name(), entry.metadata()?))) {
            Ok((name, metadata)) if metadata.is_file() => files.push((name, metadata.len())),
            Ok(_) => {}
            Err(e) => report!(sink, warn, "ERROR reading directory entry: {}", e),
        }
    }
    files.sort();

    report!(sink, info, "Found {} files in directory:", files.len());
    for (name, size) in &files {
        report!(sink, debug, "  - {} ({} bytes)", name.to_string_lossy(), size);
    }
}

/// Supported image files in `dir`, sorted by file name.
///
/// PNG is the primary format: when any PNG is present, other formats are
/// ignored. Paths are kept as `OsString`s, so names need not be UTF-8.
fn collect_frame_files(dir: &Path) -> Result<Vec<PathBuf>, FrameLoadError> {
    let read_dir = |source| FrameLoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir)? {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if let Some(format) = FrameFormat::from_path(&path)
                    && path.is_file()
                {
                    candidates.push((format, path));
                }
            }
            Err(e) => log::warn!("Unreadable entry in {}: {}", dir.display(), e),
        }
    }

    let has_png = candidates.iter().any(|(f, _)| *f == FrameFormat::Png);
    if !has_png && !candidates.is_empty() {
        log::info!("No PNG files found, using other supported image files");
    }

    let mut files: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|(format, _)| !has_png || *format == FrameFormat::Png)
        .map(|(_, path)| path)
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

fn decode_frame(path: &Path) -> Result<Frame, FrameLoadError> {
    let name = file_name(path);
    let open_err = |source| FrameLoadError::Open {
        file: name.clone(),
        source,
    };

    let file = File::open(path).map_err(open_err)?;
    let reader = ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(open_err)?;
    let image = reader.decode().map_err(|source| FrameLoadError::Decode {
        file: name.clone(),
        source,
    })?;

    Ok(Frame::new(name, image.to_rgba8()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
