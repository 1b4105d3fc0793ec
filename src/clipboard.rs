use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use arboard::Clipboard;
use image::RgbaImage;
use snapnote::dispatch::DispatchHandle;

/// Messages from the watcher thread to the UI loop.
pub enum WatcherEvent {
    ImageDetected(RgbaImage),
    Error(String),
}

/// Polls the clipboard on its own thread and hands new images to the UI
/// thread; it never sees editor state.
pub struct ClipboardWatcher {
    stop: Arc<AtomicBool>,
    _worker: thread::JoinHandle<()>,
}

impl ClipboardWatcher {
    pub fn spawn(tx: DispatchHandle<WatcherEvent>, interval: Duration) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name("clipboard-watcher".into())
            .spawn(move || watcher_loop(tx, stop_flag, interval))
            .context("cannot start clipboard watcher")?;
        Ok(Self {
            stop,
            _worker: worker,
        })
    }
}

impl Drop for ClipboardWatcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

fn watcher_loop(tx: DispatchHandle<WatcherEvent>, stop: Arc<AtomicBool>, interval: Duration) {
    let mut clipboard = Clipboard::new().ok();
    let mut seen = ImageDedup::default();
    let mut last_error: Option<String> = None;

    // whatever is on the clipboard at startup is not a new capture
    if let Some(Ok(Some(image))) = clipboard.as_mut().map(read_from) {
        seen.is_new(&image);
    }

    while !stop.load(Ordering::Relaxed) {
        thread::sleep(interval);

        if clipboard.is_none() {
            clipboard = Clipboard::new().ok();
        }
        let Some(clipboard) = clipboard.as_mut() else {
            continue;
        };

        match read_from(clipboard) {
            Ok(Some(image)) if seen.is_new(&image) => {
                last_error = None;
                log::info!("clipboard image {}x{} detected", image.width(), image.height());
                if !tx.send(WatcherEvent::ImageDetected(image)) {
                    break;
                }
            }
            Ok(_) => {}
            Err(err) => {
                let message = format!("clipboard read failed: {err:#}");
                if last_error.as_deref() != Some(message.as_str()) {
                    log::warn!("{message}");
                    if !tx.send(WatcherEvent::Error(message.clone())) {
                        break;
                    }
                    last_error = Some(message);
                }
            }
        }
    }
    log::debug!("clipboard watcher stopped");
}

pub fn read_image() -> Result<Option<RgbaImage>> {
    let mut clipboard = Clipboard::new().context("cannot initialize clipboard")?;
    read_from(&mut clipboard)
}

fn read_from(clipboard: &mut Clipboard) -> Result<Option<RgbaImage>> {
    let Ok(data) = clipboard.get_image() else {
        return Ok(None);
    };
    let (width, height) = (data.width as u32, data.height as u32);
    RgbaImage::from_raw(width, height, data.bytes.into_owned())
        .map(Some)
        .ok_or_else(|| anyhow!("clipboard image has invalid shape {width}x{height}"))
}

pub fn write_image(image: &RgbaImage) -> Result<()> {
    let mut clipboard = Clipboard::new().context("cannot initialize clipboard")?;
    clipboard
        .set_image(arboard::ImageData {
            width: image.width() as usize,
            height: image.height() as usize,
            bytes: Cow::Borrowed(image.as_raw()),
        })
        .context("cannot write image to clipboard")
}

/// Remembers the last image by content hash.
#[derive(Default)]
struct ImageDedup {
    last: Option<u64>,
}

impl ImageDedup {
    fn is_new(&mut self, image: &RgbaImage) -> bool {
        let fingerprint = fingerprint(image);
        if self.last == Some(fingerprint) {
            return false;
        }
        self.last = Some(fingerprint);
        true
    }
}

fn fingerprint(image: &RgbaImage) -> u64 {
    let mut hasher = DefaultHasher::new();
    hasher.write_u32(image.width());
    hasher.write_u32(image.height());
    hasher.write(image.as_raw());
    hasher.finish()
}
