//! Scoped handles for the dashboard's outer collaborators: chart canvases,
//! the camera used for visitor photos, and transient banners.
//!
//! Charts and camera streams are owned resources. Each slot releases what it
//! holds before acquiring a replacement and again when it is dropped, so a
//! closed view never leaves a canvas or a live camera behind.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::aggregates::ChartSeries;
use crate::errors::Result;

// ─── Charts ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Doughnut,
    Pie,
}

/// The charting collaborator. Owns rendering, legends and resizing.
pub trait ChartHost {
    type Handle;

    fn create(&mut self, kind: ChartKind, series: &ChartSeries) -> Result<Self::Handle>;
    fn destroy(&mut self, handle: Self::Handle);
}

/// One chart position on a page. At most one live chart at a time.
pub struct ChartSlot<H: ChartHost> {
    host: H,
    kind: ChartKind,
    current: Option<H::Handle>,
}

impl<H: ChartHost> ChartSlot<H> {
    pub fn new(host: H, kind: ChartKind) -> Self {
        Self {
            host,
            kind,
            current: None,
        }
    }

    /// Replace the live chart with one drawn from `series`.
    pub fn render(&mut self, series: &ChartSeries) -> Result<()> {
        self.release();
        let handle = self.host.create(self.kind, series)?;
        self.current = Some(handle);
        Ok(())
    }

    pub fn release(&mut self) {
        if let Some(handle) = self.current.take() {
            self.host.destroy(handle);
            debug!(kind = ?self.kind, "chart destroyed");
        }
    }

    pub fn is_live(&self) -> bool {
        self.current.is_some()
    }
}

impl<H: ChartHost> Drop for ChartSlot<H> {
    fn drop(&mut self) {
        self.release();
    }
}

// ─── Camera ───────────────────────────────────────────────────────────────

/// A camera-like device handing out streams.
pub trait MediaDevice {
    type Stream;

    fn acquire(&mut self) -> Result<Self::Stream>;

    /// Current frame as an image data URL.
    fn snapshot(&mut self, stream: &Self::Stream) -> Result<String>;

    fn stop_tracks(&mut self, stream: Self::Stream);
}

/// The visitor photo capture view. Holds a live stream while open.
pub struct CaptureView<D: MediaDevice> {
    device: D,
    stream: Option<D::Stream>,
}

impl<D: MediaDevice> CaptureView<D> {
    /// Open the view, acquiring a stream. Acquisition failures surface as-is.
    pub fn open(mut device: D) -> Result<Self> {
        let stream = device.acquire()?;
        debug!("camera stream acquired");
        Ok(Self {
            device,
            stream: Some(stream),
        })
    }

    /// Take a photo. `None` once the stream has been stopped.
    pub fn capture(&mut self) -> Result<Option<String>> {
        match &self.stream {
            Some(stream) => self.device.snapshot(stream).map(Some),
            None => Ok(None),
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.device.stop_tracks(stream);
            debug!("camera stream stopped");
        }
    }

    pub fn close(mut self) {
        self.stop();
    }
}

impl<D: MediaDevice> Drop for CaptureView<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─── Banners ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    pub shown_at: NaiveDateTime,
}

/// A single transient banner that clears itself `ttl` after it is shown.
/// A ttl past the calendar's range never expires.
#[derive(Debug, Clone)]
pub struct BannerSlot {
    ttl: Option<chrono::Duration>,
    current: Option<Banner>,
}

impl BannerSlot {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).ok(),
            current: None,
        }
    }

    pub fn success(&mut self, message: impl Into<String>, now: NaiveDateTime) {
        self.show(BannerKind::Success, message.into(), now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: NaiveDateTime) {
        self.show(BannerKind::Error, message.into(), now);
    }

    fn show(&mut self, kind: BannerKind, message: String, now: NaiveDateTime) {
        self.current = Some(Banner {
            kind,
            message,
            shown_at: now,
        });
    }

    /// The banner still visible at `now`.
    pub fn visible(&self, now: NaiveDateTime) -> Option<&Banner> {
        self.current.as_ref().filter(|b| {
            self.ttl
                .and_then(|ttl| b.shown_at.checked_add_signed(ttl))
                .map_or(true, |end| now < end)
        })
    }

    /// Drop an expired banner. Returns whether one was cleared.
    pub fn tick(&mut self, now: NaiveDateTime) -> bool {
        if self.current.is_some() && self.visible(now).is_none() {
            self.current = None;
            return true;
        }
        false
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
