//! Frame sources.
//!
//! A frame either carries a camera image for a [`LandmarkDetector`], or the
//! landmarks an external detector already produced. [`LandmarkStream`] reads
//! the latter as newline-delimited JSON:
//!
//! ```text
//! {"t": 0.5, "presence": true, "landmarks": [[0.51, 0.62, 0.0], ...]}
//! {"t": 0.6, "presence": false}
//! {"t": 0.7, "error": "inference timed out"}
//! ```
//!
//! `t` is seconds since the start of the stream. Without it the time the line
//! was read is used.

use crate::error::HandCursorError;
use crate::hand_gestures::landmarks::{Detection, Landmark, LandmarkFrame};
use anyhow::Context;
use serde::Deserialize;
use std::io::BufRead;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub enum FramePayload {
    Image(image::RgbImage),
    Landmarks(Detection),
    /// The upstream detector failed on this frame.
    DetectionFailed(String),
}

#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub captured_at: Instant,
    pub payload: FramePayload,
}

pub trait FrameSource {
    /// Blocks until the next frame. `Ok(None)` means the source is exhausted.
    fn next_frame(&mut self) -> anyhow::Result<Option<CapturedFrame>>;
}

pub trait LandmarkDetector {
    fn process(&mut self, image: &image::RgbImage) -> anyhow::Result<Detection>;
}

#[derive(Debug, Deserialize)]
struct StreamRecord {
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    presence: bool,
    #[serde(default)]
    landmarks: Option<Vec<[f64; 3]>>,
    #[serde(default)]
    error: Option<String>,
}

pub struct LandmarkStream<R> {
    reader: R,
    origin: Instant,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> LandmarkStream<R> {
    pub fn new(reader: R, origin: Instant) -> Self {
        Self {
            reader,
            origin,
            line_no: 0,
            buf: String::new(),
        }
    }

    fn timestamp(&self, t: Option<f64>) -> anyhow::Result<Instant> {
        let Some(t) = t else {
            return Ok(Instant::now());
        };
        let offset = Duration::try_from_secs_f64(t)
            .map_err(|err| anyhow::anyhow!("invalid timestamp {t}: {err}"))?;
        self.origin
            .checked_add(offset)
            .ok_or_else(|| anyhow::anyhow!("timestamp {t} out of range"))
    }
}

impl<R: BufRead> FrameSource for LandmarkStream<R> {
    fn next_frame(&mut self) -> anyhow::Result<Option<CapturedFrame>> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_line(&mut self.buf)
                .context("failed to read landmark stream")?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }

            let record: StreamRecord = serde_json::from_str(line)
                .with_context(|| format!("malformed landmark record on line {}", self.line_no))?;
            let captured_at = self
                .timestamp(record.t)
                .with_context(|| format!("line {}", self.line_no))?;
            return Ok(Some(CapturedFrame {
                captured_at,
                payload: record.into_payload(),
            }));
        }
    }
}

impl StreamRecord {
    fn into_payload(self) -> FramePayload {
        if let Some(error) = self.error {
            return FramePayload::DetectionFailed(error);
        }
        if !self.presence {
            return FramePayload::Landmarks(Detection::none());
        }
        let Some(raw) = self.landmarks else {
            return FramePayload::Landmarks(Detection {
                presence: true,
                landmarks: None,
            });
        };
        let points: Vec<Landmark> = raw.into_iter().map(Landmark::from).collect();
        match LandmarkFrame::from_points(&points) {
            Ok(frame) => FramePayload::Landmarks(Detection::hand(frame)),
            Err(err) => FramePayload::DetectionFailed(err.to_string()),
        }
    }
}

/// Open the configured landmark stream, or stdin when no path is given.
pub fn open_landmark_stream(
    path: Option<&str>,
) -> Result<Box<dyn FrameSource>, HandCursorError> {
    let origin = Instant::now();
    match path {
        Some(path) => {
            let file = std::fs::File::open(path).map_err(|err| {
                HandCursorError::FrameSourceUnavailable(format!("{path}: {err}"))
            })?;
            tracing::info!(path, "reading landmarks from file");
            Ok(Box::new(LandmarkStream::new(
                std::io::BufReader::new(file),
                origin,
            )))
        }
        None => {
            tracing::info!("reading landmarks from stdin");
            Ok(Box::new(LandmarkStream::new(std::io::stdin().lock(), origin)))
        }
    }
}
