//! Off-thread extraction with request/response correlation.
//!
//! [`PaletteWorker`] runs extractions on tokio's blocking pool. Each call registers a
//! single-use `oneshot` sender under a fresh request id; a router task hands every
//! [`Response`] to the sender registered under its id, so any number of extractions can be
//! in flight at once and errors reach exactly the caller that issued the request.
//!
//! Dropping the future returned by [`PaletteWorker::extract`] does not cancel the extraction;
//! its response is discarded when it arrives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::color::{Color, PackedColor};
use crate::error::{Error, Result};
use crate::extractor::{Extractor, ExtractorOptions, ImageData};
use crate::palette::Palette;
use crate::swatch::Swatch;

/// An extraction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA bytes.
    pub data: Vec<u8>,
    /// Size of the image `data` was downscaled from, if any.
    #[serde(default)]
    pub origin: Option<(u32, u32)>,
    #[serde(default)]
    pub options: ExtractorOptions,
}

impl Request {
    /// Build a request, moving the pixel buffer out of `image`.
    pub fn new(id: u64, image: ImageData, options: ExtractorOptions) -> Self {
        let (width, height) = (image.width(), image.height());
        let origin = image.origin();
        Self {
            id,
            width,
            height,
            origin: (origin != (width, height)).then_some(origin),
            data: image.into_data(),
            options,
        }
    }
}

/// A swatch in wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedSwatch {
    /// `0xRRGGBBAA`.
    pub color: PackedColor,
    pub population: usize,
    pub position: (u32, u32),
}

/// The outcome of one request, tagged with the request's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Response {
    Success { id: u64, swatches: Vec<PackedSwatch> },
    Error { id: u64, message: String },
}

impl Response {
    pub fn id(&self) -> u64 {
        match self {
            Response::Success { id, .. } | Response::Error { id, .. } => *id,
        }
    }

    /// Rebuild the palette, or surface the remote error.
    pub fn into_palette(self) -> Result<Palette> {
        match self {
            Response::Success { swatches, .. } => {
                let swatches = swatches
                    .into_iter()
                    .map(|s| Swatch::new(Color::from_packed(s.color), s.position, s.population))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Palette::new(swatches))
            }
            Response::Error { message, .. } => Err(Error::Worker(message)),
        }
    }
}

/// Run one request synchronously.
pub fn handle(request: Request) -> Response {
    let id = request.id;
    match run(request) {
        Ok(swatches) => Response::Success {
            id,
            swatches: swatches
                .iter()
                .map(|s| PackedSwatch {
                    color: s.color().to_packed(),
                    population: s.population(),
                    position: s.position(),
                })
                .collect(),
        },
        Err(e) => Response::Error {
            id,
            message: e.to_string(),
        },
    }
}

fn run(request: Request) -> Result<Vec<Swatch>> {
    let mut image = ImageData::new(request.width, request.height, request.data)?;
    if let Some((width, height)) = request.origin {
        image = image.with_origin(width, height)?;
    }
    Extractor::new(request.options).extract(&image)
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>;

/// Handle to a background extraction service.
///
/// Must be created inside a tokio runtime. The background tasks stop once the worker is
/// dropped and in-flight extractions have finished.
pub struct PaletteWorker {
    requests: mpsc::UnboundedSender<Request>,
    pending: Pending,
    next_id: AtomicU64,
}

impl PaletteWorker {
    pub fn spawn() -> Self {
        Self::spawn_with(handle)
    }

    fn spawn_with(handler: fn(Request) -> Response) -> Self {
        let (requests, mut request_rx) = mpsc::unbounded_channel::<Request>();
        let (response_tx, mut response_rx) = mpsc::unbounded_channel::<Response>();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));

        // Dispatcher: one blocking task per request. A failed task still answers its caller.
        tokio::spawn(async move {
            while let Some(request) = request_rx.recv().await {
                let response_tx = response_tx.clone();
                tokio::spawn(async move {
                    let id = request.id;
                    let response = match tokio::task::spawn_blocking(move || handler(request)).await {
                        Ok(response) => response,
                        Err(e) => {
                            error!("request {} failed: {}", id, e);
                            Response::Error {
                                id,
                                message: format!("extraction task failed: {e}"),
                            }
                        }
                    };
                    if response_tx.send(response).is_err() {
                        warn!("router stopped before request {} was answered", id);
                    }
                });
            }
        });

        // Router: complete the caller registered under the response id.
        let router_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(response) = response_rx.recv().await {
                let id = response.id();
                match router_pending.lock().await.remove(&id) {
                    Some(sender) => {
                        if sender.send(response).is_err() {
                            debug!("request {} was abandoned by its caller", id);
                        }
                    }
                    None => warn!("response {} has no waiting caller", id),
                }
            }
        });

        Self {
            requests,
            pending,
            next_id: AtomicU64::new(0),
        }
    }

    /// Extract a palette off the calling thread.
    pub async fn extract(&self, image: ImageData, options: ExtractorOptions) -> Result<Palette> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        self.pending.lock().await.insert(id, sender);

        if self.requests.send(Request::new(id, image, options)).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(Error::Worker("worker has shut down".to_string()));
        }

        let response = receiver
            .await
            .map_err(|_| Error::Worker(format!("request {id} was dropped without a response")))?;
        response.into_palette()
    }

    /// Number of requests still waiting for a response.
    pub async fn pending(&self) -> usize {
        self.pending.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn halves() -> ImageData {
        let mut data = Vec::new();
        for _ in 0..4 {
            for x in 0..4 {
                let px = if x < 2 { [255, 0, 0, 255] } else { [0, 0, 255, 255] };
                data.extend_from_slice(&px);
            }
        }
        ImageData::new(4, 4, data).unwrap()
    }

    #[test]
    fn handle_reports_errors_with_the_request_id() {
        let request = Request {
            id: 7,
            width: 2,
            height: 2,
            data: vec![0; 3],
            origin: None,
            options: ExtractorOptions::default(),
        };
        match handle(request) {
            Response::Error { id, message } => {
                assert_eq!(id, 7);
                assert!(message.contains("invalid image"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn handle_packs_swatches() {
        let options = ExtractorOptions::default().with_algorithm(crate::cluster::Dbscan::new(2, 0.3));
        let response = handle(Request::new(3, halves(), options));
        assert_eq!(response.id(), 3);
        let palette = response.into_palette().unwrap();
        assert_eq!(palette.len(), 2);
        let packed: Vec<PackedColor> = palette.swatches().iter().map(|s| s.color().to_packed()).collect();
        assert!(packed.contains(&0xff0000ff));
        assert!(packed.contains(&0x0000ffff));
    }

    #[test]
    fn request_keeps_origin_only_when_scaled() {
        let plain = Request::new(1, halves(), ExtractorOptions::default());
        assert_eq!(plain.origin, None);
        let scaled = Request::new(2, halves().with_origin(40, 40).unwrap(), ExtractorOptions::default());
        assert_eq!(scaled.origin, Some((40, 40)));
    }

    #[test]
    fn response_serde_shape() {
        let response = Response::Error {
            id: 1,
            message: "boom".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"type":"error","id":1,"message":"boom"}"#);
        assert!(matches!(response.into_palette(), Err(Error::Worker(m)) if m == "boom"));
    }

    #[tokio::test]
    async fn failed_extraction_still_answers_the_caller() {
        let worker = PaletteWorker::spawn_with(|_: Request| -> Response { panic!("extraction blew up") });
        let result = worker.extract(halves(), ExtractorOptions::default()).await;
        assert!(matches!(result, Err(Error::Worker(m)) if m.contains("extraction task failed")));
        assert_eq!(worker.pending().await, 0);
    }
}
