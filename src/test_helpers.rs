//! Shared test helpers: a scripted transport and image fixtures.

use crate::error::{Error, Result};
use crate::transport::{Request, Response, Transport};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that replays canned responses per URL and records every request.
///
/// Each request to a URL pops the next scripted reply; the last reply for a URL is
/// repeated forever. Unknown URLs answer 404. Every reply is held back by `latency`.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Result<Response>>>>,
    requests: Mutex<Vec<Request>>,
    latency: Mutex<Duration>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script the replies for `url`, in order
    pub(crate) fn route(&self, url: &str, replies: Vec<Result<Response>>) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into());
    }

    /// Delay every reply by `latency`
    pub(crate) fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut routes = self.routes.lock().unwrap();
        let Some(replies) = routes.get_mut(&url) else {
            return Ok(Response {
                status: 404,
                body: b"not found".to_vec(),
            });
        };
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            match replies.front().unwrap() {
                Ok(response) => Ok(response.clone()),
                Err(_) => Err(connection_refused(&url)),
            }
        }
    }
}

/// Simulated connection-level failure
pub(crate) fn connection_refused(url: &str) -> Error {
    Error::Transport {
        url: url.to_string(),
        status: None,
        body: String::new(),
        message: "connection refused".to_string(),
    }
}

pub(crate) fn json(status: u16, value: serde_json::Value) -> Result<Response> {
    Ok(Response {
        status,
        body: serde_json::to_vec(&value).unwrap(),
    })
}

pub(crate) fn bytes(body: Vec<u8>) -> Result<Response> {
    Ok(Response { status: 200, body })
}

pub(crate) fn task_json(id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({ "id": id, "status": status, "created": 1_660_000_000 })
}

/// Succeeded task with `count` generations served from `cdn`
pub(crate) fn succeeded_json(id: &str, count: usize, cdn: &str) -> serde_json::Value {
    let data: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "id": format!("generation-{i}"),
                "generation": { "image_path": format!("{cdn}/img{i}.webp") }
            })
        })
        .collect();
    serde_json::json!({
        "id": id,
        "status": "succeeded",
        "created": 1_660_000_000,
        "generations": { "object": "list", "data": data }
    })
}

/// A small PNG image as raw bytes
pub(crate) fn png_bytes() -> Vec<u8> {
    png_sized(8, 8)
}

/// A `width` x `height` PNG image as raw bytes
pub(crate) fn png_sized(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| image::Rgba([x as u8 * 30, y as u8 * 30, 90, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Writer that can be inspected after being handed to the poller
#[derive(Clone, Default)]
pub(crate) struct SharedBuf(pub(crate) Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
