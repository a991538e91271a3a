//! Wire bodies and image payloads served by the mock service

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path prefix of the mocked labs API
pub const API_PATH: &str = "/api/labs";

/// Base URL of the mocked labs API on `server`
pub fn api_base(server: &MockServer) -> String {
    format!("{}{}", server.uri(), API_PATH)
}

/// Task object in a non-terminal or failed state
pub fn task_body(id: &str, status: &str) -> Value {
    json!({ "id": id, "status": status, "created": 1_660_000_000, "object": "task" })
}

/// Generation items whose images are served from `/cdn/img{i}.webp` on `server`
pub fn generation_items(server: &MockServer, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "id": format!("generation-{i}"),
                "object": "generation",
                "generation": { "image_path": format!("{}/cdn/img{i}.webp", server.uri()) }
            })
        })
        .collect()
}

/// Succeeded task with `count` generations
pub fn succeeded_body(server: &MockServer, id: &str, count: usize) -> Value {
    json!({
        "id": id,
        "status": "succeeded",
        "created": 1_660_000_000,
        "generations": { "object": "list", "data": generation_items(server, count) }
    })
}

/// A small image encoded as `format`
pub fn image_bytes(format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_fn(16, 12, |x, y| image::Rgb([x as u8 * 15, y as u8 * 20, 128]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("Failed to encode fixture image");
    out.into_inner()
}

/// Serve `count` PNG images under `/cdn/img{i}.webp`
pub async fn mount_images(server: &MockServer, count: usize) {
    for i in 0..count {
        Mock::given(method("GET"))
            .and(path(format!("/cdn/img{i}.webp")))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(image_bytes(image::ImageFormat::Png)),
            )
            .expect(1)
            .mount(server)
            .await;
    }
}

/// Accept one submission and answer with job `id`
pub async fn mount_submit(server: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path(format!("{API_PATH}/tasks")))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_body(id, "pending")))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer status requests for job `id` with `pending` `pending_polls` times, then `final_body`
pub async fn mount_status(server: &MockServer, id: &str, pending_polls: u64, final_body: Value) {
    let status_path = format!("{API_PATH}/tasks/{id}");
    if pending_polls > 0 {
        Mock::given(method("GET"))
            .and(path(status_path.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(task_body(id, "pending")))
            .up_to_n_times(pending_polls)
            .expect(pending_polls)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(status_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(final_body))
        .mount(server)
        .await;
}

/// Serve one page of the saved collection
pub async fn mount_collection_page(server: &MockServer, page: u32, limit: u32, items: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(format!("{API_PATH}/collections/collection-it/generations")))
        .and(query_param("page", page.to_string()))
        .and(query_param("limit", limit.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "object": "list", "data": items })))
        .expect(1)
        .mount(server)
        .await;
}
