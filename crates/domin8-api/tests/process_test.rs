//! `/process` integration tests.
//!
//! Run with: `cargo test -p domin8-api --test process_test`

mod helpers;

use domin8_core::{DeliveryKey, SecureDeliveryWrapper};
use helpers::fixtures;
use helpers::{files_in, process_form, setup_test_app, setup_test_app_with, wait_until_empty};
use image::Rgba;
use std::time::Duration;

const RED: [u8; 4] = [255, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

#[tokio::test]
async fn test_image_watermark_west_placement() {
    let app = setup_test_app().await;

    let form = process_form(
        ("photo.png", "image/png", fixtures::png(640, 480, WHITE)),
        ("logo.png", "image/png", fixtures::png(64, 64, RED)),
        "image",
    );
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/png");
    let disposition = response.header("content-disposition");
    let disposition = disposition.to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"domin8_"));
    assert!(disposition.ends_with(".png\""));

    let output = fixtures::decode_png(response.as_bytes());
    assert_eq!(output.dimensions(), (640, 480));
    assert_eq!(output.get_pixel(0, 208), &Rgba(RED));
    assert_eq!(output.get_pixel(63, 271), &Rgba(RED));
    assert_eq!(output.get_pixel(320, 240), &Rgba(WHITE));
}

#[tokio::test]
async fn test_jpeg_input_is_delivered_as_png() {
    let app = setup_test_app().await;

    let form = process_form(
        (
            "photo.jpg",
            "image/jpeg",
            fixtures::solid_image(120, 90, WHITE, image::ImageFormat::Jpeg),
        ),
        ("logo.png", "image/png", fixtures::png(16, 16, RED)),
        "image",
    );
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(fixtures::decode_png(response.as_bytes()).dimensions(), (120, 90));
}

#[tokio::test]
async fn test_3d_asset_is_returned_unchanged() {
    let app = setup_test_app().await;
    let model = fixtures::glb_blob();

    let form = process_form(
        ("robot.glb", "model/gltf-binary", model.clone()),
        ("logo.png", "image/png", fixtures::png(16, 16, RED)),
        "3d",
    );
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "model/gltf-binary");
    assert_eq!(&response.as_bytes()[..], model.as_slice());
    assert!(response
        .header("content-disposition")
        .to_str()
        .unwrap()
        .ends_with(".glb\""));
}

#[tokio::test]
async fn test_invalid_ffmpeg_path_fails_without_output() {
    let app = setup_test_app_with(&[("FFMPEG_PATH", "/nonexistent/bin/ffmpeg")]).await;

    let form = process_form(
        ("clip.mp4", "video/mp4", b"\x00\x00\x00\x18ftypmp42".to_vec()),
        ("logo.png", "image/png", fixtures::png(16, 16, RED)),
        "video",
    );
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 500);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "COMPOSITION_ERROR");
    assert_eq!(body["error"], "Processing error");

    assert!(files_in(&app.output_dir()).is_empty());
    assert!(files_in(&app.media_dir()).is_empty());
    assert!(files_in(&app.logo_dir()).is_empty());
}

#[tokio::test]
async fn test_missing_field_is_rejected() {
    let app = setup_test_app().await;

    let form = axum_test::multipart::MultipartForm::new()
        .add_part(
            "file",
            axum_test::multipart::Part::bytes(bytes::Bytes::from(fixtures::png(10, 10, WHITE)))
                .file_name("photo.png")
                .mime_type("image/png"),
        )
        .add_text("type", "image");
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Missing file, logo, or file type");
    assert!(files_in(&app.media_dir()).is_empty());
}

#[tokio::test]
async fn test_unknown_type_is_rejected() {
    let app = setup_test_app().await;

    let form = process_form(
        ("song.mp3", "audio/mpeg", vec![1, 2, 3]),
        ("logo.png", "image/png", fixtures::png(16, 16, RED)),
        "audio",
    );
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UNSUPPORTED_TYPE");
    assert!(files_in(&app.media_dir()).is_empty());
}

#[tokio::test]
async fn test_mime_mismatch_is_rejected_and_cleaned_up() {
    let app = setup_test_app().await;

    let form = process_form(
        ("clip.mp4", "video/mp4", vec![0u8; 32]),
        ("logo.png", "image/png", fixtures::png(16, 16, RED)),
        "image",
    );
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 400);
    assert!(files_in(&app.media_dir()).is_empty());
    assert!(files_in(&app.logo_dir()).is_empty());
}

#[tokio::test]
async fn test_inputs_removed_after_delivery() {
    let app = setup_test_app().await;

    let form = process_form(
        ("photo.png", "image/png", fixtures::png(50, 50, WHITE)),
        ("logo.png", "image/png", fixtures::png(10, 10, RED)),
        "image",
    );
    let response = app.client().post("/process").multipart(form).await;
    assert_eq!(response.status_code(), 200);

    assert!(wait_until_empty(&app.media_dir(), Duration::from_secs(2)).await);
    assert!(wait_until_empty(&app.logo_dir(), Duration::from_secs(2)).await);
    assert_eq!(files_in(&app.output_dir()).len(), 1);
}

#[tokio::test]
async fn test_inputs_kept_when_cleanup_disabled() {
    let app = setup_test_app_with(&[("CLEANUP_FILES", "false")]).await;

    let form = process_form(
        ("photo.png", "image/png", fixtures::png(50, 50, WHITE)),
        ("logo.png", "image/png", fixtures::png(10, 10, RED)),
        "image",
    );
    let response = app.client().post("/process").multipart(form).await;
    assert_eq!(response.status_code(), 200);

    assert_eq!(files_in(&app.media_dir()).len(), 1);
    assert_eq!(files_in(&app.logo_dir()).len(), 1);
}

#[tokio::test]
async fn test_encrypted_delivery_round_trips() {
    let app = setup_test_app_with(&[("DELIVERY_ENCRYPTION", "true")]).await;

    let form = process_form(
        ("photo.png", "image/png", fixtures::png(64, 48, WHITE)),
        ("logo.png", "image/png", fixtures::png(8, 8, RED)),
        "image",
    );
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "application/octet-stream");
    let key = response.header("x-encryption-key");
    let key = DeliveryKey::from_base64(key.to_str().unwrap()).unwrap();

    let plaintext = SecureDeliveryWrapper::new()
        .decrypt(&key, response.as_bytes())
        .unwrap();
    assert_eq!(fixtures::decode_png(&plaintext).dimensions(), (64, 48));

    let stored = files_in(&app.output_dir());
    assert_eq!(stored.len(), 1);
    assert!(stored[0].to_string_lossy().ends_with(".png.enc"));
    assert_eq!(std::fs::read(&stored[0]).unwrap(), response.as_bytes().to_vec());
}

#[tokio::test]
async fn test_transient_mode_persists_nothing() {
    let app = setup_test_app_with(&[("STORAGE_MODE", "transient")]).await;

    let form = process_form(
        ("photo.png", "image/png", fixtures::png(40, 40, WHITE)),
        ("logo.png", "image/png", fixtures::png(8, 8, RED)),
        "image",
    );
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(fixtures::decode_png(response.as_bytes()).dimensions(), (40, 40));
    assert!(files_in(&app.output_dir()).is_empty());
    assert!(files_in(&app.media_dir()).is_empty());
    assert!(files_in(&app.logo_dir()).is_empty());
}

#[tokio::test]
async fn test_logo_background_applied_before_composition() {
    let app = setup_test_app_with(&[("LOGO_TRANSPARENT_BACKGROUND", "#ffffff")]).await;

    // White logo on a blue asset: the whole logo becomes transparent
    let form = process_form(
        ("photo.png", "image/png", fixtures::png(32, 32, [0, 0, 255, 255])),
        ("logo.png", "image/png", fixtures::png(8, 8, WHITE)),
        "image",
    );
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    let output = fixtures::decode_png(response.as_bytes());
    assert_eq!(output.get_pixel(2, 16), &Rgba([0, 0, 255, 255]));
}

#[tokio::test]
async fn test_response_carries_request_id() {
    let app = setup_test_app().await;

    let form = process_form(
        ("photo.png", "image/png", fixtures::png(20, 20, WHITE)),
        ("logo.png", "image/png", fixtures::png(4, 4, RED)),
        "image",
    );
    let response = app
        .client()
        .post("/process")
        .add_header("X-Request-ID", "req-42")
        .multipart(form)
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("x-request-id"), "req-42");
}

#[tokio::test]
async fn test_file_over_upload_cap_is_413() {
    let app = setup_test_app_with(&[("MAX_UPLOAD_SIZE_MB", "1")]).await;

    let form = process_form(
        ("robot.glb", "model/gltf-binary", vec![7u8; 1024 * 1024 + 512 * 1024]),
        ("logo.png", "image/png", fixtures::png(8, 8, RED)),
        "3d",
    );
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 413);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert!(files_in(&app.media_dir()).is_empty());
    assert!(files_in(&app.output_dir()).is_empty());
}

#[tokio::test]
async fn test_file_at_upload_cap_is_accepted() {
    let app = setup_test_app_with(&[("MAX_UPLOAD_SIZE_MB", "1")]).await;
    let model = vec![7u8; 1024 * 1024];

    let form = process_form(
        ("robot.glb", "model/gltf-binary", model.clone()),
        ("logo.png", "image/png", fixtures::png(8, 8, RED)),
        "3d",
    );
    let response = app.client().post("/process").multipart(form).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.as_bytes().len(), model.len());
}
