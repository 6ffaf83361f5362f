use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    BoxError, Json, Router,
};
use chaplin::adapters::ffmpeg_clips::{
    ensure_ffmpeg_version, FfmpegClipExtractor, MIN_FFMPEG_VERSION,
};
use chaplin::adapters::inference::{HttpAudioTagger, HttpFrameTagger};
use chaplin::{Config, ProcessReport, ProcessService};
use ffmpeg_next as ffmpeg;
use futures::{Stream, TryStreamExt};
use serde_json::{json, Value};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::{fs::File, io::BufWriter};
use tokio_util::io::StreamReader;
use tracing::info;

type Service = ProcessService<FfmpegClipExtractor, HttpFrameTagger, HttpAudioTagger>;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    tracing_subscriber::fmt::init();

    // Process-wide init; the adapters below are built once and shared
    // read-only across requests.
    ffmpeg::init().expect("failed to initialize ffmpeg");
    ensure_ffmpeg_version(MIN_FFMPEG_VERSION).expect("ffmpeg version check failed");

    let service = Arc::new(ProcessService::new(
        FfmpegClipExtractor,
        HttpFrameTagger::new(config.caption_endpoint.clone()),
        HttpAudioTagger::new(config.audio_tag_endpoint.clone()),
        config.audio_window_secs,
    ));

    let app = Router::new()
        .route("/process", post(process_video))
        .layer(DefaultBodyLimit::disable())
        .with_state(service);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    info!("Listening at {}:{}", config.addr, config.port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}

// Handler that accepts a multipart upload, runs the pipeline on the `video`
// field and answers with the merged per-segment results.
async fn process_video(
    State(service): State<Arc<Service>>,
    mut multipart: Multipart,
) -> Result<Json<ProcessReport>, (StatusCode, Json<Value>)> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("video") {
            continue;
        }

        let video_file = tempfile::Builder::new()
            .suffix(".mp4")
            .tempfile()
            .map_err(|e| internal(format!("failed to create temp file: {}", e)))?;
        stream_to_file(video_file.path(), field).await?;

        let report = service
            .process(video_file.path())
            .await
            .map_err(|e| internal(e.to_string()))?;

        // The uploaded temp video is removed when `video_file` drops, on the
        // error paths above as well.
        return Ok(Json(report));
    }

    Err((
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "no video provided" })),
    ))
}

fn internal(reason: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": reason })),
    )
}

// Save a `Stream` to a file
async fn stream_to_file<S, E>(path: &Path, stream: S) -> Result<(), (StatusCode, Json<Value>)>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    async {
        let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
        let body_reader = StreamReader::new(body_with_io_error);
        futures::pin_mut!(body_reader);

        let mut file = BufWriter::new(File::create(path).await?);
        tokio::io::copy(&mut body_reader, &mut file).await?;

        Ok::<_, io::Error>(())
    }
    .await
    .map_err(|err| internal(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_stream_to_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("upload.mp4");

        type E = std::io::Error;

        let test_data = "not really a video";
        let mock_stream = stream::iter(vec![Ok::<bytes::Bytes, E>(Bytes::from(test_data))]);

        let result = stream_to_file(&file_path, mock_stream).await;
        assert!(result.is_ok());

        let file_contents = fs::read_to_string(file_path).unwrap();
        assert_eq!(file_contents, test_data);
    }

    #[tokio::test]
    async fn test_stream_to_file_error() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("upload.mp4");

        let mock_stream = stream::iter(vec![Err("Test error")]);

        let result = stream_to_file(&file_path, mock_stream).await;
        let (status, body) = result.unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.0, json!({ "error": "Test error" }));
    }
}
