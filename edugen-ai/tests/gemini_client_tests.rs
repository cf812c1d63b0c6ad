//! Gemini and YouTube clients against a mock HTTP server

use base64::Engine as _;
use edugen_ai::credential::Credential;
use edugen_ai::enrich::{SearchBackend, YouTubeSearchClient};
use edugen_ai::model::{
    BackendError, GeminiClient, GeminiConfig, GenerateRequest, ModelBackend, OperationBackend,
    RawOutput, SpeechRequest, VideoRequest,
};
use edugen_ai::operation::OperationStatus;
use edugen_ai::schema::{ObjectSchema, Schema};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-key";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(GeminiConfig {
        base_url: server.uri(),
        text_model: "gemini-test".into(),
        speech_model: "gemini-tts-test".into(),
        video_model: "veo-test".into(),
        voice: "Algenib".into(),
        http_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn quiz_request() -> GenerateRequest {
    GenerateRequest {
        task: "generateQuiz".into(),
        prompt: "Write a quiz about cells".into(),
        output: ObjectSchema::new()
            .required("quiz", Schema::array_of(Schema::String))
            .into(),
    }
}

fn text_response(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn generate_sends_key_and_response_schema() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", KEY))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {"type": "OBJECT", "required": ["quiz"]}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response(r#"{"quiz": ["Q1"]}"#)))
        .expect(1)
        .mount(&server)
        .await;

    let output = client(&server)
        .generate(&quiz_request(), &Credential::new(KEY))
        .await
        .unwrap();

    assert_eq!(output, RawOutput::Text(r#"{"quiz": ["Q1"]}"#.into()));
}

#[tokio::test]
async fn plain_string_output_requests_no_json_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("A short summary.")))
        .mount(&server)
        .await;

    let request = GenerateRequest {
        task: "summarizeVideoDescription".into(),
        prompt: "Summarize".into(),
        output: Schema::String,
    };
    let output = client(&server).generate(&request, &Credential::new(KEY)).await.unwrap();
    assert_eq!(output, RawOutput::Text("A short summary.".into()));

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(body.get("generationConfig").is_none());
}

#[tokio::test]
async fn http_failures_are_classified() {
    let cases = [
        (503, json!({"error": {"code": 503, "message": "The model is overloaded."}}), "unavailable"),
        (429, json!({"error": {"code": 429, "message": "Resource exhausted"}}), "unavailable"),
        (400, json!({"error": {"code": 400, "message": "API key not valid. Please pass a valid API key."}}), "unauthorized"),
        (400, json!({"error": {"code": 400, "message": "Invalid JSON payload received."}}), "rejected"),
    ];

    for (status, body, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;

        let err = client(&server)
            .generate(&quiz_request(), &Credential::new(KEY))
            .await
            .unwrap_err();

        let actual = match err {
            BackendError::Unavailable(_) => "unavailable",
            BackendError::Unauthorized(_) => "unauthorized",
            BackendError::Rejected(_) => "rejected",
            BackendError::Malformed(_) => "malformed",
        };
        assert_eq!(actual, expected, "HTTP {}", status);
    }
}

#[tokio::test]
async fn safety_block_is_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .generate(&quiz_request(), &Credential::new(KEY))
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Rejected(ref msg) if msg.contains("SAFETY")), "{:?}", err);
}

#[tokio::test]
async fn speech_returns_decoded_pcm_and_mime_type() {
    let pcm = vec![1u8, 0, 2, 0, 3, 0];
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-tts-test:generateContent"))
        .and(body_partial_json(json!({
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {"voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Algenib"}}}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {
                "mimeType": "audio/L16;codec=pcm;rate=24000",
                "data": base64::engine::general_purpose::STANDARD.encode(&pcm)
            }}]}}]
        })))
        .mount(&server)
        .await;

    let speech = client(&server)
        .synthesize_speech(&SpeechRequest { text: "Hello".into() }, &Credential::new(KEY))
        .await
        .unwrap();

    assert_eq!(speech.pcm, pcm);
    assert_eq!(speech.mime_type, "audio/L16;codec=pcm;rate=24000");
}

#[tokio::test]
async fn video_operation_lifecycle() {
    let server = MockServer::start().await;
    let op_name = "models/veo-test/operations/op1";
    let clip_uri = format!("{}/files/clip", server.uri());

    Mock::given(method("POST"))
        .and(path("/v1beta/models/veo-test:predictLongRunning"))
        .and(body_partial_json(json!({"parameters": {"durationSeconds": 5, "aspectRatio": "16:9"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": op_name})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1beta/{}", op_name)))
        .and(header("x-goog-api-key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": op_name,
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [
                {"video": {"uri": clip_uri}}
            ]}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/clip"))
        .and(header("x-goog-api-key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
        .mount(&server)
        .await;

    let gemini = client(&server);
    let key = Credential::new(KEY);

    let submitted = gemini
        .submit_video(&VideoRequest::short_clip("a cell dividing"), &key)
        .await
        .unwrap();
    assert_eq!(submitted.id, op_name);
    assert_eq!(submitted.status, OperationStatus::Pending);

    let checked = gemini.check_operation(&submitted.id, &key).await.unwrap();
    let OperationStatus::Done(artifacts) = checked.status else {
        panic!("expected done, got {:?}", checked.status);
    };
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].content_type, "video/mp4");

    let bytes = gemini.fetch_media(&artifacts[0], &key).await.unwrap();
    assert_eq!(bytes, b"mp4-bytes");
}

#[tokio::test]
async fn operation_error_becomes_failed_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/operations/op2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op2",
            "done": true,
            "error": {"code": 8, "message": "quota exceeded"}
        })))
        .mount(&server)
        .await;

    let handle = client(&server)
        .check_operation("operations/op2", &Credential::new(KEY))
        .await
        .unwrap();

    assert_eq!(handle.status, OperationStatus::Failed("quota exceeded".into()));
}

// ============================================================================
// Video search
// ============================================================================

#[tokio::test]
async fn search_maps_items_and_drops_non_videos() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/search"))
        .and(query_param("q", "cells tutorial full course"))
        .and(query_param("type", "video"))
        .and(query_param("part", "snippet"))
        .and(query_param("maxResults", "6"))
        .and(query_param("key", "yt-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": {"kind": "youtube#video", "videoId": "abc123"},
                    "snippet": {
                        "title": "Cells 101",
                        "description": "Everything about cells.",
                        "channelTitle": "Bio Academy",
                        "thumbnails": {
                            "default": {"url": "https://img/default.jpg"},
                            "high": {"url": "https://img/high.jpg"}
                        }
                    }
                },
                {
                    "id": {"kind": "youtube#channel", "channelId": "UC1"},
                    "snippet": {"title": "A channel"}
                }
            ]
        })))
        .mount(&server)
        .await;

    let search = YouTubeSearchClient::new(server.uri(), Some("yt-key".into())).unwrap();
    let results = search.search("cells tutorial full course", 6).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "abc123");
    assert_eq!(results[0].channel_title, "Bio Academy");
    assert_eq!(results[0].thumbnail, "https://img/high.jpg");
}

#[tokio::test]
async fn search_without_key_makes_no_request() {
    let server = MockServer::start().await;
    let search = YouTubeSearchClient::new(server.uri(), None).unwrap();

    let err = search.search("cells", 6).await.unwrap_err();

    assert!(matches!(err, BackendError::Unauthorized(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn search_forbidden_is_reported_as_refused_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "quotaExceeded"}
        })))
        .mount(&server)
        .await;

    let search = YouTubeSearchClient::new(server.uri(), Some("yt-key".into())).unwrap();
    let err = search.search("cells", 6).await.unwrap_err();

    assert!(matches!(err, BackendError::Unauthorized(ref msg) if msg.contains("quotaExceeded")));
}
