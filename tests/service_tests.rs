//! Service wired from a config file, talking to mock Groq and Tavily servers.

use std::io::Write;
use std::time::Duration;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scout::chat::ChatService;
use scout::config::ScoutConfig;
use scout::stream::StreamEvent;

fn sse(chunks: &[serde_json::Value]) -> ResponseTemplate {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

fn text_chunk(text: &str) -> serde_json::Value {
    json!({ "choices": [{ "index": 0, "delta": { "content": text } }] })
}

fn finish(reason: &str) -> serde_json::Value {
    json!({ "choices": [{ "index": 0, "delta": {}, "finish_reason": reason }] })
}

fn config_file(groq_url: &str, extra: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "groq_api_key = \"gsk-test\"\nbase_url = \"{groq_url}\"\nmax_iterations = 3\n{extra}"
    )
    .unwrap();
    file
}

async fn collect(service: &ChatService, message: &str) -> Vec<StreamEvent> {
    tokio::time::timeout(
        Duration::from_secs(10),
        service.stream_chat(message, None).collect::<Vec<_>>(),
    )
    .await
    .expect("stream should close")
}

#[tokio::test]
async fn configured_service_answers_without_tools() {
    let groq = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "llama-3.1-8b-instant" })))
        .respond_with(sse(&[text_chunk("2+2"), text_chunk(" is 4"), finish("stop")]))
        .expect(1)
        .mount(&groq)
        .await;

    let file = config_file(&groq.uri(), "");
    let config = ScoutConfig::from_file(file.path()).unwrap();
    config.validate().unwrap();
    let service = ChatService::from_config(&config).unwrap();

    let events = collect(&service, "2+2?").await;

    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], StreamEvent::Checkpoint { .. }));
    assert_eq!(
        &events[1..],
        &[
            StreamEvent::Content {
                content: "2+2".into()
            },
            StreamEvent::Content {
                content: " is 4".into()
            },
            StreamEvent::End,
        ]
    );
}

#[tokio::test]
async fn search_without_tavily_key_is_reported_to_the_model() {
    let groq = MockServer::start().await;
    // second step: the request carries the tool error back to the model
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("TAVILY_API_KEY is missing"))
        .respond_with(sse(&[text_chunk("Search is unavailable."), finish("stop")]))
        .expect(1)
        .mount(&groq)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse(&[
            json!({ "choices": [{ "index": 0, "delta": { "tool_calls": [{
                "index": 0, "id": "call_1",
                "function": { "name": "tavily_search_results_json", "arguments": "{\"query\":\"paris\"}" }
            }] } }] }),
            finish("tool_calls"),
        ]))
        .up_to_n_times(1)
        .mount(&groq)
        .await;

    let file = config_file(&groq.uri(), "");
    let config = ScoutConfig::from_file(file.path()).unwrap();
    let service = ChatService::from_config(&config).unwrap();

    let events = collect(&service, "Weather in Paris?").await;

    assert!(!events
        .iter()
        .any(|e| matches!(e, StreamEvent::SearchResults { .. })));
    assert_eq!(
        &events[1..],
        &[
            StreamEvent::Content {
                content: "Search is unavailable.".into()
            },
            StreamEvent::End,
        ]
    );
}

#[tokio::test]
async fn search_results_flow_from_tavily_to_the_stream() {
    let groq = MockServer::start().await;
    let tavily = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "title": "Forecast", "url": "https://weather.example/paris" }]
        })))
        .expect(1)
        .mount(&tavily)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("weather.example"))
        .respond_with(sse(&[text_chunk("Sunny"), finish("stop")]))
        .expect(1)
        .mount(&groq)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse(&[
            json!({ "choices": [{ "index": 0, "delta": { "tool_calls": [{
                "index": 0, "id": "call_1",
                "function": { "name": "tavily_search_results_json", "arguments": "{\"query\":\"paris\"}" }
            }] } }] }),
            finish("tool_calls"),
        ]))
        .up_to_n_times(1)
        .mount(&groq)
        .await;

    let file = config_file(
        &groq.uri(),
        &format!("tavily_api_key = \"tvly-test\"\ntavily_base_url = \"{}\"\n", tavily.uri()),
    );
    let config = ScoutConfig::from_file(file.path()).unwrap();
    let service = ChatService::from_config(&config).unwrap();

    let events = collect(&service, "Weather in Paris?").await;

    assert_eq!(
        &events[1..],
        &[
            StreamEvent::SearchResults {
                urls: vec!["https://weather.example/paris".into()]
            },
            StreamEvent::Content {
                content: "Sunny".into()
            },
            StreamEvent::End,
        ]
    );
}

#[tokio::test]
async fn rate_limited_model_call_is_retried_after_the_header_wait() {
    let groq = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_string("rate limited"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&groq)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse(&[text_chunk("4"), finish("stop")]))
        .expect(1)
        .mount(&groq)
        .await;

    let file = config_file(&groq.uri(), "");
    let config = ScoutConfig::from_file(file.path()).unwrap();
    let service = ChatService::from_config(&config).unwrap();

    let events = collect(&service, "2+2?").await;

    assert_eq!(
        &events[1..],
        &[
            StreamEvent::Content {
                content: "4".into()
            },
            StreamEvent::End,
        ]
    );
}
