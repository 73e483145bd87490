mod common;

use common::{command_generator, test_config, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn chat_returns_generated_response() {
    let app = TestApp::spawn().await;

    let response = app
        .post_chat(&json!({ "message": "How do I prepare for a cyclone?" }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["response"]
        .as_str()
        .expect("response string")
        .contains("Secure loose outdoor objects"));
}

#[cfg(unix)]
#[tokio::test]
async fn chat_prompt_reaches_generator() {
    // `cat` echoes the prompt back as the answer.
    let app = TestApp::spawn_with(test_config(command_generator("cat", &[]), None)).await;

    let response = app.post_chat(&json!({ "message": "Is hail dangerous?" })).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    let text = body["response"].as_str().unwrap();
    assert!(text.starts_with("User Question about weather safety: Is hail dangerous?"));
    assert!(text.ends_with("Keep the response concise and practical."));
}

#[tokio::test]
async fn missing_message_is_rejected() {
    let app = TestApp::spawn().await;

    for body in [json!({}), json!({ "message": "" }), json!({ "message": 7 })] {
        let response = app.post_chat(&body).await;
        assert_eq!(response.status().as_u16(), 400, "body: {}", body);

        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["error"], "No message provided");
    }
}

#[tokio::test]
async fn generator_failure_returns_server_error() {
    let app = TestApp::spawn_with(test_config(
        command_generator("weather-service-no-such-generator", &[]),
        None,
    ))
    .await;

    let response = app.post_chat(&json!({ "message": "Flood tips?" })).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.get("error").is_some());
}
