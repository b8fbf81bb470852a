// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use easel::{ModelClient, ModelConfig, ModelError, ModelRequest, OllamaClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OllamaClient {
    OllamaClient::new(ModelConfig {
        base_url: server.uri(),
        model: "gemma3:4b".to_string(),
        ..Default::default()
    })
}

#[tokio::test]
async fn generate_extracts_content_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"model": "gemma3:4b", "stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant", "content": "{\"domain\":\"Retail\"}"},
            "done": true,
            "prompt_eval_count": 12,
            "eval_count": 34
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .generate(ModelRequest::single_user("gemma3:4b", "analyse this"))
        .await
        .unwrap();

    assert_eq!(response.content, "{\"domain\":\"Retail\"}");
    assert_eq!(response.model, "gemma3:4b");
    assert_eq!(response.usage.prompt_tokens, 12);
    assert_eq!(response.usage.completion_tokens, 34);
    assert_eq!(response.usage.total_tokens, 46);
}

#[tokio::test]
async fn server_errors_surface_as_provider_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .generate(ModelRequest::single_user("gemma3:4b", "analyse this"))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Provider(_)));
}

#[tokio::test]
async fn malformed_body_is_a_serialisation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .generate(ModelRequest::single_user("gemma3:4b", "analyse this"))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Serialisation(_)));
}

#[tokio::test]
async fn health_check_passes_when_models_are_available() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"name": "gemma3:4b"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.health_check().await.unwrap();
}

#[tokio::test]
async fn health_check_fails_without_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.health_check().await.unwrap_err();
    assert!(matches!(err, ModelError::Provider(_)));
}
