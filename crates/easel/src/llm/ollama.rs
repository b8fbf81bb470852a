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

use super::{ModelClient, ModelConfig, ModelError, ModelRequest, ModelResponse, ModelResult, Usage};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    config: ModelConfig,
}

impl OllamaClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn build_payload(&self, request: &ModelRequest) -> Value {
        let mut payload = json!({
            "model": request.model,
            "messages": request.messages.iter().map(|msg| {
                json!({
                    "role": msg.role,
                    "content": msg.content
                })
            }).collect::<Vec<_>>(),
            "stream": false
        });

        if let Some(max_tokens) = self.config.max_tokens {
            payload["options"] = json!({
                "num_predict": max_tokens
            });
        }
        if let Some(temperature) = self.config.temperature {
            if payload["options"].is_null() {
                payload["options"] = json!({});
            }
            payload["options"]["temperature"] = json!(temperature);
        }

        payload
    }

    fn parse_response(&self, data: Value, model: String) -> ModelResult<ModelResponse> {
        let content = data["message"]["content"].as_str().ok_or_else(|| {
            ModelError::Provider("Failed to extract content from Ollama response".to_string())
        })?;

        let prompt_tokens = data["prompt_eval_count"].as_u64().unwrap_or(0) as u32;
        let completion_tokens = data["eval_count"].as_u64().unwrap_or(0) as u32;
        let usage = Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        };

        Ok(ModelResponse {
            content: content.to_string(),
            model,
            usage,
        })
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, request: ModelRequest) -> ModelResult<ModelResponse> {
        let payload = self.build_payload(&request);
        let url = format!("{}/api/chat", self.config.base_url);
        debug!(
            request_id = %request.id,
            model = %request.model,
            "Sending request to Ollama API"
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ModelError::Network(format!("Request failed: {e}")))?;

        let status = response.status();
        info!(request_id = %request.id, %status, "Received response from Ollama API");

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ModelError::Provider(format!(
                "Ollama API error {status}: {error_body}"
            )));
        }

        let data = response.json::<Value>().await.map_err(|e| {
            ModelError::Serialisation(format!("Failed to parse JSON response: {e}"))
        })?;
        self.parse_response(data, request.model)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    async fn health_check(&self) -> ModelResult<()> {
        let url = format!("{}/api/tags", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ModelError::Network(format!("Failed to connect to Ollama: {e}")))?;

        if !response.status().is_success() {
            return Err(ModelError::Provider(format!(
                "Ollama health check failed: {}",
                response.status()
            )));
        }

        let models_data: Value = response.json().await.map_err(|e| {
            ModelError::Serialisation(format!("Failed to parse models response: {e}"))
        })?;

        match models_data["models"].as_array() {
            Some(models) if models.is_empty() => {
                warn!("Ollama is running but no models are available");
                Err(ModelError::Provider(
                    "No models available in Ollama".to_string(),
                ))
            }
            Some(models) => {
                info!("Ollama connected with {} models available", models.len());
                Ok(())
            }
            None => Err(ModelError::Provider(
                "Invalid response format from Ollama /api/tags".to_string(),
            )),
        }
    }
}
