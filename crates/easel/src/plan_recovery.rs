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

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub const FALLBACK_INSIGHT: &str =
    "AI could not generate structured output. Showing default dashboard.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub x: String,
    pub y: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisPlan {
    pub domain: String,
    pub kpis: Vec<String>,
    pub charts: Vec<ChartSpec>,
    pub insights: Vec<String>,
}

fn string_field(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or("").to_string()
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value[key]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

impl ChartSpec {
    pub fn from_value(value: &Value) -> Self {
        Self {
            chart_type: string_field(value, "type"),
            x: string_field(value, "x"),
            y: string_field(value, "y"),
        }
    }
}

impl AnalysisPlan {
    pub fn from_value(value: &Value) -> Self {
        Self {
            domain: string_field(value, "domain"),
            kpis: string_list(value, "kpis"),
            charts: value["charts"]
                .as_array()
                .map(|items| items.iter().map(ChartSpec::from_value).collect())
                .unwrap_or_default(),
            insights: string_list(value, "insights"),
        }
    }

    pub fn fallback() -> Self {
        Self {
            domain: "Unknown".to_string(),
            kpis: Vec::new(),
            charts: Vec::new(),
            insights: vec![FALLBACK_INSIGHT.to_string()],
        }
    }
}

pub fn recover_json(raw: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        debug!("Model response is empty or whitespace-only");
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        debug!("Parsed entire model response as JSON");
        return Some(value);
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(value) => {
            debug!("Recovered JSON object from brace-delimited span");
            Some(value)
        }
        Err(e) => {
            warn!("Brace-delimited span failed to parse as JSON: {e}");
            None
        }
    }
}
