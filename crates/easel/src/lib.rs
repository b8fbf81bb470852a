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

pub mod chart_builder;
pub mod data_profiler;
pub mod error;
pub mod kpi_resolver;
pub mod llm;
pub mod plan_recovery;
pub mod prompt;
pub mod sink;

pub use chart_builder::{ChartKind, GroupedSeries, IndexedSeries, RenderedChart};
pub use data_profiler::{ColumnKind, ColumnProfile, DatasetProfile};
pub use error::{DashboardError, DataError, Result};
pub use llm::ollama::OllamaClient;
pub use llm::{
    Message, ModelClient, ModelConfig, ModelError, ModelRequest, ModelResponse, ModelResult, Usage,
};
pub use plan_recovery::{recover_json, AnalysisPlan, ChartSpec, FALLBACK_INSIGHT};
pub use sink::DashboardSink;

use polars::prelude::DataFrame;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub sample_rows: usize,
    pub min_charts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rows: 5,
            min_charts: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOutcome {
    pub domain: String,
    pub plan_recovered: bool,
    pub kpis_resolved: usize,
    pub charts_rendered: usize,
}

pub struct DashboardEngine<C: ModelClient> {
    client: C,
    config: EngineConfig,
}

impl<C: ModelClient> DashboardEngine<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(client: C, config: EngineConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn generate(
        &self,
        df: &DataFrame,
        sink: &mut dyn DashboardSink,
    ) -> Result<DashboardOutcome> {
        let profile = data_profiler::profile_dataframe(df);
        info!(%profile, "Analysing dataset");

        let sample = data_profiler::sample_rows(df, self.config.sample_rows)?;
        let prompt = prompt::build_analysis_prompt(&profile, &sample)?;
        let request = ModelRequest::single_user(self.client.model_id(), prompt);

        let raw = match self.client.generate(request).await {
            Ok(response) => {
                info!(
                    model = %response.model,
                    tokens = response.usage.total_tokens,
                    "Model response received"
                );
                response.content
            }
            Err(e) => {
                warn!(error = %e, provider = self.client.provider_name(), "Model call failed, continuing with empty response");
                String::new()
            }
        };

        let (plan, plan_recovered) = match plan_recovery::recover_json(&raw) {
            Some(value) => (AnalysisPlan::from_value(&value), true),
            None => {
                warn!("Structured output recovery failed, using the fallback plan");
                (AnalysisPlan::fallback(), false)
            }
        };

        sink.show_domain(&plan.domain);

        let mut kpis_resolved = 0;
        for kpi in &plan.kpis {
            let value = kpi_resolver::resolve_kpi(kpi, df);
            if value != kpi_resolver::UNAVAILABLE {
                kpis_resolved += 1;
            }
            sink.show_metric(kpi, &value);
        }

        let rendered = chart_builder::render_planned_charts(&plan.charts, df, sink)?;
        let charts_rendered =
            chart_builder::apply_fallback_charts(rendered, df, sink, self.config.min_charts)?;

        for insight in &plan.insights {
            sink.show_insight(insight);
        }

        info!(
            domain = %plan.domain,
            plan_recovered,
            kpis_resolved,
            charts_rendered,
            "Dashboard generated"
        );
        Ok(DashboardOutcome {
            domain: plan.domain,
            plan_recovered,
            kpis_resolved,
            charts_rendered,
        })
    }
}
