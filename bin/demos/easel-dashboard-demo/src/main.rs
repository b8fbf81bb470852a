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

use anyhow::Context;
use clap::Parser;
use easel::data_profiler;
use easel::{
    ChartKind, DashboardEngine, DashboardSink, EngineConfig, ModelClient, ModelConfig,
    OllamaClient, RenderedChart,
};
use polars::prelude::*;
use std::fs::File;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "easel-dashboard-demo",
    about = "Generate an AI business dashboard from a CSV file"
)]
struct Args {
    csv: PathBuf,

    #[arg(long, default_value = "gemma3:4b")]
    model: String,

    #[arg(long, default_value = "http://localhost:11434")]
    base_url: String,

    #[arg(long, default_value_t = 5)]
    preview_rows: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();
    dotenvy::dotenv().ok();

    let args = Args::parse();
    info!("Starting easel dashboard demo");

    let file = File::open(&args.csv)
        .with_context(|| format!("Failed to open {}", args.csv.display()))?;
    let df = CsvReader::new(file)
        .finish()
        .context("Failed to parse CSV file")?;

    let mut sink = TerminalSink::new(args.preview_rows);

    println!("Data preview");
    println!("============");
    sink.show_preview(&df);

    let profile = data_profiler::profile_dataframe(&df);
    println!("\nDataset summary");
    println!("===============");
    println!("{}", serde_json::to_string_pretty(&profile)?);

    let client = OllamaClient::new(ModelConfig {
        base_url: args.base_url,
        model: args.model,
        ..Default::default()
    });
    if let Err(e) = client.health_check().await {
        warn!(error = %e, "Ollama health check failed, dashboard will degrade to fallbacks");
    }

    let engine = DashboardEngine::with_config(client, EngineConfig::default());
    info!(model = engine.client().model_id(), "Generating dashboard");
    let outcome = engine.generate(&df, &mut sink).await?;

    info!(
        domain = %outcome.domain,
        kpis_resolved = outcome.kpis_resolved,
        charts = outcome.charts_rendered,
        "Dashboard complete"
    );
    Ok(())
}

const BAR_WIDTH: usize = 40;

#[derive(Default)]
struct TerminalSink {
    preview_rows: usize,
    metrics_started: bool,
    charts_started: bool,
    insights_started: bool,
}

impl TerminalSink {
    fn new(preview_rows: usize) -> Self {
        Self {
            preview_rows,
            ..Default::default()
        }
    }

    fn section(started: &mut bool, title: &str) {
        if !*started {
            println!("\n{title}");
            println!("{}", "=".repeat(title.len()));
            *started = true;
        }
    }

    fn print_grouped(series: &easel::GroupedSeries) {
        println!(
            "\n[{}] {} by {}",
            series.kind.as_str(),
            series.y,
            series.x
        );
        let label_width = series
            .points
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0);
        let max_value = series
            .points
            .iter()
            .map(|(_, value)| value.abs())
            .fold(0.0_f64, f64::max);
        for (label, value) in &series.points {
            match series.kind {
                ChartKind::Bar => {
                    let width = if max_value > 0.0 {
                        ((value.abs() / max_value) * BAR_WIDTH as f64).round() as usize
                    } else {
                        0
                    };
                    let bar = "#".repeat(width);
                    println!("  {label:<label_width$} | {bar} {value}");
                }
                ChartKind::Line => {
                    println!("  {label:<label_width$} -> {value}");
                }
            }
        }
    }

    fn print_indexed(series: &easel::IndexedSeries) {
        println!("\n[line] {} over row index", series.columns.join(", "));
        for (name, values) in series.columns.iter().zip(series.values.iter()) {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            let min = present.iter().copied().fold(f64::INFINITY, f64::min);
            let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if present.is_empty() {
                println!("  {name}: no numeric values");
            } else {
                println!("  {name}: {} points, min {min}, max {max}", values.len());
            }
        }
    }
}

impl DashboardSink for TerminalSink {
    fn show_preview(&mut self, df: &DataFrame) {
        let head = df.head(Some(self.preview_rows));
        let mut table: Vec<(String, Vec<String>)> = Vec::with_capacity(head.width());
        for column in head.get_columns() {
            let name = column.name().to_string();
            let cells: Vec<String> = match column
                .as_series()
                .and_then(|series| series.cast(&DataType::String).ok())
            {
                Some(strings) => match strings.str() {
                    Ok(chunked) => chunked
                        .into_iter()
                        .map(|cell| cell.unwrap_or("null").to_string())
                        .collect(),
                    Err(_) => vec!["?".to_string(); head.height()],
                },
                None => vec!["?".to_string(); head.height()],
            };
            table.push((name, cells));
        }

        let widths: Vec<usize> = table
            .iter()
            .map(|(name, cells)| {
                cells
                    .iter()
                    .map(String::len)
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = table
            .iter()
            .zip(&widths)
            .map(|((name, _), &width)| format!("{name:<width$}"))
            .collect();
        println!("  {}", header.join("  "));
        for row in 0..head.height() {
            let cells: Vec<String> = table
                .iter()
                .zip(&widths)
                .map(|((_, cells), &width)| format!("{:<width$}", cells[row]))
                .collect();
            println!("  {}", cells.join("  "));
        }
    }

    fn show_domain(&mut self, domain: &str) {
        println!("\nBusiness domain");
        println!("===============");
        println!("  {domain}");
    }

    fn show_metric(&mut self, name: &str, value: &str) {
        Self::section(&mut self.metrics_started, "Key business KPIs");
        println!("  {name:<40} {value}");
    }

    fn show_chart(&mut self, chart: &RenderedChart) {
        Self::section(&mut self.charts_started, "Dashboard visuals");
        match chart {
            RenderedChart::Grouped(series) => Self::print_grouped(series),
            RenderedChart::Indexed(series) => Self::print_indexed(series),
        }
    }

    fn show_insight(&mut self, insight: &str) {
        Self::section(&mut self.insights_started, "Business insights");
        println!("  - {insight}");
    }
}
