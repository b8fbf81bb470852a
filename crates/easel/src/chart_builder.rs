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

use crate::data_profiler;
use crate::error::{DataError, Result};
use crate::plan_recovery::ChartSpec;
use crate::sink::DashboardSink;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
}

impl ChartKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "bar" => Some(ChartKind::Bar),
            "line" => Some(ChartKind::Line),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedSeries {
    pub kind: ChartKind,
    pub x: String,
    pub y: String,
    pub points: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedSeries {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedChart {
    Grouped(GroupedSeries),
    Indexed(IndexedSeries),
}

pub fn render_planned_charts(
    specs: &[ChartSpec],
    df: &DataFrame,
    sink: &mut dyn DashboardSink,
) -> Result<usize> {
    let mut rendered = 0;
    for spec in specs {
        let Some(kind) = ChartKind::parse(&spec.chart_type) else {
            debug!(chart_type = %spec.chart_type, "Skipping chart with unknown type");
            continue;
        };
        if !has_column(df, &spec.x) || !has_column(df, &spec.y) {
            debug!(x = %spec.x, y = %spec.y, "Skipping chart referencing unknown columns");
            continue;
        }
        let points = group_sum(df, &spec.x, &spec.y)?;
        sink.show_chart(&RenderedChart::Grouped(GroupedSeries {
            kind,
            x: spec.x.clone(),
            y: spec.y.clone(),
            points,
        }));
        rendered += 1;
    }
    Ok(rendered)
}

pub fn apply_fallback_charts(
    rendered: usize,
    df: &DataFrame,
    sink: &mut dyn DashboardSink,
    min_charts: usize,
) -> Result<usize> {
    if rendered >= min_charts {
        return Ok(rendered);
    }
    info!(
        rendered,
        min_charts, "Planned charts below minimum, emitting fallback charts"
    );

    let mut total = rendered;
    let categorical = data_profiler::categorical_columns(df);
    let numeric = data_profiler::numeric_columns(df);

    if let (Some(category), Some(measure)) = (categorical.first(), numeric.first()) {
        let points = group_sum(df, category, measure)?;
        sink.show_chart(&RenderedChart::Grouped(GroupedSeries {
            kind: ChartKind::Bar,
            x: category.clone(),
            y: measure.clone(),
            points,
        }));
        total += 1;
    }

    if numeric.len() > 1 {
        sink.show_chart(&RenderedChart::Indexed(indexed_series(df, &numeric)?));
        total += 1;
    }

    Ok(total)
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_columns()
        .iter()
        .any(|column| column.name().as_str() == name)
}

fn column_by_name<'a>(df: &'a DataFrame, name: &str) -> std::result::Result<&'a Series, DataError> {
    df.get_columns()
        .iter()
        .find(|column| column.name().as_str() == name)
        .and_then(|column| column.as_series())
        .ok_or_else(|| DataError::ColumnNotFound {
            column: name.to_string(),
        })
}

// Null group keys are dropped, null measures contribute nothing, and
// keys come back sorted ascending.
fn group_sum(df: &DataFrame, x: &str, y: &str) -> Result<Vec<(String, f64)>> {
    let keys = column_by_name(df, x)?.cast(&DataType::String)?;
    let values = column_by_name(df, y)?.cast(&DataType::Float64)?;
    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for (key, value) in keys.str()?.into_iter().zip(values.f64()?.into_iter()) {
        if let Some(key) = key {
            *groups.entry(key.to_string()).or_insert(0.0) += value.unwrap_or(0.0);
        }
    }
    Ok(groups.into_iter().collect())
}

fn indexed_series(df: &DataFrame, columns: &[String]) -> Result<IndexedSeries> {
    let mut values = Vec::with_capacity(columns.len());
    for name in columns {
        let series = column_by_name(df, name)?.cast(&DataType::Float64)?;
        values.push(series.f64()?.into_iter().collect());
    }
    Ok(IndexedSeries {
        columns: columns.to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[derive(Default)]
    struct RecordingSink {
        charts: Vec<RenderedChart>,
    }

    impl DashboardSink for RecordingSink {
        fn show_preview(&mut self, _df: &DataFrame) {}
        fn show_domain(&mut self, _domain: &str) {}
        fn show_metric(&mut self, _name: &str, _value: &str) {}
        fn show_chart(&mut self, chart: &RenderedChart) {
            self.charts.push(chart.clone());
        }
        fn show_insight(&mut self, _insight: &str) {}
    }

    fn spec(chart_type: &str, x: &str, y: &str) -> ChartSpec {
        ChartSpec {
            chart_type: chart_type.to_string(),
            x: x.to_string(),
            y: y.to_string(),
        }
    }

    fn region_sales() -> DataFrame {
        df!(
            "Region" => ["North", "South", "North"],
            "Sales" => [100i64, 200, 300]
        )
        .unwrap()
    }

    #[test]
    fn specs_with_unknown_columns_are_skipped_without_error() {
        let df = region_sales();
        let specs = vec![spec("bar", "Region", "Sales"), spec("bar", "NoSuchCol", "Sales")];
        let mut sink = RecordingSink::default();
        let rendered = render_planned_charts(&specs, &df, &mut sink).unwrap();
        assert_eq!(rendered, 1);
        assert_eq!(sink.charts.len(), 1);
    }

    #[test]
    fn unknown_chart_types_are_skipped() {
        let df = region_sales();
        let specs = vec![spec("pie", "Region", "Sales"), spec("line", "Region", "Sales")];
        let mut sink = RecordingSink::default();
        let rendered = render_planned_charts(&specs, &df, &mut sink).unwrap();
        assert_eq!(rendered, 1);
        match &sink.charts[0] {
            RenderedChart::Grouped(series) => assert_eq!(series.kind, ChartKind::Line),
            RenderedChart::Indexed(_) => panic!("expected a grouped series"),
        }
    }

    #[test]
    fn groups_are_summed_and_sorted_by_key() {
        let df = region_sales();
        let mut sink = RecordingSink::default();
        render_planned_charts(&[spec("bar", "Region", "Sales")], &df, &mut sink).unwrap();
        match &sink.charts[0] {
            RenderedChart::Grouped(series) => {
                assert_eq!(
                    series.points,
                    vec![("North".to_string(), 400.0), ("South".to_string(), 200.0)]
                );
            }
            RenderedChart::Indexed(_) => panic!("expected a grouped series"),
        }
    }

    #[test]
    fn null_group_keys_are_dropped() {
        let df = df!(
            "Region" => [Some("North"), None, Some("North")],
            "Sales" => [100i64, 200, 300]
        )
        .unwrap();
        let mut sink = RecordingSink::default();
        render_planned_charts(&[spec("bar", "Region", "Sales")], &df, &mut sink).unwrap();
        match &sink.charts[0] {
            RenderedChart::Grouped(series) => {
                assert_eq!(series.points, vec![("North".to_string(), 400.0)]);
            }
            RenderedChart::Indexed(_) => panic!("expected a grouped series"),
        }
    }

    #[test]
    fn fallback_emits_only_the_bar_chart_without_a_second_numeric_column() {
        let df = region_sales();
        let mut sink = RecordingSink::default();
        let total = apply_fallback_charts(0, &df, &mut sink, 2).unwrap();
        assert_eq!(total, 1);
        assert_eq!(sink.charts.len(), 1);
        match &sink.charts[0] {
            RenderedChart::Grouped(series) => {
                assert_eq!(series.kind, ChartKind::Bar);
                assert_eq!(series.x, "Region");
                assert_eq!(series.y, "Sales");
            }
            RenderedChart::Indexed(_) => panic!("expected the fallback bar chart"),
        }
    }

    #[test]
    fn fallback_emits_both_charts_when_preconditions_hold() {
        let df = df!(
            "Region" => ["North", "South"],
            "Sales" => [100i64, 200],
            "Units" => [1i64, 2]
        )
        .unwrap();
        let mut sink = RecordingSink::default();
        let total = apply_fallback_charts(1, &df, &mut sink, 2).unwrap();
        assert_eq!(total, 3);
        assert!(matches!(sink.charts[0], RenderedChart::Grouped(_)));
        match &sink.charts[1] {
            RenderedChart::Indexed(series) => {
                assert_eq!(series.columns, vec!["Sales", "Units"]);
                assert_eq!(series.values[0], vec![Some(100.0), Some(200.0)]);
            }
            RenderedChart::Grouped(_) => panic!("expected the fallback line chart"),
        }
    }

    #[test]
    fn fallback_line_chart_alone_when_no_categorical_column_exists() {
        let df = df!(
            "Sales" => [100i64, 200],
            "Units" => [1i64, 2]
        )
        .unwrap();
        let mut sink = RecordingSink::default();
        let total = apply_fallback_charts(0, &df, &mut sink, 2).unwrap();
        assert_eq!(total, 1);
        assert!(matches!(sink.charts[0], RenderedChart::Indexed(_)));
    }

    #[test]
    fn fallback_does_not_fire_at_or_above_the_minimum() {
        let df = region_sales();
        let mut sink = RecordingSink::default();
        let total = apply_fallback_charts(2, &df, &mut sink, 2).unwrap();
        assert_eq!(total, 2);
        assert!(sink.charts.is_empty());
    }
}
