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
use polars::prelude::*;
use tracing::debug;

pub const UNAVAILABLE: &str = "N/A";

type KpiHandler = fn(&DataFrame) -> Option<String>;

struct KpiRule {
    triggers: &'static [&'static str],
    handler: KpiHandler,
}

// Evaluated top to bottom, first match wins; the default rule is the
// UNAVAILABLE return below the loop.
const KPI_RULES: &[KpiRule] = &[
    KpiRule {
        triggers: &["revenue", "sales"],
        handler: revenue_total,
    },
    KpiRule {
        triggers: &["average", "order value"],
        handler: unimplemented_kpi,
    },
    KpiRule {
        triggers: &["conversion", "retention", "rate"],
        handler: unimplemented_kpi,
    },
];

pub fn resolve_kpi(name: &str, df: &DataFrame) -> String {
    let needle = name.to_lowercase();
    for rule in KPI_RULES {
        if rule.triggers.iter().any(|trigger| needle.contains(trigger)) {
            return (rule.handler)(df).unwrap_or_else(|| UNAVAILABLE.to_string());
        }
    }
    UNAVAILABLE.to_string()
}

const REVENUE_COLUMN_HINTS: &[&str] = &["revenue", "sales", "amount"];

fn revenue_total(df: &DataFrame) -> Option<String> {
    for name in data_profiler::numeric_columns(df) {
        let lowered = name.to_lowercase();
        if REVENUE_COLUMN_HINTS.iter().any(|hint| lowered.contains(hint)) {
            let total = column_sum(df, &name)?;
            debug!(column = %name, total, "Resolved revenue KPI");
            return Some(format_grouped(total));
        }
    }
    None
}

fn unimplemented_kpi(_df: &DataFrame) -> Option<String> {
    None
}

fn column_sum(df: &DataFrame, name: &str) -> Option<f64> {
    let series = df
        .get_columns()
        .iter()
        .find(|column| column.name().as_str() == name)?
        .as_series()?;
    let values = series.cast(&DataType::Float64).ok()?;
    Some(values.f64().ok()?.into_iter().flatten().sum())
}

pub fn format_grouped(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
