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

use crate::error::DataResult;
use indexmap::IndexMap;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Numeric)
    }
    pub fn is_categorical(&self) -> bool {
        matches!(self, ColumnKind::Categorical)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub missing: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub columns: Vec<String>,
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub missing: IndexMap<String, usize>,
}

impl DatasetProfile {
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns.is_empty()
    }

    pub fn total_missing(&self) -> usize {
        self.missing.values().sum()
    }
}

impl fmt::Display for DatasetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rows, {} columns ({} numeric, {} categorical)",
            self.rows,
            self.columns.len(),
            self.numeric.len(),
            self.categorical.len()
        )
    }
}

pub fn classify_dtype(dtype: &DataType) -> ColumnKind {
    if matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    ) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

pub fn profile_dataframe(df: &DataFrame) -> DatasetProfile {
    let rows = df.height();
    let column_profiles: Vec<ColumnProfile> = df
        .get_columns()
        .par_iter()
        .map(|column| {
            let series = column.as_series().expect("Column should contain a series");
            ColumnProfile {
                name: series.name().to_string(),
                kind: classify_dtype(series.dtype()),
                missing: series.null_count(),
            }
        })
        .collect();

    let mut profile = DatasetProfile {
        rows,
        columns: Vec::with_capacity(column_profiles.len()),
        numeric: Vec::new(),
        categorical: Vec::new(),
        missing: IndexMap::with_capacity(column_profiles.len()),
    };
    for column in column_profiles {
        profile.columns.push(column.name.clone());
        match column.kind {
            ColumnKind::Numeric => profile.numeric.push(column.name.clone()),
            ColumnKind::Categorical => profile.categorical.push(column.name.clone()),
        }
        profile.missing.insert(column.name, column.missing);
    }
    debug!(
        rows = profile.rows,
        columns = profile.columns.len(),
        numeric = profile.numeric.len(),
        categorical = profile.categorical.len(),
        "Profiled dataset"
    );
    profile
}

pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|column| classify_dtype(column.dtype()).is_numeric())
        .map(|column| column.name().to_string())
        .collect()
}

pub fn categorical_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|column| classify_dtype(column.dtype()).is_categorical())
        .map(|column| column.name().to_string())
        .collect()
}

pub fn sample_rows(df: &DataFrame, limit: usize) -> DataResult<IndexMap<String, Vec<Value>>> {
    let head = df.head(Some(limit));
    let mut sample = IndexMap::with_capacity(head.width());
    for column in head.get_columns() {
        let series = column.as_series().expect("Column should contain a series");
        let strings = series.cast(&DataType::String)?;
        let values = strings
            .str()?
            .into_iter()
            .map(|cell| cell.map_or(Value::Null, |text| Value::String(text.to_string())))
            .collect();
        sample.insert(series.name().to_string(), values);
    }
    Ok(sample)
}
