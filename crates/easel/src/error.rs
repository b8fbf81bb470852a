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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Model error: {0}")]
    Model(#[from] crate::llm::ModelError),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },
}

pub type Result<T> = std::result::Result<T, DashboardError>;
pub type DataResult<T> = std::result::Result<T, DataError>;

impl From<polars::error::PolarsError> for DashboardError {
    fn from(err: polars::error::PolarsError) -> Self {
        DashboardError::Data(DataError::Polars(err))
    }
}

impl DashboardError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DashboardError::Model(_))
    }

    pub fn category(&self) -> &'static str {
        match self {
            DashboardError::Data(_) => "Data",
            DashboardError::Model(_) => "Model",
            DashboardError::Serialisation(_) => "Serialisation",
        }
    }
}
