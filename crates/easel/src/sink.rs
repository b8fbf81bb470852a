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

use crate::chart_builder::RenderedChart;
use polars::prelude::DataFrame;

pub trait DashboardSink {
    fn show_preview(&mut self, df: &DataFrame);

    fn show_domain(&mut self, domain: &str);

    fn show_metric(&mut self, name: &str, value: &str);

    fn show_chart(&mut self, chart: &RenderedChart);

    fn show_insight(&mut self, insight: &str);
}
