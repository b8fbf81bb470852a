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

use crate::data_profiler::DatasetProfile;
use crate::error::Result;
use indexmap::IndexMap;
use serde_json::Value;

const RESPONSE_CONTRACT: &str = r#"{
  "domain": "",
  "kpis": ["", ""],
  "charts": [
    {"type": "bar", "x": "", "y": ""},
    {"type": "line", "x": "", "y": ""}
  ],
  "insights": ["", ""]
}"#;

pub fn build_analysis_prompt(
    profile: &DatasetProfile,
    sample: &IndexMap<String, Vec<Value>>,
) -> Result<String> {
    let columns = serde_json::to_string(&profile.columns)?;
    let numeric = serde_json::to_string(&profile.numeric)?;
    let categorical = serde_json::to_string(&profile.categorical)?;
    let missing = serde_json::to_string(&profile.missing)?;
    let sample = serde_json::to_string_pretty(sample)?;

    Ok(format!(
        "You are a senior business analyst and BI consultant.\n\
         \n\
         Dataset profile:\n\
         Rows: {rows}\n\
         Columns: {columns}\n\
         Numeric columns: {numeric}\n\
         Categorical columns: {categorical}\n\
         Missing values: {missing}\n\
         \n\
         Sample data:\n\
         {sample}\n\
         \n\
         Tasks:\n\
         1. Identify the business domain\n\
         2. List 4-6 important KPIs\n\
         3. Recommend charts for a dashboard\n\
         4. Write clear business insights\n\
         \n\
         Return STRICT JSON in this format:\n\
         {contract}",
        rows = profile.rows,
        contract = RESPONSE_CONTRACT,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_profiler::{profile_dataframe, sample_rows};
    use polars::df;

    #[test]
    fn prompt_embeds_profile_sample_and_contract() {
        let df = df!(
            "Region" => ["North", "South", "North"],
            "Sales" => [100i64, 200, 300]
        )
        .unwrap();
        let profile = profile_dataframe(&df);
        let sample = sample_rows(&df, 5).unwrap();
        let prompt = build_analysis_prompt(&profile, &sample).unwrap();

        assert!(prompt.contains("Rows: 3"));
        assert!(prompt.contains(r#"["Region","Sales"]"#));
        assert!(prompt.contains(r#"Numeric columns: ["Sales"]"#));
        assert!(prompt.contains(r#""Region":0"#));
        assert!(prompt.contains("\"South\""));
        assert!(prompt.contains(r#""domain""#));
        assert!(prompt.contains(r#""kpis""#));
        assert!(prompt.contains(r#"{"type": "bar", "x": "", "y": ""}"#));
        assert!(prompt.contains("STRICT JSON"));
    }
}
