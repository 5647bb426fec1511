//! Chart Service
//!
//! Derives chart/table-ready rows from the current observations and builds
//! Vega-Lite v5 specs for the three visualization modes. Rendering is the
//! frontend's job; this module only produces the spec.

use crate::state::{AppState, Observation, VisualizationMode};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

/// One chart-ready data point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub date: String,
    pub value: f64,
    pub series: String,
    #[serde(rename = "vectorId")]
    pub vector_id: i64,
}

/// Current mode plus the derived spec; `chart` is absent when there is
/// nothing to draw
#[derive(Debug, Serialize)]
pub struct ChartView {
    pub mode: VisualizationMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<Value>,
}

pub struct ChartService;

impl ChartService {
    /// Resolve observations into labeled rows. Labels come from series
    /// metadata, falling back to a synthetic `Vector {id}` label.
    pub fn chart_rows(state: &AppState) -> Vec<ChartRow> {
        state
            .observations()
            .into_iter()
            .map(|obs| Self::to_row(state, obs))
            .collect()
    }

    fn to_row(state: &AppState, obs: Observation) -> ChartRow {
        let series = state
            .series_title(obs.vector_id)
            .unwrap_or_else(|| format!("Vector {}", obs.vector_id));
        ChartRow {
            date: obs.date,
            value: obs.value,
            series,
            vector_id: obs.vector_id,
        }
    }

    /// Change the mode and re-derive the spec. Never touches the network.
    pub fn set_mode(state: &AppState, mode: VisualizationMode) -> ChartView {
        state.set_visualization_mode(mode);
        Self::current_view(state)
    }

    /// The spec for the current mode, or no chart when observations are empty
    pub fn current_view(state: &AppState) -> ChartView {
        let mode = state.visualization_mode();
        let rows = Self::chart_rows(state);
        let chart = (!rows.is_empty()).then(|| Self::spec(mode, rows));
        ChartView { mode, chart }
    }

    /// Rows for the table view (one per observation, in fetch order)
    pub fn table_rows(state: &AppState) -> Vec<ChartRow> {
        Self::chart_rows(state)
    }

    fn spec(mode: VisualizationMode, rows: Vec<ChartRow>) -> Value {
        match mode {
            VisualizationMode::Line => Self::line_spec(rows),
            VisualizationMode::Scatter => Self::scatter_spec(rows),
            VisualizationMode::Bar => Self::bar_spec(rows),
        }
    }

    /// Collapse to one row per series label. The row with the maximum date
    /// wins; on a date tie the earlier row is kept, so the result is stable
    /// in original order.
    fn latest_per_series(rows: Vec<ChartRow>) -> Vec<ChartRow> {
        let mut latest: IndexMap<String, ChartRow> = IndexMap::new();
        for row in rows {
            match latest.get(&row.series) {
                Some(current) if row.date <= current.date => {}
                _ => {
                    latest.insert(row.series.clone(), row);
                }
            }
        }
        latest.into_values().collect()
    }

    fn temporal_encoding() -> Value {
        json!({
            "field": "date",
            "type": "temporal",
            "title": "Date",
            "axis": { "labelAngle": -45 }
        })
    }

    fn value_encoding() -> Value {
        json!({ "field": "value", "type": "quantitative", "title": "Value" })
    }

    fn series_color() -> Value {
        json!({
            "field": "series",
            "type": "nominal",
            "title": "Series",
            "scale": { "scheme": "category10" }
        })
    }

    fn tooltip() -> Value {
        json!([
            { "field": "date", "type": "temporal", "title": "Date" },
            { "field": "value", "type": "quantitative", "title": "Value" },
            { "field": "series", "type": "nominal", "title": "Series" }
        ])
    }

    fn line_spec(rows: Vec<ChartRow>) -> Value {
        json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "description": "Statistics Canada Data Visualization",
            "width": 800,
            "height": 400,
            "data": { "values": rows },
            "mark": { "type": "line", "point": true, "strokeWidth": 2 },
            "encoding": {
                "x": Self::temporal_encoding(),
                "y": Self::value_encoding(),
                "color": Self::series_color(),
                "tooltip": Self::tooltip()
            }
        })
    }

    fn scatter_spec(rows: Vec<ChartRow>) -> Value {
        json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "description": "Statistics Canada Data Scatter Plot",
            "width": 800,
            "height": 400,
            "data": { "values": rows },
            "mark": { "type": "circle", "size": 100, "opacity": 0.7 },
            "encoding": {
                "x": Self::temporal_encoding(),
                "y": Self::value_encoding(),
                "color": Self::series_color(),
                "tooltip": Self::tooltip()
            }
        })
    }

    fn bar_spec(rows: Vec<ChartRow>) -> Value {
        let latest = Self::latest_per_series(rows);
        json!({
            "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
            "description": "Statistics Canada Data Bar Chart",
            "width": 800,
            "height": 400,
            "data": { "values": latest },
            "mark": { "type": "bar" },
            "encoding": {
                "x": {
                    "field": "series",
                    "type": "nominal",
                    "title": "Series",
                    "axis": { "labelAngle": -45 }
                },
                "y": Self::value_encoding(),
                "color": {
                    "field": "series",
                    "type": "nominal",
                    "scale": { "scheme": "category10" }
                },
                "tooltip": [
                    { "field": "series", "type": "nominal", "title": "Series" },
                    { "field": "value", "type": "quantitative", "title": "Value" },
                    { "field": "date", "type": "temporal", "title": "Date" }
                ]
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Observation, SeriesMeta};
    use crate::test_support::mock_state;

    fn obs(vector_id: i64, date: &str, value: f64) -> Observation {
        Observation {
            vector_id,
            date: date.to_string(),
            value,
        }
    }

    fn row(series: &str, date: &str, value: f64) -> ChartRow {
        ChartRow {
            date: date.to_string(),
            value,
            series: series.to_string(),
            vector_id: 0,
        }
    }

    #[test]
    fn labels_fall_back_to_synthetic_vector_name() {
        let state = mock_state();
        state.replace_observations(vec![obs(41690973, "2024-01-01", 1.0)]);

        let rows = ChartService::chart_rows(&state);
        assert_eq!(rows[0].series, "Vector 41690973");

        state.insert_series_metadata(
            41690973,
            SeriesMeta {
                title: "GDP".to_string(),
                description: "GDP".to_string(),
            },
        );
        let rows = ChartService::chart_rows(&state);
        assert_eq!(rows[0].series, "GDP");
    }

    #[test]
    fn empty_observations_produce_no_chart() {
        let state = mock_state();
        let view = ChartService::set_mode(&state, VisualizationMode::Bar);
        assert_eq!(view.mode, VisualizationMode::Bar);
        assert!(view.chart.is_none());
        // the mode change itself still sticks
        assert_eq!(state.visualization_mode(), VisualizationMode::Bar);
    }

    #[test]
    fn mode_selects_matching_mark() {
        let state = mock_state();
        state.replace_observations(vec![obs(1, "2024-01-01", 1.0)]);

        let line = ChartService::set_mode(&state, VisualizationMode::Line);
        assert_eq!(line.chart.unwrap()["mark"]["type"], "line");

        let scatter = ChartService::set_mode(&state, VisualizationMode::Scatter);
        assert_eq!(scatter.chart.unwrap()["mark"]["type"], "circle");

        let bar = ChartService::set_mode(&state, VisualizationMode::Bar);
        assert_eq!(bar.chart.unwrap()["mark"]["type"], "bar");
    }

    #[test]
    fn bar_collapse_keeps_latest_date_per_series() {
        let rows = vec![
            row("GDP", "2024-01-01", 1.0),
            row("GDP", "2024-03-01", 3.0),
            row("GDP", "2024-02-01", 2.0),
            row("CPI", "2024-02-01", 9.0),
        ];
        let latest = ChartService::latest_per_series(rows);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].series, "GDP");
        assert_eq!(latest[0].value, 3.0);
        assert_eq!(latest[1].series, "CPI");
    }

    #[test]
    fn bar_collapse_tie_keeps_earlier_row() {
        let rows = vec![
            row("GDP", "2024-03-01", 1.0),
            row("GDP", "2024-03-01", 2.0),
        ];
        let latest = ChartService::latest_per_series(rows);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].value, 1.0);
    }

    #[test]
    fn bar_spec_embeds_collapsed_rows() {
        let state = mock_state();
        state.replace_observations(vec![
            obs(1, "2024-01-01", 1.0),
            obs(1, "2024-02-01", 5.0),
        ]);
        let view = ChartService::set_mode(&state, VisualizationMode::Bar);
        let chart = view.chart.unwrap();
        let values = chart["data"]["values"].as_array().unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["value"], 5.0);
    }
}
