// =============================================================================
// Chart Builder — OHLCV bars to a Plotly-figure-shaped candlestick spec
// =============================================================================
//
// Pure, stateless transform: the same bars always yield an equivalent spec.
// The spec serialises to the JSON shape Plotly consumes directly in the
// browser (one candlestick trace, dark template, range slider off).
// =============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::HistoricalBar;

/// Serialisable chart specification: traces plus layout.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub data: Vec<CandlestickTrace>,
    pub layout: ChartLayout,
}

/// A single Plotly candlestick trace.
#[derive(Debug, Clone, Serialize)]
pub struct CandlestickTrace {
    #[serde(rename = "type")]
    pub trace_type: &'static str,
    pub x: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartLayout {
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub template: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeSlider {
    pub visible: bool,
}

/// Build the candlestick chart spec for `ticker` from its daily bars.
///
/// An empty input produces a spec with zero traces rather than failing; the
/// browser renders it as an empty chart.
pub fn candlestick_chart(bars: &[HistoricalBar], ticker: &str) -> ChartSpec {
    let ticker = ticker.to_uppercase();

    let layout = ChartLayout {
        title: format!("Candlestick chart for {ticker}"),
        xaxis: Axis {
            title: "Time".to_string(),
            rangeslider: Some(RangeSlider { visible: false }),
        },
        yaxis: Axis {
            title: "Price (VND)".to_string(),
            rangeslider: None,
        },
        template: "plotly_dark",
    };

    if bars.is_empty() {
        return ChartSpec {
            data: Vec::new(),
            layout,
        };
    }

    let trace = CandlestickTrace {
        trace_type: "candlestick",
        x: bars.iter().map(|b| b.date).collect(),
        open: bars.iter().map(|b| b.open).collect(),
        high: bars.iter().map(|b| b.high).collect(),
        low: bars.iter().map(|b| b.low).collect(),
        close: bars.iter().map(|b| b.close).collect(),
        name: ticker,
    };

    ChartSpec {
        data: vec![trace],
        layout,
    }
}
