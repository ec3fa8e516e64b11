//! Chart assembly for sensor and group time series
//!
//! Charts are plain data handed to a [`ChartRenderer`]; nothing here draws.

use std::fmt;
use std::sync::Mutex;

use crate::config::TemperatureUnit;
use crate::model::DataPoint;
use crate::view::AcceptanceBand;

pub const TEMPERATURE_COLOR: &str = "#0062E3";
pub const HUMIDITY_COLOR: &str = "green";
pub const BAND_COLOR: &str = "red";
pub const BAND_OPACITY: f64 = 0.2;

/// Vertical axis a series is plotted against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Primary axis
    Temperature,
    /// Secondary axis
    Humidity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: Option<String>,
    pub axis: Axis,
    /// `(epoch_ms, value)` pairs, oldest first
    pub points: Vec<(f64, f64)>,
    /// Fill opacity for closed polygons
    pub fill: Option<f64>,
}

impl Series {
    fn line(label: impl Into<String>, axis: Axis, points: &[DataPoint]) -> Self {
        Self {
            label: label.into(),
            color: None,
            axis,
            points: points.iter().map(|p| (p.epoch_ms, p.value)).collect(),
            fill: None,
        }
    }

    fn colored(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisConfig {
    pub label: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AxisConfig {
    fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            min: None,
            max: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub series: Vec<Series>,
    pub temperature_axis: AxisConfig,
    pub humidity_axis: AxisConfig,
}

/// Where a chart goes on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartTarget {
    Sensor,
    SensorGroup,
}

impl fmt::Display for ChartTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartTarget::Sensor => write!(f, "sensor"),
            ChartTarget::SensorGroup => write!(f, "sensor group"),
        }
    }
}

/// The charting primitive of the rendering surface
pub trait ChartRenderer: Send + Sync + fmt::Debug {
    fn render(&self, target: ChartTarget, chart: &Chart);
}

#[derive(Debug, Default)]
pub struct LogChartRenderer;

impl ChartRenderer for LogChartRenderer {
    fn render(&self, target: ChartTarget, chart: &Chart) {
        for series in &chart.series {
            tracing::info!(
                "[{} chart] {}: {} points",
                target,
                series.label,
                series.points.len()
            );
        }
    }
}

/// Keeps every rendered chart; the last one per target is what is on screen
#[derive(Debug, Default)]
pub struct MemoryChartRenderer {
    rendered: Mutex<Vec<(ChartTarget, Chart)>>,
}

impl MemoryChartRenderer {
    pub fn rendered(&self) -> Vec<(ChartTarget, Chart)> {
        self.rendered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn last(&self, target: ChartTarget) -> Option<Chart> {
        self.rendered()
            .into_iter()
            .rev()
            .find(|(t, _)| *t == target)
            .map(|(_, chart)| chart)
    }

    pub fn count(&self, target: ChartTarget) -> usize {
        self.rendered().iter().filter(|(t, _)| *t == target).count()
    }
}

impl ChartRenderer for MemoryChartRenderer {
    fn render(&self, target: ChartTarget, chart: &Chart) {
        self.rendered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((target, chart.clone()));
    }
}

const SENSOR_HUMIDITY_LABEL: &str = "Humidity % ";

fn temperature_label(unit: TemperatureUnit) -> String {
    format!("Degrees {}", unit)
}

/// Temperature and humidity of one sensor; `None` without temperature data
pub fn sensor_chart(
    temperature: &[DataPoint],
    humidity: &[DataPoint],
    unit: TemperatureUnit,
) -> Option<Chart> {
    if temperature.is_empty() {
        return None;
    }
    let temperature_label = temperature_label(unit);
    Some(Chart {
        series: vec![
            Series::line(SENSOR_HUMIDITY_LABEL, Axis::Humidity, humidity).colored(HUMIDITY_COLOR),
            Series::line(temperature_label.as_str(), Axis::Temperature, temperature)
                .colored(TEMPERATURE_COLOR),
        ],
        temperature_axis: AxisConfig::labelled(temperature_label),
        humidity_axis: AxisConfig::labelled(SENSOR_HUMIDITY_LABEL),
    })
}

/// Series fetched for one member of a group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberSeries {
    pub name: String,
    pub temperature: Vec<DataPoint>,
    pub humidity: Vec<DataPoint>,
}

/// All member temperatures, then all member humidities, plus the band
pub fn group_chart(
    members: &[MemberSeries],
    band: Option<&AcceptanceBand>,
    unit: TemperatureUnit,
) -> Chart {
    let mut series: Vec<Series> = members
        .iter()
        .map(|m| Series::line(format!("{} temp", m.name), Axis::Temperature, &m.temperature))
        .collect();
    series.extend(
        members
            .iter()
            .map(|m| Series::line(format!("{} hum", m.name), Axis::Humidity, &m.humidity)),
    );

    let mut temperature_axis = AxisConfig::labelled(temperature_label(unit));
    if let Some(band) = band {
        // The band spans whatever time range the first series covers
        if let (Some(start), Some(end)) = (
            series.first().and_then(|s| s.points.first()).map(|p| p.0),
            series.first().and_then(|s| s.points.last()).map(|p| p.0),
        ) {
            series.push(Series {
                label: "setpoint".to_string(),
                color: Some(BAND_COLOR.to_string()),
                axis: band.axis,
                points: vec![
                    (end, band.upper),
                    (start, band.upper),
                    (start, band.lower),
                    (end, band.lower),
                ],
                fill: Some(BAND_OPACITY),
            });
        }
        temperature_axis.min = Some(band.lower - 5.0);
        temperature_axis.max = Some(band.upper + 5.0);
    }

    Chart {
        series,
        temperature_axis,
        humidity_axis: AxisConfig::labelled("Humidity %"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoltageLevel {
    Good,
    Warning,
    Critical,
}

/// Battery state of a sensor node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoltageStatus {
    pub volts: f64,
    pub level: VoltageLevel,
}

impl fmt::Display for VoltageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} V", self.volts)
    }
}

/// Classify the latest sample
pub fn voltage_status(samples: &[DataPoint]) -> Option<VoltageStatus> {
    let volts = samples.last()?.value;
    let level = if volts > 2.5 {
        VoltageLevel::Good
    } else if volts > 2.2 {
        VoltageLevel::Warning
    } else {
        VoltageLevel::Critical
    };
    Some(VoltageStatus { volts, level })
}
