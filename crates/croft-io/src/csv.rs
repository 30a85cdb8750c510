//! CSV weather import.
//!
//! Expects daily observation rows with a header:
//! `date,t_mean,t_max,t_min,precipitation_mm,sunshine_hours,wind_speed`.
//! Only `date` is required; empty cells become missing observations.

use crate::WeatherSource;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use croft_core::{WeatherDay, WeatherSeries};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct WeatherRow {
    date: NaiveDate,
    #[serde(default)]
    t_mean: Option<f64>,
    #[serde(default)]
    t_max: Option<f64>,
    #[serde(default)]
    t_min: Option<f64>,
    #[serde(default)]
    precipitation_mm: Option<f64>,
    #[serde(default)]
    sunshine_hours: Option<f64>,
    #[serde(default)]
    wind_speed: Option<f64>,
}

/// Load a weather series from a CSV file.
pub fn read_weather_csv(path: &Path) -> Result<WeatherSeries> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut days = Vec::new();
    for row in reader.deserialize() {
        let row: WeatherRow =
            row.with_context(|| format!("parsing {}", path.display()))?;
        days.push(WeatherDay {
            date: row.date,
            t_mean: row.t_mean,
            t_max: row.t_max,
            t_min: row.t_min,
            precipitation_mm: row.precipitation_mm,
            sunshine_hours: row.sunshine_hours,
            wind_speed: row.wind_speed,
        });
    }
    WeatherSeries::from_days(days)
        .with_context(|| format!("validating weather series {}", path.display()))
}

/// CSV-backed weather source.
#[derive(Debug, Clone)]
pub struct CsvWeatherSource {
    pub path: PathBuf,
}

impl WeatherSource for CsvWeatherSource {
    fn get(&self) -> Result<WeatherSeries> {
        read_weather_csv(&self.path)
    }
}
