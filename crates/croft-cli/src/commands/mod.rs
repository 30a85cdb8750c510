//! Subcommand handlers.

pub mod adjust;
pub mod optimize;
pub mod period;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use croft_core::{AlgorithmConfig, PlanningInstance, PlanningWindow, WeatherSeries};
use croft_io::{
    csv::CsvWeatherSource, json::*, CropProfileSource, FieldSource, InteractionRuleSource,
    WeatherSource,
};
use std::path::{Path, PathBuf};

/// Load the problem instance from the given source files.
pub fn load_instance(
    fields: &Path,
    crops: &Path,
    weather: &Path,
    rules: Option<&PathBuf>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PlanningInstance> {
    let fields = JsonFieldSource {
        path: fields.to_path_buf(),
    }
    .get_all()?;
    let profiles = JsonCropProfileSource {
        path: crops.to_path_buf(),
    }
    .get_all()?;
    let weather = load_weather(weather)?;
    let rules = match rules {
        Some(path) => JsonRuleSource { path: path.clone() }.get_rules()?,
        None => vec![],
    };
    let window = PlanningWindow::new(start, end).context("invalid planning window")?;
    PlanningInstance::new(fields, profiles, weather, rules, window)
        .context("assembling problem instance")
}

/// Weather by extension: `.csv` rows or a JSON day array.
pub fn load_weather(path: &Path) -> Result<WeatherSeries> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        CsvWeatherSource {
            path: path.to_path_buf(),
        }
        .get()
    } else {
        JsonWeatherSource {
            path: path.to_path_buf(),
        }
        .get()
    }
}

/// Algorithm configuration: the given JSON file, or defaults.
pub fn load_config(path: Option<&PathBuf>) -> Result<AlgorithmConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("opening {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => AlgorithmConfig::default(),
    };
    config.validate().context("invalid algorithm configuration")?;
    Ok(config)
}
