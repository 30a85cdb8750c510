//! Daily weather observations and the contiguous series the planner reads.

use crate::{CroftError, CroftResult, PlanningWindow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of weather. Temperatures in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherDay {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_mm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunshine_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
}

impl WeatherDay {
    pub fn new(date: NaiveDate) -> Self {
        WeatherDay {
            date,
            t_mean: None,
            t_max: None,
            t_min: None,
            precipitation_mm: None,
            sunshine_hours: None,
            wind_speed: None,
        }
    }
}

/// A contiguous, date-ordered sequence of daily observations.
///
/// Contiguity lets `get` resolve a date in O(1) by offset from the first
/// day instead of searching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSeries {
    days: Vec<WeatherDay>,
}

impl WeatherSeries {
    /// Build a series from unordered days. Sorts by date and rejects
    /// duplicates and gaps.
    pub fn from_days(mut days: Vec<WeatherDay>) -> CroftResult<Self> {
        if days.is_empty() {
            return Err(CroftError::MissingWeather("weather series is empty".into()));
        }
        days.sort_by_key(|d| d.date);
        for pair in days.windows(2) {
            let gap = (pair[1].date - pair[0].date).num_days();
            if gap == 0 {
                return Err(CroftError::InvalidInput(format!(
                    "duplicate weather day {}",
                    pair[0].date
                )));
            }
            if gap != 1 {
                return Err(CroftError::MissingWeather(format!(
                    "weather gap between {} and {}",
                    pair[0].date, pair[1].date
                )));
            }
        }
        Ok(WeatherSeries { days })
    }

    pub fn start(&self) -> NaiveDate {
        self.days[0].date
    }

    pub fn end(&self) -> NaiveDate {
        self.days[self.days.len() - 1].date
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Observation for `date`, or `None` when the series does not cover it.
    pub fn get(&self, date: NaiveDate) -> Option<&WeatherDay> {
        let offset = (date - self.start()).num_days();
        if offset < 0 {
            return None;
        }
        self.days.get(offset as usize)
    }

    pub fn days(&self) -> &[WeatherDay] {
        &self.days
    }

    /// Whether the series covers every day of the window.
    pub fn covers(&self, window: &PlanningWindow) -> bool {
        self.start() <= window.start && self.end() >= window.end
    }
}
