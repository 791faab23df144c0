use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    schema::PredictRequest,
};

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_URGENCY: &str = "Medium";
pub const DEFAULT_DEADLINE_HOURS: f64 = 24.0;

/// A prediction request after defaults and coercions have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFeatures {
    /// Free-form category label; unseen values are allowed.
    pub category: String,
    /// Caller's urgency hint, usually one of Low/Medium/High.
    pub urgency: String,
    /// Always finite and non-negative.
    pub deadline_hours: f64,
}

impl Default for TaskFeatures {
    fn default() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            urgency: DEFAULT_URGENCY.to_string(),
            deadline_hours: DEFAULT_DEADLINE_HOURS,
        }
    }
}

impl TaskFeatures {
    pub fn new(
        category: impl Into<String>,
        urgency: impl Into<String>,
        deadline_hours: f64,
    ) -> Self {
        Self {
            category: category.into(),
            urgency: urgency.into(),
            deadline_hours,
        }
    }

    /// Normalizes a raw request. A calendar `deadline` is resolved in the
    /// time zone of `now`.
    pub fn from_request<Tz: TimeZone>(
        req: PredictRequest,
        now: &DateTime<Tz>,
    ) -> AppResult<Self> {
        let category = label_field("category", req.category)?
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let urgency = label_field("urgency", req.urgency)?
            .unwrap_or_else(|| DEFAULT_URGENCY.to_string());

        let deadline_hours = match (req.deadline_hours, req.deadline) {
            (Some(raw), _) => coerce_hours(&raw)?,
            (None, Some(raw)) => hours_until_date(&raw, now)?,
            (None, None) => DEFAULT_DEADLINE_HOURS,
        };

        Ok(Self {
            category,
            urgency,
            deadline_hours,
        })
    }
}

fn label_field(name: &str, value: Option<Value>) -> AppResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(_) => Err(AppError::invalid_input(format!("{name} must be a string"))),
    }
}

fn coerce_hours(value: &Value) -> AppResult<f64> {
    let hours = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            AppError::invalid_input(format!("deadline_hours is out of range: {n}"))
        })?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            AppError::invalid_input(format!("deadline_hours must be a number, got {s:?}"))
        })?,
        other => {
            return Err(AppError::invalid_input(format!(
                "deadline_hours must be a number, got {other}"
            )));
        }
    };

    if !hours.is_finite() {
        return Err(AppError::invalid_input("deadline_hours must be finite"));
    }
    if hours < 0.0 {
        return Err(AppError::invalid_input(format!(
            "deadline_hours must not be negative, got {hours}"
        )));
    }
    Ok(hours)
}

/// Whole hours from `now` until the end of the given day, never less than 1.
fn hours_until_date<Tz: TimeZone>(value: &Value, now: &DateTime<Tz>) -> AppResult<f64> {
    let Value::String(raw) = value else {
        return Err(AppError::invalid_input("deadline must be a YYYY-MM-DD string"));
    };
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        AppError::invalid_input(format!("deadline {raw:?} is not a YYYY-MM-DD date: {e}"))
    })?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)
        .map(|t| date.and_time(t))
        .and_then(|local| now.timezone().from_local_datetime(&local).earliest())
        .ok_or_else(|| AppError::invalid_input(format!("deadline {raw:?} is out of range")))?;

    Ok(hours_between(now, &end_of_day))
}

/// Elapsed whole hours between two instants, clamped to at least 1.
fn hours_between<A: TimeZone, B: TimeZone>(now: &DateTime<A>, end: &DateTime<B>) -> f64 {
    let elapsed = end.with_timezone(&Utc) - now.with_timezone(&Utc);
    elapsed.num_hours().max(1) as f64
}
