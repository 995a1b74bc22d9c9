//! Collects every problem with a request instead of stopping at the first.

use chrono::NaiveDate;

use crate::{error::AppError, models::date::parse_calendar_date};

#[derive(Debug, Default)]
pub struct Problems(Vec<String>);

impl Problems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// A field that must be present and not blank. The value is trimmed.
    pub fn required_text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value.map(|text| text.trim().to_string()) {
            Some(text) if !text.is_empty() => Some(text),
            Some(_) => {
                self.push(format!("{field} must not be empty"));
                None
            }
            None => {
                self.push(format!("{field} is required"));
                None
            }
        }
    }

    /// A field that may be absent, but when present must not be blank.
    pub fn non_blank(&mut self, field: &str, value: Option<String>) -> Option<String> {
        value.and_then(|text| self.required_text(field, Some(text)))
    }

    pub fn date(&mut self, field: &str, raw: Option<&str>) -> Option<NaiveDate> {
        let raw = raw?;
        let parsed = parse_calendar_date(raw);
        if parsed.is_none() {
            self.push(format!("{field} must be a valid date (YYYY-MM-DD)"));
        }
        parsed
    }

    pub fn date_range(
        &mut self,
        start_field: &str,
        start: Option<NaiveDate>,
        end_field: &str,
        end: Option<NaiveDate>,
    ) {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                self.push(format!("{end_field} must not be before {start_field}"));
            }
        }
    }

    pub fn uuid(&mut self, field: &str, raw: Option<&str>) -> Option<uuid::Uuid> {
        let raw = raw?;
        let parsed = uuid::Uuid::parse_str(raw).ok();
        if parsed.is_none() {
            self.push(format!("{field} must be a valid UUID"));
        }
        parsed
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok` when nothing was recorded.
    pub fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}
