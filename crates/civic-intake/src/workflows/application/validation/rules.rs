use std::sync::OnceLock;

use regex::Regex;

use super::messages::Rule;
use super::FieldError;

pub(crate) const MAX_NAME_LENGTH: usize = 100;
pub(crate) const MAX_EMAIL_LENGTH: usize = 254;
pub(crate) const MAX_FREE_TEXT_LENGTH: usize = 1000;
pub(crate) const MIN_BIRTH_YEAR: i32 = 1900;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

/// Accumulates at most one error per field, in the order fields are checked.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub(crate) fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    fn fail(&mut self, path: &'static str, rule: Rule) {
        self.errors.push(FieldError::new(path, rule));
    }

    fn present(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|text| !text.is_empty())
    }

    /// Required free text with a length cap.
    pub(crate) fn text(&mut self, path: &'static str, value: Option<&str>, max_len: usize) {
        match Self::present(value) {
            None => self.fail(path, Rule::Required),
            Some(text) if text.chars().count() > max_len => self.fail(path, Rule::TooLong),
            Some(_) => {}
        }
    }

    pub(crate) fn optional_text(&mut self, path: &'static str, value: Option<&str>, max_len: usize) {
        if let Some(text) = Self::present(value) {
            if text.chars().count() > max_len {
                self.fail(path, Rule::TooLong);
            }
        }
    }

    pub(crate) fn email(&mut self, path: &'static str, value: Option<&str>) {
        match Self::present(value) {
            None => self.fail(path, Rule::Required),
            Some(text) if text.len() > MAX_EMAIL_LENGTH => self.fail(path, Rule::TooLong),
            Some(text) if !email_pattern().is_match(text) => self.fail(path, Rule::Invalid),
            Some(_) => {}
        }
    }

    pub(crate) fn year(&mut self, path: &'static str, value: Option<i32>, min: i32, max: i32) {
        match value {
            None => self.fail(path, Rule::Required),
            Some(year) if year < min || year > max => self.fail(path, Rule::OutOfRange),
            Some(_) => {}
        }
    }

    /// A selected lookup id.
    pub(crate) fn selected(&mut self, path: &'static str, value: Option<&str>) {
        if Self::present(value).is_none() {
            self.fail(path, Rule::Required);
        }
    }

    /// A yes/no question that must be answered either way.
    pub(crate) fn answered(&mut self, path: &'static str, value: Option<bool>) {
        if value.is_none() {
            self.fail(path, Rule::Required);
        }
    }

    /// A checkbox that must be ticked.
    pub(crate) fn affirmed(&mut self, path: &'static str, value: Option<bool>) {
        match value {
            None => self.fail(path, Rule::Required),
            Some(false) => self.fail(path, Rule::MustAccept),
            Some(true) => {}
        }
    }

    pub(crate) fn positive(&mut self, path: &'static str, value: Option<u32>) {
        match value {
            None => self.fail(path, Rule::Required),
            Some(0) => self.fail(path, Rule::OutOfRange),
            Some(_) => {}
        }
    }
}
