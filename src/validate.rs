// src/validate.rs
//! Declarative query-parameter rules applied before any fetch work.

use std::collections::HashMap;

use crate::error::ApiError;

pub type Validator = fn(&str) -> bool;

pub const MAX_QUERY_CHARS: usize = 100;
pub const MAX_KEYWORDS_CHARS: usize = 200;
pub const MAX_DAYS: u32 = 365;

/// Ordered `{param → validator}` list. Absent or empty parameters are skipped
/// so defaults can apply.
#[derive(Clone, Default)]
pub struct ParamRules {
    rules: Vec<(&'static str, Validator)>,
}

impl ParamRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, param: &'static str, validator: Validator) -> Self {
        self.rules.push((param, validator));
        self
    }

    /// Rules for `/api/news`.
    pub fn news() -> Self {
        Self::new()
            .rule("days", valid_days)
            .rule("query", |v| v.chars().count() <= MAX_QUERY_CHARS)
            .rule("keywords", |v| v.chars().count() <= MAX_KEYWORDS_CHARS)
    }

    /// First failing parameter wins.
    pub fn check(&self, params: &HashMap<String, String>) -> Result<(), ApiError> {
        for (param, validator) in &self.rules {
            match params.get(*param) {
                Some(value) if !value.is_empty() && !validator(value) => {
                    return Err(ApiError::validation(*param));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn valid_days(v: &str) -> bool {
    v.chars().all(|c| c.is_ascii_digit())
        && v.parse::<u32>().is_ok_and(|d| (1..=MAX_DAYS).contains(&d))
}
