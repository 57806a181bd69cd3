//! Evaluation of control readings against product parameters.

use crate::models::Parameter;
use crate::models::parameter::{KIND_RANGE, KIND_TEXT};

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub out_of_range: bool,
    pub alert: Option<String>,
}

impl Evaluation {
    fn ok() -> Self {
        Self {
            out_of_range: false,
            alert: None,
        }
    }

    fn alert(message: String) -> Self {
        Self {
            out_of_range: true,
            alert: Some(message),
        }
    }
}

/// Human-readable range shown next to each reading, e.g. `2.5 - 4 kg`.
pub fn range_label(
    kind: &str,
    min: Option<f64>,
    max: Option<f64>,
    unit: &str,
    expected_text: Option<&str>,
) -> String {
    let label = match kind {
        KIND_RANGE => match (min, max) {
            (Some(min), Some(max)) => format!("{min} - {max}"),
            (Some(min), None) => format!(">= {min}"),
            (None, Some(max)) => format!("<= {max}"),
            (None, None) => "any".to_string(),
        },
        _ => expected_text.unwrap_or("free text").to_string(),
    };

    if unit.is_empty() || kind != KIND_RANGE {
        label
    } else {
        format!("{label} {unit}")
    }
}

/// Validate a parameter definition before it is stored.
pub fn check_definition(
    kind: &str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), String> {
    match kind {
        KIND_RANGE => {
            if min.is_none() && max.is_none() {
                return Err("A range parameter needs min_value, max_value or both".to_string());
            }
            if min.is_some_and(|v| !v.is_finite()) || max.is_some_and(|v| !v.is_finite()) {
                return Err("Range bounds must be finite numbers".to_string());
            }
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err("min_value must not exceed max_value".to_string());
                }
            }
            Ok(())
        }
        KIND_TEXT => Ok(()),
        other => Err(format!("Unknown parameter kind '{other}' (expected range or text)")),
    }
}

/// Judge one reading. Errors mean the reading itself is malformed
/// (e.g. no numeric value for a range parameter).
pub fn evaluate(
    parameter: &Parameter,
    value: Option<f64>,
    text: Option<&str>,
) -> Result<Evaluation, String> {
    if parameter.is_range() {
        let value = value.ok_or_else(|| format!("'{}' needs a numeric value", parameter.name))?;
        if !value.is_finite() {
            return Err(format!("'{}' value must be a finite number", parameter.name));
        }
        Ok(evaluate_range(parameter, value))
    } else {
        let text = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| format!("'{}' needs a text value", parameter.name))?;
        Ok(evaluate_text(parameter, text))
    }
}

fn evaluate_range(parameter: &Parameter, value: f64) -> Evaluation {
    let unit = if parameter.unit.is_empty() {
        String::new()
    } else {
        format!(" {}", parameter.unit)
    };

    if let Some(min) = parameter.min_value {
        if value < min {
            return Evaluation::alert(format!(
                "{}: {value}{unit} is below the minimum of {min}{unit}",
                parameter.name
            ));
        }
    }
    if let Some(max) = parameter.max_value {
        if value > max {
            return Evaluation::alert(format!(
                "{}: {value}{unit} is above the maximum of {max}{unit}",
                parameter.name
            ));
        }
    }
    Evaluation::ok()
}

fn evaluate_text(parameter: &Parameter, text: &str) -> Evaluation {
    match parameter.expected_text.as_deref().map(str::trim) {
        Some(expected) if !expected.is_empty() && !expected.eq_ignore_ascii_case(text) => {
            Evaluation::alert(format!(
                "{}: expected '{expected}', got '{text}'",
                parameter.name
            ))
        }
        _ => Evaluation::ok(),
    }
}
