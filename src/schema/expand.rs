// src/schema/expand.rs

//! Enumeration helpers for the synthesizer.
//!
//! Every function here takes a `limit` and refuses to build more than that
//! many values, so a careless range (`step = 0.0001`) or a long option list
//! fails at authoring time instead of producing a huge schema.

use chrono::{Days, NaiveDate};
use serde_json::{Number, Value};

use crate::schema::SchemaError;
use crate::types::QuestionKind;

/// Every `step`-spaced number in `[min, max]`, starting at `min`.
///
/// Integral inputs produce integer JSON numbers; otherwise values are rounded
/// to 10 decimal places to keep `0.1 + 0.2` from leaking into the schema.
pub fn numeric_range(min: f64, max: f64, step: f64, limit: usize) -> Result<Vec<Value>, SchemaError> {
    let kind = QuestionKind::NumericRange;
    if !(min.is_finite() && max.is_finite() && step.is_finite()) {
        return Err(SchemaError::spec(kind, "min, max and step must be finite numbers"));
    }
    if step <= 0.0 {
        return Err(SchemaError::spec(kind, "step must be > 0"));
    }
    if max < min {
        return Err(SchemaError::spec(kind, format!("max ({max}) is below min ({min})")));
    }

    let span = ((max - min) / step + 1e-9).floor();
    if span + 1.0 > limit as f64 {
        return Err(SchemaError::TooManyValues { kind, limit });
    }
    let count = span as usize + 1;

    let integral = min.fract() == 0.0 && step.fract() == 0.0;
    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        let v = min + step * i as f64;
        if integral {
            values.push(Value::from(v as i64));
        } else {
            let rounded = (v * 1e10).round() / 1e10;
            let n = Number::from_f64(rounded)
                .ok_or_else(|| SchemaError::spec(kind, "range produced a non-finite value"))?;
            values.push(Value::Number(n));
        }
    }
    Ok(values)
}

/// Every date `min, min + step, ...` up to and including `max`, as ISO strings.
pub fn date_range(
    min: NaiveDate,
    max: NaiveDate,
    step_days: i64,
    limit: usize,
) -> Result<Vec<Value>, SchemaError> {
    let kind = QuestionKind::DateRange;
    if step_days <= 0 {
        return Err(SchemaError::spec(kind, "step must be a positive number of days"));
    }
    if max < min {
        return Err(SchemaError::spec(kind, format!("max ({max}) is before min ({min})")));
    }

    let span = (max - min).num_days() / step_days;
    if span as u64 + 1 > limit as u64 {
        return Err(SchemaError::TooManyValues { kind, limit });
    }

    let step = Days::new(step_days.unsigned_abs());
    let mut values = Vec::with_capacity(span as usize + 1);
    let mut current = Some(min);
    while let Some(date) = current.filter(|d| *d <= max) {
        values.push(Value::String(date.format("%Y-%m-%d").to_string()));
        // Stepping past the last representable date ends the range.
        current = date.checked_add_days(step);
    }
    Ok(values)
}

/// Every non-empty ordered selection of `options` (all orderings of all
/// non-empty subsets), shortest first.
pub fn ordered_selections(options: &[Value], limit: usize) -> Result<Vec<Value>, SchemaError> {
    let kind = QuestionKind::MultipleChoice;
    let n = options.len();
    let total = (1..=n).try_fold(0usize, |acc, k| {
        partial_permutations(n, k).and_then(|c| acc.checked_add(c))
    });
    match total {
        Some(t) if t <= limit => {}
        _ => return Err(SchemaError::TooManyValues { kind, limit }),
    }

    let mut out = Vec::new();
    for k in 1..=n {
        let mut used = vec![false; n];
        let mut current = Vec::with_capacity(k);
        permute(options, k, &mut used, &mut current, &mut out);
    }
    Ok(out)
}

/// Every ordering of the full `items` list.
pub fn orderings(items: &[Value], limit: usize) -> Result<Vec<Value>, SchemaError> {
    let kind = QuestionKind::MultipleChoice;
    let n = items.len();
    match partial_permutations(n, n) {
        Some(c) if c <= limit => {}
        _ => return Err(SchemaError::TooManyValues { kind, limit }),
    }

    let mut out = Vec::new();
    let mut used = vec![false; n];
    let mut current = Vec::with_capacity(n);
    permute(items, n, &mut used, &mut current, &mut out);
    Ok(out)
}

/// n! / (n - k)!, or `None` on overflow.
fn partial_permutations(n: usize, k: usize) -> Option<usize> {
    ((n - k + 1)..=n).try_fold(1usize, |acc, x| acc.checked_mul(x))
}

fn permute(
    items: &[Value],
    k: usize,
    used: &mut [bool],
    current: &mut Vec<Value>,
    out: &mut Vec<Value>,
) {
    if current.len() == k {
        out.push(Value::Array(current.clone()));
        return;
    }
    for i in 0..items.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        current.push(items[i].clone());
        permute(items, k, used, current, out);
        current.pop();
        used[i] = false;
    }
}
