//! The `LevelSpec` tagged union and its literal forms.
//!
//! Accepted literals:
//! - `["no_levels", null]`
//! - `["fixed", [warn, crit]]`
//! - `["predictive", {"period": .., "horizon": .., "levels": .., "__injected__": ..}]`

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::LevelsError;
use crate::prediction::{InjectedParameters, PredictionParameters};

pub const INJECTED_KEY: &str = "__injected__";

/// Levels configured for one direction of a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum LevelSpec {
    NoLevels,
    Fixed { warn: f64, crit: f64 },
    Predictive(PredictiveSpec),
}

/// Predictive levels: parameters plus the location injected by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictiveSpec {
    pub params: PredictionParameters,
    pub injected: Option<InjectedParameters>,
}

impl LevelSpec {
    pub fn fixed(warn: f64, crit: f64) -> Self {
        LevelSpec::Fixed { warn, crit }
    }

    pub fn predictive(params: PredictionParameters) -> Self {
        LevelSpec::Predictive(PredictiveSpec {
            params,
            injected: None,
        })
    }

    /// Parse a level literal.
    pub fn from_value(value: &Value) -> Result<Self, LevelsError> {
        let (tag, payload) = match value.as_array().map(Vec::as_slice) {
            Some([Value::String(tag), payload]) => (tag.as_str(), payload),
            _ => {
                return Err(LevelsError::InvalidSpec(format!(
                    "expected [type, value], got {}",
                    value
                )))
            }
        };

        match tag {
            "no_levels" => match payload {
                Value::Null => Ok(LevelSpec::NoLevels),
                other => Err(LevelsError::InvalidSpec(format!(
                    "no_levels takes no value, got {}",
                    other
                ))),
            },
            "fixed" => parse_fixed(payload),
            "predictive" => parse_predictive(payload),
            other => Err(LevelsError::UnknownTag(other.to_string())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            LevelSpec::NoLevels => json!(["no_levels", null]),
            LevelSpec::Fixed { warn, crit } => json!(["fixed", [warn, crit]]),
            LevelSpec::Predictive(spec) => {
                let mut payload = serde_json::to_value(&spec.params).unwrap_or(Value::Null);
                if let (Some(injected), Value::Object(map)) = (&spec.injected, &mut payload) {
                    map.insert(
                        INJECTED_KEY.to_string(),
                        serde_json::to_value(injected).unwrap_or(Value::Null),
                    );
                }
                json!(["predictive", payload])
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, LevelSpec::NoLevels)
    }
}

fn parse_fixed(payload: &Value) -> Result<LevelSpec, LevelsError> {
    match payload.as_array().map(Vec::as_slice) {
        Some([warn, crit]) => match (warn.as_f64(), crit.as_f64()) {
            (Some(warn), Some(crit)) => Ok(LevelSpec::Fixed { warn, crit }),
            _ => Err(LevelsError::MalformedFixed(payload.to_string())),
        },
        _ => Err(LevelsError::MalformedFixed(payload.to_string())),
    }
}

fn parse_predictive(payload: &Value) -> Result<LevelSpec, LevelsError> {
    let Value::Object(map) = payload else {
        return Err(LevelsError::MalformedPredictive(payload.to_string()));
    };

    let mut params = map.clone();
    let injected = match params.remove(INJECTED_KEY) {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            serde_json::from_value::<InjectedParameters>(raw)
                .map_err(|e| LevelsError::MalformedPredictive(e.to_string()))?,
        ),
    };
    let params = serde_json::from_value::<PredictionParameters>(Value::Object(params))
        .map_err(|e| LevelsError::MalformedPredictive(e.to_string()))?;

    Ok(LevelSpec::Predictive(PredictiveSpec { params, injected }))
}

impl TryFrom<Value> for LevelSpec {
    type Error = LevelsError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        LevelSpec::from_value(&value)
    }
}

impl From<LevelSpec> for Value {
    fn from(spec: LevelSpec) -> Self {
        spec.to_value()
    }
}

/// Set `__injected__` on every predictive level literal found in `params`.
pub fn inject_prediction_location(params: &mut Value, injected: &InjectedParameters) {
    match params {
        Value::Array(items) => {
            let is_predictive = matches!(
                items.as_slice(),
                [Value::String(tag), Value::Object(_)] if tag == "predictive"
            );
            if is_predictive {
                if let Some(Value::Object(map)) = items.get_mut(1) {
                    map.insert(
                        INJECTED_KEY.to_string(),
                        serde_json::to_value(injected).unwrap_or(Value::Null),
                    );
                }
                return;
            }
            for item in items {
                inject_prediction_location(item, injected);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                inject_prediction_location(item, injected);
            }
        }
        _ => {}
    }
}
