//! Classification of a value against upper and lower levels.

use super::{render, Direction, LevelSpec, LevelsError};
use crate::api::{CheckOutput, CheckResult, Metric, State};
use crate::prediction::PredictionLookup;

/// Levels of one direction after predictions were looked up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ResolvedLevels {
    levels: Option<(f64, f64)>,
    prediction: Option<f64>,
    predictive: bool,
}

/// Classify `value` against fixed (warn, crit) levels of one direction.
///
/// Upper: `value >= crit` is CRIT, `value >= warn` is WARN.
/// Lower: `value <= crit` is CRIT, `value <= warn` is WARN.
pub fn check_fixed_levels(value: f64, levels: Option<(f64, f64)>, direction: Direction) -> State {
    let Some((warn, crit)) = levels else {
        return State::Ok;
    };
    match direction {
        Direction::Upper if value >= crit => State::Crit,
        Direction::Upper if value >= warn => State::Warn,
        Direction::Lower if value <= crit => State::Crit,
        Direction::Lower if value <= warn => State::Warn,
        _ => State::Ok,
    }
}

fn levels_text(levels: (f64, f64), direction: Direction, render: &dyn Fn(f64) -> String) -> String {
    let preposition = match direction {
        Direction::Upper => "at",
        Direction::Lower => "below",
    };
    format!(
        " (warn/crit {} {}/{})",
        preposition,
        render(levels.0),
        render(levels.1)
    )
}

/// Check a value against levels and render the verdict.
///
/// ```ignore
/// let outputs = CheckLevels::new(9.0)
///     .upper(&LevelSpec::fixed(7.0, 8.0))
///     .metric_name("temp")
///     .label("Temperature")
///     .evaluate()?;
/// ```
pub struct CheckLevels<'a> {
    value: f64,
    levels_upper: Option<&'a LevelSpec>,
    levels_lower: Option<&'a LevelSpec>,
    metric_name: Option<&'a str>,
    render: Option<&'a dyn Fn(f64) -> String>,
    label: Option<&'a str>,
    boundaries: Option<(f64, f64)>,
    notice_only: bool,
    predictions: Option<&'a dyn PredictionLookup>,
}

impl<'a> CheckLevels<'a> {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            levels_upper: None,
            levels_lower: None,
            metric_name: None,
            render: None,
            label: None,
            boundaries: None,
            notice_only: false,
            predictions: None,
        }
    }

    pub fn upper(mut self, levels: &'a LevelSpec) -> Self {
        self.levels_upper = Some(levels);
        self
    }

    pub fn lower(mut self, levels: &'a LevelSpec) -> Self {
        self.levels_lower = Some(levels);
        self
    }

    pub fn upper_opt(mut self, levels: Option<&'a LevelSpec>) -> Self {
        self.levels_upper = levels;
        self
    }

    pub fn lower_opt(mut self, levels: Option<&'a LevelSpec>) -> Self {
        self.levels_lower = levels;
        self
    }

    pub fn metric_name(mut self, name: &'a str) -> Self {
        self.metric_name = Some(name);
        self
    }

    pub fn render(mut self, render: &'a dyn Fn(f64) -> String) -> Self {
        self.render = Some(render);
        self
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn boundaries(mut self, min: f64, max: f64) -> Self {
        self.boundaries = Some((min, max));
        self
    }

    pub fn notice_only(mut self, notice_only: bool) -> Self {
        self.notice_only = notice_only;
        self
    }

    pub fn predictions(mut self, lookup: &'a dyn PredictionLookup) -> Self {
        self.predictions = Some(lookup);
        self
    }

    fn resolve(
        &self,
        spec: Option<&LevelSpec>,
        direction: Direction,
    ) -> Result<ResolvedLevels, LevelsError> {
        match spec {
            None | Some(LevelSpec::NoLevels) => Ok(ResolvedLevels::default()),
            Some(LevelSpec::Fixed { warn, crit }) => Ok(ResolvedLevels {
                levels: Some((*warn, *crit)),
                ..Default::default()
            }),
            Some(LevelSpec::Predictive(spec)) => {
                let metric = self.metric_name.ok_or(LevelsError::MissingMetricName)?;
                let lookup = self.predictions.ok_or(LevelsError::NoPredictionSource)?;
                let predicted =
                    lookup.lookup(metric, direction, &spec.params, spec.injected.as_ref())?;
                Ok(ResolvedLevels {
                    levels: predicted.prediction.and(predicted.levels),
                    prediction: predicted.prediction,
                    predictive: true,
                })
            }
        }
    }

    /// Evaluate: one result, then the value metric and any prediction metrics.
    pub fn evaluate(self) -> Result<Vec<CheckOutput>, LevelsError> {
        let upper = self.resolve(self.levels_upper, Direction::Upper)?;
        let lower = self.resolve(self.levels_lower, Direction::Lower)?;
        let render: &dyn Fn(f64) -> String = self.render.unwrap_or(&render::float);

        let upper_state = check_fixed_levels(self.value, upper.levels, Direction::Upper);
        let lower_state = check_fixed_levels(self.value, lower.levels, Direction::Lower);
        let state = upper_state.worse(lower_state);

        let mut text = render(self.value);
        if let Some(label) = self.label {
            text = format!("{}: {}", label, text);
        }
        text.push_str(&prediction_text(&upper, &lower, render));
        if let (State::Warn | State::Crit, Some(levels)) = (upper_state, upper.levels) {
            text.push_str(&levels_text(levels, Direction::Upper, render));
        }
        if let (State::Warn | State::Crit, Some(levels)) = (lower_state, lower.levels) {
            text.push_str(&levels_text(levels, Direction::Lower, render));
        }

        let unconfigured = |spec: Option<&LevelSpec>| spec.map_or(true, |s| !s.is_configured());
        let as_notice =
            self.notice_only || (unconfigured(self.levels_upper) && unconfigured(self.levels_lower));

        let mut outputs = vec![if as_notice {
            CheckResult::notice(state, text).into()
        } else {
            CheckResult::new(state, text).into()
        }];

        if let Some(name) = self.metric_name {
            outputs.push(
                Metric::new(name, self.value)
                    .with_levels(upper.levels)
                    .with_boundaries(self.boundaries)
                    .into(),
            );
            if let Some(prediction) = upper.prediction {
                outputs.push(Metric::new(format!("predict_{}", name), prediction).into());
            }
            if let Some(prediction) = lower.prediction {
                outputs.push(Metric::new(format!("predict_lower_{}", name), prediction).into());
            }
        }

        Ok(outputs)
    }
}

fn prediction_text(
    upper: &ResolvedLevels,
    lower: &ResolvedLevels,
    render: &dyn Fn(f64) -> String,
) -> String {
    match (upper.prediction, lower.prediction) {
        (Some(u), Some(l)) if u != l => format!(
            " (upper levels prediction: {}, lower levels prediction: {})",
            render(u),
            render(l)
        ),
        (Some(p), _) | (None, Some(p)) => format!(" (prediction: {})", render(p)),
        (None, None) if upper.predictive || lower.predictive => {
            " (no reference for prediction yet)".to_string()
        }
        (None, None) => String::new(),
    }
}

/// Check `value` against optional upper and lower levels with default rendering.
pub fn check_levels(
    value: f64,
    levels_upper: Option<&LevelSpec>,
    levels_lower: Option<&LevelSpec>,
) -> Result<Vec<CheckOutput>, LevelsError> {
    CheckLevels::new(value)
        .upper_opt(levels_upper)
        .lower_opt(levels_lower)
        .evaluate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::{
        InjectedParameters, MarginKind, Period, PredictedLevels, PredictionError,
        PredictionParameters,
    };

    struct FixedLookup(PredictedLevels, PredictedLevels);

    impl PredictionLookup for FixedLookup {
        fn lookup(
            &self,
            _metric: &str,
            direction: Direction,
            _params: &PredictionParameters,
            _injected: Option<&InjectedParameters>,
        ) -> Result<PredictedLevels, PredictionError> {
            Ok(match direction {
                Direction::Upper => self.0,
                Direction::Lower => self.1,
            })
        }
    }

    fn predictive() -> LevelSpec {
        LevelSpec::predictive(PredictionParameters {
            period: Period::Wday,
            horizon: 90,
            levels: (MarginKind::Absolute, (1.0, 2.0)),
            bound: None,
        })
    }

    fn predicted(prediction: f64, levels: (f64, f64)) -> PredictedLevels {
        PredictedLevels {
            prediction: Some(prediction),
            levels: Some(levels),
        }
    }

    fn only_result(outputs: &[CheckOutput]) -> &CheckResult {
        outputs[0].as_result().unwrap()
    }

    #[test]
    fn test_upper_and_lower_violated() {
        let upper = LevelSpec::fixed(7.0, 8.0);
        let lower = LevelSpec::fixed(10.0, 2.0);
        let outputs = check_levels(9.0, Some(&upper), Some(&lower)).unwrap();

        assert_eq!(
            outputs,
            vec![CheckOutput::Result(CheckResult::new(
                State::Crit,
                "9.00 (warn/crit at 7.00/8.00) (warn/crit below 10.00/2.00)"
            ))]
        );
    }

    #[test]
    fn test_no_levels_is_notice() {
        let outputs = check_levels(5.0, None, None).unwrap();
        assert_eq!(
            outputs,
            vec![CheckOutput::Result(CheckResult::notice(State::Ok, "5.00"))]
        );

        let outputs = check_levels(5.0, Some(&LevelSpec::NoLevels), None).unwrap();
        assert!(only_result(&outputs).is_notice());
    }

    #[test]
    fn test_fixed_boundaries() {
        assert_eq!(check_fixed_levels(8.0, Some((7.0, 8.0)), Direction::Upper), State::Crit);
        assert_eq!(check_fixed_levels(7.0, Some((7.0, 8.0)), Direction::Upper), State::Warn);
        assert_eq!(check_fixed_levels(6.9, Some((7.0, 8.0)), Direction::Upper), State::Ok);
        assert_eq!(check_fixed_levels(2.0, Some((5.0, 2.0)), Direction::Lower), State::Crit);
        assert_eq!(check_fixed_levels(5.0, Some((5.0, 2.0)), Direction::Lower), State::Warn);
        assert_eq!(check_fixed_levels(5.1, Some((5.0, 2.0)), Direction::Lower), State::Ok);
        assert_eq!(check_fixed_levels(1e9, None, Direction::Upper), State::Ok);
    }

    #[test]
    fn test_label_metric_and_notice_only() {
        let upper = LevelSpec::fixed(70.0, 80.0);
        let outputs = CheckLevels::new(75.0)
            .upper(&upper)
            .metric_name("temp")
            .label("Temperature")
            .render(&|v| format!("{:.1} °C", v))
            .boundaries(0.0, 100.0)
            .notice_only(true)
            .evaluate()
            .unwrap();

        let result = only_result(&outputs);
        assert_eq!(result.state, State::Warn);
        // notice results surface in the summary once they are not OK
        assert_eq!(result.summary, "Temperature: 75.0 °C (warn/crit at 70.0 °C/80.0 °C)");
        assert_eq!(
            outputs[1],
            CheckOutput::Metric(Metric {
                name: "temp".to_string(),
                value: 75.0,
                levels: Some((70.0, 80.0)),
                boundaries: Some((0.0, 100.0)),
            })
        );
    }

    #[test]
    fn test_predictive_upper() {
        let lookup = FixedLookup(predicted(6.5, (5.0, 6.0)), PredictedLevels::default());
        let spec = predictive();
        let outputs = CheckLevels::new(5.0)
            .upper(&spec)
            .metric_name("load")
            .predictions(&lookup)
            .evaluate()
            .unwrap();

        let result = only_result(&outputs);
        assert_eq!(result.state, State::Warn);
        assert_eq!(result.summary, "5.00 (prediction: 6.50) (warn/crit at 5.00/6.00)");
        assert_eq!(
            outputs[1].as_metric().unwrap().levels,
            Some((5.0, 6.0)),
            "metric carries the numeric levels actually used"
        );
        assert_eq!(outputs[2], CheckOutput::Metric(Metric::new("predict_load", 6.5)));
    }

    #[test]
    fn test_predictive_both_directions() {
        let spec = predictive();

        let differing = FixedLookup(predicted(6.0, (7.0, 8.0)), predicted(5.0, (4.0, 3.0)));
        let outputs = CheckLevels::new(5.5)
            .upper(&spec)
            .lower(&spec)
            .metric_name("load")
            .predictions(&differing)
            .evaluate()
            .unwrap();
        assert_eq!(
            only_result(&outputs).details,
            "5.50 (upper levels prediction: 6.00, lower levels prediction: 5.00)"
        );
        assert_eq!(outputs[3], CheckOutput::Metric(Metric::new("predict_lower_load", 5.0)));

        let same = FixedLookup(predicted(6.0, (7.0, 8.0)), predicted(6.0, (4.0, 3.0)));
        let outputs = CheckLevels::new(5.5)
            .upper(&spec)
            .lower(&spec)
            .metric_name("load")
            .predictions(&same)
            .evaluate()
            .unwrap();
        assert_eq!(only_result(&outputs).details, "5.50 (prediction: 6.00)");
    }

    #[test]
    fn test_predictive_without_reference() {
        let lookup = FixedLookup(PredictedLevels::default(), PredictedLevels::default());
        let spec = predictive();
        let outputs = CheckLevels::new(100.0)
            .upper(&spec)
            .metric_name("load")
            .predictions(&lookup)
            .evaluate()
            .unwrap();

        let result = only_result(&outputs);
        assert_eq!(result.state, State::Ok);
        assert_eq!(result.summary, "100.00 (no reference for prediction yet)");
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[1].as_metric().unwrap().levels, None);
    }

    #[test]
    fn test_predictive_requires_metric_name() {
        let lookup = FixedLookup(predicted(1.0, (2.0, 3.0)), PredictedLevels::default());
        let spec = predictive();
        let err = CheckLevels::new(1.0)
            .upper(&spec)
            .predictions(&lookup)
            .evaluate()
            .unwrap_err();
        assert!(matches!(err, LevelsError::MissingMetricName));
    }
}
