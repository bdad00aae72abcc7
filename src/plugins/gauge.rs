//! Plain numeric values, optionally averaged, against fixed or predictive levels.

use serde_json::Value;

use super::{levels_param, render_param};
use crate::api::{CheckResult, State};
use crate::checking::{CheckContext, CheckOutcome, CheckPlugin, NodeSections};
use crate::levels::render;

/// Section: `{"value": <number>}`, or `{"<item>": <number>, ...}` for itemized services.
///
/// Parameters:
/// - `levels_upper`, `levels_lower`: level literals
/// - `metric`: metric name, `"value"` if unset (needed for predictive levels)
/// - `average`: minutes to average the value over; unsetting it drops the stored average
/// - `render`: `"float"` if unset, or `"percent"`, `"bytes"`, ...
///
/// On clusters the native mode reports the sum over all nodes.
pub fn gauge_plugin() -> CheckPlugin {
    CheckPlugin::new("gauge", check_gauge).with_cluster_check(cluster_check_gauge)
}

fn gauge_value(item: Option<&str>, section: &Value) -> Option<f64> {
    section.get(item.unwrap_or("value")).and_then(Value::as_f64)
}

fn evaluate_gauge(ctx: &mut CheckContext<'_>, params: &Value, value: f64, label: &str) -> CheckOutcome {
    let upper = levels_param(params, "levels_upper")?;
    let lower = levels_param(params, "levels_lower")?;
    let metric = params.get("metric").and_then(Value::as_str).unwrap_or("value");
    let render = render_param(params, render::float)?;

    let mut outputs = Vec::new();
    let (value, label) = match params.get("average").and_then(Value::as_f64) {
        Some(minutes) => {
            outputs.push(CheckResult::notice(State::Ok, format!("{}: {:.2}", label, value)).into());
            let averaged = ctx.get_average(metric, value, minutes);
            (averaged, format!("{} (averaged over {} min)", label, minutes))
        }
        None => {
            ctx.value_store().remove(metric);
            (value, label.to_string())
        }
    };

    outputs.extend(
        ctx.check_levels(value)
            .upper_opt(upper.as_ref())
            .lower_opt(lower.as_ref())
            .metric_name(metric)
            .render(&render)
            .label(&label)
            .evaluate()?,
    );
    Ok(outputs)
}

fn check_gauge(ctx: &mut CheckContext<'_>, item: Option<&str>, params: &Value, section: &Value) -> CheckOutcome {
    let Some(value) = gauge_value(item, section) else {
        return Ok(Vec::new());
    };
    evaluate_gauge(ctx, params, value, "Value")
}

fn cluster_check_gauge(
    ctx: &mut CheckContext<'_>,
    item: Option<&str>,
    params: &Value,
    sections: &NodeSections,
) -> CheckOutcome {
    let values: Vec<f64> = sections
        .iter()
        .filter_map(|(_, section)| gauge_value(item, section))
        .collect();
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let label = format!("Total over {} node{}", values.len(), if values.len() == 1 { "" } else { "s" });
    evaluate_gauge(ctx, params, values.iter().sum(), &label)
}
