//! Rates of monotonically increasing counters.

use serde_json::Value;

use super::{levels_param, render_param};
use crate::checking::{CheckContext, CheckOutcome, CheckPlugin};
use crate::levels::render;

/// Per-second rate of one counter.
///
/// Section: `{"<counter>": <value>, ...}`, the item names the counter.
/// Parameters: `levels` and `levels_lower`, both level literals on the rate, and
/// `render` (`"iobandwidth"` for byte counters).
pub fn counters_plugin() -> CheckPlugin {
    CheckPlugin::new("counters", check_counters)
}

fn check_counters(
    ctx: &mut CheckContext<'_>,
    item: Option<&str>,
    params: &Value,
    section: &Value,
) -> CheckOutcome {
    let Some(counter) = item else {
        return Ok(Vec::new());
    };
    let Some(value) = section.get(counter).and_then(Value::as_f64) else {
        return Ok(Vec::new());
    };

    let rate = ctx.get_rate(counter, value, true)?;
    let upper = levels_param(params, "levels")?;
    let lower = levels_param(params, "levels_lower")?;
    let render = render_param(params, render::per_second)?;

    let outputs = ctx
        .check_levels(rate)
        .upper_opt(upper.as_ref())
        .lower_opt(lower.as_ref())
        .metric_name(counter)
        .render(&render)
        .label("Rate")
        .evaluate()?;
    Ok(outputs)
}
