//! Local checks: agent lines of the form `<state> <item> <perfdata> <text>`.
//!
//! `perfdata` is `-` or `name=value;warn;crit;min;max` entries joined by `|`.

use serde_json::Value;

use crate::api::CheckError;
use crate::checking::CheckPlugin;
use crate::legacy::{legacy_plugin, LegacyPerfdata, LegacyResult};

/// Section: a list of local check lines; the item selects the line.
pub fn local_plugin() -> CheckPlugin {
    legacy_plugin("local", |_, item, _, section| {
        let Some(item) = item else {
            return Ok(Vec::new());
        };
        let lines = section.as_array().map(Vec::as_slice).unwrap_or_default();
        for line in lines.iter().filter_map(Value::as_str) {
            let parsed = parse_local_line(line)?;
            if parsed.0 == item {
                return Ok(vec![parsed.1]);
            }
        }
        Ok(Vec::new())
    })
}

/// Split one line into its item and the result it reports.
pub fn parse_local_line(line: &str) -> Result<(String, LegacyResult), CheckError> {
    let mut fields = line.splitn(4, ' ');
    let (Some(state), Some(item), Some(perfdata)) = (fields.next(), fields.next(), fields.next()) else {
        return Err(CheckError::plugin(format!("Invalid local check line: {:?}", line)));
    };
    let state = state
        .parse::<i64>()
        .map_err(|_| CheckError::plugin(format!("Invalid state in local check line: {:?}", line)))?;
    let text = fields.next().map(str::to_string);

    let perfdata = match perfdata {
        "-" => Vec::new(),
        raw => raw.split('|').map(parse_perfdata).collect::<Result<Vec<_>, _>>()?,
    };

    Ok((item.to_string(), LegacyResult { state, text, perfdata }))
}

fn parse_perfdata(entry: &str) -> Result<LegacyPerfdata, CheckError> {
    let invalid = || CheckError::plugin(format!("Invalid perfdata: {:?}", entry));
    let (name, values) = entry.split_once('=').ok_or_else(invalid)?;
    let mut values = values.split(';');
    let value = values
        .next()
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(invalid)?;
    let mut optional = || values.next().and_then(|v| v.parse::<f64>().ok());

    Ok(LegacyPerfdata {
        name: name.to_string(),
        value,
        warn: optional(),
        crit: optional(),
        min: optional(),
        max: optional(),
    })
}
