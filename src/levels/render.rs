//! Render functions for values in check output.

/// Two decimal places, the default rendering.
pub fn float(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn integer(value: f64) -> String {
    format!("{:.0}", value)
}

pub fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Bytes with binary prefixes.
pub fn bytes(value: f64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut scaled = value;
    let mut unit = 0;
    while scaled.abs() >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{:.0} {}", scaled, UNITS[0])
    } else {
        format!("{:.2} {}", scaled, UNITS[unit])
    }
}

pub fn iobandwidth(value: f64) -> String {
    format!("{}/s", bytes(value))
}

pub fn per_second(value: f64) -> String {
    format!("{:.2}/s", value)
}

/// Render function by its configuration name.
pub fn by_name(name: &str) -> Option<fn(f64) -> String> {
    match name {
        "float" => Some(float),
        "integer" => Some(integer),
        "percent" => Some(percent),
        "bytes" => Some(bytes),
        "iobandwidth" => Some(iobandwidth),
        "per_second" => Some(per_second),
        _ => None,
    }
}
