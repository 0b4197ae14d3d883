//! Metrics dashboard page.

use std::collections::BTreeMap;
use std::fmt::Write;

fn escape_html(v: &str) -> String {
    v.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render(counters: &BTreeMap<String, String>, gauges: &BTreeMap<String, String>) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<body>\n<table>\n    <tr>\n        <th>Type</th>\n        <th>Name</th>\n        <th>Value</th>\n    </tr>\n",
    );
    let rows = counters
        .iter()
        .map(|(k, v)| ("Counter", k, v))
        .chain(gauges.iter().map(|(k, v)| ("Gauge", k, v)));
    for (kind, name, value) in rows {
        let _ = writeln!(
            out,
            "    <tr>\n        <td>{}</td>\n        <td>{}</td>\n        <td>{}</td>\n    </tr>",
            kind,
            escape_html(name),
            escape_html(value)
        );
    }
    out.push_str("</table>\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_escaped() {
        let mut gauges = BTreeMap::new();
        gauges.insert("<script>".to_string(), "1".to_string());
        let html = render(&BTreeMap::new(), &gauges);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
