//! SVG rendering of comparative equity curves.

use crate::domain::portfolio::EquitySnapshot;

const WIDTH: f64 = 900.0;
const HEIGHT: f64 = 450.0;
const PADDING: f64 = 50.0;
const LEGEND_WIDTH: f64 = 180.0;
const BASELINE: f64 = 100.0;
const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf",
];

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Equity rescaled so the first snapshot equals 100.
pub fn normalize(curve: &[EquitySnapshot]) -> Vec<f64> {
    match curve.first() {
        Some(first) if first.total_capital > 0.0 => curve
            .iter()
            .map(|s| s.total_capital / first.total_capital * BASELINE)
            .collect(),
        _ => Vec::new(),
    }
}

/// One line per named curve, normalized to 100, with a dashed baseline.
pub fn comparative_chart(series: &[(&str, &[EquitySnapshot])]) -> String {
    let normalized: Vec<(&str, Vec<f64>)> = series
        .iter()
        .map(|(name, curve)| (*name, normalize(curve)))
        .filter(|(_, values)| !values.is_empty())
        .collect();

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH:.0}" height="{HEIGHT:.0}" viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}">
<rect width="100%" height="100%" fill="white"/>
"#
    );

    if normalized.is_empty() {
        svg.push_str(&format!(
            "<text x=\"{:.0}\" y=\"{:.0}\" text-anchor=\"middle\">No equity data available.</text>\n</svg>\n",
            WIDTH / 2.0,
            HEIGHT / 2.0
        ));
        return svg;
    }

    let (min, max) = normalized
        .iter()
        .flat_map(|(_, v)| v.iter().copied())
        .fold((BASELINE, BASELINE), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let longest = normalized.iter().map(|(_, v)| v.len()).max().unwrap_or(1);

    let plot_width = WIDTH - 2.0 * PADDING - LEGEND_WIDTH;
    let plot_height = HEIGHT - 2.0 * PADDING;
    let range = max - min;
    let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };
    let scale_x = if longest > 1 {
        plot_width / (longest - 1) as f64
    } else {
        0.0
    };
    let y_of = |v: f64| HEIGHT - PADDING - (v - min) * scale_y;

    svg.push_str(&format!(
        "<text x=\"{:.0}\" y=\"{:.0}\" text-anchor=\"middle\" font-size=\"16\">Strategy comparison (normalized to 100)</text>\n",
        PADDING + plot_width / 2.0,
        PADDING / 2.0
    ));
    svg.push_str(&format!(
        "<line x1=\"{p:.0}\" y1=\"{p:.0}\" x2=\"{p:.0}\" y2=\"{b:.0}\" stroke=\"black\"/>\n\
         <line x1=\"{p:.0}\" y1=\"{b:.0}\" x2=\"{r:.0}\" y2=\"{b:.0}\" stroke=\"black\"/>\n",
        p = PADDING,
        b = HEIGHT - PADDING,
        r = PADDING + plot_width
    ));
    for (value, anchor) in [(max, "max"), (min, "min")] {
        svg.push_str(&format!(
            "<text class=\"axis-{anchor}\" x=\"{:.0}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\">{value:.1}</text>\n",
            PADDING - 5.0,
            y_of(value) + 4.0
        ));
    }
    svg.push_str(&format!(
        "<line class=\"baseline\" x1=\"{:.0}\" y1=\"{y:.1}\" x2=\"{:.0}\" y2=\"{y:.1}\" stroke=\"gray\" stroke-dasharray=\"6,4\"/>\n",
        PADDING,
        PADDING + plot_width,
        y = y_of(BASELINE)
    ));

    for (i, (name, values)) in normalized.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let points: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(j, v)| format!("{:.1},{:.1}", PADDING + j as f64 * scale_x, y_of(*v)))
            .collect();
        svg.push_str(&format!(
            "<polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\" points=\"{}\"/>\n",
            points.join(" ")
        ));

        let legend_y = PADDING + 20.0 * i as f64;
        let legend_x = WIDTH - LEGEND_WIDTH;
        svg.push_str(&format!(
            "<rect x=\"{legend_x:.0}\" y=\"{:.0}\" width=\"12\" height=\"12\" fill=\"{color}\"/>\n\
             <text x=\"{:.0}\" y=\"{:.0}\" font-size=\"12\">{}</text>\n",
            legend_y - 10.0,
            legend_x + 18.0,
            legend_y,
            escape(name)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}
