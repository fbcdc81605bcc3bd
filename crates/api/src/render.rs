//! HTML Dashboard Rendering

use crate::report::{BatchReport, PredictionReport, WATERFALL_MAX_DISPLAY};
use explain::{FeatureContribution, SummaryView};
use feature_engine::{RawInput, FEATURE_SCHEMA};
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;margin:0;display:flex}\
aside{width:280px;padding:1rem;background:#f3f4f6;min-height:100vh}\
main{padding:1rem 2rem;flex:1}label{display:block;margin-top:.6rem;font-size:.85rem}\
input{width:100%}table{border-collapse:collapse}td,th{padding:.25rem .75rem;border-bottom:1px solid #ddd}\
.bar{display:inline-block;height:.8rem}.up{background:#ff0051}.down{background:#008bfb}\
.info{background:#e0f2fe;padding:.75rem;border-radius:4px}.error{background:#fee2e2;padding:.75rem}";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the full page: input form plus either results or an error
pub fn render_dashboard(raw: &RawInput, outcome: Result<&BatchReport, String>) -> String {
    let mut html = String::with_capacity(8 * 1024);
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
         <title>MachineGuard Predictive Maintenance</title><style>{STYLE}</style></head><body>"
    );

    render_form(&mut html, raw);

    html.push_str("<main><h1>MachineGuard Predictive Maintenance Dashboard</h1>");
    html.push_str("<p>Enter machine sensor data to predict status and fault type.</p>");
    match outcome {
        Ok(batch) => {
            for report in &batch.rows {
                render_report(&mut html, report);
            }
            html.push_str("<h2>Global Feature Importance (SHAP Summary)</h2>");
            render_summary(&mut html, &batch.summary);
        }
        Err(message) => {
            let _ = write!(html, "<div class=\"error\">Prediction failed: {}</div>", escape(&message));
        }
    }
    html.push_str("</main></body></html>");
    html
}

fn render_form(html: &mut String, raw: &RawInput) {
    html.push_str("<aside><h2>Input Machine Sensor Data</h2><form method=\"get\" action=\"/\">");
    for (name, value) in FEATURE_SCHEMA.numeric_names().iter().zip(raw.values()) {
        let _ = write!(
            html,
            "<label>{name}<input type=\"number\" step=\"any\" name=\"{name}\" value=\"{value}\"></label>",
            name = escape(name),
            value = value
        );
    }
    html.push_str("<p><button type=\"submit\">Predict</button></p></form></aside>");
}

fn render_report(html: &mut String, report: &PredictionReport) {
    html.push_str("<h2>Model Predictions</h2>");
    let _ = write!(
        html,
        "<p><b>Single-Class Model:</b> {}</p><p><b>Multi-Class Model Status:</b> {}</p>",
        report.binary_status.as_str(),
        report.multi_class_status.as_str()
    );
    if let Some(fault) = report.predicted_fault {
        let _ = write!(
            html,
            "<p><b>Predicted Fault Type:</b> {} ({})</p>",
            fault.as_str(),
            fault.description()
        );
    }

    html.push_str("<h2>Multi-Class Predicted Probabilities</h2>");
    html.push_str("<table><tr><th>Fault Type</th><th>Probability</th></tr>");
    for row in &report.probabilities {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td></tr>",
            row.fault_type.as_str(),
            row.percentage
        );
    }
    html.push_str("</table>");

    html.push_str("<h2>Feature Impact (SHAP)</h2>");
    render_force_plot(html, report);
    render_waterfall(html, report);
}

fn bar(contribution: f64, scale: f64) -> String {
    let width = if scale > 0.0 { (contribution.abs() / scale * 200.0).round() } else { 0.0 };
    let class = if contribution >= 0.0 { "up" } else { "down" };
    format!("<span class=\"bar {class}\" style=\"width:{width}px\"></span>")
}

fn render_contributions(html: &mut String, title: &str, contributions: &[FeatureContribution], scale: f64) {
    if contributions.is_empty() {
        return;
    }
    let _ = write!(html, "<h4>{}</h4><table>", escape(title));
    for c in contributions {
        let _ = write!(
            html,
            "<tr><td>{} = {:.3}</td><td>{:+.4}</td><td>{}</td></tr>",
            escape(&c.feature),
            c.value,
            c.contribution,
            bar(c.contribution, scale)
        );
    }
    html.push_str("</table>");
}

fn render_force_plot(html: &mut String, report: &PredictionReport) {
    let plot = &report.force_plot;
    let scale = plot
        .higher
        .iter()
        .chain(plot.lower.iter())
        .map(|c| c.contribution.abs())
        .fold(0.0, f64::max);

    let _ = write!(
        html,
        "<h3>Force plot: {}</h3><p>base value {:.4} &rarr; output {:.4}</p>",
        report.prediction.fault_class.as_str(),
        plot.base_value,
        plot.output_value
    );
    render_contributions(html, "Pushing higher", &plot.higher, scale);
    render_contributions(html, "Pushing lower", &plot.lower, scale);
}

fn render_waterfall(html: &mut String, report: &PredictionReport) {
    let waterfall = &report.waterfall;
    let scale = waterfall
        .steps
        .iter()
        .map(|s| s.contribution.abs())
        .fold(0.0, f64::max);

    let _ = write!(
        html,
        "<h3>Waterfall (top {})</h3><table><tr><th>Feature</th><th>Contribution</th><th></th><th>Running</th></tr>",
        WATERFALL_MAX_DISPLAY
    );
    let _ = write!(html, "<tr><td>E[f(x)]</td><td></td><td></td><td>{:.4}</td></tr>", waterfall.base_value);
    for step in &waterfall.steps {
        let label = match step.value {
            Some(value) => format!("{} = {:.3}", escape(&step.label), value),
            None => escape(&step.label),
        };
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{:+.4}</td><td>{}</td><td>{:.4}</td></tr>",
            label,
            step.contribution,
            bar(step.contribution, scale),
            step.end
        );
    }
    let _ = write!(html, "<tr><td>f(x)</td><td></td><td></td><td>{:.4}</td></tr></table>", waterfall.output_value);
}

/// Global importance table, or the notice explaining why it is absent
pub fn render_summary(html: &mut String, summary: &SummaryView) {
    match summary {
        SummaryView::Skipped { notice } => {
            let _ = write!(html, "<div class=\"info\">{}</div>", escape(notice));
        }
        SummaryView::Available(summary) => {
            let scale = summary
                .importance
                .first()
                .map(|i| i.mean_abs_contribution)
                .unwrap_or(0.0);
            let _ = write!(
                html,
                "<p>Mean |SHAP value| over {} rows</p><table>",
                summary.rows
            );
            for item in &summary.importance {
                let _ = write!(
                    html,
                    "<tr><td>{}</td><td>{:.4}</td><td>{}</td></tr>",
                    escape(&item.feature),
                    item.mean_abs_contribution,
                    bar(item.mean_abs_contribution, scale)
                );
            }
            html.push_str("</table>");
        }
    }
}
