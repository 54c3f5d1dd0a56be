//! HTML artifact generation
//!
//! Writes one self-contained document: the trace payload as embedded
//! JSON, one button per date/variable choice grouped into positional
//! control widgets, and the selector script. The script is a line-for-
//! line mirror of the transitions in [`crate::selector`]; change one and
//! you must change the other.

use crate::consolidate::ConsolidationMode;
use crate::discovery::DatedFile;
use crate::selector::{controls, Control, SelectorContext, SelectorState};
use crate::trace::{Trace, TraceLayout};
use chrono::Duration;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Everything the artifact embeds
pub struct ChartDocument {
    pub mode: ConsolidationMode,
    pub title_base: String,
    pub dates: Vec<DatedFile>,
    pub variables: Vec<String>,
    pub traces: Vec<Trace>,
    pub layout: TraceLayout,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    mode: &'static str,
    title_base: &'a str,
    dates: Vec<DateEntry>,
    variables: &'a [String],
    trace_ids: &'a [Vec<usize>],
    traces: &'a [Trace],
    initial_title: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DateEntry {
    key: String,
    /// Midnight of the day, chart-axis format
    day_start: String,
    /// Midnight of the next day; the window upper bound that keeps the
    /// end date inclusive of its full day
    next_day_start: String,
}

/// Write the artifact to a file
pub fn render_to_file(path: &Path, doc: &ChartDocument) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write(&mut file, doc)
}

/// Write the full HTML document
pub fn write<W: Write>(writer: &mut W, doc: &ChartDocument) -> io::Result<()> {
    let payload = build_payload(doc);
    let json = serde_json::to_string(&payload)?;
    // Keep the payload from terminating its own script tag
    let json = json.replace("</", "<\\/");

    let controls_html = build_controls(doc);

    write!(
        writer,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{page_title}</title>
    <script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
    <style>
        :root {{
            --bg: #f5f5f7;
            --card: #ffffff;
            --border: #d2d2d7;
            --text: #1d1d1f;
            --dim: #86868b;
            --accent: #007aff;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Helvetica Neue', Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--text);
            line-height: 1.5;
        }}
        .container {{ max-width: 1400px; margin: 0 auto; padding: 1.5rem 2rem; }}
        .controls {{
            display: flex;
            flex-wrap: wrap;
            gap: 1.5rem;
            margin-bottom: 1rem;
        }}
        .control-group {{
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 10px;
            padding: 0.75rem 1rem;
        }}
        .control-label {{
            color: var(--dim);
            font-size: 0.75rem;
            font-weight: 600;
            text-transform: uppercase;
            letter-spacing: 0.04em;
            margin-bottom: 0.5rem;
        }}
        .control-group button {{
            border: 1px solid var(--border);
            background: var(--card);
            border-radius: 6px;
            padding: 0.3rem 0.7rem;
            margin: 0 0.25rem 0.25rem 0;
            font-size: 0.8125rem;
            cursor: pointer;
        }}
        .control-group button.active {{
            background: var(--accent);
            border-color: var(--accent);
            color: #ffffff;
        }}
        #chart {{
            background: var(--card);
            border: 1px solid var(--border);
            border-radius: 10px;
        }}
    </style>
</head>
<body>
    <div class="container">
        <div class="controls" id="controls">
{controls_html}        </div>
        <div id="chart"></div>
    </div>

    <script>
    const data = {json};

    const state = {{
        startDate: 0,
        endDate: 0,
        variable: 0,
        previousVisibleTrace: 0
    }};

    const chart = document.getElementById('chart');

    function clampChoice(choice, count) {{
        return count === 0 ? 0 : Math.min(choice, count - 1);
    }}

    // Mirror of the selector transitions: clamp, recompute, two
    // visibility toggles, title, and (range mode) the axis window.
    function applyClick(controlIndex, choiceIndex) {{
        const kinds = data.mode === 'per-date'
            ? ['date', 'variable']
            : ['start', 'end', 'variable'];
        const kind = kinds[controlIndex];
        if (kind === undefined) return;

        if (kind === 'start') {{
            state.startDate = clampChoice(choiceIndex, data.dates.length);
            if (state.endDate < state.startDate) state.endDate = state.startDate;
        }} else if (kind === 'end') {{
            state.endDate = clampChoice(choiceIndex, data.dates.length);
            if (state.startDate > state.endDate) state.startDate = state.endDate;
        }} else if (kind === 'date') {{
            state.startDate = clampChoice(choiceIndex, data.dates.length);
            state.endDate = state.startDate;
        }} else {{
            state.variable = clampChoice(choiceIndex, data.variables.length);
        }}

        const show = data.mode === 'per-date'
            ? data.traceIds[state.startDate][state.variable]
            : data.traceIds[0][state.variable];
        const hide = state.previousVisibleTrace;
        state.previousVisibleTrace = show;

        Plotly.restyle(chart, {{visible: false}}, [hide]);
        Plotly.restyle(chart, {{visible: true}}, [show]);

        const relayout = {{'title.text': computeTitle()}};
        if (data.mode === 'range') {{
            relayout['xaxis.range'] = [
                data.dates[state.startDate].dayStart,
                data.dates[state.endDate].nextDayStart
            ];
        }}
        Plotly.relayout(chart, relayout);
        markActive();
    }}

    function computeTitle() {{
        const variable = data.variables[state.variable] || '';
        if (data.mode === 'per-date') {{
            const key = data.dates[state.startDate] ? data.dates[state.startDate].key : '';
            return data.titleBase + ' - ' + key + ' / ' + variable;
        }}
        const startKey = data.dates[state.startDate] ? data.dates[state.startDate].key : '';
        const endKey = data.dates[state.endDate] ? data.dates[state.endDate].key : '';
        return data.titleBase + ' - ' + variable + ' (' + startKey + ' to ' + endKey + ')';
    }}

    function markActive() {{
        const selected = data.mode === 'per-date'
            ? [state.startDate, state.variable]
            : [state.startDate, state.endDate, state.variable];
        document.querySelectorAll('#controls button[data-control]').forEach(btn => {{
            const control = parseInt(btn.dataset.control, 10);
            const choice = parseInt(btn.dataset.choice, 10);
            btn.classList.toggle('active', selected[control] === choice);
        }});
    }}

    // Single delegated "control clicked" event carrying
    // (controlIndex, choiceIndex)
    document.getElementById('controls').addEventListener('click', ev => {{
        const btn = ev.target.closest('button[data-control]');
        if (!btn) return;
        applyClick(parseInt(btn.dataset.control, 10), parseInt(btn.dataset.choice, 10));
    }});

    const plotTraces = data.traces.map(t => ({{
        x: t.x,
        y: t.y,
        mode: 'lines',
        type: 'scattergl',
        name: t.name,
        visible: t.visible,
        line: {{width: 1}},
        hovertemplate: t.hover
    }}));

    const layout = {{
        title: {{text: data.initialTitle}},
        xaxis: {{title: {{text: 'Timestamp'}}}},
        yaxis: {{title: {{text: 'Value'}}}},
        height: 700,
        showlegend: true,
        paper_bgcolor: '#ffffff',
        plot_bgcolor: '#ffffff'
    }};
    if (data.mode === 'range' && data.dates.length > 0) {{
        layout.xaxis.range = [data.dates[0].dayStart, data.dates[0].nextDayStart];
    }}

    Plotly.newPlot(chart, plotTraces, layout, {{responsive: true}});
    markActive();
    </script>
</body>
</html>"#,
        page_title = escape_html(&doc.title_base),
        controls_html = controls_html,
        json = json
    )?;

    Ok(())
}

fn build_payload(doc: &ChartDocument) -> Payload<'_> {
    let dates = doc
        .dates
        .iter()
        .map(|d| {
            let day_start = d.date.and_hms_opt(0, 0, 0).unwrap();
            DateEntry {
                key: d.date_key.clone(),
                day_start: day_start.format("%Y-%m-%d %H:%M:%S").to_string(),
                next_day_start: (day_start + Duration::days(1))
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            }
        })
        .collect();

    Payload {
        mode: doc.mode.as_str(),
        title_base: &doc.title_base,
        dates,
        variables: &doc.variables,
        trace_ids: doc.layout.id_table(),
        traces: &doc.traces,
        initial_title: initial_title(doc),
    }
}

/// Title for the untouched initial state, computed by the same machine
/// the script mirrors
fn initial_title(doc: &ChartDocument) -> String {
    let ctx = SelectorContext {
        mode: doc.mode,
        layout: &doc.layout,
        dates: &doc.dates,
        variables: &doc.variables,
        title_base: &doc.title_base,
    };
    // A variable click at choice 0 leaves the initial state in place
    let mut state = SelectorState::new();
    state.apply_click(&ctx, Control::Variable, 0).title
}

fn build_controls(doc: &ChartDocument) -> String {
    let mut html = String::new();
    for (control_idx, control) in controls(doc.mode).iter().enumerate() {
        let (label, choices): (&str, Vec<&str>) = match control {
            Control::StartDate => (
                "Start date",
                doc.dates.iter().map(|d| d.date_key.as_str()).collect(),
            ),
            Control::EndDate => (
                "End date",
                doc.dates.iter().map(|d| d.date_key.as_str()).collect(),
            ),
            Control::Date => (
                "Date",
                doc.dates.iter().map(|d| d.date_key.as_str()).collect(),
            ),
            Control::Variable => (
                "Variable",
                doc.variables.iter().map(String::as_str).collect(),
            ),
        };

        html.push_str("            <div class=\"control-group\">\n");
        html.push_str(&format!(
            "                <div class=\"control-label\">{}</div>\n",
            label
        ));
        for (choice_idx, choice) in choices.iter().enumerate() {
            html.push_str(&format!(
                "                <button data-control=\"{}\" data-choice=\"{}\">{}</button>\n",
                control_idx,
                choice_idx,
                escape_html(choice)
            ));
        }
        html.push_str("            </div>\n");
    }
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
