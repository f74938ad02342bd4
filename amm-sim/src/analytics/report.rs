//! HTML Report Generation with Chart.js

use crate::analytics::metrics::MetricsCalculator;
use crate::simulation::SimulationResults;
use anyhow::{Context, Result};
use minijinja::{context, Environment};
use std::fs;
use std::path::Path;
use tracing::info;

const REPORT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AMM Simulation Report - seed {{ config.seed }}</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
    <style>
        :root {
            --bg-primary: #0a0a0a;
            --bg-card: #1c1c1c;
            --text-primary: #ffffff;
            --text-secondary: #888888;
            --accent-green: #10b981;
            --accent-red: #ef4444;
        }
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: 'Inter', -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }
        .container { max-width: 1200px; margin: 0 auto; padding: 2rem; }
        header {
            text-align: center;
            padding: 3rem 2rem;
            background: linear-gradient(180deg, rgba(139, 92, 246, 0.15) 0%, transparent 100%);
            border-bottom: 1px solid rgba(255, 255, 255, 0.08);
            margin-bottom: 2rem;
        }
        header h1 { font-size: 2.5rem; font-weight: 800; }
        header .timestamp { font-size: 0.875rem; color: rgba(255,255,255,0.4); }
        .stats-grid {
            display: grid;
            grid-template-columns: repeat(3, 1fr);
            gap: 1.25rem;
            margin-bottom: 2rem;
        }
        .stat-card, .chart-card {
            background: var(--bg-card);
            border-radius: 1rem;
            padding: 1.75rem;
            border: 1px solid rgba(255, 255, 255, 0.06);
        }
        .chart-card { margin-bottom: 2rem; }
        .stat-card h3 {
            font-size: 0.75rem;
            text-transform: uppercase;
            letter-spacing: 0.1em;
            color: var(--text-secondary);
        }
        .stat-card .value { font-size: 2rem; font-weight: 700; }
        .stat-card.ok .value { color: var(--accent-green); }
        .stat-card.bad .value { color: var(--accent-red); }
        .chart-container { position: relative; height: 360px; width: 100%; }
        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 0.5rem; text-align: right; border-bottom: 1px solid rgba(255,255,255,0.06); }
        th:first-child, td:first-child { text-align: left; }
        footer { text-align: center; padding: 2rem; color: var(--text-secondary); }
    </style>
</head>
<body>
    <header>
        <h1>AMM Simulation Report</h1>
        <p class="timestamp">Generated: {{ generated_at }}</p>
    </header>

    <div class="container">
        <div class="stats-grid">
            <div class="stat-card">
                <h3>Steps</h3>
                <div class="value">{{ summary.steps }}</div>
            </div>
            <div class="stat-card">
                <h3>Accepted</h3>
                <div class="value">{{ summary.acceptance_rate|round(1) }}%</div>
            </div>
            <div class="stat-card">
                <h3>Swaps / Deposits / Withdrawals</h3>
                <div class="value">{{ summary.swaps }} / {{ summary.deposits }} / {{ summary.withdrawals }}</div>
            </div>
            <div class="stat-card">
                <h3>Swap Fees</h3>
                <div class="value">{{ summary.total_fees }}</div>
            </div>
            <div class="stat-card">
                <h3>Treasury Collected</h3>
                <div class="value">{{ summary.treasury_collected }}</div>
            </div>
            <div class="stat-card {% if violations %}bad{% else %}ok{% endif %}">
                <h3>Invariant Violations</h3>
                <div class="value">{{ violations|length }}</div>
            </div>
        </div>

        <div class="chart-card">
            <h3>Pools</h3>
            <table>
                <tr><th>Pool</th><th>Fee (bps)</th><th>Reserve 0</th><th>Reserve 1</th><th>Shares</th><th>Swaps</th><th>k growth</th></tr>
                {% for pool in pools %}
                <tr>
                    <td>pool#{{ pool.id }}</td>
                    <td>{{ pool.fee_bps }}</td>
                    <td>{{ pool.reserve0 }}</td>
                    <td>{{ pool.reserve1 }}</td>
                    <td>{{ pool.total_liquidity }}</td>
                    <td>{{ pool.swaps }}</td>
                    <td>{{ pool.k_growth_pct|round(4) }}%</td>
                </tr>
                {% endfor %}
            </table>
        </div>

        <div class="chart-card">
            <h3>k Relative to Genesis</h3>
            <div class="chart-container"><canvas id="kChart"></canvas></div>
        </div>

        <div class="chart-card">
            <h3>Cumulative Swap Fees</h3>
            <div class="chart-container"><canvas id="feeChart"></canvas></div>
        </div>

        <div class="chart-card">
            <h3>Rejections by Kind</h3>
            <div class="chart-container"><canvas id="rejectChart"></canvas></div>
        </div>

        {% if violations %}
        <div class="chart-card">
            <h3>Invariant Violations</h3>
            <ul>{% for v in violations %}<li>{{ v }}</li>{% endfor %}</ul>
        </div>
        {% endif %}
    </div>

    <footer>
        <p>Built with Rust + Chart.js</p>
    </footer>

    <script>
        Chart.defaults.color = '#888888';
        Chart.defaults.borderColor = 'rgba(255, 255, 255, 0.08)';
        const palette = ['#8b5cf6', '#22d3ee', '#10b981', '#f59e0b', '#ef4444'];

        new Chart(document.getElementById('kChart'), {
            type: 'line',
            data: {
                datasets: {{ k_series|safe }}.map((s, i) => ({
                    label: s.label,
                    data: s.points.map(p => ({ x: p.step, y: p.value })),
                    borderColor: palette[i % palette.length],
                    pointRadius: 0,
                    tension: 0.2
                }))
            },
            options: {
                responsive: true,
                maintainAspectRatio: false,
                scales: { x: { type: 'linear', title: { display: true, text: 'Step' } } }
            }
        });

        new Chart(document.getElementById('feeChart'), {
            type: 'line',
            data: {
                datasets: [{
                    label: 'Cumulative fees',
                    data: {{ fee_series|safe }}.map(p => ({ x: p.step, y: p.value })),
                    borderColor: '#f59e0b',
                    backgroundColor: 'rgba(245, 158, 11, 0.15)',
                    fill: true,
                    pointRadius: 0
                }]
            },
            options: {
                responsive: true,
                maintainAspectRatio: false,
                scales: { x: { type: 'linear', title: { display: true, text: 'Step' } } }
            }
        });

        new Chart(document.getElementById('rejectChart'), {
            type: 'bar',
            data: {
                labels: {{ reject_labels|safe }},
                datasets: [{
                    label: 'Rejected operations',
                    data: {{ reject_counts|safe }},
                    backgroundColor: 'rgba(139, 92, 246, 0.7)',
                    borderRadius: 6
                }]
            },
            options: {
                responsive: true,
                maintainAspectRatio: false,
                plugins: { legend: { display: false } }
            }
        });
    </script>
</body>
</html>
"#;

/// Render the HTML report for `results`
pub fn render_report(results: &SimulationResults) -> Result<String> {
    let k_series: Vec<serde_json::Value> = results
        .pools
        .iter()
        .map(|pool| {
            serde_json::json!({
                "label": format!("{} ({} bps)", pool.id, pool.fee_bps),
                "points": MetricsCalculator::k_growth(results, pool.id),
            })
        })
        .collect();
    let fee_series = MetricsCalculator::cumulative_fees(results);
    let rejections = MetricsCalculator::rejection_histogram(results);
    let reject_labels: Vec<&str> = rejections.iter().map(|b| b.label.as_str()).collect();
    let reject_counts: Vec<u32> = rejections.iter().map(|b| b.count).collect();

    // Pool ids render as plain numbers inside the table
    let pools: Vec<serde_json::Value> = results
        .pools
        .iter()
        .map(|pool| {
            serde_json::json!({
                "id": pool.id.0,
                "fee_bps": pool.fee_bps,
                "reserve0": pool.reserve0,
                "reserve1": pool.reserve1,
                "total_liquidity": pool.total_liquidity,
                "swaps": pool.swaps,
                "k_growth_pct": pool.k_growth_pct,
            })
        })
        .collect();

    let mut env = Environment::new();
    env.add_template("report.html", REPORT_TEMPLATE)
        .context("Failed to parse report template")?;
    let template = env.get_template("report.html")?;

    let html = template
        .render(context! {
            generated_at => results.generated_at,
            config => results.config,
            summary => results.summary,
            pools => pools,
            violations => results.invariant_violations,
            k_series => serde_json::to_string(&k_series)?,
            fee_series => serde_json::to_string(&fee_series)?,
            reject_labels => serde_json::to_string(&reject_labels)?,
            reject_counts => serde_json::to_string(&reject_counts)?,
        })
        .context("Failed to render report")?;

    Ok(html)
}

/// Generate an HTML report with interactive charts
pub fn generate_report(results: &SimulationResults, output_path: &Path) -> Result<()> {
    // Ensure output directory exists
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).context("Failed to create report directory")?;
    }

    let html = render_report(results)?;
    fs::write(output_path, html).context("Failed to write report file")?;

    info!("Report generated: {}", output_path.display());
    Ok(())
}
