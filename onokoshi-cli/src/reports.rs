use anyhow::Result;
use colored::Colorize;
use std::io::Write;

use onokoshi_core::{Route, RouteSet, RouteStats, Run, RunSummary, StatsReport, TagStats};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn percent(stat: &RouteStats) -> f64 {
    stat.remaining_rate() * 100.0
}

fn group_label(group: Option<&str>) -> String {
    group.map(|g| format!("[{g}] ")).unwrap_or_default()
}

pub fn write_route_preview(out: &mut dyn Write, routes: &[Route]) -> Result<()> {
    if routes.is_empty() {
        writeln!(out, "No routes found.")?;
        return Ok(());
    }
    for route in routes {
        writeln!(
            out,
            "{:>3}. {}{} ({})",
            route.order + 1,
            group_label(route.group_name.as_deref()).cyan(),
            route.name,
            route.count
        )?;
    }
    let total: u64 = routes.iter().map(|r| u64::from(r.count)).sum();
    writeln!(out, "{} route(s), {total} elite(s)", routes.len())?;
    Ok(())
}

pub fn write_route_sets(out: &mut dyn Write, sets: &[RouteSet]) -> Result<()> {
    if sets.is_empty() {
        writeln!(out, "No route sets registered yet.")?;
        return Ok(());
    }
    for set in sets {
        writeln!(
            out,
            "{} {}  ({} routes, expected {}, registered {})",
            set.id.dimmed(),
            set.name.bold(),
            set.routes.len(),
            set.expected_elite_count,
            set.created_at.format(TIME_FORMAT)
        )?;
        let groups = set.group_names();
        if !groups.is_empty() {
            writeln!(out, "    groups: {}", groups.join(", "))?;
        }
    }
    Ok(())
}

pub fn write_run_summaries(out: &mut dyn Write, summaries: &[RunSummary]) -> Result<()> {
    if summaries.is_empty() {
        writeln!(out, "No runs recorded yet.")?;
        return Ok(());
    }
    for summary in summaries {
        let remnants = format!(
            "remnants: {} / {} route(s)",
            summary.remaining_count, summary.remaining_routes
        );
        let remnants = if summary.remaining_count == 0 {
            remnants.green()
        } else {
            remnants.red()
        };
        writeln!(
            out,
            "{} {}  {}  final {}  ({})",
            summary.id.dimmed(),
            summary.name.bold(),
            remnants,
            summary.final_count,
            summary.updated_at.format(TIME_FORMAT)
        )?;
    }
    Ok(())
}

pub fn write_run_detail(out: &mut dyn Write, run: &Run) -> Result<()> {
    writeln!(out, "{} {}", run.name.bold(), run.id.dimmed())?;
    writeln!(
        out,
        "FINAL COUNT {}  = {} (expected) - {} (remaining) - {} (shortage) + {} (addition)",
        run.final_count().to_string().bright_magenta().bold(),
        run.expected_elite_count,
        run.total_remaining(),
        run.tsurumi_shortage,
        run.adlib_addition
    )?;
    let clear = run.routes.iter().filter(|rr| !rr.has_remaining).count();
    writeln!(out, "clear: {clear} / {}", run.routes.len())?;
    for rr in &run.routes {
        let group = group_label(rr.group_name.as_deref());
        if rr.has_remaining {
            writeln!(
                out,
                "  ❌ {}{} x{}",
                group.cyan(),
                rr.route_name.red().bold(),
                rr.remaining_count
            )?;
            if !rr.comment.is_empty() {
                writeln!(out, "     💬 {}", rr.comment)?;
            }
        } else {
            writeln!(out, "  ✅ {}{}", group.cyan(), rr.route_name)?;
        }
    }
    Ok(())
}

fn console_view(
    out: &mut dyn Write,
    title: &str,
    stats: &[RouteStats],
    line: impl Fn(&RouteStats) -> String,
) -> Result<()> {
    writeln!(out, "{}", title.bright_yellow().bold())?;
    if stats.is_empty() {
        writeln!(out, "   (none)")?;
    }
    for (rank, stat) in stats.iter().enumerate() {
        writeln!(out, "   {}. {}  {}", rank + 1, stat.route_name.bold(), line(stat))?;
    }
    writeln!(out)?;
    Ok(())
}

fn rate_line(stat: &RouteStats) -> String {
    format!(
        "{} / {} ({:.1}%)",
        stat.remaining_runs,
        stat.total_runs,
        percent(stat)
    )
}

fn recent_line(stat: &RouteStats) -> String {
    stat.last_remaining_timestamp
        .map(|ts| ts.format(TIME_FORMAT).to_string())
        .unwrap_or_default()
}

fn volume_line(stat: &RouteStats) -> String {
    format!("{} remnant(s)", stat.total_remaining_count)
}

fn tag_lines(tags: &[TagStats]) -> Vec<String> {
    tags.iter()
        .enumerate()
        .map(|(rank, tag)| format!("{}. {} x{}", rank + 1, tag.tag, tag.count))
        .collect()
}

pub fn generate_console_report(out: &mut dyn Write, report: &StatsReport) -> Result<()> {
    writeln!(out, "{}", "📊 Remnant Statistics".bright_cyan().bold())?;
    writeln!(out, "{}", "=====================".cyan())?;
    if report.is_empty() {
        writeln!(out, "No runs recorded yet.")?;
        return Ok(());
    }
    writeln!(out, "Routes tracked: {}", report.routes.len())?;
    writeln!(out)?;

    console_view(out, "🕒 Recent remnants", &report.recent, recent_line)?;
    console_view(out, "🔥 Frequent remnants", &report.frequent, rate_line)?;
    console_view(out, "📦 Most remnants", &report.voluminous, volume_line)?;
    console_view(out, "🍀 Rare remnants", &report.rare, rate_line)?;

    writeln!(out, "{}", "🏷️  Tags".bright_yellow().bold())?;
    if report.tags.is_empty() {
        writeln!(out, "   (none)")?;
    }
    for line in tag_lines(&report.tags) {
        writeln!(out, "   {line}")?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, report: &StatsReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

fn markdown_view(
    out: &mut dyn Write,
    title: &str,
    stats: &[RouteStats],
    line: impl Fn(&RouteStats) -> String,
) -> Result<()> {
    writeln!(out, "## {title}\n")?;
    if stats.is_empty() {
        writeln!(out, "_None._\n")?;
        return Ok(());
    }
    for (rank, stat) in stats.iter().enumerate() {
        writeln!(out, "{}. **{}**: {}", rank + 1, stat.route_name, line(stat))?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, report: &StatsReport) -> Result<()> {
    writeln!(out, "# Onokoshi Statistics\n")?;
    if report.is_empty() {
        writeln!(out, "_No runs recorded yet._")?;
        return Ok(());
    }
    writeln!(out, "- **Routes tracked**: {}\n", report.routes.len())?;
    markdown_view(out, "Recent remnants", &report.recent, recent_line)?;
    markdown_view(out, "Frequent remnants", &report.frequent, rate_line)?;
    markdown_view(out, "Most remnants", &report.voluminous, volume_line)?;
    markdown_view(out, "Rare remnants", &report.rare, rate_line)?;
    writeln!(out, "## Tags\n")?;
    if report.tags.is_empty() {
        writeln!(out, "_None._")?;
    }
    for line in tag_lines(&report.tags) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
