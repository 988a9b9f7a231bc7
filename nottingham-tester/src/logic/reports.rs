use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::SimulationResult;

fn success_rate(results: &[SimulationResult]) -> f64 {
    let passed = results.iter().filter(|r| r.passed()).count();
    nottingham_game::numbers::ratio_or(passed, results.len(), 0.0) * 100.0
}

pub fn generate_console_report<W: Write + ?Sized>(
    writer: &mut W,
    results: &[SimulationResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Simulation Results Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "=============================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed()).count();
    writeln!(writer, "Total runs: {total}")?;
    writeln!(writer, "Passed: {}", passed.to_string().green())?;
    writeln!(writer, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(writer, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(writer, "Simulation time: {total_duration:?}")?;
    writeln!(writer)?;

    for result in results {
        let status = if result.passed() {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        let metrics = &result.metrics;
        writeln!(
            writer,
            "{} {} (seed {})",
            status,
            result.personality.key().bold(),
            result.seed
        )?;
        writeln!(
            writer,
            "   Rounds: {}  Opened: {}  Caught: {}  Catch rate: {:.0}%  Lie rate: {:.0}%",
            result.rounds_played,
            metrics.bags_opened,
            metrics.lies_caught,
            metrics.catch_rate() * 100.0,
            metrics.lie_rate(result.rounds_played) * 100.0
        )?;
        writeln!(
            writer,
            "   Bribes: {} accepted ({} gold)  Penalties: {} gold  Contraband through: {} gold",
            metrics.bribes_accepted, metrics.bribe_gold, metrics.penalty_gold, metrics.contraband_passed_value
        )?;
        writeln!(writer, "   Inspector reputation: {}", metrics.inspector_reputation)?;
        if !result.violations.is_empty() {
            writeln!(writer, "   Violations:")?;
            for violation in &result.violations {
                writeln!(writer, "     • {}", violation.red())?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn generate_json_report<W: Write + ?Sized>(writer: &mut W, results: &[SimulationResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report<W: Write + ?Sized>(writer: &mut W, results: &[SimulationResult]) -> Result<()> {
    writeln!(writer, "# Nottingham Simulation Results\n")?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed()).count();
    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Total runs**: {total}")?;
    writeln!(writer, "- **Passed**: {passed}")?;
    writeln!(writer, "- **Failed**: {}", total - passed)?;
    writeln!(writer, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(writer, "## Runs\n")?;
    writeln!(writer, "| Inspector | Seed | Rounds | Opened | Caught | Bribes | Bribe gold | Penalty gold |")?;
    writeln!(writer, "|---|---|---|---|---|---|---|---|")?;
    for result in results {
        let metrics = &result.metrics;
        writeln!(
            writer,
            "| {} {} | {} | {} | {} | {} | {} | {} | {} |",
            if result.passed() { "✅" } else { "❌" },
            result.personality,
            result.seed,
            result.rounds_played,
            metrics.bags_opened,
            metrics.lies_caught,
            metrics.bribes_accepted,
            metrics.bribe_gold,
            metrics.penalty_gold
        )?;
    }

    let failing: Vec<_> = results.iter().filter(|r| !r.passed()).collect();
    if !failing.is_empty() {
        writeln!(writer, "\n## Violations\n")?;
        for result in failing {
            writeln!(writer, "### {} seed {}\n", result.personality, result.seed)?;
            for violation in &result.violations {
                writeln!(writer, "- {violation}")?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}
