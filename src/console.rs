//! Colorful console output for pick-route solves.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::{Duration, Instant};

use crate::solver::Solution;

/// ASCII art banner for server startup.
pub fn print_banner() {
    let banner = r#"
  ____  _      _    ____             _
 |  _ \(_) ___| | _|  _ \ ___  _   _| |_ ___
 | |_) | |/ __| |/ / |_) / _ \| | | | __/ _ \
 |  __/| | (__|   <|  _ < (_) | |_| | ||  __/
 |_|   |_|\___|_|\_\_| \_\___/ \__,_|\__\___|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Warehouse Picking".bright_cyan()
    );
}

/// Prints the loaded warehouse dimensions.
pub fn print_config(rows: usize, cols: usize, shelves: usize, blocked: usize) {
    println!(
        "{} {} {} Warehouse: grid ({}x{}), shelves ({}), blocked cells ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Layout]".bright_cyan(),
        rows.to_string().bright_yellow(),
        cols.to_string().bright_yellow(),
        shelves.to_formatted_string(&Locale::en).bright_yellow(),
        blocked.to_formatted_string(&Locale::en).bright_yellow()
    );
}

/// Prints "Solving started" with the stop count and search-space size.
pub fn print_solving_started(stops: usize, method: &str) {
    println!(
        "{} {} {} stops ({}), method ({}), problem scale ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        stops.to_formatted_string(&Locale::en).bright_yellow(),
        method.white().bold(),
        calculate_problem_scale(stops).bright_magenta()
    );
}

/// Prints a phase end message with metrics.
pub fn print_phase_end(phase_index: usize, phase: &PhaseStats) {
    let moves_per_sec = per_second(phase.moves_evaluated, phase.duration);
    println!(
        "{} {} {} {} phase ({}) ended: time spent ({}), move evaluation speed ({}/sec), step total ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        format!("[{}]", phase.name).bright_cyan(),
        phase.name.white().bold(),
        phase_index.to_string().yellow(),
        format_duration(phase.duration).yellow(),
        moves_per_sec.to_formatted_string(&Locale::en).bright_magenta().bold(),
        phase.steps_accepted.to_formatted_string(&Locale::en).white()
    );
}

/// Prints the solve summary box.
pub fn print_solving_ended(total_duration: Duration, stops: usize, solution: &Solution) {
    for (index, phase) in solution.phases.iter().enumerate() {
        print_phase_end(index, phase);
    }

    println!(
        "{} {} {} Solving ended: time spent ({}), distance ({}), phase total ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        format_duration(total_duration).yellow(),
        solution.distance.to_formatted_string(&Locale::en).bright_green(),
        solution.phases.len().to_string().white()
    );

    // 60 chars wide, 56 char content area
    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════╗".bright_cyan());

    let status_text = if solution.is_exact() {
        "✓ OPTIMAL ROUTE FOUND"
    } else if solution.budget_exhausted {
        "~ BEST ROUTE WITHIN BUDGET"
    } else {
        "✓ LOCALLY OPTIMAL ROUTE FOUND"
    };
    let status_colored = if solution.budget_exhausted {
        status_text.yellow().bold().to_string()
    } else {
        status_text.bright_green().bold().to_string()
    };
    let status_padding = 56usize.saturating_sub(status_text.chars().count());
    let left_pad = status_padding / 2;
    let right_pad = status_padding - left_pad;
    println!(
        "{}{}{}{}{}",
        "║".bright_cyan(),
        " ".repeat(left_pad),
        status_colored,
        " ".repeat(right_pad),
        "║".bright_cyan()
    );

    println!("{}", "╠══════════════════════════════════════════════════════════╣".bright_cyan());

    let rows = [
        ("Distance:", format!("{} steps", solution.distance.to_formatted_string(&Locale::en))),
        ("Stops:", stops.to_formatted_string(&Locale::en)),
        ("Method:", solution.method.as_str().to_string()),
        ("Improvements:", solution.improvements.to_formatted_string(&Locale::en)),
        ("Solving Time:", format!("{:.3}s", total_duration.as_secs_f64())),
    ];
    for (label, value) in rows {
        println!(
            "{}  {:<18}{:>36}  {}",
            "║".bright_cyan(),
            label,
            value,
            "║".bright_cyan()
        );
    }

    println!("{}", "╚══════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}

/// Formats a duration nicely.
///
/// ```
/// use std::time::Duration;
/// use warehouse_picking::console::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
/// ```
pub fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

fn per_second(count: u64, elapsed: Duration) -> u64 {
    if elapsed.as_secs_f64() > 0.0 {
        (count as f64 / elapsed.as_secs_f64()) as u64
    } else {
        0
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

/// Number of depot-first orderings, `(stops - 1)!`, in scientific form.
fn calculate_problem_scale(stops: usize) -> String {
    if stops <= 1 {
        return "1".to_string();
    }

    let log_scale: f64 = (2..stops).map(|k| (k as f64).log10()).sum();
    let exponent = log_scale.floor() as i32;
    let mantissa = 10f64.powf(log_scale - exponent as f64);

    format!("{:.3} × 10^{}", mantissa, exponent)
}

/// Metrics of one finished optimizer phase.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseStats {
    pub name: &'static str,
    pub duration: Duration,
    pub moves_evaluated: u64,
    pub steps_accepted: u64,
}

/// A timer for tracking phase durations and move counts.
///
/// Counting is silent; the planner decides whether to print the result.
#[derive(Debug)]
pub struct PhaseTimer {
    start: Instant,
    phase_name: &'static str,
    steps_accepted: u64,
    moves_evaluated: u64,
}

impl PhaseTimer {
    pub fn start(phase_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            phase_name,
            steps_accepted: 0,
            moves_evaluated: 0,
        }
    }

    pub fn record_accepted(&mut self) {
        self.steps_accepted += 1;
    }

    pub fn record_move(&mut self) {
        self.moves_evaluated += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn moves_evaluated(&self) -> u64 {
        self.moves_evaluated
    }

    pub fn steps_accepted(&self) -> u64 {
        self.steps_accepted
    }

    pub fn finish(self) -> PhaseStats {
        PhaseStats {
            name: self.phase_name,
            duration: self.start.elapsed(),
            moves_evaluated: self.moves_evaluated,
            steps_accepted: self.steps_accepted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_scale() {
        assert_eq!(calculate_problem_scale(0), "1");
        assert_eq!(calculate_problem_scale(1), "1");
        // 4! orderings of the picks after the depot
        assert_eq!(calculate_problem_scale(5), "2.400 × 10^1");
    }

    #[test]
    fn test_phase_timer_counts() {
        let mut timer = PhaseTimer::start("TwoOpt");
        timer.record_move();
        timer.record_move();
        timer.record_accepted();
        assert_eq!(timer.moves_evaluated(), 2);
        assert_eq!(timer.steps_accepted(), 1);

        let stats = timer.finish();
        assert_eq!(stats.name, "TwoOpt");
        assert_eq!(stats.moves_evaluated, 2);
        assert_eq!(stats.steps_accepted, 1);
    }

    #[test]
    fn test_per_second_zero_elapsed() {
        assert_eq!(per_second(100, Duration::ZERO), 0);
        assert_eq!(per_second(100, Duration::from_secs(2)), 50);
    }
}
