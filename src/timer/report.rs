use super::stats::{CategoryStats, StatisticsSummary};
use chrono::{DateTime, Local};
use std::fmt;
use std::time::Duration;

const RULE: &str = "*********************";

/// Final numbers of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    pub dispatched: u64,
    pub matched: u64,
    pub spurious: u64,
    /// Pending entries never echoed
    pub unprocessed: usize,
    pub statistics: StatisticsSummary,
}

fn write_category(f: &mut fmt::Formatter<'_>, name: &str, stats: &Option<CategoryStats>) -> fmt::Result {
    match stats {
        Some(stats) => {
            write!(
                f,
                "{} Average: {:.1}ms (Max: {:.1}ms | Min: {:.1}ms) @ Stdev: ",
                name, stats.mean_ms, stats.max_ms, stats.min_ms
            )?;
            match stats.std_dev_ms {
                Some(std_dev) => writeln!(f, "{:.1}ms", std_dev),
                None => writeln!(f, "n/a"),
            }
        }
        None => writeln!(f, "{} no samples", name),
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "Run started {} and lasted {:.1}s",
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.elapsed.as_secs_f64()
        )?;
        writeln!(
            f,
            "Sent {} events, received {} successful events back and {} spurious events. {} remain unprocessed.",
            self.dispatched, self.matched, self.spurious, self.unprocessed
        )?;

        match &self.statistics {
            StatisticsSummary::Empty => writeln!(f, "No statistics gathered!")?,
            StatisticsSummary::Gathered { on, off, total } => {
                write_category(f, "on", on)?;
                write_category(f, "off", off)?;
                write_category(f, "total", total)?;
            }
        }
        write!(f, "{}", RULE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(statistics: StatisticsSummary) -> RunReport {
        RunReport {
            started_at: Local::now(),
            elapsed: Duration::from_secs(2),
            dispatched: 10,
            matched: 7,
            spurious: 1,
            unprocessed: 3,
            statistics,
        }
    }

    #[test]
    fn test_empty_report() {
        let text = report(StatisticsSummary::Empty).to_string();
        assert!(text.contains(
            "Sent 10 events, received 7 successful events back and 1 spurious events. 3 remain unprocessed."
        ));
        assert!(text.contains("No statistics gathered!"));
        assert!(!text.contains("Average"));
    }

    #[test]
    fn test_category_lines() {
        let stats = CategoryStats {
            count: 3,
            mean_ms: 2.0,
            max_ms: 3.0,
            min_ms: 1.0,
            std_dev_ms: Some(1.0),
        };
        let text = report(StatisticsSummary::Gathered {
            on: Some(stats.clone()),
            off: None,
            total: Some(stats),
        })
        .to_string();

        assert!(text.contains("on Average: 2.0ms (Max: 3.0ms | Min: 1.0ms) @ Stdev: 1.0ms"));
        assert!(text.contains("off no samples"));
        assert!(text.contains("total Average: 2.0ms"));
    }
}
