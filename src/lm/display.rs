//! Iteration table and final summary output.
//!
//! Output is line oriented and goes to a [`DisplaySink`]. The default sink
//! forwards every line to the `log` facade at info level; collecting into a
//! `Vec<String>` is handy in tests.

use log::info;

use super::config::DisplayLevel;
use super::convergence::StopReason;

/// Destination for display lines.
pub trait DisplaySink {
    /// Consume one line of output, without a trailing newline.
    fn line(&mut self, line: &str);
}

/// Sink forwarding each line to `log::info!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DisplaySink for LogSink {
    fn line(&mut self, line: &str) {
        info!("{}", line);
    }
}

impl DisplaySink for Vec<String> {
    fn line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Everything the final summary reports.
pub(crate) struct Summary {
    pub stop_reason: StopReason,
    pub iterations: usize,
    pub cost: f64,
    pub func_evals: usize,
    pub tol_x: f64,
    pub tol_f: f64,
}

/// Writes the iteration table and summary at a given display level.
pub(crate) struct IterationDisplay<'a> {
    level: DisplayLevel,
    sink: &'a mut dyn DisplaySink,
}

impl<'a> IterationDisplay<'a> {
    pub fn new(level: DisplayLevel, sink: &'a mut dyn DisplaySink) -> Self {
        Self { level, sink }
    }

    pub fn header(&mut self) {
        if self.level < DisplayLevel::Iter {
            return;
        }
        let mut line = format!("{:>5}  {:>15}", "Iters", "F(x)");
        if self.level >= DisplayLevel::IterDetailed {
            line.push_str(&format!("  {:>10}  {:>10}  {:>10}", "rho", "mu", "nu"));
        }
        self.sink.line(&line);
    }

    pub fn row(&mut self, iteration: usize, cost: f64, rho: f64, mu: f64, nu: f64) {
        if self.level < DisplayLevel::Iter {
            return;
        }
        let mut line = format!("{:>5}  {:>15.8e}", iteration, cost);
        if self.level >= DisplayLevel::IterDetailed {
            line.push_str(&format!("  {:>10.3e}  {:>10.3e}  {:>10.3e}", rho, mu, nu));
        }
        self.sink.line(&line);
    }

    pub fn summary(&mut self, summary: &Summary) {
        if self.level < DisplayLevel::Final {
            return;
        }
        let reason = match summary.stop_reason {
            StopReason::ParameterConverged => {
                format!("{} ({:e})", summary.stop_reason, summary.tol_x)
            }
            StopReason::ObjectiveConverged => {
                format!("{} ({:e})", summary.stop_reason, summary.tol_f)
            }
            other => other.to_string(),
        };
        self.sink.line(&format!(
            "Terminate in {} iterations: {}.",
            summary.iterations, reason
        ));
        if self.level >= DisplayLevel::FinalDetailed {
            self.sink.line(&format!(
                "Final objective: {:.8e}, function evaluations: {}",
                summary.cost, summary.func_evals
            ));
        }
    }
}
