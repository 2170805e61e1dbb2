//! Table rendering

use std::io;

use tabled::{
    builder::Builder,
    settings::{Alignment, Color, Style, object::{Columns, Rows}},
};
use thiserror::Error;

use crate::results::{OptimizationResult, PackingSummary, SelectedCategory, SolveStatus};

/// Errors that can occur when rendering a result.
#[derive(Debug, Error)]
pub enum RenderError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl OptimizationResult {
    /// Print the result as a table of shipped categories followed by a summary.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), RenderError> {
        let Some(solution) = self.solution() else {
            writeln!(out, "\nNo packing found: {}", status_label(self.status()))?;

            return Ok(());
        };

        let mut builder = Builder::default();

        push_header(&mut builder);

        for line in &solution.selected {
            push_line(&mut builder, line);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(1..7), Alignment::right());

        writeln!(out, "\n{table}")?;

        write_summary(&mut out, &solution.summary)?;

        Ok(())
    }
}

fn status_label(status: SolveStatus) -> &'static str {
    match status {
        SolveStatus::Optimal => "optimal",
        SolveStatus::Infeasible => "infeasible",
        SolveStatus::TimedOutNoSolution => "timed out without a solution",
    }
}

fn push_header(builder: &mut Builder) {
    builder.push_record([
        "Category",
        "Boxes",
        "Weight (kg)",
        "kg/box",
        "Value (A)",
        "Duty (B)",
        "Pieces",
    ]);
}

fn push_line(builder: &mut Builder, line: &SelectedCategory) {
    builder.push_record([
        line.name.clone(),
        line.boxes.to_string(),
        format!("{:.3}", line.total_weight),
        format!("{:.3}", line.avg_weight_per_box),
        format!("{:.2}", line.value_a),
        format!("{:.2}", line.tax_b),
        line.pieces.to_string(),
    ]);
}

fn write_summary(out: &mut impl io::Write, summary: &PackingSummary) -> Result<(), RenderError> {
    let ceiling = if summary.tax_ceiling_enforced {
        check_mark(summary.tax_ceiling_met)
    } else {
        "not enforced"
    };

    writeln!(out, " Categories:      {}", summary.selected_count)?;
    writeln!(out, " Total weight:    {:.3} kg", summary.total_weight)?;
    writeln!(out, " Total value:     {:.2}", summary.total_value_a)?;
    writeln!(out, " \x1b[1mTotal duty:\x1b[0m      {:.2}", summary.total_tax_b)?;
    writeln!(
        out,
        " Value density:   {:.4}/kg ({})",
        summary.value_density_a,
        check_mark(summary.value_floor_met)
    )?;
    writeln!(
        out,
        " Duty density:    {:.4}/kg ({ceiling})",
        summary.tax_density_b
    )?;
    writeln!(out, " Processing fee:  {:.2}", summary.minimum_processing_fee)?;
    writeln!(out)?;

    Ok(())
}

fn check_mark(met: bool) -> &'static str {
    if met { "met" } else { "NOT met" }
}
