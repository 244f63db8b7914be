use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use flowmap_cli::pipeline::MapOutcome;
use flowmap_map::ContextStatistics;

/// Source contexts shown in the coverage table.
const WORST_CONTEXTS: usize = 10;

pub fn print_summary(outcome: &MapOutcome) {
    let flowmap = &outcome.flowmap;
    println!("Source: {} ({} flows)", outcome.source_id, flowmap.source_flows().len());
    println!("Target: {} ({} flows)", outcome.target_id, flowmap.target_flows().len());
    for path in &outcome.outputs {
        println!("Wrote: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rule"),
        header_cell("Matches"),
        header_cell("Unmatched after"),
        header_cell("Time (ms)"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=3 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for summary in flowmap.rule_summaries() {
        table.add_row(vec![
            Cell::new(&summary.name),
            count_cell(summary.matches),
            Cell::new(summary.unmatched_remaining),
            Cell::new(format!("{:.1}", summary.elapsed.as_secs_f64() * 1000.0)),
        ]);
    }
    let unmatched = flowmap.unmatched_source().len();
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(flowmap.matches().len()).add_attribute(Attribute::Bold),
        Cell::new(unmatched).add_attribute(Attribute::Bold),
        Cell::new(format!("{:.1}", outcome.elapsed.as_secs_f64() * 1000.0))
            .add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    let worst: Vec<ContextStatistics> = flowmap
        .matched_source_statistics()
        .into_iter()
        .filter(|row| row.matched < row.total)
        .take(WORST_CONTEXTS)
        .collect();
    if !worst.is_empty() {
        print_coverage_table(&worst);
    }
}

fn print_coverage_table(rows: &[ContextStatistics]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source context"),
        header_cell("Matched"),
        header_cell("Total"),
        header_cell("%"),
    ]);
    apply_table_style(&mut table);
    for index in 1..=3 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.context),
            Cell::new(row.matched),
            Cell::new(row.total),
            percent_cell(row.percent),
        ]);
    }
    println!("Least covered source contexts:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth);
}

pub fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize) -> Cell {
    if count == 0 {
        Cell::new(count).fg(Color::DarkGrey)
    } else {
        Cell::new(count).fg(Color::Green)
    }
}

fn percent_cell(percent: f64) -> Cell {
    let color = if percent < 50.0 {
        Color::Red
    } else {
        Color::Yellow
    };
    Cell::new(format!("{percent:.1}")).fg(color)
}
