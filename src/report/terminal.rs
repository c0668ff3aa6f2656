use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{Aggregation, CompatibilitySet, DependencyStatus, Verdict};

fn header() {
    println!(
        "\n {} v{}\n",
        "caniusepypy".bold(),
        env!("CARGO_PKG_VERSION")
    );
}

/// Render the compatibility set with a summary of the overrides that went into it.
pub fn render_projects(aggregation: &Aggregation, verbose: bool, quiet: bool) {
    if quiet {
        println!(
            "Projects: {}  Overrides: {}  Stale: {}",
            aggregation.projects.len().to_string().green(),
            aggregation.applied.len(),
            aggregation.stale.len().to_string().yellow(),
        );
        return;
    }

    header();
    for name in aggregation.sorted() {
        println!("   {}", name);
    }
    println!();

    if verbose && !aggregation.applied.is_empty() {
        println!(" {} Overrides applied:\n", "[OVERRIDE]".cyan().bold());
        for entry in &aggregation.applied {
            println!("   {}", entry);
        }
        println!();
    }

    if !aggregation.stale.is_empty() {
        println!(
            " {} Overrides already found by classifier search:\n",
            "[STALE]".yellow().bold()
        );
        for name in &aggregation.stale {
            println!("   {}", name);
        }
        println!();
    }

    println!(
        " {} {} projects support PyPy ({} from overrides)",
        "✓".green(),
        aggregation.projects.len(),
        aggregation.applied.len()
    );
}

/// Render the per-dependency verdicts of a `check` run.
pub fn render_check(statuses: &[DependencyStatus], quiet: bool) {
    let count = |verdict: Verdict| statuses.iter().filter(|s| s.verdict == verdict).count();
    let compatible = count(Verdict::Compatible);
    let pure = count(Verdict::Pure);
    let blocking = count(Verdict::Blocking);

    if quiet {
        println!(
            "Total: {}  Compatible: {}  Pure: {}  Blocking: {}",
            statuses.len(),
            compatible.to_string().green(),
            pure.to_string().cyan(),
            blocking.to_string().red(),
        );
        return;
    }

    header();
    render_table(statuses);
    println!();

    if blocking == 0 {
        println!(" {} You can use PyPy with all {} dependencies", "✓".green(), statuses.len());
    } else {
        println!(
            " {} {} of {} dependencies block you from using PyPy",
            "✗".red(),
            blocking,
            statuses.len()
        );
    }
}

fn render_table(statuses: &[DependencyStatus]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Requirement").add_attribute(Attribute::Bold),
            Cell::new("Project").add_attribute(Attribute::Bold),
            Cell::new("Verdict").add_attribute(Attribute::Bold),
        ]);

    for status in statuses {
        let (verdict_str, verdict_color) = match status.verdict {
            Verdict::Compatible => ("✓ compatible", Color::Green),
            Verdict::Pure => ("✓ pure", Color::Cyan),
            Verdict::Blocking => ("✗ blocking", Color::Red),
        };

        table.add_row(vec![
            Cell::new(&status.requirement),
            Cell::new(&status.name),
            Cell::new(verdict_str)
                .fg(verdict_color)
                .set_alignment(CellAlignment::Center),
        ]);
    }

    println!("{}", table);
}

/// Render every project name on the index.
pub fn render_all(projects: &CompatibilitySet, count_only: bool) {
    if !count_only {
        let mut names: Vec<&String> = projects.iter().collect();
        names.sort_unstable();
        for name in names {
            println!("{}", name);
        }
    }
    println!("{} projects on the index", projects.len().to_string().bold());
}
