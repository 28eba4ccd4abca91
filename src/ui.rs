//! Terminal presentation: colours live in a [`Theme`] handed to each printer.

use crate::install::{InstalledTool, ResolvedInstall};
use crate::upgrade::{UpgradeCandidate, UpgradeReport};
use console::{measure_text_width, pad_str, Alignment, Style};
use std::io::{self, BufRead, Write};

pub const HOLD_MARKER: &str = "*HOLD_UPDATE*";

#[derive(Debug, Clone)]
pub struct Theme {
    pub heading: Style,
    pub name: Style,
    pub version: Style,
    pub url: Style,
    pub detail: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub prompt: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            heading: Style::new().green().bold(),
            name: Style::new().yellow(),
            version: Style::new().magenta(),
            url: Style::new().green(),
            detail: Style::new().cyan(),
            success: Style::new().blue().bold(),
            warning: Style::new().color256(208).bold(),
            error: Style::new().red().bold(),
            prompt: Style::new().color256(117).bold(),
        }
    }
}

impl Theme {
    /// A theme that renders everything unstyled.
    pub fn plain() -> Self {
        let plain = Style::new();
        Theme {
            heading: plain.clone(),
            name: plain.clone(),
            version: plain.clone(),
            url: plain.clone(),
            detail: plain.clone(),
            success: plain.clone(),
            warning: plain.clone(),
            error: plain.clone(),
            prompt: plain,
        }
    }
}

/// Render rows as aligned columns. Each cell is styled by its column's style.
pub fn render_table(headers: &[&str], rows: &[Vec<String>], styles: &[&Style]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| measure_text_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(measure_text_width(cell));
            }
        }
    }

    let mut out = String::new();
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad_str(h, *w, Alignment::Left, None).to_string())
        .collect();
    out.push_str(header_line.join("  ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, w))| {
                let padded = pad_str(cell, *w, Alignment::Left, None).to_string();
                match styles.get(i) {
                    Some(style) => style.apply_to(padded).to_string(),
                    None => padded,
                }
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

pub fn print_resolved(theme: &Theme, resolved: &ResolvedInstall) {
    let meta = &resolved.metadata;
    println!();
    println!("Repo     : {}", theme.detail.apply_to(&meta.full_name));
    println!("Stars    : {}", meta.star_count);
    println!("Language : {}", meta.primary_language);
    println!("Title    : {}", meta.description);
    println!();
    println!("{}", theme.heading.apply_to(format!("Install: {}", resolved.name())));

    let rows = vec![vec![
        resolved.name().to_string(),
        resolved.asset.filename.clone(),
        resolved.release.tag.clone(),
        format!("{:.1}", resolved.asset.size_mb()),
        resolved.asset.download_count.to_string(),
    ]];
    print!(
        "{}",
        render_table(
            &["Name", "Selected Item", "Version", "Size Mb", "Downloads"],
            &rows,
            &[&theme.name, &theme.detail, &theme.version, &theme.url, &theme.success],
        )
    );
}

pub fn print_installed(theme: &Theme, tools: &[InstalledTool]) {
    if tools.is_empty() {
        println!("No installed tools found");
        return;
    }

    println!("{}", theme.heading.apply_to("Installed tools"));
    let rows: Vec<Vec<String>> = tools
        .iter()
        .map(|t| {
            let version = if t.held {
                format!("{} {}", t.tag, HOLD_MARKER)
            } else {
                t.tag.clone()
            };
            vec![t.name.clone(), version, t.url.clone()]
        })
        .collect();
    print!(
        "{}",
        render_table(
            &["Name", "Version", "Repository"],
            &rows,
            &[&theme.name, &theme.version, &theme.url],
        )
    );
}

pub fn print_candidates(theme: &Theme, candidates: &[UpgradeCandidate]) {
    println!("\nFollowing tools will get upgraded.\n");
    let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
    println!("{}", theme.warning.apply_to(names.join(" ")));
}

pub fn print_report(theme: &Theme, report: &UpgradeReport) {
    for done in &report.installed {
        println!(
            "{} {} => {}",
            theme.success.apply_to(format!("Installed: {}", done.name)),
            done.from_tag,
            done.to_tag
        );
    }
    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            theme.error.apply_to("Failed:"),
            failure.name,
            failure.error
        );
    }
}

/// Ask a yes/no question on stdin. An empty answer counts as yes.
pub fn confirm(theme: &Theme, question: &str) -> io::Result<bool> {
    print!("{}", theme.prompt.apply_to(format!("{} (Y/n): ", question)));
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}
