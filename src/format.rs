//! Rust-style diagnostic formatter
//!
//! ```text
//! error[E010]: Unable to find type Positon
//!  --> schema/app.schema:3:27
//!   |
//! 3 | component Thing { id = 1; Positon p = 1; }
//!   |                           ^^^^^^^ did you mean 'Position'?
//! ```

use std::path::Path;

use schema_core::{Diagnostic, Severity};

/// Format diagnostics like Rust compiler output
pub struct RustStyleFormatter;

impl RustStyleFormatter {
    /// Format a batch of diagnostics with source context
    pub fn format(source: &str, path: &Path, diagnostics: &[Diagnostic]) -> String {
        if diagnostics.is_empty() {
            return String::new();
        }

        let lines: Vec<&str> = source.lines().collect();
        let mut output = String::new();

        for diag in diagnostics {
            output.push_str(&Self::format_one(diag, path, &lines));
            output.push('\n');
        }

        output.push_str(&Self::summary(diagnostics));
        output
    }

    /// "aborting due to ..." line, empty when there is nothing to report
    pub fn summary(diagnostics: &[Diagnostic]) -> String {
        let error_count = diagnostics.iter().filter(|d| d.is_error()).count();
        let warning_count = diagnostics.iter().filter(|d| d.is_warning()).count();

        let mut output = String::new();
        if error_count > 0 {
            output.push_str(&format!(
                "error: aborting due to {} previous error{}",
                error_count,
                plural(error_count)
            ));
            if warning_count > 0 {
                output.push_str(&format!(
                    "; {} warning{} emitted",
                    warning_count,
                    plural(warning_count)
                ));
            }
            output.push('\n');
        } else if warning_count > 0 {
            output.push_str(&format!(
                "warning: {} warning{} emitted\n",
                warning_count,
                plural(warning_count)
            ));
        }
        output
    }

    fn format_one(diag: &Diagnostic, path: &Path, lines: &[&str]) -> String {
        let mut out = String::new();

        // Header: error[E030]: message
        out.push_str(&format!(
            "{}[{}]: {}\n",
            severity_label(diag.severity),
            diag.code.as_str(),
            diag.message
        ));

        let Some(span) = &diag.span else {
            out.push_str(&format!(" --> {}\n", path.display()));
            return out;
        };

        // Location: --> file:1:25
        out.push_str(&format!(
            " --> {}:{}:{}\n",
            path.display(),
            span.start_line,
            span.start_col
        ));

        let line_idx = span.start_line.saturating_sub(1) as usize;
        if let Some(source_line) = lines.get(line_idx) {
            let width = span.start_line.to_string().len();
            let offset = span.start_col.saturating_sub(1) as usize;
            let carets = if span.end_line == span.start_line {
                span.end_col.saturating_sub(span.start_col).max(1) as usize
            } else {
                source_line.chars().count().saturating_sub(offset).max(1)
            };
            let label = diag
                .suggested_fix
                .as_ref()
                .map(|fix| format!(" {}", fix.description))
                .unwrap_or_default();

            out.push_str(&format!("{:width$} |\n", "", width = width));
            out.push_str(&format!("{} | {}\n", span.start_line, source_line));
            out.push_str(&format!(
                "{:width$} | {:offset$}{}{}\n",
                "",
                "",
                "^".repeat(carets),
                label,
                width = width,
                offset = offset
            ));
        }

        for related in &diag.related {
            out.push_str(&format!(
                "   = note: {} at {}:{}:{}\n",
                related.message,
                path.display(),
                related.span.start_line,
                related.span.start_col
            ));
        }

        out
    }

    /// Format as compact single-line errors (for logs)
    pub fn format_compact(path: &Path, diagnostics: &[Diagnostic]) -> String {
        diagnostics
            .iter()
            .map(|d| {
                let (line, col) = d
                    .span
                    .as_ref()
                    .map_or((0, 0), |s| (s.start_line, s.start_col));
                format!(
                    "{}:{}:{}: {} [{}] {}",
                    path.display(),
                    line,
                    col,
                    severity_label(d.severity),
                    d.code.as_str(),
                    d.message
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Hint => "hint",
        Severity::Info => "info",
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
