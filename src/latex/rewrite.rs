//! Geometry rewrite of the main `.tex` file.

use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;

use super::{read_source, write_source, LatexError, BEGIN_DOCUMENT, DOCUMENT_CLASS};
use crate::models::GeometrySettings;

/// Prefix letting a line containing inline math break badly rather than overflow
const SLOPPY: &str = "\\sloppy ";

/// Scale given to figures included without any size
const DEFAULT_FIGURE_SCALE: &str = "0.5";

struct Patterns {
    class_options: Regex,
    font_size: Regex,
    column_count: Regex,
    paper_size: Regex,
    relative_width: Regex,
    scaled: Regex,
    inline_math: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("rewrite pattern is valid");
        Patterns {
            class_options: re(r"(\\documentclass\s*\[)([^\]]*)\]"),
            font_size: re(r"^\d+pt$"),
            column_count: re(r"^\w+column$"),
            paper_size: re(r"^\w+paper$"),
            relative_width: re(r"\\includegraphics\[width=([.\d]+)\\(?:line|text)width\]"),
            scaled: re(r"\\includegraphics\[scale=([.\d]+)\]"),
            inline_math: re(r"\$.+\$"),
        }
    })
}

/// Counts of what a rewrite touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Comment and blank lines dropped
    pub dropped_lines: usize,
    /// `\includegraphics` lines resized
    pub figures: usize,
    /// Lines prefixed with `\sloppy`
    pub sloppy_lines: usize,
}

/// Rewrite `main_file` in place for the given geometry.
///
/// The original is kept next to it as `<name>.tex.bak`.
pub fn rewrite_geometry(
    main_file: &Path,
    settings: &GeometrySettings,
) -> Result<RewriteReport, LatexError> {
    let (source, encoding) = read_source(main_file)?;
    let (lines, report) = rewrite_lines(&source, settings)?;

    let backup = main_file.with_extension("tex.bak");
    std::fs::rename(main_file, &backup)?;
    tracing::debug!("Original main file kept as {}", backup.display());

    let mut out = lines.join("\n");
    out.push('\n');
    write_source(main_file, &out, encoding)?;

    Ok(report)
}

/// Apply every line edit to `source` and return the new lines.
pub fn rewrite_lines(
    source: &str,
    settings: &GeometrySettings,
) -> Result<(Vec<String>, RewriteReport), LatexError> {
    let mut report = RewriteReport::default();

    let mut lines: Vec<String> = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            report.dropped_lines += 1;
        } else {
            lines.push(line.to_string());
        }
    }

    let class_idx = lines
        .iter()
        .position(|line| line.contains(DOCUMENT_CLASS))
        .ok_or(LatexError::NoDocumentClass)?;
    lines[class_idx] = strip_class_options(&lines[class_idx]);

    let body_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.trim_start().starts_with(BEGIN_DOCUMENT))
        .map(|(idx, _)| idx)
        .collect();
    let body_idx = match body_lines.as_slice() {
        [] => return Err(LatexError::NoDocumentBody),
        [idx] => *idx,
        many => return Err(LatexError::MultipleDocumentBodies(many.len())),
    };

    for line in &mut lines {
        if let Some(resized) = resize_figure(line) {
            *line = resized;
            report.figures += 1;
        }
        if patterns().inline_math.is_match(line) {
            line.insert_str(0, SLOPPY);
            report.sloppy_lines += 1;
        }
    }

    // Inserted after the per-line edits: none of these lines carry figures or math
    lines.splice(body_idx..body_idx, preamble_block(settings));

    Ok((lines, report))
}

/// Drop font size, column count and paper size from the class options.
///
/// Only the bracketed option list is touched; the class name never is.
pub fn strip_class_options(line: &str) -> String {
    let p = patterns();
    p.class_options
        .replace(line, |caps: &Captures| {
            let kept = caps[2]
                .split(',')
                .map(str::trim)
                .filter(|opt| !opt.is_empty())
                .filter(|opt| {
                    !(p.font_size.is_match(opt)
                        || p.column_count.is_match(opt)
                        || p.paper_size.is_match(opt))
                })
                .collect::<Vec<_>>()
                .join(",");
            format!("{}{}]", &caps[1], kept)
        })
        .into_owned()
}

/// Lines inserted right before `\begin{document}`
fn preamble_block(settings: &GeometrySettings) -> Vec<String> {
    let mut block = vec![
        "\\pagestyle{empty}".to_string(),
        "\\usepackage{breqn}".to_string(),
        "\\usepackage{times}".to_string(),
        format!(
            "\\usepackage[{}]{{geometry}}",
            settings.to_option_string()
        ),
    ];
    if settings.is_landscape() {
        block.push("\\usepackage{pdflscape}".to_string());
    }
    block
}

/// Shrink an `\includegraphics` so it fits the new page.
///
/// The three forms are tried in order and only the first that matches is
/// applied. Returns `None` when the line has no figure to resize.
pub fn resize_figure(line: &str) -> Option<String> {
    let p = patterns();

    if p.relative_width.is_match(line) {
        return Some(
            p.relative_width
                .replace_all(
                    line,
                    r"\includegraphics[width=${1}\textwidth,height=${1}\textheight,keepaspectratio]",
                )
                .into_owned(),
        );
    }

    if line.contains("\\includegraphics{") {
        return Some(line.replace(
            "\\includegraphics{",
            &format!("\\includegraphics[scale={}]{{", DEFAULT_FIGURE_SCALE),
        ));
    }

    let mut halved = false;
    let resized = p.scaled.replace_all(line, |caps: &Captures| match caps[1].parse::<f64>() {
        Ok(scale) => {
            halved = true;
            format!("\\includegraphics[scale={}]", scale / 2.0)
        }
        Err(_) => caps[0].to_string(),
    });
    halved.then(|| resized.into_owned())
}
