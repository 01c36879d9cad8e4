//! Ariadne-based diagnostic rendering for pattern errors.
//!
//! Renders `PatternError` and `Warning` values into labeled reports, with a
//! secondary label wherever the error points at a second location (the
//! dominating case, the earlier binding, the other alternative).
//! [`render_json`] emits the same diagnostics as one JSON object each, for
//! tools.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use serde::Serialize;

use patmatch_common::{LineIndex, Span};

use crate::error::{ErrorKind, PatternError, Warning};

// ── Error Codes ────────────────────────────────────────────────────────

/// Assign a unique short code to each error kind.
fn error_code(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InconvertibleTypes => "E0001",
        ErrorKind::ArityMismatch => "E0002",
        ErrorKind::GenericInconsistency => "E0003",
        ErrorKind::DuplicateBinding => "E0004",
        ErrorKind::AssignmentToPatternVariable => "E0005",
        ErrorKind::UnreachableCase => "E0006",
        ErrorKind::NonExhaustiveSwitch => "E0007",
        ErrorKind::InconsistentBindingsAcrossFallthrough => "E0008",
        ErrorKind::IllegalTotalPattern => "E0009",
        ErrorKind::ReturnOutsideExpressionContext => "E0010",
        ErrorKind::StructuralParseError => "E0011",
        ErrorKind::UnknownType => "E0012",
        ErrorKind::UnknownConstant => "E0013",
        ErrorKind::NotARecord => "E0014",
        ErrorKind::GuardNotEffectivelyFinal => "E0015",
        ErrorKind::GuardAlwaysFalse => "E0016",
        ErrorKind::PreviewFeatureRequired => "E0017",
    }
}

fn warning_code(warning: &Warning) -> &'static str {
    match warning {
        Warning::ExhaustivenessGaveUp { .. } => "W0001",
    }
}

// ── Labels ─────────────────────────────────────────────────────────────

/// Primary label text, an optional secondary location and an optional hint.
struct Parts {
    label: String,
    related: Option<(Span, String)>,
    help: Option<&'static str>,
}

fn parts(error: &PatternError) -> Parts {
    let only = |label: String| Parts {
        label,
        related: None,
        help: None,
    };
    match error {
        PatternError::InconvertibleTypes { found, expected, .. } => Parts {
            label: format!("`{}` is not compatible with `{}`", found, expected),
            related: None,
            help: None,
        },
        PatternError::ArityMismatch { expected, .. } => {
            only(format!("expected {} component pattern(s)", expected))
        }
        PatternError::GenericInconsistency { reason, .. } => only(reason.clone()),
        PatternError::DuplicateBinding { name, previous, .. } => Parts {
            label: format!("`{}` redefined here", name),
            related: Some((*previous, format!("`{}` first defined here", name))),
            help: Some("rename one of the variables"),
        },
        PatternError::AssignmentToPatternVariable { binding, .. } => Parts {
            label: "assignment here".to_string(),
            related: Some((*binding, "pattern variable declared here".to_string())),
            help: Some("pattern variables are implicitly final; copy into a local first"),
        },
        PatternError::UnreachableCase { dominating, .. } => Parts {
            label: "this case is unreachable".to_string(),
            related: dominating.map(|span| (span, "already matched here".to_string())),
            help: Some("remove this case or move it before the dominating one"),
        },
        PatternError::NonExhaustiveSwitch { .. } => Parts {
            label: "not every value is matched".to_string(),
            related: None,
            help: Some("add the missing cases or a `default` label"),
        },
        PatternError::InconsistentBindingsAcrossFallthrough { other, .. } => Parts {
            label: "binds different variables".to_string(),
            related: Some((*other, "than this label".to_string())),
            help: None,
        },
        PatternError::IllegalTotalPattern { .. } => Parts {
            label: "this pattern always matches".to_string(),
            related: None,
            help: Some("use a type test without a pattern, or a plain declaration"),
        },
        PatternError::ReturnOutsideExpressionContext { .. } => Parts {
            label: "return inside a switch expression".to_string(),
            related: None,
            help: Some("use `yield` to produce the value of the switch"),
        },
        PatternError::StructuralParseError { related, .. } => Parts {
            label: "here".to_string(),
            related: related.as_ref().map(|(msg, span)| (*span, msg.clone())),
            help: None,
        },
        PatternError::UnknownType { .. } => only("not found in scope".to_string()),
        PatternError::UnknownConstant { .. } => only("unknown constant".to_string()),
        PatternError::NotARecord { .. } => Parts {
            label: "cannot be deconstructed".to_string(),
            related: None,
            help: Some("only record types have deconstruction patterns"),
        },
        PatternError::GuardNotEffectivelyFinal { .. } => only("in this guard".to_string()),
        PatternError::GuardAlwaysFalse { .. } => only("always `false`".to_string()),
        PatternError::PreviewFeatureRequired { .. } => Parts {
            label: "constant label in a pattern switch".to_string(),
            related: None,
            help: Some("enable `constant_pattern_mix` in the analysis config"),
        },
    }
}

// ── Rendering ──────────────────────────────────────────────────────────

/// Clamp a span to be valid and non-empty within `source`.
fn clamp(span: Span, source_len: usize) -> Range<usize> {
    let r = span.range();
    let s = r.start.min(source_len);
    let e = r.end.min(source_len).max(s);
    if s == e {
        s..e.saturating_add(1).min(source_len)
    } else {
        s..e
    }
}

/// Render an error as a formatted diagnostic string, without colors.
pub fn render_diagnostic(error: &PatternError, source: &str) -> String {
    let config = Config::default().with_color(false);
    let range = clamp(error.span(), source.len());
    let parts = parts(error);
    let msg = error.to_string();

    let mut builder = Report::build(ReportKind::Error, range.clone())
        .with_code(error_code(error.kind()))
        .with_message(&msg)
        .with_config(config)
        .with_label(
            Label::new(range)
                .with_message(parts.label)
                .with_color(Color::Red),
        );
    if let Some((span, label)) = parts.related {
        builder = builder.with_label(
            Label::new(clamp(span, source.len()))
                .with_message(label)
                .with_color(Color::Blue),
        );
    }
    if let Some(help) = parts.help {
        builder = builder.with_help(help);
    }
    write_report(builder.finish(), source)
}

/// Render a warning as a formatted diagnostic string, without colors.
pub fn render_warning(warning: &Warning, source: &str) -> String {
    let config = Config::default().with_color(false);
    let range = clamp(warning.span(), source.len());
    let msg = warning.to_string();

    let report = match warning {
        Warning::ExhaustivenessGaveUp { .. } => Report::build(ReportKind::Warning, range.clone())
            .with_code(warning_code(warning))
            .with_message(&msg)
            .with_config(config)
            .with_label(
                Label::new(range)
                    .with_message("treated as not exhaustive")
                    .with_color(Color::Yellow),
            )
            .with_help("raise `max_base_checks` or add a `default` label")
            .finish(),
    };
    write_report(report, source)
}

fn write_report(report: Report<'_, Range<usize>>, source: &str) -> String {
    let mut buf = Vec::new();
    let cache = Source::from(source);
    // Writing into a Vec cannot fail.
    let _ = report.write(cache, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

// ── JSON ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct JsonDiagnostic<'a> {
    /// `error` or `warning`.
    level: &'static str,
    /// Taxonomy code, e.g. `UNREACHABLE_CASE`.
    code: &'a str,
    /// Short code, e.g. `E0006`.
    short_code: &'static str,
    message: String,
    span: JsonSpan,
}

/// Lines and columns are 1-based.
#[derive(Debug, Serialize)]
struct JsonSpan {
    byte_start: u32,
    byte_end: u32,
    line_start: u32,
    column_start: u32,
    line_end: u32,
    column_end: u32,
}

impl JsonSpan {
    fn new(span: Span, index: &LineIndex) -> Self {
        let (line_start, column_start) = index.line_col(span.start);
        let (line_end, column_end) = index.line_col(span.end);
        JsonSpan {
            byte_start: span.start,
            byte_end: span.end,
            line_start,
            column_start,
            line_end,
            column_end,
        }
    }
}

/// Serialize errors then warnings, one JSON object per line.
pub fn render_json(
    errors: &[PatternError],
    warnings: &[Warning],
    source: &str,
) -> Result<String, serde_json::Error> {
    let index = LineIndex::new(source);
    let errors = errors.iter().map(|e| JsonDiagnostic {
        level: "error",
        code: e.kind().code(),
        short_code: error_code(e.kind()),
        message: e.to_string(),
        span: JsonSpan::new(e.span(), &index),
    });
    let warnings = warnings.iter().map(|w| JsonDiagnostic {
        level: "warning",
        code: w.code(),
        short_code: warning_code(w),
        message: w.to_string(),
        span: JsonSpan::new(w.span(), &index),
    });
    let mut out = String::new();
    for diagnostic in errors.chain(warnings) {
        out.push_str(&serde_json::to_string(&diagnostic)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_case_points_at_both_labels() {
        let source = "case Number n -> case Integer i ->";
        let err = PatternError::UnreachableCase {
            span: Span::new(22, 31),
            dominating: Some(Span::new(5, 13)),
        };
        let out = render_diagnostic(&err, source);
        assert!(out.contains("E0006"), "{out}");
        assert!(out.contains("this case label is dominated by a preceding case label"));
        assert!(out.contains("this case is unreachable"));
        assert!(out.contains("already matched here"));
    }

    #[test]
    fn empty_spans_are_widened() {
        let err = PatternError::NonExhaustiveSwitch {
            selector: "Shape".to_string(),
            span: Span::new(0, 0),
        };
        let out = render_diagnostic(&err, "case Circle c ->");
        assert!(out.contains("does not cover all possible values of `Shape`"));
        assert!(out.contains("default"));
        assert_eq!(clamp(Span::new(40, 50), 16), 16..16);
        assert_eq!(clamp(Span::new(3, 3), 16), 3..4);
    }

    #[test]
    fn warnings_render_as_warnings() {
        let warning = Warning::ExhaustivenessGaveUp {
            budget: 8,
            span: Span::new(0, 4),
        };
        let out = render_warning(&warning, "case A a ->");
        assert!(out.contains("W0001"));
        assert!(out.contains("Warning"));
        assert!(out.contains("gave up after 8 steps"));
    }

    #[test]
    fn json_lines_carry_positions() {
        let source = "case A a ->\ncase A b ->";
        let errors = [PatternError::UnreachableCase {
            span: Span::new(17, 20),
            dominating: Some(Span::new(5, 8)),
        }];
        let out = render_json(&errors, &[], source).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["level"], "error");
        assert_eq!(value["code"], "UNREACHABLE_CASE");
        assert_eq!(value["short_code"], "E0006");
        assert_eq!(value["span"]["line_start"], 2);
        assert_eq!(value["span"]["column_start"], 6);
        assert_eq!(value["span"]["column_end"], 9);
    }

    #[test]
    fn json_lines_list_errors_before_warnings() {
        let source = "case A a ->\ncase A b ->";
        let errors = [PatternError::UnreachableCase {
            span: Span::new(17, 20),
            dominating: None,
        }];
        let warnings = [Warning::ExhaustivenessGaveUp {
            budget: 8,
            span: Span::new(0, 4),
        }];
        let out = render_json(&errors, &warnings, source).unwrap();
        let levels: Vec<String> = out
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["level"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(levels, vec!["error", "warning"]);
        assert!(out.ends_with('\n'));
    }
}
