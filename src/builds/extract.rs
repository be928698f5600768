use super::types::BuildErrorFinding;

const ERROR_MARKER: &[u8] = b"error";

/// Scan one log container for error lines.
///
/// A line is an error line when it contains "error" in any ASCII case.
/// The lines right after it that are indented with a space, or start with
/// "at " once leading whitespace is dropped, become its trace. Scanning
/// resumes at the line after the match, so a trace line that itself
/// mentions "error" also produces its own finding.
pub fn extract_errors(lines: &[String]) -> Vec<BuildErrorFinding> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_error_line(line))
        .map(|(i, line)| {
            let trace: Vec<&str> = lines
                .get(i + 1..)
                .unwrap_or_default()
                .iter()
                .take_while(|next| is_trace_continuation(next))
                .map(String::as_str)
                .collect();

            BuildErrorFinding {
                message: line.clone(),
                trace: (!trace.is_empty()).then(|| trace.join("\n")),
            }
        })
        .collect()
}

fn is_error_line(line: &str) -> bool {
    line.as_bytes()
        .windows(ERROR_MARKER.len())
        .any(|window| window.eq_ignore_ascii_case(ERROR_MARKER))
}

fn is_trace_continuation(line: &str) -> bool {
    line.starts_with(' ') || line.trim_start().starts_with("at ")
}
