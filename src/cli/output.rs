//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ReadinessError;

/// Map a readiness error to the text printed on stderr.
///
/// Aborted runs list the primary error's detail lines and every secondary
/// failure; unready runs list one line per helper.
pub fn map_error(e: &ReadinessError) -> String {
    let mut out = match e {
        // Secondary failures go in the bullets only.
        ReadinessError::Aborted(aggregate) => format!(
            "{}: Readiness helper '{}' failed during {}: {}",
            e.code(),
            aggregate.key,
            aggregate.phase,
            aggregate.primary
        ),
        _ => format!("{}: {}", e.code(), e),
    };
    match e {
        ReadinessError::Aborted(aggregate) => {
            for line in aggregate.primary.detail_lines() {
                out.push_str(&format!("\n  • {}", line));
            }
            for failure in &aggregate.secondary {
                out.push_str(&format!("\n  • {}", failure));
            }
        }
        ReadinessError::Unready(unready) => {
            for entry in &unready.entries {
                let message = entry.message.as_deref().unwrap_or("no message");
                out.push_str(&format!("\n  • {} ({}): {}", entry.key, entry.status, message));
            }
        }
        other => {
            for line in other.detail_lines() {
                out.push_str(&format!("\n  • {}", line));
            }
        }
    }
    out
}
