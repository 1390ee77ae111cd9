//! Bounded prompt construction from report fields and logs.

use crate::types::report::{ConsoleLogEntry, NetworkLogEntry, ReportContext};
use serde_json::Value;

/// Maximum number of entries rendered per log array.
pub const MAX_LOG_ENTRIES: usize = 50;

/// Render the present fields of `ctx` as labeled markdown sections.
///
/// Sections appear in a fixed order (title, description, transcript, console logs,
/// network logs). Absent or blank fields are omitted entirely. Only the first
/// [`MAX_LOG_ENTRIES`] of each log array are rendered, and the section label states
/// the total so the model knows the list was cut.
pub fn build_context(ctx: &ReportContext) -> String {
    let mut sections = Vec::new();

    if let Some(title) = present(&ctx.title) {
        sections.push(format!("## Title\n{}", title));
    }
    if let Some(description) = present(&ctx.description) {
        sections.push(format!("## Description\n{}", description));
    }
    if let Some(transcript) = present(&ctx.transcript) {
        sections.push(format!("## Transcript\n{}", transcript));
    }
    if !ctx.console_logs.is_empty() {
        sections.push(log_section(
            "Console Logs",
            ctx.console_logs.len(),
            ctx.console_logs.iter().take(MAX_LOG_ENTRIES).map(console_line),
        ));
    }
    if !ctx.network_logs.is_empty() {
        sections.push(log_section(
            "Network Logs",
            ctx.network_logs.len(),
            ctx.network_logs.iter().take(MAX_LOG_ENTRIES).map(network_line),
        ));
    }

    sections.join("\n\n")
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn log_section(label: &str, total: usize, lines: impl Iterator<Item = String>) -> String {
    let heading = if total > MAX_LOG_ENTRIES {
        format!(
            "## {} (showing first {} of {} entries)",
            label, MAX_LOG_ENTRIES, total
        )
    } else {
        format!("## {} ({} entries)", label, total)
    };
    let body: Vec<String> = lines.collect();
    format!("{}\n{}", heading, body.join("\n"))
}

/// `[type] arg arg ...`, strings verbatim and everything else as JSON.
pub fn console_line(entry: &ConsoleLogEntry) -> String {
    let args: Vec<String> = entry
        .args
        .iter()
        .map(|arg| match arg {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    format!("[{}] {}", entry.level, args.join(" "))
}

/// `METHOD url → status`.
pub fn network_line(entry: &NetworkLogEntry) -> String {
    format!("{} {} → {}", entry.method, entry.url, entry.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::report::ConsoleLevel;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn console(level: ConsoleLevel, args: Vec<Value>) -> ConsoleLogEntry {
        ConsoleLogEntry {
            level,
            args,
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        }
    }

    fn network(method: &str, url: &str, status: u16) -> NetworkLogEntry {
        NetworkLogEntry {
            method: method.to_string(),
            url: url.to_string(),
            status,
            duration: Some(120.0),
            timestamp: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        }
    }

    #[test]
    fn test_empty_context_renders_nothing() {
        assert_eq!(build_context(&ReportContext::default()), "");
    }

    #[test]
    fn test_sections_render_in_fixed_order() {
        let ctx = ReportContext {
            title: Some("Cart total wrong".to_string()),
            description: Some("Discount applied twice".to_string()),
            transcript: Some("00:01 user opens cart".to_string()),
            console_logs: vec![console(ConsoleLevel::Warn, vec![json!("stale price")])],
            network_logs: vec![network("GET", "https://shop.example.com/api/cart", 200)],
        };

        let rendered = build_context(&ctx);
        let expected = "## Title\nCart total wrong\n\n\
                        ## Description\nDiscount applied twice\n\n\
                        ## Transcript\n00:01 user opens cart\n\n\
                        ## Console Logs (1 entries)\n[warn] stale price\n\n\
                        ## Network Logs (1 entries)\nGET https://shop.example.com/api/cart → 200";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_absent_and_blank_fields_are_omitted() {
        let ctx = ReportContext {
            title: Some("Only a title".to_string()),
            description: Some("   ".to_string()),
            ..Default::default()
        };

        assert_eq!(build_context(&ctx), "## Title\nOnly a title");
    }

    #[test]
    fn test_console_logs_are_capped_and_counted() {
        let logs: Vec<ConsoleLogEntry> = (0..80)
            .map(|i| console(ConsoleLevel::Log, vec![json!(format!("line-{}", i))]))
            .collect();
        let ctx = ReportContext {
            console_logs: logs,
            ..Default::default()
        };

        let rendered = build_context(&ctx);
        assert!(rendered.starts_with("## Console Logs (showing first 50 of 80 entries)"));
        assert_eq!(rendered.matches("[log] line-").count(), MAX_LOG_ENTRIES);
        assert!(rendered.contains("line-0\n"));
        assert!(rendered.contains("line-49"));
        assert!(!rendered.contains("line-50"));
    }

    #[test]
    fn test_network_logs_are_capped_and_counted() {
        let logs: Vec<NetworkLogEntry> = (0..51)
            .map(|i| network("POST", &format!("https://api.example.com/{}", i), 500))
            .collect();
        let ctx = ReportContext {
            network_logs: logs,
            ..Default::default()
        };

        let rendered = build_context(&ctx);
        assert!(rendered.contains("## Network Logs (showing first 50 of 51 entries)"));
        assert!(!rendered.contains("https://api.example.com/50 "));
    }

    #[test]
    fn test_console_args_stringify_non_strings() {
        let entry = console(
            ConsoleLevel::Error,
            vec![json!("Request failed:"), json!({ "code": 503 }), json!(42), json!(null)],
        );
        assert_eq!(
            console_line(&entry),
            r#"[error] Request failed: {"code":503} 42 null"#
        );
    }
}
