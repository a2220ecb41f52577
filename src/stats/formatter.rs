//! Stats formatting for different output formats

use super::UsageRecord;
use crate::config::StatsFormat;

/// Format a usage record according to the configured format
pub fn format_usage(record: &UsageRecord, format: StatsFormat) -> String {
    match format {
        StatsFormat::Pretty => format_pretty(record),
        StatsFormat::Json => format_json(record),
        StatsFormat::Compact => format_compact(record),
    }
}

/// Pretty box format for terminal output
fn format_pretty(r: &UsageRecord) -> String {
    format!(
        r#"┌──────────────────────────────────────────────────────────────────┐
│ Completion Usage                                                 │
├──────────────────────────────────────────────────────────────────┤
│ Model: {:56}│
│ Time:  {:56}│
├──────────────────────────────────────────────────────────────────┤
│ Tokens                                                           │
│   Input: {:6} │ Output: {:6} │ Total: {:6}                   │
│   Generation: {:8.2} tokens/sec                                  │
├──────────────────────────────────────────────────────────────────┤
│ Messages: {:54}│
│ Finish: {:56}│
│ Duration: {:54.1}│
└──────────────────────────────────────────────────────────────────┘
"#,
        truncate(&r.model, 56),
        r.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        r.prompt_tokens,
        r.completion_tokens,
        r.total_tokens,
        r.generation_tps,
        r.input_messages,
        truncate(&r.finish_reason, 56),
        r.duration_ms,
    )
}

/// JSON format for structured logging
fn format_json(r: &UsageRecord) -> String {
    serde_json::to_string(r).unwrap_or_else(|_| "{}".to_string())
}

/// Single-line format
fn format_compact(r: &UsageRecord) -> String {
    format!(
        "← {} | in={} out={} total={} | {:.1} tok/s | {:.0}ms | {}",
        short_model(&r.model),
        r.prompt_tokens,
        r.completion_tokens,
        r.total_tokens,
        r.generation_tps,
        r.duration_ms,
        r.finish_reason
    )
}

/// Last path segment of a provider model id (`accounts/x/models/name` -> `name`)
fn short_model(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
