// Logging utilities
// Structured logging with JSON and human-readable formats; patient identifiers are masked
// before a line reaches any sink.

use std::sync::OnceLock;

use log::Level;
use regex::Regex;
use serde_json::json;

/// Mask a sensitive value, keeping the first and last four characters of long values.
pub fn mask_sensitive(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let start: String = chars[..4].iter().collect();
    let end: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", start, end)
}

static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
static PHONE: OnceLock<Option<Regex>> = OnceLock::new();
static MRN: OnceLock<Option<Regex>> = OnceLock::new();
static PHASE: OnceLock<Option<Regex>> = OnceLock::new();
static STEP: OnceLock<Option<Regex>> = OnceLock::new();

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Mask emails, phone numbers and MRN assignments (`mrn=...`, `"mrn": "..."`) in a log line.
pub fn mask_patient_identifiers(message: &str) -> String {
    let mut masked = message.to_string();
    if let Some(re) = cached(&EMAIL, r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}") {
        masked = re
            .replace_all(&masked, |caps: &regex::Captures| mask_sensitive(&caps[0]))
            .into_owned();
    }
    if let Some(re) = cached(&PHONE, r"\(?\b\d{3}\)?[\s.-]?\d{3}[\s.-]\d{4}\b") {
        masked = re.replace_all(&masked, "***-***-****").into_owned();
    }
    if let Some(re) = cached(&MRN, r#"(?i)\b(mrn)(["']?\s*[:=]\s*["']?)([A-Za-z0-9-]+)"#) {
        masked = re
            .replace_all(&masked, |caps: &regex::Captures| {
                format!("{}{}{}", &caps[1], &caps[2], mask_sensitive(&caps[3]))
            })
            .into_owned();
    }
    masked
}

/// Metadata lifted out of a `[PHASE: x] [STEP: y] message` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMetadata {
    pub phase: Option<String>,
    pub step: Option<String>,
    pub message: String,
}

/// Split the first `[PHASE: ...]` and `[STEP: ...]` tags out of `message`.
pub fn parse_log_metadata(message: &str) -> LogMetadata {
    let mut rest = message.to_string();
    let mut take = |re: Option<&Regex>| -> Option<String> {
        let (value, whole) = {
            let caps = re?.captures(&rest)?;
            (caps[1].trim().to_string(), caps.get(0)?.range())
        };
        rest = format!("{} {}", &rest[..whole.start], &rest[whole.end..]).trim().to_string();
        Some(value)
    };
    let phase = take(cached(&PHASE, r"\[PHASE:\s*([^\]]*)\]"));
    let step = take(cached(&STEP, r"\[STEP:\s*([^\]]*)\]"));
    LogMetadata { phase, step, message: rest }
}

/// One formatted log line's inputs.
pub struct LogRecord<'a> {
    pub timestamp: &'a str,
    pub level: Level,
    pub target: &'a str,
    pub raw_message: &'a str,
}

impl LogRecord<'_> {
    fn metadata(&self) -> LogMetadata {
        parse_log_metadata(&mask_patient_identifiers(self.raw_message))
    }
}

/// Format a log entry as a JSON object on one line.
pub fn format_json_log(record: &LogRecord) -> String {
    let meta = record.metadata();
    let mut entry = json!({
        "timestamp": record.timestamp,
        "level": record.level.as_str(),
        "target": record.target,
        "message": meta.message,
    });
    if let Some(phase) = meta.phase {
        entry["phase"] = json!(phase);
    }
    if let Some(step) = meta.step {
        entry["step"] = json!(step);
    }
    serde_json::to_string(&entry).unwrap_or_else(|_| "{}".to_string())
}

/// Format a log entry as human-readable text.
pub fn format_human_readable_log(record: &LogRecord) -> String {
    let meta = record.metadata();
    let mut line = format!("[{}] [{}]", record.timestamp, record.level.as_str());
    if let Some(phase) = meta.phase {
        line.push_str(&format!(" [PHASE: {}]", phase));
    }
    if let Some(step) = meta.step {
        line.push_str(&format!(" [STEP: {}]", step));
    }
    line.push_str(&format!(" [{}] {}", record.target, meta.message));
    line
}
