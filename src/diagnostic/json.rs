use super::{Diagnostic, Severity};

/// One diagnostic as a single-line JSON object.
pub fn render(d: &Diagnostic) -> String {
    let severity = match d.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };

    let labels: Vec<serde_json::Value> = d.labels.iter().map(|l| {
        serde_json::json!({
            "start": l.span.start,
            "end": l.span.end,
            "message": l.message,
            "primary": l.is_primary,
        })
    }).collect();

    let mut obj = serde_json::json!({
        "severity": severity,
        "message": d.message,
        "labels": labels,
        "notes": d.notes,
    });

    if let Some(code) = d.code {
        obj["code"] = serde_json::Value::String(code.to_string());
    }

    if let Some((file, line, col)) = d.location() {
        obj["line"] = serde_json::Value::from(line);
        obj["col"] = serde_json::Value::from(col);
        if !file.is_empty() {
            obj["file"] = serde_json::Value::String(file);
        }
    }

    if let Some(s) = &d.suggestion {
        obj["suggestion"] = serde_json::Value::String(s.clone());
    }

    serde_json::to_string(&obj).unwrap_or_else(|_| r#"{"severity":"error","message":"internal error serializing diagnostic"}"#.to_string())
}
