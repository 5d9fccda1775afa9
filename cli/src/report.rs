use mediabench_core::registry::{OperationInfo, OperationKind};
use mediabench_core::ProcessingResult;

const RULE_WIDTH: usize = 60;

/// Human-readable summary of one operation.
pub fn render(result: &ProcessingResult) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![rule.clone()];

    lines.push(match result.error_message() {
        None => format!("✅ {}", result.message()),
        Some(error) => format!("❌ {}", error),
    });

    if let Some(path) = result.output_path() {
        lines.push(format!("📁 Output: {}", path.display()));
    }

    match (result.original_size(), result.final_size()) {
        (Some(orig), Some(fin)) => {
            lines.push(format!("📦 Size: {} → {}", format_size(orig), format_size(fin)))
        }
        (None, Some(fin)) => lines.push(format!("📦 Size: {}", format_size(fin))),
        _ => {}
    }

    if let (Some(mb), Some(pct)) = (result.size_reduction_mb(), result.savings_pct()) {
        lines.push(format!("📉 Size reduction: {:.2} MB ({:.1}%)", mb, pct));
    }

    if let Some(batch) = result.batch() {
        lines.push(format!(
            "Files: {} compressed | {} kept original | {} copied | {} failed",
            batch.processed, batch.skipped, batch.copied, batch.failed
        ));
        lines.extend(
            batch
                .errors
                .iter()
                .map(|(path, err)| format!("  ERROR {}: {}", path.display(), err)),
        );
    }

    lines.push(rule);
    lines.join("\n")
}

/// Listing of registered commands, grouped by capability.
pub fn render_operations(operations: &[OperationInfo]) -> String {
    let mut lines = vec![String::new(), "📋 Available Operations:".to_string()];

    for (kind, title) in [
        (OperationKind::Processor, "Processors"),
        (OperationKind::Downloader, "Downloaders"),
    ] {
        let group: Vec<_> = operations.iter().filter(|op| op.kind == kind).collect();
        if group.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("  {title}:"));
        lines.extend(group.iter().map(|op| format!("    • {op}")));
    }

    lines.push(String::new());
    lines.join("\n")
}

/// 0 on success, 1 on failure.
pub fn exit_status(result: &ProcessingResult) -> u8 {
    if result.success() {
        0
    } else {
        1
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
