//! Uniform formatting for user-facing error messages.

/// Wrap a message so every driver-level failure reads the same way.
pub fn error_message(msg: impl AsRef<str>) -> String {
    format!("[workload-viz] {}", msg.as_ref().trim_end())
}

/// Render an error chain (`anyhow` style) on a single line.
pub fn chain_message(err: &anyhow::Error) -> String {
    err.chain()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}
