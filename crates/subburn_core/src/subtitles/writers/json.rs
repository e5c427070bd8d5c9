//! Transcript JSON writer.

use crate::transcript::Transcript;

/// Pretty JSON dump of the transcript's enabled chunks.
///
/// `text` is rebuilt from the enabled chunks and each `timestamp` pair is
/// kept on one line.
pub fn to_json(transcript: &Transcript) -> Result<String, serde_json::Error> {
    let enabled = Transcript::from_chunks(
        transcript
            .chunks
            .iter()
            .filter(|c| !c.disabled)
            .cloned()
            .collect(),
    );
    let pretty = serde_json::to_string_pretty(&enabled)?;
    Ok(inline_timestamps(&pretty))
}

/// Collapse `"timestamp": [\n a,\n b\n ]` into `"timestamp": [a, b]`.
fn inline_timestamps(pretty: &str) -> String {
    let mut lines = pretty.lines();
    let mut out = Vec::new();

    while let Some(line) = lines.next() {
        if !line.trim_end().ends_with("\"timestamp\": [") {
            out.push(line.to_string());
            continue;
        }
        let mut values = Vec::new();
        let mut closing = "]";
        for inner in lines.by_ref() {
            let inner = inner.trim();
            if inner.starts_with(']') {
                closing = inner;
                break;
            }
            values.push(inner.trim_end_matches(','));
        }
        out.push(format!("{}{}{}", line.trim_end(), values.join(", "), closing));
    }

    out.join("\n")
}
