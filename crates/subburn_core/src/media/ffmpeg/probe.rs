//! ffprobe-based source probing.

use std::path::Path;
use std::process::Command;

use crate::media::{MediaError, MediaResult, SourceInfo};

/// Parse an ffprobe rate like `30000/1001` or `25`.
pub fn parse_rate(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0 && num > 0.0).then(|| num / den)
        }
        None => s.trim().parse().ok().filter(|v: &f64| *v > 0.0),
    }
}

fn parse_duration(value: Option<&serde_json::Value>) -> Option<f64> {
    value
        .and_then(|v| v.as_str())
        .filter(|s| *s != "N/A")
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Build [`SourceInfo`] from ffprobe's JSON output.
pub fn parse_probe_json(json: &str) -> MediaResult<SourceInfo> {
    let data: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| MediaError::Probe(format!("Failed to parse ffprobe JSON: {}", e)))?;

    let streams = data
        .get("streams")
        .and_then(|s| s.as_array())
        .cloned()
        .unwrap_or_default();
    let kind = |s: &serde_json::Value| s.get("codec_type").and_then(|v| v.as_str()).map(str::to_owned);

    let video = streams.iter().find(|s| kind(s).as_deref() == Some("video"));
    let has_audio = streams.iter().any(|s| kind(s).as_deref() == Some("audio"));

    let mut info = SourceInfo {
        has_video: video.is_some(),
        has_audio,
        ..SourceInfo::default()
    };

    if let Some(stream) = video {
        info.width = stream.get("width").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        info.height = stream.get("height").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        info.fps = stream
            .get("avg_frame_rate")
            .and_then(|v| v.as_str())
            .and_then(parse_rate)
            .or_else(|| {
                stream
                    .get("r_frame_rate")
                    .and_then(|v| v.as_str())
                    .and_then(parse_rate)
            });
        info.duration = parse_duration(stream.get("duration")).unwrap_or(0.0);
    }

    // Containers like MKV often carry only a format-level duration.
    if info.duration == 0.0 {
        info.duration = parse_duration(data.get("format").and_then(|f| f.get("duration")))
            .unwrap_or(0.0);
    }

    if info.has_video && (info.width == 0 || info.height == 0) {
        return Err(MediaError::Probe("Video stream has no dimensions".to_string()));
    }
    Ok(info)
}

/// Probe a file with ffprobe.
pub fn probe_source(path: &Path) -> MediaResult<SourceInfo> {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    tracing::info!("[FFmpeg] Probing: {}", filename);

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-show_entries",
            "stream=codec_type,width,height,avg_frame_rate,r_frame_rate,duration",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| MediaError::Probe(format!("ffprobe execution failed: {}", e)))?;

    if !output.status.success() {
        return Err(MediaError::open(path, "ffprobe could not read the file"));
    }

    let info = parse_probe_json(&String::from_utf8_lossy(&output.stdout))?;
    tracing::info!(
        "[FFmpeg] {}x{} @ {} fps, {:.2}s, audio: {}",
        info.width,
        info.height,
        info.fps.map(|f| format!("{:.3}", f)).unwrap_or_else(|| "?".to_string()),
        info.duration,
        if info.has_audio { "yes" } else { "no" }
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rates() {
        assert!((parse_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_rate("25"), Some(25.0));
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("junk"), None);
    }

    #[test]
    fn parses_video_and_audio_streams() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 1080, "height": 1920,
                 "avg_frame_rate": "30/1", "r_frame_rate": "30/1", "duration": "12.5"},
                {"codec_type": "audio", "duration": "12.4"}
            ],
            "format": {"duration": "12.6"}
        }"#;
        let info = parse_probe_json(json).unwrap();
        assert_eq!((info.width, info.height), (1080, 1920));
        assert_eq!(info.fps, Some(30.0));
        assert_eq!(info.duration, 12.5);
        assert!(info.has_video && info.has_audio);
    }

    #[test]
    fn falls_back_to_format_duration() {
        let json = r#"{
            "streams": [{"codec_type": "video", "width": 640, "height": 360,
                         "avg_frame_rate": "0/0", "r_frame_rate": "24/1", "duration": "N/A"}],
            "format": {"duration": "3.0"}
        }"#;
        let info = parse_probe_json(json).unwrap();
        assert_eq!(info.duration, 3.0);
        assert_eq!(info.fps, Some(24.0));
        assert!(!info.has_audio);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_probe_json("nope"), Err(MediaError::Probe(_))));
    }
}
