//! subburn core - caption compositing and export pipeline.
//!
//! This crate contains all pipeline logic with zero UI dependencies:
//! transcript processing, caption layout and rasterization, the frame-by-frame
//! burn-in export, and SRT/WebVTT/JSON subtitle files. It is driven by the
//! `subburn` CLI but can be embedded by any front end.

pub mod config;
pub mod export;
pub mod layout;
pub mod logging;
pub mod media;
pub mod render;
pub mod style;
pub mod subtitles;
pub mod transcript;

#[cfg(test)]
mod test_support;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
