//! Offline artifact tooling behind the `export-fallback` and `convert` subcommands

use newscheck_classifiers::{
    convert_artifact, ArtifactFormat, FallbackSynthesizer, ModelArtifacts, TextPreprocessor,
};
use newscheck_core::{Error, Result};
use std::path::Path;
use tracing::info;

/// Version recorded in exported artifacts
pub const COMPATIBLE_VERSION: &str = "1.0.0-compatible";

/// Train the fallback model and write it as a bundle artifact.
///
/// The written file is read back before returning, so a successful export is
/// known to load.
pub fn export_fallback(output: &Path, format: Option<ArtifactFormat>) -> Result<ModelArtifacts> {
    let format = format.unwrap_or_else(|| ArtifactFormat::from_path(output));
    let mut model = FallbackSynthesizer::new().train(&TextPreprocessor::english())?;

    model.metadata.insert("model_type", "Logistic Regression");
    model.metadata.insert("version", COMPATIBLE_VERSION);
    model.metadata.insert("classes", vec!["Real", "Fake"]);
    model.metadata.insert(
        "generator",
        concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
    );

    let artifacts = model.into_artifacts();
    artifacts.write(output, format)?;

    let reloaded = ModelArtifacts::read(output, format)?;
    if reloaded.metadata() != artifacts.metadata() {
        return Err(Error::artifact("exported artifact did not reload identically"));
    }

    info!(output = %output.display(), format = %format, "Exported fallback model");
    Ok(reloaded)
}

/// Re-encode an artifact between plain and compressed formats
pub fn convert(input: &Path, output: &Path) -> Result<ModelArtifacts> {
    convert_artifact(input, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use newscheck_classifiers::Detector;
    use serde_json::json;

    #[test]
    fn test_export_then_convert() {
        let dir = tempfile::tempdir().unwrap();
        let compressed = dir.path().join("fake_news_model.json.zst");
        let plain = dir.path().join("converted/fake_news_model.json");

        let exported = export_fallback(&compressed, None).unwrap();
        let metadata = exported.metadata().unwrap();
        assert_eq!(metadata.get("version"), Some(&json!(COMPATIBLE_VERSION)));
        assert_eq!(metadata.get("classes"), Some(&json!(["Real", "Fake"])));

        let converted = convert(&compressed, &plain).unwrap();
        assert_eq!(converted.shape(), "bundle");

        let from_plain = ModelArtifacts::read(&plain, ArtifactFormat::Plain).unwrap();
        let detector = Detector::from_artifacts(from_plain).unwrap();
        assert!(!detector.is_fallback());
        assert_eq!(detector.model_info().model_type(), Some("Logistic Regression"));
    }

    #[test]
    fn test_convert_rejects_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = convert(&dir.path().join("missing.json"), &dir.path().join("out.json.zst"));
        assert!(result.is_err());
    }
}
