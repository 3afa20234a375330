//! Cloud assembly output: the template file plus a `manifest.json`
//! describing it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Manifest schema version written to `manifest.json`.
pub const MANIFEST_VERSION: &str = "1";

/// Name of the manifest file inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Artifact type of a CloudFormation stack.
const STACK_ARTIFACT_TYPE: &str = "aws:cloudformation:stack";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    version: &'static str,
    artifacts: BTreeMap<String, StackArtifact>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StackArtifact {
    #[serde(rename = "type")]
    artifact_type: &'static str,
    environment: String,
    properties: StackProperties,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StackProperties {
    template_file: String,
    template_sha256: String,
}

/// Files written by [`write_assembly`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyOutput {
    /// Path of `<stack>.template.json`.
    pub template_path: PathBuf,
    /// Path of `manifest.json`.
    pub manifest_path: PathBuf,
    /// Hex SHA-256 of the template contents.
    pub template_sha256: String,
}

/// Hex-encoded SHA-256 of a template.
#[must_use]
pub fn template_digest(template: &str) -> String {
    hex::encode(Sha256::digest(template.as_bytes()))
}

/// Write `template` and its manifest into `out_dir`, creating the directory
/// if needed. Existing files are overwritten.
///
/// `stack_name` must be a plain file name; anything that would resolve
/// outside `out_dir` is rejected.
pub fn write_assembly(
    out_dir: &Path,
    stack_name: &str,
    environment: &str,
    template: &str,
) -> Result<AssemblyOutput> {
    ensure!(
        !stack_name.is_empty()
            && !stack_name.starts_with('.')
            && !stack_name.contains(['/', '\\']),
        "stack name {stack_name:?} is not a valid file name"
    );

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create directory: {}", out_dir.display()))?;

    let template_file = format!("{stack_name}.template.json");
    let template_path = out_dir.join(&template_file);
    fs::write(&template_path, template)
        .with_context(|| format!("Failed to write {}", template_path.display()))?;

    let template_sha256 = template_digest(template);
    let mut artifacts = BTreeMap::new();
    artifacts.insert(
        stack_name.to_owned(),
        StackArtifact {
            artifact_type: STACK_ARTIFACT_TYPE,
            environment: environment.to_owned(),
            properties: StackProperties {
                template_file,
                template_sha256: template_sha256.clone(),
            },
        },
    );
    let manifest = Manifest {
        version: MANIFEST_VERSION,
        artifacts,
    };

    let manifest_path = out_dir.join(MANIFEST_FILE);
    let manifest_json =
        serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
    fs::write(&manifest_path, manifest_json)
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    Ok(AssemblyOutput {
        template_path,
        manifest_path,
        template_sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_write_template_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cdk.out");
        let env = "aws://123456789012/us-east-1";
        let output = write_assembly(&out, "Baseline", env, "{}\n").unwrap();

        assert_eq!(output.template_path, out.join("Baseline.template.json"));
        assert_eq!(fs::read_to_string(&output.template_path).unwrap(), "{}\n");

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output.manifest_path).unwrap()).unwrap();
        let artifact = &manifest["artifacts"]["Baseline"];
        assert_eq!(manifest["version"], "1");
        assert_eq!(artifact["type"], "aws:cloudformation:stack");
        assert_eq!(artifact["environment"], "aws://123456789012/us-east-1");
        assert_eq!(artifact["properties"]["templateFile"], "Baseline.template.json");
        assert_eq!(
            artifact["properties"]["templateSha256"],
            output.template_sha256.as_str()
        );
    }

    #[test]
    fn test_should_keep_template_inside_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cdk.out");
        let env = "aws://unknown-account/unknown-region";
        for name in ["../escaped", "a/b", "..", ""] {
            assert!(write_assembly(&out, name, env, "{}").is_err());
        }
        assert!(!dir.path().join("escaped.template.json").exists());
    }

    #[test]
    fn test_should_compute_known_digest() {
        assert_eq!(
            template_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(template_digest("{}"), template_digest("{ }"));
    }
}
