//! The resolved build plan handed to the build-graph engine.
//!
//! A `BuildPlan` is produced once by the resolver and never modified. Fields
//! are private so nothing downstream can alter a validated plan.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::list::ParsedList;
use crate::core::option::PathCheck;
use crate::util::hash::sha256_str;

/// AMBuild API level the plan is written against.
pub const ENGINE_API: &str = "2.2";

/// Which architectures to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "archs", rename_all = "snake_case")]
pub enum TargetSelection {
    /// Let the engine pick its native architecture.
    EngineDefault,
    /// Build exactly these architectures.
    Explicit(ParsedList),
}

impl TargetSelection {
    pub fn is_engine_default(&self) -> bool {
        matches!(self, TargetSelection::EngineDefault)
    }

    pub fn explicit(&self) -> Option<&ParsedList> {
        match self {
            TargetSelection::EngineDefault => None,
            TargetSelection::Explicit(list) => Some(list),
        }
    }
}

/// An absolute path together with what was known about it at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub check: PathCheck,
    /// Whether the path existed when the plan was resolved.
    pub exists: bool,
}

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

/// One cell of the SDK x architecture matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixEntry<'a> {
    pub sdk: &'a str,
    /// `None` means the engine's native architecture.
    pub arch: Option<&'a str>,
}

/// A fully resolved, validated build configuration.
///
/// Only the resolver constructs plans; there is no way to read one back in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    engine_api: String,
    source_dir: PathBuf,
    build_dir: PathBuf,
    sdk_list: ParsedList,
    target_list: TargetSelection,
    sdk_root_path: Option<ResolvedPath>,
    sdk_manifest_path: Option<ResolvedPath>,
    host_framework_path: Option<ResolvedPath>,
    debug_enabled: bool,
    optimize_enabled: bool,
}

/// Builder used by the resolver to assemble a plan.
#[derive(Debug, Clone)]
pub(crate) struct BuildPlanParts {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub sdk_list: ParsedList,
    pub target_list: TargetSelection,
    pub sdk_root_path: Option<ResolvedPath>,
    pub sdk_manifest_path: Option<ResolvedPath>,
    pub host_framework_path: Option<ResolvedPath>,
    pub debug_enabled: bool,
    pub optimize_enabled: bool,
}

impl BuildPlan {
    pub(crate) fn from_parts(parts: BuildPlanParts) -> Self {
        BuildPlan {
            engine_api: ENGINE_API.to_string(),
            source_dir: parts.source_dir,
            build_dir: parts.build_dir,
            sdk_list: parts.sdk_list,
            target_list: parts.target_list,
            sdk_root_path: parts.sdk_root_path,
            sdk_manifest_path: parts.sdk_manifest_path,
            host_framework_path: parts.host_framework_path,
            debug_enabled: parts.debug_enabled,
            optimize_enabled: parts.optimize_enabled,
        }
    }

    pub fn engine_api(&self) -> &str {
        &self.engine_api
    }

    /// Directory holding the plugin's build scripts.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Directory the engine writes its output tree into.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn sdk_list(&self) -> &ParsedList {
        &self.sdk_list
    }

    pub fn target_list(&self) -> &TargetSelection {
        &self.target_list
    }

    pub fn sdk_root_path(&self) -> Option<&ResolvedPath> {
        self.sdk_root_path.as_ref()
    }

    pub fn sdk_manifest_path(&self) -> Option<&ResolvedPath> {
        self.sdk_manifest_path.as_ref()
    }

    pub fn host_framework_path(&self) -> Option<&ResolvedPath> {
        self.host_framework_path.as_ref()
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    pub fn optimize_enabled(&self) -> bool {
        self.optimize_enabled
    }

    /// Expand the SDK and architecture selections into build cells.
    ///
    /// Ordered by SDK first, then architecture, both in first-occurrence order.
    pub fn target_matrix(&self) -> Vec<MatrixEntry<'_>> {
        let mut matrix = Vec::new();
        for sdk in self.sdk_list.iter() {
            match &self.target_list {
                TargetSelection::EngineDefault => matrix.push(MatrixEntry { sdk, arch: None }),
                TargetSelection::Explicit(archs) => {
                    for arch in archs.iter() {
                        matrix.push(MatrixEntry {
                            sdk,
                            arch: Some(arch),
                        });
                    }
                }
            }
        }
        matrix
    }

    /// Serialize the plan as pretty JSON for the engine.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// SHA-256 of the plan's canonical JSON form.
    ///
    /// Fails when the plan has no JSON form, e.g. a path that is not UTF-8.
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        // Field order is fixed by the struct, so compact JSON is canonical.
        let canonical = serde_json::to_string(self)?;
        Ok(sha256_str(&canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> BuildPlanParts {
        BuildPlanParts {
            source_dir: PathBuf::from("/src/plugin"),
            build_dir: PathBuf::from("/src/plugin/build"),
            sdk_list: ParsedList::parse("cs2").unwrap(),
            target_list: TargetSelection::EngineDefault,
            sdk_root_path: None,
            sdk_manifest_path: None,
            host_framework_path: None,
            debug_enabled: false,
            optimize_enabled: true,
        }
    }

    #[test]
    fn test_matrix_with_engine_default() {
        let mut p = parts();
        p.sdk_list = ParsedList::parse("cs2,hl2").unwrap();
        let plan = BuildPlan::from_parts(p);

        assert_eq!(
            plan.target_matrix(),
            vec![
                MatrixEntry {
                    sdk: "cs2",
                    arch: None
                },
                MatrixEntry {
                    sdk: "hl2",
                    arch: None
                },
            ]
        );
    }

    #[test]
    fn test_matrix_cross_product_order() {
        let mut p = parts();
        p.sdk_list = ParsedList::parse("cs2,hl2").unwrap();
        p.target_list = TargetSelection::Explicit(ParsedList::parse("x86_64,arm64").unwrap());
        let plan = BuildPlan::from_parts(p);

        let cells: Vec<(&str, Option<&str>)> = plan
            .target_matrix()
            .into_iter()
            .map(|e| (e.sdk, e.arch))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("cs2", Some("x86_64")),
                ("cs2", Some("arm64")),
                ("hl2", Some("x86_64")),
                ("hl2", Some("arm64")),
            ]
        );
    }

    #[test]
    fn test_json_shape() {
        let plan = BuildPlan::from_parts(parts());
        let value: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();

        assert_eq!(value["engine_api"], ENGINE_API);
        assert_eq!(value["sdk_list"], serde_json::json!(["cs2"]));
        assert_eq!(value["target_list"]["mode"], "engine_default");
        assert_eq!(value["debug_enabled"], false);
        assert_eq!(value["optimize_enabled"], true);
        assert!(value["sdk_root_path"].is_null());
    }

    #[test]
    fn test_json_paths() {
        let mut p = parts();
        p.target_list = TargetSelection::Explicit(ParsedList::parse("x86_64").unwrap());
        p.sdk_manifest_path = Some(ResolvedPath {
            path: PathBuf::from("/vendor/hl2sdk-manifests"),
            check: PathCheck::Eager,
            exists: true,
        });
        let plan = BuildPlan::from_parts(p);
        let value: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();

        assert_eq!(
            value["target_list"],
            serde_json::json!({"mode": "explicit", "archs": ["x86_64"]})
        );
        assert_eq!(
            value["sdk_manifest_path"],
            serde_json::json!({
                "path": "/vendor/hl2sdk-manifests",
                "check": "eager",
                "exists": true,
            })
        );
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = BuildPlan::from_parts(parts()).fingerprint().unwrap();
        let b = BuildPlan::from_parts(parts()).fingerprint().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let mut p = parts();
        p.debug_enabled = true;
        let c = BuildPlan::from_parts(p).fingerprint().unwrap();
        assert_ne!(a, c);
    }

    #[cfg(unix)]
    #[test]
    fn test_fingerprint_fails_without_json_form() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut p = parts();
        p.build_dir = PathBuf::from(OsStr::from_bytes(b"/work/\xff\xfe"));
        let odd = BuildPlan::from_parts(p);

        assert!(odd.fingerprint().is_err());
        assert!(odd.to_json().is_err());

        let mut q = parts();
        q.build_dir = PathBuf::from(OsStr::from_bytes(b"/work/\xfd"));
        assert!(BuildPlan::from_parts(q).fingerprint().is_err());
    }
}
