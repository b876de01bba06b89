//! Configuration resolver - turns raw option values into a `BuildPlan`.
//!
//! Resolution is deterministic and fail-fast: options are visited in registry
//! order and the first rejected value aborts with a `ResolutionError`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::list::ParsedList;
use crate::core::option::{OptionDefault, OptionDescriptor, OptionKind, PathCheck};
use crate::core::plan::{BuildPlan, BuildPlanParts, ResolvedPath, TargetSelection};
use crate::core::registry::{names, OptionRegistry};
use crate::resolver::errors::{PathNotFoundError, ResolutionCause, ResolutionError};
use crate::resolver::raw::{RawInput, RawValue};
use crate::util::fs::absolutize;

/// A single option after defaulting and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedValue {
    List(Option<ParsedList>),
    Path(Option<ResolvedPath>),
    Flag(bool),
}

/// Every registered option, resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedOptions {
    values: BTreeMap<String, ResolvedValue>,
}

impl ResolvedOptions {
    pub fn get(&self, name: &str) -> Option<&ResolvedValue> {
        self.values.get(name)
    }

    fn list(&self, name: &str) -> Result<Option<ParsedList>, ResolutionError> {
        match self.values.get(name) {
            Some(ResolvedValue::List(list)) => Ok(list.clone()),
            _ => Err(ResolutionError::new(name, None, ResolutionCause::Unregistered)),
        }
    }

    fn path(&self, name: &str) -> Result<Option<ResolvedPath>, ResolutionError> {
        match self.values.get(name) {
            Some(ResolvedValue::Path(path)) => Ok(path.clone()),
            _ => Err(ResolutionError::new(name, None, ResolutionCause::Unregistered)),
        }
    }

    fn flag(&self, name: &str) -> Result<bool, ResolutionError> {
        match self.values.get(name) {
            Some(ResolvedValue::Flag(on)) => Ok(*on),
            _ => Err(ResolutionError::new(name, None, ResolutionCause::Unregistered)),
        }
    }
}

/// Resolves raw input against a registry.
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    registry: &'a OptionRegistry,
    cwd: PathBuf,
    source_dir: Option<PathBuf>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver. Relative paths are taken against `cwd`, which is
    /// also the build directory handed to the engine.
    pub fn new(registry: &'a OptionRegistry, cwd: impl Into<PathBuf>) -> Self {
        Resolver {
            registry,
            cwd: cwd.into(),
            source_dir: None,
        }
    }

    /// Directory holding the plugin's build scripts (defaults to `cwd`).
    pub fn with_source_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.source_dir = Some(absolutize(&self.cwd, dir.as_ref()));
        self
    }

    /// Resolve every option and compose the build plan.
    pub fn resolve(&self, raw: &RawInput) -> Result<BuildPlan, ResolutionError> {
        let options = self.resolve_options(raw)?;

        let target_list = match options.list(names::TARGETS)? {
            Some(list) => TargetSelection::Explicit(list),
            None => TargetSelection::EngineDefault,
        };
        let sdk_list = options.list(names::SDKS)?.ok_or_else(|| {
            ResolutionError::new(
                names::SDKS,
                None,
                ResolutionCause::KindMismatch {
                    expected: "list",
                    reason: "no SDK selected and the registry declares no default".into(),
                },
            )
        })?;

        let build_dir = absolutize(&self.cwd, Path::new("."));
        let source_dir = self.source_dir.clone().unwrap_or_else(|| build_dir.clone());

        let plan = BuildPlan::from_parts(BuildPlanParts {
            source_dir,
            build_dir,
            sdk_list,
            target_list,
            sdk_root_path: options.path(names::SDK_ROOT)?,
            sdk_manifest_path: options.path(names::SDK_MANIFESTS)?,
            host_framework_path: options.path(names::MMS_PATH)?,
            debug_enabled: options.flag(names::DEBUG)?,
            optimize_enabled: options.flag(names::OPTIMIZE)?,
        });

        match plan.fingerprint() {
            Ok(fingerprint) => info!(
                sdks = %plan.sdk_list(),
                cells = plan.target_matrix().len(),
                fingerprint = %fingerprint,
                "resolved build plan"
            ),
            Err(e) => warn!(
                sdks = %plan.sdk_list(),
                "resolved build plan has no JSON form: {}",
                e
            ),
        }

        Ok(plan)
    }

    /// Resolve every registered option without composing a plan.
    pub fn resolve_options(&self, raw: &RawInput) -> Result<ResolvedOptions, ResolutionError> {
        for name in raw.names() {
            if !self.registry.contains(name) {
                return Err(ResolutionError::new(
                    name,
                    raw.get(name).and_then(RawValue::display),
                    ResolutionCause::UnknownOption,
                ));
            }
        }

        let mut options = ResolvedOptions::default();
        for desc in self.registry.all() {
            let value = self.resolve_one(desc, raw.get(&desc.name))?;
            debug!(
                option = %desc.name,
                supplied = raw.get(&desc.name).is_some(),
                value = ?value,
                "resolved option"
            );
            options.values.insert(desc.name.clone(), value);
        }

        Ok(options)
    }

    fn resolve_one(
        &self,
        desc: &OptionDescriptor,
        raw: Option<&RawValue>,
    ) -> Result<ResolvedValue, ResolutionError> {
        let reject = |value: Option<String>, cause: ResolutionCause| {
            ResolutionError::new(desc.name.clone(), value, cause)
        };
        let mismatch = |value: Option<String>, reason: &str| {
            reject(
                value,
                ResolutionCause::KindMismatch {
                    expected: desc.kind.as_str(),
                    reason: reason.to_string(),
                },
            )
        };

        match desc.kind {
            OptionKind::Flag => match (raw, &desc.default) {
                (Some(RawValue::Flag), _) => Ok(ResolvedValue::Flag(true)),
                (Some(RawValue::Str(s)), _) => Err(mismatch(
                    Some(s.clone()),
                    "flags take no value; pass the switch to enable it",
                )),
                (None, OptionDefault::Bool(on)) => Ok(ResolvedValue::Flag(*on)),
                (None, OptionDefault::Unset) => Ok(ResolvedValue::Flag(false)),
                (None, OptionDefault::Str(s)) => {
                    Err(mismatch(Some(s.clone()), "registry default is not a boolean"))
                }
            },

            OptionKind::List => {
                let input = match (raw, &desc.default) {
                    (Some(RawValue::Str(s)), _) => s.as_str(),
                    (Some(RawValue::Flag), _) => {
                        return Err(mismatch(None, "a comma-separated value is required"))
                    }
                    (None, OptionDefault::Str(s)) => s.as_str(),
                    (None, OptionDefault::Unset) => return Ok(ResolvedValue::List(None)),
                    (None, OptionDefault::Bool(_)) => {
                        return Err(mismatch(None, "registry default is a boolean"))
                    }
                };
                ParsedList::parse(input)
                    .map(|list| ResolvedValue::List(Some(list)))
                    .map_err(|e| reject(Some(input.to_string()), e.into()))
            }

            OptionKind::Path { check } => {
                let input = match (raw, &desc.default) {
                    (Some(RawValue::Str(s)), _) => s.as_str(),
                    (Some(RawValue::Flag), _) => return Err(mismatch(None, "a path is required")),
                    (None, OptionDefault::Str(s)) => s.as_str(),
                    (None, OptionDefault::Unset) => return Ok(ResolvedValue::Path(None)),
                    (None, OptionDefault::Bool(_)) => {
                        return Err(mismatch(None, "registry default is a boolean"))
                    }
                };
                if input.trim().is_empty() {
                    return Err(mismatch(Some(input.to_string()), "path is empty"));
                }

                let path = absolutize(&self.cwd, Path::new(input));
                let exists = path.exists();
                match check {
                    PathCheck::Eager if !exists => {
                        return Err(reject(
                            Some(input.to_string()),
                            PathNotFoundError { path }.into(),
                        ));
                    }
                    PathCheck::Lazy if !exists => {
                        warn!(
                            "`--{}` points to {} which does not exist yet",
                            desc.name,
                            path.display()
                        );
                    }
                    _ => {}
                }

                Ok(ResolvedValue::Path(Some(ResolvedPath {
                    path,
                    check,
                    exists,
                })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::core::list::EmptyListError;

    fn registry() -> OptionRegistry {
        OptionRegistry::standard().unwrap()
    }

    #[test]
    fn test_defaults() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        let plan = Resolver::new(&reg, tmp.path())
            .resolve(&RawInput::new())
            .unwrap();

        assert_eq!(plan.sdk_list().as_slice(), &["cs2".to_string()]);
        assert!(plan.target_list().is_engine_default());
        assert!(!plan.debug_enabled());
        assert!(plan.optimize_enabled());
        assert!(plan.sdk_root_path().is_none());
        assert!(plan.sdk_manifest_path().is_none());
        assert!(plan.host_framework_path().is_none());
        assert_eq!(plan.build_dir(), tmp.path());
        assert_eq!(plan.source_dir(), tmp.path());
    }

    #[test]
    fn test_explicit_sdk_scenario() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        let raw = RawInput::new().with_str(names::SDKS, "cs2");
        let plan = Resolver::new(&reg, tmp.path()).resolve(&raw).unwrap();

        assert_eq!(plan.sdk_list().as_slice(), &["cs2".to_string()]);
        assert_eq!(plan.target_list(), &TargetSelection::EngineDefault);
        assert!(!plan.debug_enabled());
        assert!(plan.optimize_enabled());
    }

    #[test]
    fn test_lists_are_normalized() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        let raw = RawInput::new()
            .with_str(names::SDKS, "cs2, cs2,hl2")
            .with_str(names::TARGETS, " x86_64 ,x86 ");
        let plan = Resolver::new(&reg, tmp.path()).resolve(&raw).unwrap();

        assert_eq!(
            plan.sdk_list().as_slice(),
            &["cs2".to_string(), "hl2".to_string()]
        );
        let targets = plan.target_list().explicit().unwrap();
        assert_eq!(targets.as_slice(), &["x86_64".to_string(), "x86".to_string()]);
        assert_eq!(plan.target_matrix().len(), 4);
    }

    #[test]
    fn test_blank_list_is_error_not_default() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();

        for (option, value) in [(names::SDKS, ""), (names::SDKS, "  "), (names::TARGETS, " , ")] {
            let raw = RawInput::new().with_str(option, value);
            let err = Resolver::new(&reg, tmp.path()).resolve(&raw).unwrap_err();
            assert_eq!(err.option, option);
            assert_eq!(err.value.as_deref(), Some(value));
            assert_eq!(
                err.cause,
                ResolutionCause::EmptyList(EmptyListError {
                    input: value.to_string()
                })
            );
        }
    }

    #[test]
    fn test_debug_and_optimize_are_independent() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        let resolver = Resolver::new(&reg, tmp.path());

        let both = resolver
            .resolve(
                &RawInput::new()
                    .with_flag(names::DEBUG)
                    .with_flag(names::OPTIMIZE),
            )
            .unwrap();
        assert!(both.debug_enabled());
        assert!(both.optimize_enabled());

        let debug_only = resolver
            .resolve(&RawInput::new().with_flag(names::DEBUG))
            .unwrap();
        assert!(debug_only.debug_enabled());
        assert!(debug_only.optimize_enabled());
    }

    #[test]
    fn test_flag_with_value_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        let raw = RawInput::new().with_str(names::DEBUG, "0");
        let err = Resolver::new(&reg, tmp.path()).resolve(&raw).unwrap_err();
        assert_eq!(err.option, names::DEBUG);
        assert!(matches!(
            err.cause,
            ResolutionCause::KindMismatch {
                expected: "flag",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        let raw = RawInput::new().with_str("sdk", "cs2");
        let err = Resolver::new(&reg, tmp.path()).resolve(&raw).unwrap_err();
        assert_eq!(err.option, "sdk");
        assert_eq!(err.cause, ResolutionCause::UnknownOption);
    }

    #[test]
    fn test_lazy_paths_are_normalized_without_existing() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        let raw = RawInput::new()
            .with_str(names::SDK_ROOT, "vendor/./hl2sdk")
            .with_str(names::MMS_PATH, "../mms");
        let plan = Resolver::new(&reg, tmp.path().join("build"))
            .resolve(&raw)
            .unwrap();

        let root = plan.sdk_root_path().unwrap();
        assert_eq!(root.path, tmp.path().join("build").join("vendor").join("hl2sdk"));
        assert_eq!(root.check, PathCheck::Lazy);
        assert!(!root.exists);

        let mms = plan.host_framework_path().unwrap();
        assert_eq!(mms.path, tmp.path().join("mms"));
    }

    #[test]
    fn test_existing_lazy_path_is_recorded() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("mmsource-2.0")).unwrap();
        let reg = registry();
        let raw = RawInput::new().with_str(names::MMS_PATH, "mmsource-2.0");
        let plan = Resolver::new(&reg, tmp.path()).resolve(&raw).unwrap();
        assert!(plan.host_framework_path().unwrap().exists);
    }

    #[test]
    fn test_missing_manifests_fail_eagerly() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        let raw = RawInput::new().with_str(names::SDK_MANIFESTS, "hl2sdk-manifests");
        let err = Resolver::new(&reg, tmp.path()).resolve(&raw).unwrap_err();

        assert_eq!(err.option, names::SDK_MANIFESTS);
        assert_eq!(
            err.cause,
            ResolutionCause::PathNotFound(PathNotFoundError {
                path: tmp.path().join("hl2sdk-manifests")
            })
        );
    }

    #[test]
    fn test_present_manifests_resolve() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("hl2sdk-manifests")).unwrap();
        let reg = registry();
        let raw = RawInput::new().with_str(names::SDK_MANIFESTS, "hl2sdk-manifests");
        let plan = Resolver::new(&reg, tmp.path()).resolve(&raw).unwrap();

        let manifests = plan.sdk_manifest_path().unwrap();
        assert_eq!(manifests.check, PathCheck::Eager);
        assert!(manifests.exists);
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        let raw = RawInput::new().with_str(names::SDK_ROOT, "  ");
        let err = Resolver::new(&reg, tmp.path()).resolve(&raw).unwrap_err();
        assert_eq!(err.option, names::SDK_ROOT);
    }

    #[test]
    fn test_first_error_wins() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        // hl2sdk-manifests is registered before sdks.
        let raw = RawInput::new()
            .with_str(names::SDKS, "")
            .with_str(names::SDK_MANIFESTS, "missing");
        let err = Resolver::new(&reg, tmp.path()).resolve(&raw).unwrap_err();
        assert_eq!(err.option, names::SDK_MANIFESTS);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        let raw = RawInput::new()
            .with_str(names::SDKS, "hl2,cs2")
            .with_str(names::TARGETS, "x86_64")
            .with_flag(names::DEBUG);
        let resolver = Resolver::new(&reg, tmp.path());

        let a = resolver.resolve(&raw).unwrap();
        let b = resolver.resolve(&raw).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn test_source_dir_is_absolutized() {
        let tmp = TempDir::new().unwrap();
        let reg = registry();
        let plan = Resolver::new(&reg, tmp.path().join("build"))
            .with_source_dir("..")
            .resolve(&RawInput::new())
            .unwrap();
        assert_eq!(plan.source_dir(), tmp.path());
        assert_eq!(plan.build_dir(), tmp.path().join("build"));
    }

    #[test]
    fn test_registry_without_builtin_option() {
        let tmp = TempDir::new().unwrap();
        let mut reg = OptionRegistry::new();
        reg.register(OptionDescriptor::list(names::SDKS, "SDKs").with_default("cs2"))
            .unwrap();

        let options = Resolver::new(&reg, tmp.path())
            .resolve_options(&RawInput::new())
            .unwrap();
        assert!(options.get(names::SDKS).is_some());

        let err = Resolver::new(&reg, tmp.path())
            .resolve(&RawInput::new())
            .unwrap_err();
        assert_eq!(err.cause, ResolutionCause::Unregistered);
    }
}
