use ferrowiki::core::modules::{
    compare_versions, parse_version, ModuleManifest, ModuleRegistrar, VersionBounds,
};
use ferrowiki::core::plugins::EngineInfo;
use ferrowiki::core::types::{ErrorCategory, ModuleKind};
use std::cmp::Ordering;
use std::fs;
use tempfile::TempDir;

fn engine() -> EngineInfo {
    EngineInfo {
        application_name: "TestWiki".to_string(),
        release_version: "2.4.0".to_string(),
    }
}

#[test]
fn version_parsing_accepts_dotted_numerics_only() {
    assert_eq!(parse_version("2.4"), Some(vec![2, 4]));
    assert_eq!(parse_version("2.4.0"), Some(vec![2, 4, 0]));
    assert_eq!(parse_version("10"), Some(vec![10]));
    assert_eq!(parse_version("two.four"), None);
    assert_eq!(parse_version(""), None);
    assert_eq!(parse_version("1..2"), None);
}

#[test]
fn missing_components_compare_as_zero() {
    assert_eq!(
        compare_versions(&parse_version("2.4").unwrap(), &parse_version("2.4.0").unwrap()),
        Ordering::Equal
    );
    assert_eq!(
        compare_versions(&parse_version("2.4.1").unwrap(), &parse_version("2.4").unwrap()),
        Ordering::Greater
    );
    assert_eq!(
        compare_versions(&parse_version("2").unwrap(), &parse_version("2.0.1").unwrap()),
        Ordering::Less
    );
}

#[test]
fn bounds_are_inclusive_on_both_ends() {
    let bounds = VersionBounds {
        min: parse_version("2.0"),
        max: parse_version("2.4"),
    };
    assert!(bounds.accepts(&parse_version("2.0").unwrap()));
    assert!(bounds.accepts(&parse_version("2.2.9").unwrap()));
    assert!(bounds.accepts(&parse_version("2.4.0").unwrap()));
    assert!(!bounds.accepts(&parse_version("2.4.1").unwrap()));
    assert!(!bounds.accepts(&parse_version("1.9").unwrap()));

    let open = VersionBounds {
        min: None,
        max: None,
    };
    assert!(open.accepts(&parse_version("99").unwrap()));
}

#[test]
fn manifest_loads_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("modules.yaml");
    fs::write(
        &path,
        r#"
version: "1"
modules:
  - name: ProfanityFilter
    kind: filter
  - name: Echo
    kind: plugin
    aliases: [EchoPlugin]
    min_version: "2.0"
    max_version: "3.0"
"#,
    )
    .unwrap();

    let manifest = ModuleManifest::load_from_file(&path).unwrap();
    assert_eq!(manifest.filters().count(), 1);
    assert_eq!(manifest.plugins().count(), 1);
    let echo = manifest.plugins().next().unwrap();
    assert_eq!(echo.aliases, vec!["EchoPlugin".to_string()]);
    assert_eq!(echo.kind, ModuleKind::Plugin);
}

#[test]
fn alias_colliding_with_module_name_is_rejected() {
    let result = ModuleManifest::load_from_str(
        r#"
version: "1"
modules:
  - name: Echo
    kind: plugin
  - name: Counter
    kind: plugin
    aliases: [echo]
"#,
    );
    assert!(result.is_err());
}

#[test]
fn unsupported_manifest_version_is_rejected() {
    let result = ModuleManifest::load_from_str(
        r#"
version: "2"
modules: []
"#,
    );
    assert!(result.is_err());
}

#[test]
fn eager_init_is_plugin_only() {
    let result = ModuleManifest::load_from_str(
        r#"
version: "1"
modules:
  - name: ProfanityFilter
    kind: filter
    eager_init: true
"#,
    );
    assert!(result.is_err());
}

#[test]
fn out_of_range_module_is_skipped_by_default() {
    let manifest = ModuleManifest::load_from_str(
        r#"
version: "1"
modules:
  - name: Echo
    kind: plugin
    max_version: "1.9"
  - name: Counter
    kind: plugin
"#,
    )
    .unwrap();
    let registrar = ModuleRegistrar::with_builtins(engine(), false).unwrap();
    let (_filters, plugins) = registrar.instantiate(&manifest).unwrap();
    // Echo is out of range for engine 2.4.0; Counter remains.
    assert_eq!(plugins.len(), 1);
    assert!(plugins.resolve("Counter").is_ok());
    assert!(plugins.resolve("Echo").is_err());
}

#[test]
fn allow_incompatible_admits_out_of_range_modules() {
    let manifest = ModuleManifest::load_from_str(
        r#"
version: "1"
modules:
  - name: Echo
    kind: plugin
    max_version: "1.9"
"#,
    )
    .unwrap();
    let registrar = ModuleRegistrar::with_builtins(engine(), true).unwrap();
    let (_filters, plugins) = registrar.instantiate(&manifest).unwrap();
    assert!(plugins.resolve("Echo").is_ok());
}

#[test]
fn malformed_bound_is_a_validation_error() {
    let err = ModuleManifest::load_from_str(
        r#"
version: "1"
modules:
  - name: Echo
    kind: plugin
    min_version: "two"
"#,
    )
    .unwrap_err();
    assert_eq!(err.category, ErrorCategory::ValidationError);
}
