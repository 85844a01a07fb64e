use ferrowiki::core::context::RenderContext;
use ferrowiki::core::error::AppError;
use ferrowiki::core::filters::builtin::ProfanityFilter;
use ferrowiki::core::filters::{FilterChainBuilder, PageFilter};
use ferrowiki::core::modules::{ModuleManifest, ModuleRegistrar};
use ferrowiki::core::plugins::EngineInfo;
use ferrowiki::core::types::ErrorCategory;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Appends a marker to the content at every stage and records which stages
/// ran, so tests can observe chain order and short-circuiting.
struct TaggingFilter {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl TaggingFilter {
    fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self { name, log }
    }

    fn record(&self, stage: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, stage));
    }
}

impl PageFilter for TaggingFilter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn pre_translate(&self, _ctx: &mut RenderContext, content: String) -> Result<String, AppError> {
        self.record("pre_translate");
        Ok(format!("{}[{}]", content, self.name))
    }

    fn post_translate(
        &self,
        _ctx: &mut RenderContext,
        content: String,
    ) -> Result<String, AppError> {
        self.record("post_translate");
        Ok(content)
    }

    fn pre_save(&self, _ctx: &mut RenderContext, content: String) -> Result<String, AppError> {
        self.record("pre_save");
        Ok(content)
    }

    fn post_save(&self, _ctx: &mut RenderContext, _content: &str) -> Result<(), AppError> {
        self.record("post_save");
        Ok(())
    }
}

struct RedirectingFilter;

impl PageFilter for RedirectingFilter {
    fn name(&self) -> &'static str {
        "RedirectingFilter"
    }

    fn pre_translate(
        &self,
        _ctx: &mut RenderContext,
        _content: String,
    ) -> Result<String, AppError> {
        Err(AppError::redirect("LoginPage"))
    }
}

struct FailingPostSaveFilter;

impl PageFilter for FailingPostSaveFilter {
    fn name(&self) -> &'static str {
        "FailingPostSaveFilter"
    }

    fn post_save(&self, _ctx: &mut RenderContext, _content: &str) -> Result<(), AppError> {
        Err(AppError::new(
            ErrorCategory::FilterError,
            "notification hook exploded",
        ))
    }
}

/// Remembers the properties it was initialized with and publishes them
/// through a shared handle so tests can inspect the stored map.
#[derive(Default)]
struct PropertyProbeFilter {
    properties: HashMap<String, String>,
    seen: Arc<Mutex<HashMap<String, String>>>,
}

impl PageFilter for PropertyProbeFilter {
    fn name(&self) -> &'static str {
        "TestFilter"
    }

    fn initialize(&mut self, properties: &HashMap<String, String>) -> Result<(), AppError> {
        self.properties = properties.clone();
        *self.seen.lock().unwrap() = properties.clone();
        Ok(())
    }

    fn pre_translate(&self, _ctx: &mut RenderContext, content: String) -> Result<String, AppError> {
        let foobar = self.properties.get("foobar").cloned().unwrap_or_default();
        Ok(format!("{}{}", content, foobar))
    }
}

#[test]
fn filters_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = FilterChainBuilder::new();
    builder.register(Arc::new(TaggingFilter::new("first", Arc::clone(&log))));
    builder.register(Arc::new(TaggingFilter::new("second", Arc::clone(&log))));
    let chain = builder.build();

    let mut ctx = RenderContext::new("Main");
    let out = chain.run_pre_translate(&mut ctx, "x".to_string()).unwrap();
    assert_eq!(out, "x[first][second]");
    assert_eq!(
        *log.lock().unwrap(),
        vec!["first:pre_translate", "second:pre_translate"]
    );
}

#[test]
fn redirect_halts_later_filters() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = FilterChainBuilder::new();
    builder.register(Arc::new(RedirectingFilter));
    builder.register(Arc::new(TaggingFilter::new("after", Arc::clone(&log))));
    let chain = builder.build();

    let mut ctx = RenderContext::new("Main");
    let err = chain
        .run_pre_translate(&mut ctx, "x".to_string())
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::RedirectError);
    assert_eq!(err.redirect_location(), Some("LoginPage"));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn rejecting_filter_aborts_pre_save_chain() {
    struct RejectingFilter;
    impl PageFilter for RejectingFilter {
        fn name(&self) -> &'static str {
            "RejectingFilter"
        }
        fn pre_save(&self, _ctx: &mut RenderContext, _content: String) -> Result<String, AppError> {
            Err(AppError::new(
                ErrorCategory::FilterError,
                "content violates policy",
            ))
        }
    }

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = FilterChainBuilder::new();
    builder.register(Arc::new(RejectingFilter));
    builder.register(Arc::new(TaggingFilter::new("after", Arc::clone(&log))));
    let chain = builder.build();

    let mut ctx = RenderContext::new("Main");
    let err = chain.run_pre_save(&mut ctx, "x".to_string()).unwrap_err();
    assert_eq!(err.category, ErrorCategory::FilterError);
    assert_eq!(err.context.get("filter").map(String::as_str), Some("RejectingFilter"));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn post_save_failure_does_not_stop_the_chain() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = FilterChainBuilder::new();
    builder.register(Arc::new(FailingPostSaveFilter));
    builder.register(Arc::new(TaggingFilter::new("after", Arc::clone(&log))));
    let chain = builder.build();

    let mut ctx = RenderContext::new("Main");
    let failures = chain.run_post_save(&mut ctx, "committed");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].filter, "FailingPostSaveFilter");
    // The later filter still ran.
    assert_eq!(*log.lock().unwrap(), vec!["after:post_save"]);
}

#[test]
fn manifest_builds_chain_in_order_with_properties() {
    let manifest = ModuleManifest::load_from_str(
        r#"
version: "1"
modules:
  - name: ProfanityFilter
    kind: filter
    properties:
      words: "darn"
  - name: TestFilter
    kind: filter
    properties:
      foobar: "Zippadippadai"
      blatblaa: "5"
"#,
    )
    .unwrap();

    let mut registrar = ModuleRegistrar::new(
        EngineInfo {
            application_name: "TestWiki".to_string(),
            release_version: "0.3.0".to_string(),
        },
        false,
    )
    .unwrap();
    registrar.register_filter_factory("ProfanityFilter", || {
        Box::new(ProfanityFilter::default())
    });
    let seen = Arc::new(Mutex::new(HashMap::new()));
    let probe_seen = Arc::clone(&seen);
    registrar.register_filter_factory("TestFilter", move || {
        Box::new(PropertyProbeFilter {
            seen: Arc::clone(&probe_seen),
            ..Default::default()
        })
    });

    let (chain, _plugins) = registrar.instantiate(&manifest).unwrap();
    let names: Vec<&str> = chain.filter_list().iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["ProfanityFilter", "TestFilter"]);

    // The stored properties are exactly the manifest properties.
    let expected: HashMap<String, String> = [
        ("foobar".to_string(), "Zippadippadai".to_string()),
        ("blatblaa".to_string(), "5".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(*seen.lock().unwrap(), expected);

    // Both filters observe their manifest properties.
    let mut ctx = RenderContext::new("Main");
    let out = chain
        .run_pre_translate(&mut ctx, "darn ".to_string())
        .unwrap();
    assert_eq!(out, "d*** Zippadippadai");
}

#[test]
fn empty_chain_is_passthrough() {
    let chain = FilterChainBuilder::new().build();
    let mut ctx = RenderContext::new("Main");
    let out = chain
        .run_pre_translate(&mut ctx, "untouched".to_string())
        .unwrap();
    assert_eq!(out, "untouched");
    assert!(chain.run_post_save(&mut ctx, "untouched").is_empty());
}
