//! End-to-end tests for the analyze / fix pipeline.
//!
//! The generation service is replaced by in-process fakes, so nothing here
//! touches the network.
//!
//! Run with: `cargo test --package docweave-core --test pipeline`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use docweave_core::{
    analyze, Connection, Diagnostic, DocError, DocFixer, DocGenerator, FixOutcome,
    GenerationError, LineEndingStyle, OverridesBehavior, ServiceSettings, Settings,
    SharedSettings, SourceDocument,
};

// =============================================================================
// Fake generators
// =============================================================================

/// Answers every request with the same fenced summary and counts calls.
struct Counting {
    calls: AtomicUsize,
}

impl Counting {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocGenerator for Counting {
    async fn generate(&self, _: &Connection, _: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("```xml\n/// <summary>\n/// Does things.\n/// </summary>\n```".to_string())
    }
}

/// Fails for declarations whose source mentions `Broken`.
struct Failing;

#[async_trait]
impl DocGenerator for Failing {
    async fn generate(&self, _: &Connection, prompt: &str) -> Result<String, GenerationError> {
        if prompt.contains("Broken") {
            Err(GenerationError::Request("503 service unavailable".to_string()))
        } else {
            Ok("/// <summary>Works.</summary>".to_string())
        }
    }
}

/// Never answers.
struct Hanging;

#[async_trait]
impl DocGenerator for Hanging {
    async fn generate(&self, _: &Connection, _: &str) -> Result<String, GenerationError> {
        std::future::pending().await
    }
}

fn configured() -> Settings {
    Settings::default().with_service(ServiceSettings::new("test-key", "test-model"))
}

fn parse(source: &str) -> SourceDocument {
    SourceDocument::parse(source).unwrap()
}

fn diagnostic_named<'a>(diagnostics: &'a [Diagnostic], name: &str) -> &'a Diagnostic {
    diagnostics
        .iter()
        .find(|d| d.name == name)
        .unwrap_or_else(|| panic!("no diagnostic for {}", name))
}

async fn fix_everything(fixer: &DocFixer, source: &str, settings: &Settings) -> String {
    let doc = parse(source);
    let diagnostics = analyze(&doc, settings);
    let outcome = fixer
        .fix_all(&doc, &diagnostics, settings, &CancellationToken::new())
        .await
        .unwrap();
    assert!(outcome.failures.is_empty());
    outcome.text
}

const MIXED_MEMBERS: &str = r#"namespace Shop
{
    public class Cart : Base
    {
        private const string Currency = "EUR";

        public int Count { get; set; }

        public override string ToString() => "cart";

        public void Add(Item item)
        {
            var total = 0;
        }
    }
}
"#;

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_undocumented_class_is_reported_at_its_name() {
    let doc = parse("class MyClass {}");
    let diagnostics = analyze(&doc, &Settings::default());

    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.id, "DW001");
    assert_eq!(diagnostic.arguments(), ("ClassDeclaration", "MyClass"));
    assert_eq!(doc.slice(diagnostic.span), "MyClass");
    assert_eq!((diagnostic.start.line, diagnostic.start.column), (1, 7));
}

#[tokio::test]
async fn test_literal_constant_uses_its_value() {
    let source = "class Config\n{\n    const string MyConst = \"Foo\";\n}\n";
    let doc = parse(source);
    let generator = Counting::new();
    let fixer = DocFixer::new(generator.clone());
    let settings = configured();

    let diagnostics = analyze(&doc, &settings);
    let diagnostic = diagnostic_named(&diagnostics, "MyConst");
    assert_eq!(diagnostic.arguments().0, "FieldDeclaration");

    let outcome = fixer
        .fix_diagnostic(&doc, diagnostic, &settings, &CancellationToken::new())
        .await
        .unwrap();
    let FixOutcome::Applied(injection) = outcome else {
        panic!("expected an edit, got {:?}", outcome);
    };

    assert_eq!(
        injection.apply(doc.text()),
        "class Config\n{\n    /// <summary>Foo</summary>\n    const string MyConst = \"Foo\";\n}\n"
    );
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_override_gets_inheritdoc_without_service_call() {
    let source = "class Derived : Base\n{\n    public override void Run() { }\n}\n";
    let doc = parse(source);
    let generator = Counting::new();
    let fixer = DocFixer::new(generator.clone());
    let settings = configured().with_overrides(OverridesBehavior::UseInheritDoc);

    let diagnostics = analyze(&doc, &settings);
    let run = diagnostic_named(&diagnostics, "Run");
    let outcome = fixer
        .fix_diagnostic(&doc, run, &settings, &CancellationToken::new())
        .await
        .unwrap();

    let FixOutcome::Applied(injection) = outcome else {
        panic!("expected an edit");
    };
    assert_eq!(
        injection.apply(doc.text()),
        "class Derived : Base\n{\n    /// <inheritdoc />\n    public override void Run() { }\n}\n"
    );
    assert_eq!(generator.calls(), 0);
}

#[test]
fn test_override_not_reported_when_not_documented_by_policy() {
    let doc = parse("class Derived : Base\n{\n    public override void Run() { }\n}\n");
    let settings = Settings::default().with_overrides(OverridesBehavior::DoNotDocument);

    let diagnostics = analyze(&doc, &settings);
    let names: Vec<_> = diagnostics.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Derived"]);
}

#[test]
fn test_explicit_interface_implementation_counts_as_override() {
    let doc = parse("class Shape : IShape\n{\n    double IShape.Area() => 0;\n}\n");
    let settings = Settings::default().with_overrides(OverridesBehavior::DoNotDocument);

    assert_eq!(analyze(&doc, &settings).len(), 1);
}

#[test]
fn test_field_reported_at_first_declarator() {
    let doc = parse("class Pair\n{\n    int left, right;\n}\n");
    let diagnostics = analyze(&doc, &Settings::default());

    let field = &diagnostics[1];
    assert_eq!(field.arguments(), ("FieldDeclaration", "left"));
    assert_eq!(doc.slice(field.span), "left");
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn test_documented_declarations_never_reported() {
    let source = r#"/// <summary>Documented.</summary>
class Documented : Base
{
    /** <summary>Block doc.</summary> */
    public override void Run() { }

    /// <summary>Constant.</summary>
    const int Answer = 42;

    /// <inheritdoc />
    [Obsolete]
    public int Value { get; }
}
"#;
    let doc = parse(source);

    for overrides in [
        OverridesBehavior::UseInheritDoc,
        OverridesBehavior::DoNotDocument,
        OverridesBehavior::Synthesize,
    ] {
        for literal in [true, false] {
            let settings = Settings::default()
                .with_overrides(overrides)
                .with_literal_constants(literal);
            assert!(analyze(&doc, &settings).is_empty(), "{:?} {}", overrides, literal);
        }
    }
}

#[test]
fn test_doc_comment_above_preprocessor_directives_counts() {
    let directives = [
        ("#if DEBUG", "#endif"),
        ("#pragma warning disable CS0618", ""),
        ("#region Members", "#endregion"),
    ];
    for (directive, closing) in directives {
        let source = format!(
            "class A\n{{\n    /// <summary>M</summary>\n{}\n    void M() {{ }}\n{}\n}}\n",
            directive, closing
        );
        let names: Vec<_> = analyze(&parse(&source), &Settings::default())
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["A".to_string()], "{}", directive);
    }
}

#[tokio::test]
async fn test_fix_inside_conditional_block_is_idempotent() {
    let source = "class A\n{\n#if DEBUG\n    void M() { }\n#endif\n}\n";
    let fixer = DocFixer::new(Counting::new());
    let settings = configured();

    let fixed = fix_everything(&fixer, source, &settings).await;
    assert!(fixed.contains("#if DEBUG\n    /// "));
    assert!(analyze(&parse(&fixed), &settings).is_empty());
    assert_eq!(fix_everything(&fixer, &fixed, &settings).await, fixed);
}

#[test]
fn test_plain_and_quadruple_slash_comments_are_not_documentation() {
    let doc = parse("//// banner\n// note\n/**/\nclass A { }\n");
    assert_eq!(analyze(&doc, &Settings::default()).len(), 1);
}

#[test]
fn test_settings_changes_are_seen_on_next_analysis() {
    let shared = SharedSettings::new(Settings::default());
    let doc = parse("class Derived : Base\n{\n    public override void Run() { }\n}\n");

    assert_eq!(analyze(&doc, &shared.snapshot()).len(), 2);
    shared.update(|s| s.overrides = OverridesBehavior::DoNotDocument);
    assert_eq!(analyze(&doc, &shared.snapshot()).len(), 1);
}

#[tokio::test]
async fn test_fix_all_then_analyze_is_clean() {
    let generator = Counting::new();
    let fixer = DocFixer::new(generator.clone());
    let settings = configured();

    let fixed = fix_everything(&fixer, MIXED_MEMBERS, &settings).await;

    assert!(analyze(&parse(&fixed), &settings).is_empty());
    assert!(fixed.contains("        /// <summary>EUR</summary>\n        private const string Currency"));
    assert!(fixed.contains("        /// <inheritdoc />\n        public override string ToString()"));
    // namespace is not a documented kind; Cart, Count and Add are generated
    assert_eq!(generator.calls(), 3);
    // locals stay untouched
    assert!(fixed.contains("        {\n            var total = 0;"));
}

#[tokio::test]
async fn test_fix_keeps_lf_documents_lf() {
    let fixer = DocFixer::new(Counting::new());
    let fixed = fix_everything(&fixer, MIXED_MEMBERS, &configured()).await;

    assert_eq!(LineEndingStyle::detect(&fixed), LineEndingStyle::Lf);
}

#[tokio::test]
async fn test_fix_keeps_crlf_documents_crlf() {
    let source = MIXED_MEMBERS.replace('\n', "\r\n");
    let fixer = DocFixer::new(Counting::new());
    let fixed = fix_everything(&fixer, &source, &configured()).await;

    assert_eq!(LineEndingStyle::detect(&fixed), LineEndingStyle::CrLf);
    assert!(analyze(&parse(&fixed), &configured()).is_empty());
}

#[tokio::test]
async fn test_compiler_diagnostic_is_fixable() {
    let doc = parse("class A { }\n");
    let fixer = DocFixer::new(Counting::new());
    let settings = configured();

    let mut diagnostic = analyze(&doc, &settings).remove(0);
    diagnostic.id = "CS1591".to_string();
    let outcome = fixer
        .fix_diagnostic(&doc, &diagnostic, &settings, &CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(outcome, FixOutcome::Applied(_)));

    diagnostic.id = "CS0168".to_string();
    let outcome = fixer
        .fix_diagnostic(&doc, &diagnostic, &settings, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome, FixOutcome::NotApplicable);
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_service_error_leaves_document_unchanged() {
    let doc = parse("class Broken { }\n");
    let fixer = DocFixer::new(Arc::new(Failing));
    let settings = configured();
    let diagnostic = analyze(&doc, &settings).remove(0);

    let result = fixer
        .fix_diagnostic(&doc, &diagnostic, &settings, &CancellationToken::new())
        .await;
    match result {
        Err(e @ DocError::Service { .. }) => assert!(e.is_retryable()),
        other => panic!("expected a service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_batch_collects_failures_and_applies_the_rest() {
    let source = "class Fine { }\nclass Broken { }\n";
    let doc = parse(source);
    let fixer = DocFixer::new(Arc::new(Failing));
    let settings = configured();
    let diagnostics = analyze(&doc, &settings);

    let outcome = fixer
        .fix_all(&doc, &diagnostics, &settings, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0.name, "Broken");
    assert_eq!(
        outcome.text,
        "/// <summary>Works.</summary>\nclass Fine { }\nclass Broken { }\n"
    );
}

#[tokio::test]
async fn test_cancelled_batch_returns_original_text() {
    let source = "class A { }\nclass B { }\n";
    let doc = parse(source);
    let fixer = DocFixer::new(Arc::new(Hanging));
    let settings = configured();
    let diagnostics = analyze(&doc, &settings);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let outcome = fixer
        .fix_all(&doc, &diagnostics, &settings, &cancel)
        .await
        .unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.applied, 0);
    assert_eq!(outcome.text, source);
}

#[tokio::test]
async fn test_missing_configuration_inserts_marker_once() {
    let doc = parse("class A\n{\n    void Run() { }\n}\n");
    let generator = Counting::new();
    let fixer = DocFixer::new(generator.clone());
    let settings = Settings::default().with_service(ServiceSettings {
        api_key: None,
        ..ServiceSettings::new("unused", "test-model")
    });

    let run = analyze(&doc, &settings)
        .into_iter()
        .find(|d| d.name == "Run")
        .unwrap();
    let FixOutcome::Applied(injection) = fixer
        .fix_diagnostic(&doc, &run, &settings, &CancellationToken::new())
        .await
        .unwrap()
    else {
        panic!("expected the marker to be inserted");
    };
    let marked = injection.apply(doc.text());
    assert!(marked.contains("    // Missing ApiKey - configure the generation service"));
    assert_eq!(generator.calls(), 0);

    // still undocumented, but a second fix does not repeat the marker
    let doc = parse(&marked);
    let run = analyze(&doc, &settings)
        .into_iter()
        .find(|d| d.name == "Run")
        .unwrap();
    let outcome = fixer
        .fix_diagnostic(&doc, &run, &settings, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome, FixOutcome::NotApplicable);
}
