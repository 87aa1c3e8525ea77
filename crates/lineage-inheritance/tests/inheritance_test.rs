use lineage_core::config::InheritanceConfig;
use lineage_core::{
    AnalysisError, AnalysisInput, AnalysisPipeline, Analyzer, CodeGraph, Config,
    FilterCollection, MetricMap, MetricValue, ModelDocument, PackageFilter, TypeId,
};
use lineage_inheritance::{InheritanceAnalyzer, AHH, ANDC, DIT, MAX_DIT, NOAM, NOC, NOOM};

const LINEAR: &str = include_str!("fixtures/linear.toml");
const LIBRARY: &str = include_str!("fixtures/library.toml");

fn load(fixture: &str) -> CodeGraph {
    ModelDocument::from_toml_str(fixture)
        .unwrap()
        .build()
        .unwrap()
}

fn analyze(
    graph: &CodeGraph,
    filters: &FilterCollection,
    config: InheritanceConfig,
) -> InheritanceAnalyzer {
    let mut analyzer = InheritanceAnalyzer::with_config(config);
    analyzer
        .analyze(&AnalysisInput::all(graph, filters))
        .unwrap();
    analyzer
}

fn lookup(graph: &CodeGraph, name: &str) -> TypeId {
    graph.type_by_qualified_name(name).unwrap()
}

fn assert_close(actual: MetricValue, expected: f64) {
    assert!(
        (actual.as_f64() - expected).abs() < 0.0001,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_dit_per_level() {
    let graph = load(LINEAR);
    let analyzer = analyze(&graph, &FilterCollection::new(), InheritanceConfig::default());

    for (level, name) in ["Entity", "Record", "Versioned", "Audited"].iter().enumerate() {
        let metrics = analyzer.node_metrics(lookup(&graph, &format!("model::{name}")));
        assert_eq!(metrics[DIT], MetricValue::Int(level as i64), "{name}");
    }
}

#[test]
fn test_four_level_chain_project_metrics() {
    let graph = load(LINEAR);
    let analyzer = analyze(&graph, &FilterCollection::new(), InheritanceConfig::default());

    let project = analyzer.project_metrics();
    assert_close(project[ANDC], 1.0);
    assert_close(project[AHH], 1.5);
    assert_eq!(project[MAX_DIT], MetricValue::Int(3));

    let audited = analyzer.node_metrics(lookup(&graph, "model::Audited"));
    assert_eq!(audited[NOC], MetricValue::Int(0));
    let entity = analyzer.node_metrics(lookup(&graph, "model::Entity"));
    assert_eq!(entity[NOC], MetricValue::Int(1));
}

#[test]
fn test_added_and_overridden_methods() {
    let graph = load(LINEAR);
    let analyzer = analyze(&graph, &FilterCollection::new(), InheritanceConfig::default());

    let expect = [
        ("Entity", 2, 0),
        ("Record", 1, 0),
        ("Versioned", 1, 1),
        ("Audited", 1, 0),
    ];
    for (name, noam, noom) in expect {
        let metrics = analyzer.node_metrics(lookup(&graph, &format!("model::{name}")));
        assert_eq!(metrics[NOAM], MetricValue::Int(noam), "{name} noam");
        assert_eq!(metrics[NOOM], MetricValue::Int(noom), "{name} noom");
    }
}

#[test]
fn test_library_classic_conventions() {
    let graph = load(LIBRARY);
    let filters = FilterCollection::new().with_filter(PackageFilter::new(["library"]));
    let analyzer = analyze(&graph, &filters, InheritanceConfig::classic());

    let project = analyzer.project_metrics();
    assert_close(project[ANDC], 0.7368);
    assert_eq!(project[AHH], MetricValue::Float(1.0));
}

#[test]
fn test_library_default_conventions() {
    let graph = load(LIBRARY);
    let filters = FilterCollection::new().with_filter(PackageFilter::new(["library"]));
    let analyzer = analyze(&graph, &filters, InheritanceConfig::default());

    let project = analyzer.project_metrics();
    assert_close(project[ANDC], 2.8);
    assert_close(project[AHH], 0.7368);
    assert_eq!(project[MAX_DIT], MetricValue::Int(1));
}

#[test]
fn test_filter_changes_the_result() {
    let graph = load(LIBRARY);
    let analyzer = analyze(&graph, &FilterCollection::new(), InheritanceConfig::classic());

    // 17 children over 23 classes; vendor's hierarchy reaches depth 2.
    let project = analyzer.project_metrics();
    assert_close(project[ANDC], 17.0 / 23.0);
    assert_close(project[AHH], 7.0 / 6.0);
    assert_eq!(project[MAX_DIT], MetricValue::Int(2));

    let middle = analyzer.node_metrics(lookup(&graph, "vendor::Middle"));
    assert_eq!(middle[NOC], MetricValue::Int(2));
}

#[test]
fn test_interfaces_have_no_metrics() {
    let graph = load(LIBRARY);
    let analyzer = analyze(&graph, &FilterCollection::new(), InheritanceConfig::default());

    assert!(analyzer
        .node_metrics(lookup(&graph, "library::Drawable"))
        .is_empty());
    assert!(analyzer
        .node_metrics(lookup(&graph, "library::Printable"))
        .is_empty());
}

#[test]
fn test_filters_from_config() {
    let config = Config::from_toml_str(
        r#"
[filter]
exclude_packages = ["vend*"]

[inheritance]
andc_denominator = "all-classes"
ahh_reference = "hierarchy-roots"

[analysis]
parallel = false
"#,
    )
    .unwrap();
    let graph = load(LIBRARY);
    let filters = FilterCollection::from_config(&config.filter).unwrap();
    let mut analyzer = InheritanceAnalyzer::from_config(&config);
    analyzer
        .analyze(&AnalysisInput::all(&graph, &filters))
        .unwrap();

    let project = analyzer.project_metrics();
    assert_close(project[ANDC], 0.7368);
    assert_eq!(project[AHH], MetricValue::Float(1.0));
}

/// Reports how many accepted classes sit at least two levels deep.
struct DeepClasses {
    count: usize,
}

impl Analyzer for DeepClasses {
    fn name(&self) -> &'static str {
        "deep-classes"
    }

    fn dependencies(&self) -> &[&'static str] {
        &["inheritance"]
    }

    fn analyze(&mut self, input: &AnalysisInput<'_>) -> Result<(), AnalysisError> {
        let inheritance = input.require(self.name(), "inheritance")?;
        self.count = input
            .classes()
            .filter(|class| {
                inheritance
                    .node_metrics(class.id())
                    .get(DIT)
                    .and_then(|dit| dit.as_i64())
                    .is_some_and(|dit| dit >= 2)
            })
            .count();
        Ok(())
    }

    fn node_metrics(&self, _node: TypeId) -> MetricMap {
        MetricMap::new()
    }

    fn project_metrics(&self) -> MetricMap {
        MetricMap::new().with("deep_classes", self.count)
    }
}

#[test]
fn test_pipeline_runs_dependents_after_inheritance() {
    let graph = load(LIBRARY);
    let mut pipeline = AnalysisPipeline::new(vec![
        Box::new(DeepClasses { count: 0 }),
        Box::new(InheritanceAnalyzer::new()),
    ]);
    assert_eq!(
        pipeline.execution_order().unwrap(),
        vec!["inheritance", "deep-classes"]
    );

    let report = pipeline
        .run(&graph, &graph.package_ids(), &FilterCollection::new())
        .unwrap();
    assert_eq!(report.project["deep_classes"], MetricValue::Int(2));
    assert_eq!(report.nodes["vendor::Leaf"][DIT], MetricValue::Int(2));
    assert!(!report.nodes.contains_key("library::Drawable"));
}

#[test]
fn test_dependent_without_inheritance_fails() {
    let graph = load(LINEAR);
    let mut pipeline = AnalysisPipeline::new(vec![Box::new(DeepClasses { count: 0 })]);
    let err = pipeline
        .run(&graph, &graph.package_ids(), &FilterCollection::new())
        .unwrap_err();
    assert!(matches!(err, AnalysisError::UnknownDependency { .. }));
}

#[test]
fn test_report_serializes_as_plain_numbers() {
    let graph = load(LINEAR);
    let mut pipeline = AnalysisPipeline::new(vec![Box::new(InheritanceAnalyzer::new())]);
    let report = pipeline
        .run(&graph, &graph.package_ids(), &FilterCollection::new())
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["analyzers"], serde_json::json!(["inheritance"]));
    assert_eq!(json["project"]["andc"], serde_json::json!(1.0));
    assert_eq!(json["project"]["max_dit"], serde_json::json!(3));
    assert_eq!(json["nodes"]["model::Audited"]["dit"], serde_json::json!(3));
}
