use std::collections::HashSet;

use gograph::analyzer::Analyzer;
use gograph::extraction::extract_file;
use gograph::resolution::{CallHierarchyBuilder, ReferenceResolver};
use gograph::source::SourceFile;
use gograph::symbols::SymbolTable;
use gograph::types::*;

/// Runs all three passes on one file against a fresh table.
fn analyze(path: &str, source: &str) -> FileAnalysis {
    let file = SourceFile::parse(path, source).unwrap();
    let table = SymbolTable::new();
    let mut analysis = extract_file(&file, &table, true);
    analysis.call_edges = CallHierarchyBuilder::build(&file, &analysis, &table);
    analysis.references = ReferenceResolver::resolve(&file, &analysis, &table, true);
    analysis
}

fn refs_at(analysis: &FileAnalysis, line: u32, column: u32) -> Vec<&ReferenceRecord> {
    analysis
        .references
        .iter()
        .filter(|r| r.position.line == line && r.position.column == column)
        .collect()
}

const ADD: &str = r#"package pkg

func Add(a, b int) int { return a + b }

func Use() int { return Add(1, 2) }
"#;

// ---------------------------------------------------------------------------
// Call hierarchy
// ---------------------------------------------------------------------------

#[test]
fn test_local_call_edge() {
    let analysis = analyze("pkg/add.go", ADD);
    assert_eq!(analysis.call_edges.len(), 1);
    let edge = &analysis.call_edges[0];
    assert_eq!(edge.caller, "pkg.Use");
    assert_eq!(edge.callee, "Add");
    assert_eq!(edge.resolved_callee.as_deref(), Some("pkg.Add"));
    assert!(edge.package_hint.is_none());
    assert_eq!(edge.arguments, vec!["1", "2"]);
    assert_eq!(edge.file, "pkg/add.go");
    assert_eq!(edge.position.line, 5);
}

#[test]
fn test_package_qualified_call_has_hint() {
    let source = r#"package main

import "fmt"

func main() {
	fmt.Println("x")
}
"#;
    let analysis = analyze("main.go", source);
    assert_eq!(analysis.call_edges.len(), 1);
    let edge = &analysis.call_edges[0];
    assert_eq!(edge.caller, "main.main");
    assert_eq!(edge.callee, "fmt.Println");
    assert_eq!(edge.package_hint.as_deref(), Some("fmt"));
    assert!(edge.resolved_callee.is_none());
    assert_eq!(edge.arguments, vec!["\"x\""]);
}

#[test]
fn test_method_call_resolves_through_member_name() {
    let source = r#"package pkg

type Service struct{ count int }

func (s *Service) Run() {
	s.count++
	s.helper()
}

func (s *Service) helper() {}
"#;
    let analysis = analyze("pkg/service.go", source);
    assert_eq!(analysis.call_edges.len(), 1);
    let edge = &analysis.call_edges[0];
    assert_eq!(edge.caller, "pkg.Service.Run");
    assert_eq!(edge.callee, "s.helper");
    assert!(edge.package_hint.is_none());
    assert_eq!(edge.resolved_callee.as_deref(), Some("pkg.Service.helper"));

    // s.count++ modifies the field.
    let count = refs_at(&analysis, 6, 2);
    assert_eq!(count.len(), 1);
    assert_eq!(count[0].symbol, "pkg.Service.count");
    assert_eq!(count[0].ref_type, RefType::Modification);
}

#[test]
fn test_calls_in_closures_belong_to_enclosing_function() {
    let source = r#"package pkg

var global = setup()

func setup() int { return 1 }

func Outer() {
	f := func() { inner() }
	f()
}

func inner() {}
"#;
    let analysis = analyze("pkg/outer.go", source);
    let callees: Vec<(&str, &str)> = analysis
        .call_edges
        .iter()
        .map(|e| (e.caller.as_str(), e.callee.as_str()))
        .collect();
    assert_eq!(callees, vec![("pkg.Outer", "inner"), ("pkg.Outer", "f")]);
}

#[test]
fn test_every_caller_is_a_declared_function() {
    let source = r#"package pkg

type T struct{}

func (t T) A() { t.B(); helper(); len("x") }
func (t T) B() { helper() }
func helper() { println("hi") }
"#;
    let analysis = analyze("pkg/t.go", source);
    assert_eq!(analysis.call_edges.len(), 5);
    let declared: HashSet<&str> = analysis
        .functions
        .iter()
        .map(|f| f.qualified_name.as_str())
        .collect();
    for edge in &analysis.call_edges {
        assert!(declared.contains(edge.caller.as_str()), "{}", edge.caller);
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

#[test]
fn test_call_site_is_usage_and_declaration_is_declaration() {
    let analysis = analyze("pkg/add.go", ADD);

    let decl = refs_at(&analysis, 3, 6);
    assert_eq!(decl.len(), 1);
    assert_eq!(decl[0].symbol, "pkg.Add");
    assert_eq!(decl[0].ref_type, RefType::Declaration);
    assert!(decl[0].resolved);

    let usage = refs_at(&analysis, 5, 25);
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].symbol, "pkg.Add");
    assert_eq!(usage[0].ref_type, RefType::Usage);
}

#[test]
fn test_assignment_is_modification_then_usage() {
    let source = r#"package calc

var x int

func compute() int { return 42 }

func use(v int) {}

func Run() {
	x = compute()
	use(x)
}
"#;
    let analysis = analyze("calc/run.go", source);

    let decl = refs_at(&analysis, 3, 5);
    assert_eq!(decl[0].ref_type, RefType::Declaration);
    assert_eq!(decl[0].symbol, "calc.x");

    let modified = refs_at(&analysis, 10, 2);
    assert_eq!(modified.len(), 1);
    assert_eq!(modified[0].symbol, "calc.x");
    assert_eq!(modified[0].ref_type, RefType::Modification);

    let used = refs_at(&analysis, 11, 6);
    assert_eq!(used.len(), 1);
    assert_eq!(used[0].symbol, "calc.x");
    assert_eq!(used[0].ref_type, RefType::Usage);

    let compute = refs_at(&analysis, 10, 6);
    assert_eq!(compute[0].symbol, "calc.compute");
    assert_eq!(compute[0].ref_type, RefType::Usage);
}

#[test]
fn test_one_record_per_position() {
    let source = r#"package pkg

import "strings"

type Item struct{ Name string }

func Normalize(items []Item) {
	for i := range items {
		items[i].Name = strings.ToLower(items[i].Name)
	}
}
"#;
    let analysis = analyze("pkg/items.go", source);
    let mut seen = HashSet::new();
    for record in &analysis.references {
        assert!(
            seen.insert((record.position.line, record.position.column)),
            "duplicate record at {}:{}",
            record.position.line,
            record.position.column
        );
    }
}

#[test]
fn test_unanalysed_import_keeps_path_and_is_unresolved() {
    let source = r#"package main

import "fmt"

func main() {
	fmt.Println("x")
}
"#;
    let analysis = analyze("main.go", source);
    let println = refs_at(&analysis, 6, 2);
    assert_eq!(println.len(), 1);
    assert_eq!(println[0].symbol, "fmt.Println");
    assert_eq!(println[0].ref_type, RefType::Usage);
    assert!(!println[0].resolved);
}

#[test]
fn test_unknown_exported_name_is_unresolved_usage() {
    let source = r#"package pkg

func Run() {
	v := Unknown
	_ = v
}
"#;
    let analysis = analyze("pkg/run.go", source);
    let unknown = refs_at(&analysis, 4, 7);
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].symbol, "Unknown");
    assert_eq!(unknown[0].ref_type, RefType::Usage);
    assert!(!unknown[0].resolved);
}

#[test]
fn test_keywords_and_predeclared_names_are_skipped() {
    let analysis = analyze("pkg/add.go", ADD);
    for record in &analysis.references {
        assert!(
            !matches!(record.symbol.as_str(), "int" | "nil" | "true" | "len"),
            "{:?}",
            record
        );
    }
}

#[test]
fn test_single_char_identifiers_can_be_kept() {
    let file = SourceFile::parse("pkg/add.go", ADD).unwrap();
    let table = SymbolTable::new();
    let analysis = extract_file(&file, &table, true);

    let filtered = ReferenceResolver::resolve(&file, &analysis, &table, true);
    assert!(filtered.iter().all(|r| r.symbol != "a"));

    let all = ReferenceResolver::resolve(&file, &analysis, &table, false);
    assert!(all.iter().any(|r| r.symbol == "a"));
}

// ---------------------------------------------------------------------------
// Cross-file
// ---------------------------------------------------------------------------

#[test]
fn test_cross_package_call_resolves_in_batch() {
    let mut analyzer = Analyzer::default();
    let sources = vec![
        (
            "cmd/main.go".to_string(),
            "package main\n\nimport \"example.com/util\"\n\nfunc main() {\n\tutil.Trim(\" a \")\n}\n"
                .to_string(),
        ),
        (
            "util/trim.go".to_string(),
            "package util\n\n// Trim trims.\nfunc Trim(s string) string { return s }\n".to_string(),
        ),
    ];
    let report = analyzer.analyze_sources(&sources);
    assert!(report.failures.is_empty());

    let main = &report.analyses[0];
    let edge = &main.call_edges[0];
    assert_eq!(edge.package_hint.as_deref(), Some("util"));
    assert_eq!(edge.resolved_callee.as_deref(), Some("util.Trim"));

    let usage = refs_at(main, 6, 2);
    assert_eq!(usage[0].symbol, "util.Trim");
    assert!(usage[0].resolved);

    let refs = analyzer.references_of("util.Trim");
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].position.file, "cmd/main.go");
    assert_eq!(refs[0].ref_type, RefType::Usage);
    assert_eq!(refs[1].ref_type, RefType::Declaration);
}

#[test]
fn test_colliding_declarations_stay_declarations() {
    let mut analyzer = Analyzer::default();
    let program = "package main\n\nfunc helper() {}\n\nfunc main() {\n\thelper()\n}\n";
    let sources = vec![
        ("cmd/a/main.go".to_string(), program.to_string()),
        ("cmd/b/main.go".to_string(), program.to_string()),
    ];
    let report = analyzer.analyze_sources(&sources);
    assert!(report.failures.is_empty());

    for analysis in &report.analyses {
        let helper = refs_at(analysis, 3, 6);
        assert_eq!(helper[0].symbol, "main.helper");
        assert_eq!(helper[0].ref_type, RefType::Declaration, "{}", analysis.path);
        let main = refs_at(analysis, 5, 6);
        assert_eq!(main[0].symbol, "main.main");
        assert_eq!(main[0].ref_type, RefType::Declaration, "{}", analysis.path);
    }
}
