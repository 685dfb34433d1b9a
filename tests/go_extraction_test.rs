use gograph::extraction::{extract_file, INFERRED_TYPE};
use gograph::source::SourceFile;
use gograph::symbols::SymbolTable;
use gograph::types::*;

fn extract(path: &str, source: &str) -> (FileAnalysis, SymbolTable) {
    let file = SourceFile::parse(path, source).unwrap();
    let table = SymbolTable::new();
    let analysis = extract_file(&file, &table, true);
    (analysis, table)
}

#[test]
fn test_go_extract_package() {
    let source = r#"package main

import "fmt"

func main() {
    fmt.Println("hello")
}
"#;
    let (result, _) = extract("main.go", source);
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    assert_eq!(result.package, "main");
    assert_eq!(result.path, "main.go");
}

#[test]
fn test_go_extract_function() {
    let source = r#"package main

// Add adds two numbers.
func Add(a, b int) int {
    return a + b
}

func helper() {}
"#;
    let (result, table) = extract("math.go", source);
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    assert_eq!(result.functions.len(), 2);

    let add_fn = result.function("main.Add").unwrap();
    assert_eq!(add_fn.kind, SymbolKind::Function);
    assert!(add_fn.exported);
    assert_eq!(add_fn.declared_type, "func Add(a, b int) int");
    assert_eq!(add_fn.doc_comment.as_deref(), Some("Add adds two numbers."));
    assert_eq!(add_fn.position.line, 4);
    assert_eq!(add_fn.position.column, 6);

    let params: Vec<(&str, &str)> = add_fn
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.declared_type.as_str()))
        .collect();
    assert_eq!(params, vec![("a", "int"), ("b", "int")]);
    assert_eq!(add_fn.results.len(), 1);
    assert_eq!(add_fn.results[0].name, "");
    assert_eq!(add_fn.results[0].declared_type, "int");

    let helper_fn = result.function("main.helper").unwrap();
    assert!(!helper_fn.exported);
    assert!(helper_fn.doc_comment.is_none());

    assert!(table.contains("main.Add"));
    assert!(table.contains("main.helper"));
}

#[test]
fn test_go_extract_named_results_and_variadic() {
    let source = r#"package fmtx

func Printf(format string, args ...any) (n int, err error) {
    return 0, nil
}
"#;
    let (result, _) = extract("fmtx/print.go", source);
    let printf = result.function("fmtx.Printf").unwrap();
    assert_eq!(printf.parameters.len(), 2);
    assert_eq!(printf.parameters[1].name, "args");
    assert_eq!(printf.parameters[1].declared_type, "...any");
    let results: Vec<&str> = printf.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(results, vec!["n", "err"]);
    assert_eq!(printf.results[1].declared_type, "error");
}

#[test]
fn test_go_extract_method_with_pointer_receiver() {
    let source = r#"package pkg

type Service struct {
    name string
}

// Run starts the service.
func (s *Service) Run() {}

func (s Service) Name() string {
    return s.name
}
"#;
    let (result, table) = extract("pkg/service.go", source);
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);

    let run = result.function("pkg.Service.Run").unwrap();
    assert_eq!(run.kind, SymbolKind::Method);
    assert_eq!(run.receiver_type.as_deref(), Some("Service"));
    assert!(run.pointer_receiver);
    assert_eq!(run.doc_comment.as_deref(), Some("Run starts the service."));

    let name = result.function("pkg.Service.Name").unwrap();
    assert!(!name.pointer_receiver);
    assert_eq!(name.results[0].declared_type, "string");

    let stored = table.lookup("pkg.Service.Run").unwrap();
    assert_eq!(stored.receiver_type.as_deref(), Some("Service"));
}

#[test]
fn test_go_extract_generic_receiver() {
    let source = r#"package list

type List[T any] struct {
    items []T
}

func (l *List[T]) Push(item T) {}
"#;
    let (result, _) = extract("list/list.go", source);
    let push = result.function("list.List.Push").unwrap();
    assert_eq!(push.receiver_type.as_deref(), Some("List"));
    assert!(push.pointer_receiver);
}

#[test]
fn test_go_extract_struct_with_fields() {
    let source = r#"package model

// Point represents a 2D point.
type Point struct {
    X, Y float64
    label string `json:"label"`
}
"#;
    let (result, table) = extract("model/point.go", source);
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    assert_eq!(result.records.len(), 1);

    let point = &result.records[0];
    assert_eq!(point.name, "Point");
    assert_eq!(point.kind, SymbolKind::Record);
    assert!(point.exported);
    assert_eq!(point.doc_comment.as_deref(), Some("Point represents a 2D point."));

    let fields: Vec<&str> = point.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["X", "Y", "label"]);
    assert_eq!(point.fields[1].declared_type, "float64");
    assert!(point.fields[0].exported);
    assert!(!point.fields[2].exported);
    assert_eq!(point.fields[2].literal_value.as_deref(), Some("`json:\"label\"`"));

    let x = table.lookup("model.Point.X").unwrap();
    assert_eq!(x.kind, SymbolKind::Field);
    assert!(table.contains("model.Point.label"));
}

#[test]
fn test_go_extract_embedded_fields() {
    let source = r#"package model

type Base struct{}

type Guarded struct {
    Base
    *sync.Mutex
    count int
}
"#;
    let (result, table) = extract("model/guarded.go", source);
    let guarded = result.records.iter().find(|r| r.name == "Guarded").unwrap();
    let fields: Vec<(&str, &str)> = guarded
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.declared_type.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![("Base", "Base"), ("Mutex", "*sync.Mutex"), ("count", "int")]
    );
    assert!(table.contains("model.Guarded.Mutex"));
}

#[test]
fn test_go_extract_interface() {
    let source = r#"package io

// Reader is the interface for reading.
type Reader interface {
    Read(p []byte) (n int, err error)
}

type ReadCloser interface {
    Reader
    Close() error
}
"#;
    let (result, table) = extract("io/reader.go", source);
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    assert_eq!(result.interfaces.len(), 2);

    let reader = &result.interfaces[0];
    assert_eq!(reader.name, "Reader");
    assert_eq!(reader.kind, SymbolKind::Interface);
    assert_eq!(reader.method_names, vec!["Read"]);
    assert_eq!(
        reader.doc_comment.as_deref(),
        Some("Reader is the interface for reading.")
    );

    let read_closer = &result.interfaces[1];
    assert_eq!(read_closer.method_names, vec!["Reader", "Close"]);
    assert!(table.contains("io.ReadCloser"));
}

#[test]
fn test_go_extract_type_definitions() {
    let source = r#"package units

type ID = string

type Celsius float64
"#;
    let (result, _) = extract("units/units.go", source);
    let types: Vec<(&str, &str)> = result
        .types
        .iter()
        .map(|t| (t.name.as_str(), t.declared_type.as_str()))
        .collect();
    assert_eq!(types, vec![("ID", "string"), ("Celsius", "float64")]);
    assert!(result.types.iter().all(|t| t.kind == SymbolKind::TypeAlias));
}

#[test]
fn test_go_extract_imports() {
    let source = r#"package main

import (
    "fmt"
    str "strings"
    "github.com/pkg/errors"
)
"#;
    let (result, table) = extract("main.go", source);
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    assert_eq!(result.imports.len(), 3);

    let aliases = result.import_aliases();
    assert_eq!(aliases.get("fmt").map(String::as_str), Some("fmt"));
    assert_eq!(aliases.get("str").map(String::as_str), Some("strings"));
    assert_eq!(
        aliases.get("errors").map(String::as_str),
        Some("github.com/pkg/errors")
    );
    assert_eq!(table.lookup("main.str").unwrap().kind, SymbolKind::Import);
}

#[test]
fn test_go_extract_const_and_var() {
    let source = r#"package cfg

// Limits.
const (
    // MaxSize is the limit.
    MaxSize int = 10
    minSize = 1
)

const (
    A = iota
    B
)

var name, version = "x", "1.0"

var Debug bool
"#;
    let (result, _) = extract("cfg/cfg.go", source);
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    assert_eq!(result.constants.len(), 4);
    assert_eq!(result.variables.len(), 3);

    let max = &result.constants[0];
    assert_eq!(max.name, "MaxSize");
    assert_eq!(max.declared_type, "int");
    assert_eq!(max.literal_value.as_deref(), Some("10"));
    assert_eq!(max.doc_comment.as_deref(), Some("MaxSize is the limit."));
    assert!(max.exported);

    let min = &result.constants[1];
    assert_eq!(min.declared_type, INFERRED_TYPE);
    assert_eq!(min.literal_value.as_deref(), Some("1"));
    assert_eq!(min.doc_comment.as_deref(), Some("Limits."));

    let b = &result.constants[3];
    assert_eq!(b.name, "B");
    assert_eq!(b.declared_type, INFERRED_TYPE);
    assert!(b.literal_value.is_none());

    let version = result.variables.iter().find(|v| v.name == "version").unwrap();
    assert_eq!(version.literal_value.as_deref(), Some("\"1.0\""));
    let debug = result.variables.iter().find(|v| v.name == "Debug").unwrap();
    assert_eq!(debug.declared_type, "bool");
    assert!(debug.literal_value.is_none());
}

#[test]
fn test_go_docstring_needs_an_adjacent_comment() {
    let source = r#"package flags

const (
	A = 1 // first value
	B = 2
)

var x = 1 // trailing
func F() {}

// detached

func G() {}

// Line one.
// Line two.
func H() {}
"#;
    let (result, _) = extract("flags/flags.go", source);
    let b = result.constants.iter().find(|c| c.name == "B").unwrap();
    assert!(b.doc_comment.is_none());
    assert!(result.function("flags.F").unwrap().doc_comment.is_none());
    assert!(result.function("flags.G").unwrap().doc_comment.is_none());
    assert_eq!(
        result.function("flags.H").unwrap().doc_comment.as_deref(),
        Some("Line one.\nLine two.")
    );
}

#[test]
fn test_go_docstrings_can_be_disabled() {
    let source = r#"package main

// Add adds two numbers.
func Add(a, b int) int { return a + b }
"#;
    let file = SourceFile::parse("math.go", source).unwrap();
    let table = SymbolTable::new();
    let result = extract_file(&file, &table, false);
    assert!(result.function("main.Add").unwrap().doc_comment.is_none());
}

#[test]
fn test_go_export_flag_follows_first_letter() {
    let source = r#"package shapes

const Pi = 3.14
var count int

type Shape interface { Area() float64 }

type Rect struct {
    W, h float64
}

func (r Rect) Area() float64 { return r.W * r.h }
func scale(r Rect, by float64) Rect { return r }
"#;
    let (result, _) = extract("shapes/shapes.go", source);
    let mut checked = 0;
    for symbol in result.declarations() {
        assert_eq!(symbol.exported, is_exported(&symbol.name), "{}", symbol.name);
        for field in &symbol.fields {
            assert_eq!(field.exported, is_exported(&field.name), "{}", field.name);
            checked += 1;
        }
        checked += 1;
    }
    assert_eq!(checked, 8);
}

#[test]
fn test_go_every_declaration_is_in_the_table() {
    let source = r#"package shop

import "fmt"

const Tax = 0.2

var orders []string

type Order struct {
    ID int
}

func (o *Order) Print() { fmt.Println(o.ID) }

func Total() float64 { return 0 }
"#;
    let (result, table) = extract("shop/order.go", source);
    for symbol in result.declarations() {
        assert!(
            table.contains(&symbol.qualified_name),
            "{} missing from table",
            symbol.qualified_name
        );
    }
    assert!(table.contains("shop.Order.ID"));
    assert_eq!(table.len(), 7);
}

#[test]
fn test_go_missing_package_clause_is_reported() {
    let source = "func F() {}\n";
    let (result, _) = extract("broken.go", source);
    assert!(!result.warnings.is_empty());
    assert!(result.warnings[0].contains("package"));
    assert_eq!(result.package, "");
}

#[test]
fn test_go_malformed_source_keeps_earlier_declarations() {
    let source = "package p\n\nfunc Good() int { return 1 }\n\nfunc (\n";
    let (result, _) = extract("partial.go", source);
    assert!(result.function("p.Good").is_some());
}

#[test]
fn test_go_code_block_content() {
    let source = "package pkg\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n";
    let (result, _) = extract("pkg/add.go", source);
    let block = result.code_block("pkg.Add").unwrap();
    assert_eq!(block.content, "func Add(a, b int) int {\n\treturn a + b\n}");
    assert_eq!(block.start_line, 3);
    assert_eq!(block.end_line, 5);
    assert_eq!(&source[block.start_offset..block.end_offset], block.content);

    assert_eq!(block.statements.len(), 1);
    assert_eq!(block.statements[0].kind, StatementKind::Return);
    assert_eq!(block.statements[0].values, vec!["a + b"]);
}

#[test]
fn test_go_code_block_per_method() {
    let source = r#"package pkg

type A struct{}
type B struct{}

func (a A) Close() error { return nil }
func (b *B) Close() error { return nil }
"#;
    let (result, _) = extract("pkg/close.go", source);
    assert_eq!(result.code_blocks.len(), 2);
    let a = result.code_block("pkg.A.Close").unwrap();
    let b = result.code_block("pkg.B.Close").unwrap();
    assert!(a.content.starts_with("func (a A) Close()"));
    assert!(b.content.starts_with("func (b *B) Close()"));
}
