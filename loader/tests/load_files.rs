use std::fs;
use std::path::PathBuf;

use csvload::parser::read_file;
use csvload::{
    read_file_auto, ByHeader, ConfigError, CsvLoader, CsvRecord, FieldType, FieldValue,
    HeaderRemapField, LoaderError, LoaderOptions, RowSchema,
};
use serde::Deserialize;
use serde_json::json;
use tempfile::{tempdir, TempDir};

const ORGANIZATIONS: &str = "\
Index;Organization Id;Name;Score;Employees
1;FAB0d41d5b5d22c; Ferrell LLC ;0.5;120

2;6A7EdDEA9FaDC52;Mckinney, Riley and Day;;4
three;0bFED1ADAE4bcC1;Hester Ltd;1.25;73
4;2bFC1Be8a4ce42f;Holder-Sellers;2;
5;9eE8A6a4Eb96C24;Mayer Group;0.1;8
";

fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn schema() -> RowSchema {
    RowSchema::builder()
        .required_int("index")
        .required_string("organization_id")
        .required_string("name")
        .optional_float("score")
        .required_int("employees")
        .build()
        .unwrap()
}

fn aggregate() -> LoaderOptions {
    LoaderOptions {
        aggregate_errors: true,
        ..LoaderOptions::default()
    }
}

#[test]
fn test_load_file_aggregating_errors() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "orgs.csv", ORGANIZATIONS);

    let source = read_file_auto(&path).unwrap();
    assert_eq!(source.delimiter, ';');

    let result = CsvLoader::new(source.rows, schema(), aggregate())
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(
        result.header,
        vec!["Index", "Organization Id", "Name", "Score", "Employees"]
    );
    assert_eq!(result.rows.len(), 3);
    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.summary(), "Loaded: 3 records, 2 errors");

    // csv skips the blank line, so it does not shift line numbers
    let lines: Vec<usize> = result.errors.iter().map(|e| e.line_number).collect();
    assert_eq!(lines, vec![3, 4]);
    assert!(result.errors[0].to_string().starts_with("Error at line 3:"));

    let first = result.rows.get(0).unwrap();
    assert_eq!(first.get("name"), Some(&FieldValue::from("Ferrell LLC")));
    assert_eq!(result.rows.get(1).unwrap().get("score"), None);
}

#[test]
fn test_load_file_fail_fast() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "orgs.csv", ORGANIZATIONS);

    let source = read_file_auto(&path).unwrap();
    let err = CsvLoader::new(source.rows, schema(), LoaderOptions::default())
        .unwrap()
        .load()
        .unwrap_err();

    match err {
        LoaderError::Row(row) => {
            assert_eq!(row.line_number, 3);
            assert_eq!(row.source_line(), 4);
            assert_eq!(row.cause.field_errors().len(), 1);
            assert_eq!(row.cause.field_errors()[0].field(), "index");
        }
        other => panic!("expected row error, got {other:?}"),
    }
}

#[test]
fn test_load_file_by_header_with_renames() {
    let dir = tempdir().unwrap();
    let path = write_csv(
        &dir,
        "orgs.csv",
        "Employees,Organization Id,index,Name\n12,abc,1,First\n7,def,2,Second,extra\n",
    );

    let schema = RowSchema::builder()
        .required_int("index")
        .required_string("organization_id")
        .required_string("name")
        .required_int("employees")
        .build()
        .unwrap();
    let strategy = ByHeader::with_remap(vec![
        "Organization Id=organization_id".parse::<HeaderRemapField>().unwrap(),
        HeaderRemapField::new("Name", "name"),
        HeaderRemapField::new("Employees", "employees"),
    ]);

    let source = read_file(&path, Some(',')).unwrap();
    let result = CsvLoader::with_mapping_strategy(source.rows, schema, aggregate(), Box::new(strategy))
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(result.rows.len(), 1);
    assert_eq!(
        result.rows.get(0).unwrap().to_json(),
        json!({ "index": 1, "organization_id": "abc", "name": "First", "employees": 12 })
    );
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].line_number, 2);
}

#[test]
fn test_header_strategy_rejects_headerless_load() {
    let rows = vec![vec!["1", "abc"]];
    let options = LoaderOptions {
        has_header: false,
        aggregate_errors: true,
    };
    let err = CsvLoader::with_mapping_strategy(rows, schema(), options, Box::new(ByHeader::new())).err();
    assert_eq!(err, Some(ConfigError::HeaderRequired));
}

#[test]
fn test_schema_file_and_typed_records() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Product {
        sku: String,
        price: f64,
        in_stock: bool,
        note: Option<String>,
    }

    impl CsvRecord for Product {
        fn schema() -> RowSchema {
            RowSchema::from_json(
                &json!({
                    "fields": [
                        { "name": "sku", "type": "string" },
                        { "name": "price", "type": "float" },
                        { "name": "in_stock", "type": "boolean" },
                        { "name": "note", "type": "string", "required": false }
                    ],
                    "normalization": {
                        "bool_literals": { "true_literal": "yes", "false_literal": "no" }
                    }
                })
                .to_string(),
            )
            .unwrap()
        }
    }

    let schema = Product::schema();
    assert_eq!(schema.field("price").unwrap().field_type, FieldType::Float);
    assert!(schema.field("sku").unwrap().required);

    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "products.csv", "sku,price,in_stock,note\nA-1, 9.5 ,yes,\nB-2,3,no,fragile\n");

    let source = read_file_auto(&path).unwrap();
    let result = CsvLoader::for_record::<Product, _>(source.rows, LoaderOptions::default())
        .unwrap()
        .load()
        .unwrap();

    let products: Vec<Product> = result.deserialize_rows().unwrap();
    assert_eq!(
        products,
        vec![
            Product {
                sku: "A-1".into(),
                price: 9.5,
                in_stock: true,
                note: None,
            },
            Product {
                sku: "B-2".into(),
                price: 3.0,
                in_stock: false,
                note: Some("fragile".into()),
            },
        ]
    );
}

#[test]
fn test_duplicate_queries_on_loaded_rows() {
    let rows = vec![
        vec!["index", "organization_id", "name", "score", "employees"],
        vec!["1", "a", "Alpha", "", "10"],
        vec!["2", "b", "Beta", "0.5", "10"],
        vec!["3", "c", "Alpha", "", "3"],
    ];
    let result = CsvLoader::new(rows, schema(), LoaderOptions::default())
        .unwrap()
        .load()
        .unwrap();

    let groups = result.rows.field_duplicates("name").unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].value, Some(&FieldValue::from("Alpha")));
    assert_eq!(groups[0].indices, vec![0, 2]);

    let unique = result.rows.field_values_unique("employees").unwrap();
    assert_eq!(unique.len(), 2);

    assert!(result.rows.field_values("missing").is_err());
}
