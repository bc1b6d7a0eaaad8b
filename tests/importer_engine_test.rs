// ==========================================
// 导入引擎测试 - TabularRecordImporter
// ==========================================
// 测试目标: 行级校验顺序、错误累积、行号、幂等
// ==========================================


use stock_import::importer::{ColumnSpec, ImporterOptions};
use stock_import::domain::types::RecordField;
use stock_import::{
    logging, ImportError, ImportSchema, Record, RowError, RowErrorKind, TabularRecordImporter,
};
use test_helpers::{row, valid_row};

fn default_importer() -> TabularRecordImporter {
    TabularRecordImporter::new(ImportSchema::default())
}

fn record(id: &str, name: &str, qty: u64, loc: &str) -> Record {
    Record {
        identifier: id.to_string(),
        name: name.to_string(),
        quantity: qty,
        location: loc.to_string(),
    }
}

// ==========================================
// 测试用例 1: 全部有效
// ==========================================

#[test]
fn test_all_valid_rows_accepted() {
    logging::init_test();

    let rows: Vec<_> = (1..=50)
        .map(|i| valid_row(&format!("P{}", i), "Widget", &i.to_string(), "A1"))
        .collect();

    let batch = default_importer().import_rows(&rows).unwrap();

    assert_eq!(batch.accepted_count(), 50);
    assert!(batch.is_clean());
    assert_eq!(batch.records[0], record("P1", "Widget", 1, "A1"));
    assert_eq!(batch.records[49].identifier, "P50");
}

// ==========================================
// 测试用例 2: 缺失字段只产生一条错误
// ==========================================

#[test]
fn test_missing_field_single_error_others_accepted() {
    let rows = vec![
        valid_row("P1", "Widget", "10", "A1"),
        // name 与 loc 同时为空，只报告第一个
        valid_row("P2", "", "3", ""),
        valid_row("P3", "Nut", "7", "A3"),
    ];

    let batch = default_importer().import_rows(&rows).unwrap();

    assert_eq!(
        batch.records.iter().map(|r| r.identifier.as_str()).collect::<Vec<_>>(),
        vec!["P1", "P3"]
    );
    assert_eq!(
        batch.errors,
        vec![RowError::new(
            2,
            RowErrorKind::MissingField {
                field: "name".to_string()
            }
        )]
    );
}

#[test]
fn test_whitespace_only_counts_as_missing() {
    let rows = vec![
        valid_row("P1", "Widget", "10", "A1"),
        valid_row("P2", "Bolt", "   ", "A2"),
    ];

    let batch = default_importer().import_rows(&rows).unwrap();

    assert_eq!(batch.errors[0].reason(), "missing field qty");
}

// ==========================================
// 测试用例 3: 批内重复保留首次出现
// ==========================================

#[test]
fn test_duplicate_identifier_first_wins() {
    let rows = vec![
        valid_row("P1", "First", "1", "A1"),
        valid_row("P2", "Other", "2", "A2"),
        valid_row("P1", "Second", "3", "A3"),
    ];

    let batch = default_importer().import_rows(&rows).unwrap();

    assert_eq!(batch.records[0].name, "First");
    assert_eq!(batch.accepted_count(), 2);
    assert_eq!(batch.errors[0].row, 3);
    assert_eq!(batch.errors[0].reason(), "duplicate identifier P1");
}

#[test]
fn test_identifier_comparison_is_case_sensitive() {
    let rows = vec![
        valid_row("p1", "Lower", "1", "A1"),
        valid_row("P1", "Upper", "1", "A1"),
    ];

    let batch = default_importer().import_rows(&rows).unwrap();

    assert_eq!(batch.accepted_count(), 2);
}

// ==========================================
// 测试用例 4: 幂等
// ==========================================

#[test]
fn test_reimport_is_idempotent() {
    let rows = vec![
        valid_row("P1", "Widget", "10", "A1"),
        valid_row("P2", "Bolt", "abc", "A2"),
        valid_row("P1", "Dup", "1", "A3"),
        row(&[("id", "P4"), ("name", "Nut")]),
    ];
    let importer = default_importer();

    let first = importer.import_rows(&rows).unwrap();
    let second = importer.import_rows(&rows).unwrap();

    assert_eq!(first, second);
}

// ==========================================
// 测试用例 5: 参考样例
// ==========================================

#[test]
fn test_reference_example() {
    let rows = vec![
        valid_row("P1", "Widget", "10", "A1"),
        valid_row("P1", "Widget2", "5", "A2"),
        valid_row("P2", "Bolt", "-3", "A3"),
    ];

    let batch = default_importer().import_rows(&rows).unwrap();

    assert_eq!(batch.records, vec![record("P1", "Widget", 10, "A1")]);
    assert_eq!(
        batch.errors,
        vec![
            RowError::new(
                2,
                RowErrorKind::DuplicateIdentifier {
                    identifier: "P1".to_string()
                }
            ),
            RowError::new(
                3,
                RowErrorKind::InvalidValue {
                    field: "qty".to_string(),
                    raw: "-3".to_string()
                }
            ),
        ]
    );
    assert_eq!(batch.errors[1].to_string(), "row 3: invalid value for qty: -3");
}

// ==========================================
// 测试用例 6: 自定义 schema 与选项
// ==========================================

#[test]
fn test_optional_columns_use_defaults() {
    let schema = ImportSchema::default().with_required(&["id"]).unwrap();
    let importer = TabularRecordImporter::new(schema);

    let batch = importer.import_rows(&[row(&[("id", "P1")])]).unwrap();

    assert_eq!(batch.records, vec![record("P1", "", 0, "")]);
}

#[test]
fn test_custom_column_names() {
    let schema = ImportSchema::new(vec![
        ColumnSpec::new(RecordField::Identifier, "SKU", &["Item No"], true),
        ColumnSpec::new(RecordField::Name, "Description", &[], true),
        ColumnSpec::new(RecordField::Quantity, "On Hand", &[], true),
        ColumnSpec::new(RecordField::Location, "Bin", &[], false),
    ])
    .unwrap();
    let importer = TabularRecordImporter::new(schema);

    let rows = vec![
        row(&[("SKU", "A-1"), ("Description", "Gear"), ("On Hand", "4")]),
        row(&[("Item No", "A-2"), ("Description", "Cog"), ("On Hand", "x")]),
    ];
    let batch = importer.import_rows(&rows).unwrap();

    assert_eq!(batch.records, vec![record("A-1", "Gear", 4, "")]);
    assert_eq!(batch.errors[0].reason(), "invalid value for On Hand: x");
}

#[test]
fn test_column_absent_everywhere_is_batch_failure() {
    let rows = vec![
        row(&[("id", "P1"), ("name", "Widget"), ("qty", "1")]),
        row(&[("id", "P2"), ("name", "Bolt"), ("qty", "2")]),
    ];

    let err = default_importer().import_rows(&rows).unwrap_err();

    match err {
        ImportError::MissingColumns { columns } => assert_eq!(columns, vec!["loc"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_max_rows_exceeded() {
    let importer = TabularRecordImporter::with_options(
        ImportSchema::default(),
        ImporterOptions {
            skip_blank_rows: true,
            max_rows: Some(2),
        },
    );
    let rows: Vec<_> = (1..=3)
        .map(|i| valid_row(&format!("P{}", i), "W", "1", "A"))
        .collect();

    let err = importer.import_rows(&rows).unwrap_err();

    assert!(matches!(err, ImportError::TooManyRows { rows: 3, max: 2 }));
}
