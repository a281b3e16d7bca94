use crate::attributes::Attributes;
use crate::errors::ModelError;
use crate::query_builder::{
    Columns, Criteria, Pagination, QueryFilter, Search, SortOrder, SqlGenerator, Terms,
};
use crate::row_mapping::ColumnTypes;
use crate::validation::{ValidatedTableName, ValidationError};
use serde_json::{json, Value};

fn table() -> ValidatedTableName {
    ValidatedTableName::new("corretores").unwrap()
}

// ========================================
// SELECT composition
// ========================================

#[test]
fn test_select_without_criteria() {
    let stmt = SqlGenerator::select(&table(), &Search::default()).unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM corretores");
    assert!(stmt.params.is_empty());
}

#[test]
fn test_select_clause_order_and_numbering() {
    let search = Search::new(QueryFilter::eq("creci", "12345"))
        .order_by("name", SortOrder::Asc)
        .order_by("id", SortOrder::Desc)
        .limit(10)
        .offset(20);

    let stmt = SqlGenerator::select(&table(), &search).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT * FROM corretores WHERE creci = $1 ORDER BY name ASC, id DESC LIMIT $2 OFFSET $3"
    );
    assert_eq!(stmt.params, vec![json!("12345"), json!(10), json!(20)]);
}

#[test]
fn test_select_column_list() {
    let search = Search::default().columns(Columns::parse("id, name"));
    let stmt = SqlGenerator::select(&table(), &search).unwrap();
    assert_eq!(stmt.sql, "SELECT id, name FROM corretores");

    let search = Search::default().columns(Columns::parse("*"));
    let stmt = SqlGenerator::select(&table(), &search).unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM corretores");
}

#[test]
fn test_select_rejects_injected_identifiers() {
    let search = Search::default().order_by("name; DROP TABLE corretores", SortOrder::Asc);
    let err = SqlGenerator::select(&table(), &search).unwrap_err();
    assert!(matches!(
        err,
        ModelError::Validation(ValidationError::InvalidCharacters(_))
    ));

    let search = Search::default().columns(Columns::parse("id, (SELECT 1)"));
    assert!(SqlGenerator::select(&table(), &search).is_err());
}

#[test]
fn test_pagination_page_window() {
    let search = Search::default().paginate(Pagination::page(3, 25));
    let stmt = SqlGenerator::select(&table(), &search).unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM corretores LIMIT $1 OFFSET $2");
    assert_eq!(stmt.params, vec![json!(25), json!(50)]);

    assert_eq!(Pagination::page(0, 0), Pagination::new().with_limit(1).with_offset(0));
    assert!(Pagination::new().is_empty());
}

// ========================================
// Structured filters
// ========================================

#[test]
fn test_filter_groups() {
    let filter = QueryFilter::and(vec![
        QueryFilter::eq("cpf", "12345678909"),
        QueryFilter::or(vec![
            QueryFilter::ne("id", 7),
            QueryFilter::is_null("updated_at"),
        ]),
    ]);

    let stmt = SqlGenerator::select(&table(), &Search::new(filter)).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT * FROM corretores WHERE (cpf = $1 AND (id != $2 OR updated_at IS NULL))"
    );
    assert_eq!(stmt.params, vec![json!("12345678909"), json!(7)]);
}

#[test]
fn test_filter_null_values_become_is_null() {
    let stmt = SqlGenerator::select(&table(), &Search::new(QueryFilter::eq("creci", Value::Null))).unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM corretores WHERE creci IS NULL");
    assert!(stmt.params.is_empty());
}

#[test]
fn test_filter_in_lists() {
    let stmt = SqlGenerator::select(
        &table(),
        &Search::new(QueryFilter::in_values("id", vec![json!(1), json!(2), json!(3)])),
    )
    .unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM corretores WHERE id IN ($1, $2, $3)");
    assert_eq!(stmt.params.len(), 3);

    let stmt = SqlGenerator::select(&table(), &Search::new(QueryFilter::in_values("id", vec![]))).unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM corretores WHERE FALSE");

    let stmt =
        SqlGenerator::select(&table(), &Search::new(QueryFilter::not_in_values("id", vec![]))).unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM corretores WHERE TRUE");
}

#[test]
fn test_filter_values_are_never_spliced() {
    let hostile = "'; DROP TABLE corretores; --";
    let stmt = SqlGenerator::select(&table(), &Search::new(QueryFilter::eq("name", hostile))).unwrap();
    assert!(!stmt.sql.contains("DROP"));
    assert_eq!(stmt.params, vec![json!(hostile)]);
}

#[test]
fn test_empty_group_means_no_where() {
    let stmt = SqlGenerator::select(&table(), &Search::new(QueryFilter::and(vec![]))).unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM corretores");
}

// ========================================
// Terms mini-language
// ========================================

#[test]
fn test_terms_named_placeholders() {
    let terms = Terms::with_params("creci = :c AND id != :id", "c=99999&id=7").unwrap();
    let stmt = SqlGenerator::select(&table(), &Search::new(terms)).unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM corretores WHERE creci = $1 AND id != $2");
    assert_eq!(stmt.params, vec![json!("99999"), json!("7")]);
}

#[test]
fn test_terms_percent_decoding_and_last_value_wins() {
    let terms = Terms::with_params("name = :n", "n=Ana+Maria&n=Jos%C3%A9").unwrap();
    assert_eq!(terms.param("n"), Some(&json!("José")));
}

#[test]
fn test_terms_keep_casts_and_quoted_text() {
    let terms = Terms::new("id = :id::bigint AND name != ':literal'").bind("id", 7);
    let stmt = SqlGenerator::select(&table(), &Search::new(terms)).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT * FROM corretores WHERE id = $1::bigint AND name != ':literal'"
    );
    assert_eq!(stmt.params, vec![json!(7)]);
}

#[test]
fn test_terms_repeated_placeholder_binds_twice() {
    let terms = Terms::new("cpf = :v OR creci = :v").bind("v", "123");
    let stmt = SqlGenerator::count(&table(), &Criteria::from(terms)).unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT COUNT(*) AS total FROM corretores WHERE cpf = $1 OR creci = $2"
    );
    assert_eq!(stmt.params, vec![json!("123"), json!("123")]);
}

#[test]
fn test_terms_missing_parameter() {
    let terms = Terms::new("creci = :c");
    let err = SqlGenerator::select(&table(), &Search::new(terms)).unwrap_err();
    assert!(matches!(err, ModelError::MissingParameter(name) if name == "c"));
}

#[test]
fn test_terms_numbering_continues_into_limit() {
    let terms = Terms::new("name LIKE :p").bind("p", "A%");
    let stmt = SqlGenerator::select(&table(), &Search::new(terms).limit(5)).unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM corretores WHERE name LIKE $1 LIMIT $2");
}

// ========================================
// Writes
// ========================================

#[test]
fn test_insert_uses_attribute_order() {
    let mut attributes = Attributes::new();
    attributes.set("name", "Ana");
    attributes.set("creci", "12345");

    let stmt = SqlGenerator::insert(&table(), &attributes, &ColumnTypes::new()).unwrap();
    assert_eq!(
        stmt.sql,
        "INSERT INTO corretores (name, creci) VALUES ($1, $2) RETURNING id"
    );
    assert_eq!(stmt.params, vec![json!("Ana"), json!("12345")]);
}

#[test]
fn test_insert_without_attributes() {
    let stmt = SqlGenerator::insert(&table(), &Attributes::new(), &ColumnTypes::new()).unwrap();
    assert_eq!(stmt.sql, "INSERT INTO corretores DEFAULT VALUES RETURNING id");
}

#[test]
fn test_insert_rejects_bad_column() {
    let mut attributes = Attributes::new();
    attributes.set("name) VALUES ('x'); --", "Ana");
    assert!(SqlGenerator::insert(&table(), &attributes, &ColumnTypes::new()).is_err());
}

#[test]
fn test_update_binds_key_last() {
    let mut attributes = Attributes::new();
    attributes.set("id", 7);
    attributes.set("name", "Bruno");

    let stmt = SqlGenerator::update(&table(), &attributes, &ColumnTypes::new(), 7).unwrap().unwrap();
    assert_eq!(stmt.sql, "UPDATE corretores SET name = $1 WHERE id = $2");
    assert_eq!(stmt.params, vec![json!("Bruno"), json!(7)]);
}

#[test]
fn test_update_with_only_key_is_skipped() {
    let mut attributes = Attributes::new();
    attributes.set("id", 7);
    assert!(SqlGenerator::update(&table(), &attributes, &ColumnTypes::new(), 7).unwrap().is_none());
}

#[test]
fn test_known_column_types_add_casts_to_text_values() {
    let mut attributes = Attributes::new();
    attributes.set("id", 7);
    attributes.set("name", "2024-05-03T10:00:00-03:00");
    attributes.set("created_at", "2024-05-03T10:00:00-03:00");
    attributes.set("visits", 3);
    attributes.set("deleted_at", Value::Null);

    let types: ColumnTypes = [
        ("id", "INT8"),
        ("name", "VARCHAR"),
        ("created_at", "TIMESTAMPTZ"),
        ("visits", "INT4"),
        ("deleted_at", "TIMESTAMP"),
    ]
    .into_iter()
    .collect();

    let stmt = SqlGenerator::update(&table(), &attributes, &types, 7).unwrap().unwrap();
    assert_eq!(
        stmt.sql,
        "UPDATE corretores SET name = $1, created_at = $2::timestamptz, visits = $3, \
         deleted_at = $4::timestamp WHERE id = $5"
    );
    // values themselves are passed through untouched
    assert_eq!(stmt.params[0], json!("2024-05-03T10:00:00-03:00"));

    let stmt = SqlGenerator::insert(&table(), &attributes, &types).unwrap();
    assert_eq!(
        stmt.sql,
        "INSERT INTO corretores (name, created_at, visits, deleted_at) \
         VALUES ($1, $2::timestamptz, $3, $4::timestamp) RETURNING id"
    );
}

#[test]
fn test_delete_requires_criteria() {
    assert!(SqlGenerator::delete(&table(), &Criteria::All).is_err());

    let stmt = SqlGenerator::delete(&table(), &QueryFilter::eq("id", 3).into()).unwrap();
    assert_eq!(stmt.sql, "DELETE FROM corretores WHERE id = $1");
    assert_eq!(stmt.params, vec![json!(3)]);
}
