/// Column names and the canonical Arrow layout of a snapshot file.
///
/// Producers are free to deviate from these types; the normaliser accepts
/// strings, numbers, lists and timestamps interchangeably where it can.
pub mod snapshot {
    use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
    use std::sync::Arc;

    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const ABSTRACT: &str = "abstract";
    pub const AUTHORS: &str = "authors";
    pub const KEYWORDS: &str = "keywords";
    pub const LANGUAGE: &str = "language";
    pub const CATEGORIES: &str = "categories_full";
    pub const REPO_DESCRIPTION: &str = "repo_description";
    pub const LICENSE: &str = "license";
    pub const PAPER_URL: &str = "url";
    pub const GITHUB_URL: &str = "github_link";

    pub const STARS: &str = "stars";
    pub const STARS_TOTAL: &str = "stars_total";
    pub const STARS_LAST_7D: &str = "stars_last_7d";
    pub const STARS_LAST_30D: &str = "stars_last_30d";
    pub const FORKS: &str = "forks";
    pub const WATCHERS: &str = "watchers";
    pub const OPEN_ISSUES: &str = "open_issues";

    pub const CREATED: &str = "created";
    pub const REPO_CREATED_AT: &str = "repo_created_at";
    pub const REPO_UPDATED_AT: &str = "repo_updated_at";

    fn utf8_list() -> DataType {
        DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)))
    }

    fn utc_timestamp() -> DataType {
        DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
    }

    /// Schema written by the ingest pipeline.
    pub fn snapshot_schema() -> Schema {
        Schema::new(vec![
            Field::new(ID, DataType::Utf8, false),
            Field::new(TITLE, DataType::Utf8, true),
            Field::new(ABSTRACT, DataType::Utf8, true),
            Field::new(AUTHORS, utf8_list(), true),
            Field::new(KEYWORDS, utf8_list(), true),
            Field::new(LANGUAGE, DataType::Utf8, true),
            Field::new(CATEGORIES, DataType::Utf8, true),
            Field::new(REPO_DESCRIPTION, DataType::Utf8, true),
            Field::new(LICENSE, DataType::Utf8, true),
            Field::new(PAPER_URL, DataType::Utf8, true),
            Field::new(GITHUB_URL, DataType::Utf8, true),
            Field::new(STARS, DataType::Int64, true),
            Field::new(STARS_TOTAL, DataType::Int64, true),
            Field::new(STARS_LAST_7D, DataType::Int64, true),
            Field::new(STARS_LAST_30D, DataType::Int64, true),
            Field::new(FORKS, DataType::Int64, true),
            Field::new(WATCHERS, DataType::Int64, true),
            Field::new(OPEN_ISSUES, DataType::Int64, true),
            Field::new(CREATED, utc_timestamp(), true),
            Field::new(REPO_CREATED_AT, utc_timestamp(), true),
            Field::new(REPO_UPDATED_AT, utc_timestamp(), true),
        ])
    }

    /// Canonical columns that `schema` does not carry, in canonical order.
    pub fn missing_columns(schema: &Schema) -> Vec<String> {
        snapshot_schema()
            .fields()
            .iter()
            .filter(|f| schema.field_with_name(f.name()).is_err())
            .map(|f| f.name().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::snapshot;

    #[test]
    fn snapshot_schema_has_expected_fields() {
        let schema = snapshot::snapshot_schema();
        assert_eq!(schema.fields().len(), 21);
        assert!(schema.field_with_name(snapshot::ID).is_ok());
        assert!(schema.field_with_name(snapshot::CATEGORIES).is_ok());
        assert!(schema.field_with_name(snapshot::REPO_UPDATED_AT).is_ok());
    }

    #[test]
    fn only_id_is_required() {
        let schema = snapshot::snapshot_schema();
        let required: Vec<&str> = schema
            .fields()
            .iter()
            .filter(|f| !f.is_nullable())
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(required, vec![snapshot::ID]);
    }

    #[test]
    fn missing_columns_reports_gaps_in_order() {
        use arrow::datatypes::{DataType, Field, Schema};

        let full = snapshot::snapshot_schema();
        assert!(snapshot::missing_columns(&full).is_empty());

        let partial = Schema::new(vec![
            Field::new(snapshot::ID, DataType::Utf8, false),
            Field::new(snapshot::STARS, DataType::Float64, true),
        ]);
        let missing = snapshot::missing_columns(&partial);
        assert_eq!(missing.len(), 19);
        assert_eq!(missing[0], snapshot::TITLE);
        assert!(!missing.iter().any(|c| c == snapshot::STARS));
    }
}
