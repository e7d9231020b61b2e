//! Tabular assembly of flattened rows.
//!
//! Rows may carry different column sets (taxon and identification columns
//! only appear when the record has them). The table takes the union of
//! columns in first-seen order, fills gaps with null, and infers one type
//! per column so every cell of a column renders the same way.

use crate::flatten::Row;
use serde_json::Value;
use std::collections::HashMap;
use std::io;

/// Inferred type of a column, over its non-null cells
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Every cell is null
    Empty,
    /// true / false
    Boolean,
    /// Whole numbers
    Integer,
    /// Numbers with at least one fractional value
    Float,
    /// Text
    String,
    /// Lists or objects
    Json,
    /// More than one of the above
    Mixed,
}

impl ColumnType {
    fn of(value: &Value) -> Option<ColumnType> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ColumnType::Boolean),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(ColumnType::Integer),
            Value::Number(_) => Some(ColumnType::Float),
            Value::String(_) => Some(ColumnType::String),
            Value::Array(_) | Value::Object(_) => Some(ColumnType::Json),
        }
    }

    fn merge(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (Empty, t) | (t, Empty) => t,
            (a, b) if a == b => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Mixed,
        }
    }

    /// Infer the type of a column from its cells
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a Value>) -> ColumnType {
        cells
            .into_iter()
            .filter_map(ColumnType::of)
            .fold(ColumnType::Empty, ColumnType::merge)
    }
}

/// Rows aligned to a common column set
#[derive(Clone, Debug, Default)]
pub struct Table {
    columns: Vec<&'static str>,
    types: Vec<ColumnType>,
    cells: Vec<Vec<Value>>,
}

impl Table {
    /// Align rows to the union of their columns and infer column types
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<&'static str> = Vec::new();
        let mut index: HashMap<&'static str, usize> = HashMap::new();
        for row in &rows {
            for column in row.columns() {
                index.entry(column).or_insert_with(|| {
                    columns.push(column);
                    columns.len() - 1
                });
            }
        }

        let cells: Vec<Vec<Value>> = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| row.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        let types = (0..columns.len())
            .map(|i| ColumnType::infer(cells.iter().map(|row| &row[i])))
            .collect();

        Self {
            columns,
            types,
            cells,
        }
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Write header and rows. A table without columns writes nothing.
    pub fn write_csv<W: io::Write>(&self, writer: &mut csv::Writer<W>) -> csv::Result<()> {
        if self.columns.is_empty() {
            return Ok(());
        }
        writer.write_record(&self.columns)?;
        for row in &self.cells {
            writer.write_record(
                row.iter()
                    .zip(&self.types)
                    .map(|(value, column_type)| render(value, *column_type)),
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn render(value: &Value, column_type: ColumnType) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) if column_type == ColumnType::Float => match n.as_f64() {
            Some(f) => format!("{:?}", f),
            None => n.to_string(),
        },
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten_observation;
    use serde_json::json;

    fn record(id: i64, taxon: Value, location: Value) -> Value {
        json!({
            "id": id,
            "observed_on_string": "2020-05-01",
            "time_observed_at": null,
            "created_time_zone": "America/Los_Angeles",
            "created_at": "2020-05-01T09:00:00-07:00",
            "updated_at": "2020-05-01T09:00:00-07:00",
            "description": "",
            "user": {"id": 1, "login": "u"},
            "quality_grade": "needs_id",
            "reviewed_by": [1],
            "faves_count": 0,
            "num_identification_agreements": 0,
            "num_identification_disagreements": 0,
            "identifications_most_agree": false,
            "identifications_most_disagree": false,
            "captive": false,
            "place_guess": null,
            "place_ids": [],
            "location": location,
            "positional_accuracy": null,
            "geoprivacy": null,
            "taxon_geoprivacy": null,
            "obscured": false,
            "species_guess": null,
            "taxon": taxon,
            "identifications": []
        })
    }

    fn position(table: &Table, column: &str) -> Option<usize> {
        table.columns.iter().position(|c| *c == column)
    }

    fn column_type(table: &Table, column: &str) -> Option<ColumnType> {
        position(table, column).map(|i| table.types[i])
    }

    fn cell<'a>(table: &'a Table, row: usize, column: &str) -> Option<&'a Value> {
        let i = position(table, column)?;
        table.cells.get(row).map(|cells| &cells[i])
    }

    fn rendered(table: &Table, row: usize, column: &str) -> Option<String> {
        let i = position(table, column)?;
        table
            .cells
            .get(row)
            .map(|cells| render(&cells[i], table.types[i]))
    }

    fn taxon() -> Value {
        json!({
            "id": 3, "name": "Aves", "rank": "class", "parent_id": 2,
            "native": null, "endemic": null, "threatened": null,
            "universal_search_rank": 10, "observations_count": 10
        })
    }

    #[test]
    fn infer_column_types() {
        assert_eq!(ColumnType::infer(&[Value::Null, Value::Null]), ColumnType::Empty);
        assert_eq!(
            ColumnType::infer(&[json!(true), Value::Null, json!(false)]),
            ColumnType::Boolean
        );
        assert_eq!(ColumnType::infer(&[json!(1), json!(2)]), ColumnType::Integer);
        assert_eq!(ColumnType::infer(&[json!(1), json!(2.5)]), ColumnType::Float);
        assert_eq!(ColumnType::infer(&[json!("a"), Value::Null]), ColumnType::String);
        assert_eq!(ColumnType::infer(&[json!([1]), json!({})]), ColumnType::Json);
        assert_eq!(ColumnType::infer(&[json!("a"), json!(1)]), ColumnType::Mixed);
    }

    #[test]
    fn columns_are_union_in_first_seen_order() {
        let rows = vec![
            flatten_observation(&record(1, Value::Null, Value::Null)).unwrap(),
            flatten_observation(&record(2, taxon(), json!("1,2"))).unwrap(),
        ];
        let table = Table::from_rows(rows);

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns[0], "id");
        assert_eq!(table.columns.last(), Some(&"taxon_observations"));
        assert_eq!(cell(&table, 0, "taxon_id"), Some(&Value::Null));
        assert_eq!(cell(&table, 1, "taxon_id"), Some(&json!(3)));
        assert_eq!(column_type(&table, "taxon_id"), Some(ColumnType::Integer));
        assert_eq!(column_type(&table, "preferred_common_name"), Some(ColumnType::Empty));
    }

    #[test]
    fn empty_table_writes_nothing() {
        let table = Table::from_rows(Vec::new());
        assert!(table.is_empty());
        assert!(table.columns.is_empty());

        let mut writer = csv::Writer::from_writer(Vec::new());
        table.write_csv(&mut writer).unwrap();
        assert!(writer.into_inner().unwrap().is_empty());
    }

    #[test]
    fn rendering_normalizes_nulls_and_booleans() {
        let rows = vec![flatten_observation(&record(1, taxon(), json!("12.34,56.78"))).unwrap()];
        let table = Table::from_rows(rows);

        assert_eq!(rendered(&table, 0, "captive").as_deref(), Some("False"));
        assert_eq!(rendered(&table, 0, "place_guess").as_deref(), Some(""));
        assert_eq!(rendered(&table, 0, "taxon_native").as_deref(), Some(""));
        assert_eq!(rendered(&table, 0, "reviewed_by").as_deref(), Some("[1]"));
        assert_eq!(rendered(&table, 0, "longitude").as_deref(), Some("12.34"));
        assert_eq!(rendered(&table, 0, "id").as_deref(), Some("1"));
    }

    #[test]
    fn float_columns_keep_a_decimal_point() {
        assert_eq!(render(&json!(3), ColumnType::Float), "3.0");
        assert_eq!(render(&json!(2.5), ColumnType::Float), "2.5");
        assert_eq!(render(&json!(3), ColumnType::Integer), "3");
        assert_eq!(render(&json!(3), ColumnType::Mixed), "3");
    }

    #[test]
    fn write_csv_emits_header_and_rows() {
        let rows = vec![
            flatten_observation(&record(1, Value::Null, Value::Null)).unwrap(),
            flatten_observation(&record(2, Value::Null, json!("1.5,2.5"))).unwrap(),
        ];
        let table = Table::from_rows(rows);

        let mut writer = csv::Writer::from_writer(Vec::new());
        table.write_csv(&mut writer).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,observed_on_string,"));
        assert!(lines[2].starts_with("2,2020-05-01,"));
        assert!(lines[2].contains(",1.5,2.5,"));
    }
}
