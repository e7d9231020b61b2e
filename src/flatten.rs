//! Flattening of nested observation records into table rows.
//!
//! An observation carries a `user` object, an optional `"lon,lat"`
//! location string, an optional `taxon` object and an optional list of
//! `identifications`. The row keeps the scalar fields verbatim, splits the
//! location, prefixes taxon fields into the row and keeps identifications
//! as a list-valued cell.
//!
//! A key that is absent from the record is an error; a key that is present
//! with a `null` value is copied as null.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Scalar observation fields, in output column order.
///
/// Each entry is `(column, path)`; a path with a dot reads a nested object.
/// `longitude` and `latitude` are derived from `location` and have no path.
pub const OBSERVATION_COLUMNS: [(&str, Option<&str>); 26] = [
    ("id", Some("id")),
    ("observed_on_string", Some("observed_on_string")),
    ("time_observed_at", Some("time_observed_at")),
    ("created_time_zone", Some("created_time_zone")),
    ("created_at", Some("created_at")),
    ("updated_at", Some("updated_at")),
    ("description", Some("description")),
    ("user_id", Some("user.id")),
    ("user_login", Some("user.login")),
    ("quality_grade", Some("quality_grade")),
    ("reviewed_by", Some("reviewed_by")),
    ("faves_count", Some("faves_count")),
    (
        "num_identification_agreements",
        Some("num_identification_agreements"),
    ),
    (
        "num_identification_disagreements",
        Some("num_identification_disagreements"),
    ),
    (
        "identifications_most_agree",
        Some("identifications_most_agree"),
    ),
    (
        "identifications_most_disagree",
        Some("identifications_most_disagree"),
    ),
    ("captive", Some("captive")),
    ("place_guess", Some("place_guess")),
    ("place_ids", Some("place_ids")),
    ("longitude", None),
    ("latitude", None),
    ("positional_accuracy", Some("positional_accuracy")),
    ("geoprivacy", Some("geoprivacy")),
    ("taxon_geoprivacy", Some("taxon_geoprivacy")),
    ("obscured", Some("obscured")),
    ("species_guess", Some("species_guess")),
];

/// Taxon fields merged into the row: `(column, key in taxon, required)`
pub const TAXON_COLUMNS: [(&str, &str, bool); 11] = [
    ("taxon_id", "id", true),
    ("taxon_name", "name", true),
    ("preferred_common_name", "preferred_common_name", false),
    ("iconic_taxon_name", "iconic_taxon_name", false),
    ("taxon_rank", "rank", true),
    ("taxon_parent_id", "parent_id", true),
    ("taxon_native", "native", true),
    ("taxon_endemic", "endemic", true),
    ("taxon_threatened", "threatened", true),
    ("taxon_search_rank", "universal_search_rank", true),
    ("taxon_observations", "observations_count", true),
];

/// Column holding the projected identification list
pub const IDENTIFICATIONS_COLUMN: &str = "identifications";

/// One flattened observation, fields in insertion order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    fields: Vec<(&'static str, Value)>,
}

impl Row {
    /// Value of a column, `None` if the row has no such column
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    /// Column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    /// Observation id, if present and integral
    pub fn id(&self) -> Option<i64> {
        self.get("id").and_then(Value::as_i64)
    }

    fn push(&mut self, column: &'static str, value: Value) {
        self.fields.push((column, value));
    }
}

/// Split a `"lon,lat"` location into `(longitude, latitude)`.
///
/// The first token is taken as longitude. Both values stay strings. An
/// absent or empty location yields `(None, None)`; fewer than two tokens
/// yields `None` so the caller can report the record.
pub fn parse_location(location: Option<&str>) -> Option<(Option<String>, Option<String>)> {
    let location = match location {
        None | Some("") => return Some((None, None)),
        Some(location) => location,
    };
    let mut parts = location.split(',');
    let lon = parts.next()?;
    let lat = parts.next()?;
    Some((Some(lon.to_string()), Some(lat.to_string())))
}

/// Flatten one raw observation into a row
///
/// # Errors
/// - `Error::MissingField` when a required key is absent
/// - `Error::MalformedRecord` when a value has the wrong shape
pub fn flatten_observation(record: &Value) -> Result<Row> {
    let obj = record.as_object().ok_or_else(|| Error::MalformedRecord {
        record_id: None,
        reason: format!("expected a JSON object, got {}", kind(record)),
    })?;
    let record_id = observation_id(obj)?;
    let ctx = Ctx { record_id };

    let (longitude, latitude) = location_fields(&ctx, obj)?;

    let mut row = Row::default();
    for (column, path) in OBSERVATION_COLUMNS {
        let value = match (column, path) {
            ("longitude", None) => longitude.clone().map_or(Value::Null, Value::String),
            ("latitude", None) => latitude.clone().map_or(Value::Null, Value::String),
            (_, Some(path)) => ctx.lookup(obj, path)?.clone(),
            (_, None) => Value::Null,
        };
        row.push(column, value);
    }

    if let Some(taxon) = present(ctx.lookup(obj, "taxon")?) {
        let taxon = ctx.object(taxon, "taxon")?;
        for (column, key, required) in TAXON_COLUMNS {
            let value = match taxon.get(key) {
                Some(value) => value.clone(),
                None if required => return Err(ctx.missing(&format!("taxon.{}", key))),
                None => Value::Null,
            };
            row.push(column, value);
        }
    }

    if let Some(identifications) = present(ctx.lookup(obj, "identifications")?) {
        row.push(
            IDENTIFICATIONS_COLUMN,
            project_identifications(&ctx, identifications)?,
        );
    }

    Ok(row)
}

fn observation_id(obj: &Map<String, Value>) -> Result<i64> {
    let id = obj.get("id").ok_or_else(|| Error::MissingField {
        record_id: None,
        field: "id".to_string(),
    })?;
    id.as_i64().ok_or_else(|| Error::MalformedRecord {
        record_id: None,
        reason: format!("id is not an integer: {}", id),
    })
}

fn location_fields(
    ctx: &Ctx,
    obj: &Map<String, Value>,
) -> Result<(Option<String>, Option<String>)> {
    let location = match ctx.lookup(obj, "location")? {
        Value::Null => None,
        Value::String(s) => Some(s.as_str()),
        other => {
            return Err(ctx.malformed(format!(
                "location is not a string: {}",
                kind(other)
            )));
        }
    };
    parse_location(location).ok_or_else(|| {
        ctx.malformed(format!(
            "location {:?} is not \"lon,lat\"",
            location.unwrap_or_default()
        ))
    })
}

fn project_identifications(ctx: &Ctx, identifications: &Value) -> Result<Value> {
    let entries = identifications
        .as_array()
        .ok_or_else(|| ctx.malformed("identifications is not a list"))?;

    let mut projected = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let entry = ctx.object(entry, &format!("identifications[{}]", index))?;
        let field = |path: &str| {
            ctx.lookup(entry, path)
                .map_err(|_| ctx.missing(&format!("identifications[{}].{}", index, path)))
        };

        let mut item = Map::new();
        item.insert("user_id".to_string(), field("user.id")?.clone());
        item.insert("category".to_string(), field("category")?.clone());
        item.insert("disagreement".to_string(), field("disagreement")?.clone());
        projected.push(Value::Object(item));
    }
    Ok(Value::Array(projected))
}

/// `null`, `""`, `[]` and `{}` count as "not present"
fn present(value: &Value) -> Option<&Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        value => Some(value),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

// Error context for one record
struct Ctx {
    record_id: i64,
}

impl Ctx {
    fn missing(&self, field: &str) -> Error {
        Error::MissingField {
            record_id: Some(self.record_id),
            field: field.to_string(),
        }
    }

    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::MalformedRecord {
            record_id: Some(self.record_id),
            reason: reason.into(),
        }
    }

    fn object<'a>(&self, value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
        value
            .as_object()
            .ok_or_else(|| self.malformed(format!("{} is not an object: {}", what, kind(value))))
    }

    /// Follow a dotted path; every segment must be present
    fn lookup<'a>(&self, obj: &'a Map<String, Value>, path: &str) -> Result<&'a Value> {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or(path);
        let mut current = obj.get(first).ok_or_else(|| self.missing(path))?;
        for segment in segments {
            current = self
                .object(current, path)?
                .get(segment)
                .ok_or_else(|| self.missing(path))?;
        }
        Ok(current)
    }
}
