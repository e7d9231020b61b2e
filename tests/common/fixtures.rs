//! Observation fixtures and mock API pages

use serde_json::{Value, json};
use wiremock::ResponseTemplate;

/// A complete observation as the API returns it
pub fn observation(id: i64) -> Value {
    json!({
        "id": id,
        "observed_on_string": "2019-04-27 11:02:13",
        "time_observed_at": "2019-04-27T11:02:13-07:00",
        "created_time_zone": "America/Los_Angeles",
        "created_at": "2019-04-27T11:05:00-07:00",
        "updated_at": "2019-04-28T09:00:00-07:00",
        "description": null,
        "user": {"id": 1000 + id, "login": format!("observer{}", id)},
        "quality_grade": "research",
        "reviewed_by": [1000 + id],
        "faves_count": 0,
        "num_identification_agreements": 1,
        "num_identification_disagreements": 0,
        "identifications_most_agree": true,
        "identifications_most_disagree": false,
        "captive": false,
        "place_guess": "Golden Gate Park, San Francisco",
        "place_ids": [1, 14, 5855],
        "location": "37.7694,-122.4862",
        "positional_accuracy": 8,
        "geoprivacy": null,
        "taxon_geoprivacy": null,
        "obscured": false,
        "species_guess": "Western Fence Lizard",
        "taxon": {
            "id": 36204,
            "name": "Sceloporus occidentalis",
            "preferred_common_name": "Western Fence Lizard",
            "iconic_taxon_name": "Reptilia",
            "rank": "species",
            "parent_id": 36203,
            "native": true,
            "endemic": false,
            "threatened": false,
            "universal_search_rank": 51234,
            "observations_count": 51234
        },
        "identifications": [
            {"user": {"id": 1000 + id}, "category": "improving", "disagreement": false}
        ]
    })
}

/// An observation with no location, taxon or identifications
pub fn bare_observation(id: i64) -> Value {
    let mut record = observation(id);
    record["location"] = Value::Null;
    record["taxon"] = Value::Null;
    record["identifications"] = json!([]);
    record
}

/// API response page containing the given records
pub fn page_of(total: u64, results: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "total_results": total,
        "page": 1,
        "per_page": 200,
        "results": results
    }))
}

/// API response page with full observations for ids `from..=to`
pub fn page_of_ids(total: u64, from: i64, to: i64) -> ResponseTemplate {
    page_of(total, (from..=to).map(observation).collect())
}

/// The terminating empty page
pub fn empty_page(total: u64) -> ResponseTemplate {
    page_of(total, Vec::new())
}
