//! End-to-end checks of executor-shaped results against authored expectations

use indexmap::IndexMap;
use octofhir_cqlt_assert::{
    CqlCode, CqlConcept, CqlDate, CqlInterval, CqlQuantity, CqlValue, check, check_all,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::{Value, json};

/// Expectations as a test author writes them in YAML
fn expectations(yaml: &str) -> IndexMap<String, Value> {
    serde_yaml::from_str(yaml).unwrap()
}

fn results() -> IndexMap<String, CqlValue> {
    let mut results = IndexMap::new();
    results.insert("InPopulation".to_string(), CqlValue::Boolean(true));
    results.insert(
        "Hypertension".to_string(),
        CqlValue::Concept(CqlConcept::from_code(
            CqlCode::new("38341003", "http://snomed.info/sct").with_display("Hypertension"),
        )),
    );
    results.insert(
        "LastSystolic".to_string(),
        CqlValue::Quantity(CqlQuantity::new(Decimal::from(120), "mm[Hg]")),
    );
    results.insert(
        "MeasurementPeriod".to_string(),
        CqlValue::Interval(CqlInterval::closed(
            CqlValue::Date(CqlDate::new(2024, 1, 1)),
            CqlValue::Date(CqlDate::new(2024, 12, 31)),
        )),
    );
    results.insert(
        "Conditions".to_string(),
        CqlValue::List(vec![
            CqlValue::Resource(json!({"resourceType": "Condition", "id": "c1"})),
            CqlValue::Resource(json!({"resourceType": "Condition", "id": "c2"})),
        ]),
    );
    results
}

#[test]
fn test_yaml_expectations_pass() {
    let expected = expectations(
        r#"
InPopulation: true
Hypertension:
  codes:
    - code: "38341003"
      system: http://snomed.info/sct
      display: Hypertension
  display: Hypertension
LastSystolic:
  value: 120.0
  unit: mm[Hg]
MeasurementPeriod:
  low: 2024-01-01
  high: 2024-12-31
  lowClosed: true
  highClosed: true
Conditions: $should have length 2
"#,
    );

    assert_eq!(check_all(&results(), &expected), vec![]);
}

#[test]
fn test_failures_do_not_stop_remaining_checks() {
    let expected = expectations(
        r#"
InPopulation: false
Conditions: $should have length 3
LastSystolic: $should exist
Denominator: $should exist
"#,
    );

    let failures = check_all(&results(), &expected);
    let messages: Vec<_> = failures.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "InPopulation=true",
            r#"Conditions=[{"resourceType":"Condition","id":"c1"},{"resourceType":"Condition","id":"c2"}]"#,
            "Denominator=null",
        ]
    );
}

#[test]
fn test_json_results_round_trip_through_normalize() {
    let raw = json!({"resourceType": "Observation", "valueQuantity": {"value": 5, "unit": "mg"}});
    let value = CqlValue::from(raw.clone());
    assert_eq!(value.normalize(), raw);
    assert!(check("Obs", Some(&value), &raw).is_ok());
}
