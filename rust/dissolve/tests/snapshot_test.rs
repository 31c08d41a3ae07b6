// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dissolve driven from a JSON dataset fixture.

use std::fs;

use approx::assert_relative_eq;
use dissolve_lite::{
    dissolve_polygon_layer, DatasetSnapshot, DissolveOptions, KeyFieldComposer, Value,
};

fn load_fixture(name: &str) -> DatasetSnapshot {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name);
    let json = fs::read_to_string(&path).expect("Failed to read fixture");
    DatasetSnapshot::from_json(&json).expect("Failed to parse fixture")
}

#[test]
fn tracts_dissolve_into_county() {
    let snap = load_fixture("two_tracts.json");
    let arcs = snap.arc_store().unwrap();
    let tracts = &snap.layers[0];
    assert_eq!(tracts.name.as_deref(), Some("tracts"));

    let opts = DissolveOptions::from_json(r#"{"field": "county"}"#).unwrap();
    let out = dissolve_polygon_layer(tracts, &arcs, &opts, None, &KeyFieldComposer).unwrap();

    assert_eq!(out.layer.shapes.len(), 1);
    let county = out.layer.shapes[0].as_ref().unwrap();
    assert_eq!(county.len(), 1);
    assert_relative_eq!(arcs.ring_area(&county[0]), 2.0);
    // The tract boundary (arc 2) is interior to the county
    assert!(county[0].iter().all(|r| r.id() != 2));

    let data = out.layer.data.as_ref().unwrap();
    assert_eq!(data.fields(), &["county".to_string()]);
    assert_eq!(data.get(0, "county"), &Value::from("Adams"));
}

#[test]
fn dissolved_layer_survives_a_json_round_trip() {
    let snap = load_fixture("two_tracts.json");
    let arcs = snap.arc_store().unwrap();
    let opts = DissolveOptions::new().with_fields(["county"]);
    let out =
        dissolve_polygon_layer(&snap.layers[0], &arcs, &opts, None, &KeyFieldComposer).unwrap();

    let json = DatasetSnapshot::new(&arcs, vec![out.layer.clone()])
        .to_json()
        .unwrap();
    let restored = DatasetSnapshot::from_json(&json).unwrap();
    let restored_arcs = restored.arc_store().unwrap();

    assert_eq!(restored.layers[0].shapes, out.layer.shapes);
    let ring = &restored.layers[0].shapes[0].as_ref().unwrap()[0];
    assert_relative_eq!(restored_arcs.ring_area(ring), 2.0);
    assert_eq!(
        restored.layers[0].data.as_ref().unwrap().get(0, "county"),
        &Value::from("Adams")
    );
}

#[test]
fn unknown_option_keys_are_rejected() {
    assert!(DissolveOptions::from_json(r#"{"feild": "county"}"#).is_err());
}
