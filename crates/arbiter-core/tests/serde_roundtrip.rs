#![cfg(feature = "serde")]

use arbiter_core::{DecisionDomain, PiecewiseMap, Region, WeightedFunction};

fn speed_domain() -> DecisionDomain {
    let mut dom = DecisionDomain::new();
    assert!(dom.add_var("speed", 0.0, 4.0, 41));
    dom
}

fn ramp_map(dom: &DecisionDomain) -> PiecewiseMap {
    let mut lo = Region::new(1, 1);
    lo.set_span(0, 0, 20);
    lo.set_weights(&[2.0, 0.0]);
    let mut hi = Region::new(1, 1);
    hi.set_span(0, 21, 40);
    hi.set_weights(&[-1.0, 60.0]);
    PiecewiseMap::new(dom.clone(), 1, vec![lo, hi]).expect("valid map")
}

#[test]
fn map_roundtrips_through_json() {
    let dom = speed_domain();
    let map = ramp_map(&dom);

    let encoded = serde_json::to_string(&map).expect("serialize map");
    let mut decoded: PiecewiseMap = serde_json::from_str(&encoded).expect("deserialize map");

    assert_eq!(decoded.len(), map.len());
    assert_eq!(decoded.degree(), map.degree());
    assert_eq!(decoded.domain(), map.domain());
    assert_eq!(decoded.cell_template(), map.cell_template());

    // The spatial index is derived state and is rebuilt, not transported.
    assert!(decoded.grid().is_none());
    decoded.rebuild_grid(true, true);

    for ix in [0, 10, 20, 21, 35, 40] {
        let probe = Region::point_at(&[ix]);
        assert_eq!(decoded.eval_point(&probe), map.eval_point(&probe));
    }
}

#[test]
fn function_roundtrips_with_priority_and_context() {
    let dom = speed_domain();
    let of = WeightedFunction::new(ramp_map(&dom))
        .with_priority(75.0)
        .with_context("transit_leg");

    let encoded = serde_json::to_string(&of).expect("serialize function");
    let decoded: WeightedFunction = serde_json::from_str(&encoded).expect("deserialize function");

    assert_eq!(decoded.priority(), 75.0);
    assert_eq!(decoded.context(), "transit_leg");
    assert_eq!(decoded.size(), of.size());
    assert_eq!(decoded.map().domain(), of.map().domain());

    let probe = Region::point_at(&[20]);
    assert_eq!(decoded.map().eval_point(&probe), of.map().eval_point(&probe));
}
