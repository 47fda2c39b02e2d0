use arbiter_build::{parse_domain, ThresholdBuilder, VectorBuilder};
use arbiter_core::{Region, WeightedFunction};

fn eval(of: &WeightedFunction, ix: i32) -> f64 {
    of.map()
        .eval_point(&Region::point_at(&[ix]))
        .expect("curve covers the domain")
}

#[test]
fn triangle_curve_tiles_without_overlap() {
    let dom = parse_domain("x,0,100,101").expect("parses");
    let of = VectorBuilder::new(&dom, "x")
        .with_samples(&[0.0, 50.0, 100.0])
        .with_utilities(&[0.0, 50.0, 0.0])
        .build()
        .expect("builds");

    assert_eq!(of.size(), 2);
    let up = of.map().region(0).expect("first piece");
    let down = of.map().region(1).expect("second piece");
    assert_eq!((up.span(0).lo(), up.span(0).hi()), (0, 50));
    assert_eq!((down.span(0).lo(), down.span(0).hi()), (51, 100));

    assert_eq!(eval(&of, 25), 25.0);
    assert_eq!(eval(&of, 75), 25.0);
    // The shared index 50 belongs to the rising piece alone.
    assert_eq!(eval(&of, 50), 50.0);
}

#[test]
fn curve_reproduces_sample_utilities() {
    let dom = parse_domain("x,0,100,101").expect("parses");
    let samples = [0.0, 20.0, 35.0, 80.0, 100.0];
    let utilities = [10.0, 40.0, 15.0, 90.0, 0.0];
    let of = VectorBuilder::new(&dom, "x")
        .with_samples(&samples)
        .with_utilities(&utilities)
        .build()
        .expect("builds");

    for (s, u) in samples.iter().zip(&utilities) {
        let got = eval(&of, *s as i32);
        assert!((got - u).abs() < 1e-9, "at {s}: {got} vs {u}");
    }
}

#[test]
fn unsorted_samples_build_the_same_curve() {
    let dom = parse_domain("x,0,100,101").expect("parses");
    let sorted = VectorBuilder::new(&dom, "x")
        .with_samples(&[0.0, 40.0, 100.0])
        .with_utilities(&[5.0, 90.0, 30.0])
        .build()
        .expect("builds");
    let shuffled = VectorBuilder::new(&dom, "x")
        .with_samples(&[40.0, 100.0, 0.0])
        .with_utilities(&[90.0, 30.0, 5.0])
        .build()
        .expect("builds");

    for ix in [0, 13, 40, 77, 100] {
        assert_eq!(eval(&sorted, ix), eval(&shuffled, ix));
    }
}

#[test]
fn every_built_region_is_well_formed() {
    let dom = parse_domain("x,0,100,101").expect("parses");
    let last = dom.var_points(0) as i32 - 1;

    let mut built: Vec<WeightedFunction> = Vec::new();
    built.push(
        VectorBuilder::new(&dom, "x")
            .with_samples(&[-5.0, 0.3, 0.4, 99.7, 130.0])
            .with_utilities(&[1.0, 2.0, 3.0, 4.0, 5.0])
            .build()
            .expect("vector builds"),
    );
    for (threshold, width, summit) in [
        (0.0, 0.0, 0.0),
        (100.0, 50.0, 0.0),
        (-20.0, 10.0, 5.0),
        (42.5, 0.4, 1.0),
        (99.9, 0.0, 3.0),
    ] {
        built.push(
            ThresholdBuilder::new(&dom, "x")
                .with_threshold(threshold)
                .with_base_width(width)
                .with_summit_delta(summit)
                .build()
                .expect("threshold builds"),
        );
    }

    for of in &built {
        for r in of.map().regions() {
            let span = r.span(0);
            assert!(span.lo() <= span.hi(), "inverted span {:?}", span);
            assert!(span.lo() >= 0 && span.hi() <= last, "span off the domain");
        }
        // Disjoint and complete: every index is covered exactly once.
        for ix in 0..=last {
            let point = Region::point_at(&[ix]);
            let covering = of.map().regions().iter().filter(|r| r.intersects(&point));
            assert_eq!(covering.count(), 1, "index {ix} coverage");
        }
    }
}

#[test]
fn threshold_composes_with_vector_on_one_domain() {
    let dom = parse_domain("x,0,100,101 : y,0,10,11").expect("parses");
    let of_x = ThresholdBuilder::new(&dom, "x")
        .with_threshold(25.0)
        .with_base_width(25.0)
        .build()
        .expect("builds");
    let of_y = VectorBuilder::new(&dom, "y")
        .with_samples(&[0.0, 10.0])
        .with_utilities(&[0.0, 100.0])
        .build()
        .expect("builds");

    // Each builder works on its own one-variable subdomain.
    assert_eq!(of_x.dim(), 1);
    assert_eq!(of_x.var_name(0), Some("x"));
    assert_eq!(of_y.var_name(0), Some("y"));
}
