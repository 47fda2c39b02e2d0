//! Domain and lattice helpers shared by the builders.

use arbiter_core::{DecisionDomain, Region};

/// Parses a domain descriptor of the form `"x,0,100,101 : y,0,1,11"`.
///
/// Each colon-separated part is `name,low,high,points`. Returns `None` on
/// any malformed part or on a variable the domain itself would reject.
pub fn parse_domain(descriptor: &str) -> Option<DecisionDomain> {
    let mut domain = DecisionDomain::new();
    for part in descriptor.split(':') {
        let fields: Vec<&str> = part.trim().split(',').map(str::trim).collect();
        if fields.len() != 4 {
            return None;
        }
        let low: f64 = fields[1].parse().ok()?;
        let high: f64 = fields[2].parse().ok()?;
        let points: usize = fields[3].parse().ok()?;
        if !domain.add_var(fields[0], low, high, points) {
            return None;
        }
    }
    Some(domain)
}

/// Returns a new domain holding only the named variables, in the given
/// order. Empty if any name is unknown.
pub fn sub_domain(domain: &DecisionDomain, vars: &[&str]) -> DecisionDomain {
    if vars.iter().any(|name| !domain.has_var(name)) {
        return DecisionDomain::new();
    }
    let mut sub = DecisionDomain::new();
    for name in vars {
        sub.add_var_from(domain, name);
    }
    sub
}

/// The degree-0 region spanning the full discrete extent of the domain.
pub fn domain_to_region(domain: &DecisionDomain) -> Region {
    Region::spanning(domain, 0)
}

/// Picks a cell extent such that tiling the domain uniformly with it yields
/// at most `max_pieces` regions, keeping the per-axis piece counts balanced.
/// Axes stop growing their piece count once another split would bust the
/// budget; the rest keep splitting until they are one point per piece.
pub fn uniform_template(domain: &DecisionDomain, max_pieces: usize) -> Option<Region> {
    let dim = domain.size();
    if dim == 0 || max_pieces == 0 {
        return None;
    }

    let pts: Vec<f64> = (0..dim).map(|d| domain.var_points(d) as f64).collect();
    let mut pieces = vec![1.0f64; dim];
    let mut maxed = vec![false; dim];

    while !maxed.iter().all(|&m| m) {
        // The axis with the most points per piece is split next.
        let mut aug = 0;
        let mut widest = 0.0;
        for d in 0..dim {
            if maxed[d] {
                continue;
            }
            let per_piece = pts[d] / pieces[d];
            if per_piece > widest {
                widest = per_piece;
                aug = d;
            }
        }

        pieces[aug] += 1.0;
        let hypothetical: f64 = pieces.iter().product();
        if hypothetical > max_pieces as f64 {
            pieces[aug] -= 1.0;
            maxed[aug] = true;
        }
        if pieces[aug] >= pts[aug] {
            maxed[aug] = true;
        }
    }

    let mut template = Region::new(dim, 0);
    for d in 0..dim {
        let edge = (pts[d] / pieces[d]).ceil() as i32;
        template.set_span(d, 0, edge - 1);
    }
    Some(template)
}

/// Tiles `outer` with copies of the template's cell extent, lowest axis
/// fastest, truncating the last cell on each axis at the outer edge.
/// Regions carry the requested degree with zeroed weights. Empty when the
/// two regions disagree on dimension.
pub fn uniform_regions(outer: &Region, template: &Region, degree: usize) -> Vec<Region> {
    let dim = outer.dim();
    if dim != template.dim() {
        return Vec::new();
    }

    let lows: Vec<i32> = (0..dim).map(|d| outer.span(d).lo()).collect();
    let highs: Vec<i32> = (0..dim).map(|d| outer.span(d).hi()).collect();
    let edges: Vec<i32> = (0..dim).map(|d| (template.span(d).hi() + 1).max(1)).collect();

    let mut regions = Vec::new();
    let mut cursor = lows.clone();
    loop {
        let mut r = Region::new(dim, degree);
        for d in 0..dim {
            r.set_span(d, cursor[d], (cursor[d] + edges[d] - 1).min(highs[d]));
        }
        regions.push(r);

        if (0..dim).all(|d| cursor[d] + edges[d] > highs[d]) {
            break;
        }
        for d in 0..dim {
            cursor[d] += edges[d];
            if cursor[d] <= highs[d] {
                break;
            }
            cursor[d] = lows[d];
        }
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_spaced_descriptor() {
        let dom = parse_domain("heading,0,359,360 : speed, 0, 4, 21").expect("parses");
        assert_eq!(dom.size(), 2);
        assert_eq!(dom.var_points(1), 21);
        assert_eq!(dom.var_delta(1), 0.2);
    }

    #[test]
    fn parse_rejects_malformed_parts() {
        assert!(parse_domain("").is_none());
        assert!(parse_domain("x,0,100").is_none());
        assert!(parse_domain("x,zero,100,101").is_none());
        assert!(parse_domain("x,100,0,101").is_none());
        assert!(parse_domain("x,0,100,101 : x,0,1,11").is_none());
    }

    #[test]
    fn sub_domain_keeps_requested_order() {
        let dom = parse_domain("x,0,10,11 : y,0,20,21 : z,0,30,31").expect("parses");
        let sub = sub_domain(&dom, &["z", "x"]);
        assert_eq!(sub.size(), 2);
        assert_eq!(sub.var_name(0), Some("z"));
        assert_eq!(sub.var_name(1), Some("x"));

        assert!(sub_domain(&dom, &["z", "missing"]).is_empty());
    }

    #[test]
    fn template_respects_piece_budget() {
        let dom = parse_domain("x,0,99,100 : y,0,99,100").expect("parses");
        let template = uniform_template(&dom, 60).expect("template");
        let outer = domain_to_region(&dom);
        let tiles = uniform_regions(&outer, &template, 0);
        assert!(tiles.len() <= 60, "{} tiles for budget 60", tiles.len());
        assert!(tiles.len() > 30, "budget should be mostly used");
    }

    #[test]
    fn template_balances_axes() {
        let dom = parse_domain("x,0,359,360 : y,0,9,10").expect("parses");
        let template = uniform_template(&dom, 100).expect("template");
        // The long axis ends up split far more often than the short one.
        let x_edge = template.span(0).hi() + 1;
        let y_edge = template.span(1).hi() + 1;
        assert!(360 / x_edge >= 10 / y_edge);
    }

    #[test]
    fn tiling_covers_outer_exactly() {
        let dom = parse_domain("x,0,9,10 : y,0,6,7").expect("parses");
        let mut template = Region::new(2, 0);
        template.set_span(0, 0, 3);
        template.set_span(1, 0, 2);
        let outer = domain_to_region(&dom);
        let tiles = uniform_regions(&outer, &template, 1);

        // ceil(10/4) * ceil(7/3) tiles, last ones truncated at the edge.
        assert_eq!(tiles.len(), 9);
        for t in &tiles {
            assert_eq!(t.degree(), 1);
            assert!(t.span(0).hi() <= 9);
            assert!(t.span(1).hi() <= 6);
        }

        let mut covered = vec![false; 10 * 7];
        for t in &tiles {
            for x in t.span(0).lo()..=t.span(0).hi() {
                for y in t.span(1).lo()..=t.span(1).hi() {
                    let ix = (y * 10 + x) as usize;
                    assert!(!covered[ix], "point covered twice");
                    covered[ix] = true;
                }
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn tiling_rejects_dimension_mismatch() {
        let dom = parse_domain("x,0,9,10").expect("parses");
        let outer = domain_to_region(&dom);
        let template = Region::new(2, 0);
        assert!(uniform_regions(&outer, &template, 0).is_empty());
    }
}
