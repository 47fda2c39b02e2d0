use anyhow::{Context, Result};
use arbiter_build::{parse_domain, ThresholdBuilder, VectorBuilder};
use arbiter_solve::Problem;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // RUST_LOG=debug traces the search as it adopts decisions.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let dom = parse_domain("heading,0,359,360 : speed,0,4,21").context("domain string parses")?;

    let hold_course = VectorBuilder::new(&dom, "heading")
        .with_samples(&[0.0, 90.0, 359.0])
        .with_utilities(&[0.0, 100.0, 0.0])
        .build()?
        .with_context("hold_course");
    let safe_speed = ThresholdBuilder::new(&dom, "speed")
        .with_threshold(3.0)
        .with_base_width(1.0)
        .build()?
        .with_priority(2.0)
        .with_context("safe_speed");

    let mut problem = Problem::new(dom.clone());
    problem.add_function(hold_course);
    problem.add_function(safe_speed);
    problem.align_functions()?;
    problem.sort_functions();

    let decision = problem.solve()?;
    println!(
        "cycle 1: heading {:.1} deg, speed {:.2} m/s (weight {:.1})",
        decision.value("heading").context("heading decided")?,
        decision.value("speed").context("speed decided")?,
        decision.weight(),
    );

    // Next cycle the course behavior wants 135 degrees; the previous
    // decision seeds the new search.
    let new_course = VectorBuilder::new(&dom, "heading")
        .with_samples(&[0.0, 135.0, 359.0])
        .with_utilities(&[0.0, 100.0, 0.0])
        .build()?
        .with_context("hold_course");
    let safe_speed = ThresholdBuilder::new(&dom, "speed")
        .with_threshold(3.0)
        .with_base_width(1.0)
        .build()?
        .with_priority(2.0)
        .with_context("safe_speed");

    problem.clear();
    problem.add_function(new_course);
    problem.add_function(safe_speed);
    problem.align_functions()?;
    problem.sort_functions();

    let warm = decision.point();
    let next = problem.solve_from(Some(&warm))?;
    println!(
        "cycle 2: heading {:.1} deg, speed {:.2} m/s (weight {:.1})",
        next.value("heading").context("heading decided")?,
        next.value("speed").context("speed decided")?,
        next.weight(),
    );

    Ok(())
}
