//! End-to-end checks of the drift coordinate transforms.

use std::sync::Arc;

use approx::assert_relative_eq;
use argonrec_core::geometry::{Geometry, SimpleGeometry};
use argonrec_detinfo::{DetPropsConfig, DetectorClocks, DetectorProperties, LarProperties};

fn standard() -> DetectorProperties {
    let geom: Arc<dyn Geometry> = Arc::new(SimpleGeometry::uvz(0.0, 0.3, 3456, 0.3));
    let clocks = DetectorClocks::new()
        .with_sample_period_ns(500.0)
        .with_trigger_offset_ticks(0.0);
    DetectorProperties::new(
        DetPropsConfig::default(),
        LarProperties::default(),
        clocks,
        geom,
    )
    .unwrap()
}

#[test]
fn x_to_ticks_round_trips_on_every_plane() {
    let props = standard();
    for plane in 0..3 {
        for i in -5..=50 {
            let x = 5.0 * f64::from(i);
            let ticks = props.convert_x_to_ticks(x, plane, 0, 0);
            assert_relative_eq!(
                props.convert_ticks_to_x(ticks, plane, 0, 0),
                x,
                epsilon = 1e-10,
                max_relative = 1e-12
            );
        }
    }
}

#[test]
fn ticks_grow_with_drift_distance() {
    let props = standard();
    let near = props.convert_x_to_ticks(1.0, 0, 0, 0);
    let far = props.convert_x_to_ticks(100.0, 0, 0, 0);
    assert!(far > near);
    // Linear in x with slope 1/C.
    assert_relative_eq!(
        (far - near) / 99.0,
        1.0 / props.x_ticks_coefficient(),
        epsilon = 1e-9
    );
}

#[test]
fn same_x_arrives_later_on_farther_planes() {
    // The charge drifts past plane 0 before reaching planes 1 and 2, so
    // at fixed x the tick grows with the plane index.
    let props = standard();
    let t0 = props.convert_x_to_ticks(50.0, 0, 0, 0);
    let t1 = props.convert_x_to_ticks(50.0, 1, 0, 0);
    let t2 = props.convert_x_to_ticks(50.0, 2, 0, 0);
    assert!(t0 < t1);
    assert!(t1 < t2);
}

#[test]
fn drift_coefficient_matches_nominal_velocity() {
    let props = standard();
    let lar = LarProperties::default();
    // C = 1e-3 * v_drift[cm/us] * 500 ns/tick.
    assert_relative_eq!(
        props.x_ticks_coefficient(),
        1.0e-3 * lar.drift_velocity_nominal() * 500.0,
        epsilon = 1e-12
    );
    // At 0.5 kV/cm and 87.3 K the drift velocity is about 1.6 mm/us,
    // so one 500 ns tick covers about 0.8 mm.
    assert!(props.x_ticks_coefficient() > 0.05);
    assert!(props.x_ticks_coefficient() < 0.12);
}

#[test]
fn gap_transit_uses_stronger_fields() {
    // The inter-plane fields are stronger than the drift field, so a gap
    // transit takes fewer ticks than the same distance in the bulk.
    let props = standard();
    let bulk_ticks = 0.3 / props.x_ticks_coefficient();
    let gap_ticks = props.x_ticks_offset(1, 0, 0) - props.x_ticks_offset(0, 0, 0);
    assert!(gap_ticks > 0.0);
    assert!(gap_ticks < bulk_ticks);
}

#[test]
fn negative_drift_direction_flips_the_slope() {
    let geom: Arc<dyn Geometry> = Arc::new(SimpleGeometry::new(
        vec![0.0, 0.3, 0.6],
        vec![
            argonrec_core::ids::View::U,
            argonrec_core::ids::View::V,
            argonrec_core::ids::View::Z,
        ],
        vec![std::f64::consts::FRAC_PI_3, -std::f64::consts::FRAC_PI_3, 0.0],
        3456,
        0.3,
        -1.0,
    ));
    let clocks = DetectorClocks::new().with_sample_period_ns(500.0);
    let props = DetectorProperties::new(
        DetPropsConfig::default(),
        LarProperties::default(),
        clocks,
        geom,
    )
    .unwrap();
    let near = props.convert_x_to_ticks(-1.0, 0, 0, 0);
    let far = props.convert_x_to_ticks(-100.0, 0, 0, 0);
    assert!(far > near);
    assert_relative_eq!(
        props.convert_ticks_to_x(props.convert_x_to_ticks(-42.0, 2, 0, 0), 2, 0, 0),
        -42.0,
        epsilon = 1e-10
    );
}
