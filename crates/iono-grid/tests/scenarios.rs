//! End-to-end checks on small hand-computed grids.

use iono_grid::{
    bracket, bracket_index, integrate, regrid, Axis, AxisKind, FieldId, GridError, GridGeometry,
    IntegrationBounds, TargetAltitudes,
};
use ndarray::Array4;
use test_utils::{
    assert_approx_eq, assert_rel_eq, columns, create_constant_field, create_field_with_nans,
    create_flat_height_field, grid, reference,
};

#[test]
fn test_bracket_on_uniform_axis() {
    let x = [100.0, 150.0, 200.0, 250.0];
    let b = bracket(&x, 175.0).unwrap();
    assert_eq!(b.index, 1);
    assert_approx_eq!(b.fraction, 0.5, 1e-15);
}

#[test]
fn test_bracket_clamps_at_edges() {
    let x = columns::IRREGULAR;
    assert_eq!(bracket_index(&x, 50.0).unwrap(), 0);
    assert_eq!(bracket_index(&x, 100.0).unwrap(), 0);
    assert_eq!(bracket_index(&x, 150.0).unwrap(), 2);
    assert_eq!(bracket_index(&x, 900.0).unwrap(), 2);
}

#[test]
fn test_regrid_two_adjacent_columns() {
    let mut heights = Array4::zeros((1, 3, 1, 2));
    let mut values = Array4::zeros((1, 3, 1, 2));
    for i in 0..2 {
        for k in 0..3 {
            heights[[0, k, 0, i]] = columns::PAIR_HEIGHTS[i][k];
            values[[0, k, 0, i]] = columns::PAIR_VALUES[i][k];
        }
    }
    let targets = TargetAltitudes::from_values(vec![115.0]).unwrap();
    let out = regrid(
        heights.view(),
        &[(FieldId::NeutralDensity, values.view())],
        &targets,
        &[0],
    )
    .unwrap();

    let rho = out.field(FieldId::NeutralDensity).unwrap();
    // 115 km sits a third of the way through [110, 125] and
    // one sixth of the way through [112, 130].
    assert_approx_eq!(rho[[0, 0, 0, 0]], 7.0 / 3.0, 1e-12);
    assert_approx_eq!(rho[[0, 0, 0, 1]], 19.0 / 6.0, 1e-12);
}

#[test]
fn test_unit_field_integrates_to_cell_volume() {
    // 10 km layer starting at r = 6478 km, one 2.5 x 2.5 degree cell.
    let cell = grid::EQUATORIAL_2X2;
    let heights = create_flat_height_field(&[107.0, 117.0], 1, cell.nlat, cell.nlon);
    let field = create_constant_field(heights.dim(), 1.0);
    let lat = Axis::new(AxisKind::Lat, cell.lat_values()).unwrap();
    let lon = Axis::new(AxisKind::Lon, cell.lon_values()).unwrap();
    let geometry = GridGeometry::new(heights.view(), &lat, &lon).unwrap();

    let total = integrate(
        FieldId::JouleHeating,
        field.view(),
        &geometry,
        0,
        &IntegrationBounds::full(2, 2, 2),
    )
    .unwrap();

    let expected = reference::spherical_box_volume((107.0, 117.0), (0.0, 2.5), (0.0, 2.5));
    assert_rel_eq!(total.value, expected, 1e-3);
    assert_eq!(total.units.to_string(), "W");
}

#[test]
fn test_empty_altitude_bounds() {
    let heights = create_flat_height_field(&[100.0, 110.0, 120.0], 1, 2, 2);
    let field = create_constant_field(heights.dim(), 1.0);
    let lat = Axis::uniform(AxisKind::Lat, 0.0, 2.5, 2).unwrap();
    let lon = Axis::uniform(AxisKind::Lon, 0.0, 2.5, 2).unwrap();
    let geometry = GridGeometry::new(heights.view(), &lat, &lon).unwrap();

    let err = integrate(
        FieldId::JouleHeating,
        field.view(),
        &geometry,
        0,
        &IntegrationBounds::new(0, 1, 0, 1, 1, 1),
    )
    .unwrap_err();
    assert_eq!(
        err,
        GridError::EmptyRange {
            axis: "altitude",
            min: 1,
            max: 1
        }
    );
}

#[test]
fn test_nan_inside_bounds_is_rejected() {
    let heights = create_flat_height_field(&[100.0, 110.0, 120.0], 1, 2, 2);
    let field = create_field_with_nans(heights.dim(), 1.0, &[(0, 2, 1, 0)]);
    let lat = Axis::uniform(AxisKind::Lat, 0.0, 2.5, 2).unwrap();
    let lon = Axis::uniform(AxisKind::Lon, 0.0, 2.5, 2).unwrap();
    let geometry = GridGeometry::new(heights.view(), &lat, &lon).unwrap();

    let err = integrate(
        FieldId::JouleHeating,
        field.view(),
        &geometry,
        0,
        &IntegrationBounds::full(3, 2, 2),
    )
    .unwrap_err();
    match err {
        GridError::NonFiniteInput { t, k, lat, lon, .. } => {
            assert_eq!((t, k, lat, lon), (0, 2, 1, 0));
        }
        other => panic!("expected NonFiniteInput, got {other:?}"),
    }
}

#[test]
fn test_bounds_past_grid_edge() {
    let heights = create_flat_height_field(&[100.0, 110.0, 120.0], 1, 2, 2);
    let field = create_constant_field(heights.dim(), 1.0);
    let lat = Axis::uniform(AxisKind::Lat, 0.0, 2.5, 2).unwrap();
    let lon = Axis::uniform(AxisKind::Lon, 0.0, 2.5, 2).unwrap();
    let geometry = GridGeometry::new(heights.view(), &lat, &lon).unwrap();

    let err = integrate(
        FieldId::JouleHeating,
        field.view(),
        &geometry,
        0,
        &IntegrationBounds::new(0, 1, 0, 2, 0, 2),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        GridError::BoundsOutOfRange {
            axis: "longitude",
            index: 2,
            len: 2
        }
    ));
}
