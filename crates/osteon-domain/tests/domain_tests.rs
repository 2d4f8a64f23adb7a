//! Integration tests for osteon-domain.

use osteon_domain::generators::{
    box_hex_mesh, box_tet_mesh, particle_box, particle_sphere, rect_quad_mesh, rect_tri_mesh,
};
use osteon_domain::{BoundaryKind, Domain, ElementKind, SpatialHash};
use osteon_math::DVec3;
use osteon_types::{Axis, OsteonError};

fn unit_cube(n: usize) -> Domain {
    box_hex_mesh(n, n, n, DVec3::ZERO, DVec3::ONE).unwrap()
}

// ─── Construction Tests ───────────────────────────────────────

#[test]
fn hex_box_counts() {
    let d = box_hex_mesh(2, 3, 4, DVec3::ZERO, DVec3::new(2.0, 3.0, 4.0)).unwrap();
    assert_eq!(d.point_count(), 3 * 4 * 5);
    assert_eq!(d.mesh().unwrap().element_count(), 24);
    assert!(d.is_mesh());
    assert!((d.spacing().mean - 1.0).abs() < 1e-12);
}

#[test]
fn tet_box_is_conforming() {
    let d = box_tet_mesh(2, 2, 2, DVec3::ZERO, DVec3::ONE).unwrap();
    assert_eq!(d.mesh().unwrap().element_count(), 48);
    // Conforming: only the outer surface is boundary, 6 faces × 4 cells × 2 triangles.
    assert_eq!(d.boundary_faces().len(), 48);
}

#[test]
fn hex_boundary_faces() {
    let d = unit_cube(3);
    assert_eq!(d.boundary_faces().len(), 6 * 9);
    // 4^3 nodes minus the 2^3 interior ones.
    assert_eq!(d.select_boundary().len(), 64 - 8);
}

#[test]
fn plane_meshes() {
    let q = rect_quad_mesh(4, 2, 2.0, 1.0).unwrap();
    assert_eq!(q.point_count(), 15);
    assert_eq!(q.mesh().unwrap().kind, ElementKind::Quad4);
    assert_eq!(q.boundary_faces().len(), 12);

    let t = rect_tri_mesh(4, 2, 2.0, 1.0).unwrap();
    assert_eq!(t.mesh().unwrap().element_count(), 16);
    assert_eq!(t.boundary_faces().len(), 12);
    assert_eq!(t.select_boundary().len(), 12);
}

#[test]
fn mesh_rejects_out_of_range_index() {
    let nodes = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
    let err = Domain::from_mesh(&nodes, ElementKind::Tet4, &[0, 1, 2, 9]).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidDomain(_)));
}

#[test]
fn mesh_rejects_ragged_connectivity() {
    let nodes = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
    let err = Domain::from_mesh(&nodes, ElementKind::Tet4, &[0, 1, 2]).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidDomain(_)));
}

#[test]
fn mesh_rejects_repeated_node() {
    let nodes = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
    let err = Domain::from_mesh(&nodes, ElementKind::Tet4, &[0, 1, 1, 3]).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidDomain(_)));
}

#[test]
fn empty_sets_rejected() {
    assert!(matches!(
        Domain::from_particles(&[], &[]).unwrap_err(),
        OsteonError::EmptyDomain(_)
    ));
    assert!(matches!(
        Domain::from_mesh(&[DVec3::ZERO], ElementKind::Tet4, &[]).unwrap_err(),
        OsteonError::EmptyDomain(_)
    ));
}

#[test]
fn particles_reject_bad_volume() {
    let err = Domain::from_particles(&[DVec3::ZERO, DVec3::X], &[1.0, 0.0]).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidDomain(_)));
    let err = Domain::from_particles(&[DVec3::ZERO], &[1.0, 1.0]).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidDomain(_)));
}

#[test]
fn non_finite_coordinates_rejected() {
    let err = Domain::from_particles(&[DVec3::new(f64::NAN, 0.0, 0.0)], &[1.0]).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidDomain(_)));
}

// ─── Selection Tests ──────────────────────────────────────────

#[test]
fn select_plane() {
    let d = unit_cube(2);
    let top = d.select(Axis::Z, 1.0, 1e-9);
    assert_eq!(top.len(), 9);
    assert!(top.iter().all(|&i| (d.position(i).z - 1.0).abs() < 1e-12));
}

#[test]
fn empty_tolerance_window_selects_nothing() {
    let d = unit_cube(2);
    assert!(d.select(Axis::X, 0.0, -1.0).is_empty());
    assert!(d.select(Axis::X, 0.0, f64::NAN).is_empty());
    assert!(d.select(Axis::X, 0.25, 1e-9).is_empty());
}

#[test]
fn select_box_inclusive() {
    let d = unit_cube(2);
    let sel = d.select_box(DVec3::ZERO, DVec3::splat(0.5));
    assert_eq!(sel.len(), 8);
}

#[test]
fn select_boundary_is_idempotent() {
    let d = unit_cube(3);
    assert_eq!(d.select_boundary(), d.select_boundary());

    let p = particle_box(5, 5, 5, DVec3::ZERO, DVec3::ONE).unwrap();
    assert_eq!(p.select_boundary(), p.select_boundary());
}

#[test]
fn particle_boundary_excludes_interior() {
    let p = particle_box(5, 5, 5, DVec3::ZERO, DVec3::ONE).unwrap();
    let boundary = p.select_boundary();
    // 125 particles minus the 3×3×3 interior block.
    assert_eq!(boundary.len(), 125 - 27);
    let center = 2 + 5 * (2 + 5 * 2);
    assert!(!boundary.contains(&center));
}

// ─── Boundary Condition Tests ─────────────────────────────────

#[test]
fn fixed_mask_and_constraint() {
    let mut d = unit_cube(1);
    assert!(!d.has_constraint());
    let bottom = d.select(Axis::Z, 0.0, 1e-9);
    d.set_fixed_axes(&bottom, [false, false, true]).unwrap();
    d.set_fixed(&[0]).unwrap();
    assert!(d.has_constraint());
    let mask = d.fixed_mask();
    assert_eq!(mask[0], [true, true, true]);
    assert_eq!(mask[1], [false, false, true]);
    assert_eq!(mask[7], [false, false, false]);
}

#[test]
fn boundary_condition_index_checked() {
    let mut d = unit_cube(1);
    let err = d.set_fixed(&[100]).unwrap_err();
    assert!(matches!(err, OsteonError::InvalidDomain(_)));
    assert!(d.boundary_conditions().is_empty());
}

#[test]
fn indices_are_normalized() {
    let mut d = unit_cube(1);
    d.set_force(&[3, 1, 3, 2], DVec3::X).unwrap();
    let bc = &d.boundary_conditions()[0];
    assert_eq!(bc.indices, vec![1, 2, 3]);
    assert_eq!(bc.kind, BoundaryKind::Force);
}

#[test]
fn face_load_is_area_weighted() {
    let mut d = unit_cube(2);
    let top = d.select(Axis::Z, 1.0, 1e-9);
    d.set_force(&top, DVec3::new(0.0, 0.0, 100.0)).unwrap();
    let f = d.nodal_forces();

    let total: DVec3 = f.iter().copied().sum();
    assert!((total.z - 100.0).abs() < 1e-9);

    // 2×2 face: corners carry 1/16, edge midpoints 2/16, center 4/16.
    let corner = top.iter().find(|&&i| d.position(i).x == 0.0 && d.position(i).y == 0.0).unwrap();
    let center = top
        .iter()
        .find(|&&i| (d.position(i).x - 0.5).abs() < 1e-12 && (d.position(i).y - 0.5).abs() < 1e-12)
        .unwrap();
    assert!((f[*corner].z - 6.25).abs() < 1e-9);
    assert!((f[*center].z - 25.0).abs() < 1e-9);
}

#[test]
fn scattered_load_is_split_equally() {
    let mut d = unit_cube(2);
    d.set_force(&[0, 26], DVec3::new(2.0, 0.0, 0.0)).unwrap();
    let f = d.nodal_forces();
    assert!((f[0].x - 1.0).abs() < 1e-12);
    assert!((f[26].x - 1.0).abs() < 1e-12);
}

#[test]
fn boundary_conditions_serialize() {
    let mut d = unit_cube(1);
    d.set_fixed_axes(&[0, 1], [true, false, false]).unwrap();
    let json = serde_json::to_string(d.boundary_conditions()).unwrap();
    assert!(json.contains("\"fixed_axes\":[true,false,false]"), "{json}");
    let kind: ElementKind = serde_json::from_str("\"hex8\"").unwrap();
    assert_eq!(kind, ElementKind::Hex8);
}

// ─── Geometry Tests ───────────────────────────────────────────

#[test]
fn mesh_normals_point_outward() {
    let d = unit_cube(2);
    let top = d.select(Axis::Z, 1.0, 1e-9);
    let normals = d.surface_normals(&d.positions(), &top);
    let center = top
        .iter()
        .position(|&i| (d.position(i).x - 0.5).abs() < 1e-12 && (d.position(i).y - 0.5).abs() < 1e-12)
        .unwrap();
    assert!((normals[center] - DVec3::Z).length() < 1e-12);
    for n in &normals {
        assert!(n.z > 0.0);
    }
}

#[test]
fn particle_normals_point_outward() {
    let p = particle_sphere(DVec3::ZERO, 1.0, 0.2).unwrap();
    let boundary = p.select_boundary();
    let positions = p.positions();
    let normals = p.surface_normals(&positions, &boundary);
    let outward = boundary
        .iter()
        .enumerate()
        .filter(|&(k, &i)| normals[k].dot(positions[i]) > 0.0)
        .count();
    assert!(outward as f64 >= 0.9 * boundary.len() as f64);

    let pole = positions
        .iter()
        .position(|x| (*x - DVec3::Z).length() < 1e-9)
        .unwrap();
    let k = boundary.iter().position(|&i| i == pole).unwrap();
    assert!((normals[k] - DVec3::Z).length() < 1e-9);
}

#[test]
fn particle_sphere_is_clipped() {
    let p = particle_sphere(DVec3::new(1.0, 0.0, 0.0), 0.5, 0.1).unwrap();
    for x in p.positions() {
        assert!((x - DVec3::new(1.0, 0.0, 0.0)).length() <= 0.5 + 1e-9);
    }
    assert!((p.spacing().mean - 0.1).abs() < 1e-9);
    assert!(particle_sphere(DVec3::ZERO, 1.0, 0.0).is_err());
}

#[test]
fn spatial_hash_queries() {
    let points: Vec<DVec3> = (0..10).map(|i| DVec3::new(i as f64, 0.0, 0.0)).collect();
    let hash = SpatialHash::build(&points, 1.0);
    let mut out = Vec::new();
    hash.query_radius(DVec3::new(4.2, 0.0, 0.0), 1.0, &mut out);
    assert_eq!(out, vec![4, 5]);

    let (j, d) = hash.nearest(DVec3::new(7.9, 0.1, 0.0), 2.0).unwrap();
    assert_eq!(j, 8);
    assert!(d < 0.2);
    assert!(hash.nearest(DVec3::new(50.0, 0.0, 0.0), 2.0).is_none());

    let lists = hash.neighbor_lists(1.01);
    assert_eq!(lists[0], vec![1]);
    assert_eq!(lists[5], vec![4, 6]);
}
