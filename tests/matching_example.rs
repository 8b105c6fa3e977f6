//! Two degree-2 patches glued along a reflected edge (2D) or face (3D).

use patch_glue::prelude::*;

const KNOTS: [f64; 7] = [0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];

fn quadratic(npa: usize) -> BSpline {
    BSpline::new(&vec![2; npa], vec![KNOTS.to_vec(); npa]).unwrap()
}

fn search(ctrl: &[NdArray<f64>], splines: &[BSpline]) -> BorderCorrespondences {
    BorderCorrespondences::from_patches(ctrl, splines, &MatchConfig::default()).unwrap()
}

fn geometric(ctrl: &[NdArray<f64>]) -> MultiPatchConnectivity {
    MultiPatchConnectivity::from_patch_geometry(ctrl, DEFAULT_COINCIDENCE_EPSILON).unwrap()
}

/// Unit square; neighbour on `[1, 2] x [0, 1]` with swapped, reversed axes.
fn squares() -> Vec<NdArray<f64>> {
    let ctrl1 =
        NdArray::from_shape_fn(vec![2, 4, 4], |i| [i[1] as f64 / 3.0, i[2] as f64 / 3.0][i[0]]);
    let ctrl2 = NdArray::from_shape_fn(vec![2, 4, 4], |i| {
        [2.0 - i[2] as f64 / 3.0, 1.0 - i[1] as f64 / 3.0][i[0]]
    });
    vec![ctrl1, ctrl2]
}

/// Unit cube; neighbour on `[0, 1] x [1, 2] x [0, 1]` with permuted axes.
fn cubes() -> Vec<NdArray<f64>> {
    let ctrl1 = NdArray::from_shape_fn(vec![3, 4, 4, 4], |i| {
        [i[1] as f64, i[2] as f64, i[3] as f64][i[0]] / 3.0
    });
    let ctrl2 = NdArray::from_shape_fn(vec![3, 4, 4, 4], |i| {
        let (a, b, c) = (i[1] as f64, i[2] as f64, i[3] as f64);
        [1.0 - a / 3.0, 2.0 - c / 3.0, b / 3.0][i[0]]
    });
    vec![ctrl1, ctrl2]
}

fn max_abs_diff(a: &NdArray<f64>, b: &NdArray<f64>) -> f64 {
    assert_eq!(a.shape(), b.shape());
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

/// Control point of `ctrl` at the grid corner nearest to unit coordinates `u`.
fn corner(ctrl: &NdArray<f64>, u: &[f64]) -> Vec<f64> {
    let nph = ctrl.shape()[0];
    (0..nph)
        .map(|d| {
            let index: Vec<usize> = std::iter::once(d)
                .chain(
                    u.iter()
                        .zip(&ctrl.shape()[1..])
                        .map(|(&x, &n)| if x > 0.5 { n - 1 } else { 0 }),
                )
                .collect();
            ctrl[&index[..]]
        })
        .collect()
}

/// Map every corner of `patch1`'s matched face through the operator and
/// compare the control points at both ends.
fn check_corners(found: &BorderCorrespondences, ctrl: &[NdArray<f64>], splines: &[BSpline]) {
    let npa = found.npa();
    let r = &found.records()[0];
    let op = found.operator(&splines[0].spans(), &splines[1].spans(), 0).unwrap();
    let face = r.face_axes1(npa);
    for m in 0..(1usize << face.len()) {
        let mut xi1 = vec![r.side1.unit_coordinate(); npa];
        for (bit, &a) in face.iter().enumerate() {
            xi1[a] = ((m >> bit) & 1) as f64;
        }
        let xi2 = op.apply(&xi1).unwrap();
        for x in &xi2 {
            assert!(x.abs() < 1e-12 || (x - 1.0).abs() < 1e-12, "corner {xi2:?} off the unit cube");
        }
        assert_eq!(xi2[r.axis2], r.side2.unit_coordinate());
        let (p1, p2) = (corner(&ctrl[0], &xi1), corner(&ctrl[1], &xi2));
        for (a, b) in p1.iter().zip(&p2) {
            assert!((a - b).abs() < 1e-10, "{p1:?} != {p2:?}");
        }
    }
}

#[test]
fn reflected_edge_is_discovered() {
    let ctrl = squares();
    let splines = vec![quadratic(2), quadratic(2)];
    let found = search(&ctrl, &splines);
    assert_eq!(found.len(), 1);
    let r = &found.records()[0];
    assert_eq!((r.axis1, r.side1, r.axis2, r.side2), (0, Side::End, 1, Side::End));
    assert_eq!(r.alignment.transpose, vec![0]);
    assert_eq!(r.alignment.flip, vec![true]);

    let pairs = found.border_pairs(&ctrl, 0).unwrap();
    assert!(max_abs_diff(&pairs[0].0, &pairs[0].1) < 1e-10);
    check_corners(&found, &ctrl, &splines);
}

#[test]
fn permuted_face_is_discovered() {
    let ctrl = cubes();
    let splines = vec![quadratic(3), quadratic(3)];
    let found = search(&ctrl, &splines);
    assert_eq!(found.len(), 1);
    let r = &found.records()[0];
    assert_eq!((r.axis1, r.side1, r.axis2, r.side2), (1, Side::End, 2, Side::End));
    assert_eq!(r.alignment.transpose, vec![1, 0]);
    assert_eq!(r.alignment.flip, vec![false, true]);

    let pairs = found.border_pairs(&ctrl, 0).unwrap();
    assert_eq!(pairs[0].0.shape(), &[3, 4, 4]);
    assert!(max_abs_diff(&pairs[0].0, &pairs[0].1) < 1e-10);
    // one slice inside, the grids no longer coincide
    let inner = found.border_pairs(&ctrl, 1).unwrap();
    assert!(max_abs_diff(&inner[0].0, &inner[0].1) > 0.1);
    check_corners(&found, &ctrl, &splines);
}

#[test]
fn operator_matches_hand_derived_map() {
    let ctrl = cubes();
    let splines = vec![quadratic(3), quadratic(3)];
    let found = search(&ctrl, &splines);
    let op = found.operator(&splines[0].spans(), &splines[1].spans(), 0).unwrap();
    // ξ2 = (1 - ξ1_0, ξ1_2, 2 - ξ1_1)
    let xi2 = op.apply(&[0.25, 0.9, 0.6]).unwrap();
    let expected = [0.75, 0.6, 1.1];
    for (x, e) in xi2.iter().zip(expected) {
        assert!((x - e).abs() < 1e-14);
    }
}

#[test]
fn pair_connectivity_matches_geometric_search() {
    for ctrl in [squares(), cubes()] {
        let npa = ctrl[0].ndim() - 1;
        let splines = vec![quadratic(npa), quadratic(npa)];
        let found = search(&ctrl, &splines);
        let shapes: Vec<Vec<usize>> = ctrl.iter().map(|c| c.shape()[1..].to_vec()).collect();
        let combinatorial = found.connectivity(shapes).unwrap();
        let geometric = geometric(&ctrl);
        assert_eq!(combinatorial.nb_unique_nodes(), geometric.nb_unique_nodes());
        let (a, b) = (combinatorial.unique_nodes_inds(), geometric.unique_nodes_inds());
        for i in 0..a.len() {
            for j in 0..a.len() {
                assert_eq!(a[i] == a[j], b[i] == b[j], "nodes {i} and {j}");
            }
        }
    }
}

#[test]
fn aligned_border_descriptors_agree() {
    let ctrl = cubes();
    let splines = vec![quadratic(3), quadratic(3)];
    let found = search(&ctrl, &splines);
    let pairs = found.border_descriptor_pairs(&splines).unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].0, pairs[0].1);
    assert_eq!(pairs[0].0.grid_shape(), vec![4, 4]);
}

/// Unit cube, and its neighbour on `[-1, 0] x [0, 1] x [0, 1]` parameterized
/// as `(-ξ0, 1 - ξ1, ξ2)`, so both are glued through their `Start` faces.
fn mirrored_cubes() -> Vec<NdArray<f64>> {
    let ctrl1 = NdArray::from_shape_fn(vec![3, 2, 2, 2], |i| [i[1], i[2], i[3]][i[0]] as f64);
    let ctrl2 = NdArray::from_shape_fn(vec![3, 2, 2, 2], |i| {
        let (a, b, c) = (i[1] as f64, i[2] as f64, i[3] as f64);
        [-a, 1.0 - b, c][i[0]]
    });
    vec![ctrl1, ctrl2]
}

#[test]
fn start_faces_glue_through_reversed_face_axes() {
    let ctrl = mirrored_cubes();
    let trilinear = BSpline::new(&[1, 1, 1], vec![vec![0.0, 0.0, 1.0, 1.0]; 3]).unwrap();
    let splines = vec![trilinear.clone(), trilinear];
    let found = search(&ctrl, &splines);
    assert_eq!(found.len(), 1);
    let r = &found.records()[0];
    assert_eq!((r.axis1, r.side1, r.axis2, r.side2), (0, Side::Start, 0, Side::Start));
    assert_eq!(r.face_axes1(3), vec![2, 1]);
    assert_eq!(r.alignment.transpose, vec![0, 1]);
    assert_eq!(r.alignment.flip, vec![false, true]);

    // the trilinear geometry is exact: patch 2 at op(ξ) is patch 1 at ξ
    let phys2 = |xi: &[f64]| [-xi[0], 1.0 - xi[1], xi[2]];
    let op = found.operator(&splines[0].spans(), &splines[1].spans(), 0).unwrap();
    for xi in [[0.0, 0.3, 0.8], [0.0, 1.0, 0.0], [0.4, 0.25, 0.6], [1.0, 0.5, 1.0]] {
        let mapped = op.apply(&xi).unwrap();
        let p = phys2(&mapped);
        for (a, b) in p.iter().zip(&xi) {
            assert!((a - b).abs() < 1e-14, "{xi:?} -> {p:?}");
        }
    }
    check_corners(&found, &ctrl, &splines);

    let shapes = vec![vec![2, 2, 2]; 2];
    let combinatorial = found.connectivity(shapes).unwrap();
    assert_eq!(combinatorial, geometric(&ctrl));
}
