use mesh_reconstruct::geometry::matrix::{SquareMatrix3, det, det2, eigen, inv, pivot, solve};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn max_abs_diff(a: &SquareMatrix3, b: &SquareMatrix3) -> f64 {
    (*a - *b).max_abs()
}

fn symmetric(v: [f64; 6]) -> SquareMatrix3 {
    SquareMatrix3::from_rows([[v[0], v[1], v[2]], [v[1], v[3], v[4]], [v[2], v[4], v[5]]])
}

/// Random matrix with a dominant diagonal, hence well conditioned.
fn dominant(rng: &mut SmallRng) -> SquareMatrix3 {
    let mut m = SquareMatrix3::zeros();
    for i in 0..3 {
        for j in 0..3 {
            m[(i, j)] = rng.gen_range(-10.0..10.0);
        }
        m[(i, i)] += if rng.gen_bool(0.5) { 40.0 } else { -40.0 };
    }
    m
}

/// Gaussian elimination without row exchanges, then back substitution.
fn eliminate_unpivoted(a: &SquareMatrix3, b: [f64; 3]) -> [f64; 3] {
    let mut m = *a.rows();
    let mut r = b;
    for k in 0..3 {
        for i in k + 1..3 {
            let l = m[i][k] / m[k][k];
            for j in k..3 {
                m[i][j] -= l * m[k][j];
            }
            r[i] -= l * r[k];
        }
    }
    let mut x = [0.0; 3];
    for i in (0..3).rev() {
        let s: f64 = (i + 1..3).map(|j| m[i][j] * x[j]).sum();
        x[i] = (r[i] - s) / m[i][i];
    }
    x
}

#[test]
fn det2_near_singular_matches_exact_reference() {
    let (a, d, c, b) = (1e8, 1.0 + 1e-8, 1.0, 1e8 + 1.0);
    // d - 1, its scaling by 1e8 and the final subtraction are all exact
    let exact = (d - 1.0) * 1e8 - 1.0;
    assert!(exact < 0.0 && exact > -1e-8);
    assert_eq!(det2(a, d, c, b), exact);
    assert_eq!(a * d - c * b, 0.0);
}

#[test]
fn det2_recovers_cancelled_low_bits() {
    let eps = 2f64.powi(-30);
    let a = 1.0 + eps;
    // a*a - 1 = 2^-29 + 2^-60, the last term is below one ulp of a*a
    assert_eq!(det2(a, a, 1.0, 1.0), 2f64.powi(-29) + 2f64.powi(-60));
    assert_ne!(a * a - 1.0, 2f64.powi(-29) + 2f64.powi(-60));
    // rounding error of the subtracted product is recovered as well
    assert_eq!(det2(1.0, 1.0, a, a), -(2f64.powi(-29) + 2f64.powi(-60)));
}

#[test]
fn det2_of_proportional_rows_is_exactly_zero() {
    let mut rng = SmallRng::seed_from_u64(7);
    for _ in 0..1000 {
        let a: f64 = rng.gen_range(-1e3..1e3);
        let b: f64 = rng.gen_range(-1e3..1e3);
        assert_eq!(det2(a, b, a, b), 0.0);
    }
}

#[test]
fn pivot_solve_matches_inverse_on_random_systems() {
    let mut rng = SmallRng::seed_from_u64(42);
    for _ in 0..500 {
        let a = dominant(&mut rng);
        let b = [
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
        ];
        let x = solve(&a, b);
        let y = inv(&a) * b;
        for k in 0..3 {
            assert!((x[k] - y[k]).abs() <= 1e-12 * (1.0 + y[k].abs()), "{x:?} vs {y:?}");
        }
        let r = a * x;
        for k in 0..3 {
            assert!((r[k] - b[k]).abs() <= 1e-11, "residual {r:?} vs {b:?}");
        }
    }
}

#[test]
fn pivot_solve_matches_unpivoted_elimination() {
    let mut rng = SmallRng::seed_from_u64(11);
    for _ in 0..500 {
        let a = dominant(&mut rng);
        let b = [
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
        ];
        let x = solve(&a, b);
        let y = eliminate_unpivoted(&a, b);
        for k in 0..3 {
            assert!((x[k] - y[k]).abs() <= 1e-12 * (1.0 + y[k].abs()), "{x:?} vs {y:?}");
        }
    }
}

#[test]
fn pivot_puts_largest_column_entry_first() {
    let mut rng = SmallRng::seed_from_u64(3);
    for _ in 0..200 {
        let before = dominant(&mut rng);
        let mut a = before;
        let record = pivot(&mut a);
        let largest = (0..3)
            .map(|i| before[(i, 0)].abs())
            .fold(0.0f64, f64::max);
        assert_eq!(a[(0, 0)].abs(), largest);
        assert_eq!(a[(1, 0)], 0.0);
        assert_eq!(a[(2, 0)], 0.0);
        assert!(a[(1, 1)].abs() >= a[(2, 1)].abs());
        assert_eq!(before.row(record.first), a.row(0));
    }
}

#[test]
fn singular_matrix_inverse_is_not_finite() {
    let a = SquareMatrix3::from_rows([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 1.0]]);
    assert_eq!(det(&a), 0.0);
    assert!(!inv(&a).is_finite());
}

proptest! {
    #[test]
    fn eigenvalues_sum_to_trace_and_annihilate(v in prop::array::uniform6(-10.0f64..10.0)) {
        let a = symmetric(v);
        let e = eigen(&a);
        let scale = 1.0 + a.max_abs();
        prop_assert!((e.sum() - a.trace()).abs() <= 1e-10 * scale);
        for &lambda in e.values().iter() {
            prop_assert!(lambda.is_finite());
            let d = det(&a.shift_diagonal(lambda));
            prop_assert!(d.abs() <= 1e-6 * scale.powi(3), "det(A - {lambda} I) = {d}");
        }
    }

    #[test]
    fn inverse_times_matrix_is_identity(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let a = dominant(&mut rng);
        let ai = inv(&a);
        prop_assert!(max_abs_diff(&(ai * a), &SquareMatrix3::identity()) <= 1e-12);
        prop_assert!(max_abs_diff(&(a * ai), &SquareMatrix3::identity()) <= 1e-12);
        prop_assert!((det(&ai) * det(&a) - 1.0).abs() <= 1e-12);
    }

    #[test]
    fn det_is_invariant_under_transpose(rows in prop::array::uniform3(prop::array::uniform3(-10.0f64..10.0))) {
        let a = SquareMatrix3::from_rows(rows);
        let (d, dt) = (det(&a), det(&a.transpose()));
        prop_assert!((d - dt).abs() <= 1e-10 * (1.0 + d.abs()));
    }
}
