//! Low-level quaternion functions.
//!
//! Quaternions are `[f64; 4]` in `(x, y, z, w)` order with `w` the scalar
//! part. Everything here is allocation-free, panic-free and free of dynamic
//! dispatch, so it inlines into any launch body.

/// Scales `q` to unit Euclidean norm.
///
/// Precondition: `q` has non-zero norm. A zero quaternion yields NaNs.
#[inline(always)]
pub fn qa_normalize(q: &mut [f64; 4]) {
    let norm: f64 = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    let inv: f64 = 1.0 / norm;
    q.iter_mut().for_each(|x| *x *= inv);
}

/// Normalizes each of the `q.len() / 4` quaternions stored in `q`.
#[inline]
pub fn qa_normalize_inplace(q: &mut [f64]) {
    debug_assert!(q.len().is_multiple_of(4));
    q.chunks_exact_mut(4).for_each(|chunk| {
        let norm: f64 = (chunk[0] * chunk[0] + chunk[1] * chunk[1] + chunk[2] * chunk[2] + chunk[3] * chunk[3]).sqrt();
        let inv: f64 = 1.0 / norm;
        chunk.iter_mut().for_each(|x| *x *= inv);
    });
}

/// Hamilton product `r = p * q`.
#[inline(always)]
pub fn qa_mult(p: &[f64; 4], q: &[f64; 4], r: &mut [f64; 4]) {
    r[0] = p[0] * q[3] + p[1] * q[2] - p[2] * q[1] + p[3] * q[0];
    r[1] = -p[0] * q[2] + p[1] * q[3] + p[2] * q[0] + p[3] * q[1];
    r[2] = p[0] * q[1] - p[1] * q[0] + p[2] * q[3] + p[3] * q[2];
    r[3] = -p[0] * q[0] - p[1] * q[1] - p[2] * q[2] + p[3] * q[3];
}

/// Rotates `v_in` by the unit quaternion `q`.
///
/// Precondition: `q` has unit norm; the result is meaningless otherwise.
#[inline(always)]
pub fn qa_rotate(q: &[f64; 4], v_in: &[f64; 3], v_out: &mut [f64; 3]) {
    let xw: f64 = q[3] * q[0];
    let yw: f64 = q[3] * q[1];
    let zw: f64 = q[3] * q[2];
    let x2: f64 = -q[0] * q[0];
    let xy: f64 = q[0] * q[1];
    let xz: f64 = q[0] * q[2];
    let y2: f64 = -q[1] * q[1];
    let yz: f64 = q[1] * q[2];
    let z2: f64 = -q[2] * q[2];

    v_out[0] = 2.0 * ((y2 + z2) * v_in[0] + (xy - zw) * v_in[1] + (yw + xz) * v_in[2]) + v_in[0];
    v_out[1] = 2.0 * ((zw + xy) * v_in[0] + (x2 + z2) * v_in[1] + (yz - xw) * v_in[2]) + v_in[1];
    v_out[2] = 2.0 * ((xz - yw) * v_in[0] + (xw + yz) * v_in[1] + (x2 + y2) * v_in[2]) + v_in[2];
}

/// Conjugate of a unit quaternion, i.e. its inverse.
#[inline(always)]
pub fn qa_inv(q: &[f64; 4], r: &mut [f64; 4]) {
    r[0] = -q[0];
    r[1] = -q[1];
    r[2] = -q[2];
    r[3] = q[3];
}

#[cfg(test)]
mod tests {
    use rand_distr::{Distribution, Normal};

    use super::*;
    use crate::{QUAT_IDENTITY, source::Source};

    fn random_unit(source: &mut Source) -> [f64; 4] {
        let normal: Normal<f64> = Normal::new(0.0, 1.0).unwrap();
        let mut q: [f64; 4] = [0.0; 4];
        q.iter_mut().for_each(|x| *x = normal.sample(source));
        qa_normalize(&mut q);
        q
    }

    fn norm3(v: &[f64; 3]) -> f64 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        a.iter()
            .zip(b)
            .for_each(|(x, y)| assert!((x - y).abs() <= tol, "{a:?} != {b:?}"));
    }

    #[test]
    fn normalize_unit_norm() {
        let mut q: [f64; 4] = [1.0, 2.0, 3.0, 4.0];
        qa_normalize(&mut q);
        let n: f64 = q.iter().map(|x| x * x).sum::<f64>();
        assert!((n - 1.0).abs() < 1e-15);

        let mut qs: Vec<f64> = vec![0.0, 0.0, 0.0, 2.0, 3.0, 0.0, 4.0, 0.0];
        qa_normalize_inplace(&mut qs);
        assert_close(&qs, &[0.0, 0.0, 0.0, 1.0, 0.6, 0.0, 0.8, 0.0], 1e-15);
    }

    #[test]
    fn mult_identity() {
        let mut source: Source = Source::new([1u8; 32]);
        let q: [f64; 4] = random_unit(&mut source);
        let mut r: [f64; 4] = [0.0; 4];
        qa_mult(&QUAT_IDENTITY, &q, &mut r);
        assert_eq!(r, q);
        qa_mult(&q, &QUAT_IDENTITY, &mut r);
        assert_eq!(r, q);
    }

    #[test]
    fn mult_associative_not_commutative() {
        let mut source: Source = Source::new([2u8; 32]);
        let mut any_noncommuting: bool = false;
        for _ in 0..100 {
            let a: [f64; 4] = random_unit(&mut source);
            let b: [f64; 4] = random_unit(&mut source);
            let c: [f64; 4] = random_unit(&mut source);

            let mut ab: [f64; 4] = [0.0; 4];
            let mut bc: [f64; 4] = [0.0; 4];
            let mut ab_c: [f64; 4] = [0.0; 4];
            let mut a_bc: [f64; 4] = [0.0; 4];
            qa_mult(&a, &b, &mut ab);
            qa_mult(&b, &c, &mut bc);
            qa_mult(&ab, &c, &mut ab_c);
            qa_mult(&a, &bc, &mut a_bc);
            assert_close(&ab_c, &a_bc, 1e-14);

            let mut ba: [f64; 4] = [0.0; 4];
            qa_mult(&b, &a, &mut ba);
            if ab.iter().zip(&ba).any(|(x, y)| (x - y).abs() > 1e-6) {
                any_noncommuting = true;
            }
        }
        assert!(any_noncommuting);
    }

    #[test]
    fn mult_known_product() {
        // i * j = k
        let i: [f64; 4] = [1.0, 0.0, 0.0, 0.0];
        let j: [f64; 4] = [0.0, 1.0, 0.0, 0.0];
        let mut r: [f64; 4] = [0.0; 4];
        qa_mult(&i, &j, &mut r);
        assert_eq!(r, [0.0, 0.0, 1.0, 0.0]);
        qa_mult(&j, &i, &mut r);
        assert_eq!(r, [0.0, 0.0, -1.0, 0.0]);
    }

    #[test]
    fn rotate_preserves_norm() {
        let mut source: Source = Source::new([3u8; 32]);
        for _ in 0..100 {
            let q: [f64; 4] = random_unit(&mut source);
            let v: [f64; 3] = [
                source.next_f64(-10.0, 10.0),
                source.next_f64(-10.0, 10.0),
                source.next_f64(-10.0, 10.0),
            ];
            let mut out: [f64; 3] = [0.0; 3];
            qa_rotate(&q, &v, &mut out);
            assert!((norm3(&out) - norm3(&v)).abs() <= 1e-12 * norm3(&v).max(1.0));
        }
    }

    #[test]
    fn rotate_quarter_turn_about_z() {
        let h: f64 = std::f64::consts::FRAC_1_SQRT_2;
        let q: [f64; 4] = [0.0, 0.0, h, h];
        let mut out: [f64; 3] = [0.0; 3];
        qa_rotate(&q, &[1.0, 0.0, 0.0], &mut out);
        assert_close(&out, &[0.0, 1.0, 0.0], 1e-15);
    }

    #[test]
    fn rotate_matches_conjugation() {
        let mut source: Source = Source::new([4u8; 32]);
        let q: [f64; 4] = random_unit(&mut source);
        let v: [f64; 3] = [0.3, -1.2, 2.5];

        let mut qinv: [f64; 4] = [0.0; 4];
        qa_inv(&q, &mut qinv);
        let vq: [f64; 4] = [v[0], v[1], v[2], 0.0];
        let mut tmp: [f64; 4] = [0.0; 4];
        let mut res: [f64; 4] = [0.0; 4];
        qa_mult(&q, &vq, &mut tmp);
        qa_mult(&tmp, &qinv, &mut res);

        let mut out: [f64; 3] = [0.0; 3];
        qa_rotate(&q, &v, &mut out);
        assert_close(&out, &res[..3], 1e-12);
        assert!(res[3].abs() < 1e-12);
    }
}
