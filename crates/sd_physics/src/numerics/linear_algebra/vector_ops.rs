// crates/sd_physics/src/numerics/linear_algebra/vector_ops.rs

//! 向量运算（BLAS Level 1）
//!
//! 迭代求解器用到的点积、范数与 axpy。泛型标量 `S: Scalar`。

use sd_core::Scalar;

/// 点积 x·y
#[inline]
pub fn dot<S: Scalar>(x: &[S], y: &[S]) -> S {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y.iter()).map(|(&a, &b)| a * b).sum()
}

/// 二范数 ‖x‖₂
#[inline]
pub fn norm2<S: Scalar>(x: &[S]) -> S {
    dot(x, x).sqrt()
}

/// y ← y + a·x
#[inline]
pub fn axpy<S: Scalar>(a: S, x: &[S], y: &mut [S]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi += a * xi;
    }
}

/// y ← x
#[inline]
pub fn copy<S: Scalar>(x: &[S], y: &mut [S]) {
    debug_assert_eq!(x.len(), y.len());
    y.copy_from_slice(x);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot() {
        let x: Vec<f64> = vec![1.0, 2.0, 3.0];
        let y: Vec<f64> = vec![4.0, 5.0, 6.0];
        assert!((dot(&x, &y) - 32.0).abs() < 1e-14);
    }

    #[test]
    fn test_norm2() {
        let x: Vec<f64> = vec![3.0, 4.0];
        assert!((norm2(&x) - 5.0).abs() < 1e-14);
    }

    #[test]
    fn test_axpy() {
        let x = vec![1.0, 2.0];
        let mut y = vec![10.0, 20.0];
        axpy(2.0, &x, &mut y);
        assert_eq!(y, vec![12.0, 24.0]);
    }

    #[test]
    fn test_copy() {
        let x = vec![1.0, 2.0];
        let mut y = vec![0.0, 0.0];
        copy(&x, &mut y);
        assert_eq!(y, x);
    }
}
