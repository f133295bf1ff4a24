// crates/sd_physics/src/numerics/root_finding.rs

//! 带括号的标量求根
//!
//! Brent 法：二分保证收敛，割线/逆二次插值加速。要求初始区间
//! 两端函数值异号，收敛到接近机器精度的区间宽度。

use thiserror::Error;

/// 求根错误
#[derive(Debug, Clone, Error)]
pub enum RootFindError {
    /// 区间端点函数值同号，无法夹逼
    #[error("区间 [{lower}, {upper}] 端点函数值同号 (f(lo)={f_lower:.3e}, f(hi)={f_upper:.3e})")]
    NotBracketed {
        lower: f64,
        upper: f64,
        f_lower: f64,
        f_upper: f64,
    },
}

/// Brent 求根配置
#[derive(Debug, Clone)]
pub struct BrentConfig {
    /// 绝对区间容差
    pub abs_tol: f64,
    /// 最大迭代次数
    pub max_iter: usize,
}

impl Default for BrentConfig {
    fn default() -> Self {
        Self {
            abs_tol: 1e-9,
            max_iter: 500,
        }
    }
}

/// Brent 求根结果
#[derive(Debug, Clone)]
pub struct BrentResult {
    /// 根
    pub root: f64,
    /// 根处函数值
    pub f_root: f64,
    /// 实际迭代次数
    pub iterations: usize,
}

/// 在 [lo, hi] 上求 f 的根（Brent 法）
///
/// # 参数
///
/// - `f`: 目标函数
/// - `lo`, `hi`: 括号区间，要求 f(lo)·f(hi) ≤ 0
/// - `config`: 容差与迭代上限
///
/// # 错误
///
/// 区间端点同号时返回 [`RootFindError::NotBracketed`]。
pub fn brent<F>(f: F, lo: f64, hi: f64, config: &BrentConfig) -> Result<BrentResult, RootFindError>
where
    F: Fn(f64) -> f64,
{
    let mut a = lo;
    let mut b = hi;
    let mut fa = f(a);
    let mut fb = f(b);

    if fa == 0.0 {
        return Ok(BrentResult {
            root: a,
            f_root: 0.0,
            iterations: 0,
        });
    }
    if fb == 0.0 {
        return Ok(BrentResult {
            root: b,
            f_root: 0.0,
            iterations: 0,
        });
    }
    if !fa.is_finite() || !fb.is_finite() || fa.signum() == fb.signum() {
        return Err(RootFindError::NotBracketed {
            lower: lo,
            upper: hi,
            f_lower: fa,
            f_upper: fb,
        });
    }

    let mut c = a;
    let mut fc = fa;
    let mut d = b - a;
    let mut e = d;

    for iter in 1..=config.max_iter {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * config.abs_tol;
        let xm = 0.5 * (c - b);

        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(BrentResult {
                root: b,
                f_root: fb,
                iterations: iter,
            });
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            // 尝试插值
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                // 割线
                (2.0 * xm * s, 1.0 - s)
            } else {
                // 逆二次插值
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                // 接受插值步
                e = d;
                d = p / q;
            } else {
                // 回退二分
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        if d.abs() > tol1 {
            b += d;
        } else {
            b += tol1.copysign(xm);
        }
        fb = f(b);
    }

    Ok(BrentResult {
        root: b,
        f_root: fb,
        iterations: config.max_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_root() {
        let result = brent(|x| x * x - 2.0, 0.0, 2.0, &BrentConfig::default()).unwrap();
        assert!((result.root - 2f64.sqrt()).abs() < 1e-8);
        assert!(result.f_root.abs() < 1e-7);
    }

    #[test]
    fn test_transcendental_root() {
        // cos(x) = x 的根约 0.7390851332
        let result = brent(|x| x.cos() - x, 0.0, 1.0, &BrentConfig::default()).unwrap();
        assert!((result.root - 0.739_085_133_2).abs() < 1e-8);
    }

    #[test]
    fn test_root_at_endpoint() {
        let result = brent(|x| x, 0.0, 1.0, &BrentConfig::default()).unwrap();
        assert_eq!(result.root, 0.0);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_not_bracketed() {
        let result = brent(|x| x * x + 1.0, -1.0, 1.0, &BrentConfig::default());
        assert!(matches!(result, Err(RootFindError::NotBracketed { .. })));
    }

    #[test]
    fn test_steep_function() {
        let result = brent(|x| (x - 0.123).powi(3), -10.0, 10.0, &BrentConfig::default()).unwrap();
        assert!((result.root - 0.123).abs() < 1e-3);
        assert!(result.f_root.abs() < 1e-8);
    }

    #[test]
    fn test_converges_quickly() {
        let result = brent(|x| x.tanh(), -5.0, 3.0, &BrentConfig::default()).unwrap();
        assert!(result.iterations < 100);
        assert!(result.root.abs() < 1e-8);
    }
}
