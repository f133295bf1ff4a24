// crates/sd_physics/src/numerics/special.rs

//! 特殊函数
//!
//! 目前只有 Lambert W 函数的下分支 W₋₁，用于把参考高度风速
//! 反演为摩擦速度。

/// Lambert W 函数下分支 W₋₁(x)
///
/// 求解 w·e^w = x 在 w ≤ -1 上的根，定义域 x ∈ [-1/e, 0)。
/// 初值在分支点附近用级数展开，在 0⁻ 附近用对数渐近式，
/// 随后 Halley 迭代收敛到机器精度。
///
/// 入参越出定义域时按端点钳制：x ≥ 0 视为 0⁻（返回 -∞ 方向
/// 由调用方避免），x < -1/e 钳制为 -1/e（返回 -1）。
pub fn lambert_w_m1(x: f64) -> f64 {
    let branch_point = -1.0 / std::f64::consts::E;
    if x <= branch_point {
        return -1.0;
    }
    debug_assert!(x < 0.0, "W₋₁ 定义域为 [-1/e, 0)");

    let mut w = if x < -0.25 {
        // 分支点级数: p = -sqrt(2(1 + e·x)), W ≈ -1 + p - p²/3 + 11p³/72
        let p = -(2.0 * (1.0 + std::f64::consts::E * x)).sqrt();
        -1.0 + p - p * p / 3.0 + 11.0 * p * p * p / 72.0
    } else {
        // 渐近式: L1 = ln(-x), L2 = ln(-L1), W ≈ L1 - L2 + L2/L1
        let l1 = (-x).ln();
        let l2 = (-l1).ln();
        l1 - l2 + l2 / l1
    };

    // Halley 迭代
    for _ in 0..32 {
        let ew = w.exp();
        let f = w * ew - x;
        let wp1 = w + 1.0;
        let denom = ew * wp1 - (w + 2.0) * f / (2.0 * wp1);
        let dw = f / denom;
        w -= dw;
        if dw.abs() < 1e-14 * (1.0 + w.abs()) {
            break;
        }
    }
    w
}
