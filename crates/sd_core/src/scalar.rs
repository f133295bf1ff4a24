// crates/sd_core/src/scalar.rs

//! 统一标量类型抽象
//!
//! 数值内核（稀疏线性代数、迭代求解器）通过本 trait 在 f32 与 f64
//! 之间零成本切换；物理公式层固定使用 f64。
//!
//! # 设计原则
//!
//! 1. **单一职责**: 仅解决精度切换，不定义物理常量
//! 2. **零成本抽象**: `#[inline]` + 编译期单态化
//! 3. **密封 trait**: 只有 f32 和 f64 可以实现
//!
//! # 使用示例
//!
//! ```
//! use sd_core::Scalar;
//!
//! fn weighted_sum<S: Scalar>(a: S, b: S) -> S {
//!     a * S::HALF + b * S::HALF
//! }
//!
//! assert!((weighted_sum(1.0f64, 3.0f64) - 2.0).abs() < 1e-14);
//! ```

use std::fmt::{Debug, Display};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{Float, FromPrimitive, NumAssign};

// 密封，禁止外部实现
mod private {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// 统一标量类型约束
///
/// 数值内核的泛型边界。只允许作为泛型约束使用（`<S: Scalar>`），
/// 禁止作为 trait 对象。
pub trait Scalar:
    private::Sealed
    + Float
    + FromPrimitive
    + NumAssign
    + Copy
    + Debug
    + Display
    + Send
    + Sync
    + Sum
    + Default
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    /// 零值
    const ZERO: Self;

    /// 单位值
    const ONE: Self;

    /// 一半
    const HALF: Self;

    /// 机器精度
    const EPSILON: Self;

    /// 最小正规格化值
    const MIN_POSITIVE: Self;

    /// 最大有限值
    const MAX: Self;

    /// 从配置层 f64 转换到运行层 S（f32 目标可能丢失精度）
    fn from_f64_lossless(v: f64) -> Self;

    /// 转换回 f64（用于输出或跨模块接口）
    fn to_f64(self) -> f64;

    /// 安全除法，分母过小时返回 fallback
    #[inline]
    fn safe_div(self, rhs: Self, fallback: Self) -> Self {
        if rhs.abs() < Self::MIN_POSITIVE {
            fallback
        } else {
            self / rhs
        }
    }

    /// 钳制到非负
    #[inline]
    fn clamp_positive(self) -> Self {
        if self < Self::ZERO {
            Self::ZERO
        } else {
            self
        }
    }
}

impl Scalar for f32 {
    const ZERO: f32 = 0.0;
    const ONE: f32 = 1.0;
    const HALF: f32 = 0.5;
    const EPSILON: f32 = f32::EPSILON;
    const MIN_POSITIVE: f32 = f32::MIN_POSITIVE;
    const MAX: f32 = f32::MAX;

    #[inline]
    fn from_f64_lossless(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Scalar for f64 {
    const ZERO: f64 = 0.0;
    const ONE: f64 = 1.0;
    const HALF: f64 = 0.5;
    const EPSILON: f64 = f64::EPSILON;
    const MIN_POSITIVE: f64 = f64::MIN_POSITIVE;
    const MAX: f64 = f64::MAX;

    #[inline]
    fn from_f64_lossless(v: f64) -> Self {
        v
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}
