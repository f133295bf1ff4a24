// crates/sd_core/src/lib.rs

//! snowdrift 基础层
//!
//! 提供整个工作区共享的最底层构件，不依赖任何业务领域概念：
//!
//! - [`scalar`]: 统一标量抽象（编译期 f32/f64 切换）
//! - [`tolerance`]: 共享数值容差常量
//!
//! 本层禁止引入网格、物理场等高层类型。

pub mod scalar;
pub mod tolerance;

pub use scalar::Scalar;
