// crates/sd_physics/src/numerics/mod.rs

//! 数值内核
//!
//! - [`linear_algebra`]: 稀疏矩阵与迭代求解器
//! - [`special`]: 特殊函数（Lambert W 下分支）
//! - [`root_finding`]: 带括号的标量求根（Brent 法）

pub mod linear_algebra;
pub mod root_finding;
pub mod special;
