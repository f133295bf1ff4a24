// crates/sd_physics/src/error.rs
//! 物理引擎错误类型
//!
//! 两层划分：
//!
//! - [`ConfigError`]: 初始化期可发现的配置问题（参数非法、模块未注册）
//! - [`PhysicsError`]: 时间步内的致命数值失败（求解不收敛、求根无括号）
//!
//! 按策略，NaN 的 swe 与 NaN 的散度解属于物理意义明确的缺失输入，
//! 在现场静默归零，不进入错误通道；其余 NaN 驱动值到达求解器后以
//! 求解失败的形式上浮。

use crate::numerics::linear_algebra::SolverStatus;
use crate::numerics::root_finding::RootFindError;
use thiserror::Error;

/// 物理引擎结果类型
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// 配置错误
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// 参数取值非法
    #[error("配置参数 {name} 非法: {constraint}")]
    InvalidParameter {
        name: &'static str,
        constraint: String,
    },

    /// 参数类型不符
    #[error("配置参数 {name} 类型错误: 期望 {expected}")]
    WrongType { name: String, expected: &'static str },

    /// 模块未注册
    #[error("未注册的模块: {0}")]
    UnknownModule(String),
}

/// 时间步内致命失败
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 线性求解失败
    #[error(
        "{system} 线性求解失败: {status:?}, {iterations} 次迭代后相对残差 {relative_residual:.3e}"
    )]
    SolverFailed {
        system: &'static str,
        status: SolverStatus,
        iterations: usize,
        relative_residual: f64,
    },

    /// 粒子温度求根失败
    #[error("粒子温度求根失败: {0}")]
    RootNotBracketed(#[from] RootFindError),

    /// 缺少驱动字段
    #[error("缺少驱动字段: {0}")]
    MissingField(String),

    /// 字段长度与网格不一致
    #[error("字段 {name} 长度 {actual} 与网格单元数 {expected} 不一致")]
    FieldSizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}
