// crates/sd_physics/src/lib.rs

//! snowdrift 物理引擎
//!
//! 在二维非结构三角网格上逐时间步求解风吹雪输运与升华：
//! 跃移通量、垂直分层的悬移浓度场、悬浮粒子升华损失，以及由
//! 水平通量散度得到的单位面积净沉积/侵蚀质量。
//!
//! - 网格适配 (依赖 `sd_mesh`)
//! - 核心类型定义 (types)
//! - 字段存储 (fields)
//! - 模块抽象与注册表 (module)
//! - 大气辅助函数 (atmosphere)
//! - 数值内核 (numerics) - 稀疏线性代数、特殊函数、求根
//! - 风吹雪核心 (snow) - 逐时间步流水线
//!
//! # 每步流水线
//!
//! 几何缓存（仅初始化）→ 跃移 → 悬移装配 → 悬移求解 → 升华 →
//! 散度装配 → 散度求解 → 质量更新。阶段之间有 barrier，阶段内
//! 逐面并行。

pub mod atmosphere;
pub mod error;
pub mod fields;
pub mod module;
pub mod numerics;
pub mod snow;
pub mod types;

// 重导出常用类型
pub use error::{ConfigError, PhysicsError, PhysicsResult};
pub use fields::FieldStore;
pub use module::{Module, ModuleRegistry, ParamMap, ParamValue};
pub use numerics::linear_algebra::{
    BiCgStabSolver, ChowPatelIlu, ChowPatelIluConfig, CsrBuilder, CsrMatrix,
    IdentityPreconditioner, IterativeSolver, JacobiPreconditioner, ScalarPreconditioner,
    SolverConfig, SolverResult, SolverStatus,
};
pub use snow::module::BlowingSnow;
pub use types::{BlowingSnowConfig, PhysicalConstants};
