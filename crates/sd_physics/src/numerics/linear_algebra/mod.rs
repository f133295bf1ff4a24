// crates/sd_physics/src/numerics/linear_algebra/mod.rs

//! 稀疏线性代数
//!
//! 隐式求解所需的稀疏矩阵与迭代求解器：
//!
//! - [`csr`]: 压缩稀疏行（CSR）矩阵与构建器
//! - [`vector_ops`]: 向量运算（BLAS Level 1）
//! - [`preconditioner`]: 预条件器（Identity / Jacobi / Chow–Patel ILU）
//! - [`solver`]: BiCGStab 迭代求解器
//!
//! # 使用示例
//!
//! ```
//! use sd_physics::numerics::linear_algebra::{
//!     BiCgStabSolver, CsrBuilder, IterativeSolver, JacobiPreconditioner, SolverConfig,
//! };
//!
//! let mut builder = CsrBuilder::<f64>::new_square(2);
//! builder.set(0, 0, 4.0);
//! builder.set(0, 1, -1.0);
//! builder.set(1, 0, -1.0);
//! builder.set(1, 1, 4.0);
//! let matrix = builder.build();
//!
//! let b = vec![3.0, 3.0];
//! let mut x = vec![0.0; 2];
//! let precond = JacobiPreconditioner::from_matrix(&matrix);
//! let mut solver = BiCgStabSolver::new(SolverConfig::default());
//! let result = solver.solve(&matrix, &b, &mut x, &precond);
//! assert!(result.is_converged());
//! ```
//!
//! # 设计原则
//!
//! 1. **行所有权**: 构建器按行独立存储，装配阶段可按行并行而无须加锁
//! 2. **模式/值分离**: [`csr::CsrPattern`] 允许复用稀疏结构
//! 3. **数值稳定**: 求解器带 breakdown 与发散监控

pub mod csr;
pub mod preconditioner;
pub mod solver;
pub mod vector_ops;

pub use csr::{CsrBuilder, CsrMatrix, CsrPattern};
pub use preconditioner::{
    ChowPatelIlu, ChowPatelIluConfig, IdentityPreconditioner, JacobiPreconditioner,
    ScalarPreconditioner,
};
pub use solver::{BiCgStabSolver, IterativeSolver, SolverConfig, SolverResult, SolverStatus};
pub use vector_ops::{axpy, copy, dot, norm2};
