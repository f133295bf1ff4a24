// crates/sd_physics/src/numerics/linear_algebra/solver.rs
//! 迭代线性求解器
//!
//! 求解稀疏线性系统 Ax = b。输运装配出的矩阵是非对称的
//! （迎风离散），因此使用 BiCGStab。
//!
//! # 使用示例
//!
//! ```ignore
//! let precond = ChowPatelIlu::from_matrix(&matrix, &ChowPatelIluConfig::default());
//! let mut solver = BiCgStabSolver::new(SolverConfig::default());
//! let result = solver.solve(&matrix, &b, &mut x, &precond);
//! assert!(result.is_converged());
//! ```

use super::csr::CsrMatrix;
use super::preconditioner::ScalarPreconditioner;
use super::vector_ops::{axpy, copy, dot, norm2};
use sd_core::tolerance::{DIVERGENCE_FACTOR, SOLVER_ATOL, SOLVER_MAX_ITER, SOLVER_RTOL, STAGNATION_EPS};
use sd_core::Scalar;
use serde::{Deserialize, Serialize};

/// 求解器配置（配置层，保持 f64）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 相对收敛容差
    pub rtol: f64,
    /// 绝对收敛容差
    pub atol: f64,
    /// 最大迭代次数
    pub max_iter: usize,
    /// 是否逐迭代打印残差
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rtol: SOLVER_RTOL,
            atol: SOLVER_ATOL,
            max_iter: SOLVER_MAX_ITER,
            verbose: false,
        }
    }
}

impl SolverConfig {
    /// 创建求解器配置
    pub fn new(rtol: f64, max_iter: usize) -> Self {
        Self {
            rtol,
            max_iter,
            ..Default::default()
        }
    }
}

/// 求解器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数
    MaxIterationsReached,
    /// 发散
    Diverged,
    /// 停滞（breakdown）
    Stagnated,
}

/// 求解器结果
#[derive(Debug, Clone)]
pub struct SolverResult<S: Scalar> {
    /// 求解状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数
    pub residual_norm: S,
    /// 初始残差范数
    pub initial_residual_norm: S,
    /// 相对残差
    pub relative_residual: S,
}

impl<S: Scalar> SolverResult<S> {
    /// 是否成功收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

/// 迭代求解器 trait
pub trait IterativeSolver<S: Scalar> {
    /// 求解 Ax = b
    ///
    /// # 参数
    ///
    /// - `matrix`: 系数矩阵
    /// - `b`: 右端项
    /// - `x`: 解向量（输入初值，输出解）
    /// - `precond`: 预条件器
    fn solve<P: ScalarPreconditioner<S>>(
        &mut self,
        matrix: &CsrMatrix<S>,
        b: &[S],
        x: &mut [S],
        precond: &P,
    ) -> SolverResult<S>;

    /// 求解器名称
    fn name(&self) -> &'static str;
}

/// BiCGStab 求解器
///
/// 双共轭梯度稳定法，适用于非对称矩阵。工作向量在求解器内
/// 复用，多次调用之间不重复分配。
pub struct BiCgStabSolver<S: Scalar> {
    config: SolverConfig,
    // 工作向量
    r: Vec<S>,
    r0: Vec<S>,
    p: Vec<S>,
    v: Vec<S>,
    s: Vec<S>,
    t: Vec<S>,
    z: Vec<S>,
}

impl<S: Scalar> BiCgStabSolver<S> {
    /// 创建求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            r0: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            z: Vec::new(),
        }
    }

    /// 确保工作向量大小正确
    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            self.r = vec![S::ZERO; n];
            self.r0 = vec![S::ZERO; n];
            self.p = vec![S::ZERO; n];
            self.v = vec![S::ZERO; n];
            self.s = vec![S::ZERO; n];
            self.t = vec![S::ZERO; n];
            self.z = vec![S::ZERO; n];
        }
    }

    fn finish(&self, status: SolverStatus, iterations: usize, initial_norm: S) -> SolverResult<S> {
        let res = norm2(&self.r);
        SolverResult {
            status,
            iterations,
            residual_norm: res,
            initial_residual_norm: initial_norm,
            relative_residual: if initial_norm > S::ZERO {
                res / initial_norm
            } else {
                S::ZERO
            },
        }
    }
}

impl<S: Scalar> IterativeSolver<S> for BiCgStabSolver<S> {
    fn solve<P: ScalarPreconditioner<S>>(
        &mut self,
        matrix: &CsrMatrix<S>,
        b: &[S],
        x: &mut [S],
        precond: &P,
    ) -> SolverResult<S> {
        let n = b.len();
        self.ensure_workspace(n);
        let rtol = S::from_f64_lossless(self.config.rtol);
        let atol = S::from_f64_lossless(self.config.atol);
        let stag_tol = S::from_f64_lossless(STAGNATION_EPS);
        let div_factor = S::from_f64_lossless(DIVERGENCE_FACTOR);

        // r = b - A·x
        matrix.mul_vec(x, &mut self.r);
        for i in 0..n {
            self.r[i] = b[i] - self.r[i];
        }

        let initial_norm = norm2(&self.r);
        if initial_norm < atol {
            return SolverResult {
                status: SolverStatus::Converged,
                iterations: 0,
                residual_norm: initial_norm,
                initial_residual_norm: initial_norm,
                relative_residual: S::ZERO,
            };
        }

        // 影子残差固定为初始残差
        copy(&self.r, &mut self.r0);

        let mut rho_old = S::ONE;
        let mut alpha = S::ONE;
        let mut omega = S::ONE;

        self.v.fill(S::ZERO);
        self.p.fill(S::ZERO);

        for iter in 0..self.config.max_iter {
            let rho = dot(&self.r0, &self.r);

            // rho breakdown
            if rho.abs() < stag_tol {
                if iter == 0 {
                    // 初始残差与影子残差正交: 视为已收敛
                    return self.finish(SolverStatus::Converged, 0, initial_norm);
                }
                return self.finish(SolverStatus::Stagnated, iter, initial_norm);
            }

            // 首次迭代 p = r
            let beta = if iter == 0 {
                S::ZERO
            } else {
                (rho / rho_old) * (alpha / omega)
            };
            rho_old = rho;

            // p = r + beta·(p − omega·v)
            for i in 0..n {
                self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
            }

            // v = A·M⁻¹·p
            precond.apply(&self.p, &mut self.z);
            matrix.mul_vec(&self.z, &mut self.v);

            let r0v = dot(&self.r0, &self.v);
            if r0v.abs() < stag_tol {
                return self.finish(SolverStatus::Stagnated, iter, initial_norm);
            }
            alpha = rho / r0v;

            // s = r − alpha·v
            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }

            let s_norm = norm2(&self.s);
            if s_norm < atol {
                // x += alpha·M⁻¹p, 提前收敛
                precond.apply(&self.p, &mut self.z);
                axpy(alpha, &self.z, x);
                copy(&self.s, &mut self.r);
                return self.finish(SolverStatus::Converged, iter + 1, initial_norm);
            }

            // t = A·M⁻¹·s
            precond.apply(&self.s, &mut self.z);
            matrix.mul_vec(&self.z, &mut self.t);

            let tt = dot(&self.t, &self.t);
            omega = if tt.abs() < stag_tol {
                S::ONE
            } else {
                dot(&self.t, &self.s) / tt
            };

            if omega.abs() < stag_tol {
                precond.apply(&self.p, &mut self.z);
                axpy(alpha, &self.z, x);
                copy(&self.s, &mut self.r);
                return self.finish(SolverStatus::Stagnated, iter + 1, initial_norm);
            }

            // x += alpha·M⁻¹p + omega·M⁻¹s
            precond.apply(&self.p, &mut self.z);
            axpy(alpha, &self.z, x);
            precond.apply(&self.s, &mut self.z);
            axpy(omega, &self.z, x);

            // r = s − omega·t
            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }

            let res_norm = norm2(&self.r);
            let rel_res = res_norm / initial_norm;

            if self.config.verbose {
                log::trace!(
                    "BiCGStab iter {}: residual = {:.6e}",
                    iter + 1,
                    res_norm.to_f64()
                );
            }

            if res_norm < atol || rel_res < rtol {
                return self.finish(SolverStatus::Converged, iter + 1, initial_norm);
            }

            if res_norm > initial_norm * div_factor {
                return self.finish(SolverStatus::Diverged, iter + 1, initial_norm);
            }
        }

        self.finish(SolverStatus::MaxIterationsReached, self.config.max_iter, initial_norm)
    }

    fn name(&self) -> &'static str {
        "BiCGStab"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::linear_algebra::csr::CsrBuilder;
    use crate::numerics::linear_algebra::preconditioner::{
        ChowPatelIlu, ChowPatelIluConfig, IdentityPreconditioner, JacobiPreconditioner,
    };

    fn tridiagonal(n: usize, diag: f64, off: f64) -> CsrMatrix<f64> {
        let mut builder = CsrBuilder::<f64>::new_square(n);
        for i in 0..n {
            builder.set(i, i, diag);
            if i > 0 {
                builder.set(i, i - 1, off);
            }
            if i + 1 < n {
                builder.set(i, i + 1, off);
            }
        }
        builder.build()
    }

    fn residual(matrix: &CsrMatrix<f64>, b: &[f64], x: &[f64]) -> f64 {
        let mut ax = vec![0.0; b.len()];
        matrix.mul_vec(x, &mut ax);
        ax.iter()
            .zip(b.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    #[test]
    fn test_bicgstab_spd() {
        let matrix = tridiagonal(20, 4.0, -1.0);
        let b = vec![1.0; 20];
        let mut x = vec![0.0; 20];

        let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-10, 200));
        let precond = JacobiPreconditioner::from_matrix(&matrix);
        let result = solver.solve(&matrix, &b, &mut x, &precond);

        assert!(result.is_converged());
        assert!(residual(&matrix, &b, &x) < 1e-7);
    }

    #[test]
    fn test_bicgstab_nonsymmetric() {
        // 迎风离散风格的非对称矩阵
        let n = 16;
        let mut builder = CsrBuilder::<f64>::new_square(n);
        for i in 0..n {
            builder.set(i, i, -3.0);
            if i > 0 {
                builder.set(i, i - 1, 2.0);
            }
            if i + 1 < n {
                builder.set(i, i + 1, 0.5);
            }
        }
        let matrix = builder.build();
        let b: Vec<f64> = (0..n).map(|i| (i as f64 * 0.7).sin()).collect();
        let mut x = vec![0.0; n];

        let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-10, 500));
        let precond = ChowPatelIlu::from_matrix(&matrix, &ChowPatelIluConfig::default());
        let result = solver.solve(&matrix, &b, &mut x, &precond);

        assert!(result.is_converged(), "状态: {:?}", result.status);
        assert!(residual(&matrix, &b, &x) < 1e-7);
    }

    #[test]
    fn test_zero_rhs_short_circuit() {
        let matrix = tridiagonal(10, 4.0, -1.0);
        let b = vec![0.0; 10];
        let mut x = vec![0.0; 10];

        let mut solver = BiCgStabSolver::new(SolverConfig::default());
        let result = solver.solve(&matrix, &b, &mut x, &IdentityPreconditioner::new());

        assert!(result.is_converged());
        assert_eq!(result.iterations, 0);
        assert!(x.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_already_converged() {
        let matrix = tridiagonal(5, 4.0, -1.0);
        let x_exact = vec![0.5; 5];
        let mut b = vec![0.0; 5];
        matrix.mul_vec(&x_exact, &mut b);

        let mut x = x_exact.clone();
        let mut solver = BiCgStabSolver::new(SolverConfig::default());
        let result = solver.solve(&matrix, &b, &mut x, &IdentityPreconditioner::new());

        assert!(result.is_converged());
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_ilu_not_slower_than_identity() {
        let matrix = tridiagonal(50, 4.0, -1.9);
        let b = vec![1.0; 50];

        let mut x_id = vec![0.0; 50];
        let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-10, 500));
        let r_id = solver.solve(&matrix, &b, &mut x_id, &IdentityPreconditioner::new());

        let mut x_ilu = vec![0.0; 50];
        let precond = ChowPatelIlu::from_matrix(&matrix, &ChowPatelIluConfig::default());
        let r_ilu = solver.solve(&matrix, &b, &mut x_ilu, &precond);

        assert!(r_id.is_converged());
        assert!(r_ilu.is_converged());
        assert!(r_ilu.iterations <= r_id.iterations);
    }

    #[test]
    fn test_max_iterations_reported() {
        let matrix = tridiagonal(30, 4.0, -1.99);
        let b = vec![1.0; 30];
        let mut x = vec![0.0; 30];

        // 刻意给不够的迭代预算
        let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-14, 1));
        let result = solver.solve(&matrix, &b, &mut x, &IdentityPreconditioner::new());
        assert!(!result.is_converged());
    }
}
