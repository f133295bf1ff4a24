// crates/sd_physics/src/snow/divergence.rs

//! 散度阶段
//!
//! 为每个单元装配一条轻度正则化的椭圆方程，右端为
//! (Qsalt + Qsusp) 跨边通量散度。边通量取相邻两单元的算术
//! 平均；无邻居的边按 1 m 外零通量虚单元处理。
//!
//! 对角线上每条边贡献 `ε/(dx·面积) − 1`：正则化项保持系统良
//! 定，−1 使解实际返回局部通量散度（微扰恒等系统）。

use crate::atmosphere::wind_unit_vector;
use crate::numerics::linear_algebra::{CsrBuilder, CsrMatrix};
use crate::snow::saltation::SaltState;
use rayon::prelude::*;
use sd_mesh::TriMesh;

/// 正则化系数
pub const EPS_REG: f64 = 1e-8;

/// 装配二维散度系统
///
/// 返回 (系数矩阵, 右端项)。逐面并行：每个单元只写自己的行。
pub fn assemble_divergence(
    mesh: &TriMesh,
    salt: &[SaltState],
    q_susp: &[f64],
    wind_dir: &[f64],
) -> (CsrMatrix<f64>, Vec<f64>) {
    let ntri = mesh.n_faces();
    let mut builder = CsrBuilder::<f64>::new_square(ntri);
    let mut rhs = vec![0.0; ntri];

    builder
        .rows_mut()
        .par_iter_mut()
        .zip(rhs.par_iter_mut())
        .enumerate()
        .for_each(|(i, (row, b))| {
            let uvec = wind_unit_vector(wind_dir[i]);
            let area = mesh.area(i);
            let mut add = |col: usize, v: f64| {
                *row.entry(col).or_insert(0.0) += v;
            };

            for j in 0..3 {
                let udotm = uvec.dot(mesh.edge_unit_normal(i, j));
                let e_j = mesh.edge_length(i, j);

                match mesh.neighbor(i, j) {
                    Some(nb) => {
                        let qs = 0.5 * (salt[nb].q_salt + salt[i].q_salt);
                        let qt = 0.5 * (q_susp[nb] + q_susp[i]);
                        let q_total = qs + qt;
                        let dx = mesh.center_distance(i, nb);

                        add(i, EPS_REG / (dx * area) - 1.0);
                        add(nb, -EPS_REG / (dx * area));
                        *b += e_j * q_total * udotm / area;
                    }
                    None => {
                        // 1 m 外零通量虚单元
                        let q_total = 0.5 * salt[i].q_salt + 0.5 * q_susp[i];
                        let dx = 1.0;

                        add(i, EPS_REG / (dx * area) - 1.0);
                        *b += e_j * q_total * udotm / area;
                    }
                }
            }
        });

    (builder.build(), rhs)
}
