// crates/sd_physics/src/snow/suspension.rs

//! 悬移装配阶段
//!
//! 把二维地表网格沿垂向挤出为 N_LAYER 层棱柱，在其上装配悬移
//! 浓度稳态对流-扩散方程的稀疏系统。单元 (面 i, 层 z) 的行号
//! idx = ntri·z + i，未知量为单元中心浓度。
//!
//! 离散规则（逐棱柱面迎风）：
//!
//! - 出流 (u·m > 0)：对角线收 −A·(u·m) − α，下游单元收 +α
//! - 入流 (u·m < 0)：对角线收 −α，上游单元收 −A·(u·m) + α
//! - 缺侧向邻居：丢掉跨边耦合，出流仍向对角线贡献 −A·(u·m)，
//!   入流只贡献 −α（无源）
//! - 第 0 层底面：Dirichlet 源，对角线收 −A₄·K₄，右端收
//!   −A₄·K₄·c_salt，地面无垂直平流
//! - 顶层上方无耦合，顶面只把自身项记到对角线
//!
//! 水平方向不做湍流扩散（侧向 α = 0）；垂直涡扩散系数由混合长
//! 闭合。`vertical_advection = false` 时退化为纯扩散（保留同样
//! 的底部 Dirichlet 与顶部处理）。
//!
//! 并行模型：行所有权。每行只被其所属单元写入，
//! `CsrBuilder::rows_mut` 上 `par_iter_mut` 即可无锁装配。

use crate::atmosphere::{log_scale_wind, wind_unit_vector};
use crate::numerics::linear_algebra::{CsrBuilder, CsrMatrix};
use crate::snow::geometry::FaceGeometry;
use crate::snow::saltation::SaltState;
use crate::snow::{LAYER_HEIGHT, L_MAX, N_LAYER};
use crate::types::{BlowingSnowConfig, PhysicalConstants};
use glam::DVec3;
use rayon::prelude::*;
use sd_mesh::TriMesh;
use std::collections::BTreeMap;

/// 装配好的悬移系统
pub struct SuspensionSystem {
    /// 系数矩阵，维度 ntri·N_LAYER
    pub matrix: CsrMatrix<f64>,
    /// 右端项（底部 Dirichlet 源）
    pub rhs: Vec<f64>,
    /// 垂直涡扩散系数诊断，布局 idx = ntri·z + i
    pub k_diag: Vec<f64>,
}

/// 装配悬移对流-扩散系统
pub fn assemble_suspension(
    mesh: &TriMesh,
    geometry: &[FaceGeometry],
    salt: &[SaltState],
    u2: &[f64],
    wind_dir: &[f64],
    config: &BlowingSnowConfig,
    constants: &PhysicalConstants,
) -> SuspensionSystem {
    let ntri = mesh.n_faces();
    let n = ntri * N_LAYER;
    let mut builder = CsrBuilder::<f64>::new_square(n);
    let mut rhs = vec![0.0; n];
    let mut k_diag = vec![0.0; n];

    builder
        .rows_mut()
        .par_iter_mut()
        .zip(rhs.par_iter_mut())
        .zip(k_diag.par_iter_mut())
        .enumerate()
        .for_each(|(idx, ((row, b), k_out))| {
            let z = idx / ntri;
            let i = idx % ntri;
            assemble_cell(
                mesh,
                &geometry[i],
                &salt[i],
                u2[i],
                wind_dir[i],
                config,
                constants,
                ntri,
                z,
                i,
                row,
                b,
                k_out,
            );
        });

    SuspensionSystem {
        matrix: builder.build(),
        rhs,
        k_diag,
    }
}

/// 装配单个棱柱单元的行
#[allow(clippy::too_many_arguments)]
fn assemble_cell(
    mesh: &TriMesh,
    g: &FaceGeometry,
    s: &SaltState,
    u2: f64,
    wdir: f64,
    config: &BlowingSnowConfig,
    constants: &PhysicalConstants,
    ntri: usize,
    z: usize,
    i: usize,
    row: &mut BTreeMap<usize, f64>,
    b: &mut f64,
    k_out: &mut f64,
) {
    let idx = ntri * z + i;

    // 单元中心高度与混合长闭合的垂直涡扩散系数
    let cz = z as f64 + s.hs + LAYER_HEIGHT / 2.0;
    let kappa = constants.kappa;
    let l = kappa * (cz + s.z0) * L_MAX / (kappa * cz + kappa * s.z0 + L_MAX);
    let k_v = config.snow_diffusion_const * (s.ustar * l).max(kappa * cz * s.ustar);
    *k_out = k_v;

    // 扩散交换系数 α = A·K/h; 水平方向无扩散
    let alpha_top = g.area[3] * k_v / LAYER_HEIGHT;
    let alpha_bottom = g.area[4] * k_v / LAYER_HEIGHT;
    let alpha_lat = 0.0;

    // 该高度处的风矢量: 对数廓线缩放的水平分量 + 垂直沉降
    let u_z = log_scale_wind(u2, 2.0, cz, 0.0, s.z0).max(0.1);
    let horiz = wind_unit_vector(wdir) * u_z;
    let uvw = DVec3::new(horiz.x, horiz.y, config.settling_velocity);

    let mut udotm = [0.0; 5];
    for (f, m) in g.m.iter().enumerate() {
        udotm[f] = uvw.dot(*m);
    }

    let mut add = |col: usize, v: f64| {
        *row.entry(col).or_insert(0.0) += v;
    };

    // 侧面迎风
    for f in 0..3 {
        if udotm[f] > 0.0 {
            if g.neighbor[f] {
                add(idx, -g.area[f] * udotm[f] - alpha_lat);
                add(idx, alpha_lat);
            } else {
                // 无邻居: 类 Neumann 出流
                add(idx, -g.area[f] * udotm[f]);
            }
        } else {
            match mesh.neighbor(i, f) {
                Some(nb) => {
                    add(idx, -alpha_lat);
                    add(ntri * z + nb, -g.area[f] * udotm[f] + alpha_lat);
                }
                // 无邻居: 无源入流
                None => add(idx, -alpha_lat),
            }
        }
    }

    if config.vertical_advection {
        if z == 0 {
            // 底面: Dirichlet 跃移源, 地面无垂直平流
            add(idx, -g.area[4] * k_v);
            *b = -g.area[4] * k_v * s.c_salt;

            let up = ntri * (z + 1) + i;
            if udotm[3] > 0.0 {
                add(idx, -g.area[3] * udotm[3] - alpha_top);
                add(up, alpha_top);
            } else {
                add(idx, -alpha_top);
                add(up, -g.area[3] * udotm[3] + alpha_top);
            }
        } else if z == N_LAYER - 1 {
            // 顶层: 上方无耦合
            let down = ntri * (z - 1) + i;
            if udotm[3] > 0.0 {
                add(idx, -g.area[3] * udotm[3] - alpha_top);
            } else {
                add(idx, -alpha_top);
            }
            if udotm[4] > 0.0 {
                add(idx, -g.area[4] * udotm[4] - alpha_bottom);
                add(down, alpha_bottom);
            } else {
                add(idx, -alpha_bottom);
                add(down, -g.area[4] * udotm[4] + alpha_bottom);
            }
        } else {
            // 中间层
            let up = ntri * (z + 1) + i;
            let down = ntri * (z - 1) + i;
            if udotm[3] > 0.0 {
                add(idx, -g.area[3] * udotm[3] - alpha_top);
                add(up, alpha_top);
            } else {
                add(idx, -alpha_top);
                add(up, -g.area[3] * udotm[3] + alpha_top);
            }
            if udotm[4] > 0.0 {
                add(idx, -g.area[4] * udotm[4] - alpha_bottom);
                add(down, alpha_bottom);
            } else {
                add(idx, -alpha_bottom);
                add(down, -g.area[4] * udotm[4] + alpha_bottom);
            }
        }
    } else {
        // 纯扩散模式: 省去垂直平流项, 保留底部 Dirichlet
        if z == 0 {
            add(idx, -g.area[4] * k_v);
            *b = -g.area[4] * k_v * s.c_salt;

            add(idx, -alpha_top);
            add(ntri * (z + 1) + i, alpha_top);
        } else if z == N_LAYER - 1 {
            add(idx, -alpha_top - alpha_bottom);
            add(ntri * (z - 1) + i, alpha_bottom);
        } else {
            add(idx, -alpha_top - alpha_bottom);
            add(ntri * (z + 1) + i, alpha_top);
            add(ntri * (z - 1) + i, alpha_bottom);
        }
    }
}
