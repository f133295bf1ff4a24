// crates/sd_physics/src/snow/saltation.rs

//! 跃移阶段
//!
//! 逐面计算摩擦速度、跃移层深度、跃移浓度与通量，并施加质量
//! 限制器：一个时间步内跃移带走的质量不得超过单元现有雪水当量。
//!
//! 摩擦速度由 2 m 风速经对数廓线的经验反演得到（Lambert W 下
//! 分支）；跃移启动阈值取颗粒起动的经验关系。

use crate::atmosphere::{log_scale_wind, wind_unit_vector, Z0_SNOW};
use crate::numerics::special::lambert_w_m1;
use crate::types::PhysicalConstants;
use sd_mesh::TriMesh;

/// 跃移启动阈值系数
const THRESH_A: f64 = 0.18;

/// 颗粒粒径 [m]
const GRAIN_D: f64 = 0.48e-3;

/// 逐面跃移状态（每个时间步重算）
#[derive(Debug, Clone, Default)]
pub struct SaltState {
    /// 摩擦速度 [m/s]
    pub ustar: f64,
    /// 空气动力学粗糙度 [m]
    pub z0: f64,
    /// 跃移层深度 [m]
    pub hs: f64,
    /// 跃移启动阈值摩擦速度 [m/s]
    pub u_star_th: f64,
    /// 跃移浓度 [kg/m³]
    pub c_salt: f64,
    /// 跃移通量 [kg/(m·s)]
    pub q_salt: f64,
    /// 是否正在吹雪
    pub is_drifting: bool,
    /// 10 m 风速 [m/s]
    pub u10: f64,
    /// 点尺度悬移通量参考值 [kg/(m·s)]
    pub q_susp_pbsm: f64,
}

/// 摩擦速度经验反演
///
/// `ustar = -0.2·u2 / W₋₁(-0.01107384167·u2)`，下限 0.1 m/s。
/// 反演仅在 Lambert 自变量不低于 -1/e（u2 ≲ 33.2 m/s）时有定义，
/// 超出后自变量钳制到分支点，退化为 `ustar = 0.2·u2`。
pub fn friction_velocity(u2: f64) -> f64 {
    const COEF: f64 = 0.011_073_841_67;
    if u2 <= 0.0 {
        return 0.1;
    }
    let w = lambert_w_m1(-COEF * u2);
    (-0.2 * u2 / w).max(0.1)
}

/// 逐面跃移计算
///
/// # 参数
///
/// - `face`: 单元索引
/// - `u2`: 2 m 风速 [m/s]
/// - `wind_dir`: 风向方位角 [度]
/// - `swe`: 雪水当量 [kg/m²]，NaN 视为 0
/// - `dt`: 时间步长 [s]
pub fn compute_saltation(
    mesh: &TriMesh,
    face: usize,
    u2: f64,
    wind_dir: f64,
    swe: f64,
    dt: f64,
    constants: &PhysicalConstants,
) -> SaltState {
    let u10 = log_scale_wind(u2, 2.0, 10.0, 0.0, Z0_SNOW);
    let ustar = friction_velocity(u2);
    let z0 = (0.1203 * ustar * ustar / (2.0 * constants.g)).max(0.001);
    let hs = 0.08436 * ustar.powf(1.27);
    let u_star_th = THRESH_A
        * ((constants.rho_ice - constants.rho_air) / constants.rho_air * GRAIN_D * constants.g)
            .sqrt();

    // 首步可能尚未写入 swe
    let swe = if swe.is_nan() { 0.0 } else { swe };

    let mut state = SaltState {
        ustar,
        z0,
        hs,
        u_star_th,
        u10,
        ..Default::default()
    };

    if ustar > u_star_th && swe > 0.0 {
        state.is_drifting = true;
        state.q_susp_pbsm = u10.powf(4.13) / 674_100.0;

        let mut c_salt = constants.rho_air / (3.29 * ustar)
            * (1.0 - u_star_th * u_star_th / (ustar * ustar));

        // 跃移层内平均风速
        let uhs = (log_scale_wind(u2, 2.0, hs, 0.0, z0) / 2.0).max(0.1);
        let mut q_salt = c_salt * uhs * hs;

        // 质量限制器：对出流边积分跃移通量，一个时间步内带走的
        // 质量不得超过单元内现有 swe（入流侧由邻居负责）
        let uvec = wind_unit_vector(wind_dir);
        let mut outflux = 0.0;
        for e in 0..3 {
            let udotm = uvec.dot(mesh.edge_unit_normal(face, e));
            if udotm > 0.0 {
                outflux += mesh.edge_length(face, e) * udotm;
            }
        }
        let area = mesh.area(face);
        let potential = q_salt * dt * outflux / area; // kg/m²

        if potential > swe {
            // 反推与可用 swe 恰好平衡的浓度
            c_salt = swe * area / (dt * hs * uhs * outflux);
            q_salt = c_salt * uhs * hs;
            if !c_salt.is_finite() {
                c_salt = 0.0;
                q_salt = 0.0;
            } else {
                log::debug!(
                    "单元 {} 跃移受限: c_salt -> {:.4e} kg/m³ (可用 swe {:.3} kg/m²)",
                    face,
                    c_salt,
                    swe
                );
            }
        }

        state.c_salt = c_salt;
        state.q_salt = q_salt;
    }

    state
}
