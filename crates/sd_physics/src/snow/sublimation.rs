// crates/sd_physics/src/snow/sublimation.rs

//! 升华阶段
//!
//! 从解出的悬移浓度廓线逐面积分悬移通量 Qsusp，并计算悬浮粒子
//! 的升华质量通量 Qsubl。升华率依赖粒子表面温度 Ts，由隐式
//! 能量平衡在 [200, 300] K 上带括号求根得到。

use crate::atmosphere::{
    log_scale_wind, saturation_vapour_pressure, std_air_pressure, std_dry_air_density,
};
use crate::error::PhysicsResult;
use crate::numerics::root_finding::{brent, BrentConfig, RootFindError};
use crate::snow::saltation::SaltState;
use crate::snow::{LAYER_HEIGHT, N_LAYER};
use crate::types::PhysicalConstants;
use sd_mesh::TriMesh;
use std::f64::consts::{FRAC_PI_4, PI};

/// 粒子温度求根区间下界 [K]
pub const TS_BRACKET_MIN: f64 = 200.0;

/// 粒子温度求根区间上界 [K]
pub const TS_BRACKET_MAX: f64 = 300.0;

/// 逐面升华阶段输出
#[derive(Debug, Clone)]
pub struct SublimationOutput {
    /// 垂直积分悬移通量 [kg/(m·s)]
    pub q_susp: f64,
    /// 升华质量通量 [kg/(m²·s)]，损失为负
    pub q_subl: f64,
    /// 各层浓度（已钳制非负）[kg/m³]
    pub conc: [f64; N_LAYER],
}

/// 粒子表面温度 [K]
///
/// 求解隐式能量平衡
/// `f(Ts) = [D·Sh·Ls·ρa·(q − q_s(Ts)) + Nu·T·λt]/(λt·Nu) − Ts = 0`，
/// 其中粒子表面取冰面饱和比湿。括号区间 [200, 300] K 为硬性
/// 假设，区间内无符号变化视为该时间步致命错误。
///
/// # 参数
///
/// - `t_k`: 气温 [K]
/// - `q_air`: 空气比湿
/// - `p_kpa`: 气压 [kPa]
/// - `vapour_diffusivity`: 水汽扩散率 D [m²/s]
/// - `nusselt`: Nusselt 数（= Sherwood 数）
/// - `thermal_conductivity`: 导热系数 λt
/// - `air_density`: 干空气密度 [kg/m³]
/// - `latent_heat`: 升华潜热 [J/kg]
#[allow(clippy::too_many_arguments)]
pub fn particle_temperature(
    t_k: f64,
    q_air: f64,
    p_kpa: f64,
    vapour_diffusivity: f64,
    nusselt: f64,
    thermal_conductivity: f64,
    air_density: f64,
    latent_heat: f64,
) -> Result<f64, RootFindError> {
    let energy_balance = |ts: f64| {
        let es_ts = saturation_vapour_pressure(ts);
        // 粒子表面饱和（相对湿度 100%）
        let q_ts = 0.633 * (es_ts / 1000.0) / p_kpa;
        (vapour_diffusivity * nusselt * latent_heat * air_density * (q_air - q_ts)
            + nusselt * t_k * thermal_conductivity)
            / (thermal_conductivity * nusselt)
            - ts
    };
    let result = brent(
        energy_balance,
        TS_BRACKET_MIN,
        TS_BRACKET_MAX,
        &BrentConfig::default(),
    )?;
    Ok(result.root)
}

/// 逐面升华计算
///
/// `conc` 为悬移求解的全场解，布局 idx = ntri·z + face；
/// 使用前逐层钳制到非负。
#[allow(clippy::too_many_arguments)]
pub fn compute_sublimation(
    mesh: &TriMesh,
    salt: &SaltState,
    conc: &[f64],
    ntri: usize,
    face: usize,
    u2: f64,
    t_c: f64,
    rh_pct: f64,
    constants: &PhysicalConstants,
) -> PhysicsResult<SublimationOutput> {
    let rh = rh_pct / 100.0;
    let t = t_c + 273.15;
    let elevation = mesh.elevation(face);

    let es = saturation_vapour_pressure(t);
    let ea = rh * es / 1000.0; // kPa
    let p = std_air_pressure(elevation) / 1000.0; // kPa
    let q_air = 0.633 * ea / p;
    let rho_a = std_dry_air_density(elevation, t);
    let ls = constants.latent_heat_sublimation;

    let mut out = SublimationOutput {
        q_susp: 0.0,
        q_subl: 0.0,
        conc: [0.0; N_LAYER],
    };

    for z in 0..N_LAYER {
        let c = conc[ntri * z + face].max(0.0);
        let cz = z as f64 + salt.hs + LAYER_HEIGHT / 2.0;
        let u_z = log_scale_wind(u2, 2.0, cz, 0.0, salt.z0).max(0.1);

        out.q_susp += c * u_z * LAYER_HEIGHT; // kg/m³ → kg/(m·s)
        out.conc[z] = c;

        // 平均粒径与通风速度
        let rm = 4.6e-5 * cz.powf(-0.258);
        let xrz = 0.005 * u_z.powf(1.36);
        let omega = 1.1e7 * rm.powf(1.8);
        let vr = omega + 3.0 * xrz * FRAC_PI_4.cos();

        let re = 2.0 * rm * vr / constants.air_viscosity;
        let nusselt = 1.79 + 0.606 * re.sqrt();

        // 水汽扩散率与导热系数（t 分别取 K 与 °C）
        let d = 2.06e-5 * (t / 273.0).powf(1.75);
        let lambda_t = 6.3e-5 * (t - 273.15) + 6.73e-3;

        let ts = particle_temperature(t, q_air, p, d, nusselt, lambda_t, rho_a, ls)?;

        // 单粒子质量变化率
        let dmdt = 2.0 * PI * rm * lambda_t / ls * nusselt * (ts - t);

        // 平均粒子质量（gamma 分布闭合）
        let alpha = 4.08 + 12.6 * cz;
        let mm = 4.0 / 3.0 * PI * constants.rho_ice * rm.powi(3)
            * (1.0 + 3.0 / alpha + 2.0 / (alpha * alpha));

        let csubl = dmdt / mm;
        out.q_subl += csubl * c * LAYER_HEIGHT; // kg/(m²·s)
    }

    Ok(out)
}
