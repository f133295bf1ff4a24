// crates/sd_physics/src/atmosphere.rs

//! 大气辅助函数
//!
//! 引擎内用到的近地层与标准大气公式：对数风廓线缩放、饱和水汽
//! 压（Murray 1967，水面/冰面分段）、标准大气压、干空气密度，
//! 以及风向方位角到平面单位向量的换算。

use glam::DVec2;

/// 雪面默认粗糙度 [m]
pub const Z0_SNOW: f64 = 0.01;

/// 干空气比气体常数 [J/(kg·K)]
pub const GAS_CONSTANT_DRY_AIR: f64 = 287.058;

/// 海平面标准大气压 [Pa]
pub const STD_PRESSURE_SEA_LEVEL: f64 = 101_325.0;

/// 对数风廓线高度缩放
///
/// 把高度 `z_in` 处的风速换算到 `z_out` 处，雪深 `snow_depth`
/// 抬升零平面，`z0` 为空气动力学粗糙度。
///
/// # 参数
///
/// - `u`: `z_in` 处风速 [m/s]
/// - `z_in`, `z_out`: 输入/输出高度 [m]
/// - `snow_depth`: 雪深 [m]
/// - `z0`: 粗糙度 [m]
pub fn log_scale_wind(u: f64, z_in: f64, z_out: f64, snow_depth: f64, z0: f64) -> f64 {
    // 输出高度不允许落进粗糙度以下
    let z_out_eff = (z_out - snow_depth).max(z0 * 1.01);
    let z_in_eff = (z_in - snow_depth).max(z0 * 1.01);
    u * (z_out_eff / z0).ln() / (z_in_eff / z0).ln()
}

/// 饱和水汽压 [Pa]（Murray 1967）
///
/// 冰点以上取水面系数，以下取冰面系数。
pub fn saturation_vapour_pressure(t_k: f64) -> f64 {
    const T_TRIPLE: f64 = 273.16;
    let (a, b) = if t_k >= T_TRIPLE {
        (17.269_388_2, 35.86) // 水面
    } else {
        (21.874_558_4, 7.66) // 冰面
    };
    610.78 * ((a * (t_k - T_TRIPLE)) / (t_k - b)).exp()
}

/// 标准大气压 [Pa]
///
/// 国际标准大气在高程 `elevation` 处的气压。
pub fn std_air_pressure(elevation: f64) -> f64 {
    STD_PRESSURE_SEA_LEVEL * (1.0 - 2.255_77e-5 * elevation).powf(5.255_88)
}

/// 干空气密度 [kg/m³]
///
/// 由标准大气压与气温按理想气体状态方程计算。
pub fn std_dry_air_density(elevation: f64, t_k: f64) -> f64 {
    std_air_pressure(elevation) / (GAS_CONSTANT_DRY_AIR * t_k)
}

/// 方位角（自北顺时针，度）转平面单位向量
///
/// 返回指向该方位角方向的单位向量（x 向东，y 向北）。
pub fn bearing_to_cartesian(bearing_deg: f64) -> DVec2 {
    let rad = bearing_deg.to_radians();
    DVec2::new(rad.sin(), rad.cos())
}

/// 风矢量单位向量
///
/// 气象风向表示风的来向，风实际吹向其反方向。
pub fn wind_unit_vector(bearing_deg: f64) -> DVec2 {
    -bearing_to_cartesian(bearing_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_scale_wind_identity() {
        let u = log_scale_wind(5.0, 2.0, 2.0, 0.0, Z0_SNOW);
        assert!((u - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_log_scale_wind_increases_with_height() {
        let u2 = 8.0;
        let u10 = log_scale_wind(u2, 2.0, 10.0, 0.0, Z0_SNOW);
        assert!(u10 > u2);
        let u05 = log_scale_wind(u2, 2.0, 0.5, 0.0, Z0_SNOW);
        assert!(u05 < u2);
        assert!(u05 > 0.0);
    }

    #[test]
    fn test_saturation_vapour_pressure_anchor() {
        // 三相点附近约 611 Pa
        let es = saturation_vapour_pressure(273.16);
        assert!((es - 610.78).abs() < 0.5);
        // 冰面分支在 -10 °C 约 260 Pa
        let es_ice = saturation_vapour_pressure(263.15);
        assert!(es_ice > 240.0 && es_ice < 280.0);
        // 单调
        assert!(saturation_vapour_pressure(293.15) > es);
    }

    #[test]
    fn test_std_pressure() {
        assert!((std_air_pressure(0.0) - STD_PRESSURE_SEA_LEVEL).abs() < 1e-9);
        // 1500 m 处约 84.5 kPa
        let p = std_air_pressure(1500.0);
        assert!(p > 83_000.0 && p < 86_000.0);
    }

    #[test]
    fn test_dry_air_density() {
        // 海平面 15 °C 约 1.225 kg/m³
        let rho = std_dry_air_density(0.0, 288.15);
        assert!((rho - 1.225).abs() < 0.01);
    }

    #[test]
    fn test_wind_vector_from_north() {
        // 北风（来自北方）吹向南方
        let v = wind_unit_vector(0.0);
        assert!(v.x.abs() < 1e-12);
        assert!((v.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_wind_vector_rotation_negates() {
        for bearing in [0.0, 37.0, 90.0, 213.5] {
            let v = wind_unit_vector(bearing);
            let w = wind_unit_vector(bearing + 180.0);
            assert!((v + w).length() < 1e-12, "方位角旋转 180° 应取反风矢量");
        }
    }
}
