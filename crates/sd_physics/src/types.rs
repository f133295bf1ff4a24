// crates/sd_physics/src/types.rs

//! 核心类型定义
//!
//! - [`PhysicalConstants`]: 物理常数（保持 f64，自然常数不随计算精度改变）
//! - [`BlowingSnowConfig`]: 风吹雪模块的可配置参数及其校验

use crate::error::ConfigError;
use crate::module::ParamMap;
use serde::{Deserialize, Serialize};

// ============================================================
// 物理常数
// ============================================================

/// 物理常数
///
/// 仅取决于物理现实的常量，不随算法、场景、网格变化。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// 重力加速度 [m/s²]
    pub g: f64,
    /// von Kármán 常数
    pub kappa: f64,
    /// 冰密度 [kg/m³]
    pub rho_ice: f64,
    /// 空气密度 [kg/m³]
    pub rho_air: f64,
    /// 空气运动粘度 [m²/s]
    pub air_viscosity: f64,
    /// 升华潜热 [J/kg]
    pub latent_heat_sublimation: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::standard()
    }
}

impl PhysicalConstants {
    /// 标准大气下的常数
    pub fn standard() -> Self {
        Self {
            g: 9.81,
            kappa: 0.4,
            rho_ice: 917.0,
            rho_air: 1.225,
            air_viscosity: 1.88e-5,
            latent_heat_sublimation: 2.838e6,
        }
    }
}

// ============================================================
// 模块配置
// ============================================================

/// 风吹雪模块配置
///
/// 三个可识别的配置键与默认值见各字段注释。`settling_velocity`
/// 必须为负（向下），在构造期校验失败即拒绝整个模块。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlowingSnowConfig {
    /// 粒子沉降速度 [m/s]，必须为负（默认 -0.5）
    pub settling_velocity: f64,
    /// 涡扩散系数缩放（默认 0.005）
    pub snow_diffusion_const: f64,
    /// 是否启用垂直平流（默认 true；false 时退化为纯扩散）
    pub vertical_advection: bool,
}

impl Default for BlowingSnowConfig {
    fn default() -> Self {
        Self {
            settling_velocity: -0.5,
            snow_diffusion_const: 0.005,
            vertical_advection: true,
        }
    }
}

impl BlowingSnowConfig {
    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settling_velocity >= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "settling_velocity",
                constraint: format!("必须为负（向下），当前 {}", self.settling_velocity),
            });
        }
        if self.snow_diffusion_const <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "snow_diffusion_const",
                constraint: format!("必须为正，当前 {}", self.snow_diffusion_const),
            });
        }
        Ok(())
    }

    /// 从松散参数表构造（未给出的键取默认值）
    pub fn from_params(params: &ParamMap) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            settling_velocity: params.get_f64_or("settling_velocity", defaults.settling_velocity)?,
            snow_diffusion_const: params
                .get_f64_or("snow_diffusion_const", defaults.snow_diffusion_const)?,
            vertical_advection: params.get_bool_or("vertical_advection", defaults.vertical_advection)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 设置沉降速度
    pub fn with_settling_velocity(mut self, v: f64) -> Self {
        self.settling_velocity = v;
        self
    }

    /// 设置扩散缩放
    pub fn with_snow_diffusion_const(mut self, v: f64) -> Self {
        self.snow_diffusion_const = v;
        self
    }

    /// 开关垂直平流
    pub fn with_vertical_advection(mut self, on: bool) -> Self {
        self.vertical_advection = on;
        self
    }
}
