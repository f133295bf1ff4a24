// crates/sd_physics/src/module/mod.rs

//! 物理模块抽象
//!
//! 宿主模型按名称实例化物理模块并驱动其逐时间步运行。一个模块
//! 就是一条能力记录：名称、声明的输入字段、声明的输出字段，
//! 以及 `init` / `run` 两个入口。
//!
//! - [`Module`]: 模块 trait
//! - [`ParamMap`] / [`ParamValue`]: 松散类型的模块参数
//! - [`registry::ModuleRegistry`]: 名称 → 构造闭包 的注册表

pub mod registry;

use crate::error::{ConfigError, PhysicsResult};
use crate::fields::FieldStore;
use sd_mesh::TriMesh;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use registry::ModuleRegistry;

/// 物理模块
///
/// `init` 在网格就绪后调用一次（建立逐面缓存、注册输出字段）；
/// `run` 每个时间步调用一次，读取驱动字段并写回输出字段。
pub trait Module: Send {
    /// 模块名称（注册表键）
    fn name(&self) -> &'static str;

    /// 声明的输入字段（每步逐面读取）
    fn depends(&self) -> &'static [&'static str];

    /// 声明的输出字段（每步逐面写回）
    fn provides(&self) -> &'static [&'static str];

    /// 初始化（一次）
    fn init(&mut self, mesh: &TriMesh, fields: &mut FieldStore) -> PhysicsResult<()>;

    /// 运行一个时间步
    ///
    /// # 参数
    ///
    /// - `dt`: 外部固定的时间步长 [s]
    fn run(&mut self, mesh: &TriMesh, fields: &mut FieldStore, dt: f64) -> PhysicsResult<()>;
}

/// 松散类型参数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// 布尔
    Bool(bool),
    /// 整数
    Int(i64),
    /// 浮点
    Float(f64),
    /// 文本
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// 松散类型参数表
///
/// 模拟宿主配置块的 `get(key, default)` 语义：未给出的键取默认
/// 值，给出但类型不符则报配置错误。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamMap {
    values: HashMap<String, ParamValue>,
}

impl ParamMap {
    /// 创建空参数表
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置参数
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// 读取浮点参数，缺省取 `default`
    ///
    /// 整数值自动提升为浮点。
    pub fn get_f64_or(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Float(v)) => Ok(*v),
            Some(ParamValue::Int(v)) => Ok(*v as f64),
            Some(_) => Err(ConfigError::WrongType {
                name: key.to_string(),
                expected: "浮点数",
            }),
        }
    }

    /// 读取布尔参数，缺省取 `default`
    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Bool(v)) => Ok(*v),
            Some(_) => Err(ConfigError::WrongType {
                name: key.to_string(),
                expected: "布尔值",
            }),
        }
    }

    /// 是否包含键
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_defaults() {
        let params = ParamMap::new();
        assert_eq!(params.get_f64_or("x", -0.5).unwrap(), -0.5);
        assert!(params.get_bool_or("y", true).unwrap());
    }

    #[test]
    fn test_param_overrides() {
        let mut params = ParamMap::new();
        params.set("x", 1.25);
        params.set("n", 3i64);
        params.set("flag", false);
        assert_eq!(params.get_f64_or("x", 0.0).unwrap(), 1.25);
        // 整数提升为浮点
        assert_eq!(params.get_f64_or("n", 0.0).unwrap(), 3.0);
        assert!(!params.get_bool_or("flag", true).unwrap());
    }

    #[test]
    fn test_param_wrong_type() {
        let mut params = ParamMap::new();
        params.set("x", "text");
        assert!(matches!(
            params.get_f64_or("x", 0.0),
            Err(ConfigError::WrongType { .. })
        ));
        params.set("f", 1.0);
        assert!(matches!(
            params.get_bool_or("f", false),
            Err(ConfigError::WrongType { .. })
        ));
    }
}
