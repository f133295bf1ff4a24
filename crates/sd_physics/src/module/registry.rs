// crates/sd_physics/src/module/registry.rs

//! 模块注册表
//!
//! 名称 → 构造闭包 的映射，在程序启动时填充。宿主配置给出
//! 模块名与参数块，注册表负责实例化。

use super::{Module, ParamMap};
use crate::error::ConfigError;
use std::collections::HashMap;

/// 模块构造闭包
pub type ModuleFactory =
    Box<dyn Fn(&ParamMap) -> Result<Box<dyn Module>, ConfigError> + Send + Sync>;

/// 模块注册表
#[derive(Default)]
pub struct ModuleRegistry {
    factories: HashMap<&'static str, ModuleFactory>,
}

impl ModuleRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建并注册全部内置模块
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            crate::snow::module::MODULE_NAME,
            Box::new(|params| {
                crate::snow::module::BlowingSnow::from_params(params)
                    .map(|m| Box::new(m) as Box<dyn Module>)
            }),
        );
        registry
    }

    /// 注册模块构造闭包（重名覆盖）
    pub fn register(&mut self, name: &'static str, factory: ModuleFactory) {
        self.factories.insert(name, factory);
    }

    /// 按名称实例化模块
    pub fn create(&self, name: &str, params: &ParamMap) -> Result<Box<dyn Module>, ConfigError> {
        match self.factories.get(name) {
            Some(factory) => factory(params),
            None => Err(ConfigError::UnknownModule(name.to_string())),
        }
    }

    /// 已注册的模块名
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_contains_blowing_snow() {
        let registry = ModuleRegistry::with_builtin();
        let names: Vec<_> = registry.names().collect();
        assert!(names.contains(&"pbsm3d"));
    }

    #[test]
    fn test_create_with_params() {
        let registry = ModuleRegistry::with_builtin();
        let mut params = ParamMap::new();
        params.set("settling_velocity", -0.3);
        let module = registry.create("pbsm3d", &params).unwrap();
        assert_eq!(module.name(), "pbsm3d");
        assert!(module.depends().contains(&"swe"));
        assert!(module.provides().contains(&"drift_mass"));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let registry = ModuleRegistry::with_builtin();
        let mut params = ParamMap::new();
        params.set("settling_velocity", 0.5);
        assert!(matches!(
            registry.create("pbsm3d", &params),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_unknown_module() {
        let registry = ModuleRegistry::with_builtin();
        assert!(matches!(
            registry.create("no_such_module", &ParamMap::new()),
            Err(ConfigError::UnknownModule(_))
        ));
    }
}
