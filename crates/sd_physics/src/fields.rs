// crates/sd_physics/src/fields.rs
//! 逐面标量字段存储
//!
//! 宿主模型按名称向引擎供给气象驱动字段，引擎按名称写回输出
//! 字段。每个字段是长度为单元数的 `Vec<f64>`，按稳定 cell id
//! 索引。
//!
//! # 设计说明
//!
//! 字段按字符串键注册，允许运行时动态扩展（不同模块的不同
//! 输出需求），与模块声明的 depends/provides 列表配合使用。

use crate::error::{PhysicsError, PhysicsResult};
use std::collections::HashMap;

/// 逐面标量字段存储
#[derive(Debug, Clone, Default)]
pub struct FieldStore {
    /// 单元数量
    n_cells: usize,
    /// 名称 → 逐面值
    fields: HashMap<String, Vec<f64>>,
}

impl FieldStore {
    /// 创建空存储
    pub fn new(n_cells: usize) -> Self {
        Self {
            n_cells,
            fields: HashMap::new(),
        }
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 注册字段并清零（已存在则重置为零）
    pub fn register(&mut self, name: &str) {
        self.fields.insert(name.to_string(), vec![0.0; self.n_cells]);
    }

    /// 整体写入字段，长度必须等于单元数
    pub fn insert(&mut self, name: &str, values: Vec<f64>) -> PhysicsResult<()> {
        if values.len() != self.n_cells {
            return Err(PhysicsError::FieldSizeMismatch {
                name: name.to_string(),
                expected: self.n_cells,
                actual: values.len(),
            });
        }
        self.fields.insert(name.to_string(), values);
        Ok(())
    }

    /// 是否存在字段
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// 只读借用字段
    pub fn values(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(|v| v.as_slice())
    }

    /// 只读借用字段，缺失时报 [`PhysicsError::MissingField`]
    pub fn required(&self, name: &str) -> PhysicsResult<&[f64]> {
        self.values(name)
            .ok_or_else(|| PhysicsError::MissingField(name.to_string()))
    }

    /// 读取单个面的值
    pub fn get(&self, name: &str, cell: usize) -> Option<f64> {
        self.fields.get(name).and_then(|v| v.get(cell)).copied()
    }

    /// 写入单个面的值（字段必须已注册）
    pub fn set(&mut self, name: &str, cell: usize, value: f64) -> bool {
        match self.fields.get_mut(name) {
            Some(v) if cell < v.len() => {
                v[cell] = value;
                true
            }
            _ => false,
        }
    }

    /// 所有字段名
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|s| s.as_str())
    }
}
