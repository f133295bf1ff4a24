// crates/sd_mesh/src/error.rs
//! 网格错误类型

use thiserror::Error;

/// 网格模块结果类型
pub type MeshResult<T> = Result<T, MeshError>;

/// 网格错误枚举
#[derive(Error, Debug)]
pub enum MeshError {
    /// 单元引用了不存在的节点
    #[error("单元 {cell} 引用越界节点 {node}, 节点总数 {n_nodes}")]
    NodeIndexOutOfBounds {
        cell: usize,
        node: usize,
        n_nodes: usize,
    },

    /// 退化单元（面积过小）
    #[error("单元 {cell} 退化: 面积 {area:.3e} 低于阈值")]
    DegenerateCell { cell: usize, area: f64 },

    /// 非流形边（同一条边被三个及以上单元共享）
    #[error("非流形边 ({a}, {b}): 至少被单元 {first}, {second}, {third} 共享")]
    NonManifoldEdge {
        a: usize,
        b: usize,
        first: usize,
        second: usize,
        third: usize,
    },

    /// 空网格
    #[error("网格为空: 没有任何单元")]
    Empty,
}
