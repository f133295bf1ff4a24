// crates/sd_physics/src/numerics/linear_algebra/csr.rs

//! 压缩稀疏行（CSR）矩阵
//!
//! 有限体积装配的自然配合：构建器按行独立累加（BTreeMap 保证
//! 列有序），求解前一次性压缩为 CSR。
//!
//! # 格式说明
//!
//! - `row_ptr`: 长度 n_rows + 1，`row_ptr[i]` 为第 i 行首个非零元索引
//! - `col_idx`: 列索引，与非零元一一对应，行内升序
//! - `values`: 非零元值
//!
//! # 并行装配
//!
//! [`CsrBuilder::rows_mut`] 暴露行切片：每行只被其所属单元写入
//! 时可以 `par_iter_mut` 无锁并行装配。

use sd_core::Scalar;
use std::collections::BTreeMap;

/// CSR 稀疏模式（结构与值分离）
#[derive(Debug, Clone)]
pub struct CsrPattern {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl CsrPattern {
    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// 行指针切片
    #[inline]
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// 列索引切片
    #[inline]
    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    /// 查找 (row, col) 的存储位置
    ///
    /// 行内列索引有序，用二分查找。
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_idx[start..end].binary_search(&col) {
            Ok(local) => Some(start + local),
            Err(_) => None,
        }
    }
}

/// CSR 格式稀疏矩阵
#[derive(Debug, Clone)]
pub struct CsrMatrix<S: Scalar> {
    pattern: CsrPattern,
    values: Vec<S>,
}

impl<S: Scalar> CsrMatrix<S> {
    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pattern.n_rows
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.pattern.n_cols
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 稀疏模式
    #[inline]
    pub fn pattern(&self) -> &CsrPattern {
        &self.pattern
    }

    /// 非零元值切片
    #[inline]
    pub fn values(&self) -> &[S] {
        &self.values
    }

    /// (row, col) 处的值，模式外返回零
    pub fn get(&self, row: usize, col: usize) -> S {
        match self.pattern.find_index(row, col) {
            Some(idx) => self.values[idx],
            None => S::ZERO,
        }
    }

    /// 第 row 行的 (列索引, 值) 视图
    pub fn row(&self, row: usize) -> RowView<'_, S> {
        let start = self.pattern.row_ptr[row];
        let end = self.pattern.row_ptr[row + 1];
        RowView {
            col_idx: &self.pattern.col_idx[start..end],
            values: &self.values[start..end],
        }
    }

    /// 对角元值
    pub fn diagonal_value(&self, row: usize) -> Option<S> {
        self.pattern.find_index(row, row).map(|idx| self.values[idx])
    }

    /// 提取对角线（缺失处补零）
    pub fn extract_diagonal(&self) -> Vec<S> {
        (0..self.n_rows())
            .map(|i| self.diagonal_value(i).unwrap_or(S::ZERO))
            .collect()
    }

    /// 对角元存储位置缓存
    ///
    /// 返回向量第 i 项为第 i 行对角元在 `values` 中的索引，
    /// 该行无对角元时为 None。
    pub fn build_diagonal_cache(&self) -> Vec<Option<usize>> {
        (0..self.n_rows())
            .map(|i| self.pattern.find_index(i, i))
            .collect()
    }

    /// 矩阵-向量乘 y = A·x
    pub fn mul_vec(&self, x: &[S], y: &mut [S]) {
        assert_eq!(x.len(), self.n_cols());
        assert_eq!(y.len(), self.n_rows());

        for row in 0..self.n_rows() {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];
            let mut sum = S::ZERO;
            for idx in start..end {
                sum += self.values[idx] * x[self.pattern.col_idx[idx]];
            }
            y[row] = sum;
        }
    }

    /// 无穷范数（行绝对值和最大值）
    pub fn infinity_norm(&self) -> S {
        let mut max_row_sum = S::ZERO;
        for row in 0..self.n_rows() {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];
            let row_sum: S = self.values[start..end].iter().map(|v| v.abs()).sum();
            max_row_sum = max_row_sum.max(row_sum);
        }
        max_row_sum
    }
}

/// 行视图
pub struct RowView<'a, S: Scalar> {
    col_idx: &'a [usize],
    values: &'a [S],
}

impl<'a, S: Scalar> RowView<'a, S> {
    /// 行内非零元数量
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 迭代 (列索引, 值)
    pub fn iter(&self) -> impl Iterator<Item = (usize, S)> + 'a {
        self.col_idx
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

/// CSR 矩阵构建器
///
/// 每行一个有序映射（列 → 值），`build` 时压缩为 CSR。
pub struct CsrBuilder<S: Scalar> {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<BTreeMap<usize, S>>,
}

impl<S: Scalar> CsrBuilder<S> {
    /// 创建方阵构建器
    pub fn new_square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// 创建构建器
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: vec![BTreeMap::new(); n_rows],
        }
    }

    /// 设置 (row, col) 的值
    pub fn set(&mut self, row: usize, col: usize, value: S) {
        assert!(row < self.n_rows, "行索引越界");
        assert!(col < self.n_cols, "列索引越界");
        self.rows[row].insert(col, value);
    }

    /// 累加到 (row, col)
    pub fn add(&mut self, row: usize, col: usize, value: S) {
        assert!(row < self.n_rows, "行索引越界");
        assert!(col < self.n_cols, "列索引越界");
        *self.rows[row].entry(col).or_insert(S::ZERO) += value;
    }

    /// 读取 (row, col) 当前值
    pub fn get(&self, row: usize, col: usize) -> S {
        self.rows[row].get(&col).copied().unwrap_or(S::ZERO)
    }

    /// 行切片（行所有权并行装配用）
    ///
    /// 调用方保证每行只被一个线程写入，即可对返回切片
    /// `par_iter_mut` 无锁装配。
    pub fn rows_mut(&mut self) -> &mut [BTreeMap<usize, S>] {
        &mut self.rows
    }

    /// 非零元数量
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// 压缩为 CSR 矩阵
    pub fn build(self) -> CsrMatrix<S> {
        let nnz = self.nnz();
        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        row_ptr.push(0);
        for row_map in &self.rows {
            for (&col, &val) in row_map {
                col_idx.push(col);
                values.push(val);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix {
            pattern: CsrPattern {
                n_rows: self.n_rows,
                n_cols: self.n_cols,
                row_ptr,
                col_idx,
            },
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_basic() {
        let mut builder = CsrBuilder::<f64>::new_square(3);
        builder.set(0, 0, 4.0);
        builder.set(0, 1, -1.0);
        builder.set(1, 0, -1.0);
        builder.set(1, 1, 4.0);
        builder.set(1, 2, -1.0);
        builder.set(2, 1, -1.0);
        builder.set(2, 2, 4.0);

        let mat = builder.build();
        assert_eq!(mat.nnz(), 7);
        assert!((mat.get(0, 0) - 4.0).abs() < 1e-14);
        assert!((mat.get(0, 1) + 1.0).abs() < 1e-14);
        assert!(mat.get(0, 2).abs() < 1e-14);
    }

    #[test]
    fn test_add_accumulates() {
        let mut builder = CsrBuilder::<f64>::new_square(2);
        builder.add(0, 0, 1.0);
        builder.add(0, 0, 2.0);
        builder.add(1, 1, -0.5);
        assert!((builder.get(0, 0) - 3.0).abs() < 1e-14);

        let mat = builder.build();
        assert!((mat.get(0, 0) - 3.0).abs() < 1e-14);
        assert!((mat.get(1, 1) + 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_mul_vec() {
        // 三对角
        let mut builder = CsrBuilder::<f64>::new_square(3);
        builder.set(0, 0, 2.0);
        builder.set(0, 1, -1.0);
        builder.set(1, 0, -1.0);
        builder.set(1, 1, 2.0);
        builder.set(1, 2, -1.0);
        builder.set(2, 1, -1.0);
        builder.set(2, 2, 2.0);

        let mat = builder.build();
        let x = vec![1.0, 2.0, 3.0];
        let mut y = vec![0.0; 3];
        mat.mul_vec(&x, &mut y);

        assert!(y[0].abs() < 1e-14);
        assert!(y[1].abs() < 1e-14);
        assert!((y[2] - 4.0).abs() < 1e-14);
    }

    #[test]
    fn test_row_view() {
        let mut builder = CsrBuilder::<f64>::new_square(3);
        builder.set(1, 0, 1.0);
        builder.set(1, 2, 3.0);
        builder.set(1, 1, 2.0);

        let mat = builder.build();
        let entries: Vec<_> = mat.row(1).iter().collect();
        // BTreeMap 保证列有序
        assert_eq!(entries, vec![(0, 1.0), (1, 2.0), (2, 3.0)]);
        assert_eq!(mat.row(0).nnz(), 0);
    }

    #[test]
    fn test_diagonal_cache() {
        let mut builder = CsrBuilder::<f64>::new_square(3);
        builder.set(0, 0, 1.0);
        builder.set(1, 0, 5.0); // 第 1 行无对角元
        builder.set(2, 2, 3.0);

        let mat = builder.build();
        let cache = mat.build_diagonal_cache();
        assert!(cache[0].is_some());
        assert!(cache[1].is_none());
        assert!(cache[2].is_some());
        assert_eq!(mat.extract_diagonal(), vec![1.0, 0.0, 3.0]);
    }

    #[test]
    fn test_rows_mut_assembly() {
        let mut builder = CsrBuilder::<f64>::new_square(4);
        // 模拟行所有权装配：每行独立写入
        for (i, row) in builder.rows_mut().iter_mut().enumerate() {
            *row.entry(i).or_insert(0.0) += 2.0;
            if i + 1 < 4 {
                *row.entry(i + 1).or_insert(0.0) += -1.0;
            }
        }
        let mat = builder.build();
        assert!((mat.get(2, 2) - 2.0).abs() < 1e-14);
        assert!((mat.get(2, 3) + 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_infinity_norm() {
        let mut builder = CsrBuilder::<f64>::new_square(2);
        builder.set(0, 0, -3.0);
        builder.set(0, 1, 1.0);
        builder.set(1, 1, 2.0);
        let mat = builder.build();
        assert!((mat.infinity_norm() - 4.0).abs() < 1e-14);
    }
}
