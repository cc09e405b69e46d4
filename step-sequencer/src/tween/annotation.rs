//! # Annotation 模块
//!
//! 补间句柄上的旁路记录，供两个互不相关的使用者共享：
//!
//! - `reconcile`：收敛算法（见 sequencer 模块）存放的待完成索引
//! - `reverse_edge`：装饰器的"反向起点"边缘检测状态
//!
//! 两个子字段各自独立可选，使用者只读写自己的字段，
//! 不会覆盖对方的数据。

/// 收敛记录
///
/// 收敛过程为每个未到达终点的补间分配一个唯一索引，
/// 指向本轮收敛的待完成标志位。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileMark {
    /// 在本轮收敛标志位列表中的索引
    pub index: usize,
}

/// 反向边缘检测状态
///
/// 装饰器在每次 `Update` 时比较当前播放时间与上一帧的时间，
/// 时间减小说明播放方向从正向翻转为反向。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverseEdge {
    /// 当前是否处于反向播放
    pub back: bool,
    /// 上一帧观察到的播放时间
    pub time: f32,
}

/// 补间句柄上的旁路记录
///
/// 两个子字段互相独立，更新其中一个不影响另一个。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Annotation {
    /// 收敛算法的簿记
    pub reconcile: Option<ReconcileMark>,
    /// 反向边缘检测的簿记
    pub reverse_edge: Option<ReverseEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_empty() {
        let ann = Annotation::default();
        assert!(ann.reconcile.is_none());
        assert!(ann.reverse_edge.is_none());
    }

    #[test]
    fn test_fields_independent() {
        let mut ann = Annotation::default();

        // 装饰器先写入自己的字段
        ann.reverse_edge = Some(ReverseEdge {
            back: false,
            time: 0.0,
        });

        // 收敛算法写入并清除自己的字段，不影响装饰器的数据
        ann.reconcile = Some(ReconcileMark { index: 3 });
        assert_eq!(ann.reverse_edge.map(|e| e.back), Some(false));

        ann.reconcile = None;
        assert!(ann.reverse_edge.is_some());
    }
}
