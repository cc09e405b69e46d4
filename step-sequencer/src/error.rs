//! # Error 模块
//!
//! 定义序列器的错误类型。
//!
//! 唯一的硬错误是 `jump_to` 的越界目标；越过边界的导航和
//! 动画收敛期间的导航都是定义良好的静默空操作，不是错误。

use thiserror::Error;

/// 序列器错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    /// 步骤索引越界
    #[error("步骤索引 {target} 超出范围，有效范围是 0..={max}")]
    StepOutOfRange { target: usize, max: usize },
}

/// Result 类型别名
pub type SequencerResult<T> = Result<T, SequencerError>;
