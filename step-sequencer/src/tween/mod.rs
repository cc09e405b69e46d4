//! # Tween 模块
//!
//! 补间引擎，负责所有动画句柄的时间轴管理。
//!
//! ## 核心设计理念
//!
//! 补间引擎只负责 **时间轴管理**：
//! - 知道某个值从 from 到 to 需要在 duration 内变化
//! - 支持暂停/恢复/正放/反放/重启/跳转与带符号的播放速率
//! - 不假设对象类型：目标通过 `StageTarget` 接口接收插值结果
//!
//! ## 核心概念
//!
//! - `Tween`: 单个补间实例，管理 f32 值的双向时间变化
//! - `TweenSystem`: 补间系统管理器，宿主每帧调用 `update(dt)`
//! - `TweenHandle`: 弱引用句柄，序列器通过它操作补间
//! - `TweenEvent`: 生命周期事件，通过观察者列表订阅
//! - `Annotation`: 句柄上的旁路记录，收敛算法与装饰器共享

mod annotation;
mod core;
mod easing;
mod system;
mod target;

// 核心类型
pub use annotation::{Annotation, ReconcileMark, ReverseEdge};
pub use core::{Tween, TweenId, TweenVars};
pub use easing::EasingFunction;
pub use system::{SubscriberId, TweenHandle, TweenSystem};

// 场景目标接口
pub use target::{SimpleTarget, StageTarget};

/// 补间生命周期事件
///
/// 观察者回调不携带参数，需要上下文时自行捕获句柄。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenEvent {
    /// 正向播放越过延迟，开始生效
    Start,
    /// 进度发生变化
    Update,
    /// 正向播放到达终点
    Complete,
    /// 反向播放回到起点
    ReverseComplete,
}
