//! # Step Sequencer
//!
//! 步骤驱动的过渡序列器核心库。
//!
//! ## 架构概述
//!
//! `step-sequencer` 是纯逻辑核心，不依赖任何 IO 或渲染引擎。
//! 宿主拥有帧循环并驱动补间引擎，序列器把成组的过渡动画
//! 绑定到离散的演示步骤上：
//!
//! ```text
//! Host                          Sequencer
//!   │                              │
//!   │──── next / previous ───────►│
//!   │──── jump_to(step) ─────────►│
//!   │                              │ 收敛 → 绘制 → 播放
//!   │──── system.update(dt) ─────►│
//!   │                              │ 过渡事件、进度回调
//! ```
//!
//! ## 核心类型
//!
//! - [`Sequencer`]：步骤导航状态机
//! - [`TweenSystem`]：补间引擎，宿主每帧调用 `update(dt)`
//! - [`TweenHandle`]：补间的弱引用句柄
//! - [`StageTarget`]：视觉元素接入补间引擎的接口
//! - [`DecorVars`]：过渡装饰参数（进退场自动显隐）
//!
//! ## 使用示例
//!
//! ```ignore
//! use step_sequencer::{
//!     create_transition, DecorVars, Sequencer, SequencerOptions,
//!     SimpleTarget, TweenSystem, TweenVars,
//! };
//! use std::rc::Rc;
//!
//! let system = TweenSystem::new();
//! let title = Rc::new(SimpleTarget::new(0.0));
//!
//! let sys = system.clone();
//! let draw_title = Rc::new(move |seq: &Sequencer| {
//!     seq.push(create_transition(
//!         &sys,
//!         title.clone(),
//!         TweenVars::with_duration(0.6),
//!         DecorVars { auto_hide_on_reverse_complete: true, ..Default::default() },
//!     ));
//! });
//!
//! let seq = Sequencer::new(system.clone(), vec![draw_title], SequencerOptions::default());
//! seq.next();
//!
//! // 宿主帧循环
//! loop {
//!     system.update(frame_dt);
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`tween`]：补间引擎（时间轴、事件、缓动、场景目标）
//! - `sequencer`：步骤导航与收敛算法
//! - `stage`：过渡装饰器
//! - `error`：错误类型

mod error;
mod sequencer;
mod stage;
pub mod tween;

pub use error::{SequencerError, SequencerResult};
pub use sequencer::{DrawFn, ProgressFn, Sequencer, SequencerOptions};
pub use stage::{create_transition, push_transitions, push_transitions_with, DecorVars};

// 常用补间类型在根部重导出，宿主无需深入子模块
pub use tween::{
    EasingFunction, SimpleTarget, StageTarget, TweenEvent, TweenHandle, TweenSystem, TweenVars,
};
