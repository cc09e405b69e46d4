//! # Tween 核心模块
//!
//! 单个补间实例的时间轴状态机。
//!
//! 核心设计：补间只关注 f32 值随时间的变化，通过 `StageTarget`
//! 接口写出插值结果，不假设对象类型。
//!
//! ## 时间模型
//!
//! - `total_time` 在 `[0, delay + duration]` 内移动
//! - `time_scale` 为带符号的播放速率，负值表示反向播放
//! - `total_progress` 是包含延迟在内的总进度 (0.0 - 1.0)
//! - `time` 是扣除延迟后的有效播放时间 (0.0 - duration)

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::annotation::Annotation;
use super::easing::EasingFunction;
use super::target::StageTarget;
use super::TweenEvent;

/// 补间 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenId(pub u64);

impl TweenId {
    /// 创建新的补间 ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TweenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TweenId({})", self.0)
    }
}

/// 补间创建参数
///
/// 支持 serde，步骤的动画参数可以从数据文件中声明。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenVars {
    /// 起始值
    pub from: f32,
    /// 目标值
    pub to: f32,
    /// 动画时长（秒）
    pub duration: f32,
    /// 延迟启动（秒）
    pub delay: f32,
    /// 缓动函数
    pub easing: EasingFunction,
}

impl Default for TweenVars {
    fn default() -> Self {
        Self {
            from: 0.0,
            to: 1.0,
            duration: 0.5,
            delay: 0.0,
            easing: EasingFunction::default(),
        }
    }
}

impl TweenVars {
    /// 创建指定时长的参数，其余使用默认值
    pub fn with_duration(duration: f32) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    /// 设置延迟
    pub fn delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// 设置缓动函数
    pub fn easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    /// 设置取值范围
    pub fn range(mut self, from: f32, to: f32) -> Self {
        self.from = from;
        self.to = to;
        self
    }
}

/// 单个补间实例
///
/// 管理 `total_time` 在 `[0, delay + duration]` 内的双向移动，
/// 并把插值结果写到可选的场景目标上。
pub struct Tween {
    /// 补间 ID
    id: TweenId,
    /// 起始值
    from: f32,
    /// 目标值
    to: f32,
    /// 动画时长（秒，不含延迟）
    duration: f32,
    /// 延迟启动（秒）
    delay: f32,
    /// 缓动函数
    easing: EasingFunction,
    /// 驱动的场景目标（可选，进度补间没有目标）
    target: Option<Rc<dyn StageTarget>>,
    /// 当前总时间（含延迟），范围 [0, delay + duration]
    total_time: f32,
    /// 带符号的播放速率，负值表示反向
    time_scale: f32,
    /// 是否暂停
    paused: bool,
    /// 正向播放是否已越过延迟（用于 Start 事件去重）
    started: bool,
    /// 旁路记录
    pub annotation: Annotation,
}

impl std::fmt::Debug for Tween {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("id", &self.id)
            .field("total_time", &self.total_time)
            .field("time_scale", &self.time_scale)
            .field("paused", &self.paused)
            .finish()
    }
}

impl Tween {
    /// 创建新的补间（仅供 TweenSystem 内部使用）
    pub(crate) fn new_internal(
        id: TweenId,
        vars: TweenVars,
        target: Option<Rc<dyn StageTarget>>,
    ) -> Self {
        Self {
            id,
            from: vars.from,
            to: vars.to,
            duration: vars.duration.max(0.0),
            delay: vars.delay.max(0.0),
            easing: vars.easing,
            target,
            total_time: 0.0,
            time_scale: 1.0,
            paused: false,
            started: false,
            annotation: Annotation::default(),
        }
    }

    /// 补间 ID
    pub fn id(&self) -> TweenId {
        self.id
    }

    /// 动画时长（秒，不含延迟）
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// 总时长（秒，不含延迟；本引擎没有重复播放，与 `duration` 相同）
    pub fn total_duration(&self) -> f32 {
        self.duration
    }

    /// 延迟（秒）
    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// 扣除延迟后的有效播放时间 (0.0 - duration)
    pub fn time(&self) -> f32 {
        (self.total_time - self.delay).clamp(0.0, self.duration)
    }

    /// 是否反向播放
    pub fn reversed(&self) -> bool {
        self.time_scale < 0.0
    }

    /// 当前播放速率（带符号）
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// 设置播放速率（带符号，负值表示反向）
    pub fn set_time_scale(&mut self, factor: f32) {
        self.time_scale = factor;
    }

    /// 是否暂停
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// 含延迟的总进度 (0.0 - 1.0)
    pub fn total_progress(&self) -> f32 {
        let full = self.delay + self.duration;
        if full <= 0.0 {
            return 1.0;
        }
        (self.total_time / full).clamp(0.0, 1.0)
    }

    /// 暂停，冻结在当前进度
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// 恢复播放，保持当前方向
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// 正向播放
    ///
    /// 若正处于反向播放，将方向翻转回正向并继续；速率大小保留。
    pub fn play(&mut self) {
        self.time_scale = self.time_scale.abs();
        self.paused = false;
    }

    /// 反向播放
    pub fn reverse(&mut self) {
        self.time_scale = -self.time_scale.abs();
        self.paused = false;
    }

    /// 从头开始正向播放
    ///
    /// # 参数
    /// - `include_delay`: true 时重新等待延迟，false 时跳过延迟立即生效
    pub fn restart(&mut self, include_delay: bool) {
        self.total_time = if include_delay { 0.0 } else { self.delay };
        self.time_scale = self.time_scale.abs();
        self.paused = false;
        self.started = false;
        self.apply_value();
    }

    /// 更新补间
    ///
    /// # 返回
    /// 本次更新触发的生命周期事件，按发生顺序排列
    pub fn update(&mut self, dt: f32) -> Vec<TweenEvent> {
        if self.paused || dt <= 0.0 {
            return Vec::new();
        }

        let full = self.delay + self.duration;
        if full <= 0.0 {
            // 零时长补间：首次更新即完成
            self.paused = true;
            self.started = true;
            self.apply_value();
            return vec![TweenEvent::Update, TweenEvent::Complete];
        }

        let before = self.total_time;
        self.total_time = (before + dt * self.time_scale).clamp(0.0, full);

        if self.total_time == before {
            // 已停在边界上，不重复触发事件
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.time_scale >= 0.0 {
            if !self.started && self.total_time > self.delay {
                self.started = true;
                events.push(TweenEvent::Start);
            }
            events.push(TweenEvent::Update);
            if self.total_time >= full {
                self.paused = true;
                events.push(TweenEvent::Complete);
            }
        } else {
            events.push(TweenEvent::Update);
            if self.total_time <= 0.0 {
                self.paused = true;
                self.started = false;
                events.push(TweenEvent::ReverseComplete);
            }
        }

        self.apply_value();
        events
    }

    /// 直接设置总进度（跳转）
    ///
    /// 跳转到终点会触发对应的完成事件：正向终点触发 `Complete`，
    /// 反向状态下跳转到起点触发 `ReverseComplete`。
    pub fn set_total_progress(&mut self, progress: f32) -> Vec<TweenEvent> {
        let full = self.delay + self.duration;
        let progress = progress.clamp(0.0, 1.0);
        self.total_time = progress * full;
        self.apply_value();

        let mut events = vec![TweenEvent::Update];
        if progress >= 1.0 {
            self.paused = true;
            self.started = true;
            events.push(TweenEvent::Complete);
        } else if progress <= 0.0 && self.reversed() {
            self.paused = true;
            self.started = false;
            events.push(TweenEvent::ReverseComplete);
        }
        events
    }

    /// 把插值结果写到场景目标
    fn apply_value(&self) {
        let Some(target) = &self.target else {
            return;
        };
        let raw = if self.duration <= 0.0 {
            1.0
        } else {
            self.time() / self.duration
        };
        let eased = self.easing.apply(raw);
        target.set_value(self.from + (self.to - self.from) * eased);
    }
}
