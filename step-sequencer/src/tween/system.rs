//! # TweenSystem 模块
//!
//! 补间引擎管理器。
//!
//! 持有所有补间实例，每帧由宿主调用 `update(dt)` 统一推进。
//! 补间通过 `TweenHandle`（弱引用句柄）操作：
//!
//! ```rust,ignore
//! let system = TweenSystem::new();
//! let tween = system.tween(TweenVars::with_duration(1.0), None);
//! tween.on(TweenEvent::Complete, || println!("done"));
//! system.update(dt); // 宿主帧循环
//! ```
//!
//! ## 事件派发
//!
//! 观察者回调在内部借用释放之后才被调用，回调内可以自由
//! 再进入系统（创建补间、订阅事件、操作其他句柄）。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::annotation::Annotation;
use super::core::{Tween, TweenId, TweenVars};
use super::target::StageTarget;
use super::TweenEvent;

/// 观察者订阅 ID，用于退订
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// 单个观察者
struct Subscriber {
    id: SubscriberId,
    /// 触发一次后自动退订
    once: bool,
    callback: Rc<dyn Fn()>,
}

/// 补间系统内部状态
struct SystemInner {
    /// 所有补间（完成后不移除，以便重播）
    tweens: HashMap<TweenId, Tween>,
    /// 观察者（(补间, 事件) -> 订阅列表）
    observers: HashMap<(TweenId, TweenEvent), Vec<Subscriber>>,
    /// 下一个补间 ID
    next_tween_id: u64,
    /// 下一个订阅 ID
    next_subscriber_id: u64,
}

impl SystemInner {
    fn next_tween_id(&mut self) -> TweenId {
        let id = TweenId::new(self.next_tween_id);
        self.next_tween_id += 1;
        id
    }

    fn next_subscriber_id(&mut self) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber_id);
        self.next_subscriber_id += 1;
        id
    }
}

/// 补间系统
///
/// 可克隆句柄，内部共享同一份状态。单线程协作模型：
/// 宿主拥有帧循环并调用 `update(dt)`，完成回调在 `update`
/// 内同步触发。
#[derive(Clone)]
pub struct TweenSystem {
    inner: Rc<RefCell<SystemInner>>,
}

impl Default for TweenSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TweenSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TweenSystem")
            .field("tweens", &inner.tweens.len())
            .finish()
    }
}

impl TweenSystem {
    /// 创建新的补间系统
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SystemInner {
                tweens: HashMap::new(),
                observers: HashMap::new(),
                next_tween_id: 1,
                next_subscriber_id: 1,
            })),
        }
    }

    /// 创建新的补间并返回句柄
    ///
    /// 新补间处于未暂停状态，下一次 `update` 即开始播放。
    ///
    /// # 参数
    /// - `vars`: 补间参数
    /// - `target`: 驱动的场景目标，`None` 表示纯时间轴补间
    pub fn tween(&self, vars: TweenVars, target: Option<Rc<dyn StageTarget>>) -> TweenHandle {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_tween_id();
        let tween = Tween::new_internal(id, vars, target);
        inner.tweens.insert(id, tween);

        TweenHandle {
            inner: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// 推进所有补间
    ///
    /// 观察者回调在内部借用释放后同步触发。
    pub fn update(&self, dt: f32) {
        let fired: Vec<(TweenId, TweenEvent)> = {
            let mut inner = self.inner.borrow_mut();

            // 按创建顺序推进，保证事件派发顺序确定
            let mut ids: Vec<TweenId> = inner.tweens.keys().copied().collect();
            ids.sort_by_key(|id| id.0);

            let mut fired = Vec::new();
            for id in ids {
                if let Some(tween) = inner.tweens.get_mut(&id) {
                    for event in tween.update(dt) {
                        fired.push((id, event));
                    }
                }
            }
            fired
        };

        dispatch(&self.inner, &fired);
    }

    /// 是否有未暂停的补间
    pub fn has_active(&self) -> bool {
        self.inner.borrow().tweens.values().any(|t| !t.paused())
    }

    /// 未暂停的补间数量
    pub fn active_count(&self) -> usize {
        self.inner
            .borrow()
            .tweens
            .values()
            .filter(|t| !t.paused())
            .count()
    }

    /// 补间总数
    pub fn tween_count(&self) -> usize {
        self.inner.borrow().tweens.len()
    }
}

/// 派发事件给观察者
///
/// 回调的 `Rc` 在借用内克隆出来，借用释放后才调用，
/// 回调可以自由再进入系统。
fn dispatch(inner: &Rc<RefCell<SystemInner>>, fired: &[(TweenId, TweenEvent)]) {
    for (id, event) in fired {
        let callbacks: Vec<Rc<dyn Fn()>> = {
            let mut guard = inner.borrow_mut();
            match guard.observers.get_mut(&(*id, *event)) {
                Some(subscribers) => {
                    let callbacks = subscribers
                        .iter()
                        .map(|s| s.callback.clone())
                        .collect();
                    subscribers.retain(|s| !s.once);
                    callbacks
                }
                None => Vec::new(),
            }
        };

        for callback in callbacks {
            callback();
        }
    }
}

/// 补间句柄
///
/// 持有系统的弱引用，系统销毁后所有操作静默降级：
/// 写操作不生效，读操作返回中性值。
#[derive(Clone)]
pub struct TweenHandle {
    inner: Weak<RefCell<SystemInner>>,
    id: TweenId,
}

impl std::fmt::Debug for TweenHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TweenHandle").field("id", &self.id).finish()
    }
}

impl TweenHandle {
    /// 补间 ID
    pub fn id(&self) -> TweenId {
        self.id
    }

    /// 系统是否仍然存活
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// 在补间上执行操作，系统或补间不存在时返回默认值
    fn with_tween<R>(&self, default: R, f: impl FnOnce(&mut Tween) -> R) -> R {
        match self.inner.upgrade() {
            Some(rc) => {
                let mut guard = rc.borrow_mut();
                match guard.tweens.get_mut(&self.id) {
                    Some(tween) => f(tween),
                    None => default,
                }
            }
            None => default,
        }
    }

    /// 执行会触发事件的操作，并在借用释放后派发事件
    fn with_tween_dispatch(&self, f: impl FnOnce(&mut Tween) -> Vec<TweenEvent>) {
        let Some(rc) = self.inner.upgrade() else {
            return;
        };
        let fired: Vec<(TweenId, TweenEvent)> = {
            let mut guard = rc.borrow_mut();
            match guard.tweens.get_mut(&self.id) {
                Some(tween) => f(tween).into_iter().map(|e| (self.id, e)).collect(),
                None => Vec::new(),
            }
        };
        dispatch(&rc, &fired);
    }

    // ========== 播放控制 ==========

    /// 暂停，冻结在当前进度
    pub fn pause(&self) {
        self.with_tween((), |t| t.pause());
    }

    /// 恢复播放，保持当前方向
    pub fn resume(&self) {
        self.with_tween((), |t| t.resume());
    }

    /// 正向播放（若正在反向则翻转回正向）
    pub fn play(&self) {
        self.with_tween((), |t| t.play());
    }

    /// 反向播放
    pub fn reverse(&self) {
        self.with_tween((), |t| t.reverse());
    }

    /// 从头开始正向播放
    pub fn restart(&self, include_delay: bool) {
        self.with_tween((), |t| t.restart(include_delay));
    }

    /// 直接设置总进度（跳转），终点跳转会触发完成事件
    pub fn set_total_progress(&self, progress: f32) {
        self.with_tween_dispatch(|t| t.set_total_progress(progress));
    }

    /// 设置播放速率（带符号，负值表示反向）
    pub fn set_time_scale(&self, factor: f32) {
        self.with_tween((), |t| t.set_time_scale(factor));
    }

    // ========== 查询 ==========

    /// 含延迟的总进度 (0.0 - 1.0)
    pub fn total_progress(&self) -> f32 {
        self.with_tween(0.0, |t| t.total_progress())
    }

    /// 是否反向播放
    pub fn reversed(&self) -> bool {
        self.with_tween(false, |t| t.reversed())
    }

    /// 扣除延迟后的有效播放时间
    pub fn time(&self) -> f32 {
        self.with_tween(0.0, |t| t.time())
    }

    /// 动画时长（不含延迟）
    pub fn duration(&self) -> f32 {
        self.with_tween(0.0, |t| t.duration())
    }

    /// 总时长（不含延迟，无重复播放时与 `duration` 相同）
    pub fn total_duration(&self) -> f32 {
        self.with_tween(0.0, |t| t.total_duration())
    }

    /// 延迟（秒）
    pub fn delay(&self) -> f32 {
        self.with_tween(0.0, |t| t.delay())
    }

    /// 当前播放速率（带符号）
    pub fn time_scale(&self) -> f32 {
        self.with_tween(1.0, |t| t.time_scale())
    }

    /// 是否暂停
    pub fn paused(&self) -> bool {
        self.with_tween(true, |t| t.paused())
    }

    // ========== 观察者 ==========

    /// 订阅生命周期事件
    ///
    /// 同一事件可以有多个订阅者，按订阅顺序触发。
    /// 返回的 ID 可用于 `off` 退订；系统已销毁时返回 `None`。
    pub fn on(&self, event: TweenEvent, callback: impl Fn() + 'static) -> Option<SubscriberId> {
        self.subscribe(event, callback, false)
    }

    /// 订阅生命周期事件，触发一次后自动退订
    pub fn once(&self, event: TweenEvent, callback: impl Fn() + 'static) -> Option<SubscriberId> {
        self.subscribe(event, callback, true)
    }

    fn subscribe(
        &self,
        event: TweenEvent,
        callback: impl Fn() + 'static,
        once: bool,
    ) -> Option<SubscriberId> {
        let rc = self.inner.upgrade()?;
        let mut guard = rc.borrow_mut();
        let id = guard.next_subscriber_id();
        guard
            .observers
            .entry((self.id, event))
            .or_default()
            .push(Subscriber {
                id,
                once,
                callback: Rc::new(callback),
            });
        Some(id)
    }

    /// 退订
    pub fn off(&self, event: TweenEvent, subscriber: SubscriberId) {
        if let Some(rc) = self.inner.upgrade() {
            let mut guard = rc.borrow_mut();
            if let Some(subscribers) = guard.observers.get_mut(&(self.id, event)) {
                subscribers.retain(|s| s.id != subscriber);
            }
        }
    }

    // ========== 旁路记录 ==========

    /// 读取旁路记录的副本
    pub fn annotation(&self) -> Annotation {
        self.with_tween(Annotation::default(), |t| t.annotation)
    }

    /// 以读-改-写方式更新旁路记录
    ///
    /// 闭包只修改自己关心的字段，其余字段保持不变。
    pub fn with_annotation(&self, f: impl FnOnce(&mut Annotation)) {
        self.with_tween((), |t| f(&mut t.annotation));
    }
}
