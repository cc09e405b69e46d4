//! # Sequencer 模块
//!
//! 步骤序列器：把成组的过渡动画绑定到离散的演示步骤上，
//! 驱动步骤间的前进/后退导航。
//!
//! ## 执行模型
//!
//! - 每个步骤有一个绘制回调，首次正向到达时执行且只执行一次
//! - 绘制回调内通过 [`Sequencer::push`] 注册本步骤的过渡
//! - 进入步骤时过渡正向播放，退出步骤时反向播放
//! - 跳步时仍在播放的过渡先在预算时间内加速收敛，再继续导航
//!
//! ## 导航状态机
//!
//! 状态为 `None`（未开始）或 `Some(0..N-1)`。`next`/`previous`
//! 每次原子地移动 ±1，`jump_to` 分解为重复的 ±1 移动。
//! 收敛尚未结束（存在未结算的待完成标志位）时，所有导航
//! 原语都是静默空操作。

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{SequencerError, SequencerResult};
use crate::tween::{ReconcileMark, TweenEvent, TweenHandle, TweenSystem, TweenVars};

/// 步骤绘制回调
///
/// 回调收到序列器自身的引用，可以同步调用 `push` 注册过渡。
pub type DrawFn = Rc<dyn Fn(&Sequencer)>;

/// 进度回调：(含延迟的总进度 0.0 - 1.0, 是否反向播放)
pub type ProgressFn = Rc<dyn Fn(f32, bool)>;

/// 序列器配置
#[derive(Clone)]
pub struct SequencerOptions {
    /// 收敛预算（秒）：跳步时遗留的过渡必须在这段时间内完成
    pub max_step_delay: f32,
    /// 可选的进度回调，跟踪当前步骤最长过渡的播放进度
    pub on_progress_update: Option<ProgressFn>,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            max_step_delay: 0.3,
            on_progress_update: None,
        }
    }
}

impl std::fmt::Debug for SequencerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequencerOptions")
            .field("max_step_delay", &self.max_step_delay)
            .field(
                "on_progress_update",
                &self.on_progress_update.as_ref().map(|_| "…"),
            )
            .finish()
    }
}

/// 序列器内部状态
struct SequencerInner {
    /// 注入的补间引擎
    system: TweenSystem,
    /// 每步的绘制回调，数量在构造时固定
    draw_fns: Vec<DrawFn>,
    /// 收敛预算（秒），快速跳转期间临时压为 0
    max_step_delay: f32,
    /// 进度回调
    on_progress_update: Option<ProgressFn>,
    /// 当前步骤，`None` 表示尚未开始导航
    step: Option<usize>,
    /// 已执行过绘制回调的步骤
    visited: Vec<bool>,
    /// 每步注册的过渡，注册顺序有意义
    transitions: Vec<Vec<TweenHandle>>,
    /// 当前收敛轮次的待完成标志位，每轮重建
    pending: Rc<RefCell<Vec<bool>>>,
}

/// 步骤序列器
///
/// 可克隆句柄，内部共享同一份状态，绘制回调因此可以
/// 同步地重入 `push`。补间引擎在构造时显式注入。
#[derive(Clone)]
pub struct Sequencer {
    inner: Rc<RefCell<SequencerInner>>,
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Sequencer")
            .field("step", &inner.step)
            .field("steps", &inner.draw_fns.len())
            .finish()
    }
}

impl Sequencer {
    /// 创建新的序列器
    ///
    /// # 参数
    /// - `system`: 补间引擎
    /// - `draw_fns`: 每步一个绘制回调，决定步骤数量 N
    /// - `options`: 收敛预算与进度回调
    pub fn new(system: TweenSystem, draw_fns: Vec<DrawFn>, options: SequencerOptions) -> Self {
        let count = draw_fns.len();
        Self {
            inner: Rc::new(RefCell::new(SequencerInner {
                system,
                draw_fns,
                max_step_delay: options.max_step_delay.max(0.0),
                on_progress_update: options.on_progress_update,
                step: None,
                visited: vec![false; count],
                transitions: vec![Vec::new(); count],
                pending: Rc::new(RefCell::new(Vec::new())),
            })),
        }
    }

    // ========== 查询 ==========

    /// 步骤数量
    pub fn step_count(&self) -> usize {
        self.inner.borrow().draw_fns.len()
    }

    /// 当前步骤，`None` 表示尚未开始导航
    pub fn current_step(&self) -> Option<usize> {
        self.inner.borrow().step
    }

    /// 是否有收敛轮次尚未结束
    ///
    /// 活跃期间所有导航原语都是静默空操作。
    pub fn is_active(&self) -> bool {
        let inner = self.inner.borrow();
        let pending = inner.pending.borrow();
        !(pending.is_empty() || pending.iter().all(|resolved| *resolved))
    }

    // ========== 过渡注册 ==========

    /// 注册一个过渡到当前步骤
    ///
    /// 过渡被立即暂停，冻结在当前进度。只有当前步骤尚未被
    /// 访问过时才会登记；重复访问时的注册被静默丢弃，以保持
    /// "绘制一次"的语义。
    pub fn push(&self, transition: TweenHandle) {
        transition.pause();

        let mut inner = self.inner.borrow_mut();
        let Some(step) = inner.step else {
            trace!("导航开始前注册的过渡被忽略");
            return;
        };
        if !inner.visited[step] {
            inner.transitions[step].push(transition);
        }
    }

    // ========== 导航原语 ==========

    /// 前进一步
    ///
    /// 已在最后一步或收敛进行中时为空操作。先收敛新步骤身后
    /// 一步遗留的过渡，再执行绘制回调（仅首次）并正向播放
    /// 本步骤的全部过渡。
    pub fn next(&self) {
        if self.is_active() {
            return;
        }

        let new_step = {
            let mut inner = self.inner.borrow_mut();
            let new_step = match inner.step {
                None => 0,
                Some(step) => step + 1,
            };
            if new_step >= inner.draw_fns.len() {
                return;
            }
            inner.step = Some(new_step);
            new_step
        };
        debug!(step = new_step, "进入下一步");

        let seq = self.clone();
        let on_ended: Rc<dyn Fn()> = Rc::new(move || seq.enter_current_step(new_step));
        if new_step == 0 {
            // 第 0 步身后没有过渡需要收敛
            on_ended();
        } else {
            let budget = self.inner.borrow().max_step_delay;
            self.end_all_transitions(new_step - 1, budget, on_ended);
        }
    }

    /// 后退一步
    ///
    /// 已在第 0 步（或尚未开始）或收敛进行中时为空操作。
    /// 先收敛新步骤前方两步遗留的过渡，再反向播放被退出
    /// 步骤的全部过渡。
    pub fn previous(&self) {
        if self.is_active() {
            return;
        }

        let (new_step, count) = {
            let mut inner = self.inner.borrow_mut();
            let Some(step) = inner.step else {
                return;
            };
            if step == 0 {
                return;
            }
            let new_step = step - 1;
            inner.step = Some(new_step);
            (new_step, inner.draw_fns.len())
        };
        debug!(step = new_step, "返回上一步");

        let seq = self.clone();
        let on_ended: Rc<dyn Fn()> = Rc::new(move || seq.play_reversed_transitions(new_step + 1));
        if new_step + 2 >= count {
            // 倒数第二步前方没有更远的过渡需要收敛
            on_ended();
        } else {
            let budget = self.inner.borrow().max_step_delay;
            self.end_all_transitions(new_step + 2, budget, on_ended);
        }
    }

    /// 跳转到指定步骤
    ///
    /// # 错误
    /// 目标越界时返回 [`SequencerError::StepOutOfRange`]，
    /// 不修改任何状态。
    ///
    /// 收敛进行中时调用被忽略（调用方稍后重试）。相邻步骤
    /// 委托给 `next`/`previous`；更远的目标执行快速跳转：
    /// 收敛预算临时压为 0，沿途步骤的绘制回调照常执行（保留
    /// 副作用），所有过渡瞬间到位而不是播放动画。
    pub fn jump_to(&self, target: usize) -> SequencerResult<()> {
        let count = self.step_count();
        if target >= count {
            return Err(SequencerError::StepOutOfRange {
                target,
                max: count.saturating_sub(1),
            });
        }

        if self.is_active() {
            debug!(target = target, "过渡收敛中，跳转被忽略");
            return Ok(());
        }

        let current: isize = self.current_step().map_or(-1, |s| s as isize);
        let diff = current - target as isize;
        if diff == 0 {
            return Ok(());
        }

        let back = diff > 0;
        if diff.abs() == 1 {
            if back {
                self.previous();
            } else {
                self.next();
            }
            return Ok(());
        }

        debug!(from = current, to = target, "快速跳转");

        // 收敛预算临时压为 0：沿途的过渡全部瞬间到位
        let saved_budget = {
            let mut inner = self.inner.borrow_mut();
            let saved = inner.max_step_delay;
            inner.max_step_delay = 0.0;
            saved
        };

        if back {
            while self.current_step() != Some(target) {
                self.previous();
            }
        } else {
            while self.current_step() != Some(target) {
                self.next();
            }
        }

        self.inner.borrow_mut().max_step_delay = saved_budget;

        // 对紧邻跳转路径的一步做最后一次瞬间收敛，丢弃其回调
        let final_step = if back { target + 1 } else { target };
        self.end_all_transitions(final_step, 0.0, Rc::new(|| {}));

        Ok(())
    }

    // ========== 内部流程 ==========

    /// 进入当前步骤：首次访问时执行绘制回调并登记进度补间，
    /// 然后正向播放本步骤的全部过渡
    fn enter_current_step(&self, step: usize) {
        let (unvisited, draw_fn, has_progress) = {
            let inner = self.inner.borrow();
            (
                !inner.visited[step],
                inner.draw_fns[step].clone(),
                inner.on_progress_update.is_some(),
            )
        };

        if unvisited {
            draw_fn(self);
            if has_progress {
                self.push_progress_tween(step);
            }
            self.inner.borrow_mut().visited[step] = true;
        }

        self.play_transitions(step);
    }

    /// 正向播放指定步骤的全部过渡
    fn play_transitions(&self, step: usize) {
        let transitions = self.inner.borrow().transitions[step].clone();
        for transition in &transitions {
            if transition.total_progress() == 0.0 {
                // 从头播放，重新等待延迟
                transition.restart(true);
            } else {
                // 停在中途（例如反向播放被打断），翻转回正向继续
                transition.play();
            }
        }
    }

    /// 反向播放指定步骤的全部过渡
    fn play_reversed_transitions(&self, step: usize) {
        let transitions = self.inner.borrow().transitions[step].clone();
        for transition in &transitions {
            transition.reverse();
        }
    }

    /// 收敛一个步骤的全部过渡：让它们在预算时间内到达终点
    /// （正向为 1，反向为 0），全部到位后调用 `on_ended` 恰好一次
    ///
    /// 预算为 0 时全部瞬间到位，同步完成；完成事件照常触发。
    fn end_all_transitions(&self, step: usize, budget: f32, on_ended: Rc<dyn Fn()>) {
        let transitions = self.inner.borrow().transitions[step].clone();

        if budget <= 0.0 {
            self.inner.borrow_mut().pending = Rc::new(RefCell::new(Vec::new()));
            for transition in &transitions {
                let terminal = if transition.reversed() { 0.0 } else { 1.0 };
                transition.set_total_progress(terminal);
            }
            on_ended();
            return;
        }

        // 先暂停并预构建待完成标志位，再统一加速，
        // 避免加速过程中先完成的过渡干扰尚未登记的过渡
        let flags = Rc::new(RefCell::new(Vec::new()));
        let mut pending_transitions = Vec::new();
        for transition in &transitions {
            transition.pause();
            let terminal = if transition.reversed() { 0.0 } else { 1.0 };
            if transition.total_progress() != terminal {
                let index = flags.borrow().len();
                transition.with_annotation(|a| a.reconcile = Some(ReconcileMark { index }));
                flags.borrow_mut().push(false);
                pending_transitions.push((transition.clone(), index));
            }
        }
        self.inner.borrow_mut().pending = flags.clone();

        if pending_transitions.is_empty() {
            // 全部已在终点：无需加速，同步完成
            on_ended();
            return;
        }

        trace!(
            step = step,
            count = pending_transitions.len(),
            budget = budget,
            "收敛未完成的过渡"
        );

        for (transition, index) in pending_transitions {
            speed_up_transition(&transition, budget);

            let event = if transition.reversed() {
                TweenEvent::ReverseComplete
            } else {
                TweenEvent::Complete
            };
            let handle = transition.clone();
            let flags = flags.clone();
            let on_ended = on_ended.clone();
            transition.once(event, move || {
                // 恢复正常播放速率并清除本轮簿记
                handle.set_time_scale(if handle.reversed() { -1.0 } else { 1.0 });
                handle.with_annotation(|a| a.reconcile = None);

                // 标志位用订阅时捕获的索引结算，旁路记录被
                // 外部清掉也不会卡死本轮收敛
                flags.borrow_mut()[index] = true;
                if flags.borrow().iter().all(|resolved| *resolved) {
                    on_ended();
                }
            });

            transition.resume();
        }

        // 已在终点的过渡原样恢复，不改变速率
        for transition in &transitions {
            let terminal = if transition.reversed() { 0.0 } else { 1.0 };
            if transition.total_progress() == terminal {
                transition.resume();
            }
        }
    }

    /// 登记进度补间：时长取本步骤所有过渡 (总时长 + 延迟) 的
    /// 最大值，每次更新时把自身进度报告给进度回调
    fn push_progress_tween(&self, step: usize) {
        let (system, on_progress, step_duration) = {
            let inner = self.inner.borrow();
            let Some(on_progress) = inner.on_progress_update.clone() else {
                return;
            };
            let transitions = &inner.transitions[step];
            if transitions.is_empty() {
                // 没有过渡就没有可度量的进度
                return;
            }
            let step_duration = transitions
                .iter()
                .map(|t| t.total_duration() + t.delay())
                .fold(0.0_f32, f32::max);
            (inner.system.clone(), on_progress, step_duration)
        };

        let tween = system.tween(
            TweenVars {
                duration: step_duration,
                delay: 0.0,
                ..TweenVars::default()
            },
            None,
        );
        let handle = tween.clone();
        tween.on(TweenEvent::Update, move || {
            on_progress(handle.total_progress(), handle.reversed());
        });
        self.push(tween);
    }
}

/// 必要时加速过渡，使其在预算时间内完成
///
/// 剩余时间不超过预算的过渡保持原速。
fn speed_up_transition(transition: &TweenHandle, budget: f32) {
    let remaining = if transition.reversed() {
        transition.time()
    } else {
        transition.duration() - transition.time()
    };
    if remaining > budget {
        let factor = if transition.reversed() { -1.0 } else { 1.0 };
        transition.set_time_scale(factor * remaining / budget);
    }
}
