//! # Stage 模块
//!
//! 过渡装饰器：把裸补间包装成带可见性语义的场景过渡。
//!
//! 序列器本身只管时间轴，进入/退出步骤时元素的显示与隐藏
//! 由这里的装饰行为补齐：
//!
//! - `auto_hide_on_reverse_complete`: 反向播放回到起点时隐藏
//!   目标，正向越过延迟时重新显示。适合"入场"过渡。
//! - `auto_hide_on_complete`: 正向播放到终点时隐藏目标，
//!   检测到反向播放开始时重新显示。适合"离场"过渡。
//!
//! 反向播放的开始没有独立的生命周期事件，通过比较相邻两次
//! 更新的有效播放时间推断，中间状态记在句柄的旁路记录里。

use std::rc::Rc;

use crate::sequencer::Sequencer;
use crate::tween::{
    ReverseEdge, StageTarget, TweenEvent, TweenHandle, TweenSystem, TweenVars,
};

/// 过渡装饰参数
#[derive(Clone, Default)]
pub struct DecorVars {
    /// 正向完成时隐藏目标，反向开始时重新显示
    pub auto_hide_on_complete: bool,
    /// 反向回到起点时隐藏目标，正向越过延迟时重新显示
    pub auto_hide_on_reverse_complete: bool,
    /// 检测到反向播放开始时触发
    pub on_reverse_start: Option<Rc<dyn Fn()>>,
}

impl std::fmt::Debug for DecorVars {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecorVars")
            .field("auto_hide_on_complete", &self.auto_hide_on_complete)
            .field(
                "auto_hide_on_reverse_complete",
                &self.auto_hide_on_reverse_complete,
            )
            .field(
                "on_reverse_start",
                &self.on_reverse_start.as_ref().map(|_| "…"),
            )
            .finish()
    }
}

/// 创建装饰过的场景过渡
///
/// 根据装饰参数挂接可见性订阅，返回可直接交给
/// [`Sequencer::push`] 的句柄。
pub fn create_transition(
    system: &TweenSystem,
    target: Rc<dyn StageTarget>,
    vars: TweenVars,
    decor: DecorVars,
) -> TweenHandle {
    let tween = system.tween(vars, Some(target.clone()));

    if decor.auto_hide_on_reverse_complete {
        let hide = target.clone();
        tween.on(TweenEvent::ReverseComplete, move || hide.set_visible(false));
        let show = target.clone();
        tween.on(TweenEvent::Start, move || show.set_visible(true));
    }

    if decor.auto_hide_on_complete {
        let hide = target.clone();
        tween.on(TweenEvent::Complete, move || hide.set_visible(false));
    }

    // 反向开始的检测只在有人关心时挂接
    if decor.auto_hide_on_complete || decor.on_reverse_start.is_some() {
        tween.with_annotation(|a| {
            a.reverse_edge = Some(ReverseEdge {
                back: false,
                time: 0.0,
            })
        });

        let on_reverse_start = decor.on_reverse_start.clone();
        let show = decor.auto_hide_on_complete.then(|| target.clone());
        let handle = tween.clone();
        tween.on(TweenEvent::Update, move || {
            let now = handle.time();
            let mut entered_back = false;
            handle.with_annotation(|a| {
                let Some(edge) = &mut a.reverse_edge else {
                    return;
                };
                if !edge.back && now < edge.time {
                    edge.back = true;
                    entered_back = true;
                } else if edge.back && now > edge.time {
                    edge.back = false;
                }
                edge.time = now;
            });

            // 动作在旁路记录的借用释放后触发，回调可再进入系统
            if entered_back {
                if let Some(show) = &show {
                    show.set_visible(true);
                }
                if let Some(callback) = &on_reverse_start {
                    callback();
                }
            }
        });
    }

    tween
}

/// 为一组目标创建同参数的过渡并注册到当前步骤
pub fn push_transitions(
    seq: &Sequencer,
    system: &TweenSystem,
    targets: &[Rc<dyn StageTarget>],
    vars: &TweenVars,
    decor: &DecorVars,
) {
    for target in targets {
        seq.push(create_transition(
            system,
            target.clone(),
            vars.clone(),
            decor.clone(),
        ));
    }
}

/// 为一组目标创建逐个定制的过渡并注册到当前步骤
///
/// 闭包按目标下标返回各自的补间参数与装饰参数，常用于
/// 给同一批元素设置递增延迟。
pub fn push_transitions_with(
    seq: &Sequencer,
    system: &TweenSystem,
    targets: &[Rc<dyn StageTarget>],
    f: impl Fn(usize) -> (TweenVars, DecorVars),
) {
    for (i, target) in targets.iter().enumerate() {
        let (vars, decor) = f(i);
        seq.push(create_transition(system, target.clone(), vars, decor));
    }
}
