//! # 导航集成测试
//!
//! 测试 Sequencer → TweenSystem → StageTarget 的完整链路：
//! 带装饰的场景过渡在前进/后退/跳转下的端到端行为。
//! 帧循环用固定帧长模拟，不依赖真实的渲染设备。

use std::cell::RefCell;
use std::rc::Rc;

use step_sequencer::{
    create_transition, DecorVars, DrawFn, Sequencer, SequencerOptions, SimpleTarget, StageTarget,
    TweenSystem, TweenVars,
};

/// 按固定帧长推进补间引擎
fn tick(system: &TweenSystem, total: f32, frame: f32) {
    let mut elapsed = 0.0;
    while elapsed < total {
        system.update(frame);
        elapsed += frame;
    }
}

/// 一个三步演示场景：
/// - 步骤 0：标题入场（反向回起点时隐藏）
/// - 步骤 1：图表入场，同时标题离场（正向到终点时隐藏）
/// - 步骤 2：结语入场
struct Scene {
    system: TweenSystem,
    seq: Sequencer,
    title: SimpleTarget,
    chart: SimpleTarget,
    outro: SimpleTarget,
}

fn build_scene(options: SequencerOptions) -> Scene {
    let system = TweenSystem::new();
    let title = SimpleTarget::new(0.0);
    let chart = SimpleTarget::new(0.0);
    let outro = SimpleTarget::new(0.0);

    let enter = DecorVars {
        auto_hide_on_reverse_complete: true,
        ..DecorVars::default()
    };
    let leave = DecorVars {
        auto_hide_on_complete: true,
        ..DecorVars::default()
    };

    let draw_fns: Vec<DrawFn> = vec![
        {
            let sys = system.clone();
            let title = title.clone();
            let enter = enter.clone();
            Rc::new(move |seq: &Sequencer| {
                seq.push(create_transition(
                    &sys,
                    Rc::new(title.clone()),
                    TweenVars::with_duration(0.5).range(0.0, 1.0),
                    enter.clone(),
                ));
            })
        },
        {
            let sys = system.clone();
            let chart = chart.clone();
            let title = title.clone();
            let enter = enter.clone();
            let leave = leave.clone();
            Rc::new(move |seq: &Sequencer| {
                seq.push(create_transition(
                    &sys,
                    Rc::new(chart.clone()),
                    TweenVars::with_duration(0.5).range(0.0, 100.0),
                    enter.clone(),
                ));
                // 标题淡出
                seq.push(create_transition(
                    &sys,
                    Rc::new(title.clone()),
                    TweenVars::with_duration(0.3).range(1.0, 0.0),
                    leave.clone(),
                ));
            })
        },
        {
            let sys = system.clone();
            let outro = outro.clone();
            let enter = enter.clone();
            Rc::new(move |seq: &Sequencer| {
                seq.push(create_transition(
                    &sys,
                    Rc::new(outro.clone()),
                    TweenVars::with_duration(0.4).delay(0.2),
                    enter.clone(),
                ));
            })
        },
    ];

    let seq = Sequencer::new(system.clone(), draw_fns, options);
    Scene {
        system,
        seq,
        title,
        chart,
        outro,
    }
}

#[test]
fn test_full_forward_walkthrough() {
    let scene = build_scene(SequencerOptions::default());

    // 步骤 0：标题入场
    scene.seq.next();
    tick(&scene.system, 0.6, 0.016);
    assert_eq!(scene.title.value(), 1.0);
    assert!(scene.title.visible());

    // 步骤 1：图表入场，标题离场后隐藏
    scene.seq.next();
    tick(&scene.system, 0.6, 0.016);
    assert_eq!(scene.chart.value(), 100.0);
    assert_eq!(scene.title.value(), 0.0);
    assert!(!scene.title.visible());

    // 步骤 2：结语带延迟入场
    scene.seq.next();
    tick(&scene.system, 0.1, 0.016);
    assert_eq!(scene.outro.value(), 0.0);
    tick(&scene.system, 0.6, 0.016);
    assert_eq!(scene.outro.value(), 1.0);
    assert_eq!(scene.seq.current_step(), Some(2));
}

#[test]
fn test_backward_restores_previous_state() {
    let scene = build_scene(SequencerOptions::default());

    scene.seq.next();
    tick(&scene.system, 0.6, 0.016);
    scene.seq.next();
    tick(&scene.system, 0.6, 0.016);
    assert!(!scene.title.visible());

    // 退回步骤 0：步骤 1 的过渡反向播放
    scene.seq.previous();
    tick(&scene.system, 0.1, 0.016);
    // 标题离场过渡的反向开始立即恢复可见
    assert!(scene.title.visible());

    tick(&scene.system, 0.6, 0.016);
    assert_eq!(scene.chart.value(), 0.0);
    assert!(!scene.chart.visible());
    assert_eq!(scene.title.value(), 1.0);
    assert_eq!(scene.seq.current_step(), Some(0));
}

#[test]
fn test_interrupted_forward_is_reconciled_within_budget() {
    let scene = build_scene(SequencerOptions {
        max_step_delay: 0.1,
        on_progress_update: None,
    });

    scene.seq.next();
    // 标题只播到一半就跳下一步
    tick(&scene.system, 0.25, 0.016);
    assert!(scene.title.value() < 1.0);

    scene.seq.next();
    assert!(scene.seq.is_active());

    // 预算 0.1 秒内标题到位，随后步骤 1 才开始
    tick(&scene.system, 0.15, 0.004);
    assert!(!scene.seq.is_active());
    assert_eq!(scene.title.value(), 1.0);

    tick(&scene.system, 0.6, 0.016);
    assert_eq!(scene.chart.value(), 100.0);
}

#[test]
fn test_jump_to_end_snaps_everything() {
    let scene = build_scene(SequencerOptions::default());

    scene.seq.jump_to(2).unwrap();

    // 不需要推进帧循环，终态立即可见
    assert_eq!(scene.seq.current_step(), Some(2));
    assert_eq!(scene.chart.value(), 100.0);
    assert_eq!(scene.title.value(), 0.0);
    assert!(!scene.title.visible());
    assert_eq!(scene.outro.value(), 1.0);
    assert!(!scene.seq.is_active());
}

#[test]
fn test_jump_back_to_start_snaps_reverse() {
    let scene = build_scene(SequencerOptions::default());

    scene.seq.jump_to(2).unwrap();
    scene.seq.jump_to(0).unwrap();

    assert_eq!(scene.seq.current_step(), Some(0));
    // 步骤 1、2 的过渡反向到位
    assert_eq!(scene.chart.value(), 0.0);
    assert!(!scene.chart.visible());
    assert_eq!(scene.outro.value(), 0.0);
    assert!(!scene.outro.visible());
    // 步骤 0 的标题保持正向终点，离场过渡反向归位后恢复可见
    assert_eq!(scene.title.value(), 1.0);
    assert!(scene.title.visible());
}

#[test]
fn test_jump_out_of_range_is_rejected() {
    let scene = build_scene(SequencerOptions::default());
    scene.seq.next();
    tick(&scene.system, 0.6, 0.016);

    assert!(scene.seq.jump_to(3).is_err());
    // 状态不受影响
    assert_eq!(scene.seq.current_step(), Some(0));
    assert_eq!(scene.title.value(), 1.0);
}

#[test]
fn test_navigation_ignored_while_reconciling() {
    let scene = build_scene(SequencerOptions {
        max_step_delay: 0.2,
        on_progress_update: None,
    });

    scene.seq.next();
    tick(&scene.system, 0.1, 0.016);
    scene.seq.next();
    assert!(scene.seq.is_active());

    // 收敛期间 next/previous/jump_to 全部被忽略
    scene.seq.next();
    scene.seq.previous();
    scene.seq.jump_to(2).unwrap();
    assert_eq!(scene.seq.current_step(), Some(1));

    tick(&scene.system, 0.3, 0.008);
    assert!(!scene.seq.is_active());
    assert_eq!(scene.seq.current_step(), Some(1));
}

#[test]
fn test_progress_reported_across_revisits() {
    let progress: Rc<RefCell<Vec<(f32, bool)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = progress.clone();
    let scene = build_scene(SequencerOptions {
        max_step_delay: 0.3,
        on_progress_update: Some(Rc::new(move |p, reversed| {
            sink.borrow_mut().push((p, reversed));
        })),
    });

    scene.seq.next();
    tick(&scene.system, 0.6, 0.016);
    {
        let forward = progress.borrow();
        assert!(!forward.is_empty());
        assert_eq!(forward.last().unwrap(), &(1.0, false));
    }
    progress.borrow_mut().clear();

    // 进入下一步再退回：被退出步骤的进度反向回报到 0
    scene.seq.next();
    tick(&scene.system, 0.7, 0.016);
    progress.borrow_mut().clear();

    scene.seq.previous();
    tick(&scene.system, 0.7, 0.016);
    let backward = progress.borrow();
    assert!(backward.iter().any(|(_, reversed)| *reversed));
    assert_eq!(backward.last().unwrap(), &(0.0, true));
}

#[test]
fn test_revisit_replays_without_redrawing() {
    let draw_count = Rc::new(RefCell::new([0usize; 3]));
    let system = TweenSystem::new();
    let target = SimpleTarget::new(0.0);

    let draw_fns: Vec<DrawFn> = (0..3)
        .map(|i| {
            let counts = draw_count.clone();
            let sys = system.clone();
            let target = target.clone();
            Rc::new(move |seq: &Sequencer| {
                counts.borrow_mut()[i] += 1;
                seq.push(create_transition(
                    &sys,
                    Rc::new(target.clone()) as Rc<dyn StageTarget>,
                    TweenVars::with_duration(0.3),
                    DecorVars::default(),
                ));
            }) as DrawFn
        })
        .collect();
    let seq = Sequencer::new(system.clone(), draw_fns, SequencerOptions::default());

    seq.next();
    tick(&system, 0.4, 0.016);
    seq.next();
    tick(&system, 0.4, 0.016);
    seq.previous();
    tick(&system, 0.4, 0.016);
    seq.next();
    tick(&system, 0.4, 0.016);

    // 绘制回调每步只执行一次，重访走重播路径
    assert_eq!(*draw_count.borrow(), [1, 1, 0]);
    assert_eq!(system.tween_count(), 2);
}
