//! # Target 模块
//!
//! 场景目标接口。补间动画通过该接口驱动视觉元素，
//! 序列器核心不假设任何具体的场景图实现。
//!
//! ## 设计说明
//!
//! 使用 `Rc<RefCell<T>>` 模式实现内部可变性：
//! 同一个目标可以被多个补间同时驱动，不违反借用规则。

use std::cell::RefCell;
use std::rc::Rc;

/// 场景目标接口
///
/// 视觉元素实现此 trait 以接入补间引擎与装饰器：
/// - `set_value`: 接收补间插值后的属性值
/// - `set_visible`: 装饰器的自动显隐开关
pub trait StageTarget {
    /// 设置补间驱动的属性值
    fn set_value(&self, value: f32);

    /// 设置可见性
    fn set_visible(&self, visible: bool);
}

/// 简单场景目标实现
///
/// 包装单个 f32 属性与可见性开关，主要用于测试与简单场景。
#[derive(Debug, Clone)]
pub struct SimpleTarget {
    inner: Rc<RefCell<SimpleTargetData>>,
}

#[derive(Debug, Clone)]
struct SimpleTargetData {
    value: f32,
    visible: bool,
}

impl SimpleTarget {
    /// 创建新的目标
    pub fn new(initial_value: f32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SimpleTargetData {
                value: initial_value,
                visible: true,
            })),
        }
    }

    /// 获取当前属性值
    pub fn value(&self) -> f32 {
        self.inner.borrow().value
    }

    /// 获取当前可见性
    pub fn visible(&self) -> bool {
        self.inner.borrow().visible
    }
}

impl Default for SimpleTarget {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl StageTarget for SimpleTarget {
    fn set_value(&self, value: f32) {
        self.inner.borrow_mut().value = value;
    }

    fn set_visible(&self, visible: bool) {
        self.inner.borrow_mut().visible = visible;
    }
}
