//! 空闲动画状态
//!
//! Cool Gauge 在 `[0, 99]` 之间往复：0, 1, …, 99, 98, …, 0, 1, …
//! 只在到达边界时反向。状态由动画线程独占。

/// 动画下界
pub const GAUGE_MIN: u16 = 0;
/// 动画上界
pub const GAUGE_MAX: u16 = 99;

/// 运动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// 动画状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    value: u16,
    direction: Direction,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationState {
    /// 从 0 开始向上
    pub fn new() -> Self {
        Self {
            value: GAUGE_MIN,
            direction: Direction::Up,
        }
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// 前进一步，返回新值
    pub fn advance(&mut self) -> u16 {
        self.value = match self.direction {
            Direction::Up => self.value + 1,
            Direction::Down => self.value - 1,
        };
        if self.value == GAUGE_MAX {
            self.direction = Direction::Down;
        }
        if self.value == GAUGE_MIN {
            self.direction = Direction::Up;
        }
        self.value
    }

    /// 从当前值开始的无限序列（当前值在前）
    pub fn iter(mut self) -> impl Iterator<Item = u16> {
        std::iter::once(self.value).chain(std::iter::from_fn(move || Some(self.advance())))
    }
}
