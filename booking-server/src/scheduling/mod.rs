//! 日程模块 - 时段生成与可用性解析
//!
//! # 结构
//!
//! - [`clock`] - 时间源抽象 (测试可固定 "现在")
//! - [`slots`] - 纯函数时段生成器
//! - [`availability`] - 可用性解析 (封锁/容量/最小提前量)

pub mod availability;
pub mod clock;
pub mod slots;

pub use availability::SchedulingService;
pub use clock::{Clock, SystemClock};
pub use slots::{format_time_display, generate_slots};
