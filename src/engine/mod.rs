//! Pomodoro timer engine

pub mod timer_engine;

pub use timer_engine::{TimerEngine, TICK_PERIOD};
