//! The sending core and the tick that drives it.
//! 发送核心及驱动它的周期性时钟。

pub mod reliability;
pub mod updater;

#[cfg(test)]
pub mod test_utils;
