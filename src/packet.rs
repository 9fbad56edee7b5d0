//! The packet module, containing definitions for segment structures and related enums.
//! packet 模块，包含分段结构和相关枚举的定义。
//!
//! Encoding segments to and from the wire is handled elsewhere; these types
//! only carry the fields the sending core reads and fills in.

pub mod command;
pub mod segment;
