//! Wire notation and command parsing.
//!
//! Implements the order-text notation consumed by the resolution gateway
//! and the line-command parser for the driver binary's control surface.

pub mod command;
pub mod order_text;

pub use command::{parse_command, Command};
pub use order_text::{
    compile_orders, holds_order, parse_order, validate_order, OrderCommand, OrderLine,
    OrderTextError,
};
