// core/src/model/mod.rs

//! Records and payloads that flow through checkout and reconciliation.

pub mod address;
pub mod line_item;
pub mod order;
pub mod payment;

pub use address::Address;
pub use line_item::{CartLine, OrderLineItem};
pub use order::{NewOrder, Order, OrderPatch, PaymentStatus};
pub use payment::{PaymentReceipt, PaymentRequest};
