//! Cart Store: lines, quantities, the active coupon and derived totals.

mod pricing;
mod reducer;
mod types;

pub use pricing::{cart_total, discount, subtotal, CartTotals, SERVICE_FEE_PERCENT};
pub use reducer::{CartAction, CartEnvironment, CartReducer, CartState};
pub use types::{CartItem, Direction, EventSnapshot, MerchandiseSelection};
