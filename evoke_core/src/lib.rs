#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

/// checked, liveness aware callback slots
pub mod checked;

pub use evoke_sys::slot::{RawArgSlot, RawPtrSlot, RawRefSlot, RawSlot};
pub use evoke_sys::{register_lost_hook, LostHook};
