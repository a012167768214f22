#![cfg_attr(not(feature = "std"), no_std)]

use core::{alloc::Layout, ptr::NonNull};
use spin::Mutex;

static LOST: Mutex<Option<Lost>> = Mutex::new(None);

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
use std::alloc as allocator;

#[cfg(not(feature = "std"))]
use alloc::alloc as allocator;

/// owning erased handler storage
/// defines one vtable and one handle per argument shape
pub mod erased;

/// raw layout info and the erased calling conventions
pub mod raw;

/// non-owning callback slots
/// each slot pairs one target object with one method on it, invocable later
/// without static knowledge of the target's type
pub mod slot;

/// registers the process wide lost-target hook
/// the hook fires whenever a checked binding finds its target already dropped
pub fn register_lost_hook<T>(hook: T)
where
    T: LostHook,
{
    let mut guard = LOST.lock();
    *guard = vtable_for(hook);
}

/// fires the lost-target hook with the type name of the dropped target
/// falls back to `DefaultLostHook` when nothing is registered
pub fn notify_lost(target: &str) {
    let lock = LOST.lock();
    match &*lock {
        Some(ref lock) => unsafe { (lock.vtable.on_lost)(lock.data.as_ptr(), target) },
        None => {
            #[cfg(all(feature = "std", feature = "default_impls"))]
            DefaultLostHook.on_lost(target);
        }
    }
}

/// the lost-target hook trait.
/// this gets called whenever a checked slot realizes its target is gone
pub trait LostHook: Send + Sync {
    fn on_lost(&self, target: &str);
}

/// lost-target hook glue
struct LostHookVtable {
    on_lost: unsafe fn(*const (), target: &str),
    drop: unsafe fn(*mut ()),
    layout: &'static raw::DataLayout,
}

/// lost-target hook glue
struct Lost {
    data: NonNull<()>,
    vtable: &'static LostHookVtable,
}

// SAFETY: LostHook requires Send and Sync of every implementor
unsafe impl Send for Lost {}
unsafe impl Sync for Lost {}

impl Drop for Lost {
    fn drop(&mut self) {
        unsafe {
            (self.vtable.drop)(self.data.as_ptr());
            if self.vtable.layout.size != 0 {
                allocator::dealloc(self.data.as_ptr() as *mut u8, self.vtable.layout.layout());
            }
        }
    }
}

/// main function to create a `Lost` struct.
/// this takes a hook and creates a vtable based on it.
fn vtable_for<T>(hook: T) -> Option<Lost>
where
    T: LostHook,
{
    let layout = Layout::new::<T>();
    let ptr = if layout.size() == 0 {
        NonNull::<T>::dangling().as_ptr()
    } else {
        unsafe { allocator::alloc(layout) as *mut T }
    };

    let ptr = NonNull::new(ptr)?;
    unsafe { ptr.as_ptr().write(hook) };

    Some(Lost {
        data: ptr.cast(),
        vtable: &LostHookVtable {
            on_lost: __detail_on_lost::<T>,
            drop: raw::__detail_drop::<T>,
            layout: &raw::DataLayout {
                size: core::mem::size_of::<T>(),
                align: core::mem::align_of::<T>(),
            },
        },
    })
}

/// NOTE: any function that starts with `__detail` is an internal function
unsafe fn __detail_on_lost<T>(data: *const (), target: &str)
where
    T: LostHook,
{
    T::on_lost(&*(data as *const T), target);
}

/// default lost-target hook
/// all it does is print the dropped target's type name to the standard output
#[cfg(all(feature = "std", feature = "default_impls"))]
pub struct DefaultLostHook;

#[cfg(all(feature = "std", feature = "default_impls"))]
impl LostHook for DefaultLostHook {
    fn on_lost(&self, target: &str) {
        println!("lost callback target: {target}");
    }
}
