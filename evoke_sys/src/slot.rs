use core::fmt;
use core::mem;
use core::ptr::NonNull;

use crate::raw::{ArgThunk, PtrThunk, RefThunk, Thunk};

/// erased (target, method, thunk) triple shared by every slot shape
///
/// either all three words are present or the slot holds nothing
struct Binding<F> {
    target: NonNull<()>,
    method: *const (),
    thunk: F,
}

impl<F: Copy> Copy for Binding<F> {}

impl<F: Copy> Clone for Binding<F> {
    fn clone(&self) -> Self {
        *self
    }
}

/// callback slot for methods taking no argument
///
/// the slot never owns its target. `bind` erases the target and method and
/// stores a call thunk monomorphized for the concrete target type, so a
/// binding made through it cannot pair a method with a target of a different
/// type. liveness is still entirely the caller's problem, which is what makes
/// `bind` unsafe.
pub struct RawSlot {
    binding: Option<Binding<Thunk>>,
}

impl RawSlot {
    pub const fn new() -> Self {
        Self { binding: None }
    }

    /// records `(target, method)` as the slot's binding, replacing any prior
    /// binding in a single assignment
    ///
    /// SAFETY:
    ///     1. `target` must point to a live `T` and stay valid, with no other
    ///        reference to it in use during the call, for every later
    ///        `invoke` until the slot is rebound or dropped
    ///     2. the slot never drops the target, the caller keeps ownership
    pub unsafe fn bind<T>(&mut self, target: NonNull<T>, method: fn(&mut T)) {
        self.binding = Some(Binding {
            target: target.cast(),
            method: method as *const (),
            thunk: __detail_call::<T>,
        });
    }

    /// stores pre-erased parts without any pairing check
    ///
    /// SAFETY:
    ///     1. everything `bind` requires of `target`
    ///     2. `thunk` must restore `target` and `method` to the exact
    ///        concrete types they were erased from. pairing a thunk or
    ///        method built for one type with a target of another is accepted
    ///        silently here and is undefined behavior at the next `invoke`,
    ///        never at bind time
    pub unsafe fn bind_raw(&mut self, target: NonNull<()>, method: *const (), thunk: Thunk) {
        self.binding = Some(Binding {
            target,
            method,
            thunk,
        });
    }

    /// calls the bound method on the bound target, or does nothing when the
    /// slot was never bound
    pub fn invoke(&mut self) {
        if let Some(binding) = self.binding {
            unsafe { (binding.thunk)(binding.target, binding.method) }
        }
    }

    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

impl fmt::Debug for RawSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSlot")
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// callback slot for methods taking one argument by value
///
/// `invoke` moves the argument into the call, so the callee can never
/// observe a caller-side mutation made after `invoke` returns
pub struct RawArgSlot<P> {
    binding: Option<Binding<ArgThunk<P>>>,
}

impl<P> RawArgSlot<P> {
    pub const fn new() -> Self {
        Self { binding: None }
    }

    /// SAFETY: see [`RawSlot::bind`]
    pub unsafe fn bind<T>(&mut self, target: NonNull<T>, method: fn(&mut T, P)) {
        self.binding = Some(Binding {
            target: target.cast(),
            method: method as *const (),
            thunk: __detail_call_arg::<T, P>,
        });
    }

    /// SAFETY: see [`RawSlot::bind_raw`]
    pub unsafe fn bind_raw(&mut self, target: NonNull<()>, method: *const (), thunk: ArgThunk<P>) {
        self.binding = Some(Binding {
            target,
            method,
            thunk,
        });
    }

    pub fn invoke(&mut self, value: P) {
        if let Some(binding) = self.binding {
            unsafe { (binding.thunk)(binding.target, binding.method, value) }
        }
    }

    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

/// callback slot for methods taking one argument by mutable reference
///
/// `invoke` passes the caller's storage straight through, so a mutation made
/// by the callee is visible to the caller as soon as `invoke` returns
pub struct RawRefSlot<P> {
    binding: Option<Binding<RefThunk<P>>>,
}

impl<P> RawRefSlot<P> {
    pub const fn new() -> Self {
        Self { binding: None }
    }

    /// SAFETY: see [`RawSlot::bind`]
    pub unsafe fn bind<T>(&mut self, target: NonNull<T>, method: fn(&mut T, &mut P)) {
        self.binding = Some(Binding {
            target: target.cast(),
            method: method as *const (),
            thunk: __detail_call_ref::<T, P>,
        });
    }

    /// SAFETY: see [`RawSlot::bind_raw`]
    pub unsafe fn bind_raw(&mut self, target: NonNull<()>, method: *const (), thunk: RefThunk<P>) {
        self.binding = Some(Binding {
            target,
            method,
            thunk,
        });
    }

    pub fn invoke(&mut self, value: &mut P) {
        if let Some(binding) = self.binding {
            unsafe { (binding.thunk)(binding.target, binding.method, value) }
        }
    }

    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

/// callback slot for methods taking one argument by raw pointer
///
/// the pointer goes through unchanged, null included. the slot never
/// dereferences it, a bound handler that does is on its own
pub struct RawPtrSlot<P> {
    binding: Option<Binding<PtrThunk<P>>>,
}

impl<P> RawPtrSlot<P> {
    pub const fn new() -> Self {
        Self { binding: None }
    }

    /// SAFETY: see [`RawSlot::bind`]
    pub unsafe fn bind<T>(&mut self, target: NonNull<T>, method: fn(&mut T, *mut P)) {
        self.binding = Some(Binding {
            target: target.cast(),
            method: method as *const (),
            thunk: __detail_call_ptr::<T, P>,
        });
    }

    /// SAFETY: see [`RawSlot::bind_raw`]
    pub unsafe fn bind_raw(&mut self, target: NonNull<()>, method: *const (), thunk: PtrThunk<P>) {
        self.binding = Some(Binding {
            target,
            method,
            thunk,
        });
    }

    pub fn invoke(&mut self, value: *mut P) {
        if let Some(binding) = self.binding {
            unsafe { (binding.thunk)(binding.target, binding.method, value) }
        }
    }

    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

unsafe fn __detail_call<T>(target: NonNull<()>, method: *const ()) {
    let method: fn(&mut T) = mem::transmute(method);
    method(&mut *(target.as_ptr() as *mut T));
}

unsafe fn __detail_call_arg<T, P>(target: NonNull<()>, method: *const (), value: P) {
    let method: fn(&mut T, P) = mem::transmute(method);
    method(&mut *(target.as_ptr() as *mut T), value);
}

unsafe fn __detail_call_ref<T, P>(target: NonNull<()>, method: *const (), value: &mut P) {
    let method: fn(&mut T, &mut P) = mem::transmute(method);
    method(&mut *(target.as_ptr() as *mut T), value);
}

unsafe fn __detail_call_ptr<T, P>(target: NonNull<()>, method: *const (), value: *mut P) {
    let method: fn(&mut T, *mut P) = mem::transmute(method);
    method(&mut *(target.as_ptr() as *mut T), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::ptr;

    #[derive(Default)]
    struct Counter {
        count: u32,
        seen: u32,
        saw_null: bool,
    }

    impl Counter {
        fn bump(&mut self) {
            self.count += 1;
        }

        fn observe(&mut self, value: u32) {
            self.seen = value;
        }

        fn double_in_place(&mut self, value: &mut u32) {
            *value *= 2;
        }

        fn record_null(&mut self, value: *mut u32) {
            self.saw_null = value.is_null();
        }

        fn write_through(&mut self, value: *mut u32) {
            if !value.is_null() {
                unsafe { *value = 7 };
            }
        }
    }

    #[test]
    fn empty_slots_invoke_as_noops() {
        RawSlot::new().invoke();

        RawArgSlot::<u32>::new().invoke(3);

        let mut value = 5u32;
        RawRefSlot::new().invoke(&mut value);
        assert_eq!(value, 5);

        RawPtrSlot::<u32>::new().invoke(ptr::null_mut());
    }

    #[test]
    fn invoke_hits_the_bound_method_every_time() {
        let mut counter = Counter::default();
        let mut slot = RawSlot::new();
        assert!(!slot.is_bound());

        unsafe { slot.bind(NonNull::from(&mut counter), Counter::bump) };
        assert!(slot.is_bound());

        slot.invoke();
        slot.invoke();
        slot.invoke();
        assert_eq!(counter.count, 3);
    }

    #[test]
    fn rebinding_fully_replaces_the_old_binding() {
        let mut first = Counter::default();
        let mut second = Counter::default();
        let mut slot = RawSlot::new();

        unsafe { slot.bind(NonNull::from(&mut first), Counter::bump) };
        slot.invoke();

        unsafe { slot.bind(NonNull::from(&mut second), Counter::bump) };
        slot.invoke();
        slot.invoke();

        assert_eq!(first.count, 1);
        assert_eq!(second.count, 2);
    }

    #[test]
    fn value_argument_is_copied_into_the_call() {
        let mut counter = Counter::default();
        let mut slot = RawArgSlot::new();
        unsafe { slot.bind(NonNull::from(&mut counter), Counter::observe) };

        let mut value = 41u32;
        slot.invoke(value);
        value += 1;

        assert_eq!(counter.seen, 41);
        assert_eq!(value, 42);
    }

    #[test]
    fn reference_argument_mutation_is_visible_to_the_caller() {
        let mut counter = Counter::default();
        let mut slot = RawRefSlot::new();
        unsafe { slot.bind(NonNull::from(&mut counter), Counter::double_in_place) };

        let mut value = 5u32;
        slot.invoke(&mut value);
        assert_eq!(value, 10);
    }

    #[test]
    fn null_pointer_reaches_the_callee_unsubstituted() {
        let mut counter = Counter::default();
        let mut slot = RawPtrSlot::new();
        unsafe { slot.bind(NonNull::from(&mut counter), Counter::record_null) };

        slot.invoke(ptr::null_mut());
        assert!(counter.saw_null);
    }

    #[test]
    fn pointer_argument_passes_through_to_the_callee() {
        let mut counter = Counter::default();
        let mut slot = RawPtrSlot::new();
        unsafe { slot.bind(NonNull::from(&mut counter), Counter::write_through) };

        let mut value = 0u32;
        slot.invoke(&mut value as *mut u32);
        assert_eq!(value, 7);
    }

    unsafe fn trampoline(target: NonNull<()>, method: *const ()) {
        let method: fn(&mut Counter) = mem::transmute(method);
        method(&mut *(target.as_ptr() as *mut Counter));
    }

    #[test]
    fn bind_raw_dispatches_through_a_hand_written_thunk() {
        let mut counter = Counter::default();
        let mut slot = RawSlot::new();

        unsafe {
            slot.bind_raw(
                NonNull::from(&mut counter).cast(),
                Counter::bump as fn(&mut Counter) as *const (),
                trampoline,
            );
        }

        slot.invoke();
        assert_eq!(counter.count, 1);
    }
}
