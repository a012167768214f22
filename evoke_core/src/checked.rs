use core::any::type_name;

use alloc::sync::{Arc, Weak};
use spin::Mutex;

use evoke_sys::erased::{
    Erased, ErasedArg, ErasedArgVtable, ErasedPtr, ErasedPtrVtable, ErasedRef, ErasedRefVtable,
    ErasedVtable, Handler,
};

/// pairs a weak target handle with one no-argument method on the target's
/// concrete type
///
/// the checked slots erase one of these instead of the target itself, so the
/// target's lifetime stays with whoever owns the `Arc`
struct WeakBinding<T> {
    target: Weak<Mutex<T>>,
    method: fn(&mut T),
}

impl<T: 'static> WeakBinding<T> {
    const VTABLE: ErasedVtable = unsafe { ErasedVtable::new_for::<Self>(__detail_invoke::<T>) };
}

unsafe impl<T: 'static> Handler for WeakBinding<T> {
    type Erased = Erased;

    fn into_erased(self) -> Erased {
        unsafe { Erased::new(self, &Self::VTABLE) }
    }
}

struct WeakArgBinding<T, P> {
    target: Weak<Mutex<T>>,
    method: fn(&mut T, P),
}

impl<T: 'static, P: 'static> WeakArgBinding<T, P> {
    const VTABLE: ErasedArgVtable<P> =
        unsafe { ErasedArgVtable::new_for::<Self>(__detail_invoke_arg::<T, P>) };
}

unsafe impl<T: 'static, P: 'static> Handler for WeakArgBinding<T, P> {
    type Erased = ErasedArg<P>;

    fn into_erased(self) -> ErasedArg<P> {
        unsafe { ErasedArg::new(self, &Self::VTABLE) }
    }
}

struct WeakRefBinding<T, P> {
    target: Weak<Mutex<T>>,
    method: fn(&mut T, &mut P),
}

impl<T: 'static, P: 'static> WeakRefBinding<T, P> {
    const VTABLE: ErasedRefVtable<P> =
        unsafe { ErasedRefVtable::new_for::<Self>(__detail_invoke_ref::<T, P>) };
}

unsafe impl<T: 'static, P: 'static> Handler for WeakRefBinding<T, P> {
    type Erased = ErasedRef<P>;

    fn into_erased(self) -> ErasedRef<P> {
        unsafe { ErasedRef::new(self, &Self::VTABLE) }
    }
}

struct WeakPtrBinding<T, P> {
    target: Weak<Mutex<T>>,
    method: fn(&mut T, *mut P),
}

impl<T: 'static, P: 'static> WeakPtrBinding<T, P> {
    const VTABLE: ErasedPtrVtable<P> =
        unsafe { ErasedPtrVtable::new_for::<Self>(__detail_invoke_ptr::<T, P>) };
}

unsafe impl<T: 'static, P: 'static> Handler for WeakPtrBinding<T, P> {
    type Erased = ErasedPtr<P>;

    fn into_erased(self) -> ErasedPtr<P> {
        unsafe { ErasedPtr::new(self, &Self::VTABLE) }
    }
}

/// checked callback slot for methods taking no argument
///
/// binding is safe: the slot holds a weak handle to the target and checks it
/// on every invoke. the target's lock is held for the duration of the call.
pub struct Checked {
    binding: Option<Erased>,
}

impl Checked {
    pub const fn new() -> Self {
        Self { binding: None }
    }

    /// records `(target, method)` as the slot's binding, replacing any prior
    /// one. the slot never extends the target's lifetime
    pub fn bind<T>(&mut self, target: &Arc<Mutex<T>>, method: fn(&mut T))
    where
        T: 'static,
    {
        self.binding = Some(
            WeakBinding {
                target: Arc::downgrade(target),
                method,
            }
            .into_erased(),
        );
    }

    /// calls the bound method on the bound target
    ///
    /// returns `false` when the slot is empty or when the target has been
    /// dropped. a dropped target also fires the lost-target hook
    pub fn invoke(&mut self) -> bool {
        match self.binding {
            Some(ref mut binding) => binding.invoke(),
            None => false,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

/// checked callback slot for methods taking one argument by value
pub struct CheckedArg<P: 'static> {
    binding: Option<ErasedArg<P>>,
}

impl<P: 'static> CheckedArg<P> {
    pub const fn new() -> Self {
        Self { binding: None }
    }

    pub fn bind<T>(&mut self, target: &Arc<Mutex<T>>, method: fn(&mut T, P))
    where
        T: 'static,
        P: 'static,
    {
        self.binding = Some(
            WeakArgBinding {
                target: Arc::downgrade(target),
                method,
            }
            .into_erased(),
        );
    }

    pub fn invoke(&mut self, value: P) -> bool {
        match self.binding {
            Some(ref mut binding) => binding.invoke(value),
            None => false,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

/// checked callback slot for methods taking one argument by mutable reference
pub struct CheckedRef<P: 'static> {
    binding: Option<ErasedRef<P>>,
}

impl<P: 'static> CheckedRef<P> {
    pub const fn new() -> Self {
        Self { binding: None }
    }

    pub fn bind<T>(&mut self, target: &Arc<Mutex<T>>, method: fn(&mut T, &mut P))
    where
        T: 'static,
        P: 'static,
    {
        self.binding = Some(
            WeakRefBinding {
                target: Arc::downgrade(target),
                method,
            }
            .into_erased(),
        );
    }

    pub fn invoke(&mut self, value: &mut P) -> bool {
        match self.binding {
            Some(ref mut binding) => binding.invoke(value),
            None => false,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

/// checked callback slot for methods taking one argument by raw pointer
///
/// the pointer still goes through unchanged, null included. checked here
/// refers to the target's liveness, never to the argument
pub struct CheckedPtr<P: 'static> {
    binding: Option<ErasedPtr<P>>,
}

impl<P: 'static> CheckedPtr<P> {
    pub const fn new() -> Self {
        Self { binding: None }
    }

    pub fn bind<T>(&mut self, target: &Arc<Mutex<T>>, method: fn(&mut T, *mut P))
    where
        T: 'static,
        P: 'static,
    {
        self.binding = Some(
            WeakPtrBinding {
                target: Arc::downgrade(target),
                method,
            }
            .into_erased(),
        );
    }

    pub fn invoke(&mut self, value: *mut P) -> bool {
        match self.binding {
            Some(ref mut binding) => binding.invoke(value),
            None => false,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

unsafe fn __detail_invoke<T>(data: *mut ()) -> bool {
    let binding = &*(data as *const WeakBinding<T>);
    match binding.target.upgrade() {
        Some(target) => {
            (binding.method)(&mut *target.lock());
            true
        }
        None => {
            evoke_sys::notify_lost(type_name::<T>());
            false
        }
    }
}

unsafe fn __detail_invoke_arg<T, P>(data: *mut (), value: P) -> bool {
    let binding = &*(data as *const WeakArgBinding<T, P>);
    match binding.target.upgrade() {
        Some(target) => {
            (binding.method)(&mut *target.lock(), value);
            true
        }
        None => {
            evoke_sys::notify_lost(type_name::<T>());
            false
        }
    }
}

unsafe fn __detail_invoke_ref<T, P>(data: *mut (), value: &mut P) -> bool {
    let binding = &*(data as *const WeakRefBinding<T, P>);
    match binding.target.upgrade() {
        Some(target) => {
            (binding.method)(&mut *target.lock(), value);
            true
        }
        None => {
            evoke_sys::notify_lost(type_name::<T>());
            false
        }
    }
}

unsafe fn __detail_invoke_ptr<T, P>(data: *mut (), value: *mut P) -> bool {
    let binding = &*(data as *const WeakPtrBinding<T, P>);
    match binding.target.upgrade() {
        Some(target) => {
            (binding.method)(&mut *target.lock(), value);
            true
        }
        None => {
            evoke_sys::notify_lost(type_name::<T>());
            false
        }
    }
}
