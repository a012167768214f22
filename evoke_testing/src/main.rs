use std::ptr::NonNull;
use std::sync::Arc;

use evoke_core::checked::CheckedArg;
use evoke_core::RawSlot;

struct Door {
    open_count: u32,
}

impl Door {
    fn on_button(&mut self) {
        self.open_count += 1;
        println!("door opened {} times", self.open_count);
    }
}

struct Thermostat {
    celsius: f32,
}

impl Thermostat {
    fn set_celsius(&mut self, value: f32) {
        self.celsius = value;
    }
}

fn main() {
    evoke_sys::register_lost_hook(evoke_sys::DefaultLostHook);

    // raw slot wired straight at a stack target
    let mut door = Door { open_count: 0 };
    let mut button = RawSlot::new();
    unsafe { button.bind(NonNull::from(&mut door), Door::on_button) };
    button.invoke();
    button.invoke();

    // checked slot watching a shared target
    let dial = Arc::new(spin::Mutex::new(Thermostat { celsius: 19.0 }));
    let mut nudge = CheckedArg::new();
    nudge.bind(&dial, Thermostat::set_celsius);
    nudge.invoke(21.5);
    println!("thermostat set to {}", dial.lock().celsius);

    // dropping the target trips the lost-target hook instead of crashing
    drop(dial);
    nudge.invoke(25.0);
}
