/*++

Licensed under the Apache-2.0 license.

File Name:

    clock.rs

Abstract:

    File contains Clock and Timer types, used to implement timer-based
    deferred execution for peripherals.

--*/

use std::{
    cell::{Cell, RefCell},
    collections::BTreeSet,
    rc::Rc,
};

use crate::Bus;

/// Peripherals that want to use timer-based deferred execution will typically
/// store a `Timer` inside themselves, and use it to schedule future
/// notification via [`Bus::poll`].
///
/// # Example
///
/// ```
/// use aes_emu_bus::{Bus, BusError, Timer, ActionHandle};
/// use aes_emu_types::{RvAddr, RvData, RvSize};
/// struct MyPeriph {
///     timer: Timer,
///     action0: Option<ActionHandle>,
/// }
/// impl Bus for MyPeriph {
///     fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
///         Ok(0)
///     }
///     fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
///         // If a timer action was previously scheduled, cancel it
///         if let Some(action0) = self.action0.take() {
///             self.timer.cancel(action0);
///         }
///         // Request that Bus::poll be called in 1000 clock cycles, storing
///         // a reference to the timer action in self.action0.
///         self.action0 = Some(self.timer.schedule_poll_in(1000));
///         Ok(())
///     }
///     fn poll(&mut self) {
///         if self.timer.fired(&mut self.action0) {
///             println!("It is 1000 clock cycles after the last write to MyPeriph.")
///         }
///     }
/// }
/// ```
#[derive(Clone)]
pub struct Timer {
    clock: Rc<ClockImpl>,
}
impl Timer {
    /// Constructs a new timer bound to the specified clock.
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: Rc::clone(&clock.clock),
        }
    }

    /// Returns the current time: the number of clock cycles that have elapsed
    /// since simulation start.
    #[inline]
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// If the scheduled time for `action` has come, `action` will be set to
    /// None and the function will return true. Otherwise (or if action is
    /// None), the function will return false.
    pub fn fired(&self, action: &mut Option<ActionHandle>) -> bool {
        let has_fired = match action {
            Some(handle) => self.clock.now() >= handle.time,
            None => false,
        };
        if has_fired {
            *action = None;
        }
        has_fired
    }

    /// Schedules a future call to [`Bus::poll()`] at `time`, and returns an
    /// `ActionHandle` that can be used with [`Timer::cancel`] or
    /// [`Timer::fired`].
    pub fn schedule_poll_at(&self, time: u64) -> ActionHandle {
        self.clock.schedule_poll_at(time)
    }

    /// Schedules a future call to [`Bus::poll()`] at `self.now() + time`, and
    /// returns an `ActionHandle` that can be used with [`Timer::cancel`] or
    /// [`Timer::fired`].
    pub fn schedule_poll_in(&self, ticks_from_now: u64) -> ActionHandle {
        self.schedule_poll_at(self.now() + ticks_from_now)
    }

    /// Cancels a previously scheduled poll action.
    pub fn cancel(&self, handle: ActionHandle) {
        self.clock.cancel(handle)
    }
}

pub struct Clock {
    clock: Rc<ClockImpl>,
}
impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
impl Clock {
    /// Constructs a new Clock with the cycle counter set to 0.
    pub fn new() -> Clock {
        Self {
            clock: ClockImpl::new(),
        }
    }

    /// Constructs a `Timer` associated with this clock.
    pub fn timer(&self) -> Timer {
        Timer::new(self)
    }

    /// Returns the number of simulated clock cycles that have elapsed since
    /// simulation start.
    #[inline]
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Increments the clock by `delta`, and returns true if any scheduled
    /// poll actions fired.
    #[inline]
    pub fn increment(&self, delta: u64) -> bool {
        self.clock.increment(delta)
    }

    /// Increments the clock by `delta`, and polls the bus if any scheduled
    /// poll actions fired. Returns true if the bus was polled.
    #[inline]
    pub fn increment_and_poll(&self, delta: u64, bus: &mut impl Bus) -> bool {
        let fired = self.increment(delta);
        if fired {
            bus.poll();
        }
        fired
    }
}

/// Represents a poll action scheduled with a `Timer`. Returned by
/// [`Timer::schedule_poll_at`] and passed to [`Timer::fired`] or
/// [`Timer::cancel`].
pub struct ActionHandle {
    /// The time the action is supposed to fire.
    time: u64,

    /// An ID assigned by the clock, used to disambiguate actions scheduled
    /// for the same cycle.
    id: u64,
}

struct ClockImpl {
    now: Cell<u64>,
    next_action_id: Cell<u64>,
    pending_actions: RefCell<BTreeSet<(u64, u64)>>,
}
impl ClockImpl {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            now: Cell::new(0),
            next_action_id: Cell::new(0),
            pending_actions: RefCell::new(BTreeSet::new()),
        })
    }

    #[inline]
    fn now(&self) -> u64 {
        self.now.get()
    }

    fn increment(&self, delta: u64) -> bool {
        let now = self
            .now
            .get()
            .checked_add(delta)
            .expect("simulation clock overflowed");
        self.now.set(now);

        let mut pending = self.pending_actions.borrow_mut();
        let mut fired = false;
        while let Some(&entry) = pending.iter().next() {
            if entry.0 > now {
                break;
            }
            pending.remove(&entry);
            fired = true;
        }
        fired
    }

    fn schedule_poll_at(&self, time: u64) -> ActionHandle {
        let id = self.next_action_id.get();
        self.next_action_id.set(id.wrapping_add(1));
        self.pending_actions.borrow_mut().insert((time, id));
        ActionHandle { time, id }
    }

    fn cancel(&self, handle: ActionHandle) {
        self.pending_actions
            .borrow_mut()
            .remove(&(handle.time, handle.id));
    }
}
