/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the AES Engine Emulator Bus library.

--*/

mod bus;
mod clock;
mod register;

pub use crate::bus::{Bus, BusError};
pub use crate::clock::{ActionHandle, Clock, Timer};
pub use crate::register::{
    ReadOnlyRegister, ReadWriteRegister, Register, WriteOnlyRegister,
};
