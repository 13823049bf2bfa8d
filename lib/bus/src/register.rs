/*++

Licensed under the Apache-2.0 license.

File Name:

    register.rs

Abstract:

    File contains implementation of the 32-bit register types used by
    peripherals.

--*/

use crate::BusError;
use aes_emu_types::{RvData, RvSize};
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::InMemoryRegister;
use tock_registers::RegisterLongName;

/// A 32-bit register reachable through a peripheral's bus dispatch.
pub trait Register {
    /// Read data of specified size from the register
    ///
    /// # Error
    ///
    /// * `BusError` - Exception with cause `BusError::LoadAccessFault`
    fn read(&self, size: RvSize) -> Result<RvData, BusError>;

    /// Write data of specified size to the register
    ///
    /// # Error
    ///
    /// * `BusError` - Exception with cause `BusError::StoreAccessFault`
    fn write(&mut self, size: RvSize, val: RvData) -> Result<(), BusError>;
}

/// Read Write Register
pub struct ReadWriteRegister<R: RegisterLongName = ()> {
    /// Register
    pub reg: InMemoryRegister<u32, R>,
}

impl<R: RegisterLongName> ReadWriteRegister<R> {
    /// Create an instance of Read Write Register
    pub fn new(val: u32) -> Self {
        Self {
            reg: InMemoryRegister::new(val),
        }
    }
}

impl<R: RegisterLongName> Register for ReadWriteRegister<R> {
    /// Read data of specified size from the register
    fn read(&self, size: RvSize) -> Result<RvData, BusError> {
        if size != RvSize::Word {
            Err(BusError::LoadAccessFault)?
        }

        Ok(self.reg.get())
    }

    /// Write data of specified size to the register
    fn write(&mut self, size: RvSize, val: RvData) -> Result<(), BusError> {
        if size != RvSize::Word {
            Err(BusError::StoreAccessFault)?
        }

        self.reg.set(val);

        Ok(())
    }
}

/// Read Only Register
pub struct ReadOnlyRegister<R: RegisterLongName = ()> {
    /// Register
    pub reg: InMemoryRegister<u32, R>,
}

impl<R: RegisterLongName> ReadOnlyRegister<R> {
    /// Create an instance of Read Only Register
    pub fn new(val: u32) -> Self {
        Self {
            reg: InMemoryRegister::new(val),
        }
    }
}

impl<R: RegisterLongName> Register for ReadOnlyRegister<R> {
    /// Read data of specified size from the register
    fn read(&self, size: RvSize) -> Result<RvData, BusError> {
        if size != RvSize::Word {
            Err(BusError::LoadAccessFault)?
        }

        Ok(self.reg.get())
    }

    /// Write data of specified size to the register
    fn write(&mut self, _size: RvSize, _val: RvData) -> Result<(), BusError> {
        Err(BusError::StoreAccessFault)
    }
}

/// Write Only Register
pub struct WriteOnlyRegister<R: RegisterLongName = ()> {
    pub reg: InMemoryRegister<u32, R>,
}

impl<R: RegisterLongName> WriteOnlyRegister<R> {
    /// Create an instance of Write Only Register
    pub fn new(val: u32) -> Self {
        Self {
            reg: InMemoryRegister::new(val),
        }
    }
}

impl<R: RegisterLongName> Register for WriteOnlyRegister<R> {
    /// Read data of specified size from the register
    fn read(&self, _size: RvSize) -> Result<RvData, BusError> {
        Err(BusError::LoadAccessFault)
    }

    /// Write data of specified size to the register
    fn write(&mut self, size: RvSize, val: RvData) -> Result<(), BusError> {
        if size != RvSize::Word {
            Err(BusError::StoreAccessFault)?
        }

        self.reg.set(val);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_reg() {
        let mut reg = ReadWriteRegister::<()>::new(0);

        assert_eq!(reg.read(RvSize::Word).ok(), Some(0));
        assert_eq!(reg.write(RvSize::Word, u32::MAX).ok(), Some(()));
        assert_eq!(reg.read(RvSize::Word).ok(), Some(u32::MAX));

        assert_eq!(
            reg.read(RvSize::Byte).err(),
            Some(BusError::LoadAccessFault)
        );
        assert_eq!(
            reg.read(RvSize::HalfWord).err(),
            Some(BusError::LoadAccessFault)
        );
        assert_eq!(
            reg.write(RvSize::Byte, 0xFF).err(),
            Some(BusError::StoreAccessFault)
        );
        assert_eq!(
            reg.write(RvSize::HalfWord, 0xFF).err(),
            Some(BusError::StoreAccessFault)
        );
    }

    #[test]
    fn test_readonly_reg() {
        let mut reg = ReadOnlyRegister::<()>::new(u32::MAX);

        assert_eq!(reg.read(RvSize::Word).ok(), Some(u32::MAX));

        assert_eq!(
            reg.read(RvSize::Byte).err(),
            Some(BusError::LoadAccessFault)
        );
        assert_eq!(
            reg.write(RvSize::Word, 0xFF).err(),
            Some(BusError::StoreAccessFault)
        );
    }

    #[test]
    fn test_writeonly_reg() {
        let mut reg = WriteOnlyRegister::<()>::new(0);

        assert_eq!(reg.write(RvSize::Word, u32::MAX).ok(), Some(()));
        assert_eq!(reg.reg.get(), u32::MAX);

        assert_eq!(
            reg.read(RvSize::Word).err(),
            Some(BusError::LoadAccessFault)
        );
        assert_eq!(
            reg.write(RvSize::Byte, 0xFF).err(),
            Some(BusError::StoreAccessFault)
        );
    }
}
