//! Register-level bus access

use crate::error::Result;

/// Byte-wide register access to a single bus device
pub trait RegisterBus: Send {
    fn write_register(&mut self, register: u8, value: u8) -> Result<()>;

    fn read_register(&mut self, register: u8) -> Result<u8>;

    /// Write consecutive registers (device auto-increment must be enabled)
    fn write_block(&mut self, register: u8, values: &[u8]) -> Result<()> {
        for (offset, value) in values.iter().enumerate() {
            self.write_register(register + offset as u8, *value)?;
        }
        Ok(())
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn write_register(&mut self, register: u8, value: u8) -> Result<()> {
        (**self).write_register(register, value)
    }

    fn read_register(&mut self, register: u8) -> Result<u8> {
        (**self).read_register(register)
    }

    fn write_block(&mut self, register: u8, values: &[u8]) -> Result<()> {
        (**self).write_block(register, values)
    }
}

#[cfg(feature = "hardware")]
pub use linux::LinuxI2cBus;

#[cfg(feature = "hardware")]
mod linux {
    use super::RegisterBus;
    use crate::error::{Error, Result};
    use i2cdev::core::I2CDevice;
    use i2cdev::linux::LinuxI2CDevice;

    /// SMBus register access through `/dev/i2c-*`
    pub struct LinuxI2cBus {
        device: LinuxI2CDevice,
    }

    impl LinuxI2cBus {
        pub fn open(path: &str, address: u16) -> Result<Self> {
            let device = LinuxI2CDevice::new(path, address)
                .map_err(|e| Error::Bus(format!("{} @ {:#04x}: {}", path, address, e)))?;
            Ok(Self { device })
        }
    }

    impl RegisterBus for LinuxI2cBus {
        fn write_register(&mut self, register: u8, value: u8) -> Result<()> {
            self.device
                .smbus_write_byte_data(register, value)
                .map_err(|e| Error::Bus(format!("write {:#04x}: {}", register, e)))
        }

        fn read_register(&mut self, register: u8) -> Result<u8> {
            self.device
                .smbus_read_byte_data(register)
                .map_err(|e| Error::Bus(format!("read {:#04x}: {}", register, e)))
        }

        fn write_block(&mut self, register: u8, values: &[u8]) -> Result<()> {
            self.device
                .smbus_write_i2c_block_data(register, values)
                .map_err(|e| Error::Bus(format!("block write {:#04x}: {}", register, e)))
        }
    }
}
