#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod fmt;

use device::Device;

pub mod device;
pub mod mac;
pub mod radio;

#[cfg(test)]
pub(crate) mod mock;

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Error<D>
where
    D: Device,
{
    Device(device::Error<D>),
    Mac(mac::Error),
}
