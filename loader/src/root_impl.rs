// src/root_impl.rs

//! Identifies the root solution reported by the daemon.

use crate::constants::ProcessFlags;

/// The root solution currently active on the device.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootImpl {
    #[default]
    None,
    Magisk,
    KernelSU,
    APatch,
}

impl RootImpl {
    /// Picks the root implementation out of a flags word.
    ///
    /// Only one root bit should be set, but if several are, APatch wins over
    /// KernelSU, which wins over Magisk.
    pub fn from_flags(flags: ProcessFlags) -> Self {
        if flags.contains(ProcessFlags::PROCESS_ROOT_IS_APATCH) {
            RootImpl::APatch
        } else if flags.contains(ProcessFlags::PROCESS_ROOT_IS_KSU) {
            RootImpl::KernelSU
        } else if flags.contains(ProcessFlags::PROCESS_ROOT_IS_MAGISK) {
            RootImpl::Magisk
        } else {
            RootImpl::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bits: u32) -> RootImpl {
        RootImpl::from_flags(ProcessFlags::from_bits_retain(bits))
    }

    #[test]
    fn single_bits() {
        assert_eq!(decode(1 << 27), RootImpl::APatch);
        assert_eq!(decode(1 << 29), RootImpl::KernelSU);
        assert_eq!(decode(1 << 30), RootImpl::Magisk);
        assert_eq!(decode(0), RootImpl::None);
    }

    #[test]
    fn unrelated_bits_are_ignored() {
        let bits = ProcessFlags::PROCESS_GRANTED_ROOT
            | ProcessFlags::PROCESS_IS_MANAGER
            | ProcessFlags::PROCESS_IS_FIRST_STARTED;
        assert_eq!(RootImpl::from_flags(bits), RootImpl::None);
    }

    #[test]
    fn conflicting_bits_follow_priority() {
        assert_eq!(decode((1 << 27) | (1 << 29) | (1 << 30)), RootImpl::APatch);
        assert_eq!(decode((1 << 27) | (1 << 30)), RootImpl::APatch);
        assert_eq!(decode((1 << 29) | (1 << 30)), RootImpl::KernelSU);
    }
}
