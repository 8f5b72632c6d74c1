/// Bit positions within the processor status byte.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum CpuFlag {
    Carry,
    Zero,
    InterruptDisable,
    Decimal,
    Break,
    Reserved,
    Overflow,
    Negative
}

impl CpuFlag {
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterState {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    /// `[NV-B DIZC]`. The decimal flag can be set and cleared but has no effect on arithmetic.
    pub status: u8,
}

impl RegisterState {
    pub fn update_a(&mut self, value: u8) {
        self.a = value;
        self.update_nz_flags(self.a);
    }

    pub fn update_x(&mut self, value: u8) {
        self.x = value;
        self.update_nz_flags(self.x);
    }

    pub fn update_nz_flags(&mut self, value: u8) {
        self.set_flag(CpuFlag::Negative, (value as i8).is_negative());
        self.set_flag(CpuFlag::Zero, value == 0);
    }

    pub fn get_flag(&self, flag: CpuFlag) -> bool {
        self.status & flag.mask() != 0
    }

    pub fn set_flag(&mut self, flag: CpuFlag, value: bool) {
        self.status &= !flag.mask();
        self.status |= (value as u8) << flag as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_sit_at_hardware_bit_positions() {
        let positions = [
            (CpuFlag::Carry, 0x01),
            (CpuFlag::Zero, 0x02),
            (CpuFlag::InterruptDisable, 0x04),
            (CpuFlag::Decimal, 0x08),
            (CpuFlag::Break, 0x10),
            (CpuFlag::Reserved, 0x20),
            (CpuFlag::Overflow, 0x40),
            (CpuFlag::Negative, 0x80),
        ];
        for (flag, mask) in positions {
            assert_eq!(flag.mask(), mask, "{:?}", flag);
        }
    }

    #[test]
    fn nz_update_leaves_other_flags_alone() {
        let mut reg = RegisterState {
            status: CpuFlag::Carry.mask() | CpuFlag::Overflow.mask(),
            ..Default::default()
        };
        reg.update_a(0x80);
        assert!(reg.get_flag(CpuFlag::Negative));
        assert!(!reg.get_flag(CpuFlag::Zero));
        assert!(reg.get_flag(CpuFlag::Carry));
        assert!(reg.get_flag(CpuFlag::Overflow));

        reg.update_x(0);
        assert!(!reg.get_flag(CpuFlag::Negative));
        assert!(reg.get_flag(CpuFlag::Zero));
        assert_eq!(reg.x, 0);
    }
}
