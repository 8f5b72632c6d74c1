use log::trace;
use thiserror::Error;

use crate::reg_state::{CpuFlag, RegisterState};

const RESET_VECTOR: u16 = 0xFFFC;

/// Base cycle cost of each group 1 addressing mode, indexed by `bbb`.
/// Indexed absolute loads pay one more cycle when they cross a page.
const ALU_MODE_CYCLES: [u8; 8] = [6, 3, 2, 4, 5, 4, 4, 4];

pub trait Bus {
    type Error;

    fn read(&mut self, addr: u16) -> Result<u8, Self::Error>;
    fn write(&mut self, addr: u16, value: u8) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum CpuError<E> {
    /// The opcode at `addr` is outside the supported instruction set.
    #[error(
        "illegal opcode {opcode:#04X} at {addr:#06X} (followed by {:#04X} {:#04X})",
        .next[0],
        .next[1]
    )]
    IllegalOpcode {
        addr: u16,
        opcode: u8,
        next: [u8; 2],
    },
    #[error("bus fault: {0}")]
    Bus(E),
}

type CpuResult<T, B> = Result<T, CpuError<<B as Bus>::Error>>;

pub struct Cpu6502<B> {
    pub bus: B,
    pub reg: RegisterState,
    pub sp: u8,
    pub pc: u16,
    /// Cycle cost of the most recently executed instruction.
    pub wait_cycles: u8,
}

impl<B: Bus> Cpu6502<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            reg: RegisterState {
                status: CpuFlag::Reserved.mask() | CpuFlag::InterruptDisable.mask(),
                ..Default::default()
            },
            sp: 0xFD,
            pc: 0,
            wait_cycles: 0,
        }
    }

    /// Loads the program counter from the reset vector.
    pub fn reset(&mut self) -> CpuResult<(), B> {
        self.reg.set_flag(CpuFlag::InterruptDisable, true);
        self.pc = self.read_absolute(RESET_VECTOR)?;
        Ok(())
    }

    pub fn get_flag(&self, flag: CpuFlag) -> bool {
        self.reg.get_flag(flag)
    }

    fn read_byte(&mut self, addr: u16) -> CpuResult<u8, B> {
        self.bus.read(addr).map_err(CpuError::Bus)
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> CpuResult<(), B> {
        self.bus.write(addr, value).map_err(CpuError::Bus)
    }

    fn read_absolute(&mut self, addr: u16) -> CpuResult<u16, B> {
        Ok(u16::from_le_bytes([self.read_byte(addr)?, self.read_byte(addr.wrapping_add(1))?]))
    }

    fn take_byte_at_pc(&mut self) -> CpuResult<u8, B> {
        let byte = self.read_byte(self.pc)?;
        self.pc = self.pc.wrapping_add(1);
        Ok(byte)
    }

    /// #i
    fn take_immediate(&mut self) -> CpuResult<u16, B> {
        let addr = self.pc;
        self.pc = self.pc.wrapping_add(1);
        Ok(addr)
    }

    /// d
    fn take_zero_page(&mut self) -> CpuResult<u8, B> {
        self.take_byte_at_pc()
    }

    /// a
    fn take_absolute(&mut self) -> CpuResult<u16, B> {
        Ok(u16::from_le_bytes([self.take_byte_at_pc()?, self.take_byte_at_pc()?]))
    }

    /// (a)
    ///
    /// The pointer's high byte is fetched without carrying into the page, so
    /// `JMP ($10FF)` reads its target from `$10FF` and `$1000`.
    fn take_indirect(&mut self) -> CpuResult<u16, B> {
        let pointer = self.take_absolute()?;
        let [ptr_low, ptr_high] = pointer.to_le_bytes();
        let high_addr = u16::from_le_bytes([ptr_low.wrapping_add(1), ptr_high]);
        Ok(u16::from_le_bytes([self.read_byte(pointer)?, self.read_byte(high_addr)?]))
    }

    /// a,x and a,y. Also reports whether indexing crossed a page.
    fn take_absolute_indexed(&mut self, index: u8) -> CpuResult<(u16, bool), B> {
        let base = self.take_absolute()?;
        let addr = base.wrapping_add(index as u16);
        Ok((addr, base & 0xFF00 != addr & 0xFF00))
    }

    /// d,x
    fn take_zero_page_indexed_x(&mut self) -> CpuResult<u8, B> {
        Ok(self.take_zero_page()?.wrapping_add(self.reg.x))
    }

    /// d,y
    fn take_zero_page_indexed_y(&mut self) -> CpuResult<u8, B> {
        Ok(self.take_zero_page()?.wrapping_add(self.reg.y))
    }

    /// Resolves a group 1 operand address for one of the supported modes.
    fn take_alu_operand(&mut self, addr_mode: u8) -> CpuResult<(u16, bool), B> {
        Ok(match addr_mode {
            1 => (self.take_zero_page()? as u16, false), // d
            2 => (self.take_immediate()?, false), // #i
            3 => (self.take_absolute()?, false), // a
            5 => (self.take_zero_page_indexed_x()? as u16, false), // d,x
            6 => self.take_absolute_indexed(self.reg.y)?, // a,y
            7 => self.take_absolute_indexed(self.reg.x)?, // a,x
            _ => unreachable!("addressing mode {} is not dispatched", addr_mode)
        })
    }

    /// Executes one instruction.
    ///
    /// On `IllegalOpcode` the only state that has changed is the program
    /// counter, which has moved past the opcode byte.
    pub fn step(&mut self) -> CpuResult<(), B> {
        let opcode_addr = self.pc;
        let opcode = self.take_byte_at_pc()?;
        trace!(
            "{:04X}  {:02X}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
            opcode_addr, opcode, self.reg.a, self.reg.x, self.reg.y, self.reg.status, self.sp
        );

        // Opcodes are laid out as AAABBBCC:
        // - AAA and CC select the operation
        // - BBB and CC select the addressing mode
        // - CC selects the opcode group
        //
        // Only the subset below is implemented; everything else is fatal.
        let aaa = (opcode >> 5) & 0b111;
        let bbb = (opcode >> 2) & 0b111;
        let cc = opcode & 0b11;
        self.wait_cycles = match (aaa, bbb, cc) {
            // Group 0 (control flow ops)
            (2, 3, 0) => { // JMP a
                self.pc = self.take_absolute()?;
                3
            }
            (3, 3, 0) => { // JMP (a)
                self.pc = self.take_indirect()?;
                5
            }
            (3, 6, 0) => { // SEI
                self.reg.set_flag(CpuFlag::InterruptDisable, true);
                2
            }
            (6, 6, 0) => { // CLD
                self.reg.set_flag(CpuFlag::Decimal, false);
                2
            }

            // Group 1 (ALU ops)
            (0, addr_mode @ 1, 1) => { // ORA d
                let (addr, _) = self.take_alu_operand(addr_mode)?;
                let n = self.read_byte(addr)?;
                self.reg.update_a(self.reg.a | n);
                ALU_MODE_CYCLES[addr_mode as usize]
            }
            (2, addr_mode @ 2, 1) => { // EOR #i
                let (addr, _) = self.take_alu_operand(addr_mode)?;
                let n = self.read_byte(addr)?;
                self.reg.update_a(self.reg.a ^ n);
                ALU_MODE_CYCLES[addr_mode as usize]
            }
            (4, addr_mode @ (1 | 3 | 5 | 6 | 7), 1) => { // STA d, a, d,x, a,y, a,x
                let (addr, _) = self.take_alu_operand(addr_mode)?;
                self.write_byte(addr, self.reg.a)?;
                match addr_mode {
                    // Indexed absolute stores always pay for the fixup cycle.
                    6 | 7 => 5,
                    _ => ALU_MODE_CYCLES[addr_mode as usize],
                }
            }
            (5, addr_mode @ (1 | 2 | 3 | 5 | 6 | 7), 1) => { // LDA d, #i, a, d,x, a,y, a,x
                let (addr, page_crossed) = self.take_alu_operand(addr_mode)?;
                let n = self.read_byte(addr)?;
                self.reg.update_a(n);
                ALU_MODE_CYCLES[addr_mode as usize] + page_crossed as u8
            }

            // Group 2 (read-modify-write ops)
            (4, 6, 2) => { // TXS
                self.sp = self.reg.x;
                2
            }
            (5, 0, 2) => { // LDX #i
                let addr = self.take_immediate()?;
                let n = self.read_byte(addr)?;
                self.reg.update_x(n);
                2
            }
            (5, 1, 2) => { // LDX d
                let addr = self.take_zero_page()? as u16;
                let n = self.read_byte(addr)?;
                self.reg.update_x(n);
                3
            }
            (5, 5, 2) => { // LDX d,y
                let addr = self.take_zero_page_indexed_y()? as u16;
                let n = self.read_byte(addr)?;
                self.reg.update_x(n);
                4
            }

            _ => return Err(self.illegal_opcode(opcode_addr, opcode)),
        };
        Ok(())
    }

    fn illegal_opcode(&mut self, addr: u16, opcode: u8) -> CpuError<B::Error> {
        // Diagnostic only; a faulting read here must not mask the real error.
        let mut peek = |addr: u16| self.bus.read(addr).unwrap_or(0xFF);
        let next = [peek(self.pc), peek(self.pc.wrapping_add(1))];
        CpuError::IllegalOpcode { addr, opcode, next }
    }
}
