/*++

Licensed under the Apache-2.0 license.

File Name:

    aes128_engine.rs

Abstract:

    File contains the AES-128 block-cipher engine peripheral: register file,
    controller FSM and interrupt logic.

--*/

use aes_emu_bus::{
    ActionHandle, Bus, BusError, Clock, ReadOnlyRegister, ReadWriteRegister, Register, Timer,
};
use aes_emu_crypto::{Aes128, AesOp, AES_128_ROUNDS};
use aes_emu_types::{RvAddr, RvData, RvSize};
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::register_bitfields;
use tock_registers::registers::InMemoryRegister;

register_bitfields! [
    u32,

    /// Control Register Fields
    Control [
        START OFFSET(0) NUMBITS(1) [],
        OP OFFSET(1) NUMBITS(2) [
            ENCRYPT = 0b00,
            DECRYPT = 0b01,
        ],
        INT_EN OFFSET(3) NUMBITS(1) [],
        INT_CLR OFFSET(7) NUMBITS(1) [],
    ],

    /// Status Register Fields
    Status [
        DONE OFFSET(1) NUMBITS(1) [],
    ],
];

/// The number of clock cycles the key expansion unit occupies the engine
/// (11 round keys, one word per cycle).
const KEY_EXPAND_TICKS: u64 = 44;

/// The number of clock cycles per round of the cipher datapath.
const ROUND_TICKS: u64 = 4;

/// The number of clock cycles spent in the DONE state before the engine is
/// ready to accept another operation.
const DONE_TICKS: u64 = 1;

/// Controller FSM state
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum FsmState {
    Idle,
    ExpandKey,
    Round(usize),
    Done,
}

/// AES-128 Block-Cipher Engine Peripheral
///
/// Encrypts or decrypts a single 128-bit block per operation. The host
/// stages the key and input block through write-only word registers, pulses
/// `start` in the control register, then polls the status `done` bit or
/// waits on the interrupt line before reading the result registers.
pub struct AesEngine {
    /// Control register
    control: ReadWriteRegister<Control::Register>,

    /// Staged 128-bit key; word index 0 holds the least significant word
    /// (lowest offset), word index 3 the most significant.
    key: [u32; 4],

    /// Staged 128-bit input block, same word ordering as the key.
    data: [u32; 4],

    /// Status register
    status: ReadOnlyRegister<Status::Register>,

    /// Latched 128-bit output block, same word ordering as the key.
    result: [u32; 4],

    /// Controller FSM state
    state: FsmState,

    /// Operation sampled when `start` was accepted
    op: AesOp,

    /// Whether `interrupt_enable` was set when `start` was accepted
    int_enabled_at_start: bool,

    /// Sticky interrupt latch; cleared only by the `interrupt_clear` strobe
    int_pending: bool,

    /// Cipher for the operation in flight
    aes: Option<Aes128>,

    timer: Timer,

    step_action: Option<ActionHandle>,
}

impl AesEngine {
    /// Control register offset
    const CONTROL_OFFSET: RvAddr = 0x00;

    /// Key register block; KEY[3..0] with word 0 (MSB) at 0x10 down to
    /// word 3 (LSB) at 0x04.
    const KEY_OFFSET: RvAddr = 0x04;

    /// Data register block; same descending word order as the key.
    const DATA_OFFSET: RvAddr = 0x14;

    /// Status register offset
    const STATUS_OFFSET: RvAddr = 0x24;

    /// Result register block; same descending word order as the key.
    const RESULT_OFFSET: RvAddr = 0x28;

    /// Create a new instance of the AES engine
    pub fn new(clock: &Clock) -> Self {
        Self {
            control: ReadWriteRegister::new(0),
            key: [0; 4],
            data: [0; 4],
            status: ReadOnlyRegister::new(0),
            result: [0; 4],
            state: FsmState::Idle,
            op: AesOp::Encrypt,
            int_enabled_at_start: false,
            int_pending: false,
            aes: None,
            timer: Timer::new(clock),
            step_action: None,
        }
    }

    /// Boundary-level interrupt output: the sticky pending latch gated by
    /// the current `interrupt_enable` bit.
    pub fn interrupt_output(&self) -> bool {
        self.int_pending && self.control.reg.is_set(Control::INT_EN)
    }

    /// On Write callback for `control` register
    ///
    /// Byte writes are supported so the host can strobe `interrupt_clear`
    /// without re-writing the whole word.
    ///
    /// # Arguments
    ///
    /// * `size` - Size of the write
    /// * `val` - Data to write
    ///
    /// # Error
    ///
    /// * `BusError` - Exception with cause `BusError::StoreAccessFault`
    fn on_write_control(&mut self, size: RvSize, val: RvData) -> Result<(), BusError> {
        let val = match size {
            RvSize::Word => val,
            RvSize::Byte => (self.control.reg.get() & !0xFF) | (val & 0xFF),
            _ => Err(BusError::StoreAccessFault)?,
        };

        let written = InMemoryRegister::<u32, Control::Register>::new(val);

        // The clear strobe acts on the interrupt latch independently of
        // start/op in the same write; it is never an operation trigger.
        if written.is_set(Control::INT_CLR) {
            self.int_pending = false;
        }

        // start/op/interrupt_enable read back as written; the clear strobe
        // has no persistent read state.
        self.control.reg.set(val & !Control::INT_CLR::SET.value);

        if written.is_set(Control::START) && self.state == FsmState::Idle {
            self.start_operation();
        }

        Ok(())
    }

    /// On Write callback for the `key` register block
    fn on_write_key(&mut self, size: RvSize, idx: usize, val: RvData) -> Result<(), BusError> {
        if size != RvSize::Word {
            Err(BusError::StoreAccessFault)?
        }

        // Staging writes are ignored while an operation is in flight.
        if self.state == FsmState::Idle {
            self.key[idx] = val;
        }

        Ok(())
    }

    /// On Write callback for the `data` register block
    fn on_write_data(&mut self, size: RvSize, idx: usize, val: RvData) -> Result<(), BusError> {
        if size != RvSize::Word {
            Err(BusError::StoreAccessFault)?
        }

        if self.state == FsmState::Idle {
            self.data[idx] = val;
        }

        Ok(())
    }

    /// Accept a start pulse: sample op and interrupt enable, clear `done`
    /// and kick the FSM into key expansion.
    fn start_operation(&mut self) {
        self.op = match self.control.reg.read_as_enum(Control::OP) {
            Some(Control::OP::Value::DECRYPT) => AesOp::Decrypt,
            // Undefined op encodings fall back to encrypt.
            _ => AesOp::Encrypt,
        };
        self.int_enabled_at_start = self.control.reg.is_set(Control::INT_EN);
        self.status.reg.modify(Status::DONE::CLEAR);
        self.state = FsmState::ExpandKey;
        self.step_action = Some(self.timer.schedule_poll_in(KEY_EXPAND_TICKS));
    }

    /// Called by Bus::poll() to indicate that time has passed
    fn handle_poll(&mut self) {
        if !self.timer.fired(&mut self.step_action) {
            return;
        }
        match self.state {
            FsmState::Idle => {}
            FsmState::ExpandKey => {
                let mut aes = Aes128::new(self.op, &self.staged_key());
                aes.load_block(&self.staged_block());
                self.aes = Some(aes);
                self.state = FsmState::Round(1);
                self.step_action = Some(self.timer.schedule_poll_in(ROUND_TICKS));
            }
            FsmState::Round(round) => {
                if let Some(aes) = self.aes.as_mut() {
                    aes.round(round);
                }
                if round < AES_128_ROUNDS {
                    self.state = FsmState::Round(round + 1);
                    self.step_action = Some(self.timer.schedule_poll_in(ROUND_TICKS));
                } else {
                    self.latch_result();
                    self.state = FsmState::Done;
                    self.step_action = Some(self.timer.schedule_poll_in(DONE_TICKS));
                }
            }
            FsmState::Done => {
                self.aes = None;
                self.state = FsmState::Idle;
            }
        }
    }

    /// Latch the final state into the result registers, set `done` and the
    /// interrupt latch.
    fn latch_result(&mut self) {
        let block = match &self.aes {
            Some(aes) => *aes.block(),
            None => return,
        };
        for (i, word) in self.result.iter_mut().enumerate() {
            let msb = 4 * (3 - i);
            *word = u32::from_be_bytes(block[msb..msb + 4].try_into().unwrap());
        }
        self.status.reg.modify(Status::DONE::SET);
        if self.int_enabled_at_start {
            self.int_pending = true;
        }
    }

    /// Assemble the staged key into AES byte order (most significant byte
    /// first; word 3 occupies the highest offset and holds the first four
    /// key bytes).
    fn staged_key(&self) -> [u8; 16] {
        Self::collect_words(&self.key)
    }

    /// Assemble the staged input block into AES byte order.
    fn staged_block(&self) -> [u8; 16] {
        Self::collect_words(&self.data)
    }

    fn collect_words(words: &[u32; 4]) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        for (i, word) in words.iter().enumerate() {
            let msb = 4 * (3 - i);
            bytes[msb..msb + 4].copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// Index into a four-word register block, or None if `addr` does not
    /// land on one of its word offsets.
    fn word_index(base: RvAddr, addr: RvAddr) -> Option<usize> {
        if addr >= base && addr < base + 16 && (addr - base) % 4 == 0 {
            Some(((addr - base) / 4) as usize)
        } else {
            None
        }
    }
}

impl Bus for AesEngine {
    /// Read data of specified size from given address
    fn read(&mut self, size: RvSize, addr: RvAddr) -> Result<RvData, BusError> {
        if let Some(idx) = Self::word_index(Self::RESULT_OFFSET, addr) {
            if size != RvSize::Word {
                Err(BusError::LoadAccessFault)?
            }
            return Ok(self.result[idx]);
        }
        match addr {
            Self::CONTROL_OFFSET => self.control.read(size),
            Self::STATUS_OFFSET => self.status.read(size),
            _ => Err(BusError::LoadAccessFault),
        }
    }

    /// Write data of specified size to given address
    fn write(&mut self, size: RvSize, addr: RvAddr, val: RvData) -> Result<(), BusError> {
        if let Some(idx) = Self::word_index(Self::KEY_OFFSET, addr) {
            return self.on_write_key(size, idx, val);
        }
        if let Some(idx) = Self::word_index(Self::DATA_OFFSET, addr) {
            return self.on_write_data(size, idx, val);
        }
        match addr {
            Self::CONTROL_OFFSET => self.on_write_control(size, val),
            _ => Err(BusError::StoreAccessFault),
        }
    }

    fn poll(&mut self) {
        self.handle_poll();
    }

    fn warm_reset(&mut self) {
        if let Some(action) = self.step_action.take() {
            self.timer.cancel(action);
        }
        self.control.reg.set(0);
        self.key = [0; 4];
        self.data = [0; 4];
        self.status.reg.set(0);
        self.result = [0; 4];
        self.state = FsmState::Idle;
        self.op = AesOp::Encrypt;
        self.int_enabled_at_start = false;
        self.int_pending = false;
        self.aes = None;
    }
}
