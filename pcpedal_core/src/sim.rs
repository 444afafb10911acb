//! Host stand-ins for the hardware collaborators.

use std::{cell::{Cell, RefCell}, convert::Infallible, rc::Rc, vec::Vec};

use crate::{
    config::ByteStorage,
    display::{DisplayBackend, Glyph, IntensityRange},
    flash::{FlashController, IndicatorLevel},
    switch::{PinLevels, SwitchId, SwitchInputs},
    time::{TickLock, TickState},
    Settings,
};

pub const SIM_INTENSITY: IntensityRange = IntensityRange::new(0x00, 0x0C);

/// Millisecond clock that advances by one tick every time the state is locked, so busy
/// loops make progress.
pub struct SimTicks {
    state: TickState,
    clock: Rc<Cell<u32>>,
    pub indicator: Vec<(u32, IndicatorLevel)>,
}

impl SimTicks {
    pub fn new(settings: &Settings) -> SimTicks {
        SimTicks {
            state: TickState::new(FlashController::new(settings, SIM_INTENSITY)),
            clock: Rc::new(Cell::new(0)),
            indicator: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> u32 {
        self.clock.get()
    }

    pub fn clock(&self) -> Rc<Cell<u32>> {
        self.clock.clone()
    }
}

impl Default for SimTicks {
    fn default() -> SimTicks {
        SimTicks::new(&Settings::default())
    }
}

impl TickLock for SimTicks {
    fn lock<R>(&mut self, f: impl FnOnce(&mut TickState) -> R) -> R {
        if let Some(level) = self.state.tick() {
            self.indicator.push((self.state.time.now(), level));
        }
        self.clock.set(self.state.time.now());
        f(&mut self.state)
    }
}

/// Footswitches pressed over fixed intervals of the simulated clock.
#[derive(Default)]
pub struct ScriptedSwitches {
    clock: Rc<Cell<u32>>,
    presses: Vec<(SwitchId, u32, u32)>,
}

impl ScriptedSwitches {
    pub fn new(clock: Rc<Cell<u32>>) -> ScriptedSwitches {
        ScriptedSwitches {
            clock,
            presses: Vec::new(),
        }
    }

    /// Hold `id` down from `from` until just before `to`.
    pub fn press(&mut self, id: SwitchId, from: u32, to: u32) {
        self.presses.push((id, from, to));
    }

    /// Press and release `id` once, starting at `at`.
    pub fn tap(&mut self, id: SwitchId, at: u32) {
        self.press(id, at, at + 80);
    }

    fn is_down(&self, id: SwitchId, now: u32) -> bool {
        self.presses
            .iter()
            .any(|&(pressed, from, to)| pressed == id && (from..to).contains(&now))
    }
}

impl SwitchInputs for ScriptedSwitches {
    fn read(&mut self) -> PinLevels {
        let now = self.clock.get();
        PinLevels {
            up: self.is_down(SwitchId::Up, now),
            down: self.is_down(SwitchId::Down, now),
            mode: self.is_down(SwitchId::Mode, now),
        }
    }
}

/// Keeps the last glyph drawn at each position.
#[derive(Debug)]
pub struct RecordingDisplay {
    pub cells: [Glyph; 3],
    pub intensity: u8,
    pub intensity_changes: usize,
    pub initialised: bool,
}

impl Default for RecordingDisplay {
    fn default() -> RecordingDisplay {
        RecordingDisplay {
            cells: [Glyph::Blank; 3],
            intensity: SIM_INTENSITY.max,
            intensity_changes: 0,
            initialised: false,
        }
    }
}

impl RecordingDisplay {
    /// Contents as text. The range markers are c, ^ (raised c), C, u and U.
    pub fn text(&self) -> String {
        self.cells
            .iter()
            .map(|glyph| match glyph {
                Glyph::Digit(d) => char::from(b'0' + d),
                Glyph::Blank => ' ',
                Glyph::Range(range) => ['c', '^', 'C', 'u', 'U'][range.index() as usize],
            })
            .collect()
    }
}

impl DisplayBackend for RecordingDisplay {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Self::Error> {
        self.initialised = true;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.cells = [Glyph::Blank; 3];
        Ok(())
    }

    fn draw_glyph(&mut self, position: u8, glyph: Glyph) -> Result<(), Self::Error> {
        self.cells[position as usize] = glyph;
        Ok(())
    }

    fn set_intensity(&mut self, level: u8) -> Result<(), Self::Error> {
        if level != self.intensity {
            self.intensity_changes += 1;
        }
        self.intensity = level;
        Ok(())
    }

    fn intensity_range(&self) -> IntensityRange {
        SIM_INTENSITY
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MemoryFault {
    Locked,
}

#[derive(Debug, Default)]
struct Memory {
    cells: [u8; 8],
    locked: bool,
    stuck: Option<u16>,
    writes: usize,
    unlocks: usize,
}

/// Shared in-memory EEPROM. Clones see the same cells.
#[derive(Clone, Debug)]
pub struct MemoryStorage(Rc<RefCell<Memory>>);

impl Default for MemoryStorage {
    fn default() -> MemoryStorage {
        MemoryStorage(Rc::new(RefCell::new(Memory {
            locked: true,
            ..Memory::default()
        })))
    }
}

impl MemoryStorage {
    pub fn with_cells(cells: &[u8]) -> MemoryStorage {
        let storage = MemoryStorage::default();
        storage.0.borrow_mut().cells[..cells.len()].copy_from_slice(cells);
        storage
    }

    pub fn cells(&self) -> [u8; 8] {
        self.0.borrow().cells
    }

    /// Make programming `offset` silently do nothing.
    pub fn stick_cell(&self, offset: u16) {
        self.0.borrow_mut().stuck = Some(offset);
    }

    pub fn is_locked(&self) -> bool {
        self.0.borrow().locked
    }

    pub fn write_count(&self) -> usize {
        self.0.borrow().writes
    }

    pub fn unlock_count(&self) -> usize {
        self.0.borrow().unlocks
    }
}

impl ByteStorage for MemoryStorage {
    type Error = MemoryFault;

    fn unlock(&mut self) -> Result<(), Self::Error> {
        let mut memory = self.0.borrow_mut();
        memory.locked = false;
        memory.unlocks += 1;
        Ok(())
    }

    fn lock(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().locked = true;
        Ok(())
    }

    fn read_byte(&mut self, offset: u16) -> Result<u8, Self::Error> {
        Ok(self.0.borrow().cells[offset as usize])
    }

    fn program_byte(&mut self, offset: u16, value: u8) -> Result<(), Self::Error> {
        let mut memory = self.0.borrow_mut();
        if memory.locked {
            return Err(MemoryFault::Locked);
        }
        memory.writes += 1;
        if memory.stuck != Some(offset) {
            memory.cells[offset as usize] = value;
        }
        Ok(())
    }
}

/// Serial port that records every byte written.
#[derive(Clone, Default)]
pub struct RecordingSerial(Rc<RefCell<Vec<u8>>>);

impl RecordingSerial {
    pub fn bytes(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl embedded_hal::serial::Write<u8> for RecordingSerial {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.0.borrow_mut().push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}
