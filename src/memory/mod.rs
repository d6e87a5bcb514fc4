//! Unified memory: 2^16 words of RAM behind a set-associative cache

pub mod cache;

use crate::events::{EventBus, MemEvent};
use crate::memory::cache::Cache;

/// Number of word-sized cells; one word per 16-bit address
pub const MEMORY_SIZE: usize = 1 << 16;

/// Word-addressable memory routed through the cache.
///
/// The cache is write-through and write-allocate, so RAM always holds the
/// current value of every cell. Instruction fetches take the same cached
/// path as data accesses but are accounted differently: a fetch emits only
/// `Fetch`, while data accesses emit `Hit` or `Miss`.
pub struct Memory {
    ram: Box<[u32]>,
    cache: Cache,
    bus: EventBus,
}

impl Memory {
    pub fn make() -> Self {
        Self {
            ram: vec![0; MEMORY_SIZE].into_boxed_slice(),
            cache: Cache::make(),
            bus: EventBus::default(),
        }
    }

    /// Routes an address through the cache and returns `(set, way, hit)`.
    /// On a miss the victim way is chosen but not yet filled.
    fn route(&mut self, addr: u16) -> (usize, usize, bool) {
        let set = cache::set_index(addr);
        let tag = cache::tag_of(addr);
        let (way, hit) = match self.cache.probe(set, tag) {
            Some(way) => (way, true),
            None => (self.cache.victim(set), false),
        };
        self.cache.touch(set, way);
        (set, way, hit)
    }

    fn emit_outcome(&mut self, addr: u16, hit: bool) {
        self.bus.emit(if hit {
            MemEvent::Hit { addr }
        } else {
            MemEvent::Miss { addr }
        });
    }

    /// Instruction fetch: cached, but costed as a plain fetch
    pub fn fetch(&mut self, addr: u16) -> u32 {
        self.bus.emit(MemEvent::Fetch { addr });
        let (set, way, hit) = self.route(addr);
        if !hit {
            self.cache.fill(set, way, cache::tag_of(addr), self.ram[addr as usize]);
            self.bus.emit(MemEvent::WriteCache { set: set as u8, way: way as u8 });
        }
        self.cache.value(set, way)
    }

    /// Data read
    pub fn load(&mut self, addr: u16) -> u32 {
        let (set, way, hit) = self.route(addr);
        self.emit_outcome(addr, hit);
        if !hit {
            self.cache.fill(set, way, cache::tag_of(addr), self.ram[addr as usize]);
            self.bus.emit(MemEvent::WriteCache { set: set as u8, way: way as u8 });
        }
        self.cache.value(set, way)
    }

    /// Full-word data write
    pub fn store(&mut self, addr: u16, value: u32) {
        self.store_masked(addr, value, 0);
    }

    /// Data write keeping the destination bits selected by `keep_mask`.
    ///
    /// A masked store is a single cache transaction: the line resident (or
    /// filled) by this access supplies the preserved bits, so exactly one
    /// hit-or-miss and one cache write are observed per store.
    pub fn store_masked(&mut self, addr: u16, value: u32, keep_mask: u32) {
        let (set, way, hit) = self.route(addr);
        self.emit_outcome(addr, hit);
        let old = if hit { self.cache.value(set, way) } else { self.ram[addr as usize] };
        let new = (old & keep_mask) | (value & !keep_mask);
        self.cache.fill(set, way, cache::tag_of(addr), new);
        // Write through
        self.ram[addr as usize] = new;
        self.bus.emit(MemEvent::WriteCache { set: set as u8, way: way as u8 });
    }

    /// Host-side read, behind the cost model.
    /// Write-through keeps RAM current, so this never consults the cache.
    pub fn peek(&self, addr: u16) -> u32 {
        self.ram[addr as usize]
    }

    /// Host-side write, behind the cost model. A matching resident line is
    /// refreshed so cached reads stay coherent; PLRU state is untouched.
    pub fn poke(&mut self, addr: u16, value: u32) {
        self.ram[addr as usize] = value;
        self.cache.refresh(cache::set_index(addr), cache::tag_of(addr), value);
    }

    /// Loads a word image starting at address 0
    pub fn load_image(&mut self, image: &[u32]) {
        assert!(image.len() <= MEMORY_SIZE);
        for (addr, word) in image.iter().enumerate() {
            self.poke(addr as u16, *word);
        }
    }

    /// Invalidates the cache and zeroes all PLRU state. RAM is kept.
    pub fn reset_cache(&mut self) {
        self.cache.reset();
    }

    /// Clears RAM and the cache
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.cache.reset();
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn plru_bits(&self, set: usize) -> u8 {
        self.cache.plru_bits(set)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::make()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventListener;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        events: Vec<MemEvent>,
    }

    impl EventListener for Recorder {
        fn on_event(&mut self, event: MemEvent) {
            self.events.push(event);
        }
    }

    fn recorded(mem: &mut Memory) -> Rc<RefCell<Recorder>> {
        let recorder = Rc::new(RefCell::new(Recorder { events: Vec::new() }));
        mem.bus_mut()
            .subscribe(&(recorder.clone() as Rc<RefCell<dyn EventListener>>));
        recorder
    }

    // Nine writes into set 0 with one write hit in between, checking the
    // tree bits after every access. Addresses 1..=9 all fall in set 0
    // with tag = address.
    #[test]
    fn test_plru_state_over_access_sequence() {
        let mut mem = Memory::make();

        mem.store(1, 10);
        assert_eq!(mem.plru_bits(0), 0b0001011);
        mem.store(2, 20);
        assert_eq!(mem.plru_bits(0), 0b0101110);

        // Write hit on address 1: only the root bit flips back
        mem.store(1, 100);
        assert_eq!(mem.plru_bits(0), 0b0101111);

        for (addr, bits) in [
            (3, 0b1101010),
            (4, 0b1111001),
            (5, 0b1011100),
            (6, 0b1010111),
            (7, 0b0010010),
            (8, 0b0000001),
        ] {
            mem.store(addr, addr as u32 * 10);
            assert_eq!(mem.plru_bits(0), bits, "after store to {addr}");
        }

        // The ninth distinct address evicts way 4, which held address 2
        mem.store(9, 90);
        assert_eq!(mem.plru_bits(0), 0b0100100);

        // Write-through made the evicted value durable in RAM,
        // and a cached read brings it back (into way 0)
        assert_eq!(mem.peek(2), 20);
        assert_eq!(mem.load(2), 20);
    }

    #[test]
    fn test_read_coherence_through_any_path() {
        let mut mem = Memory::make();
        mem.store(0x1234, 1);
        mem.store(0x1234, 2);
        assert_eq!(mem.load(0x1234), 2);
        mem.poke(0x1234, 3);
        assert_eq!(mem.load(0x1234), 3);
        assert_eq!(mem.peek(0x1234), 3);
    }

    #[test]
    fn test_fetch_sees_prior_store() {
        // Self-modifying code: a store must be visible to the next fetch
        let mut mem = Memory::make();
        mem.fetch(0x0002);
        mem.store(0x0002, 0xABCD);
        assert_eq!(mem.fetch(0x0002), 0xABCD);
    }

    #[test]
    fn test_event_sequences() {
        let mut mem = Memory::make();
        let recorder = recorded(&mut mem);

        mem.load(0x1234);
        mem.load(0x1234);
        mem.store(0x1234, 7);
        mem.fetch(0);
        let set = cache::set_index(0x1234) as u8;
        assert_eq!(
            recorder.borrow().events,
            vec![
                MemEvent::Miss { addr: 0x1234 },
                MemEvent::WriteCache { set, way: 0 },
                MemEvent::Hit { addr: 0x1234 },
                MemEvent::Hit { addr: 0x1234 },
                MemEvent::WriteCache { set, way: 0 },
                MemEvent::Fetch { addr: 0 },
                MemEvent::WriteCache { set: 0, way: 0 },
            ]
        );
    }

    #[test]
    fn test_masked_store_is_one_access() {
        let mut mem = Memory::make();
        mem.poke(0x0100, 0x1111_2222);
        let recorder = recorded(&mut mem);

        // Replace the high half, keep the low half
        mem.store_masked(0x0100, 0xABCD_0000, 0x0000_FFFF);
        assert_eq!(mem.peek(0x0100), 0xABCD_2222);
        let events = recorder.borrow().events.clone();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], MemEvent::Miss { addr: 0x0100 });
        assert!(matches!(events[1], MemEvent::WriteCache { .. }));
    }

    #[test]
    fn test_host_poke_refreshes_resident_line() {
        let mut mem = Memory::make();
        mem.load(0x0042);
        mem.poke(0x0042, 99);
        // The stale line must not shadow the host write
        assert_eq!(mem.load(0x0042), 99);
    }

    #[test]
    fn test_load_image() {
        let mut mem = Memory::make();
        mem.load_image(&[1, 2, 3]);
        assert_eq!(mem.peek(0), 1);
        assert_eq!(mem.peek(1), 2);
        assert_eq!(mem.peek(2), 3);
        assert_eq!(mem.peek(3), 0);
    }
}
