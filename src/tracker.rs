//! Cost metric tracking via passive event observation

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::events::{EventBus, EventListener, MemEvent};

// Modeled 1 GHz base cycle
pub const INSTRUCTION_TIME_NS: u64 = 1;
pub const CACHE_HIT_TIME_NS: u64 = 1;
pub const CACHE_MISS_TIME_NS: u64 = 80;

/// Accumulated cost metrics
#[derive(Default)]
pub struct CostMetrics {
    pub execution_time_ns: u64,
    pub instructions_executed: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    ram_locations: HashSet<u16>,
    cache_locations: HashSet<(u8, u8)>,
}

impl EventListener for CostMetrics {
    fn on_event(&mut self, event: MemEvent) {
        match event {
            MemEvent::Fetch { .. } => {
                self.instructions_executed += 1;
                self.execution_time_ns += INSTRUCTION_TIME_NS;
            }
            MemEvent::Hit { .. } => {
                self.cache_hits += 1;
                self.execution_time_ns += CACHE_HIT_TIME_NS;
            }
            MemEvent::Miss { addr } => {
                self.cache_misses += 1;
                self.execution_time_ns += CACHE_MISS_TIME_NS;
                self.ram_locations.insert(addr);
            }
            MemEvent::WriteCache { set, way } => {
                self.cache_locations.insert((set, way));
            }
        }
    }
}

/// The three-field cost report
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostReport {
    pub total_ns: u64,
    pub cache_locations_used: u32,
    pub ram_locations_used: u32,
}

/// Scoped cost observer.
///
/// `attach` subscribes to the bus; dropping the tracker unsubscribes, on
/// every exit path of the enclosing scope. The CPU never calls into it.
pub struct CostTracker {
    metrics: Rc<RefCell<CostMetrics>>,
}

impl CostTracker {
    pub fn attach(bus: &mut EventBus) -> Self {
        let metrics = Rc::new(RefCell::new(CostMetrics::default()));
        bus.subscribe(&(metrics.clone() as Rc<RefCell<dyn EventListener>>));
        Self { metrics }
    }

    pub fn report(&self) -> CostReport {
        let metrics = self.metrics.borrow();
        CostReport {
            total_ns: metrics.execution_time_ns,
            cache_locations_used: metrics.cache_locations.len() as u32,
            ram_locations_used: metrics.ram_locations.len() as u32,
        }
    }

    pub fn ram_location_used(&self, addr: u16) -> bool {
        self.metrics.borrow().ram_locations.contains(&addr)
    }

    pub fn instructions_executed(&self) -> u64 {
        self.metrics.borrow().instructions_executed
    }

    /// Human-readable summary of the run
    pub fn summary(&self) -> String {
        let metrics = self.metrics.borrow();
        let accesses = metrics.cache_hits + metrics.cache_misses;
        let rate = |n: u64| {
            if accesses == 0 {
                0.0
            } else {
                100.0 * n as f64 / accesses as f64
            }
        };
        format!(
            "Instructions executed: {}.\n\
             Cache hits: {} ({:.1}%)\n\
             Cache misses: {} ({:.1}%)\n\
             Cache locations used: {}.\n\
             RAM locations used: {} ({} bytes).\n\
             -----------------------------\n\
             Total execution time: {}ns.",
            metrics.instructions_executed,
            metrics.cache_hits,
            rate(metrics.cache_hits),
            metrics.cache_misses,
            rate(metrics.cache_misses),
            metrics.cache_locations.len(),
            metrics.ram_locations.len(),
            metrics.ram_locations.len() * 4,
            metrics.execution_time_ns,
        )
    }
}
