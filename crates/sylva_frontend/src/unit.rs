//! Invocation-wide compilation-unit state.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use sylva_ast::{NodeId, TimeInfo};
use sylva_common::Symbol;

/// Shared state of one compilation unit: the design-element id generator
/// and the registry of recorded time-scale directives.
///
/// Safe to share across workers; id generation is atomic and the time-info
/// list is mutex-guarded.
#[derive(Debug, Default)]
pub struct CompilationUnit {
    next_element_id: AtomicU32,
    time_infos: Mutex<Vec<TimeInfo>>,
}

impl CompilationUnit {
    /// Creates a fresh unit. Element ids start at one; zero is the invalid
    /// node.
    pub fn new() -> Self {
        Self {
            next_element_id: AtomicU32::new(1),
            time_infos: Mutex::new(Vec::new()),
        }
    }

    /// Returns the next unique design-element id.
    pub fn next_element_id(&self) -> NodeId {
        NodeId::from_raw(self.next_element_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Records a time-scale directive.
    pub fn record_time_info(&self, info: TimeInfo) {
        self.time_infos.lock().unwrap().push(info);
    }

    /// All recorded time infos, in recording order.
    pub fn time_infos(&self) -> Vec<TimeInfo> {
        self.time_infos.lock().unwrap().clone()
    }

    /// Time infos recorded for one file.
    pub fn time_infos_for(&self, file: Symbol) -> Vec<TimeInfo> {
        self.time_infos
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.file == file)
            .copied()
            .collect()
    }

    /// The time scale in effect at `file:line`: the last directive recorded
    /// for that file at or before the line, else the default.
    pub fn time_info_at(&self, file: Symbol, line: u32) -> TimeInfo {
        self.time_infos
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.file == file && t.line <= line)
            .next_back()
            .copied()
            .unwrap_or_default()
    }
}
