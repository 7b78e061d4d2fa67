//! Messages exchanged with tile workers.
//!
//! Both directions carry the protocol version and the dispatch generation, so
//! the receiving side can reject payloads it does not understand and results
//! computed for a view that has since been replaced.

use serde::{Deserialize, Serialize};

use mandeltile_core::{EscapeTimeBuffer, View};

use crate::error::RenderError;

pub const PROTOCOL_VERSION: u32 = 1;

/// One tile to compute, sent to the worker bound to `slot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileTask {
    pub version: u32,
    pub generation: u64,
    pub slot: usize,
    pub tile: View,
}

impl TileTask {
    pub fn new(generation: u64, slot: usize, tile: View) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            generation,
            slot,
            tile,
        }
    }
}

/// A computed tile, echoing the generation and slot of its task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileResult {
    pub version: u32,
    pub generation: u64,
    pub slot: usize,
    pub tile: View,
    pub buffer: EscapeTimeBuffer,
}

impl TileResult {
    pub fn new(task: &TileTask, buffer: EscapeTimeBuffer) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            generation: task.generation,
            slot: task.slot,
            tile: task.tile,
            buffer,
        }
    }

    /// Check the version and that the buffer has the tile's shape.
    pub fn validate(&self) -> crate::Result<()> {
        if self.version != PROTOCOL_VERSION {
            return Err(RenderError::ProtocolVersion {
                expected: PROTOCOL_VERSION,
                found: self.version,
            });
        }
        if self.buffer.data.len() != self.tile.pixel_count() {
            return Err(RenderError::BufferSizeMismatch {
                expected: self.tile.pixel_count(),
                actual: self.buffer.data.len(),
            });
        }
        Ok(())
    }
}

/// What a worker sends back for a task it picked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TileOutcome {
    Computed(TileResult),
    /// The computation panicked. No buffer exists for this tile; the worker
    /// carries on with its next task.
    Failed { generation: u64, slot: usize },
}

impl TileOutcome {
    pub fn failed(task: &TileTask) -> Self {
        Self::Failed {
            generation: task.generation,
            slot: task.slot,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            Self::Computed(result) => result.generation,
            Self::Failed { generation, .. } => *generation,
        }
    }

    pub fn slot(&self) -> usize {
        match self {
            Self::Computed(result) => result.slot,
            Self::Failed { slot, .. } => *slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_for(view: View) -> TileResult {
        let task = TileTask::new(7, 2, view);
        TileResult::new(&task, EscapeTimeBuffer::new(view.width, view.height, 10))
    }

    #[test]
    fn result_echoes_task_identity() {
        let r = result_for(View::default_for(4, 3));
        assert_eq!(r.generation, 7);
        assert_eq!(r.slot, 2);
        assert_eq!(r.version, PROTOCOL_VERSION);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn validate_rejects_wrong_version() {
        let mut r = result_for(View::default_for(4, 3));
        r.version = 99;
        assert!(matches!(
            r.validate(),
            Err(RenderError::ProtocolVersion { found: 99, .. })
        ));
    }

    #[test]
    fn validate_rejects_short_buffer() {
        let mut r = result_for(View::default_for(4, 3));
        r.buffer.data.truncate(5);
        assert!(matches!(
            r.validate(),
            Err(RenderError::BufferSizeMismatch {
                expected: 12,
                actual: 5
            })
        ));
    }

    #[test]
    fn outcome_reports_task_identity() {
        let task = TileTask::new(5, 3, View::default_for(4, 4));
        let failed = TileOutcome::failed(&task);
        assert_eq!((failed.generation(), failed.slot()), (5, 3));

        let computed = TileOutcome::Computed(result_for(View::default_for(4, 3)));
        assert_eq!((computed.generation(), computed.slot()), (7, 2));
    }

    #[test]
    fn task_survives_json_boundary() {
        let task = TileTask::new(3, 1, View::default_for(16, 9));
        let json = serde_json::to_string(&task).unwrap();
        let back: TileTask = serde_json::from_str(&json).unwrap();
        assert_eq!(task, back);
    }
}
