//! Excerpt validation.

use thiserror::Error;

use super::types::{Excerpt, Range};

/// Structural problems found in an excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("frame {frame} timestamp {timestamp}ms is earlier than previous {previous}ms")]
    DecreasingTimestamp {
        frame: usize,
        previous: u64,
        timestamp: u64,
    },
    #[error("frame {0} carries a full-text value")]
    MisplacedValue(usize),
    #[error("first frame value differs from excerpt value")]
    InitialValueMismatch,
    /// Operation range uses line or column 0.
    #[error("operation {operation} of frame {frame} has a zero line or column")]
    ZeroBasedRange { frame: usize, operation: usize },
    #[error("event '{name}' is stamped after frame {frame}")]
    EventAfterFrame { frame: usize, name: String },
}

fn is_zero_based(range: &Range) -> bool {
    range.start_line == 0 || range.start_column == 0 || range.end_line == 0 || range.end_column == 0
}

impl Excerpt {
    /// Collect every structural issue. An empty list means the excerpt is well-formed.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut previous = 0u64;

        for (index, frame) in self.frames.iter().enumerate() {
            if frame.timestamp < previous {
                issues.push(ValidationIssue::DecreasingTimestamp {
                    frame: index,
                    previous,
                    timestamp: frame.timestamp,
                });
            }
            previous = previous.max(frame.timestamp);

            match (&frame.value, index) {
                (Some(value), 0) if *value != self.value => {
                    issues.push(ValidationIssue::InitialValueMismatch);
                }
                (Some(_), i) if i > 0 => issues.push(ValidationIssue::MisplacedValue(i)),
                _ => {}
            }

            for (op_index, operation) in frame.operations.iter().enumerate() {
                if is_zero_based(&operation.range) {
                    issues.push(ValidationIssue::ZeroBasedRange {
                        frame: index,
                        operation: op_index,
                    });
                }
            }

            for event in &frame.events {
                if event.timestamp > frame.timestamp {
                    issues.push(ValidationIssue::EventAfterFrame {
                        frame: index,
                        name: event.name.clone(),
                    });
                }
            }
        }

        issues
    }
}
