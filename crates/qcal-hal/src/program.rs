//! Pulse program representation.
//!
//! A [`Program`] is a flat list of [`Shot`]s. Loops over sequence index,
//! depth or sweep parameters are unrolled on the host, so the runtime only
//! ever sees straight-line instruction lists. Every shot starts from the
//! runtime's reset state.
//!
//! Durations are expressed in clock cycles of [`CLOCK_CYCLE_NS`] nanoseconds.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{RuntimeError, RuntimeResult};
use crate::stream::StreamSpec;

/// Length of one controller clock cycle in nanoseconds.
pub const CLOCK_CYCLE_NS: u32 = 4;

/// Convert a duration in nanoseconds to clock cycles (truncating).
pub fn ns_to_cycles(ns: u32) -> u32 {
    ns / CLOCK_CYCLE_NS
}

/// A single real-time instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instruction {
    /// Play a named operation on an element.
    Play {
        element: String,
        operation: String,
        /// Override of the pulse length in clock cycles.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u32>,
        /// Amplitude scaling factor applied to the pulse.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amplitude: Option<f64>,
    },
    /// Idle an element for `duration` clock cycles.
    Wait { element: String, duration: u32 },
    /// Synchronise elements. An empty list aligns every element.
    Align { elements: Vec<String> },
    /// Run a measurement and save its outcome to `stream`.
    Measure {
        element: String,
        operation: String,
        stream: String,
    },
    /// Save a literal value to `stream`.
    Save { stream: String, value: f64 },
}

impl Instruction {
    /// Stream written by this instruction, if any.
    pub fn stream(&self) -> Option<&str> {
        match self {
            Instruction::Measure { stream, .. } | Instruction::Save { stream, .. } => {
                Some(stream.as_str())
            }
            _ => None,
        }
    }
}

/// One initialization–sequence–measurement cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    instructions: Vec<Instruction>,
}

impl Shot {
    /// Create an empty shot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Play an operation with its default length and amplitude.
    pub fn play(&mut self, element: &str, operation: &str) -> &mut Self {
        self.push(Instruction::Play {
            element: element.into(),
            operation: operation.into(),
            duration: None,
            amplitude: None,
        })
    }

    /// Play an operation for `duration` clock cycles.
    pub fn play_for(&mut self, element: &str, operation: &str, duration: u32) -> &mut Self {
        self.push(Instruction::Play {
            element: element.into(),
            operation: operation.into(),
            duration: Some(duration),
            amplitude: None,
        })
    }

    /// Play an operation with a scaled amplitude and optional length.
    pub fn play_scaled(
        &mut self,
        element: &str,
        operation: &str,
        amplitude: f64,
        duration: Option<u32>,
    ) -> &mut Self {
        self.push(Instruction::Play {
            element: element.into(),
            operation: operation.into(),
            duration,
            amplitude: Some(amplitude),
        })
    }

    pub fn wait(&mut self, element: &str, duration: u32) -> &mut Self {
        self.push(Instruction::Wait {
            element: element.into(),
            duration,
        })
    }

    /// Align all elements.
    pub fn align(&mut self) -> &mut Self {
        self.push(Instruction::Align {
            elements: Vec::new(),
        })
    }

    /// Align a subset of elements.
    pub fn align_elements(&mut self, elements: &[&str]) -> &mut Self {
        self.push(Instruction::Align {
            elements: elements.iter().map(|e| (*e).to_string()).collect(),
        })
    }

    pub fn measure(&mut self, element: &str, operation: &str, stream: &str) -> &mut Self {
        self.push(Instruction::Measure {
            element: element.into(),
            operation: operation.into(),
            stream: stream.into(),
        })
    }

    pub fn save(&mut self, stream: &str, value: f64) -> &mut Self {
        self.push(Instruction::Save {
            stream: stream.into(),
            value,
        })
    }

    /// Append a raw instruction.
    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    /// Append several instructions in order.
    pub fn extend(&mut self, instructions: impl IntoIterator<Item = Instruction>) -> &mut Self {
        self.instructions.extend(instructions);
        self
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// A complete program: shots plus the stream processing applied to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    name: String,
    shots: Vec<Shot>,
    streams: Vec<StreamSpec>,
}

impl Program {
    /// Create an empty program.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shots: Vec::new(),
            streams: Vec::new(),
        }
    }

    pub fn push_shot(&mut self, shot: Shot) {
        self.shots.push(shot);
    }

    /// Register a stream processing pipeline.
    pub fn add_stream(&mut self, stream: StreamSpec) -> &mut Self {
        self.streams.push(stream);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub fn streams(&self) -> &[StreamSpec] {
        &self.streams
    }

    pub fn num_shots(&self) -> usize {
        self.shots.len()
    }

    /// Total number of instructions across all shots.
    pub fn num_instructions(&self) -> usize {
        self.shots.iter().map(Shot::len).sum()
    }

    /// Check structural consistency before submission.
    ///
    /// A program must contain at least one shot, every stream pipeline must
    /// read from a stream that some instruction writes, and output names
    /// must be unique.
    pub fn validate(&self) -> RuntimeResult<()> {
        if self.shots.is_empty() {
            return Err(RuntimeError::InvalidProgram(format!(
                "program '{}' has no shots",
                self.name
            )));
        }

        let written: FxHashSet<&str> = self
            .shots
            .iter()
            .flat_map(Shot::instructions)
            .filter_map(Instruction::stream)
            .collect();

        let mut outputs = FxHashSet::default();
        for spec in &self.streams {
            if !written.contains(spec.source()) {
                return Err(RuntimeError::InvalidProgram(format!(
                    "stream '{}' is never saved to",
                    spec.source()
                )));
            }
            if !outputs.insert(spec.name()) {
                return Err(RuntimeError::InvalidProgram(format!(
                    "duplicate result name '{}'",
                    spec.name()
                )));
            }
        }
        Ok(())
    }
}
