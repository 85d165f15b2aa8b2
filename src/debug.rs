use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::errors::PairgapError;

pub mod messages {
    use serde::{Deserialize, Serialize};

    use crate::aligner::band::Band;
    use crate::aligner::config::AlignmentMode;

    /// Computed rows of one matrix column, starting at `first_row`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MatrixColumn<T> {
        pub col: usize,
        pub first_row: usize,
        pub cells: Vec<T>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub enum DebugOutputMessage {
        NewPair { id: usize, len1: usize, len2: usize, mode: AlignmentMode, band: Option<Band> },

        /// Best score per cell, `None` for minus infinity
        ScoreMatrix { id: usize, columns: Vec<MatrixColumn<Option<i64>>> },

        /// Trace directions per cell, rendered with `\` for diagonal, `|` for up, `-` for left,
        /// `^` and `<` for opened gaps, and `0` for cells without predecessor
        TraceMatrix { id: usize, columns: Vec<MatrixColumn<String>> },

        PairDone { id: usize },
        Terminate,
    }

    impl DebugOutputMessage {
        pub fn pair_id(&self) -> Option<usize> {
            match *self {
                Self::NewPair { id, .. }
                | Self::ScoreMatrix { id, .. }
                | Self::TraceMatrix { id, .. }
                | Self::PairDone { id } => Some(id),
                Self::Terminate => None,
            }
        }
    }
}

/// Writes DP matrices to JSON lines files, one file per sequence pair, from a background thread.
pub struct DebugOutputWriter {
    transmitter: mpsc::Sender<messages::DebugOutputMessage>,
    worker: DebugOutputWorker
}

impl DebugOutputWriter {
    pub fn new<T: AsRef<Path> + Send>(debug_output_dir: T) -> Self {
        let (tx, rx) = mpsc::channel();

        Self { transmitter: tx, worker: DebugOutputWorker::new(debug_output_dir, rx) }
    }

    pub fn log(&self, msg: messages::DebugOutputMessage) {
        if let Err(e) = self.transmitter.send(msg) {
            warn!("Could not log debug message! Cause: {}", e)
        }
    }

    /// Stop the worker thread after all messages sent so far are written.
    pub fn join(self) -> Result<(), PairgapError> {
        self.log(messages::DebugOutputMessage::Terminate);
        self.worker.join()
    }
}

fn write_msg(writer: &mut impl Write, msg: &messages::DebugOutputMessage) {
    match serde_json::to_string(&msg) {
        Ok(json) => {
            if let Err(e) = writeln!(writer, "{}", json) {
                warn!("Error writing message to debug output! {}", e);
            }
        },
        Err(e) => warn!("Could not serialize debug data to JSON! {}", e)
    }
}

struct DebugOutputWorker {
    thread: JoinHandle<Result<(), PairgapError>>,
}

impl DebugOutputWorker {
    fn new<T: AsRef<Path> + Send>(debug_output_dir: T, receiver: mpsc::Receiver<messages::DebugOutputMessage>) -> Self {
        let output_path = debug_output_dir.as_ref().to_path_buf();
        Self { thread: std::thread::spawn(move || {
            debug!("Debug output directory {:?}", output_path);
            std::fs::create_dir_all(&output_path)?;

            // Pairs may be aligned concurrently, so keep one open file per pair in flight
            let mut open_files: HashMap<usize, BufWriter<File>> = HashMap::new();

            for msg in receiver {
                match msg {
                    messages::DebugOutputMessage::Terminate => break,
                    messages::DebugOutputMessage::NewPair { id, .. } => {
                        let mut output_file = File::create(output_path.join(format!("pair_{id}.jsonl")))
                            .map(BufWriter::new)?;

                        write_msg(&mut output_file, &msg);
                        open_files.insert(id, output_file);
                    },
                    messages::DebugOutputMessage::PairDone { id } => {
                        if let Some(mut output_file) = open_files.remove(&id) {
                            output_file.flush()?;
                        }
                    },
                    _ => {
                        let writer = msg.pair_id().and_then(|id| open_files.get_mut(&id));
                        match writer {
                            Some(output_file) => write_msg(output_file, &msg),
                            None => warn!("Debug message for a pair that was not announced."),
                        }
                    }
                }
            }

            for output_file in open_files.values_mut() {
                output_file.flush()?;
            }

            Ok(())
        })}
    }

    fn join(self) -> Result<(), PairgapError> {
        self.thread.join()
            .unwrap_or_else(|_| Err(io::Error::other("debug output thread panicked").into()))
    }
}

#[cfg(test)]
mod tests {
    use super::messages::{DebugOutputMessage, MatrixColumn};
    use super::DebugOutputWriter;
    use crate::aligner::config::AlignmentMode;

    #[test]
    fn test_writes_one_file_per_pair() {
        let dir = std::env::temp_dir().join(format!("pairgap-debug-{}", std::process::id()));
        let writer = DebugOutputWriter::new(&dir);

        writer.log(DebugOutputMessage::NewPair { id: 3, len1: 2, len2: 1, mode: AlignmentMode::Global, band: None });
        writer.log(DebugOutputMessage::ScoreMatrix {
            id: 3,
            columns: vec![MatrixColumn { col: 0, first_row: 0, cells: vec![Some(0), None] }],
        });
        writer.log(DebugOutputMessage::PairDone { id: 3 });
        writer.join().unwrap();

        let contents = std::fs::read_to_string(dir.join("pair_3.jsonl")).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("{\"NewPair\""));
        assert!(lines[1].contains("[0,null]"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_pair_ids() {
        assert_eq!(DebugOutputMessage::PairDone { id: 5 }.pair_id(), Some(5));
        assert_eq!(DebugOutputMessage::ScoreMatrix { id: 2, columns: Vec::new() }.pair_id(), Some(2));
        assert_eq!(DebugOutputMessage::Terminate.pair_id(), None);

        // Only the terminate message runs without a pair
        let json = serde_json::to_string(&DebugOutputMessage::Terminate).unwrap();
        assert_eq!(json, "\"Terminate\"");
    }
}
