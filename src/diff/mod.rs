//! Character-level diff between successive transcription hypotheses.
//!
//! Implements Myers' O(ND) greedy diff. Scripts are stored as runs of
//! insert/delete/equal text and can be replayed to turn the old text
//! into the new one, which is how transcript versions are persisted and
//! reconstructed.

use crate::{MurmurError, Result};
use serde::{Deserialize, Serialize};

/// The kind of edit a diff step represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffOp {
    Insert,
    Delete,
    Equal,
}

/// One run of a diff script: an operation and the text it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStep {
    pub op: DiffOp,
    pub text: String,
}

impl DiffStep {
    pub fn new(op: DiffOp, text: impl Into<String>) -> Self {
        Self {
            op,
            text: text.into(),
        }
    }

    /// Number of characters this step covers
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Compute the diff between two strings.
///
/// Operates on Unicode scalar values, so multi-byte characters are
/// never split. Adjacent steps with the same operation are coalesced
/// into a single run.
pub fn diff(old_text: &str, new_text: &str) -> Vec<DiffStep> {
    let old: Vec<char> = old_text.chars().collect();
    let new: Vec<char> = new_text.chars().collect();
    let ops = myers(&old, &new);
    coalesce(ops)
}

/// Apply a diff script to `old_text`, producing the new text.
///
/// The script is validated as it is replayed: equal and delete runs
/// must line up with the base text. A mismatch means the script was
/// computed against a different base and is rejected rather than
/// producing a silently corrupted transcript.
pub fn apply(steps: &[DiffStep], old_text: &str) -> Result<String> {
    let old: Vec<char> = old_text.chars().collect();
    let mut result = String::with_capacity(old_text.len());
    let mut index = 0usize;

    for step in steps {
        match step.op {
            DiffOp::Equal => {
                let len = step.char_len();
                let end = index + len;
                if end > old.len() {
                    return Err(MurmurError::TranscriptError(format!(
                        "diff equal run of {} chars overruns base text at {}",
                        len, index
                    )));
                }
                if !old[index..end].iter().copied().eq(step.text.chars()) {
                    return Err(MurmurError::TranscriptError(format!(
                        "diff equal run does not match base text at {}",
                        index
                    )));
                }
                result.push_str(&step.text);
                index = end;
            }
            DiffOp::Insert => {
                result.push_str(&step.text);
            }
            DiffOp::Delete => {
                let len = step.char_len();
                let end = index + len;
                if end > old.len() {
                    return Err(MurmurError::TranscriptError(format!(
                        "diff delete run of {} chars overruns base text at {}",
                        len, index
                    )));
                }
                if !old[index..end].iter().copied().eq(step.text.chars()) {
                    return Err(MurmurError::TranscriptError(format!(
                        "diff delete run does not match base text at {}",
                        index
                    )));
                }
                index = end;
            }
        }
    }

    if index != old.len() {
        return Err(MurmurError::TranscriptError(format!(
            "diff script consumed {} of {} base chars",
            index,
            old.len()
        )));
    }

    Ok(result)
}

/// A single-character edit, before runs are coalesced
#[derive(Debug, Clone, Copy)]
enum CharOp {
    Insert(char),
    Delete(char),
    Equal(char),
}

/// Greedy forward Myers diff over char slices.
///
/// Records the furthest-reaching x for every k-line at each edit
/// distance d, then backtracks through the trace to recover the edit
/// script.
fn myers(old: &[char], new: &[char]) -> Vec<CharOp> {
    let n = old.len();
    let m = new.len();
    if n == 0 {
        return new.iter().map(|&c| CharOp::Insert(c)).collect();
    }
    if m == 0 {
        return old.iter().map(|&c| CharOp::Delete(c)).collect();
    }

    let max_d = n + m;
    // V is indexed by k + max_d so k can range over [-d, d]
    let offset = max_d as isize;
    let mut v = vec![0isize; 2 * max_d + 1];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'outer: for d in 0..=max_d as isize {
        for k in (-d..=d).step_by(2) {
            let mut x = if k == -d || (k != d && v[(k - 1 + offset) as usize] < v[(k + 1 + offset) as usize])
            {
                // Move down: take x from the k+1 line
                v[(k + 1 + offset) as usize]
            } else {
                // Move right: advance x from the k-1 line
                v[(k - 1 + offset) as usize] + 1
            };
            let mut y = x - k;

            // Follow the diagonal while characters match
            while (x as usize) < n && (y as usize) < m && old[x as usize] == new[y as usize] {
                x += 1;
                y += 1;
            }

            v[(k + offset) as usize] = x;

            if x as usize >= n && y as usize >= m {
                trace.push(v.clone());
                break 'outer;
            }
        }
        trace.push(v.clone());
    }

    backtrack(old, new, &trace, offset)
}

/// Reconstruct the edit script by walking the trace backwards from
/// (n, m) to (0, 0).
fn backtrack(old: &[char], new: &[char], trace: &[Vec<isize>], offset: isize) -> Vec<CharOp> {
    let mut x = old.len() as isize;
    let mut y = new.len() as isize;
    let mut ops: Vec<CharOp> = Vec::with_capacity(old.len() + new.len());

    for d in (0..trace.len() as isize).rev() {
        let v = &trace[d as usize];
        let k = x - y;

        let prev_k = if k == -d || (k != d && v[(k - 1 + offset) as usize] < v[(k + 1 + offset) as usize])
        {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[(prev_k + offset) as usize];
        let prev_y = prev_x - prev_k;

        // Walk back along the diagonal
        while x > prev_x && y > prev_y {
            x -= 1;
            y -= 1;
            ops.push(CharOp::Equal(old[x as usize]));
        }

        if d > 0 {
            if x == prev_x {
                y -= 1;
                ops.push(CharOp::Insert(new[y as usize]));
            } else {
                x -= 1;
                ops.push(CharOp::Delete(old[x as usize]));
            }
        }
    }

    ops.reverse();
    ops
}

/// Merge adjacent single-character edits of the same kind into runs
fn coalesce(ops: Vec<CharOp>) -> Vec<DiffStep> {
    let mut steps: Vec<DiffStep> = Vec::new();

    for op in ops {
        let (kind, ch) = match op {
            CharOp::Insert(c) => (DiffOp::Insert, c),
            CharOp::Delete(c) => (DiffOp::Delete, c),
            CharOp::Equal(c) => (DiffOp::Equal, c),
        };

        match steps.last_mut() {
            Some(last) if last.op == kind => last.text.push(ch),
            _ => steps.push(DiffStep::new(kind, ch.to_string())),
        }
    }

    steps
}
