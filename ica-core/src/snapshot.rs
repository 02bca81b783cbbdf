//! The snapshot record (C5): one phase's per-country state, and the flat
//! float64 encoding used to carry a whole history across the distributed
//! boundary.

use crate::country::Country;
use crate::sink::Phase;
use ndarray::Array1;
use thiserror::Error;

/// One country's recorded state at the moment a phase completed.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryRecord {
    pub position: Array1<f64>,
    pub color: [f64; 3],
    pub is_empire: bool,
}

/// Everything observed after one operator finished: the phase it closed out,
/// and every country's position/color/empire-flag at that moment.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSnapshot {
    pub phase: Phase,
    pub countries: Vec<CountryRecord>,
}

impl PhaseSnapshot {
    /// Captures the current population. Per-country record order is
    /// unspecified; callers must not depend on it.
    pub fn capture(phase: Phase, countries: &[Country]) -> Self {
        let records = countries
            .iter()
            .map(|c| CountryRecord {
                position: c.position.clone(),
                color: c.color.unwrap_or([0.0, 0.0, 0.0]),
                is_empire: c.is_empire(),
            })
            .collect();
        Self {
            phase,
            countries: records,
        }
    }
}

/// Failure decoding a flat snapshot buffer. Always indicates a corrupt or
/// truncated buffer, never a partial/recoverable state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("buffer ended while reading {0}")]
    Truncated(&'static str),
    #[error("phase name byte {0} is out of range for a code unit")]
    InvalidPhaseNameByte(f64),
    #[error("unrecognized phase name {0:?}")]
    UnknownPhase(String),
}

/// Encodes a full history (ordered phase snapshots) into the flat float64
/// buffer defined for cross-peer transport.
pub fn serialize(history: &[PhaseSnapshot]) -> Vec<f64> {
    let mut buf = Vec::new();
    buf.push(history.len() as f64);
    for snapshot in history {
        let name = snapshot.phase.as_str();
        buf.push(name.len() as f64);
        buf.extend(name.bytes().map(|b| b as f64));
        buf.push(snapshot.countries.len() as f64);
        for record in &snapshot.countries {
            buf.push(record.position.len() as f64);
            buf.extend(record.position.iter().copied());
            buf.push(if record.is_empire { 1.0 } else { 0.0 });
            buf.extend_from_slice(&record.color);
        }
    }
    buf
}

/// Decodes a flat float64 buffer produced by [`serialize`] back into an
/// ordered history. Round-trips exactly: phase name bytes via
/// round-to-nearest integer cast, every other field preserved bit-for-bit.
pub fn deserialize(buf: &[f64]) -> Result<Vec<PhaseSnapshot>, SnapshotError> {
    let mut cursor = Cursor { buf, pos: 0 };
    let num_phases = cursor.next_usize("num_phases")?;
    let mut history = Vec::with_capacity(num_phases);
    for _ in 0..num_phases {
        let name_len = cursor.next_usize("phase_name_len")?;
        let mut name_bytes = Vec::with_capacity(name_len);
        for _ in 0..name_len {
            let raw = cursor.next("phase_name_bytes")?;
            let rounded = raw.round();
            if !(0.0..=255.0).contains(&rounded) {
                return Err(SnapshotError::InvalidPhaseNameByte(raw));
            }
            name_bytes.push(rounded as u8);
        }
        let name = String::from_utf8(name_bytes).map_err(|_| {
            SnapshotError::UnknownPhase("<invalid utf-8>".to_string())
        })?;
        let phase = phase_from_str(&name).ok_or(SnapshotError::UnknownPhase(name))?;

        let num_countries = cursor.next_usize("num_countries")?;
        let mut countries = Vec::with_capacity(num_countries);
        for _ in 0..num_countries {
            let dim = cursor.next_usize("dim")?;
            let mut position = Array1::zeros(dim);
            for i in 0..dim {
                position[i] = cursor.next("position")?;
            }
            let is_empire = cursor.next("is_empire_flag")? != 0.0;
            let r = cursor.next("color_r")?;
            let g = cursor.next("color_g")?;
            let b = cursor.next("color_b")?;
            countries.push(CountryRecord {
                position,
                color: [r, g, b],
                is_empire,
            });
        }
        history.push(PhaseSnapshot { phase, countries });
    }
    Ok(history)
}

fn phase_from_str(name: &str) -> Option<Phase> {
    match name {
        "Assimilation" => Some(Phase::Assimilation),
        "Revolution" => Some(Phase::Revolution),
        "Mutiny" => Some(Phase::Mutiny),
        "Imperial War" => Some(Phase::ImperialWar),
        _ => None,
    }
}

struct Cursor<'a> {
    buf: &'a [f64],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn next(&mut self, what: &'static str) -> Result<f64, SnapshotError> {
        let v = *self.buf.get(self.pos).ok_or(SnapshotError::Truncated(what))?;
        self.pos += 1;
        Ok(v)
    }

    fn next_usize(&mut self, what: &'static str) -> Result<usize, SnapshotError> {
        Ok(self.next(what)?.round() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> Vec<PhaseSnapshot> {
        vec![
            PhaseSnapshot {
                phase: Phase::Assimilation,
                countries: vec![
                    CountryRecord {
                        position: Array1::from_vec(vec![1.0, 2.0, 3.0]),
                        color: [0.1, 0.2, 0.3],
                        is_empire: true,
                    },
                    CountryRecord {
                        position: Array1::from_vec(vec![-1.0, 0.5]),
                        color: [0.9, 0.0, 0.5],
                        is_empire: false,
                    },
                ],
            },
            PhaseSnapshot {
                phase: Phase::ImperialWar,
                countries: vec![CountryRecord {
                    position: Array1::from_vec(vec![0.0]),
                    color: [1.0, 1.0, 1.0],
                    is_empire: true,
                }],
            },
        ]
    }

    #[test]
    fn round_trips_exactly() {
        let history = sample_history();
        let buf = serialize(&history);
        let decoded = deserialize(&buf).expect("valid buffer");
        assert_eq!(decoded, history);
    }

    #[test]
    fn empty_history_round_trips() {
        let buf = serialize(&[]);
        assert_eq!(buf, vec![0.0]);
        assert_eq!(deserialize(&buf).unwrap(), vec![]);
    }

    #[test]
    fn truncated_buffer_is_an_error() {
        let history = sample_history();
        let mut buf = serialize(&history);
        buf.truncate(buf.len() - 1);
        assert!(deserialize(&buf).is_err());
    }

    #[test]
    fn unknown_phase_name_is_an_error() {
        let buf = vec![1.0, 7.0, 85.0, 110.0, 107.0, 110.0, 111.0, 119.0, 110.0, 0.0];
        assert!(matches!(
            deserialize(&buf),
            Err(SnapshotError::UnknownPhase(_))
        ));
    }
}
