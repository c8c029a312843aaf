//! Loads the source reference dataset format: a header line
//! `KNOWN_COUNT NUM_PACKETS IP_RANGE`, followed by `KNOWN_COUNT`
//! pre-populated keys, followed by `NUM_PACKETS` stream keys.

use crate::error::FlowError;
use crate::flow::FlowKey;
use crate::table::LARGE_FLOW_AREA_SIZE;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The parsed, ready-to-replay dataset: the known-flow prelude (capped at
/// `LARGE_FLOW_AREA_SIZE` per §6) and the packet stream.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub known: Vec<FlowKey>,
    pub packets: Vec<FlowKey>,
    pub key_range: u32,
}

pub fn load_dataset(path: &Path) -> Result<Dataset, FlowError> {
    let display_path = path.display().to_string();
    let file = File::open(path).map_err(|source| classify_open_error(&display_path, source))?;
    let mut lines = BufReader::new(file).lines();

    let header_line = next_line(&mut lines, &display_path)?.ok_or_else(|| {
        FlowError::MalformedHeader {
            path: display_path.clone(),
            line: 1,
        }
    })?;

    let (known_count, num_packets, key_range) = parse_header(&header_line, &display_path)?;

    let mut known = Vec::with_capacity(known_count.min(LARGE_FLOW_AREA_SIZE));
    for i in 0..known_count {
        let line_no = i + 2;
        let line = next_line(&mut lines, &display_path)?.ok_or_else(|| {
            FlowError::TruncatedStream {
                path: display_path.clone(),
                expected: known_count - i,
                got: 0,
            }
        })?;
        let key = parse_key(&line, &display_path, line_no)?;
        if known.len() < LARGE_FLOW_AREA_SIZE {
            known.push(FlowKey(key));
        }
    }

    let mut packets = Vec::with_capacity(num_packets);
    for i in 0..num_packets {
        let line_no = known_count + i + 2;
        let line = next_line(&mut lines, &display_path)?.ok_or_else(|| {
            FlowError::TruncatedStream {
                path: display_path.clone(),
                expected: num_packets - i,
                got: 0,
            }
        })?;
        let key = parse_key(&line, &display_path, line_no)?;
        packets.push(FlowKey(key));
    }

    Ok(Dataset {
        known,
        packets,
        key_range,
    })
}

fn classify_open_error(path: &str, source: std::io::Error) -> FlowError {
    if source.kind() == std::io::ErrorKind::NotFound {
        FlowError::InputNotFound {
            path: path.to_string(),
        }
    } else {
        FlowError::Io {
            path: path.to_string(),
            source,
        }
    }
}

fn next_line(
    lines: &mut std::io::Lines<BufReader<File>>,
    path: &str,
) -> Result<Option<String>, FlowError> {
    match lines.next() {
        None => Ok(None),
        Some(Ok(line)) => Ok(Some(line)),
        Some(Err(source)) => Err(FlowError::Io {
            path: path.to_string(),
            source,
        }),
    }
}

fn parse_header(line: &str, path: &str) -> Result<(usize, usize, u32), FlowError> {
    let mut parts = line.split_whitespace();
    let malformed = || FlowError::MalformedHeader {
        path: path.to_string(),
        line: 1,
    };
    let known_count: usize = parts.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
    let num_packets: usize = parts.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
    let key_range: u32 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }
    Ok((known_count, num_packets, key_range))
}

fn parse_key(line: &str, path: &str, line_no: usize) -> Result<u32, FlowError> {
    line.trim().parse().map_err(|_| FlowError::MalformedKey {
        path: path.to_string(),
        line: line_no,
    })
}
