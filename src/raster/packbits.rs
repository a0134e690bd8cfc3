//! TIFF PackBits run-length coding used for compressed raster lines.

/// Encode `data`: runs of 3+ equal bytes become `(1 - n) as i8, byte`,
/// everything else is copied in literal blocks of at most 128 bytes.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 128 + 1);
    let mut literal_start = 0;
    let mut i = 0;

    while i < data.len() {
        let mut run = 1;
        while i + run < data.len() && run < 128 && data[i + run] == data[i] {
            run += 1;
        }
        if run >= 3 {
            flush_literal(&mut out, &data[literal_start..i]);
            out.push((1i16 - run as i16) as i8 as u8);
            out.push(data[i]);
            i += run;
            literal_start = i;
        } else {
            i += run;
        }
    }
    flush_literal(&mut out, &data[literal_start..]);
    out
}

fn flush_literal(out: &mut Vec<u8>, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        let n = bytes.len().min(128);
        out.push((n - 1) as u8);
        out.extend_from_slice(&bytes[..n]);
        bytes = &bytes[n..];
    }
}

/// Inverse of [`encode`]. Returns `None` on a truncated stream.
#[cfg(test)]
fn decode(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let n = data[i] as i8;
        i += 1;
        if n >= 0 {
            let len = n as usize + 1;
            out.extend_from_slice(data.get(i..i + len)?);
            i += len;
        } else if n != -128 {
            let byte = *data.get(i)?;
            out.extend(std::iter::repeat(byte).take((1 - n as isize) as usize));
            i += 1;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_row_collapses() {
        let row = [0u8; 90];
        assert_eq!(encode(&row), vec![(1i16 - 90) as i8 as u8, 0]);
    }

    #[test]
    fn long_runs_split_at_128() {
        let row = [0xFFu8; 162];
        let enc = encode(&row);
        assert_eq!(enc, vec![0x81, 0xFF, (1i16 - 34) as i8 as u8, 0xFF]);
        assert_eq!(decode(&enc).unwrap(), row.to_vec());
    }

    #[test]
    fn mixed_row_round_trips() {
        let mut row = vec![0u8; 20];
        row.extend_from_slice(&[1, 2, 3, 3, 4]);
        row.extend(std::iter::repeat(0xAA).take(40));
        row.extend(0..=200u8);
        let enc = encode(&row);
        assert!(enc.len() < row.len() + 4);
        assert_eq!(decode(&enc).unwrap(), row);
    }

    #[test]
    fn truncated_stream_is_rejected() {
        assert!(decode(&[5, 1, 2]).is_none());
    }
}
