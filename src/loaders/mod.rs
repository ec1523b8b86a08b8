//! Loaders that fill the reference tables from their source documents.
//!
//! Each loader owns a [`ReferenceTable`](crate::store::ReferenceTable) and
//! exposes `ensure_loaded` (cheap once the table is populated) and `reset`
//! (truncate and reload in one transaction).

pub mod admin;
pub mod country;
pub mod feature;
pub mod place;

pub use admin::AdminCodeLoader;
pub use country::CountryCodeLoader;
pub use feature::FeatureCodeLoader;
pub use place::PlaceLoader;

use csv::{Reader, ReaderBuilder, StringRecord};
use std::collections::VecDeque;
use std::io::{self, Read};

use crate::error::Result;

/// Records newline offsets as bytes pass through, so a record can be given
/// the physical line it starts on. csv's own line count skips empty lines.
struct LineCounter<R> {
    inner: R,
    offset: u64,
    newlines: VecDeque<u64>,
    passed: u64,
}

impl<R: Read> Read for LineCounter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        for (i, byte) in buf[..n].iter().enumerate() {
            if *byte == b'\n' {
                self.newlines.push_back(self.offset + i as u64);
            }
        }
        self.offset += n as u64;
        Ok(n)
    }
}

impl<R> LineCounter<R> {
    /// 1-based line holding `byte`. Offsets must be asked for in increasing order.
    fn line_at(&mut self, byte: u64) -> u64 {
        while self.newlines.front().is_some_and(|&newline| newline < byte) {
            self.newlines.pop_front();
            self.passed += 1;
        }
        self.passed + 1
    }
}

/// Non-blank records of a GeoNames tab-separated dump, with their line numbers.
/// Fields are never quoted.
pub(crate) struct TsvRecords<R> {
    reader: Reader<LineCounter<R>>,
}

pub(crate) fn tsv_records<R: Read>(reader: R) -> TsvRecords<R> {
    let counter = LineCounter {
        inner: reader,
        offset: 0,
        newlines: VecDeque::new(),
        passed: 0,
    };
    TsvRecords {
        reader: ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .from_reader(counter),
    }
}

impl<R: Read> Iterator for TsvRecords<R> {
    type Item = Result<(u64, StringRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = StringRecord::new();
        loop {
            match self.reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => return Some(Err(e.into())),
            }
            if is_blank(&record) {
                continue;
            }
            // The reader now sits just past the record's terminator; the
            // record's own start position can point at skipped empty lines.
            let last = self.reader.position().byte().saturating_sub(1);
            let line = self.reader.get_mut().line_at(last);
            return Some(Ok((line, record)));
        }
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_keep_quotes_and_physical_lines() {
        let data = "CA.03\t\"Manitoba\"\n\nCA.01\tAlberta\n  \n\n\nCA.02\tBritish Columbia";
        let records: Vec<(u64, StringRecord)> =
            tsv_records(data.as_bytes()).map(|r| r.unwrap()).collect();

        assert_eq!(records.len(), 3);
        assert_eq!(&records[0].1[1], "\"Manitoba\"");
        assert_eq!(records[0].0, 1);
        assert_eq!(records[1].0, 3);
        assert_eq!(records[2].0, 7);
    }

    #[test]
    fn test_line_numbers_survive_small_reads() {
        // One byte per read, so newlines are recorded well ahead of the parser.
        struct Trickle<'a>(&'a [u8]);
        impl Read for Trickle<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                match self.0.split_first() {
                    Some((first, rest)) if !buf.is_empty() => {
                        buf[0] = *first;
                        self.0 = rest;
                        Ok(1)
                    }
                    _ => Ok(0),
                }
            }
        }

        let data = b"\n\nCA.03\tManitoba\n\nCA.01\tAlberta\n";
        let lines: Vec<u64> = tsv_records(Trickle(data))
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(lines, vec![3, 5]);
    }
}
