//! In-memory storage medium for host tests, with scriptable write faults.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::String;
use alloc::vec::Vec;

use super::StorageMedium;

/// Scripted outcome for one `write` call. Unscripted writes succeed.
#[derive(Clone, Copy, Debug)]
pub enum WriteOutcome {
    Ok,
    /// Only the given number of bytes lands on the medium.
    Short(usize),
    Fail,
}

#[derive(Debug, PartialEq, Eq)]
pub struct MockError;

#[derive(Default)]
pub struct MockMedium {
    pub inserted: bool,
    pub files: BTreeMap<String, Vec<u8>>,
    pub open: Option<String>,
    pub probes: usize,
    pub syncs: usize,
    pub fail_open: bool,
    pub write_script: VecDeque<WriteOutcome>,
}

impl MockMedium {
    pub fn with_card() -> Self {
        Self {
            inserted: true,
            ..Self::default()
        }
    }

    pub fn script_write(&mut self, outcome: WriteOutcome) {
        self.write_script.push_back(outcome);
    }

    pub fn file(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }
}

impl StorageMedium for MockMedium {
    type Error = MockError;

    fn probe(&mut self) -> bool {
        self.probes += 1;
        self.inserted
    }

    fn exists(&mut self, name: &str) -> Result<bool, MockError> {
        if !self.inserted {
            return Err(MockError);
        }
        Ok(self.files.contains_key(name))
    }

    fn open_append(&mut self, name: &str) -> Result<(), MockError> {
        if !self.inserted || self.fail_open {
            return Err(MockError);
        }
        self.files.entry(String::from(name)).or_default();
        self.open = Some(String::from(name));
        Ok(())
    }

    fn open_truncate(&mut self, name: &str) -> Result<(), MockError> {
        self.open_append(name)?;
        self.files.get_mut(name).unwrap().clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, MockError> {
        if !self.inserted {
            return Err(MockError);
        }
        let Some(name) = self.open.clone() else {
            return Err(MockError);
        };
        let contents = self.files.get_mut(&name).unwrap();
        match self.write_script.pop_front().unwrap_or(WriteOutcome::Ok) {
            WriteOutcome::Ok => {
                contents.extend_from_slice(data);
                Ok(data.len())
            }
            WriteOutcome::Short(written) => {
                let written = written.min(data.len());
                contents.extend_from_slice(&data[..written]);
                Ok(written)
            }
            WriteOutcome::Fail => Err(MockError),
        }
    }

    fn sync(&mut self) -> Result<(), MockError> {
        if !self.inserted {
            return Err(MockError);
        }
        self.syncs += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.open = None;
    }
}
