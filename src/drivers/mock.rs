// Mock device for testing without hardware

use super::traits::{DeviceError, DeviceIo, DeviceResult, ProgressCallback};
use std::sync::{Arc, Mutex};

/// In-memory radio flash; clones share the same image
#[derive(Clone, Default)]
pub struct MockDevice {
    /// Simulated flash contents
    flash: Arc<Mutex<Vec<u8>>>,

    /// Every buffer written, in order
    writes: Arc<Mutex<Vec<Vec<u8>>>>,

    /// Bytes per progress step
    block_size: usize,

    /// Fail the next transfer
    fail: bool,
}

impl MockDevice {
    pub fn new(flash: Vec<u8>) -> Self {
        Self {
            flash: Arc::new(Mutex::new(flash)),
            writes: Arc::new(Mutex::new(Vec::new())),
            block_size: 0x400,
            fail: false,
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Make every transfer fail as if the radio went away
    pub fn disconnected(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn flash(&self) -> Vec<u8> {
        self.flash.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    fn report(&self, done: usize, total: usize, message: &str, progress: Option<&ProgressCallback>) {
        if let Some(progress) = progress {
            progress(done, total, message);
        }
    }
}

impl DeviceIo for MockDevice {
    fn read_into(&mut self, buf: &mut [u8], progress: Option<&ProgressCallback>) -> DeviceResult<()> {
        if self.fail {
            return Err(DeviceError::NotConnected);
        }
        let flash = self.flash.lock().unwrap();
        if flash.len() < buf.len() {
            return Err(DeviceError::ShortTransfer {
                expected: buf.len(),
                actual: flash.len(),
            });
        }
        let total = buf.len();
        for (block, chunk) in buf.chunks_mut(self.block_size).enumerate() {
            let start = block * self.block_size;
            chunk.copy_from_slice(&flash[start..start + chunk.len()]);
            self.report(start + chunk.len(), total, "Reading", progress);
        }
        Ok(())
    }

    fn write_from(&mut self, buf: &[u8], progress: Option<&ProgressCallback>) -> DeviceResult<()> {
        if self.fail {
            return Err(DeviceError::NotConnected);
        }
        let total = buf.len();
        {
            let mut flash = self.flash.lock().unwrap();
            if flash.len() < total {
                flash.resize(total, 0xFF);
            }
            for (block, chunk) in buf.chunks(self.block_size).enumerate() {
                let start = block * self.block_size;
                flash[start..start + chunk.len()].copy_from_slice(chunk);
                self.report(start + chunk.len(), total, "Writing", progress);
            }
        }
        self.writes.lock().unwrap().push(buf.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_read_write() {
        let mut device = MockDevice::new(vec![1, 2, 3, 4, 5]).with_block_size(2);
        let mut buf = [0u8; 4];
        device.read_into(&mut buf, None).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);

        device.write_from(&[9, 9], None).unwrap();
        assert_eq!(device.flash(), vec![9, 9, 3, 4, 5]);
        assert_eq!(device.write_count(), 1);
    }

    #[test]
    fn test_mock_progress() {
        let steps = Arc::new(Mutex::new(Vec::new()));
        let sink = steps.clone();
        let progress: ProgressCallback =
            Box::new(move |done, total, _| sink.lock().unwrap().push((done, total)));

        let mut device = MockDevice::new(vec![0; 5]).with_block_size(2);
        let mut buf = [0u8; 5];
        device.read_into(&mut buf, Some(&progress)).unwrap();
        assert_eq!(*steps.lock().unwrap(), vec![(2, 5), (4, 5), (5, 5)]);
    }

    #[test]
    fn test_mock_errors() {
        let mut device = MockDevice::new(vec![0; 2]);
        let mut buf = [0u8; 4];
        assert!(matches!(
            device.read_into(&mut buf, None),
            Err(DeviceError::ShortTransfer { expected: 4, actual: 2 })
        ));

        let mut gone = MockDevice::new(vec![0; 4]).disconnected();
        assert!(matches!(gone.write_from(&buf, None), Err(DeviceError::NotConnected)));
    }
}
